//! CLI for the SDM song catalog collector and downloader.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sdm_core::catalog::Format;
use sdm_core::config;
use std::path::PathBuf;

use commands::{run_download, run_ping, run_scan, run_stop};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sdm")]
#[command(about = "SDM: collect a song library from a virtualized list and download it", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Collect the catalog from a captured page (HTML file or directory of frames).
    Scan {
        /// HTML file, or a directory of `.html` frames in scroll order.
        path: PathBuf,
        /// Harvest what is visible without scrolling.
        #[arg(long)]
        quick: bool,
        /// Write the catalog JSON here instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Download items from a catalog produced by `sdm scan`.
    Download {
        /// Catalog JSON file.
        catalog: PathBuf,
        /// Target format.
        #[arg(long, default_value = "mp3", value_name = "mp3|wav")]
        format: Format,
        /// Only download this item id (repeatable).
        #[arg(long = "only", value_name = "ID")]
        only: Vec<String>,
        /// Directory to save into (default: `[download].output_dir`, then the current directory).
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Ask a running `sdm download` to stop after its current item.
    Stop,

    /// Check whether a `sdm download` is running.
    Ping,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Scan { path, quick, out } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg.scan);
                run_scan(&cfg, &path, quick, out.as_deref()).await?;
            }
            CliCommand::Download {
                catalog,
                format,
                only,
                out_dir,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg.download);
                run_download(&cfg, &catalog, format, &only, out_dir).await?;
            }
            CliCommand::Stop => run_stop().await?,
            CliCommand::Ping => run_ping().await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
