//! `sdm scan <PATH>` – collect the catalog from captured page HTML.

use anyhow::{Context, Result};
use sdm_core::collector::{Collector, SnapshotReel};
use sdm_core::config::SdmConfig;
use std::path::Path;

pub async fn run_scan(cfg: &SdmConfig, path: &Path, quick: bool, out: Option<&Path>) -> Result<()> {
    let mut reel = SnapshotReel::open(path)?;
    let collector = Collector::new(cfg.scan.clone());
    let report = if quick {
        collector.quick_collect(&reel)
    } else {
        collector.collect(&mut reel).await
    };

    let listing = report.listing();
    let json = serde_json::to_string_pretty(&listing)?;
    match out {
        Some(out) => {
            std::fs::write(out, json).with_context(|| format!("write catalog: {}", out.display()))?;
            let expected = report
                .expected_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "{} items (page says {}) after {} scroll steps -> {}",
                listing.items.len(),
                expected,
                report.iterations,
                out.display()
            );
        }
        None => println!("{json}"),
    }

    if listing.items.is_empty() {
        eprintln!("No items found");
    }
    Ok(())
}
