//! CLI command handlers, one per file.

mod download;
mod ping;
mod scan;
mod stop;

pub use download::run_download;
pub use ping::run_ping;
pub use scan::run_scan;
pub use stop::run_stop;

#[cfg(test)]
pub(crate) use download::format_event;
