//! Media URL modeling and filename derivation.
//!
//! Builds CDN and API URLs from item identifiers, extracts identifiers from
//! item links, and derives safe local filenames from titles.

mod path;
mod sanitize;

pub use path::item_id_from_href;
pub use sanitize::{sanitize_title, PLACEHOLDER_TITLE, TITLE_MAX_CHARS};

use crate::catalog::Format;

/// Direct media URL for an item in the given format, e.g. `{cdn}/{id}.mp3`.
pub fn media_url(cdn_base: &str, id: &str, format: Format) -> String {
    format!(
        "{}/{}.{}",
        cdn_base.trim_end_matches('/'),
        id,
        format.extension()
    )
}

/// Endpoint that asks the server to prepare a WAV rendition of an item.
pub fn conversion_url(api_base: &str, id: &str) -> String {
    format!("{}/gen/{}/convert_wav/", api_base.trim_end_matches('/'), id)
}

/// Filename for a saved artifact: sanitized title plus the format extension.
///
/// # Examples
///
/// - `derive_filename("My Song", Format::Mp3)` → `"My Song.mp3"`
/// - `derive_filename("a/b", Format::Wav)` → `"a-b.wav"`
pub fn derive_filename(title: &str, format: Format) -> String {
    format!("{}.{}", sanitize_title(title), format.extension())
}
