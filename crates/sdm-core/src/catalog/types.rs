//! Item, sighting and format types shared by the collector and downloader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters of the identifier used when a title has to be synthesized.
const SYNTHETIC_PREFIX_CHARS: usize = 8;

/// One logical item in the catalog. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable identifier (36-char canonical form).
    pub id: String,
    /// Sanitized, non-empty, filesystem-safe title.
    pub title: String,
    /// Locator the item was discovered through (the link href).
    pub source_ref: String,
}

/// An item as seen in one harvest, before it is merged into the catalog.
///
/// `title` is `None` when neither the link text nor the row markers yielded a
/// usable title at this scroll position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub id: String,
    pub title: Option<String>,
    pub source_ref: String,
}

impl Sighting {
    pub fn new(id: impl Into<String>, title: Option<String>, source_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title,
            source_ref: source_ref.into(),
        }
    }
}

/// Title used when no usable title was ever observed for `id`.
pub fn synthetic_title(id: &str) -> String {
    let prefix: String = id.chars().take(SYNTHETIC_PREFIX_CHARS).collect();
    format!("Song_{}", prefix)
}

/// Target media format of a download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Mp3,
    Wav,
}

impl Format {
    /// File extension (and CDN suffix) for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Mp3 => "mp3",
            Format::Wav => "wav",
        }
    }

    /// Bridge action that performs a download in this format.
    pub fn bridge_action(self) -> &'static str {
        match self {
            Format::Mp3 => "downloadMP3",
            Format::Wav => "downloadWAV",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Format::Mp3),
            "wav" => Ok(Format::Wav),
            other => Err(format!("unknown format '{}' (expected mp3 or wav)", other)),
        }
    }
}
