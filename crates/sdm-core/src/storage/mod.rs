//! Artifact persistence.
//!
//! Writes each fetched artifact to a `.part` temp file, syncs it, and
//! atomically renames it into place. Existing files are never overwritten:
//! a free `<stem> (n).<ext>` name is picked instead.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Numbered variants tried before giving up on a free filename.
const MAX_NAME_VARIANTS: u32 = 10_000;

/// Path for the temp file: appends `.part` to the final path (e.g. `a.mp3` → `a.mp3.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// `name (n).ext` for `name.ext`; `name (n)` when there is no extension.
pub fn numbered_variant(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", filename, n),
    }
}

/// Destination for downloaded artifacts.
pub trait ArtifactSink: Send + Sync + 'static {
    /// Persists `bytes` under `filename` and returns where they landed.
    fn save(&self, filename: &str, bytes: Vec<u8>) -> impl Future<Output = io::Result<PathBuf>> + Send;
}

/// Saves artifacts into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn free_path(&self, filename: &str) -> io::Result<PathBuf> {
        let first = self.dir.join(filename);
        if !tokio::fs::try_exists(&first).await? {
            return Ok(first);
        }
        for n in 1..=MAX_NAME_VARIANTS {
            let candidate = self.dir.join(numbered_variant(filename, n));
            if !tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free filename for {}", filename),
        ))
    }
}

impl ArtifactSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let final_path = self.free_path(filename).await?;
        let part = temp_path(&final_path);

        let mut file = tokio::fs::File::create(&part).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&part, &final_path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
        tracing::debug!(path = %final_path.display(), bytes = bytes.len(), "artifact saved");
        Ok(final_path)
    }
}
