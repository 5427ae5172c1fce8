//! [`PageSurface`] over captured HTML.
//!
//! A reel is a sequence of frames, each the page's HTML at a successive
//! scroll offset. Scrolling moves between frames: a step advances one frame,
//! the extents jump to the first or last. A single file is a static page.

use anyhow::{bail, Context, Result};
use scraper::Html;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::dom;
use super::page::{PageSurface, ScrollMotion, ScrollRegion};
use crate::catalog::Sighting;

const FRAME_EXTENSIONS: [&str; 2] = ["html", "htm"];

#[derive(Debug, Clone)]
pub struct SnapshotReel {
    frames: Vec<String>,
    position: usize,
}

impl SnapshotReel {
    pub fn from_frames(frames: Vec<String>) -> Result<Self> {
        if frames.is_empty() {
            bail!("snapshot reel has no frames");
        }
        Ok(Self {
            frames,
            position: 0,
        })
    }

    /// Opens a single HTML file, or a directory of `.html` frames ordered by name.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            let html = fs::read_to_string(path)
                .with_context(|| format!("read snapshot: {}", path.display()))?;
            return Self::from_frames(vec![html]);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(path)
            .with_context(|| format!("read snapshot dir: {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();
        debug!(dir = %path.display(), frames = paths.len(), "opening snapshot reel");

        let frames = paths
            .iter()
            .map(|p| {
                fs::read_to_string(p).with_context(|| format!("read frame: {}", p.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_frames(frames)
            .with_context(|| format!("no .html frames in {}", path.display()))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn current(&self) -> Html {
        Html::parse_document(&self.frames[self.position])
    }
}

impl PageSurface for SnapshotReel {
    fn read_text(&self) -> String {
        dom::page_text(&self.current())
    }

    fn locate_scroll_region(&self) -> ScrollRegion {
        dom::locate_region(&self.current())
    }

    fn scroll(&mut self, _region: &ScrollRegion, motion: ScrollMotion) {
        let last = self.frames.len() - 1;
        self.position = match motion {
            ScrollMotion::By(_) => (self.position + 1).min(last),
            ScrollMotion::ToTop => 0,
            ScrollMotion::ToBottom => last,
        };
    }

    fn extract_visible_items(&self) -> Vec<Sighting> {
        dom::extract_sightings(&self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ids: &[&str]) -> String {
        let links: String = ids
            .iter()
            .map(|id| format!(r#"<a href="/song/{id}">Title {}</a>"#, &id[..4]))
            .collect();
        format!("<html><body><p>{} songs</p>{links}</body></html>", 3)
    }

    const A: &str = "aaaaaaaa-0000-4000-8000-000000000001";
    const B: &str = "bbbbbbbb-0000-4000-8000-000000000002";

    #[test]
    fn opens_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("02.html"), frame(&[B])).unwrap();
        fs::write(dir.path().join("01.html"), frame(&[A])).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut reel = SnapshotReel::open(dir.path()).unwrap();
        assert_eq!(reel.frame_count(), 2);
        assert_eq!(reel.extract_visible_items()[0].id, A);

        let region = reel.locate_scroll_region();
        reel.scroll(&region, ScrollMotion::By(600));
        assert_eq!(reel.extract_visible_items()[0].id, B);
        reel.scroll(&region, ScrollMotion::By(600));
        assert_eq!(reel.position(), 1);
        reel.scroll(&region, ScrollMotion::ToTop);
        assert_eq!(reel.position(), 0);
    }

    #[test]
    fn single_file_is_static_page() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        fs::write(&file, frame(&[A, B])).unwrap();

        let reel = SnapshotReel::open(&file).unwrap();
        assert_eq!(reel.frame_count(), 1);
        assert_eq!(dom::expected_count(&reel.read_text()), Some(3));
        assert_eq!(reel.extract_visible_items().len(), 2);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SnapshotReel::open(dir.path()).is_err());
    }
}
