//! Narrow capability interface over a page holding a virtualized list.

use crate::catalog::Sighting;

/// How the scroll region was found, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStrategy {
    /// Scroller element of a list virtualization library.
    VirtualScroller,
    /// Nearest scrollable ancestor of the list row group.
    RowGroupAncestor,
    /// A container that overflows its own height and holds item links.
    OverflowingContainer,
    /// The document's root scrolling element.
    DocumentRoot,
}

/// The container the collector scrolls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRegion {
    pub strategy: RegionStrategy,
    /// Implementation-defined locator for the element (e.g. `div#list.scroller`).
    pub handle: String,
}

impl ScrollRegion {
    pub fn document_root() -> Self {
        Self {
            strategy: RegionStrategy::DocumentRoot,
            handle: "html".to_string(),
        }
    }

    pub fn is_document_root(&self) -> bool {
        self.strategy == RegionStrategy::DocumentRoot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMotion {
    /// Advance by this many pixels.
    By(u32),
    ToTop,
    ToBottom,
}

/// What the collector needs from a page. Reads never mutate the page;
/// only [`scroll`](PageSurface::scroll) does.
pub trait PageSurface {
    /// Visible text of the whole page.
    fn read_text(&self) -> String;

    fn locate_scroll_region(&self) -> ScrollRegion;

    /// Moves `region` and the window together, since some layouts scroll
    /// one and some the other.
    fn scroll(&mut self, region: &ScrollRegion, motion: ScrollMotion);

    /// Items currently mounted in the document, in document order.
    fn extract_visible_items(&self) -> Vec<Sighting>;
}
