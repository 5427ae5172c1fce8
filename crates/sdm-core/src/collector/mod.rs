//! Scroll-and-harvest collection over a virtualized list.
//!
//! The list only mounts a window of rows, so the collector scrolls in fixed
//! steps, harvests at every position and merges into one [`Catalog`]. It
//! stops when the page's advertised count is reached, when the catalog has
//! stopped growing through both recoveries, or at the iteration ceiling.
//! None of these is an error; an empty catalog means "no items found".

mod convergence;
pub mod dom;
mod page;
mod snapshot;

pub use convergence::{StallAction, StallTracker};
pub use page::{PageSurface, RegionStrategy, ScrollMotion, ScrollRegion};
pub use snapshot::SnapshotReel;

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogListing};
use crate::config::ScanConfig;

/// Why the scroll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// The catalog reached the page's advertised count.
    ExpectedReached,
    /// No growth through every recovery; best achievable catalog.
    Converged,
    /// Iteration ceiling hit.
    IterationLimit,
    /// Single harvest without scrolling.
    Quick,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub catalog: Catalog,
    pub expected_count: Option<u32>,
    pub iterations: u32,
    pub stop: ScanStop,
}

impl ScanReport {
    pub fn listing(&self) -> CatalogListing {
        CatalogListing {
            items: self.catalog.items().cloned().collect(),
            expected_count: self.expected_count,
        }
    }

    fn reached(catalog: &Catalog, expected: Option<u32>) -> bool {
        expected.is_some_and(|n| catalog.len() >= n as usize)
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn harvest<P: PageSurface>(page: &P, catalog: &mut Catalog) -> usize {
    catalog.merge_all(page.extract_visible_items())
}

pub struct Collector {
    cfg: ScanConfig,
}

impl Collector {
    pub fn new(cfg: ScanConfig) -> Self {
        Self { cfg }
    }

    /// Full scan: reset to the top, step down harvesting until convergence,
    /// then harvest once more at the bottom and at the top.
    pub async fn collect<P: PageSurface>(&self, page: &mut P) -> ScanReport {
        let cfg = &self.cfg;
        let expected = dom::expected_count(&page.read_text());
        let region = page.locate_scroll_region();
        info!(
            strategy = ?region.strategy,
            handle = %region.handle,
            expected = ?expected,
            "scan starting"
        );

        let mut catalog = Catalog::new();
        page.scroll(&region, ScrollMotion::ToTop);
        sleep(ms(cfg.initial_settle_ms)).await;
        harvest(page, &mut catalog);
        debug!(items = catalog.len(), "initial harvest");

        let mut tracker = StallTracker::new(cfg, catalog.len());
        let mut iterations = 0;
        let mut stop = ScanStop::IterationLimit;

        while iterations < cfg.max_iterations {
            if ScanReport::reached(&catalog, expected) {
                stop = ScanStop::ExpectedReached;
                break;
            }

            page.scroll(&region, ScrollMotion::By(cfg.scroll_step_px));
            sleep(ms(cfg.settle_delay_ms)).await;
            let added = harvest(page, &mut catalog);
            iterations += 1;
            debug!(iteration = iterations, added, items = catalog.len(), "scroll step");

            if ScanReport::reached(&catalog, expected) {
                stop = ScanStop::ExpectedReached;
                break;
            }

            match tracker.observe(catalog.len()) {
                StallAction::Continue => {}
                StallAction::JumpBottom => {
                    debug!(stalled = tracker.stalled(), "stalled; jumping to bottom");
                    page.scroll(&region, ScrollMotion::ToBottom);
                    sleep(ms(cfg.bottom_settle_ms)).await;
                    harvest(page, &mut catalog);
                }
                StallAction::JumpTop => {
                    debug!(stalled = tracker.stalled(), "stalled; restarting from top");
                    page.scroll(&region, ScrollMotion::ToTop);
                    sleep(ms(cfg.top_settle_ms)).await;
                    harvest(page, &mut catalog);
                }
                StallAction::GiveUp => {
                    stop = ScanStop::Converged;
                    break;
                }
            }
        }

        page.scroll(&region, ScrollMotion::ToBottom);
        sleep(ms(cfg.final_settle_ms)).await;
        harvest(page, &mut catalog);
        page.scroll(&region, ScrollMotion::ToTop);
        sleep(ms(cfg.final_settle_ms)).await;
        harvest(page, &mut catalog);

        info!(items = catalog.len(), iterations, ?stop, "scan finished");
        ScanReport {
            catalog,
            expected_count: expected,
            iterations,
            stop,
        }
    }

    /// One harvest of what is mounted right now. Does not scroll.
    pub fn quick_collect<P: PageSurface>(&self, page: &P) -> ScanReport {
        let expected = dom::expected_count(&page.read_text());
        let mut catalog = Catalog::new();
        harvest(page, &mut catalog);
        info!(items = catalog.len(), expected = ?expected, "quick scan");
        ScanReport {
            catalog,
            expected_count: expected,
            iterations: 0,
            stop: ScanStop::Quick,
        }
    }
}
