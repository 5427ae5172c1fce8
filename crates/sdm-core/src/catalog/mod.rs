//! Deduplicated, insertion-ordered catalog of discovered items.
//!
//! Harvests are merged monotonically: entries are only ever added during a
//! scan. A title seen once stays canonical; an item first seen without a
//! usable title carries a synthesized one until a real title shows up.

mod types;

pub use types::{synthetic_title, Format, Item, Sighting};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serialized scan result: what `scan` hands to a front end and what a
/// download run reads back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    pub items: Vec<Item>,
    #[serde(default)]
    pub expected_count: Option<u32>,
}

impl CatalogListing {
    /// Keeps only the listed ids, in listing order. An empty filter keeps all.
    pub fn select(self, only: &[String]) -> Vec<Item> {
        if only.is_empty() {
            return self.items;
        }
        self.items
            .into_iter()
            .filter(|item| only.iter().any(|id| id.eq_ignore_ascii_case(&item.id)))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    item: Item,
    synthesized: bool,
}

/// Insertion-ordered map from item id to [`Item`]. Never holds duplicate ids.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.entries[i].item)
    }

    /// Items in first-seen order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn into_items(self) -> Vec<Item> {
        self.entries.into_iter().map(|e| e.item).collect()
    }

    /// Merges one sighting. Returns `true` if the id was new.
    ///
    /// An existing real title is never replaced; a synthesized one is
    /// upgraded the first time a real title is sighted.
    pub fn merge(&mut self, sighting: Sighting) -> bool {
        let Sighting {
            id,
            title,
            source_ref,
        } = sighting;

        if let Some(&i) = self.index.get(&id) {
            let entry = &mut self.entries[i];
            if entry.synthesized {
                if let Some(title) = title {
                    entry.item.title = title;
                    entry.synthesized = false;
                }
            }
            return false;
        }

        let synthesized = title.is_none();
        let title = title.unwrap_or_else(|| synthetic_title(&id));
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push(Entry {
            item: Item {
                id,
                title,
                source_ref,
            },
            synthesized,
        });
        true
    }

    /// Merges a whole harvest; returns how many ids were new.
    pub fn merge_all<I>(&mut self, sightings: I) -> usize
    where
        I: IntoIterator<Item = Sighting>,
    {
        sightings
            .into_iter()
            .map(|s| self.merge(s))
            .filter(|added| *added)
            .count()
    }
}
