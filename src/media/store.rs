//! Per-subject media aggregation with global URL deduplication
//!
//! A `MediaStore` belongs to exactly one subject and is only ever mutated
//! from the orchestrator task, after worker batches complete. The per-kind
//! seen-set makes insertion idempotent, so results can be reduced in
//! whatever order worker tasks finish.

use crate::media::{MediaItem, MediaKind};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Date-indexed, kind-partitioned, deduplicated media for one subject
///
/// Invariant: a URL appears at most once per kind across the whole store,
/// regardless of how many windows or posts referenced it.
#[derive(Debug, Default)]
pub struct MediaStore {
    /// kind -> date string -> URLs in insertion order
    by_kind: HashMap<MediaKind, BTreeMap<String, Vec<String>>>,

    /// kind -> every URL ever recorded, including ones already stored
    seen: HashMap<MediaKind, HashSet<String>>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a media URL under the given kind and date
    ///
    /// Returns true if the URL was new for this kind and was stored; false
    /// if it was already seen (under any date) and was discarded.
    pub fn insert(&mut self, kind: MediaKind, date: &str, url: String) -> bool {
        let seen = self.seen.entry(kind).or_default();
        if !seen.insert(url.clone()) {
            return false;
        }

        self.by_kind
            .entry(kind)
            .or_default()
            .entry(date.to_string())
            .or_default()
            .push(url);
        true
    }

    /// Records one extracted item; see [`MediaStore::insert`]
    pub fn insert_item(&mut self, item: MediaItem) -> bool {
        self.insert(item.kind, &item.date, item.url)
    }

    /// Number of stored URLs for one kind
    pub fn count(&self, kind: MediaKind) -> usize {
        self.by_kind
            .get(&kind)
            .map(|dates| dates.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Total number of stored URLs across all kinds
    pub fn total(&self) -> usize {
        MediaKind::ALL.iter().map(|&k| self.count(k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Date-ordered entries for one kind (oldest date first)
    pub fn dates(&self, kind: MediaKind) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.by_kind.get(&kind).into_iter().flatten()
    }

    /// Every stored item, newest date first, kinds in display order
    pub fn items_newest_first(&self) -> Vec<MediaItem> {
        let mut items = Vec::with_capacity(self.total());
        for &kind in &MediaKind::ALL {
            if let Some(dates) = self.by_kind.get(&kind) {
                for (date, urls) in dates.iter() {
                    for url in urls {
                        items.push(MediaItem {
                            kind,
                            url: url.clone(),
                            date: date.clone(),
                        });
                    }
                }
            }
        }
        // Date strings are zero-padded ISO dates, so the lexicographic
        // reverse sort is newest-first. Stable, so insertion order is kept
        // within a date.
        items.sort_by(|a, b| b.date.cmp(&a.date));
        items
    }
}
