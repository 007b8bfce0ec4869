//! Memo of already decoded subcolumns, keyed by logical subcolumn name.
//!
//! A cache belongs to one decoding session; callers create a fresh one per
//! read and pass it down by reference.

use ahash::AHashMap;
use substream_column::ColumnRef;

use crate::{naming::subcolumn_name, path::Substream};

#[derive(Debug, Default, Clone)]
pub struct SubstreamsCache {
    entries: AHashMap<String, ColumnRef>,
}

impl SubstreamsCache {
    pub fn new() -> SubstreamsCache {
        Default::default()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnRef> {
        self.entries.get(name)
    }

    /// Stores `column` under `name` unless an entry is already there; the
    /// first value stored wins.
    pub fn insert(&mut self, name: impl Into<String>, column: ColumnRef) {
        self.entries.entry(name.into()).or_insert(column);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Stores `column` under the logical name of the full `path`.
/// Does nothing without a cache or for an empty path.
pub fn add_to_substreams_cache(
    cache: Option<&mut SubstreamsCache>,
    path: &[Substream],
    column: ColumnRef,
) {
    let Some(cache) = cache else {
        return;
    };
    if path.is_empty() {
        return;
    }
    cache.insert(subcolumn_name(path), column);
}

/// Looks up the column stored under the logical name of `path`.
pub fn get_from_substreams_cache(
    cache: Option<&SubstreamsCache>,
    path: &[Substream],
) -> Option<ColumnRef> {
    let cache = cache?;
    if path.is_empty() {
        return None;
    }
    cache.get(&subcolumn_name(path)).cloned()
}
