//! Stream locators resolving substream paths by physical stream name over
//! in-memory stream sets.
//!
//! The fields of a nested table (`n.a`, `n.b`) share one top-level sizes
//! stream, `n.size0`. On write, the first field of a batch that reaches it
//! writes it and the others skip it; on read, every field consumes it
//! through a cursor of its own.

use std::collections::hash_map::Entry;

use ahash::{AHashMap, AHashSet};
use substream_io::{MemoryStreamSet, ReadCursor, ReadStreamSet, SealingWrite};

use crate::{
    bulk::{ReadStreamLocator, WriteStreamLocator},
    naming::{is_shared_sizes_stream, stream_name},
    path::SubstreamPath,
};

/// Shared streams written during one batch of column writes, each with the
/// column that wrote it.
#[derive(Debug, Default, Clone)]
pub struct WrittenStreams {
    owners: AHashMap<String, String>,
}

impl WrittenStreams {
    pub fn new() -> WrittenStreams {
        Default::default()
    }

    pub fn contains(&self, stream: &str) -> bool {
        self.owners.contains_key(stream)
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Claims `stream` for `column`. Returns `false` if another column
    /// already wrote it in this batch.
    fn claim(&mut self, stream: &str, column: &str) -> bool {
        match self.owners.get(stream) {
            Some(owner) => owner == column,
            None => {
                self.owners.insert(stream.to_string(), column.to_string());
                true
            }
        }
    }
}

/// Hands out the streams of one column, creating them on first use.
pub struct NamedWriteLocator<'a> {
    column_name: String,
    streams: &'a mut MemoryStreamSet,
    omitted: AHashSet<String>,
    written: Option<&'a mut WrittenStreams>,
}

impl<'a> NamedWriteLocator<'a> {
    pub fn new(column_name: impl Into<String>, streams: &'a mut MemoryStreamSet) -> Self {
        NamedWriteLocator {
            column_name: column_name.into(),
            streams,
            omitted: AHashSet::new(),
            written: None,
        }
    }

    /// Excludes the given physical streams: the locator reports them absent.
    pub fn with_omitted<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.omitted.extend(names.into_iter().map(Into::into));
        self
    }

    /// Reports a shared sizes stream absent once another column of the same
    /// batch has written it.
    pub fn with_written(mut self, written: &'a mut WrittenStreams) -> Self {
        self.written = Some(written);
        self
    }
}

impl WriteStreamLocator for NamedWriteLocator<'_> {
    fn locate(&mut self, path: &SubstreamPath) -> Option<&mut dyn SealingWrite> {
        let name = stream_name(&self.column_name, path);
        if self.omitted.contains(&name) {
            return None;
        }
        if let Some(written) = self.written.as_deref_mut() {
            if is_shared_sizes_stream(&self.column_name, path)
                && !written.claim(&name, &self.column_name)
            {
                return None;
            }
        }
        let stream: &mut dyn SealingWrite = self.streams.get_or_create(&name);
        Some(stream)
    }
}

/// Hands out the cursors of one column's streams. A stream missing from the
/// set is reported absent.
pub struct NamedReadLocator<'a> {
    column_name: String,
    streams: &'a mut ReadStreamSet,
    omitted: AHashSet<String>,
    own_cursors: Option<&'a mut AHashMap<String, ReadCursor>>,
}

impl<'a> NamedReadLocator<'a> {
    pub fn new(column_name: impl Into<String>, streams: &'a mut ReadStreamSet) -> Self {
        NamedReadLocator {
            column_name: column_name.into(),
            streams,
            omitted: AHashSet::new(),
            own_cursors: None,
        }
    }

    /// Excludes the given physical streams: the locator reports them absent.
    pub fn with_omitted<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.omitted.extend(names.into_iter().map(Into::into));
        self
    }

    /// Reads shared sizes streams through the column's own cursors, opened
    /// at the start of the stream on first use and kept in `cursors`.
    pub fn with_own_cursors(mut self, cursors: &'a mut AHashMap<String, ReadCursor>) -> Self {
        self.own_cursors = Some(cursors);
        self
    }
}

impl ReadStreamLocator for NamedReadLocator<'_> {
    fn locate(&mut self, path: &SubstreamPath) -> Option<&mut ReadCursor> {
        let name = stream_name(&self.column_name, path);
        if self.omitted.contains(&name) {
            return None;
        }
        if is_shared_sizes_stream(&self.column_name, path) {
            if let Some(cursors) = self.own_cursors.as_deref_mut() {
                return match cursors.entry(name) {
                    Entry::Occupied(entry) => Some(entry.into_mut()),
                    Entry::Vacant(entry) => {
                        let mut cursor = self.streams.get_mut(entry.key())?.clone();
                        cursor.rewind();
                        Some(entry.insert(cursor))
                    }
                };
            }
        }
        self.streams.get_mut(&name)
    }
}
