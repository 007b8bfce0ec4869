//! Binding of column values to locator-addressed physical streams.
//!
//! A codec writes or reads a value through the streams handed out by a
//! caller-supplied locator, keyed by the current substream path. State that
//! must survive between successive calls on the same column (for example a
//! growing dictionary) lives in [`SerializeBulkState`] and
//! [`DeserializeBulkState`], owned by the caller.

use std::{ops::Range, sync::Arc};

use log::trace;
use substream_column::{Column, ColumnRef};
use substream_common::{Result, error::Error, verify_arg};
use substream_io::{ReadCursor, SealingWrite};

use crate::{
    cache::{SubstreamsCache, add_to_substreams_cache, get_from_substreams_cache},
    config::SerializationConfig,
    path::{SubstreamKind, SubstreamPath},
    serialization::{
        Serialization,
        low_cardinality::{DictionaryReadState, DictionaryWriteState},
        sparse::SparseReadState,
    },
};

/// Resolves a substream path to the stream it is written to.
///
/// Returning `None` means the stream is intentionally absent for this
/// operation; the corresponding substream is skipped.
pub trait WriteStreamLocator {
    fn locate(&mut self, path: &SubstreamPath) -> Option<&mut dyn SealingWrite>;
}

/// Resolves a substream path to the stream it is read from.
///
/// Returning `None` means the stream is intentionally absent for this
/// operation; the corresponding substream is skipped.
pub trait ReadStreamLocator {
    fn locate(&mut self, path: &SubstreamPath) -> Option<&mut ReadCursor>;
}

pub struct SerializeBulkSettings<'a> {
    pub locator: &'a mut dyn WriteStreamLocator,
    /// Path of the substream currently being written.
    pub path: SubstreamPath,
}

impl<'a> SerializeBulkSettings<'a> {
    pub fn new(locator: &'a mut dyn WriteStreamLocator) -> SerializeBulkSettings<'a> {
        SerializeBulkSettings {
            locator,
            path: SubstreamPath::new(),
        }
    }

    /// Runs `f` with `kind` pushed onto the path. The node is popped on
    /// return, including when `f` fails.
    pub(crate) fn with_substream<R>(
        &mut self,
        kind: SubstreamKind,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.path.push(kind);
        let res = f(self);
        self.path.pop();
        res
    }

    /// Returns `true` if the locator provides a stream for the current path
    /// extended by `kind`.
    pub(crate) fn has_substream(&mut self, kind: SubstreamKind) -> bool {
        self.path.push(kind);
        let present = self.locator.locate(&self.path).is_some();
        self.path.pop();
        present
    }

    /// The stream at the current path, which must be present.
    pub(crate) fn stream(&mut self) -> Result<&mut dyn SealingWrite> {
        self.locator
            .locate(&self.path)
            .ok_or_else(|| Error::invalid_operation(format!("write to omitted substream {}", self.path)))
    }
}

pub struct DeserializeBulkSettings<'a> {
    pub locator: &'a mut dyn ReadStreamLocator,
    /// Path of the substream currently being read.
    pub path: SubstreamPath,
    /// Expected average size of a variable-size value, in bytes. Used for
    /// capacity reservation only; `0.0` means unknown.
    pub avg_value_size_hint: f64,
}

impl<'a> DeserializeBulkSettings<'a> {
    pub fn new(locator: &'a mut dyn ReadStreamLocator) -> DeserializeBulkSettings<'a> {
        DeserializeBulkSettings {
            locator,
            path: SubstreamPath::new(),
            avg_value_size_hint: 0.0,
        }
    }

    pub fn with_config(
        locator: &'a mut dyn ReadStreamLocator,
        config: &SerializationConfig,
    ) -> DeserializeBulkSettings<'a> {
        DeserializeBulkSettings {
            avg_value_size_hint: config.avg_value_size_hint,
            ..DeserializeBulkSettings::new(locator)
        }
    }

    /// Runs `f` with `kind` pushed onto the path. The node is popped on
    /// return, including when `f` fails.
    pub(crate) fn with_substream<R>(
        &mut self,
        kind: SubstreamKind,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.path.push(kind);
        let res = f(self);
        self.path.pop();
        res
    }

    pub(crate) fn has_substream(&mut self, kind: SubstreamKind) -> bool {
        self.path.push(kind);
        let present = self.locator.locate(&self.path).is_some();
        self.path.pop();
        present
    }

    pub(crate) fn stream(&mut self) -> Result<&mut ReadCursor> {
        self.locator
            .locate(&self.path)
            .ok_or_else(|| Error::invalid_operation(format!("read from omitted substream {}", self.path)))
    }
}

/// Per-column write state, shaped after the codec tree.
///
/// Starts out `Empty` and is filled in by the codecs on first use.
#[derive(Debug, Default)]
pub enum SerializeBulkState {
    #[default]
    Empty,
    Nested(Vec<SerializeBulkState>),
    Dictionary(DictionaryWriteState),
}

impl SerializeBulkState {
    pub(crate) fn nested_mut(&mut self, count: usize) -> Result<&mut [SerializeBulkState]> {
        if matches!(self, SerializeBulkState::Empty) {
            *self = SerializeBulkState::Nested(
                (0..count).map(|_| SerializeBulkState::Empty).collect(),
            );
        }
        match self {
            SerializeBulkState::Nested(states) if states.len() == count => Ok(states),
            _ => Err(state_mismatch()),
        }
    }

    pub(crate) fn dictionary_mut(&mut self) -> Result<&mut DictionaryWriteState> {
        if matches!(self, SerializeBulkState::Empty) {
            *self = SerializeBulkState::Dictionary(Default::default());
        }
        match self {
            SerializeBulkState::Dictionary(state) => Ok(state),
            _ => Err(state_mismatch()),
        }
    }
}

/// Per-column read state, shaped after the codec tree.
#[derive(Debug, Default)]
pub enum DeserializeBulkState {
    #[default]
    Empty,
    Nested(Vec<DeserializeBulkState>),
    Dictionary(DictionaryReadState),
    Sparse(SparseReadState),
}

impl DeserializeBulkState {
    pub(crate) fn nested_mut(&mut self, count: usize) -> Result<&mut [DeserializeBulkState]> {
        if matches!(self, DeserializeBulkState::Empty) {
            *self = DeserializeBulkState::Nested(
                (0..count).map(|_| DeserializeBulkState::Empty).collect(),
            );
        }
        match self {
            DeserializeBulkState::Nested(states) if states.len() == count => Ok(states),
            _ => Err(state_mismatch()),
        }
    }

    pub(crate) fn dictionary_mut(
        &mut self,
        init: impl FnOnce() -> DictionaryReadState,
    ) -> Result<&mut DictionaryReadState> {
        if matches!(self, DeserializeBulkState::Empty) {
            *self = DeserializeBulkState::Dictionary(init());
        }
        match self {
            DeserializeBulkState::Dictionary(state) => Ok(state),
            _ => Err(state_mismatch()),
        }
    }

    pub(crate) fn sparse_mut(&mut self) -> Result<&mut SparseReadState> {
        if matches!(self, DeserializeBulkState::Empty) {
            *self = DeserializeBulkState::Sparse(Default::default());
        }
        match self {
            DeserializeBulkState::Sparse(state) => Ok(state),
            _ => Err(state_mismatch()),
        }
    }
}

fn state_mismatch() -> Error {
    Error::invalid_arg("state", "bulk state was created for a different serialization")
}

/// Clamps `offset..offset + limit` to a column of `len` rows.
pub(crate) fn row_range(len: usize, offset: usize, limit: usize) -> Result<Range<usize>> {
    verify_arg!(offset, offset <= len);
    Ok(offset..offset + limit.min(len - offset))
}

/// Writes a value through the single stream at the current path, or skips
/// it if the locator has no stream there.
pub(crate) fn serialize_single_stream(
    serialization: &Serialization,
    column: &Column,
    offset: usize,
    limit: usize,
    settings: &mut SerializeBulkSettings<'_>,
) -> Result<()> {
    match settings.locator.locate(&settings.path) {
        Some(stream) => serialization.serialize_bulk(column, stream, offset, limit),
        None => {
            trace!("skipping omitted substream {}", settings.path);
            Ok(())
        }
    }
}

/// Reads up to `limit` rows from the single stream at the current path and
/// appends them to `column`.
///
/// A subcolumn already present in `cache` replaces `column` without touching
/// any stream. A freshly read value is stored back into the cache.
pub(crate) fn deserialize_single_stream(
    serialization: &Serialization,
    column: &mut ColumnRef,
    limit: usize,
    settings: &mut DeserializeBulkSettings<'_>,
    cache: Option<&mut SubstreamsCache>,
) -> Result<()> {
    if let Some(cached) = get_from_substreams_cache(cache.as_deref(), &settings.path) {
        trace!("substream {} served from cache", settings.path);
        *column = cached;
        return Ok(());
    }

    let hint = settings.avg_value_size_hint;
    let Some(stream) = settings.locator.locate(&settings.path) else {
        trace!("skipping omitted substream {}", settings.path);
        return Ok(());
    };
    serialization.deserialize_bulk(Arc::make_mut(column), stream, limit, hint)?;
    add_to_substreams_cache(cache, &settings.path, column.clone());
    Ok(())
}
