//! Column-level writer and reader over named in-memory stream sets.

use ahash::AHashMap;
use substream_column::{Column, ColumnRef};
use substream_common::{Result, error::Error};
use substream_format::DataTypeRef;
use substream_io::{MemoryStreamSet, ReadCursor, ReadStreamSet};

use crate::{
    bulk::{
        DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState,
        WriteStreamLocator,
    },
    cache::SubstreamsCache,
    config::SerializationConfig,
    enumerate::collect_stream_paths,
    locator::{NamedReadLocator, NamedWriteLocator, WrittenStreams},
    serialization::SerializationRef,
};

/// Writes successive row ranges of one column, keeping the bulk state
/// between calls.
pub struct ColumnWriter {
    name: String,
    serialization: SerializationRef,
    state: SerializeBulkState,
    omitted: Vec<String>,
}

impl ColumnWriter {
    pub fn new(name: impl Into<String>, serialization: SerializationRef) -> ColumnWriter {
        ColumnWriter {
            name: name.into(),
            serialization,
            state: SerializeBulkState::Empty,
            omitted: Vec::new(),
        }
    }

    /// Skips the given physical streams on every write.
    pub fn with_omitted<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.omitted.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write(
        &mut self,
        column: &Column,
        offset: usize,
        limit: usize,
        streams: &mut MemoryStreamSet,
    ) -> Result<()> {
        self.write_batch(column, offset, limit, streams, &mut WrittenStreams::new())
    }

    /// Writes rows like [`ColumnWriter::write`] as part of a batch of
    /// columns sharing `written`: a nested-table sizes stream already
    /// written by another field of the batch is skipped.
    ///
    /// The fields of one nested table must be written over the same row
    /// ranges, with a fresh `written` set per range.
    pub fn write_batch(
        &mut self,
        column: &Column,
        offset: usize,
        limit: usize,
        streams: &mut MemoryStreamSet,
        written: &mut WrittenStreams,
    ) -> Result<()> {
        let mut locator = NamedWriteLocator::new(&self.name, streams)
            .with_omitted(self.omitted.iter().cloned())
            .with_written(written);
        let mut settings = SerializeBulkSettings::new(&mut locator);
        self.serialization.serialize_bulk_with_streams(
            column,
            offset,
            limit,
            &mut settings,
            &mut self.state,
        )
    }

    /// Seals every stream of the column.
    pub fn finish(self, streams: &mut MemoryStreamSet) -> Result<()> {
        let mut locator =
            NamedWriteLocator::new(&self.name, streams).with_omitted(self.omitted.iter().cloned());
        for path in collect_stream_paths(&self.serialization, None, None)? {
            if let Some(stream) = locator.locate(&path) {
                stream.seal().map_err(|e| Error::io("seal substream", e))?;
            }
        }
        Ok(())
    }
}

/// Reads successive row ranges of one column, keeping the bulk state
/// between calls.
pub struct ColumnReader {
    name: String,
    serialization: SerializationRef,
    data_type: DataTypeRef,
    config: SerializationConfig,
    state: DeserializeBulkState,
    omitted: Vec<String>,
    /// Cursors over nested-table sizes streams shared with other fields.
    own_cursors: AHashMap<String, ReadCursor>,
}

impl ColumnReader {
    pub fn new(
        name: impl Into<String>,
        serialization: SerializationRef,
        data_type: DataTypeRef,
    ) -> ColumnReader {
        ColumnReader {
            name: name.into(),
            serialization,
            data_type,
            config: SerializationConfig::default(),
            state: DeserializeBulkState::Empty,
            omitted: Vec::new(),
            own_cursors: AHashMap::new(),
        }
    }

    pub fn with_config(mut self, config: SerializationConfig) -> Self {
        self.config = config;
        self
    }

    /// Treats the given physical streams as absent on every read.
    pub fn with_omitted<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.omitted.extend(names.into_iter().map(Into::into));
        self
    }

    /// Reads up to `limit` rows into a new column, with a fresh substreams
    /// cache.
    pub fn read(&mut self, limit: usize, streams: &mut ReadStreamSet) -> Result<ColumnRef> {
        let mut column = Column::new_empty(&self.data_type).into_ref();
        let mut cache = SubstreamsCache::new();
        self.read_into(&mut column, limit, streams, Some(&mut cache))?;
        Ok(column)
    }

    /// Reads up to `limit` rows and appends them to `column`.
    ///
    /// `cache` must not outlive a single read call: a cached subcolumn
    /// replaces the corresponding part of `column` as a whole.
    pub fn read_into(
        &mut self,
        column: &mut ColumnRef,
        limit: usize,
        streams: &mut ReadStreamSet,
        cache: Option<&mut SubstreamsCache>,
    ) -> Result<()> {
        let mut locator = NamedReadLocator::new(&self.name, streams)
            .with_omitted(self.omitted.iter().cloned())
            .with_own_cursors(&mut self.own_cursors);
        let mut settings = DeserializeBulkSettings::with_config(&mut locator, &self.config);
        self.serialization.deserialize_bulk_with_streams(
            column,
            limit,
            &mut settings,
            &mut self.state,
            cache,
        )
    }
}
