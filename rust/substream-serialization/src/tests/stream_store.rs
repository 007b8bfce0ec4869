use substream_column::{Column, ColumnRef};
use substream_format::DataTypeRef;
use substream_io::{MemoryStreamSet, ReadStreamSet};

use crate::{
    cache::SubstreamsCache,
    column_io::{ColumnReader, ColumnWriter},
    locator::WrittenStreams,
    serialization::SerializationRef,
};

/// In-memory home of the streams of one or more columns.
#[derive(Default)]
pub struct StreamStore {
    streams: MemoryStreamSet,
}

impl StreamStore {
    pub fn new() -> StreamStore {
        Default::default()
    }

    /// Writes `column` in chunks of `chunk_size` rows.
    pub fn write(
        &mut self,
        name: &str,
        serialization: &SerializationRef,
        column: &Column,
        chunk_size: usize,
    ) {
        self.write_with_omitted(name, serialization, column, chunk_size, &[]);
    }

    pub fn write_with_omitted(
        &mut self,
        name: &str,
        serialization: &SerializationRef,
        column: &Column,
        chunk_size: usize,
        omitted: &[&str],
    ) {
        let mut writer =
            ColumnWriter::new(name, serialization.clone()).with_omitted(omitted.iter().copied());
        let mut offset = 0;
        while offset < column.len() {
            writer
                .write(column, offset, chunk_size, &mut self.streams)
                .unwrap();
            offset += chunk_size;
        }
        writer.finish(&mut self.streams).unwrap();
    }

    /// Writes the fields of one nested table over the same row ranges of
    /// `chunk_size` rows, with one set of written streams per range.
    pub fn write_table(
        &mut self,
        fields: &[(&str, &SerializationRef, &Column)],
        chunk_size: usize,
    ) {
        let mut writers = fields
            .iter()
            .map(|(name, serialization, _)| {
                ColumnWriter::new(*name, SerializationRef::clone(serialization))
            })
            .collect::<Vec<_>>();
        let rows = fields.first().map_or(0, |(_, _, column)| column.len());
        let mut offset = 0;
        while offset < rows {
            let mut written = WrittenStreams::new();
            for (writer, (_, _, column)) in writers.iter_mut().zip(fields) {
                writer
                    .write_batch(column, offset, chunk_size, &mut self.streams, &mut written)
                    .unwrap();
            }
            offset += chunk_size;
        }
        for writer in writers {
            writer.finish(&mut self.streams).unwrap();
        }
    }

    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.names()
    }

    pub fn stream_size(&self, name: &str) -> Option<usize> {
        self.streams.get(name).map(<[u8]>::len)
    }

    pub fn into_read_set(self) -> ReadStreamSet {
        self.streams.into_read_set().unwrap()
    }
}

/// Reads a whole column in chunks of `chunk_size` rows, with a fresh cache
/// per chunk.
pub fn read_all(
    reader: &mut ColumnReader,
    data_type: &DataTypeRef,
    streams: &mut ReadStreamSet,
    chunk_size: usize,
) -> ColumnRef {
    let mut column = Column::new_empty(data_type).into_ref();
    loop {
        let before = column.len();
        let mut cache = SubstreamsCache::new();
        reader
            .read_into(&mut column, chunk_size, streams, Some(&mut cache))
            .unwrap();
        if column.len() == before {
            return column;
        }
    }
}
