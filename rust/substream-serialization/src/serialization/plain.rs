//! Single-stream codec for scalar values.
//!
//! Fixed-width numbers are stored back to back in little-endian order.
//! Strings are stored as a `u64` little-endian byte length followed by the
//! UTF-8 bytes.

use std::{fmt, mem::size_of};

use bytemuck::Pod;
use substream_column::Column;
use substream_common::{Result, error::Error, verify_data};
use substream_format::DataType;
use substream_io::{ReadCursor, SealingWrite};

use crate::bulk::row_range;

use super::column_mismatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    UInt8,
    UInt32,
    UInt64,
    Int32,
    Int64,
    Float64,
    String,
}

impl ScalarKind {
    pub fn from_data_type(data_type: &DataType) -> Option<ScalarKind> {
        Some(match data_type {
            DataType::UInt8 => ScalarKind::UInt8,
            DataType::UInt32 => ScalarKind::UInt32,
            DataType::UInt64 => ScalarKind::UInt64,
            DataType::Int32 => ScalarKind::Int32,
            DataType::Int64 => ScalarKind::Int64,
            DataType::Float64 => ScalarKind::Float64,
            DataType::String => ScalarKind::String,
            _ => return None,
        })
    }

    pub fn data_type(self) -> DataType {
        match self {
            ScalarKind::UInt8 => DataType::UInt8,
            ScalarKind::UInt32 => DataType::UInt32,
            ScalarKind::UInt64 => DataType::UInt64,
            ScalarKind::Int32 => DataType::Int32,
            ScalarKind::Int64 => DataType::Int64,
            ScalarKind::Float64 => DataType::Float64,
            ScalarKind::String => DataType::String,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data_type().fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlainSerialization {
    kind: ScalarKind,
}

impl PlainSerialization {
    pub fn new(kind: ScalarKind) -> PlainSerialization {
        PlainSerialization { kind }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn serialize(
        &self,
        column: &Column,
        stream: &mut dyn SealingWrite,
        offset: usize,
        limit: usize,
    ) -> Result<()> {
        let range = row_range(column.len(), offset, limit)?;
        match (self.kind, column) {
            (ScalarKind::UInt8, Column::UInt8(v)) => write_values(&v[range], stream),
            (ScalarKind::UInt32, Column::UInt32(v)) => write_values(&v[range], stream),
            (ScalarKind::UInt64, Column::UInt64(v)) => write_values(&v[range], stream),
            (ScalarKind::Int32, Column::Int32(v)) => write_values(&v[range], stream),
            (ScalarKind::Int64, Column::Int64(v)) => write_values(&v[range], stream),
            (ScalarKind::Float64, Column::Float64(v)) => write_values(&v[range], stream),
            (ScalarKind::String, Column::String(v)) => write_strings(&v[range], stream),
            (kind, column) => Err(column_mismatch(&kind.to_string(), column)),
        }
    }

    /// Appends up to `limit` values read from `stream`. Stops early at the
    /// end of the stream.
    pub fn deserialize(
        &self,
        column: &mut Column,
        stream: &mut ReadCursor,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<()> {
        match (self.kind, column) {
            (ScalarKind::UInt8, Column::UInt8(v)) => read_values(v, stream, limit),
            (ScalarKind::UInt32, Column::UInt32(v)) => read_values(v, stream, limit),
            (ScalarKind::UInt64, Column::UInt64(v)) => read_values(v, stream, limit),
            (ScalarKind::Int32, Column::Int32(v)) => read_values(v, stream, limit),
            (ScalarKind::Int64, Column::Int64(v)) => read_values(v, stream, limit),
            (ScalarKind::Float64, Column::Float64(v)) => read_values(v, stream, limit),
            (ScalarKind::String, Column::String(v)) => {
                read_strings(v, stream, limit, avg_value_size_hint)
            }
            (kind, column) => Err(column_mismatch(&kind.to_string(), column)),
        }
    }
}

pub(crate) fn write_values<T: Pod>(values: &[T], stream: &mut dyn SealingWrite) -> Result<()> {
    stream
        .write_all(bytemuck::cast_slice(values))
        .map_err(|e| Error::io("write values", e))
}

pub(crate) fn read_values<T: Pod>(
    dst: &mut Vec<T>,
    stream: &mut ReadCursor,
    limit: usize,
) -> Result<()> {
    let width = size_of::<T>() as u64;
    let available = stream.remaining() / width;
    let count = (limit as u64).min(available) as usize;
    verify_data!(stream, count == limit || stream.remaining() % width == 0);

    let bytes = stream
        .read_bytes(count * width as usize)
        .map_err(|e| Error::io("read values", e))?;
    let start = dst.len();
    dst.resize(start + count, T::zeroed());
    bytemuck::cast_slice_mut::<T, u8>(&mut dst[start..]).copy_from_slice(&bytes);
    Ok(())
}

fn write_strings(values: &[String], stream: &mut dyn SealingWrite) -> Result<()> {
    let size = values.iter().map(|s| s.len() + 8).sum();
    let mut buf = Vec::with_capacity(size);
    for value in values {
        buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
        buf.extend_from_slice(value.as_bytes());
    }
    stream
        .write_all(&buf)
        .map_err(|e| Error::io("write strings", e))
}

fn read_strings(
    dst: &mut Vec<String>,
    stream: &mut ReadCursor,
    limit: usize,
    avg_value_size_hint: f64,
) -> Result<()> {
    let expected = if avg_value_size_hint > 0.0 {
        (stream.remaining() as f64 / (avg_value_size_hint + 8.0)) as usize
    } else {
        (stream.remaining() / 8) as usize
    };
    dst.reserve(limit.min(expected));

    for _ in 0..limit {
        if stream.is_eof() {
            break;
        }
        let len = stream
            .read_u64_le()
            .map_err(|e| Error::io("read string length", e))?;
        verify_data!(len, len <= stream.remaining());
        let bytes = stream
            .read_bytes(len as usize)
            .map_err(|e| Error::io("read string", e))?;
        let value = String::from_utf8(bytes)
            .map_err(|e| Error::invalid_format("string", e.to_string()))?;
        dst.push(value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use substream_column::Column;
    use substream_io::{ReadCursor, memory::shared_reader};

    use super::{PlainSerialization, ScalarKind};

    fn write(kind: ScalarKind, column: &Column, offset: usize, limit: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        PlainSerialization::new(kind)
            .serialize(column, &mut buf, offset, limit)
            .unwrap();
        buf
    }

    fn cursor(buf: Vec<u8>) -> ReadCursor {
        ReadCursor::new(shared_reader(buf)).unwrap()
    }

    #[test]
    fn test_fixed_width_layout() {
        let buf = write(ScalarKind::Int32, &Column::from(vec![1i32, -2, 3]), 1, 5);
        assert_eq!(buf, [0xFE, 0xFF, 0xFF, 0xFF, 3, 0, 0, 0]);
    }

    #[test]
    fn test_string_layout() {
        let buf = write(ScalarKind::String, &Column::from(vec!["ab", ""]), 0, 2);
        assert_eq!(
            buf,
            [2, 0, 0, 0, 0, 0, 0, 0, b'a', b'b', 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_read_in_chunks() {
        let column = Column::from(vec![1.5f64, 2.5, 3.5, 4.5, 5.5]);
        let mut stream = cursor(write(ScalarKind::Float64, &column, 0, 5));
        let plain = PlainSerialization::new(ScalarKind::Float64);

        let mut dst = Column::Float64(Vec::new());
        plain.deserialize(&mut dst, &mut stream, 2, 0.0).unwrap();
        assert_eq!(dst.len(), 2);
        plain.deserialize(&mut dst, &mut stream, 10, 0.0).unwrap();
        assert_eq!(dst, column);
        assert!(stream.is_eof());
    }

    #[test]
    fn test_strings_stop_at_eof() {
        let column = Column::from(vec!["x", "yz", "🙂"]);
        let mut stream = cursor(write(ScalarKind::String, &column, 0, 3));
        let mut dst = Column::String(Vec::new());
        PlainSerialization::new(ScalarKind::String)
            .deserialize(&mut dst, &mut stream, 100, 4.0)
            .unwrap();
        assert_eq!(dst, column);
    }

    #[test]
    fn test_truncated_stream() {
        let mut buf = write(ScalarKind::UInt64, &Column::from(vec![7u64, 8]), 0, 2);
        buf.pop();
        let mut dst = Column::UInt64(Vec::new());
        let err = PlainSerialization::new(ScalarKind::UInt64)
            .deserialize(&mut dst, &mut cursor(buf), 2, 0.0)
            .unwrap_err();
        assert!(err.to_string().contains("stream"), "{err}");

        let mut buf = write(ScalarKind::String, &Column::from(vec!["abc"]), 0, 1);
        buf.truncate(10);
        let mut dst = Column::String(Vec::new());
        assert!(
            PlainSerialization::new(ScalarKind::String)
                .deserialize(&mut dst, &mut cursor(buf), 1, 0.0)
                .is_err()
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let mut buf = Vec::new();
        assert!(
            PlainSerialization::new(ScalarKind::UInt8)
                .serialize(&Column::from(vec![1u32]), &mut buf, 0, 1)
                .is_err()
        );
        assert!(
            PlainSerialization::new(ScalarKind::UInt8)
                .serialize(&Column::from(vec![1u8]), &mut buf, 2, 1)
                .is_err()
        );
    }
}
