//! The codec tree: one [`Serialization`] node per level of a data type.
//!
//! Scalars are written as a single plain stream. Composites decompose into
//! structural streams (sizes, null maps, dictionary indexes, sparse offsets)
//! plus the streams of their children, and drive the walk themselves.

use std::{fmt, sync::Arc};

use log::debug;
use substream_column::{Column, ColumnRef};
use substream_common::{Result, error::Error};
use substream_format::{DataType, DataTypeRef};
use substream_io::{ReadCursor, SealingWrite};

use crate::{
    bulk::{
        DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState,
        deserialize_single_stream, serialize_single_stream,
    },
    cache::SubstreamsCache,
    config::SerializationConfig,
    enumerate::{StreamVisitor, enumerate_leaf},
    path::SubstreamPath,
};

pub mod array;
pub mod low_cardinality;
pub mod map;
pub mod nullable;
pub mod plain;
pub mod sparse;
pub mod tuple;

use array::ArraySerialization;
use low_cardinality::LowCardinalitySerialization;
use map::MapSerialization;
use nullable::NullableSerialization;
use plain::{PlainSerialization, ScalarKind};
use sparse::SparseSerialization;
use tuple::{TupleElementSerialization, TupleSerialization};

/// Shared, immutable handle to a codec.
pub type SerializationRef = Arc<Serialization>;

#[derive(Debug, Clone, PartialEq)]
pub enum Serialization {
    Plain(PlainSerialization),
    Array(ArraySerialization),
    Nullable(NullableSerialization),
    Tuple(TupleSerialization),
    Map(MapSerialization),
    LowCardinality(LowCardinalitySerialization),
    Sparse(SparseSerialization),
}

impl Serialization {
    pub fn plain(kind: ScalarKind) -> SerializationRef {
        Arc::new(Serialization::Plain(PlainSerialization::new(kind)))
    }

    pub fn array(nested: SerializationRef) -> SerializationRef {
        Arc::new(Serialization::Array(ArraySerialization::new(nested)))
    }

    pub fn nullable(nested: SerializationRef) -> SerializationRef {
        Arc::new(Serialization::Nullable(NullableSerialization::new(nested)))
    }

    pub fn tuple(elements: Vec<TupleElementSerialization>) -> SerializationRef {
        Arc::new(Serialization::Tuple(TupleSerialization::new(elements)))
    }

    pub fn map(
        key: SerializationRef,
        value: SerializationRef,
        escape_tuple_delimiter: bool,
    ) -> SerializationRef {
        Arc::new(Serialization::Map(MapSerialization::new(
            key,
            value,
            escape_tuple_delimiter,
        )))
    }

    pub fn low_cardinality(dictionary: SerializationRef) -> SerializationRef {
        Arc::new(Serialization::LowCardinality(
            LowCardinalitySerialization::new(dictionary),
        ))
    }

    pub fn sparse(nested: SerializationRef) -> SerializationRef {
        Arc::new(Serialization::Sparse(SparseSerialization::new(nested)))
    }

    /// Returns `true` for codecs writing a single stream.
    pub fn is_plain(&self) -> bool {
        matches!(self, Serialization::Plain(_))
    }

    /// The logical type this codec reads and writes.
    pub fn data_type(&self) -> DataTypeRef {
        match self {
            Serialization::Plain(plain) => plain.kind().data_type().into_ref(),
            Serialization::Array(array) => DataType::array(array.nested().data_type()),
            Serialization::Nullable(nullable) => DataType::nullable(nullable.nested().data_type()),
            Serialization::Tuple(tuple) => DataType::tuple(
                tuple
                    .elements()
                    .iter()
                    .map(|e| (e.name.clone(), e.serialization.data_type())),
            ),
            Serialization::Map(map) => DataType::map(map.key().data_type(), map.value().data_type()),
            Serialization::LowCardinality(lc) => {
                DataType::low_cardinality(lc.dictionary().data_type())
            }
            Serialization::Sparse(sparse) => sparse.nested().data_type(),
        }
    }

    /// Walks the streams of this codec, calling `visitor` once per leaf
    /// stream with the full path to it.
    ///
    /// `data_type` and `column`, when given, are attached to the path nodes
    /// and split along the way. The path is restored before returning,
    /// whether the walk succeeds or not.
    pub fn enumerate_streams(
        self: &Arc<Self>,
        path: &mut SubstreamPath,
        visitor: &mut StreamVisitor<'_>,
        data_type: Option<DataTypeRef>,
        column: Option<ColumnRef>,
    ) -> Result<()> {
        match self.as_ref() {
            Serialization::Plain(_) => enumerate_leaf(self, path, visitor, data_type, column),
            Serialization::Array(array) => {
                array.enumerate_streams(self, path, visitor, data_type, column)
            }
            Serialization::Nullable(nullable) => {
                nullable.enumerate_streams(self, path, visitor, data_type, column)
            }
            Serialization::Tuple(tuple) => {
                tuple.enumerate_streams(self, path, visitor, data_type, column)
            }
            Serialization::Map(map) => map.enumerate_streams(path, visitor, data_type, column),
            Serialization::LowCardinality(lc) => {
                lc.enumerate_streams(self, path, visitor, data_type, column)
            }
            Serialization::Sparse(sparse) => {
                sparse.enumerate_streams(self, path, visitor, data_type, column)
            }
        }
    }

    /// Writes rows `offset..offset + limit` of `column` to a single stream.
    ///
    /// Fails with `MultipleStreamsRequired` for codecs that decompose into
    /// several streams.
    pub fn serialize_bulk(
        &self,
        column: &Column,
        stream: &mut dyn SealingWrite,
        offset: usize,
        limit: usize,
    ) -> Result<()> {
        match self {
            Serialization::Plain(plain) => plain.serialize(column, stream, offset, limit),
            _ => Err(Error::multiple_streams_required(
                column.structure_name(),
                "serialized",
            )),
        }
    }

    /// Reads up to `limit` rows from a single stream and appends them to
    /// `column`.
    ///
    /// Fails with `MultipleStreamsRequired` for codecs that decompose into
    /// several streams.
    pub fn deserialize_bulk(
        &self,
        column: &mut Column,
        stream: &mut ReadCursor,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<()> {
        match self {
            Serialization::Plain(plain) => {
                plain.deserialize(column, stream, limit, avg_value_size_hint)
            }
            _ => Err(Error::multiple_streams_required(
                column.structure_name(),
                "deserialized",
            )),
        }
    }

    /// Writes rows `offset..offset + limit` of `column` through the streams
    /// provided by the settings' locator. Streams the locator does not
    /// provide are skipped.
    pub fn serialize_bulk_with_streams(
        &self,
        column: &Column,
        offset: usize,
        limit: usize,
        settings: &mut SerializeBulkSettings<'_>,
        state: &mut SerializeBulkState,
    ) -> Result<()> {
        match self {
            Serialization::Plain(_) => {
                serialize_single_stream(self, column, offset, limit, settings)
            }
            Serialization::Array(array) => {
                array.serialize_with_streams(column, offset, limit, settings, state)
            }
            Serialization::Nullable(nullable) => {
                nullable.serialize_with_streams(column, offset, limit, settings, state)
            }
            Serialization::Tuple(tuple) => {
                tuple.serialize_with_streams(column, offset, limit, settings, state)
            }
            Serialization::Map(map) => {
                map.serialize_with_streams(column, offset, limit, settings, state)
            }
            Serialization::LowCardinality(lc) => {
                lc.serialize_with_streams(column, offset, limit, settings, state)
            }
            Serialization::Sparse(sparse) => {
                sparse.serialize_with_streams(column, offset, limit, settings, state)
            }
        }
    }

    /// Reads up to `limit` rows through the streams provided by the
    /// settings' locator and appends them to `column`.
    ///
    /// Subcolumns found in `cache` are reused without reading; subcolumns
    /// read from a stream are added to it.
    pub fn deserialize_bulk_with_streams(
        &self,
        column: &mut ColumnRef,
        limit: usize,
        settings: &mut DeserializeBulkSettings<'_>,
        state: &mut DeserializeBulkState,
        cache: Option<&mut SubstreamsCache>,
    ) -> Result<()> {
        match self {
            Serialization::Plain(_) => {
                deserialize_single_stream(self, column, limit, settings, cache)
            }
            Serialization::Array(array) => {
                array.deserialize_with_streams(column, limit, settings, state, cache)
            }
            Serialization::Nullable(nullable) => {
                nullable.deserialize_with_streams(column, limit, settings, state, cache)
            }
            Serialization::Tuple(tuple) => {
                tuple.deserialize_with_streams(column, limit, settings, state, cache)
            }
            Serialization::Map(map) => {
                map.deserialize_with_streams(column, limit, settings, state, cache)
            }
            Serialization::LowCardinality(lc) => {
                lc.deserialize_with_streams(column, limit, settings, state)
            }
            Serialization::Sparse(sparse) => {
                sparse.deserialize_with_streams(column, limit, settings, state, cache)
            }
        }
    }
}

impl fmt::Display for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Serialization::Plain(plain) => write!(f, "{}", plain.kind()),
            Serialization::Array(array) => write!(f, "Array({})", array.nested()),
            Serialization::Nullable(nullable) => write!(f, "Nullable({})", nullable.nested()),
            Serialization::Tuple(tuple) => {
                f.write_str("Tuple(")?;
                for (i, element) in tuple.elements().iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", element.name, element.serialization)?;
                }
                f.write_str(")")
            }
            Serialization::Map(map) => write!(f, "Map({}, {})", map.key(), map.value()),
            Serialization::LowCardinality(lc) => write!(f, "LowCardinality({})", lc.dictionary()),
            Serialization::Sparse(sparse) => write!(f, "Sparse({})", sparse.nested()),
        }
    }
}

/// Builds the codec tree for `data_type`.
pub fn default_serialization(
    data_type: &DataType,
    config: &SerializationConfig,
) -> Result<SerializationRef> {
    if let Some(kind) = ScalarKind::from_data_type(data_type) {
        return Ok(Serialization::plain(kind));
    }
    Ok(match data_type {
        DataType::Array(item) => Serialization::array(default_serialization(item, config)?),
        DataType::Nullable(inner) => {
            if nullable_through_arrays(inner) {
                return Err(Error::invalid_arg(
                    "data_type",
                    format!(
                        "{inner} cannot be inside Nullable: its null map would share the \
                         stream of the outer one"
                    ),
                ));
            }
            Serialization::nullable(default_serialization(inner, config)?)
        }
        DataType::Tuple(fields) => Serialization::tuple(
            fields
                .iter()
                .map(|field| {
                    Ok(TupleElementSerialization::new(
                        field.name.clone(),
                        default_serialization(&field.data_type, config)?,
                        config.escape_tuple_delimiter,
                    ))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        DataType::Map(key, value) => Serialization::map(
            default_serialization(key, config)?,
            default_serialization(value, config)?,
            config.escape_tuple_delimiter,
        ),
        DataType::LowCardinality(inner) => {
            let kind = ScalarKind::from_data_type(inner).ok_or_else(|| {
                Error::invalid_arg(
                    "data_type",
                    format!("dictionary keys must be scalar, got {inner}"),
                )
            })?;
            Serialization::low_cardinality(Serialization::plain(kind))
        }
        _ => {
            return Err(Error::not_implemented(format!(
                "serialization of {data_type}"
            )));
        }
    })
}

/// Returns `true` if a `Nullable` is reachable from `data_type` through
/// arrays only. No named node separates its null map from an enclosing one.
fn nullable_through_arrays(data_type: &DataType) -> bool {
    match data_type {
        DataType::Nullable(_) => true,
        DataType::Array(item) => nullable_through_arrays(item),
        _ => false,
    }
}

/// Builds the codec tree for a column about to be written, switching scalar
/// columns dominated by default values to sparse serialization.
pub fn choose_serialization(
    data_type: &DataType,
    column: &Column,
    config: &SerializationConfig,
) -> Result<SerializationRef> {
    let serialization = default_serialization(data_type, config)?;
    if !serialization.is_plain() || column.is_empty() {
        return Ok(serialization);
    }
    let ratio = column.default_ratio();
    if ratio >= config.ratio_of_defaults_for_sparse {
        debug!(
            "using sparse serialization for {data_type}: {:.3} of {} rows are defaults",
            ratio,
            column.len()
        );
        return Ok(Serialization::sparse(serialization));
    }
    Ok(serialization)
}

pub(crate) fn type_mismatch(expected: &str, actual: &DataType) -> Error {
    Error::invalid_arg("data_type", format!("expected {expected}, got {actual}"))
}

pub(crate) fn column_mismatch(expected: &str, actual: &Column) -> Error {
    Error::invalid_arg(
        "column",
        format!("expected {expected} column, got {}", actual.structure_name()),
    )
}
