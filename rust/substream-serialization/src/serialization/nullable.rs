//! Nullable values: a `UInt8` null map (`1` for null) plus the streams of the
//! payload, which holds a placeholder value for every null row.

use std::sync::Arc;

use substream_column::{Column, ColumnRef};
use substream_common::{Result, error::Error};
use substream_format::{DataType, DataTypeRef};

use crate::{
    bulk::{
        DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState,
        deserialize_single_stream, row_range, serialize_single_stream,
    },
    cache::SubstreamsCache,
    creator::SubcolumnCreator,
    enumerate::{StreamVisitor, enumerate_leaf},
    path::{Substream, SubstreamData, SubstreamKind, SubstreamPath},
};

use super::{
    Serialization, SerializationRef, column_mismatch,
    plain::{PlainSerialization, ScalarKind},
    type_mismatch,
};

#[derive(Debug, Clone, PartialEq)]
pub struct NullableSerialization {
    nested: SerializationRef,
}

impl NullableSerialization {
    pub fn new(nested: SerializationRef) -> NullableSerialization {
        NullableSerialization { nested }
    }

    pub fn nested(&self) -> &SerializationRef {
        &self.nested
    }

    pub(crate) fn enumerate_streams(
        &self,
        this: &SerializationRef,
        path: &mut SubstreamPath,
        visitor: &mut StreamVisitor<'_>,
        data_type: Option<DataTypeRef>,
        column: Option<ColumnRef>,
    ) -> Result<()> {
        let inner_type = match data_type.as_deref() {
            Some(DataType::Nullable(inner)) => Some(inner.clone()),
            Some(other) => return Err(type_mismatch("Nullable", other)),
            None => None,
        };
        let nullable = match column.as_deref() {
            Some(Column::Nullable(nullable)) => Some(nullable),
            Some(other) => return Err(column_mismatch("Nullable", other)),
            None => None,
        };

        let own = SubstreamData::new(this.clone())
            .with_type(data_type.clone())
            .with_column(column.clone());

        let mut path = path.push_scoped(Substream::with_data(SubstreamKind::NullMap, own.clone()));
        enumerate_leaf(
            &Serialization::plain(ScalarKind::UInt8),
            &mut path,
            visitor,
            Some(DataType::UInt8.into_ref()),
            nullable.map(|n| Column::UInt8(n.null_map.clone()).into_ref()),
        )?;

        path.replace(Substream::with_data(
            SubstreamKind::NullableElements,
            own.with_creator(SubcolumnCreator::Nullable {
                null_map: nullable.map(|n| n.null_map.clone()),
            }),
        ));
        self.nested.enumerate_streams(
            &mut path,
            visitor,
            inner_type,
            nullable.map(|n| n.nested.clone()),
        )
    }

    pub(crate) fn serialize_with_streams(
        &self,
        column: &Column,
        offset: usize,
        limit: usize,
        settings: &mut SerializeBulkSettings<'_>,
        state: &mut SerializeBulkState,
    ) -> Result<()> {
        let Column::Nullable(nullable) = column else {
            return Err(column_mismatch("Nullable", column));
        };
        let range = row_range(nullable.null_map.len(), offset, limit)?;
        let states = state.nested_mut(1)?;

        let null_map = Column::UInt8(nullable.null_map[range.clone()].to_vec());
        settings.with_substream(SubstreamKind::NullMap, |settings| {
            serialize_single_stream(&null_map_serialization(), &null_map, 0, null_map.len(), settings)
        })?;

        settings.with_substream(SubstreamKind::NullableElements, |settings| {
            self.nested.serialize_bulk_with_streams(
                &nullable.nested,
                range.start,
                range.len(),
                settings,
                &mut states[0],
            )
        })
    }

    pub(crate) fn deserialize_with_streams(
        &self,
        column: &mut ColumnRef,
        limit: usize,
        settings: &mut DeserializeBulkSettings<'_>,
        state: &mut DeserializeBulkState,
        mut cache: Option<&mut SubstreamsCache>,
    ) -> Result<()> {
        let states = state.nested_mut(1)?;
        let Column::Nullable(nullable) = Arc::make_mut(column) else {
            return Err(column_mismatch("Nullable", column));
        };

        let mut null_map = Column::UInt8(Vec::new()).into_ref();
        settings.with_substream(SubstreamKind::NullMap, |settings| {
            deserialize_single_stream(
                &null_map_serialization(),
                &mut null_map,
                limit,
                settings,
                cache.as_deref_mut(),
            )
        })?;
        let Column::UInt8(null_map) = null_map.as_ref() else {
            return Err(Error::invalid_format("null map", "null map must be UInt8"));
        };

        let before = nullable.nested.len();
        settings.with_substream(SubstreamKind::NullableElements, |settings| {
            self.nested.deserialize_bulk_with_streams(
                &mut nullable.nested,
                limit,
                settings,
                &mut states[0],
                cache,
            )
        })?;
        let read = nullable.nested.len() - before;

        match (null_map.len(), read) {
            (maps, values) if maps == values => nullable.null_map.extend_from_slice(null_map),
            // Null map omitted: every row read is a value.
            (0, values) => nullable.null_map.resize(nullable.null_map.len() + values, 0),
            // Payload omitted: only the null map is wanted.
            (_, 0) => nullable.null_map.extend_from_slice(null_map),
            (maps, values) => {
                return Err(Error::invalid_format(
                    "null map",
                    format!("{maps} null map entries for {values} values"),
                ));
            }
        }
        Ok(())
    }
}

fn null_map_serialization() -> Serialization {
    Serialization::Plain(PlainSerialization::new(ScalarKind::UInt8))
}
