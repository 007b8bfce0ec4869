//! Maps: stored exactly as their nested `Array(Tuple(keys K, values V))`, so
//! `keys`, `values` and `size0` are addressable subcolumns.

use std::sync::Arc;

use substream_column::{Column, ColumnRef};
use substream_common::Result;
use substream_format::{
    DataType, DataTypeRef,
    data_type::{MAP_KEYS, MAP_VALUES},
};

use crate::{
    bulk::{DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState},
    cache::SubstreamsCache,
    enumerate::StreamVisitor,
    path::SubstreamPath,
};

use super::{
    Serialization, SerializationRef, column_mismatch, tuple::TupleElementSerialization,
    type_mismatch,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MapSerialization {
    key: SerializationRef,
    value: SerializationRef,
    nested: SerializationRef,
}

impl MapSerialization {
    pub fn new(
        key: SerializationRef,
        value: SerializationRef,
        escape_tuple_delimiter: bool,
    ) -> MapSerialization {
        let nested = Serialization::array(Serialization::tuple(vec![
            TupleElementSerialization::new(MAP_KEYS, key.clone(), escape_tuple_delimiter),
            TupleElementSerialization::new(MAP_VALUES, value.clone(), escape_tuple_delimiter),
        ]));
        MapSerialization { key, value, nested }
    }

    pub fn key(&self) -> &SerializationRef {
        &self.key
    }

    pub fn value(&self) -> &SerializationRef {
        &self.value
    }

    /// Codec of the nested `Array(Tuple(keys, values))`.
    pub fn nested(&self) -> &SerializationRef {
        &self.nested
    }

    pub(crate) fn enumerate_streams(
        &self,
        path: &mut SubstreamPath,
        visitor: &mut StreamVisitor<'_>,
        data_type: Option<DataTypeRef>,
        column: Option<ColumnRef>,
    ) -> Result<()> {
        let nested_type = match data_type.as_deref() {
            Some(DataType::Map(key, value)) => Some(DataType::map_nested_type(key, value)),
            Some(other) => return Err(type_mismatch("Map", other)),
            None => None,
        };
        let nested_column = match column.as_deref() {
            Some(Column::Map(map)) => Some(map.nested().clone()),
            Some(other) => return Err(column_mismatch("Map", other)),
            None => None,
        };
        self.nested
            .enumerate_streams(path, visitor, nested_type, nested_column)
    }

    pub(crate) fn serialize_with_streams(
        &self,
        column: &Column,
        offset: usize,
        limit: usize,
        settings: &mut SerializeBulkSettings<'_>,
        state: &mut SerializeBulkState,
    ) -> Result<()> {
        let Column::Map(map) = column else {
            return Err(column_mismatch("Map", column));
        };
        self.nested
            .serialize_bulk_with_streams(map.nested(), offset, limit, settings, state)
    }

    pub(crate) fn deserialize_with_streams(
        &self,
        column: &mut ColumnRef,
        limit: usize,
        settings: &mut DeserializeBulkSettings<'_>,
        state: &mut DeserializeBulkState,
        cache: Option<&mut SubstreamsCache>,
    ) -> Result<()> {
        let Column::Map(map) = Arc::make_mut(column) else {
            return Err(column_mismatch("Map", column));
        };
        self.nested
            .deserialize_bulk_with_streams(map.nested_mut(), limit, settings, state, cache)
    }
}
