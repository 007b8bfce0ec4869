//! Arrays: a sizes stream with one length per row, followed by the streams
//! of the flattened items.

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
pub struct ArraySerialization {
    nested: SerializationRef,
}

impl ArraySerialization {
    pub fn new(nested: SerializationRef) -> ArraySerialization {
        ArraySerialization { nested }
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
        let item_type = match data_type.as_deref() {
            Some(DataType::Array(item)) => Some(item.clone()),
            Some(other) => return Err(type_mismatch("Array", other)),
            None => None,
        };
        let array = match column.as_deref() {
            Some(Column::Array(array)) => Some(array),
            Some(other) => return Err(column_mismatch("Array", other)),
            None => None,
        };

        let own = SubstreamData::new(this.clone())
            .with_type(data_type.clone())
            .with_column(column.clone());

        let mut path = path.push_scoped(Substream::with_data(SubstreamKind::ArraySizes, own.clone()));
        enumerate_leaf(
            &Serialization::plain(ScalarKind::UInt64),
            &mut path,
            visitor,
            Some(DataType::UInt64.into_ref()),
            array.map(|a| Column::UInt64(a.offsets.sizes()).into_ref()),
        )?;

        path.replace(Substream::with_data(
            SubstreamKind::ArrayElements,
            own.with_creator(SubcolumnCreator::Array {
                offsets: array.map(|a| a.offsets.clone()),
            }),
        ));
        self.nested.enumerate_streams(
            &mut path,
            visitor,
            item_type,
            array.map(|a| a.values.clone()),
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
        let Column::Array(array) = column else {
            return Err(column_mismatch("Array", column));
        };
        let range = row_range(array.offsets.item_count(), offset, limit)?;
        let states = state.nested_mut(1)?;

        let sizes = Column::UInt64(array.offsets.sizes_range(range.start, range.len()));
        settings.with_substream(SubstreamKind::ArraySizes, |settings| {
            serialize_single_stream(&sizes_serialization(), &sizes, 0, sizes.len(), settings)
        })?;

        let items = array.offsets.span_of(range.start, range.len());
        settings.with_substream(SubstreamKind::ArrayElements, |settings| {
            self.nested.serialize_bulk_with_streams(
                &array.values,
                items.start as usize,
                (items.end - items.start) as usize,
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
        let Column::Array(array) = Arc::make_mut(column) else {
            return Err(column_mismatch("Array", column));
        };

        let mut sizes = Column::UInt64(Vec::new()).into_ref();
        settings.with_substream(SubstreamKind::ArraySizes, |settings| {
            deserialize_single_stream(
                &sizes_serialization(),
                &mut sizes,
                limit,
                settings,
                cache.as_deref_mut(),
            )
        })?;
        let Column::UInt64(sizes) = sizes.as_ref() else {
            return Err(Error::invalid_format("array sizes", "sizes must be UInt64"));
        };
        let item_count = sizes.iter().sum::<u64>() as usize;
        array.offsets.extend_from_sizes(sizes);

        let before = array.values.len();
        settings.with_substream(SubstreamKind::ArrayElements, |settings| {
            self.nested.deserialize_bulk_with_streams(
                &mut array.values,
                item_count,
                settings,
                &mut states[0],
                cache,
            )
        })?;

        // An omitted items stream leaves the values untouched.
        let read = array.values.len() - before;
        if read != 0 && read != item_count {
            return Err(Error::invalid_format(
                "array items",
                format!("expected {item_count} items, read {read}"),
            ));
        }
        Ok(())
    }
}

fn sizes_serialization() -> Serialization {
    Serialization::Plain(PlainSerialization::new(ScalarKind::UInt64))
}
