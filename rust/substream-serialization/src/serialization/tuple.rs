//! Tuples: the streams of every element, each under a named node.

use std::sync::Arc;

use substream_column::{Column, ColumnRef};
use substream_common::{Result, error::Error, verify_arg};
use substream_format::{DataType, DataTypeRef};

use crate::{
    bulk::{DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState},
    cache::SubstreamsCache,
    enumerate::StreamVisitor,
    path::{Substream, SubstreamData, SubstreamKind, SubstreamPath},
};

use super::{SerializationRef, column_mismatch, type_mismatch};

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElementSerialization {
    pub name: String,
    pub serialization: SerializationRef,
    /// Write `%2E` instead of `.` in front of the element name in physical
    /// stream names.
    pub escape_delimiter: bool,
}

impl TupleElementSerialization {
    pub fn new(
        name: impl Into<String>,
        serialization: SerializationRef,
        escape_delimiter: bool,
    ) -> TupleElementSerialization {
        TupleElementSerialization {
            name: name.into(),
            serialization,
            escape_delimiter,
        }
    }

    fn substream_kind(&self) -> SubstreamKind {
        SubstreamKind::tuple_element(self.name.clone(), self.escape_delimiter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleSerialization {
    elements: Vec<TupleElementSerialization>,
}

impl TupleSerialization {
    pub fn new(elements: Vec<TupleElementSerialization>) -> TupleSerialization {
        TupleSerialization { elements }
    }

    pub fn elements(&self) -> &[TupleElementSerialization] {
        &self.elements
    }

    pub(crate) fn enumerate_streams(
        &self,
        this: &SerializationRef,
        path: &mut SubstreamPath,
        visitor: &mut StreamVisitor<'_>,
        data_type: Option<DataTypeRef>,
        column: Option<ColumnRef>,
    ) -> Result<()> {
        let fields = match data_type.as_deref() {
            Some(DataType::Tuple(fields)) if fields.len() == self.elements.len() => Some(fields),
            Some(other) => return Err(type_mismatch(&this.to_string(), other)),
            None => None,
        };
        let tuple = match column.as_deref() {
            Some(Column::Tuple(tuple)) if tuple.elements.len() == self.elements.len() => {
                Some(tuple)
            }
            Some(other) => return Err(column_mismatch("Tuple", other)),
            None => None,
        };
        if self.elements.is_empty() {
            return Ok(());
        }

        let own = SubstreamData::new(this.clone())
            .with_type(data_type.clone())
            .with_column(column.clone());

        let mut path = path.push_scoped(Substream::with_data(
            self.elements[0].substream_kind(),
            own.clone(),
        ));
        for (i, element) in self.elements.iter().enumerate() {
            if i != 0 {
                path.replace(Substream::with_data(element.substream_kind(), own.clone()));
            }
            element.serialization.enumerate_streams(
                &mut path,
                visitor,
                fields.map(|f| f[i].data_type.clone()),
                tuple.map(|t| t.elements[i].clone()),
            )?;
        }
        Ok(())
    }

    pub(crate) fn serialize_with_streams(
        &self,
        column: &Column,
        offset: usize,
        limit: usize,
        settings: &mut SerializeBulkSettings<'_>,
        state: &mut SerializeBulkState,
    ) -> Result<()> {
        let Column::Tuple(tuple) = column else {
            return Err(column_mismatch("Tuple", column));
        };
        verify_arg!(column, tuple.elements.len() == self.elements.len());
        let states = state.nested_mut(self.elements.len())?;

        for ((element, values), state) in self.elements.iter().zip(&tuple.elements).zip(states) {
            settings.with_substream(element.substream_kind(), |settings| {
                element
                    .serialization
                    .serialize_bulk_with_streams(values, offset, limit, settings, state)
            })?;
        }
        Ok(())
    }

    pub(crate) fn deserialize_with_streams(
        &self,
        column: &mut ColumnRef,
        limit: usize,
        settings: &mut DeserializeBulkSettings<'_>,
        state: &mut DeserializeBulkState,
        mut cache: Option<&mut SubstreamsCache>,
    ) -> Result<()> {
        let states = state.nested_mut(self.elements.len())?;
        let Column::Tuple(tuple) = Arc::make_mut(column) else {
            return Err(column_mismatch("Tuple", column));
        };
        if tuple.elements.len() != self.elements.len() {
            return Err(Error::invalid_arg(
                "column",
                format!(
                    "tuple has {} elements, serialization expects {}",
                    tuple.elements.len(),
                    self.elements.len()
                ),
            ));
        }

        let mut read = Vec::with_capacity(self.elements.len());
        for ((element, values), state) in
            self.elements.iter().zip(&mut tuple.elements).zip(states)
        {
            let before = values.len();
            settings.with_substream(element.substream_kind(), |settings| {
                element.serialization.deserialize_bulk_with_streams(
                    values,
                    limit,
                    settings,
                    state,
                    cache.as_deref_mut(),
                )
            })?;
            read.push(values.len().saturating_sub(before));
        }
        align_elements(&self.elements, &mut tuple.elements, &read)
    }
}

/// Pads the elements whose streams were omitted with default rows, so that
/// every element gains the same number of rows.
fn align_elements(
    serializations: &[TupleElementSerialization],
    elements: &mut [ColumnRef],
    read: &[usize],
) -> Result<()> {
    let rows = read.iter().copied().max().unwrap_or(0);
    for ((element, values), &count) in serializations.iter().zip(elements).zip(read) {
        match count {
            count if count == rows => {}
            0 => Arc::make_mut(values).push_defaults(rows)?,
            count => {
                return Err(Error::invalid_format(
                    "tuple element",
                    format!("element {} has {count} rows, expected {rows}", element.name),
                ));
            }
        }
    }
    Ok(())
}
