//! Wrapper transforms that rebuild an outer composite from the data of its
//! payload child.

use std::sync::Arc;

use substream_column::{
    Column, ColumnRef, Offsets,
    column::{ArrayColumn, NullableColumn},
};
use substream_common::Result;
use substream_format::{DataType, DataTypeRef};

use crate::serialization::{Serialization, SerializationRef};

/// Rebuilds one wrapping level (type, value and codec) around inner data.
///
/// Captured by the payload-child node of a composite during enumeration,
/// together with the structure of the wrapper (offsets, null map, sparse
/// positions) when a value is being walked.
#[derive(Debug, Clone, PartialEq)]
pub enum SubcolumnCreator {
    Array {
        offsets: Option<Offsets>,
    },
    Nullable {
        null_map: Option<Vec<u8>>,
    },
    Sparse {
        positions: Option<Vec<u64>>,
        len: usize,
    },
}

impl SubcolumnCreator {
    pub fn create_type(&self, inner: DataTypeRef) -> DataTypeRef {
        match self {
            SubcolumnCreator::Array { .. } => DataType::array(inner),
            SubcolumnCreator::Nullable { .. } => DataType::nullable(inner),
            SubcolumnCreator::Sparse { .. } => inner,
        }
    }

    pub fn create_serialization(&self, inner: SerializationRef) -> SerializationRef {
        match self {
            SubcolumnCreator::Array { .. } => Serialization::array(inner),
            SubcolumnCreator::Nullable { .. } => Serialization::nullable(inner),
            SubcolumnCreator::Sparse { .. } => Serialization::sparse(inner),
        }
    }

    /// Wraps `inner` using the captured structure. Returns `None` if no
    /// structure was captured.
    pub fn create_column(&self, inner: ColumnRef) -> Result<Option<ColumnRef>> {
        let column = match self {
            SubcolumnCreator::Array { offsets } => {
                let Some(offsets) = offsets else {
                    return Ok(None);
                };
                Column::Array(ArrayColumn::try_new(offsets.clone(), inner)?)
            }
            SubcolumnCreator::Nullable { null_map } => {
                let Some(null_map) = null_map else {
                    return Ok(None);
                };
                Column::Nullable(NullableColumn::try_new(null_map.clone(), inner)?)
            }
            SubcolumnCreator::Sparse { positions, len } => {
                let Some(positions) = positions else {
                    return Ok(None);
                };
                Column::from_sparse(&inner, positions, *len)?
            }
        };
        Ok(Some(Arc::new(column)))
    }
}
