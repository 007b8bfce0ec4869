//! Sparse scalar values: only the non-default rows are stored.
//!
//! The offsets stream holds, for every non-default row, the number of
//! default rows preceding it within the current write call. Each call ends
//! with the number of trailing default rows, tagged with
//! [`END_OF_CHUNK_FLAG`]. The non-default values go to the payload streams.

use std::sync::Arc;

use log::trace;
use substream_column::{Column, ColumnRef};
use substream_common::{Result, error::Error};
use substream_format::{DataType, DataTypeRef};

use crate::{
    bulk::{
        DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState,
        row_range,
    },
    cache::SubstreamsCache,
    creator::SubcolumnCreator,
    enumerate::{StreamVisitor, enumerate_leaf},
    path::{Substream, SubstreamData, SubstreamKind, SubstreamPath},
};

use super::{
    Serialization, SerializationRef,
    plain::{ScalarKind, read_values, write_values},
};

/// Marks the trailing group of default rows of one write call.
pub const END_OF_CHUNK_FLAG: u64 = 1 << 62;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseSerialization {
    nested: SerializationRef,
}

/// Position of the reader within the current group of default rows.
#[derive(Debug, Default)]
pub struct SparseReadState {
    /// Default rows still to be produced.
    pending_defaults: u64,
    /// A non-default value follows the pending default rows.
    pending_value: bool,
}

impl SparseSerialization {
    /// Wraps the codec of a scalar type.
    pub fn new(nested: SerializationRef) -> SparseSerialization {
        SparseSerialization { nested }
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
        let (positions, values) = match column.as_deref() {
            Some(column) => {
                let positions = column.non_default_positions(0, column.len())?;
                let values = column.gather(&positions)?.into_ref();
                (Some(positions), Some(values))
            }
            None => (None, None),
        };
        let len = column.as_ref().map_or(0, |c| c.len());

        let own = SubstreamData::new(this.clone())
            .with_type(data_type.clone())
            .with_column(column.clone());

        let mut path = path.push_scoped(Substream::with_data(
            SubstreamKind::SparseOffsets,
            own.clone(),
        ));
        enumerate_leaf(
            &Serialization::plain(ScalarKind::UInt64),
            &mut path,
            visitor,
            Some(DataType::UInt64.into_ref()),
            positions.clone().map(|p| Column::UInt64(p).into_ref()),
        )?;

        path.replace(Substream::with_data(
            SubstreamKind::SparseElements,
            own.with_creator(SubcolumnCreator::Sparse { positions, len }),
        ));
        self.nested
            .enumerate_streams(&mut path, visitor, data_type, values)
    }

    pub(crate) fn serialize_with_streams(
        &self,
        column: &Column,
        offset: usize,
        limit: usize,
        settings: &mut SerializeBulkSettings<'_>,
        state: &mut SerializeBulkState,
    ) -> Result<()> {
        let range = row_range(column.len(), offset, limit)?;
        let positions = column.non_default_positions(range.start, range.len())?;
        let states = state.nested_mut(1)?;

        settings.with_substream(SubstreamKind::SparseOffsets, |settings| {
            let Some(stream) = settings.locator.locate(&settings.path) else {
                trace!("skipping omitted substream {}", settings.path);
                return Ok(());
            };
            write_values(&group_sizes(&positions, range.len()), stream)
        })?;

        let absolute = positions
            .iter()
            .map(|&p| p + range.start as u64)
            .collect::<Vec<_>>();
        let values = column.gather(&absolute)?;
        settings.with_substream(SubstreamKind::SparseElements, |settings| {
            self.nested
                .serialize_bulk_with_streams(&values, 0, values.len(), settings, &mut states[0])
        })
    }

    pub(crate) fn deserialize_with_streams(
        &self,
        column: &mut ColumnRef,
        limit: usize,
        settings: &mut DeserializeBulkSettings<'_>,
        state: &mut DeserializeBulkState,
        cache: Option<&mut SubstreamsCache>,
    ) -> Result<()> {
        let state = state.sparse_mut()?;
        let layout = settings.with_substream(SubstreamKind::SparseOffsets, |settings| {
            let Some(stream) = settings.locator.locate(&settings.path) else {
                trace!("skipping omitted substream {}", settings.path);
                return Ok(None);
            };
            let mut rows = 0usize;
            let mut positions = Vec::new();
            loop {
                if state.pending_defaults > 0 {
                    let take = state.pending_defaults.min((limit - rows) as u64);
                    rows += take as usize;
                    state.pending_defaults -= take;
                    if state.pending_defaults > 0 {
                        break;
                    }
                }
                if state.pending_value {
                    if rows == limit {
                        break;
                    }
                    positions.push(rows as u64);
                    rows += 1;
                    state.pending_value = false;
                }
                if rows == limit || stream.is_eof() {
                    break;
                }
                let mut group = Vec::<u64>::with_capacity(1);
                read_values(&mut group, stream, 1)?;
                let [group] = group[..] else {
                    return Err(Error::invalid_format("sparse offsets", "truncated group size"));
                };
                state.pending_defaults = group & !END_OF_CHUNK_FLAG;
                state.pending_value = group & END_OF_CHUNK_FLAG == 0;
            }
            Ok(Some((rows, positions)))
        })?;
        let Some((rows, positions)) = layout else {
            return Ok(());
        };

        let mut values = Column::new_empty(&self.nested.data_type()).into_ref();
        let mut nested_state = DeserializeBulkState::Empty;
        settings.with_substream(SubstreamKind::SparseElements, |settings| {
            self.nested.deserialize_bulk_with_streams(
                &mut values,
                positions.len(),
                settings,
                &mut nested_state,
                cache,
            )
        })?;
        if values.len() != positions.len() {
            return Err(Error::invalid_format(
                "sparse values",
                format!("expected {} values, read {}", positions.len(), values.len()),
            ));
        }

        let full = Column::from_sparse(&values, &positions, rows)?;
        Arc::make_mut(column).extend_from(&full)
    }
}

/// Encodes relative non-default `positions` within `len` rows as the sizes
/// of the default groups preceding each of them, plus the tagged trailing
/// group.
fn group_sizes(positions: &[u64], len: usize) -> Vec<u64> {
    let mut groups = Vec::with_capacity(positions.len() + 1);
    let mut next_row = 0u64;
    for &pos in positions {
        groups.push(pos - next_row);
        next_row = pos + 1;
    }
    groups.push((len as u64 - next_row) | END_OF_CHUNK_FLAG);
    groups
}

#[cfg(test)]
mod tests {
    use super::{END_OF_CHUNK_FLAG, group_sizes};

    #[test]
    fn test_group_sizes() {
        assert_eq!(group_sizes(&[1, 4], 6), vec![1, 2, 1 | END_OF_CHUNK_FLAG]);
        assert_eq!(group_sizes(&[0, 1], 2), vec![0, 0, END_OF_CHUNK_FLAG]);
        assert_eq!(group_sizes(&[], 3), vec![3 | END_OF_CHUNK_FLAG]);
    }
}
