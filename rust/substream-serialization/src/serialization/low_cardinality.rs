//! Dictionary-encoded values.
//!
//! The dictionary is global to a column: every write call appends only the
//! keys not written before to the `.dict` stream, and writes one `u32`
//! index per row into the global dictionary to the indexes stream. Each
//! call starts its indexes with a header of two `u64` values: the number of
//! rows and the number of keys appended to the dictionary by that call.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, trace};
use substream_column::{
    Column, ColumnRef,
    column::{DictionaryColumn, ScalarKey},
};
use substream_common::{Result, error::Error, verify_data};
use substream_format::{DataType, DataTypeRef};

use crate::{
    bulk::{
        DeserializeBulkSettings, DeserializeBulkState, SerializeBulkSettings, SerializeBulkState,
        row_range,
    },
    enumerate::{StreamVisitor, enumerate_leaf},
    path::{Substream, SubstreamData, SubstreamKind, SubstreamPath},
};

use super::{
    Serialization, SerializationRef, column_mismatch,
    plain::{ScalarKind, read_values, write_values},
    type_mismatch,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LowCardinalitySerialization {
    dictionary: SerializationRef,
}

/// Keys written so far, mapped to their global index.
#[derive(Debug, Default)]
pub struct DictionaryWriteState {
    lookup: AHashMap<ScalarKey, u32>,
}

impl DictionaryWriteState {
    pub fn dictionary_size(&self) -> usize {
        self.lookup.len()
    }
}

/// Keys read so far and the rows left in the current write chunk.
#[derive(Debug)]
pub struct DictionaryReadState {
    dictionary: ColumnRef,
    rows_left: u64,
}

impl DictionaryReadState {
    pub fn dictionary(&self) -> &ColumnRef {
        &self.dictionary
    }
}

impl LowCardinalitySerialization {
    pub fn new(dictionary: SerializationRef) -> LowCardinalitySerialization {
        LowCardinalitySerialization { dictionary }
    }

    /// Codec of the dictionary keys.
    pub fn dictionary(&self) -> &SerializationRef {
        &self.dictionary
    }

    pub(crate) fn enumerate_streams(
        &self,
        this: &SerializationRef,
        path: &mut SubstreamPath,
        visitor: &mut StreamVisitor<'_>,
        data_type: Option<DataTypeRef>,
        column: Option<ColumnRef>,
    ) -> Result<()> {
        let key_type = match data_type.as_deref() {
            Some(DataType::LowCardinality(inner)) => Some(inner.clone()),
            Some(other) => return Err(type_mismatch("LowCardinality", other)),
            None => None,
        };
        let dict = match column.as_deref() {
            Some(Column::LowCardinality(dict)) => Some(dict),
            Some(other) => return Err(column_mismatch("LowCardinality", other)),
            None => None,
        };

        let own = SubstreamData::new(this.clone())
            .with_type(data_type.clone())
            .with_column(column.clone());

        let mut path = path.push_scoped(Substream::with_data(
            SubstreamKind::DictionaryKeys,
            own.clone(),
        ));
        self.dictionary.enumerate_streams(
            &mut path,
            visitor,
            key_type,
            dict.map(|d| d.dictionary.clone()),
        )?;

        path.replace(Substream::with_data(SubstreamKind::DictionaryIndexes, own));
        enumerate_leaf(
            &Serialization::plain(ScalarKind::UInt32),
            &mut path,
            visitor,
            Some(DataType::UInt32.into_ref()),
            dict.map(|d| Column::UInt32(d.indexes.clone()).into_ref()),
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
        let Column::LowCardinality(dict) = column else {
            return Err(column_mismatch("LowCardinality", column));
        };
        let range = row_range(dict.indexes.len(), offset, limit)?;
        if range.is_empty() {
            return Ok(());
        }
        if !settings.has_substream(SubstreamKind::DictionaryKeys)
            || !settings.has_substream(SubstreamKind::DictionaryIndexes)
        {
            trace!("skipping omitted dictionary streams of {}", settings.path);
            return Ok(());
        }

        let state = state.dictionary_mut()?;
        let (new_keys, indexes) = assign_global_indexes(dict, range, state)?;

        settings.with_substream(SubstreamKind::DictionaryKeys, |settings| {
            self.dictionary
                .serialize_bulk(&new_keys, settings.stream()?, 0, new_keys.len())
        })?;
        settings.with_substream(SubstreamKind::DictionaryIndexes, |settings| {
            let stream = settings.stream()?;
            write_values(&[indexes.len() as u64, new_keys.len() as u64], stream)?;
            write_values(&indexes, stream)
        })?;

        if !new_keys.is_empty() {
            debug!(
                "dictionary of {} grew by {} to {} keys",
                settings.path,
                new_keys.len(),
                state.dictionary_size()
            );
        }
        Ok(())
    }

    pub(crate) fn deserialize_with_streams(
        &self,
        column: &mut ColumnRef,
        limit: usize,
        settings: &mut DeserializeBulkSettings<'_>,
        state: &mut DeserializeBulkState,
    ) -> Result<()> {
        if !settings.has_substream(SubstreamKind::DictionaryKeys)
            || !settings.has_substream(SubstreamKind::DictionaryIndexes)
        {
            trace!("skipping omitted dictionary streams of {}", settings.path);
            return Ok(());
        }

        let state = state.dictionary_mut(|| DictionaryReadState {
            dictionary: Column::new_empty(&self.dictionary.data_type()).into_ref(),
            rows_left: 0,
        })?;
        let hint = settings.avg_value_size_hint;

        let mut indexes = Vec::<u32>::new();
        while indexes.len() < limit {
            if state.rows_left == 0 {
                let header = settings.with_substream(SubstreamKind::DictionaryIndexes, |settings| {
                    let stream = settings.stream()?;
                    if stream.is_eof() {
                        return Ok(None);
                    }
                    let mut header = Vec::<u64>::with_capacity(2);
                    read_values(&mut header, stream, 2)?;
                    verify_data!(header, header.len() == 2);
                    Ok(Some((header[0], header[1])))
                })?;
                let Some((rows, key_count)) = header else {
                    break;
                };

                if key_count != 0 {
                    settings.with_substream(SubstreamKind::DictionaryKeys, |settings| {
                        let keys = Arc::make_mut(&mut state.dictionary);
                        let before = keys.len();
                        self.dictionary.deserialize_bulk(
                            keys,
                            settings.stream()?,
                            key_count as usize,
                            hint,
                        )?;
                        verify_data!(key_count, keys.len() - before == key_count as usize);
                        debug!("dictionary of {} grew to {} keys", settings.path, keys.len());
                        Ok(())
                    })?;
                }
                state.rows_left = rows;
                continue;
            }

            let take = (limit - indexes.len()).min(state.rows_left as usize);
            settings.with_substream(SubstreamKind::DictionaryIndexes, |settings| {
                let before = indexes.len();
                read_values(&mut indexes, settings.stream()?, take)?;
                verify_data!(indexes, indexes.len() - before == take);
                Ok(())
            })?;
            state.rows_left -= take as u64;
        }

        let key_count = state.dictionary.len();
        verify_data!(indexes, indexes.iter().all(|&i| (i as usize) < key_count));

        let Column::LowCardinality(dict) = Arc::make_mut(column) else {
            return Err(column_mismatch("LowCardinality", column));
        };
        if !dict.indexes.is_empty() && dict.dictionary.len() > key_count {
            return Err(Error::invalid_arg(
                "column",
                "column was read with a different dictionary state",
            ));
        }
        dict.dictionary = state.dictionary.clone();
        dict.indexes.extend_from_slice(&indexes);
        Ok(())
    }
}

/// Maps the rows in `range` to global dictionary indexes, registering keys
/// seen for the first time. Returns the new keys in index order.
fn assign_global_indexes(
    dict: &DictionaryColumn,
    range: std::ops::Range<usize>,
    state: &mut DictionaryWriteState,
) -> Result<(Column, Vec<u32>)> {
    let mut new_positions = Vec::new();
    let mut indexes = Vec::with_capacity(range.len());
    for &local in &dict.indexes[range] {
        let key = dict
            .dictionary
            .key_at(local as usize)
            .ok_or_else(|| {
                Error::invalid_arg(
                    "dictionary",
                    format!("index {local} does not address a scalar dictionary key"),
                )
            })?;
        let next = state.lookup.len() as u32;
        let global = *state.lookup.entry(key).or_insert_with(|| {
            new_positions.push(local as u64);
            next
        });
        indexes.push(global);
    }
    Ok((dict.dictionary.gather(&new_positions)?, indexes))
}
