//! In-memory column values.

use std::{fmt, sync::Arc};

use substream_common::{Result, error::Error, verify_arg};
use substream_format::{DataType, data_type::TupleField};

use crate::offsets::Offsets;

/// Shared, immutable handle to a column value.
pub type ColumnRef = Arc<Column>;

/// A materialized column: a sequence of values of one logical type.
///
/// Composite columns own their children through [`ColumnRef`] handles, so
/// sub-structure (array items, tuple elements, dictionary keys) can be
/// shared between a column and the subcolumns carved out of it.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    UInt8(Vec<u8>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    String(Vec<String>),
    Array(ArrayColumn),
    Nullable(NullableColumn),
    Tuple(TupleColumn),
    Map(MapColumn),
    LowCardinality(DictionaryColumn),
}

/// Flattened items plus per-row offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayColumn {
    pub offsets: Offsets,
    pub values: ColumnRef,
}

impl ArrayColumn {
    pub fn try_new(offsets: Offsets, values: ColumnRef) -> Result<ArrayColumn> {
        verify_arg!(offsets, offsets.last() as usize == values.len());
        Ok(ArrayColumn { offsets, values })
    }
}

/// Values of the nested column plus a null map (`1` - null, `0` - value).
#[derive(Debug, Clone, PartialEq)]
pub struct NullableColumn {
    pub null_map: Vec<u8>,
    pub nested: ColumnRef,
}

impl NullableColumn {
    pub fn try_new(null_map: Vec<u8>, nested: ColumnRef) -> Result<NullableColumn> {
        verify_arg!(null_map, null_map.len() == nested.len());
        Ok(NullableColumn { null_map, nested })
    }

    pub fn is_null(&self, index: usize) -> bool {
        self.null_map[index] != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleColumn {
    pub elements: Vec<ColumnRef>,
}

impl TupleColumn {
    pub fn try_new(elements: Vec<ColumnRef>) -> Result<TupleColumn> {
        verify_arg!(elements, !elements.is_empty());
        let len = elements[0].len();
        verify_arg!(elements, elements.iter().all(|e| e.len() == len));
        Ok(TupleColumn { elements })
    }
}

/// Key-value map stored as its nested `Array(Tuple(keys, values))` column.
#[derive(Debug, Clone, PartialEq)]
pub struct MapColumn {
    nested: ColumnRef,
}

impl MapColumn {
    pub fn try_new(nested: ColumnRef) -> Result<MapColumn> {
        let Column::Array(array) = nested.as_ref() else {
            return Err(Error::invalid_arg("nested", "map must wrap an array column"));
        };
        match array.values.as_ref() {
            Column::Tuple(tuple) if tuple.elements.len() == 2 => Ok(MapColumn { nested }),
            _ => Err(Error::invalid_arg(
                "nested",
                "map array items must be a (keys, values) tuple",
            )),
        }
    }

    /// Builds a map column from flattened keys and values and per-row entry offsets.
    pub fn from_parts(keys: Column, values: Column, offsets: Offsets) -> Result<MapColumn> {
        let entries = TupleColumn::try_new(vec![Arc::new(keys), Arc::new(values)])?;
        let array = ArrayColumn::try_new(offsets, Arc::new(Column::Tuple(entries)))?;
        MapColumn::try_new(Arc::new(Column::Array(array)))
    }

    /// The nested `Array(Tuple(keys, values))` column.
    pub fn nested(&self) -> &ColumnRef {
        &self.nested
    }

    /// Mutable access to the nested column for in-place decoding.
    ///
    /// The caller must leave an `Array(Tuple(keys, values))` behind.
    pub fn nested_mut(&mut self) -> &mut ColumnRef {
        &mut self.nested
    }

    fn entries(&self) -> (&ArrayColumn, &TupleColumn) {
        match self.nested.as_ref() {
            Column::Array(array) => match array.values.as_ref() {
                Column::Tuple(tuple) => (array, tuple),
                _ => unreachable!("validated by MapColumn::try_new"),
            },
            _ => unreachable!("validated by MapColumn::try_new"),
        }
    }

    pub fn offsets(&self) -> &Offsets {
        &self.entries().0.offsets
    }

    pub fn keys(&self) -> &ColumnRef {
        &self.entries().1.elements[0]
    }

    pub fn values(&self) -> &ColumnRef {
        &self.entries().1.elements[1]
    }
}

/// Dictionary of distinct keys plus one index into it per row.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryColumn {
    pub dictionary: ColumnRef,
    pub indexes: Vec<u32>,
}

impl DictionaryColumn {
    pub fn try_new(dictionary: ColumnRef, indexes: Vec<u32>) -> Result<DictionaryColumn> {
        let dict_len = dictionary.len();
        verify_arg!(indexes, indexes.iter().all(|&i| (i as usize) < dict_len));
        Ok(DictionaryColumn {
            dictionary,
            indexes,
        })
    }

    /// Dictionary-encodes a scalar column, keeping keys in first-seen order.
    pub fn encode(values: &Column) -> Result<DictionaryColumn> {
        let mut lookup = ahash::AHashMap::<ScalarKey, u32>::new();
        let mut positions = Vec::new();
        let mut indexes = Vec::with_capacity(values.len());
        for i in 0..values.len() {
            let key = values.key_at(i).ok_or_else(|| {
                Error::invalid_arg("values", "dictionary keys must be scalar")
            })?;
            let next = lookup.len() as u32;
            let index = *lookup.entry(key).or_insert_with(|| {
                positions.push(i as u64);
                next
            });
            indexes.push(index);
        }
        Ok(DictionaryColumn {
            dictionary: Arc::new(values.gather(&positions)?),
            indexes,
        })
    }

    /// Expands the dictionary back into one value per row.
    pub fn to_full(&self) -> Result<Column> {
        let positions = self.indexes.iter().map(|&i| i as u64).collect::<Vec<_>>();
        self.dictionary.gather(&positions)
    }
}

/// Hashable identity of a scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKey {
    UInt(u64),
    Int(i64),
    /// Bit pattern of a float.
    Float(u64),
    String(String),
}

impl Column {
    /// Creates an empty column shaped after `data_type`.
    pub fn new_empty(data_type: &DataType) -> Column {
        match data_type {
            DataType::UInt8 => Column::UInt8(Vec::new()),
            DataType::UInt32 => Column::UInt32(Vec::new()),
            DataType::UInt64 => Column::UInt64(Vec::new()),
            DataType::Int32 => Column::Int32(Vec::new()),
            DataType::Int64 => Column::Int64(Vec::new()),
            DataType::Float64 => Column::Float64(Vec::new()),
            DataType::String => Column::String(Vec::new()),
            DataType::Array(item) => Column::Array(ArrayColumn {
                offsets: Offsets::new(),
                values: Arc::new(Column::new_empty(item)),
            }),
            DataType::Nullable(inner) => Column::Nullable(NullableColumn {
                null_map: Vec::new(),
                nested: Arc::new(Column::new_empty(inner)),
            }),
            DataType::Tuple(fields) => Column::Tuple(TupleColumn {
                elements: fields
                    .iter()
                    .map(|TupleField { data_type, .. }| Arc::new(Column::new_empty(data_type)))
                    .collect(),
            }),
            DataType::Map(key, value) => Column::Map(MapColumn {
                nested: Arc::new(Column::new_empty(&DataType::map_nested_type(key, value))),
            }),
            DataType::LowCardinality(inner) => Column::LowCardinality(DictionaryColumn {
                dictionary: Arc::new(Column::new_empty(inner)),
                indexes: Vec::new(),
            }),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::UInt8(v) => v.len(),
            Column::UInt32(v) => v.len(),
            Column::UInt64(v) => v.len(),
            Column::Int32(v) => v.len(),
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Array(array) => array.offsets.item_count(),
            Column::Nullable(nullable) => nullable.null_map.len(),
            Column::Tuple(tuple) => tuple.elements.first().map_or(0, |e| e.len()),
            Column::Map(map) => map.nested.len(),
            Column::LowCardinality(dict) => dict.indexes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Column::Array(_)
                | Column::Nullable(_)
                | Column::Tuple(_)
                | Column::Map(_)
                | Column::LowCardinality(_)
        )
    }

    /// Wraps `self` into a shared handle.
    pub fn into_ref(self) -> ColumnRef {
        Arc::new(self)
    }

    /// Returns the identity of the scalar value at `index`, `None` for
    /// composite columns or an index past the end.
    pub fn key_at(&self, index: usize) -> Option<ScalarKey> {
        match self {
            Column::UInt8(v) => v.get(index).map(|&x| ScalarKey::UInt(x as u64)),
            Column::UInt32(v) => v.get(index).map(|&x| ScalarKey::UInt(x as u64)),
            Column::UInt64(v) => v.get(index).map(|&x| ScalarKey::UInt(x)),
            Column::Int32(v) => v.get(index).map(|&x| ScalarKey::Int(x as i64)),
            Column::Int64(v) => v.get(index).map(|&x| ScalarKey::Int(x)),
            Column::Float64(v) => v.get(index).map(|x| ScalarKey::Float(x.to_bits())),
            Column::String(v) => v.get(index).map(|x| ScalarKey::String(x.clone())),
            _ => None,
        }
    }

    /// Appends `count` default rows: zero scalars, empty arrays and maps,
    /// nulls. A dictionary column gets its default key added when missing.
    pub fn push_defaults(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        match self {
            Column::UInt8(v) => v.resize(v.len() + count, 0),
            Column::UInt32(v) => v.resize(v.len() + count, 0),
            Column::UInt64(v) => v.resize(v.len() + count, 0),
            Column::Int32(v) => v.resize(v.len() + count, 0),
            Column::Int64(v) => v.resize(v.len() + count, 0),
            Column::Float64(v) => v.resize(v.len() + count, 0.0),
            Column::String(v) => v.resize(v.len() + count, String::new()),
            Column::Array(array) => array.offsets.extend_from_sizes(&vec![0; count]),
            Column::Nullable(nullable) => {
                nullable.null_map.resize(nullable.null_map.len() + count, 1);
                Arc::make_mut(&mut nullable.nested).push_defaults(count)?;
            }
            Column::Tuple(tuple) => {
                for element in &mut tuple.elements {
                    Arc::make_mut(element).push_defaults(count)?;
                }
            }
            Column::Map(map) => Arc::make_mut(&mut map.nested).push_defaults(count)?,
            Column::LowCardinality(dict) => {
                let existing =
                    (0..dict.dictionary.len()).find(|&i| dict.dictionary.is_default_at(i));
                let index = match existing {
                    Some(i) => i,
                    None => {
                        let dictionary = Arc::make_mut(&mut dict.dictionary);
                        dictionary.push_defaults(1)?;
                        dictionary.len() - 1
                    }
                };
                dict.indexes.resize(dict.indexes.len() + count, index as u32);
            }
        }
        Ok(())
    }

    /// Collects the scalar values at `positions` into a new column.
    pub fn gather(&self, positions: &[u64]) -> Result<Column> {
        fn pick<T: Clone>(values: &[T], positions: &[u64]) -> Result<Vec<T>> {
            positions
                .iter()
                .map(|&p| {
                    values
                        .get(p as usize)
                        .cloned()
                        .ok_or_else(|| Error::invalid_arg("positions", "position out of range"))
                })
                .collect()
        }

        Ok(match self {
            Column::UInt8(v) => Column::UInt8(pick(v, positions)?),
            Column::UInt32(v) => Column::UInt32(pick(v, positions)?),
            Column::UInt64(v) => Column::UInt64(pick(v, positions)?),
            Column::Int32(v) => Column::Int32(pick(v, positions)?),
            Column::Int64(v) => Column::Int64(pick(v, positions)?),
            Column::Float64(v) => Column::Float64(pick(v, positions)?),
            Column::String(v) => Column::String(pick(v, positions)?),
            _ => return Err(Error::invalid_operation(format!("gather on {}", self.structure_name()))),
        })
    }

    /// Appends all rows of another scalar column of the same kind.
    pub fn extend_from(&mut self, other: &Column) -> Result<()> {
        match (self, other) {
            (Column::UInt8(dst), Column::UInt8(src)) => dst.extend_from_slice(src),
            (Column::UInt32(dst), Column::UInt32(src)) => dst.extend_from_slice(src),
            (Column::UInt64(dst), Column::UInt64(src)) => dst.extend_from_slice(src),
            (Column::Int32(dst), Column::Int32(src)) => dst.extend_from_slice(src),
            (Column::Int64(dst), Column::Int64(src)) => dst.extend_from_slice(src),
            (Column::Float64(dst), Column::Float64(src)) => dst.extend_from_slice(src),
            (Column::String(dst), Column::String(src)) => dst.extend_from_slice(src),
            (dst, src) => {
                return Err(Error::invalid_operation(format!(
                    "append {} to {}",
                    src.structure_name(),
                    dst.structure_name()
                )));
            }
        }
        Ok(())
    }

    /// Name describing the shape of the column, e.g. `Array(Nullable(Int32))`.
    pub fn structure_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::UInt8(_) => f.write_str("UInt8"),
            Column::UInt32(_) => f.write_str("UInt32"),
            Column::UInt64(_) => f.write_str("UInt64"),
            Column::Int32(_) => f.write_str("Int32"),
            Column::Int64(_) => f.write_str("Int64"),
            Column::Float64(_) => f.write_str("Float64"),
            Column::String(_) => f.write_str("String"),
            Column::Array(array) => write!(f, "Array({})", array.values),
            Column::Nullable(nullable) => write!(f, "Nullable({})", nullable.nested),
            Column::Tuple(tuple) => {
                f.write_str("Tuple(")?;
                for (i, element) in tuple.elements.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(")")
            }
            Column::Map(map) => write!(f, "Map({}, {})", map.keys(), map.values()),
            Column::LowCardinality(dict) => write!(f, "LowCardinality({})", dict.dictionary),
        }
    }
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for Column {
                fn from(values: Vec<$t>) -> Column {
                    Column::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec!(
    u8 => UInt8,
    u32 => UInt32,
    u64 => UInt64,
    i32 => Int32,
    i64 => Int64,
    f64 => Float64,
    String => String,
);

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Column {
        Column::String(values.into_iter().map(str::to_string).collect())
    }
}
