//! The logical type tree of a stored column.

use std::{fmt, str::FromStr, sync::Arc};

use substream_common::{Result, error::Error};

/// Shared, immutable handle to a data type node.
pub type DataTypeRef = Arc<DataType>;

/// Name of the key element within the nested representation of a `Map`.
pub const MAP_KEYS: &str = "keys";

/// Name of the value element within the nested representation of a `Map`.
pub const MAP_VALUES: &str = "values";

/// Logical type of a column value.
///
/// Scalar types map onto a single physical stream; composite types (`Array`,
/// `Nullable`, `Tuple`, `Map`, `LowCardinality`) decompose into several.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt8,
    UInt32,
    UInt64,
    Int32,
    Int64,
    Float64,
    String,
    /// Variable-length list of values of the inner type.
    Array(DataTypeRef),
    /// The inner type extended with a null value.
    Nullable(DataTypeRef),
    /// Fixed sequence of named elements.
    Tuple(Vec<TupleField>),
    /// Key-value map, stored as `Array(Tuple(keys K, values V))`.
    Map(DataTypeRef, DataTypeRef),
    /// Dictionary-encoded values of the inner type.
    LowCardinality(DataTypeRef),
}

/// A named element of a `Tuple` type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleField {
    pub name: String,
    pub data_type: DataTypeRef,
}

impl TupleField {
    pub fn new(name: impl Into<String>, data_type: DataTypeRef) -> TupleField {
        TupleField {
            name: name.into(),
            data_type,
        }
    }
}

impl DataType {
    pub fn array(item: DataTypeRef) -> DataTypeRef {
        Arc::new(DataType::Array(item))
    }

    pub fn nullable(inner: DataTypeRef) -> DataTypeRef {
        Arc::new(DataType::Nullable(inner))
    }

    pub fn low_cardinality(inner: DataTypeRef) -> DataTypeRef {
        Arc::new(DataType::LowCardinality(inner))
    }

    pub fn map(key: DataTypeRef, value: DataTypeRef) -> DataTypeRef {
        Arc::new(DataType::Map(key, value))
    }

    pub fn tuple<N: Into<String>>(fields: impl IntoIterator<Item = (N, DataTypeRef)>) -> DataTypeRef {
        Arc::new(DataType::Tuple(
            fields
                .into_iter()
                .map(|(name, data_type)| TupleField::new(name, data_type))
                .collect(),
        ))
    }

    /// Wraps `self` into a shared handle.
    pub fn into_ref(self) -> DataTypeRef {
        Arc::new(self)
    }

    /// Returns `true` for types stored as a single plain stream.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            DataType::UInt8
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Int32
                | DataType::Int64
                | DataType::Float64
                | DataType::String
        )
    }

    pub fn is_composite(&self) -> bool {
        !self.is_scalar()
    }

    /// Byte width of a fixed-size scalar, `None` for variable-size and
    /// composite types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            DataType::UInt8 => Some(1),
            DataType::UInt32 => Some(4),
            DataType::Int32 => Some(4),
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => Some(8),
            _ => None,
        }
    }

    /// The physical representation of a `Map(K, V)`:
    /// `Array(Tuple(keys K, values V))`.
    pub fn map_nested_type(key: &DataTypeRef, value: &DataTypeRef) -> DataTypeRef {
        DataType::array(DataType::tuple([
            (MAP_KEYS, key.clone()),
            (MAP_VALUES, value.clone()),
        ]))
    }

    /// Returns the type with any `Nullable` wrapper removed.
    pub fn remove_nullable(self: &Arc<Self>) -> DataTypeRef {
        match self.as_ref() {
            DataType::Nullable(inner) => inner.clone(),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::UInt8 => f.write_str("UInt8"),
            DataType::UInt32 => f.write_str("UInt32"),
            DataType::UInt64 => f.write_str("UInt64"),
            DataType::Int32 => f.write_str("Int32"),
            DataType::Int64 => f.write_str("Int64"),
            DataType::Float64 => f.write_str("Float64"),
            DataType::String => f.write_str("String"),
            DataType::Array(item) => write!(f, "Array({item})"),
            DataType::Nullable(inner) => write!(f, "Nullable({inner})"),
            DataType::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
            DataType::Map(key, value) => write!(f, "Map({key}, {value})"),
            DataType::Tuple(fields) => {
                f.write_str("Tuple(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", field.name, field.data_type)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parses the rendering produced by `Display`, e.g.
    /// `Map(String, Array(Nullable(Int32)))` or `Tuple(a UInt8, b String)`.
    fn from_str(s: &str) -> Result<DataType> {
        parse_type(s)
    }
}

fn parse_type(s: &str) -> Result<DataType> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::invalid_arg("data_type", "empty type name"));
    }

    let Some(open) = s.find('(') else {
        return parse_scalar(s);
    };
    if !s.ends_with(')') {
        return Err(Error::invalid_arg(
            "data_type",
            format!("unbalanced parentheses in '{s}'"),
        ));
    }
    let name = s[..open].trim();
    let args = split_top_level(&s[open + 1..s.len() - 1])?;

    match name {
        "Array" | "Nullable" | "LowCardinality" => {
            let [arg] = args.as_slice() else {
                return Err(Error::invalid_arg(
                    "data_type",
                    format!("{name} expects exactly one argument"),
                ));
            };
            let inner = Arc::new(parse_type(arg)?);
            Ok(match name {
                "Array" => DataType::Array(inner),
                "Nullable" => DataType::Nullable(inner),
                _ => DataType::LowCardinality(inner),
            })
        }
        "Map" => {
            let [key, value] = args.as_slice() else {
                return Err(Error::invalid_arg(
                    "data_type",
                    "Map expects exactly two arguments",
                ));
            };
            Ok(DataType::Map(
                Arc::new(parse_type(key)?),
                Arc::new(parse_type(value)?),
            ))
        }
        "Tuple" => {
            let fields = args
                .iter()
                .map(|arg| parse_tuple_field(arg))
                .collect::<Result<Vec<_>>>()?;
            if fields.is_empty() {
                return Err(Error::invalid_arg("data_type", "empty Tuple"));
            }
            Ok(DataType::Tuple(fields))
        }
        _ => Err(Error::invalid_arg(
            "data_type",
            format!("unknown composite type '{name}'"),
        )),
    }
}

fn parse_scalar(name: &str) -> Result<DataType> {
    Ok(match name {
        "UInt8" => DataType::UInt8,
        "UInt32" => DataType::UInt32,
        "UInt64" => DataType::UInt64,
        "Int32" => DataType::Int32,
        "Int64" => DataType::Int64,
        "Float64" => DataType::Float64,
        "String" => DataType::String,
        _ => {
            return Err(Error::invalid_arg(
                "data_type",
                format!("unknown type '{name}'"),
            ));
        }
    })
}

fn parse_tuple_field(def: &str) -> Result<TupleField> {
    let def = def.trim();
    let split = def
        .find(char::is_whitespace)
        .ok_or_else(|| Error::invalid_arg("data_type", format!("unnamed tuple element '{def}'")))?;
    let name = &def[..split];
    let data_type = parse_type(&def[split..])?;
    Ok(TupleField::new(name, Arc::new(data_type)))
}

/// Splits a comma-separated argument list, ignoring commas nested within
/// parentheses.
fn split_top_level(s: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::invalid_arg("data_type", format!("unbalanced parentheses in '{s}'"))
                })?
            }
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => (),
        }
    }
    if depth != 0 {
        return Err(Error::invalid_arg(
            "data_type",
            format!("unbalanced parentheses in '{s}'"),
        ));
    }
    let last = s[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    Ok(parts)
}
