use std::sync::Arc;

use substream_column::{
    Column, Offsets,
    column::{ArrayColumn, DictionaryColumn, MapColumn, NullableColumn, TupleColumn},
};
use substream_format::{DataType, DataTypeRef};

const WORDS: &[&str] = &[
    "", "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
];

/// Parses a type name produced by `DataType`'s `Display`.
pub fn parse_type(name: &str) -> DataTypeRef {
    name.parse::<DataType>().unwrap().into_ref()
}

/// Generates `rows` random values of `data_type`.
pub fn generate_column(rng: &mut fastrand::Rng, data_type: &DataType, rows: usize) -> Column {
    match data_type {
        DataType::UInt8 => Column::UInt8((0..rows).map(|_| rng.u8(..)).collect()),
        DataType::UInt32 => Column::UInt32((0..rows).map(|_| rng.u32(..)).collect()),
        DataType::UInt64 => Column::UInt64((0..rows).map(|_| rng.u64(..)).collect()),
        DataType::Int32 => Column::Int32((0..rows).map(|_| rng.i32(-1000..1000)).collect()),
        DataType::Int64 => Column::Int64((0..rows).map(|_| rng.i64(..)).collect()),
        DataType::Float64 => Column::Float64((0..rows).map(|_| rng.f64() * 100.0 - 50.0).collect()),
        DataType::String => Column::String((0..rows).map(|_| random_word(rng)).collect()),
        DataType::Array(item) => {
            let sizes = (0..rows).map(|_| rng.u64(0..4)).collect::<Vec<_>>();
            let offsets = Offsets::from_sizes(&sizes);
            let values = generate_column(rng, item, offsets.last() as usize);
            Column::Array(ArrayColumn::try_new(offsets, Arc::new(values)).unwrap())
        }
        DataType::Nullable(inner) => {
            let null_map = (0..rows).map(|_| (rng.u8(0..4) == 0) as u8).collect();
            let nested = generate_column(rng, inner, rows);
            Column::Nullable(NullableColumn::try_new(null_map, Arc::new(nested)).unwrap())
        }
        DataType::Tuple(fields) => Column::Tuple(
            TupleColumn::try_new(
                fields
                    .iter()
                    .map(|field| Arc::new(generate_column(rng, &field.data_type, rows)))
                    .collect(),
            )
            .unwrap(),
        ),
        DataType::Map(key, value) => {
            let sizes = (0..rows).map(|_| rng.u64(0..3)).collect::<Vec<_>>();
            let offsets = Offsets::from_sizes(&sizes);
            let entries = offsets.last() as usize;
            Column::Map(
                MapColumn::from_parts(
                    generate_column(rng, key, entries),
                    generate_column(rng, value, entries),
                    offsets,
                )
                .unwrap(),
            )
        }
        DataType::LowCardinality(inner) => {
            let values = generate_column(rng, inner, rows);
            Column::LowCardinality(DictionaryColumn::encode(&values).unwrap())
        }
    }
}

/// Generates a scalar column where roughly `default_ratio` of the rows hold
/// the default value.
pub fn generate_mostly_default(
    rng: &mut fastrand::Rng,
    data_type: &DataType,
    rows: usize,
    default_ratio: f64,
) -> Column {
    let values = generate_column(rng, data_type, rows);
    let positions = (0..rows as u64)
        .filter(|_| rng.f64() >= default_ratio)
        .filter(|&i| !values.is_default_at(i as usize))
        .collect::<Vec<_>>();
    let kept = values.gather(&positions).unwrap();
    Column::from_sparse(&kept, &positions, rows).unwrap()
}

fn random_word(rng: &mut fastrand::Rng) -> String {
    WORDS[rng.usize(..WORDS.len())].to_string()
}
