use std::sync::Arc;

use crate::data_type::{DataType, MAP_KEYS, MAP_VALUES};

#[test]
fn test_display_nested_types() {
    let ty = DataType::map(
        Arc::new(DataType::String),
        DataType::array(DataType::nullable(Arc::new(DataType::Int32))),
    );
    assert_eq!(ty.to_string(), "Map(String, Array(Nullable(Int32)))");

    let ty = DataType::tuple([
        ("a", Arc::new(DataType::UInt8)),
        ("b", DataType::low_cardinality(Arc::new(DataType::String))),
    ]);
    assert_eq!(ty.to_string(), "Tuple(a UInt8, b LowCardinality(String))");
}

#[test]
fn test_parse_round_trips_rendering() {
    for s in [
        "UInt8",
        "Float64",
        "Array(Array(Int64))",
        "Nullable(Array(Int32))",
        "Map(String, UInt64)",
        "Tuple(a Int32, b Tuple(c String, d Array(UInt32)))",
        "LowCardinality(Nullable(String))",
        "Map(String, Map(UInt8, Array(String)))",
    ] {
        let ty: DataType = s.parse().unwrap();
        assert_eq!(ty.to_string(), s);
    }
}

#[test]
fn test_parse_tolerates_whitespace() {
    let ty: DataType = " Map( String ,Array( Int32 ) ) ".parse().unwrap();
    assert_eq!(ty.to_string(), "Map(String, Array(Int32))");
}

#[test]
fn test_parse_errors() {
    for s in [
        "",
        "Int128",
        "Array(Int32",
        "Array(Int32, Int64)",
        "Map(String)",
        "Tuple()",
        "Tuple(Int32)",
        "Array(Int32))",
        "Frobnicate(Int32)",
    ] {
        assert!(s.parse::<DataType>().is_err(), "{s} should not parse");
    }
}

#[test]
fn test_map_nested_type() {
    let key = Arc::new(DataType::String);
    let value = Arc::new(DataType::UInt64);
    let nested = DataType::map_nested_type(&key, &value);
    assert_eq!(
        nested.to_string(),
        format!("Array(Tuple({MAP_KEYS} String, {MAP_VALUES} UInt64))")
    );
}

#[test]
fn test_type_properties() {
    assert!(DataType::Int32.is_scalar());
    assert!(DataType::array(Arc::new(DataType::Int32)).is_composite());
    assert_eq!(DataType::UInt8.fixed_width(), Some(1));
    assert_eq!(DataType::Float64.fixed_width(), Some(8));
    assert_eq!(DataType::String.fixed_width(), None);

    let nullable = DataType::nullable(Arc::new(DataType::String));
    assert_eq!(*nullable.remove_nullable(), DataType::String);
    let plain = Arc::new(DataType::Int64);
    assert!(Arc::ptr_eq(&plain.remove_nullable(), &plain));
}
