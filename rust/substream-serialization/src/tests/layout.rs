use std::sync::Arc;

use substream_column::Column;
use substream_common::error::Error;
use substream_format::DataType;

use crate::{
    SerializationConfig,
    enumerate::{collect_stream_paths, stream_names},
    path::{SubstreamKind, SubstreamPath},
    serialization::{Serialization, default_serialization},
    tests::data_generator::{generate_column, parse_type},
};

fn names(column_name: &str, type_name: &str, config: &SerializationConfig) -> Vec<String> {
    let serialization = default_serialization(&parse_type(type_name), config).unwrap();
    stream_names(column_name, &serialization).unwrap()
}

#[test]
fn test_stream_names() {
    let config = SerializationConfig::default();
    assert_eq!(names("c", "Int32", &config), vec!["c"]);
    assert_eq!(names("c", "Nullable(Int32)", &config), vec!["c.null", "c"]);
    assert_eq!(
        names("c", "Array(Array(String))", &config),
        vec!["c.size0", "c.size1", "c"]
    );
    assert_eq!(
        names("c", "Array(Nullable(String))", &config),
        vec!["c.size0", "c.null", "c"]
    );
    assert_eq!(
        names("c", "Tuple(a Int32, b Array(String))", &config),
        vec!["c%2Ea", "c%2Eb.size0", "c%2Eb"]
    );
    assert_eq!(
        names("c", "Map(String, UInt64)", &config),
        vec!["c.size0", "c%2Ekeys", "c%2Evalues"]
    );
    assert_eq!(
        names("c", "Map(String, Nullable(UInt64))", &config),
        vec!["c.size0", "c%2Ekeys", "c%2Evalues.null", "c%2Evalues"]
    );
    assert_eq!(names("c", "LowCardinality(String)", &config), vec!["c.dict", "c"]);
    assert_eq!(
        names("c", "Array(LowCardinality(String))", &config),
        vec!["c.size0", "c.dict", "c"]
    );
}

#[test]
fn test_stream_names_without_delimiter_escaping() {
    let config = SerializationConfig {
        escape_tuple_delimiter: false,
        ..Default::default()
    };
    assert_eq!(
        names("c", "Tuple(a Int32, b Array(String))", &config),
        vec!["c.a", "c.b.size0", "c.b"]
    );
    assert_eq!(
        names("c", "Map(String, UInt64)", &config),
        vec!["c.size0", "c.keys", "c.values"]
    );
}

#[test]
fn test_sparse_stream_names() {
    let serialization = Serialization::sparse(
        default_serialization(&DataType::Int32, &Default::default()).unwrap(),
    );
    assert_eq!(
        stream_names("c", &serialization).unwrap(),
        vec!["c.sparse.idx", "c"]
    );
}

#[test]
fn test_nested_table_shares_sizes() {
    let config = SerializationConfig::default();
    assert_eq!(names("n.a", "Array(Int32)", &config), vec!["n.size0", "n%2Ea"]);
    assert_eq!(
        names("n.b", "Array(Array(String))", &config),
        vec!["n.size0", "n%2Eb.size1", "n%2Eb"]
    );
    // Only the top-level sizes are shared.
    assert_eq!(
        names("n.c", "Array(Nullable(Int32))", &config),
        vec!["n.size0", "n%2Ec.null", "n%2Ec"]
    );
}

#[test]
fn test_escaped_column_and_element_names() {
    let data_type = DataType::tuple([("x y", DataType::Int32.into_ref())]);
    let serialization = default_serialization(&data_type, &Default::default()).unwrap();
    assert_eq!(
        stream_names("col-1", &serialization).unwrap(),
        vec!["col%2D1%2Ex%20y"]
    );
}

#[test]
fn test_scalar_enumerates_single_stream() {
    let mut rng = fastrand::Rng::with_seed(3);
    for type_name in ["UInt8", "UInt32", "UInt64", "Int32", "Int64", "Float64", "String"] {
        let data_type = parse_type(type_name);
        let serialization = default_serialization(&data_type, &Default::default()).unwrap();
        let column = generate_column(&mut rng, &data_type, 10).into_ref();

        let paths =
            collect_stream_paths(&serialization, Some(data_type.clone()), Some(column.clone()))
                .unwrap();
        assert_eq!(paths.len(), 1, "{type_name}");
        let [leaf] = &paths[0][..] else {
            panic!("expected a single node for {type_name}");
        };
        assert_eq!(leaf.kind, SubstreamKind::Regular);
        assert!(Arc::ptr_eq(leaf.data.serialization.as_ref().unwrap(), &serialization));
        assert!(Arc::ptr_eq(leaf.data.data_type.as_ref().unwrap(), &data_type));
        assert!(Arc::ptr_eq(leaf.data.column.as_ref().unwrap(), &column));
        assert!(leaf.data.creator.is_none());
    }
}

#[test]
fn test_path_restored_after_walk() {
    let serialization = default_serialization(
        &parse_type("Tuple(a Array(Nullable(Int32)), b Map(String, String))"),
        &Default::default(),
    )
    .unwrap();
    let mut path = SubstreamPath::from_kinds([SubstreamKind::tuple_element("outer", true)]);

    let mut visited = 0;
    serialization
        .enumerate_streams(
            &mut path,
            &mut |p| {
                assert_eq!(p[0].kind, SubstreamKind::tuple_element("outer", true));
                assert_eq!(p.last().unwrap().kind, SubstreamKind::Regular);
                visited += 1;
                Ok(())
            },
            None,
            None,
        )
        .unwrap();
    assert_eq!(visited, 6);
    assert_eq!(path.len(), 1);

    let mut calls = 0;
    let err = serialization
        .enumerate_streams(
            &mut path,
            &mut |_| {
                calls += 1;
                if calls == 2 {
                    return Err(Error::invalid_operation("visitor failure"));
                }
                Ok(())
            },
            None,
            None,
        )
        .unwrap_err();
    assert!(err.to_string().contains("visitor failure"));
    assert_eq!(calls, 2);
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].kind, SubstreamKind::tuple_element("outer", true));
}

#[test]
fn test_type_mismatch_leaves_path_intact() {
    let serialization =
        default_serialization(&parse_type("Array(Int32)"), &Default::default()).unwrap();
    let mut path = SubstreamPath::new();
    let err = serialization
        .enumerate_streams(
            &mut path,
            &mut |_| Ok(()),
            Some(DataType::Int32.into_ref()),
            None,
        )
        .unwrap_err();
    assert!(err.to_string().contains("Array"));
    assert!(path.is_empty());

    let err = serialization
        .enumerate_streams(
            &mut path,
            &mut |_| Ok(()),
            None,
            Some(Column::from(vec![1i32]).into_ref()),
        )
        .unwrap_err();
    assert!(err.to_string().contains("Int32"));
    assert!(path.is_empty());
}

#[test]
fn test_structural_streams_disallow_special_compression() {
    let serialization =
        default_serialization(&parse_type("Array(Nullable(Int32))"), &Default::default())
            .unwrap();
    let paths = collect_stream_paths(&serialization, None, None).unwrap();
    let flags = paths
        .iter()
        .map(|p| (p.array_level(), p.is_special_compression_allowed()))
        .collect::<Vec<_>>();
    assert_eq!(flags, vec![(0, false), (1, false), (1, true)]);

    let serialization = Serialization::low_cardinality(
        default_serialization(&DataType::String, &Default::default()).unwrap(),
    );
    let paths = collect_stream_paths(&serialization, None, None).unwrap();
    let flags = paths
        .iter()
        .map(|p| p.is_special_compression_allowed())
        .collect::<Vec<_>>();
    assert_eq!(flags, vec![true, false]);
}

#[test]
fn test_leaves_carry_split_values() {
    let mut rng = fastrand::Rng::with_seed(5);
    let data_type = parse_type("Map(String, Array(UInt32))");
    let serialization = default_serialization(&data_type, &Default::default()).unwrap();
    let column = generate_column(&mut rng, &data_type, 25).into_ref();
    let Column::Map(map) = column.as_ref() else {
        panic!("expected a map column");
    };

    let paths =
        collect_stream_paths(&serialization, Some(data_type), Some(column.clone())).unwrap();
    assert_eq!(paths.len(), 4);
    let leaf = |i: usize| paths[i].last().unwrap().data.column.clone().unwrap();
    assert_eq!(*leaf(0), Column::UInt64(map.offsets().sizes()));
    assert_eq!(leaf(1), *map.keys());
    let Column::Array(values) = map.values().as_ref() else {
        panic!("expected array values");
    };
    assert_eq!(*leaf(2), Column::UInt64(values.offsets.sizes()));
    assert_eq!(leaf(3), values.values);
}
