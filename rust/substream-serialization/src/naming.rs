//! Physical stream names and logical subcolumn names derived from a
//! substream path.
//!
//! Physical names are part of the persisted layout: the suffix grammar below
//! must stay bit-exact across versions.

use substream_format::{
    escape::escape_for_file_name,
    nested::{extract_table_name, is_nested_name},
};

use crate::path::{Substream, SubstreamKind};

/// Delimiter placed before an escaped tuple element name in physical names.
pub const ESCAPED_TUPLE_DELIMITER: &str = "%2E";

/// Physical stream name for `column_name` and `path`.
///
/// The base name is escaped for use as a storage-location identifier. When
/// the path addresses the sizes stream of a top-level array of a nested
/// column (`table.field`), the sizes stream is shared by every field of the
/// table and is named after the table.
pub fn stream_name(column_name: &str, path: &[Substream]) -> String {
    let base = if is_shared_sizes_stream(column_name, path) {
        extract_table_name(column_name)
    } else {
        column_name
    };
    let mut name = escape_for_file_name(base);
    append_suffixes(&mut name, path, true);
    name
}

/// Returns `true` if `path` addresses the top-level sizes stream of a
/// nested column, which every field of the table writes under the table's
/// name.
pub fn is_shared_sizes_stream(column_name: &str, path: &[Substream]) -> bool {
    is_nested_name(column_name) && is_top_level_sizes(path)
}

/// Logical subcolumn name addressed by the full `path`, e.g. `keys`,
/// `a.size0` or `null`. Empty for a path without named nodes.
pub fn subcolumn_name(path: &[Substream]) -> String {
    subcolumn_name_for_prefix(path, path.len())
}

/// Logical subcolumn name addressed by the first `prefix_len` nodes.
///
/// # Panics
///
/// Panics if `prefix_len` exceeds the length of `path`.
pub fn subcolumn_name_for_prefix(path: &[Substream], prefix_len: usize) -> String {
    assert!(
        prefix_len <= path.len(),
        "prefix length {prefix_len} exceeds path length {}",
        path.len()
    );
    let mut name = String::new();
    append_suffixes(&mut name, &path[..prefix_len], false);
    match name.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// The path's only non-`Regular` node is an `ArraySizes` node.
fn is_top_level_sizes(path: &[Substream]) -> bool {
    let mut structural = path
        .iter()
        .filter(|node| node.kind != SubstreamKind::Regular);
    matches!(
        (structural.next(), structural.next()),
        (Some(node), None) if node.kind == SubstreamKind::ArraySizes
    )
}

fn append_suffixes(name: &mut String, path: &[Substream], physical: bool) {
    let mut array_level = 0usize;
    for node in path {
        match &node.kind {
            SubstreamKind::NullMap => name.push_str(".null"),
            SubstreamKind::ArraySizes => {
                name.push_str(".size");
                name.push_str(&array_level.to_string());
            }
            SubstreamKind::ArrayElements => array_level += 1,
            SubstreamKind::DictionaryKeys => name.push_str(".dict"),
            SubstreamKind::SparseOffsets => name.push_str(".sparse.idx"),
            SubstreamKind::TupleElement {
                name: element,
                escape_delimiter,
            } => {
                if physical {
                    if *escape_delimiter {
                        name.push_str(ESCAPED_TUPLE_DELIMITER);
                    } else {
                        name.push('.');
                    }
                    name.push_str(&escape_for_file_name(element));
                } else {
                    name.push('.');
                    name.push_str(element);
                }
            }
            SubstreamKind::Regular
            | SubstreamKind::NullableElements
            | SubstreamKind::DictionaryIndexes
            | SubstreamKind::SparseElements => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::SubstreamPath;

    fn path(kinds: impl IntoIterator<Item = SubstreamKind>) -> SubstreamPath {
        SubstreamPath::from_kinds(kinds)
    }

    #[test]
    fn test_tuple_element_names() {
        let escaped = path([SubstreamKind::tuple_element("b", true)]);
        assert_eq!(stream_name("a", &escaped), "a%2Eb");
        assert_eq!(subcolumn_name(&escaped), "b");

        let plain = path([SubstreamKind::tuple_element("b", false)]);
        assert_eq!(stream_name("a", &plain), "a.b");
        assert_eq!(subcolumn_name(&plain), "b");
    }

    #[test]
    fn test_element_name_escaping() {
        let p = path([
            SubstreamKind::tuple_element("x y", true),
            SubstreamKind::Regular,
        ]);
        assert_eq!(stream_name("col-1", &p), "col%2D1%2Ex%20y");
        assert_eq!(subcolumn_name(&p), "x y");
    }

    #[test]
    fn test_array_level_suffix() {
        let p = path([
            SubstreamKind::ArrayElements,
            SubstreamKind::ArrayElements,
            SubstreamKind::ArraySizes,
        ]);
        assert_eq!(stream_name("arr", &p), "arr.size2");
        assert_eq!(subcolumn_name(&p), "size2");

        let p = path([
            SubstreamKind::ArraySizes,
            SubstreamKind::Regular,
        ]);
        assert_eq!(stream_name("arr", &p), "arr.size0");
    }

    #[test]
    fn test_structural_suffixes() {
        let cases = [
            (vec![SubstreamKind::NullMap, SubstreamKind::Regular], "c.null"),
            (
                vec![SubstreamKind::NullableElements, SubstreamKind::Regular],
                "c",
            ),
            (
                vec![SubstreamKind::DictionaryKeys, SubstreamKind::Regular],
                "c.dict",
            ),
            (
                vec![SubstreamKind::DictionaryIndexes, SubstreamKind::Regular],
                "c",
            ),
            (
                vec![SubstreamKind::SparseOffsets, SubstreamKind::Regular],
                "c.sparse.idx",
            ),
            (
                vec![SubstreamKind::SparseElements, SubstreamKind::Regular],
                "c",
            ),
            (
                vec![
                    SubstreamKind::ArrayElements,
                    SubstreamKind::NullMap,
                    SubstreamKind::Regular,
                ],
                "c.null",
            ),
            (
                vec![
                    SubstreamKind::ArrayElements,
                    SubstreamKind::tuple_element("k", true),
                    SubstreamKind::ArraySizes,
                ],
                "c%2Ek.size1",
            ),
        ];
        for (kinds, expected) in cases {
            assert_eq!(stream_name("c", &path(kinds)), expected);
        }
    }

    #[test]
    fn test_nested_table_sizes_alias() {
        let sizes = path([SubstreamKind::ArraySizes, SubstreamKind::Regular]);
        assert_eq!(stream_name("n.a", &sizes), "n.size0");
        assert_eq!(stream_name("n.b", &sizes), "n.size0");
        assert!(is_shared_sizes_stream("n.b", &sizes));
        assert!(!is_shared_sizes_stream("n", &sizes));

        let elements = path([SubstreamKind::ArrayElements, SubstreamKind::Regular]);
        assert_eq!(stream_name("n.a", &elements), "n%2Ea");

        let deeper = path([
            SubstreamKind::ArrayElements,
            SubstreamKind::ArraySizes,
            SubstreamKind::Regular,
        ]);
        assert_eq!(stream_name("n.a", &deeper), "n%2Ea.size1");
        assert!(!is_shared_sizes_stream("n.a", &deeper));

        let not_nested = path([SubstreamKind::ArraySizes]);
        assert_eq!(stream_name(".a", &not_nested), "%2Ea.size0");
    }

    #[test]
    fn test_subcolumn_prefix() {
        let p = path([
            SubstreamKind::tuple_element("t", true),
            SubstreamKind::ArrayElements,
            SubstreamKind::NullMap,
            SubstreamKind::Regular,
        ]);
        assert_eq!(subcolumn_name_for_prefix(&p, 0), "");
        assert_eq!(subcolumn_name_for_prefix(&p, 1), "t");
        assert_eq!(subcolumn_name_for_prefix(&p, 3), "t.null");
        assert_eq!(subcolumn_name(&p), "t.null");
    }

    #[test]
    #[should_panic]
    fn test_subcolumn_prefix_out_of_range() {
        let p = path([SubstreamKind::NullMap]);
        subcolumn_name_for_prefix(&p, 2);
    }
}
