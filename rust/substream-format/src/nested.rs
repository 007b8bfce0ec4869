//! Helpers for the `table.field` naming convention of flattened nested
//! columns.

/// Splits a nested column name into its table and field parts.
///
/// The split happens at the first `.`, unless that dot is the first or the
/// last character of the name, in which case the whole name is returned as
/// the table part and the field part is empty.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.find('.') {
        Some(idx) if idx != 0 && idx + 1 != name.len() => (&name[..idx], &name[idx + 1..]),
        _ => (name, ""),
    }
}

/// Returns the table part of a nested column name, or the name itself when
/// it is not nested.
pub fn extract_table_name(name: &str) -> &str {
    split_name(name).0
}

/// Joins a table name and a field name into a nested column name.
pub fn concatenate_name(table: &str, field: &str) -> String {
    if field.is_empty() {
        table.to_string()
    } else {
        format!("{table}.{field}")
    }
}

/// Returns `true` if the name follows the `table.field` convention.
pub fn is_nested_name(name: &str) -> bool {
    !split_name(name).1.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("n.a"), ("n", "a"));
        assert_eq!(split_name("n.a.b"), ("n", "a.b"));
        assert_eq!(split_name("plain"), ("plain", ""));
        assert_eq!(split_name(".hidden"), (".hidden", ""));
        assert_eq!(split_name("trailing."), ("trailing.", ""));
    }

    #[test]
    fn test_table_name() {
        assert_eq!(extract_table_name("visits.url"), "visits");
        assert_eq!(extract_table_name("visits"), "visits");
        assert!(is_nested_name("visits.url"));
        assert!(!is_nested_name("visits"));
        assert_eq!(concatenate_name("visits", "url"), "visits.url");
        assert_eq!(concatenate_name("visits", ""), "visits");
    }
}
