//! Discovery of the named subcolumns of a value: `null` of a nullable,
//! element names of a tuple, `sizeN` of arrays, `keys` and `values` of a
//! map, and their combinations.

use ahash::AHashSet;
use substream_column::ColumnRef;
use substream_common::Result;
use substream_format::DataTypeRef;

use crate::{
    compose::compose_at,
    naming::subcolumn_name_for_prefix,
    path::{SubstreamData, SubstreamPath},
    serialization::SerializationRef,
};

/// A named subcolumn with its reconstructed type, codec and value.
#[derive(Debug, Clone)]
pub struct Subcolumn {
    pub name: String,
    pub data: SubstreamData,
}

/// Calls `callback` once per distinct subcolumn name, in walk order.
///
/// For every stream path and every prefix of it that ends in a named node,
/// the subcolumn data is composed from the node following the prefix.
pub fn for_each_subcolumn(
    serialization: &SerializationRef,
    data_type: Option<DataTypeRef>,
    column: Option<ColumnRef>,
    callback: &mut dyn FnMut(Subcolumn) -> Result<()>,
) -> Result<()> {
    let mut seen = AHashSet::<String>::new();
    serialization.enumerate_streams(
        &mut SubstreamPath::new(),
        &mut |path| {
            for prefix_len in 1..path.len() {
                if !path.has_subcolumn_for_path(prefix_len) {
                    continue;
                }
                let name = subcolumn_name_for_prefix(path, prefix_len);
                if seen.contains(&name) {
                    continue;
                }
                let data = compose_at(path, prefix_len)?;
                seen.insert(name.clone());
                callback(Subcolumn { name, data })?;
            }
            Ok(())
        },
        data_type,
        column,
    )
}

/// Names of all subcolumns, in walk order.
pub fn subcolumn_names(serialization: &SerializationRef) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for_each_subcolumn(serialization, None, None, &mut |subcolumn| {
        names.push(subcolumn.name);
        Ok(())
    })?;
    Ok(names)
}

/// Finds the subcolumn called `name`.
pub fn get_subcolumn(
    serialization: &SerializationRef,
    data_type: Option<DataTypeRef>,
    column: Option<ColumnRef>,
    name: &str,
) -> Result<Option<SubstreamData>> {
    let mut found = None;
    for_each_subcolumn(serialization, data_type, column, &mut |subcolumn| {
        if found.is_none() && subcolumn.name == name {
            found = Some(subcolumn.data);
        }
        Ok(())
    })?;
    Ok(found)
}
