use substream_common::Result;

use crate::path::{Substream, SubstreamData};

/// Reconstructs the data visible at node `prefix_len` of `path`, rewrapped
/// by the transforms of every node above it.
///
/// Starts from the data attached to `path[prefix_len]` with its own creator
/// dropped, then applies the creators of nodes `prefix_len - 1` down to `0`.
/// Each creator wraps the running type, codec and (when present) value one
/// level further out.
///
/// # Panics
///
/// Panics if `prefix_len` is not below the path length.
pub fn compose_at(path: &[Substream], prefix_len: usize) -> Result<SubstreamData> {
    assert!(
        prefix_len < path.len(),
        "cannot compose at {prefix_len} in a path of length {}",
        path.len()
    );

    let mut res = path[prefix_len].data.clone();
    res.creator = None;

    for node in path[..prefix_len].iter().rev() {
        let Some(creator) = &node.data.creator else {
            continue;
        };
        res.data_type = res.data_type.map(|t| creator.create_type(t));
        res.serialization = res.serialization.map(|s| creator.create_serialization(s));
        res.column = match res.column {
            Some(column) => creator.create_column(column)?,
            None => None,
        };
    }
    Ok(res)
}
