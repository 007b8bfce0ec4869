//! Entry points of the stream walk.
//!
//! Each codec decomposes its value in [`Serialization::enumerate_streams`]:
//! a composite pushes exactly one node onto the path, replaces it in place
//! for each structural child, recurses, and pops it when its scope ends.
//! Every leaf pushes a single `Regular` node and calls the visitor.

use substream_column::ColumnRef;
use substream_common::Result;
use substream_format::DataTypeRef;

use crate::{
    naming::stream_name,
    path::{Substream, SubstreamData, SubstreamKind, SubstreamPath},
    serialization::SerializationRef,
};

/// Callback invoked once per leaf stream with the full path to it.
pub type StreamVisitor<'a> = dyn FnMut(&SubstreamPath) -> Result<()> + 'a;

/// Walk step of a codec that writes a single stream: pushes one `Regular`
/// node carrying the codec, type and value, and calls the visitor.
pub fn enumerate_leaf(
    serialization: &SerializationRef,
    path: &mut SubstreamPath,
    visitor: &mut StreamVisitor<'_>,
    data_type: Option<DataTypeRef>,
    column: Option<ColumnRef>,
) -> Result<()> {
    let data = SubstreamData::new(serialization.clone())
        .with_type(data_type)
        .with_column(column);
    let path = path.push_scoped(Substream::with_data(SubstreamKind::Regular, data));
    visitor(&path)
}

/// Collects the paths of all leaf streams of `serialization`.
pub fn collect_stream_paths(
    serialization: &SerializationRef,
    data_type: Option<DataTypeRef>,
    column: Option<ColumnRef>,
) -> Result<Vec<SubstreamPath>> {
    let mut paths = Vec::new();
    serialization.enumerate_streams(
        &mut SubstreamPath::new(),
        &mut |path| {
            paths.push(path.clone());
            Ok(())
        },
        data_type,
        column,
    )?;
    Ok(paths)
}

/// Physical names of all streams of a column, in walk order.
pub fn stream_names(column_name: &str, serialization: &SerializationRef) -> Result<Vec<String>> {
    let mut names = Vec::new();
    serialization.enumerate_streams(
        &mut SubstreamPath::new(),
        &mut |path| {
            names.push(stream_name(column_name, path));
            Ok(())
        },
        None,
        None,
    )?;
    Ok(names)
}
