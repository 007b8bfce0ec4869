//! In-memory column values for the substream serialization layer.
//!
//! A [`Column`](column::Column) holds the materialized rows of one logical
//! type. Scalars are plain vectors; composites (`Array`, `Nullable`, `Tuple`,
//! `Map`, `LowCardinality`) hold shared handles to their children, which
//! lets the serialization layer hand out sub-structure (array sizes, map
//! keys, null maps) as standalone subcolumns without copying.

pub mod column;
pub mod offsets;
pub mod sparse;

pub use column::{Column, ColumnRef};
pub use offsets::Offsets;
