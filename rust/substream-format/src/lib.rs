//! Logical data types of stored columns, together with the naming helpers
//! (file-name escaping, nested `table.field` names) that the stream layout
//! is built on.

pub mod data_type;
pub mod escape;
pub mod nested;
#[cfg(test)]
mod tests;

pub use data_type::{DataType, DataTypeRef, TupleField};
