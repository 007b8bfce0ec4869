//! Substream-based serialization of nested column values.
//!
//! A value of a composite type (arrays, tuples, maps, nullable and
//! dictionary-encoded values) is decomposed into a set of independently
//! named binary streams. This crate provides:
//! - the substream path model ([`path`]) and the stream naming rules ([`naming`]);
//! - the codec tree ([`serialization`]) with its stream walk ([`enumerate`]);
//! - reconstruction of interior subcolumns ([`compose`], [`subcolumns`]);
//! - bulk reading and writing through caller-supplied stream locators
//!   ([`bulk`], [`locator`], [`column_io`]), with a per-read subcolumn
//!   cache ([`cache`]).

pub mod bulk;
pub mod cache;
pub mod column_io;
pub mod compose;
pub mod config;
pub mod creator;
pub mod enumerate;
pub mod locator;
pub mod naming;
pub mod path;
pub mod serialization;
pub mod subcolumns;

#[cfg(test)]
mod tests;

pub use config::SerializationConfig;
pub use path::{Substream, SubstreamData, SubstreamKind, SubstreamPath};
pub use serialization::{
    Serialization, SerializationRef, choose_serialization, default_serialization,
};
