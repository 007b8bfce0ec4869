//! Core definitions (error type and result helpers), relied upon by all substream-* crates.

pub mod error;
pub mod result;

pub use result::Result;
