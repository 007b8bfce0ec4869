//! I/O abstractions for substreams:
//! - `SealingWrite`: sequential writer with a `seal()` operation, committing the write activity.
//! - `ReadAt`: positional reader with the ability to fetch a specified byte range from a blob.
//! - `ReadCursor`: sequential reader on top of any `ReadAt`.
//!
//! Provides memory-based implementations and named stream sets used to back
//! the physical streams of a decomposed column.

use std::ops::Range;

pub mod cursor;
pub mod memory;
pub mod stream_set;

pub use cursor::ReadCursor;
pub use stream_set::{MemoryStreamSet, ReadStreamSet};

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads a specified range of bytes from the object.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-file
    /// is encountered.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>>;
}

/// A trait for sequential writing with explicit sealing semantics.
///
/// Every physical substream of a column is written through this trait. Data
/// is appended with [`write_all`](SealingWrite::write_all); once the owner of
/// the stream is done with it, [`seal`](SealingWrite::seal) commits the
/// content and no further writes are accepted.
pub trait SealingWrite: Send {
    /// Writes the entire buffer to the underlying storage, appending it to any
    /// previously written data.
    ///
    /// Either all bytes are written successfully, or an error is returned.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Seals the writer, flushing any buffered data.
    fn seal(&mut self) -> std::io::Result<()>;
}

#[macro_export]
macro_rules! verify {
    ($expr:expr) => {{
        if !$expr {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                stringify!($expr),
            ));
        }
    }};
}
