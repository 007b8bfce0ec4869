//! Sequential reader over any `ReadAt` source.

use std::sync::Arc;

use crate::ReadAt;

/// Sequential reader over a shared `ReadAt` source.
///
/// The cursor keeps its own position, so several cursors may read the same
/// source independently. It implements `std::io::Read` for compatibility with
/// APIs that expect it.
#[derive(Clone)]
pub struct ReadCursor {
    inner: Arc<dyn ReadAt>,
    pos: u64,
    size: u64,
}

impl ReadCursor {
    /// Creates a new cursor positioned at the start of `inner`.
    pub fn new(inner: Arc<dyn ReadAt>) -> std::io::Result<ReadCursor> {
        let size = inner.size()?;
        Ok(ReadCursor { inner, pos: 0, size })
    }

    /// Returns the current read position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total size of the underlying source.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of bytes left before end-of-stream.
    pub fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.size
    }

    /// Moves the cursor back to the beginning of the stream.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Reads exactly `len` bytes, failing with `UnexpectedEof` on a short read.
    /// The position is not advanced on failure.
    pub fn read_bytes(&mut self, len: usize) -> std::io::Result<Vec<u8>> {
        if (len as u64) > self.remaining() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "requested {len} bytes at position {}, stream size {}",
                    self.pos, self.size
                ),
            ));
        }
        let end = self.pos + len as u64;
        let bytes = self.inner.read_at(self.pos..end)?;
        if bytes.len() != len {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> std::io::Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(buf))
    }
}

impl std::fmt::Debug for ReadCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadCursor")
            .field("pos", &self.pos)
            .field("size", &self.size)
            .finish()
    }
}

impl std::io::Read for ReadCursor {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() || self.is_eof() {
            return Ok(0);
        }
        let len = std::cmp::min(buf.len() as u64, self.remaining()) as usize;
        let bytes = self.inner.read_at(self.pos..self.pos + len as u64)?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        self.pos += bytes.len() as u64;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::ReadCursor;
    use crate::memory::shared_reader;

    #[test]
    fn test_sequential_reads() {
        let mut data = 42u64.to_le_bytes().to_vec();
        data.extend_from_slice(b"tail");
        let mut cursor = ReadCursor::new(shared_reader(data)).unwrap();
        assert_eq!(cursor.size(), 12);
        assert_eq!(cursor.read_u64_le().unwrap(), 42);
        assert_eq!(cursor.position(), 8);
        assert_eq!(cursor.read_bytes(4).unwrap(), b"tail");
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_short_read_keeps_position() {
        let mut cursor = ReadCursor::new(shared_reader(b"abc".to_vec())).unwrap();
        let err = cursor.read_bytes(5).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.remaining(), 3);
    }

    #[test]
    fn test_std_read() {
        let mut cursor = ReadCursor::new(shared_reader(b"hello".to_vec())).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(cursor.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"lo");
        cursor.rewind();
        assert_eq!(cursor.position(), 0);
    }
}
