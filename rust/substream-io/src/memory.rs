use std::{ops::Range, sync::Arc};

use crate::{ReadAt, SealingWrite, verify};

impl<T> ReadAt for T
where
    T: details::SliceBytes + Send + Sync + 'static,
{
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.bytes().len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        verify!(range.end >= range.start);
        let content = self.bytes();
        let pos = range.start as usize;
        if pos > content.len() {
            return Ok(Vec::new());
        }
        let len = std::cmp::min((range.end - range.start) as usize, content.len() - pos);
        Ok(content[pos..pos + len].to_vec())
    }
}

/// In-memory sink. Sealing is a no-op, writes after sealing are still
/// accepted since the buffer has no backing store to commit to.
impl SealingWrite for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

mod details {
    use std::sync::Arc;

    pub trait SliceBytes {
        fn bytes(&self) -> &[u8];
    }

    impl SliceBytes for Vec<u8> {
        fn bytes(&self) -> &[u8] {
            self
        }
    }

    impl SliceBytes for Arc<[u8]> {
        fn bytes(&self) -> &[u8] {
            self
        }
    }
}

/// Wraps an owned buffer as a shareable positional reader.
pub fn shared_reader(buf: Vec<u8>) -> Arc<dyn ReadAt> {
    Arc::new(Arc::<[u8]>::from(buf))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{ReadAt, SealingWrite};

    #[test]
    fn test_mem_writer() {
        let mut buffer = Vec::<u8>::new();
        buffer.write_all(b"abcd").unwrap();
        buffer.write_all(b"123").unwrap();
        buffer.seal().unwrap();
        assert_eq!(buffer, b"abcd123");
    }

    #[test]
    fn test_mem_reader() {
        let blob = b"abcd123".to_vec();
        assert_eq!(blob.size().unwrap(), 7);
        assert_eq!(blob.read_at(1..3).unwrap(), b"bc");
        assert_eq!(blob.read_at(4..200).unwrap(), b"123");
        assert!(blob.read_at(100..200).unwrap().is_empty());

        let blob = super::shared_reader(b"abcd123".to_vec());
        assert_eq!(blob.read_at(1..3).unwrap(), b"bc");

        let blob: Arc<dyn ReadAt> = Arc::new(b"xyz".to_vec());
        assert_eq!(blob.size().unwrap(), 3);
    }
}
