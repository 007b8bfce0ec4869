//! Named collections of in-memory streams.
//!
//! A decomposed column is stored as a set of physical streams, each
//! identified by its stream name. `MemoryStreamSet` collects them on the
//! write side; `ReadStreamSet` hands out sequential cursors on the read side.

use std::sync::Arc;

use ahash::AHashMap;

use crate::{ReadAt, ReadCursor, memory::shared_reader};

/// Write-side collection of named in-memory streams.
#[derive(Debug, Clone, Default)]
pub struct MemoryStreamSet {
    streams: AHashMap<String, Vec<u8>>,
}

impl MemoryStreamSet {
    pub fn new() -> MemoryStreamSet {
        Default::default()
    }

    /// Returns the stream with the given name, creating an empty one if needed.
    pub fn get_or_create(&mut self, name: &str) -> &mut Vec<u8> {
        self.streams.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.streams.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    /// Stream names in lexicographic order.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.streams.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Total number of bytes across all streams.
    pub fn total_size(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    /// Freezes the written content into a read-side set.
    pub fn into_read_set(self) -> std::io::Result<ReadStreamSet> {
        let mut set = ReadStreamSet::new();
        for (name, buf) in self.streams {
            set.insert(name, shared_reader(buf))?;
        }
        Ok(set)
    }
}

/// Read-side collection of named streams, each with its own cursor.
#[derive(Debug, Clone, Default)]
pub struct ReadStreamSet {
    streams: AHashMap<String, ReadCursor>,
}

impl ReadStreamSet {
    pub fn new() -> ReadStreamSet {
        Default::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: Arc<dyn ReadAt>) -> std::io::Result<()> {
        self.streams.insert(name.into(), ReadCursor::new(source)?);
        Ok(())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ReadCursor> {
        self.streams.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Resets every cursor to the start of its stream.
    pub fn rewind_all(&mut self) {
        self.streams.values_mut().for_each(ReadCursor::rewind);
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStreamSet;
    use crate::SealingWrite;

    #[test]
    fn test_write_then_read() {
        let mut set = MemoryStreamSet::new();
        set.get_or_create("b.size0").write_all(&[1, 2]).unwrap();
        set.get_or_create("a").write_all(b"xy").unwrap();
        set.get_or_create("a").write_all(b"z").unwrap();
        assert_eq!(set.names(), vec!["a", "b.size0"]);
        assert_eq!(set.get("a"), Some(&b"xyz"[..]));
        assert_eq!(set.total_size(), 5);

        let mut read = set.into_read_set().unwrap();
        assert_eq!(read.len(), 2);
        let cursor = read.get_mut("a").unwrap();
        assert_eq!(cursor.read_bytes(3).unwrap(), b"xyz");
        assert!(cursor.is_eof());
        read.rewind_all();
        assert_eq!(read.get_mut("a").unwrap().position(), 0);
        assert!(read.get_mut("missing").is_none());
    }
}
