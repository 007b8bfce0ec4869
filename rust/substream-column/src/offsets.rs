//! A collection of offsets for variable-length (array) data.

use std::ops::Range;

/// A collection of offsets for variable-length data.
///
/// Stores a sequence of monotonically non-decreasing offsets, where each pair of
/// adjacent offsets defines the range of a single item. The first offset is
/// always included, representing the start position of the first item.
///
/// On storage, arrays keep their *sizes* (one length per item) rather than the
/// offsets themselves; [`Offsets::sizes`] and [`Offsets::extend_from_sizes`]
/// convert between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offsets(Vec<u64>);

impl Offsets {
    /// Creates a new empty `Offsets` collection with a single offset at position 0.
    pub fn new() -> Offsets {
        Self::with_capacity(0)
    }

    /// Creates a new `Offsets` collection with space for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Offsets {
        let mut buf = Vec::with_capacity(capacity + 1);
        buf.push(0u64);
        Offsets(buf)
    }

    /// Creates offsets from a list of item lengths.
    pub fn from_sizes(sizes: &[u64]) -> Offsets {
        let mut offsets = Offsets::with_capacity(sizes.len());
        offsets.extend_from_sizes(sizes);
        offsets
    }

    /// Creates offsets from raw values.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty or not monotonically non-decreasing.
    pub fn from_values(values: Vec<u64>) -> Offsets {
        assert!(!values.is_empty());
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        Offsets(values)
    }

    /// Returns the number of items represented by these offsets.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.0.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    #[inline]
    pub fn first(&self) -> u64 {
        self.0[0]
    }

    /// Returns the last offset, which marks the end of the last item.
    #[inline]
    pub fn last(&self) -> u64 {
        self.0[self.0.len() - 1]
    }

    /// Returns the range of the item at a given logical index.
    #[inline]
    pub fn range_at(&self, index: usize) -> Range<u64> {
        self.0[index]..self.0[index + 1]
    }

    /// Returns the range of child positions spanned by items `start..start + len`.
    #[inline]
    pub fn span_of(&self, start: usize, len: usize) -> Range<u64> {
        self.0[start]..self.0[start + len]
    }

    /// Adds a new offset by incrementing the last offset by the given length.
    #[inline]
    pub fn push_length(&mut self, len: u64) {
        let last = self.last();
        self.0.push(last + len);
    }

    /// Appends one item per entry of `sizes`.
    pub fn extend_from_sizes(&mut self, sizes: &[u64]) {
        self.0.reserve(sizes.len());
        let mut last = self.last();
        for &size in sizes {
            last += size;
            self.0.push(last);
        }
    }

    /// Item lengths for items `start..start + len`.
    pub fn sizes_range(&self, start: usize, len: usize) -> Vec<u64> {
        self.0[start..start + len + 1]
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect()
    }

    /// Item lengths for all items.
    pub fn sizes(&self) -> Vec<u64> {
        self.sizes_range(0, self.item_count())
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for Offsets {
    type Target = [u64];

    #[inline]
    fn deref(&self) -> &[u64] {
        self.as_slice()
    }
}
