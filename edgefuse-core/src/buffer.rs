//! Fixed-Capacity Ring Buffer for Per-Channel History
//!
//! ## Overview
//!
//! Rolling windows of recent sensor values sit at the bottom of the edge
//! pipeline. Each (node, channel) pair owns one of these buffers, so their
//! cost is multiplied by every channel of every node a gateway serves.
//!
//! The capacity is chosen at construction time (the window size comes from
//! configuration rather than a compile-time constant), but it never changes
//! afterwards: the backing storage is allocated once and every later push
//! overwrites in place.
//!
//! ## Design Rationale
//!
//! ### Why a Ring Buffer?
//!
//! - O(1) insertion (overwrites oldest when full)
//! - O(1) access to most recent value
//! - O(n) iteration oldest → newest
//! - No reallocation after the window fills
//!
//! ### Why Not `VecDeque`?
//!
//! `VecDeque` would need an explicit `pop_front` on every overflowing push and
//! is free to grow if a caller forgets. Overwrite-on-full is the only
//! behaviour a sensor window wants, so it is built in.
//!
//! ### Memory Layout
//!
//! ```text
//! RingBuffer (capacity 5) after 7 pushes of v0..v6:
//! ┌────┬────┬────┬────┬────┐
//! │ v5 │ v6 │ v2 │ v3 │ v4 │  ← physical slots
//! └────┴────┴────┴────┴────┘
//!             ↑
//!             └── write_pos = 2 (oldest value lives here once full)
//!
//! Logical view (iter): [v2, v3, v4, v5, v6]
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use edgefuse_core::buffer::RingBuffer;
//!
//! let mut window: RingBuffer<f64> = RingBuffer::with_capacity(3);
//! for v in [1.0, 2.0, 3.0, 4.0] {
//!     window.push(v);
//! }
//!
//! let values: Vec<f64> = window.iter().copied().collect();
//! assert_eq!(values, vec![2.0, 3.0, 4.0]);
//! assert_eq!(window.last(), Some(&4.0));
//! ```

/// Fixed-capacity ring buffer
///
/// ## Internal Invariants
///
/// - `data.len() <= capacity` (storage never grows past capacity)
/// - `write_pos < capacity` once the buffer is full
/// - Iteration yields values in insertion order, oldest first
///
/// ## Thread Safety
///
/// Not synchronized. Each node pipeline owns its buffers exclusively.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Backing storage, filled up to `capacity` then overwritten in place
    data: Vec<T>,

    /// Maximum number of values retained
    capacity: usize,

    /// Slot the next push writes to once the buffer is full
    write_pos: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer retaining at most `capacity` values
    ///
    /// A capacity of zero is bumped to one; a window that can hold nothing
    /// would make every statistic permanently unavailable.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            write_pos: 0,
        }
    }

    /// Adds a value, overwriting the oldest when full
    pub fn push(&mut self, value: T) {
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[self.write_pos] = value;
            self.write_pos = (self.write_pos + 1) % self.capacity;
        }
    }

    /// Get number of stored values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Maximum number of values retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the most recent value
    pub fn last(&self) -> Option<&T> {
        if self.data.is_empty() {
            return None;
        }

        if self.is_full() {
            let idx = if self.write_pos == 0 { self.capacity - 1 } else { self.write_pos - 1 };
            self.data.get(idx)
        } else {
            self.data.last()
        }
    }

    /// Gets a value by its logical index (0 = oldest, len-1 = newest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.data.len() {
            return None;
        }

        let actual_index = if self.is_full() {
            (self.write_pos + index) % self.capacity
        } else {
            index
        };

        self.data.get(actual_index)
    }

    /// Iterate over values from oldest to newest
    pub fn iter(&self) -> RingBufferIter<'_, T> {
        RingBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Iterate over the `n` most recent values, oldest first
    ///
    /// Yields fewer than `n` values when the buffer is shorter.
    pub fn iter_recent(&self, n: usize) -> RingBufferIter<'_, T> {
        RingBufferIter {
            buffer: self,
            index: self.data.len().saturating_sub(n),
        }
    }

    /// Clear all values, keeping the allocation
    pub fn clear(&mut self) {
        self.data.clear();
        self.write_pos = 0;
    }
}

/// Iterator over ring buffer contents
pub struct RingBufferIter<'a, T> {
    buffer: &'a RingBuffer<T>,
    index: usize,
}

impl<'a, T> Iterator for RingBufferIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, T> ExactSizeIterator for RingBufferIter<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer: RingBuffer<f64> = RingBuffer::with_capacity(5);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert!(buffer.last().is_none());
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn push_and_retrieve() {
        let mut buffer = RingBuffer::with_capacity(5);
        buffer.push(25.0);

        assert_eq!(buffer.len(), 1);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.last(), Some(&25.0));
    }

    #[test]
    fn circular_overwrite() {
        let mut buffer = RingBuffer::with_capacity(3);
        for i in 0..5 {
            buffer.push(i as f64);
        }

        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());

        // Oldest 0, 1 were overwritten
        let values: Vec<f64> = buffer.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.last(), Some(&4.0));
    }

    #[test]
    fn recent_window() {
        let mut buffer = RingBuffer::with_capacity(10);
        for i in 0..12 {
            buffer.push(i);
        }

        let recent: Vec<i32> = buffer.iter_recent(5).copied().collect();
        assert_eq!(recent, vec![7, 8, 9, 10, 11]);

        // Asking for more than stored returns everything
        assert_eq!(buffer.iter_recent(50).len(), 10);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut buffer = RingBuffer::with_capacity(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn clear_resets_order() {
        let mut buffer = RingBuffer::with_capacity(2);
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);
        buffer.clear();
        buffer.push(9);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![9]);
    }
}
