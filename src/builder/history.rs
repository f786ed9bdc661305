//! Bounded history of recent appends
//!
//! Every append goes through one mutex, so the buffer reflects the global
//! append order across all segments. Readers get an owned snapshot.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recently appended entries
#[derive(Debug)]
pub struct HistoryBuffer<T> {
    capacity: usize,
    entries: Mutex<VecDeque<T>>,
}

impl<T: Clone> HistoryBuffer<T> {
    /// Create a buffer holding at most `capacity` entries (0 disables it)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record one entry, evicting the oldest when full
    pub fn push(&self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Record a batch contiguously, in order
    pub fn extend(&self, batch: &[T]) {
        if self.capacity == 0 || batch.is_empty() {
            return;
        }
        // Only the tail of a large batch can survive eviction.
        let tail = &batch[batch.len().saturating_sub(self.capacity)..];
        let mut entries = self.entries.lock();
        let overflow = (entries.len() + tail.len()).saturating_sub(self.capacity);
        entries.drain(..overflow);
        entries.extend(tail.iter().cloned());
    }

    /// Up to `n` most recent entries, oldest first; `None` returns everything
    pub fn snapshot(&self, n: Option<usize>) -> Vec<T> {
        let entries = self.entries.lock();
        let take = n.map_or(entries.len(), |n| n.min(entries.len()));
        entries.iter().skip(entries.len() - take).cloned().collect()
    }
}
