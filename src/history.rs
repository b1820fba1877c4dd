// =============================================================================
// Bounded History — FIFO ring buffer owned by a single stage
// =============================================================================
//
// Append first, then trim to capacity: once full, every push evicts the
// oldest entry.  Each stage owns its own buffers outright; nothing in the
// crate hands out a mutable reference to another stage's history.

use std::collections::VecDeque;

use crate::numeric;

/// Fixed-capacity FIFO buffer.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history retaining at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one so that `last()` always reflects
    /// the most recent push.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append `value`, then drop the oldest entries beyond capacity.
    pub fn push(&mut self, value: T) {
        self.buf.push_back(value);
        while self.buf.len() > self.capacity {
            self.buf.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.buf.iter()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Copy of every entry, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }

    /// The newest `n` entries (or fewer), oldest first.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip).cloned().collect()
    }
}

impl BoundedHistory<f64> {
    /// Mean of every retained sample (0.0 when empty).
    pub fn mean(&self) -> f64 {
        numeric::mean(&self.to_vec())
    }

    /// Population standard deviation of every retained sample (0.0 when empty).
    pub fn std_dev(&self) -> f64 {
        numeric::std_dev(&self.to_vec())
    }
}
