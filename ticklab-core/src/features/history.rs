//! Bounded book history kept per instrument.

use std::collections::VecDeque;

use crate::domain::{BookData, Timestamp};

/// Book state captured after one applied update.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: Timestamp,
    pub book: BookData,
}

/// Ring of the most recent snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct BookHistory {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
}

impl BookHistory {
    /// A capacity of zero is bumped to one so the latest book is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, timestamp: Timestamp, book: BookData) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(Snapshot { timestamp, book });
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    /// The last `n` values of `field`, oldest first.
    ///
    /// Returns `None` unless all of the last `n` snapshots carry the field.
    pub fn last_values(&self, field: &str, n: usize) -> Option<Vec<f64>> {
        if n == 0 || self.snapshots.len() < n {
            return None;
        }
        self.snapshots
            .iter()
            .skip(self.snapshots.len() - n)
            .map(|s| s.book.get(field))
            .collect()
    }

    /// Value of `field` `offset` snapshots back from the latest (0 = latest).
    pub fn value_back(&self, field: &str, offset: usize) -> Option<f64> {
        let len = self.snapshots.len();
        if offset >= len {
            return None;
        }
        self.snapshots[len - 1 - offset].book.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
