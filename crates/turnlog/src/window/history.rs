//! Bounded look-back buffer of recently seen lines.

use crate::select::Line;
use std::collections::VecDeque;

/// FIFO of the most recent lines, holding at most `capacity`. The oldest
/// line is evicted first. A zero-capacity buffer stores nothing.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Line>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: Line) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line);
    }

    /// Remove everything, returning the newest `n` lines in original order.
    pub fn take_last(&mut self, n: usize) -> Vec<Line> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.drain(..).skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
