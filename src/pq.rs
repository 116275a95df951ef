// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::{Entry, HashMap};
use std::hash::Hash;

/// Error conditions which may occur when misusing a [MinPQ].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The item is already present in the queue.
    #[error("item is already in the queue")]
    Duplicate,

    /// The queue has no items.
    #[error("queue is empty")]
    Empty,

    /// The item is not present in the queue.
    #[error("item is not in the queue")]
    NotFound,
}

/// MinPQ is a binary min-heap of unique items with externally assigned priorities.
///
/// Next to the heap itself, the queue keeps a map from every item to its position
/// in the heap, so that [contains](MinPQ::contains) is O(1) and
/// [change_priority](MinPQ::change_priority) is O(log n).
///
/// Ties between equal priorities are broken arbitrarily.
/// Priorities which can't be compared (e.g. NaN) leave the heap in an unspecified order.
#[derive(Debug, Clone)]
pub struct MinPQ<T, P> {
    /// Heap entries. Positions used throughout this module are 1-based,
    /// the entry at position `i` lives at `heap[i - 1]`.
    heap: Vec<(T, P)>,

    /// Position of every item in `heap`. Must be kept in lock-step with `heap` -
    /// only [MinPQ::swap], [MinPQ::insert] and [MinPQ::pop_min] touch it.
    positions: HashMap<T, usize>,
}

impl<T, P> Default for MinPQ<T, P> {
    fn default() -> Self {
        Self {
            heap: Vec::default(),
            positions: HashMap::default(),
        }
    }
}

impl<T: Clone + Eq + Hash, P: PartialOrd + Copy> MinPQ<T, P> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue with space for at least `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of items in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns true if `item` is in the queue.
    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// Returns the current priority of `item`, if it is in the queue.
    pub fn priority(&self, item: &T) -> Option<P> {
        self.positions.get(item).map(|&i| self.heap[i - 1].1)
    }

    /// Adds a new item to the queue.
    pub fn insert(&mut self, item: T, priority: P) -> Result<(), QueueError> {
        let position = self.heap.len() + 1;
        match self.positions.entry(item) {
            Entry::Occupied(_) => return Err(QueueError::Duplicate),
            Entry::Vacant(e) => {
                self.heap.push((e.key().clone(), priority));
                e.insert(position);
            }
        }
        self.bubble_up(position);
        Ok(())
    }

    /// Returns the item with the smallest priority, without removing it.
    pub fn peek_min(&self) -> Result<&T, QueueError> {
        self.heap
            .first()
            .map(|(item, _)| item)
            .ok_or(QueueError::Empty)
    }

    /// Removes and returns the item with the smallest priority, together with that priority.
    pub fn pop_min(&mut self) -> Result<(T, P), QueueError> {
        let last = self.heap.len();
        if last == 0 {
            return Err(QueueError::Empty);
        }

        self.swap(1, last);
        let (item, priority) = self.heap.pop().ok_or(QueueError::Empty)?;
        self.positions.remove(&item);

        if !self.heap.is_empty() {
            self.bubble_down(1);
        }
        Ok((item, priority))
    }

    /// Sets a new priority of an item already in the queue, moving it
    /// up or down the heap as necessary.
    pub fn change_priority(&mut self, item: &T, priority: P) -> Result<(), QueueError> {
        let position = *self.positions.get(item).ok_or(QueueError::NotFound)?;
        let old = std::mem::replace(&mut self.heap[position - 1].1, priority);

        if priority < old {
            self.bubble_up(position);
        } else {
            self.bubble_down(position);
        }
        Ok(())
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        self.heap[a - 1].1 < self.heap[b - 1].1
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a - 1, b - 1);
        for position in [a, b] {
            if let Some(p) = self.positions.get_mut(&self.heap[position - 1].0) {
                *p = position;
            }
        }
    }

    fn bubble_up(&mut self, mut position: usize) {
        while position > 1 && self.less(position, position / 2) {
            self.swap(position, position / 2);
            position /= 2;
        }
    }

    fn bubble_down(&mut self, mut position: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * position;
            let right = left + 1;
            let mut smallest = position;

            if left <= len && self.less(left, smallest) {
                smallest = left;
            }
            if right <= len && self.less(right, smallest) {
                smallest = right;
            }

            if smallest == position {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        assert_eq!(self.heap.len(), self.positions.len());
        for (i, (item, _)) in self.heap.iter().enumerate() {
            assert_eq!(self.positions.get(item), Some(&(i + 1)));
        }
        for i in 2..=self.heap.len() {
            assert!(!self.less(i, i / 2), "heap order violated at {}", i);
        }
    }
}
