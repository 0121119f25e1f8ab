//! Bounded most-recent-first buffer.
//!
//! Index 0 is always the newest element. Pushing into a full window evicts the
//! oldest element.

use std::collections::vec_deque::{self, VecDeque};

use super::Bar;

#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
    /// Total number of pushes, including evicted elements.
    samples: usize,
}

/// Most-recent-first window of daily bars.
pub type BarWindow = RollingWindow<Bar>;

impl<T> RollingWindow<T> {
    /// Create a window holding at most `capacity` elements.
    ///
    /// Capacity is validated by the config layer; a zero capacity is bumped to
    /// one so the window always holds the latest element.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            samples: 0,
        }
    }

    /// Push the newest element, returning the evicted oldest one if full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_back()
        } else {
            None
        };
        self.items.push_front(item);
        self.samples += 1;
        evicted
    }

    /// Element `i` bars ago (0 = newest).
    pub fn get(&self, i: usize) -> Option<&T> {
        self.items.get(i)
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// True once the window is full.
    pub fn is_ready(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterate oldest to newest.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.samples = 0;
    }
}

impl<T: Clone> RollingWindow<T> {
    /// Copy the contents into a chronologically ordered vector.
    pub fn to_chronological(&self) -> Vec<T> {
        self.iter_chronological().cloned().collect()
    }
}

impl RollingWindow<bool> {
    /// Number of `true` entries currently held.
    pub fn count_true(&self) -> usize {
        self.items.iter().filter(|&&flag| flag).count()
    }
}

impl<T> std::ops::Index<usize> for RollingWindow<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.items[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_newest() {
        let mut w = RollingWindow::new(3);
        w.push(1);
        w.push(2);
        assert_eq!(w[0], 2);
        assert_eq!(w[1], 1);
        assert!(!w.is_ready());
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut w = RollingWindow::new(2);
        assert_eq!(w.push(1), None);
        assert_eq!(w.push(2), None);
        assert_eq!(w.push(3), Some(1));
        assert_eq!(w.len(), 2);
        assert_eq!(w.samples(), 3);
        assert!(w.is_ready());
        assert_eq!(w.to_chronological(), vec![2, 3]);
    }

    #[test]
    fn count_true_tracks_window() {
        let mut w = RollingWindow::new(3);
        for flag in [true, false, true, true] {
            w.push(flag);
        }
        // window holds [true, true, false] newest-first
        assert_eq!(w.count_true(), 2);
    }

    #[test]
    fn zero_capacity_holds_latest() {
        let mut w = RollingWindow::new(0);
        w.push('a');
        w.push('b');
        assert_eq!(w.len(), 1);
        assert_eq!(w[0], 'b');
    }
}
