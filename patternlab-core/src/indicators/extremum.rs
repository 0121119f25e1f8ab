//! Rolling maximum / minimum with "periods since extremum".
//!
//! Backed by a monotonic deque of (sequence, value) pairs, so each update is
//! O(1) amortized. A value equal to the current extreme counts as a new
//! extreme and resets the counter.
//!
//! While the extreme stays inside the window, `periods_since` is 0 on the bar
//! that set it and grows by one on every later bar. When the extreme ages out,
//! the tracker falls back to the strongest surviving value and the counter
//! becomes that value's age.

use std::collections::VecDeque;

use crate::domain::Bar;

use super::{PriceSource, StreamingIndicator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Max,
    Min,
}

#[derive(Debug, Clone)]
pub struct Extremum {
    kind: ExtremumKind,
    period: usize,
    source: PriceSource,
    candidates: VecDeque<(usize, f64)>,
    /// Number of samples seen; the newest sample has sequence `samples - 1`.
    samples: usize,
    name: String,
}

impl Extremum {
    pub fn new(kind: ExtremumKind, period: usize, source: PriceSource) -> Self {
        let period = period.max(1);
        let prefix = match kind {
            ExtremumKind::Max => "max",
            ExtremumKind::Min => "min",
        };
        Self {
            kind,
            period,
            source,
            candidates: VecDeque::new(),
            samples: 0,
            name: format!("{prefix}_{}_{period}", source.label()),
        }
    }

    pub fn max(period: usize, source: PriceSource) -> Self {
        Self::new(ExtremumKind::Max, period, source)
    }

    pub fn min(period: usize, source: PriceSource) -> Self {
        Self::new(ExtremumKind::Min, period, source)
    }

    /// True when `candidate` is at least as extreme as `incumbent`.
    fn dominates(&self, candidate: f64, incumbent: f64) -> bool {
        match self.kind {
            ExtremumKind::Max => candidate >= incumbent,
            ExtremumKind::Min => candidate <= incumbent,
        }
    }

    /// Feed a raw value. NaN advances time but is never an extreme.
    pub fn push(&mut self, value: f64) {
        let seq = self.samples;
        self.samples += 1;

        if !value.is_nan() {
            while let Some(&(_, back)) = self.candidates.back() {
                if self.dominates(value, back) {
                    self.candidates.pop_back();
                } else {
                    break;
                }
            }
            self.candidates.push_back((seq, value));
        }

        while let Some(&(front_seq, _)) = self.candidates.front() {
            if front_seq + self.period <= seq {
                self.candidates.pop_front();
            } else {
                break;
            }
        }
    }

    /// Current extreme over the samples seen so far, even before warm-up.
    pub fn extreme(&self) -> Option<f64> {
        self.candidates.front().map(|&(_, v)| v)
    }

    /// Bars since the current extreme was set (0 = set by the latest bar).
    pub fn periods_since(&self) -> Option<usize> {
        self.candidates
            .front()
            .map(|&(seq, _)| self.samples - 1 - seq)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

impl StreamingIndicator for Extremum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) {
        self.push(self.source.of(bar));
    }

    fn value(&self) -> Option<f64> {
        if self.samples < self.period {
            return None;
        }
        self.extreme()
    }
}
