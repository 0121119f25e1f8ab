//! Simple Moving Average (SMA).
//!
//! Rolling mean of one bar field over a lookback window. Maintained as a
//! running sum, so each update is O(1).

use crate::domain::{Bar, RollingWindow};

use super::{PriceSource, StreamingIndicator};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: PriceSource,
    values: RollingWindow<f64>,
    sum: f64,
    name: String,
}

impl Sma {
    pub fn new(period: usize, source: PriceSource) -> Self {
        let period = period.max(1);
        Self {
            period,
            source,
            values: RollingWindow::new(period),
            sum: 0.0,
            name: format!("sma_{}_{period}", source.label()),
        }
    }

    pub fn close(period: usize) -> Self {
        Self::new(period, PriceSource::Close)
    }

    pub fn volume(period: usize) -> Self {
        Self::new(period, PriceSource::Volume)
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Push a raw value, for callers that track a series not backed by a bar.
    pub fn push(&mut self, value: f64) {
        if let Some(evicted) = self.values.push(value) {
            self.sum -= evicted;
        }
        self.sum += value;
        // A NaN poisons the running sum; rebuild it once the window is clean.
        if !self.sum.is_finite() {
            self.sum = self.values.iter().sum();
        }
    }
}

impl StreamingIndicator for Sma {
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
        if !self.values.is_ready() {
            return None;
        }
        let mean = self.sum / self.period as f64;
        mean.is_finite().then_some(mean)
    }
}
