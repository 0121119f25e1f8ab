//! Rate of Change, in percent.
//!
//! ROC[t] = (close[t] - close[t-period]) / close[t-period] * 100

use crate::domain::{Bar, RollingWindow};

use super::StreamingIndicator;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    closes: RollingWindow<f64>,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            closes: RollingWindow::new(period + 1),
            name: format!("roc_{period}"),
        }
    }
}

impl StreamingIndicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn update(&mut self, bar: &Bar) {
        self.closes.push(bar.close);
    }

    fn value(&self) -> Option<f64> {
        if !self.closes.is_ready() {
            return None;
        }
        let base = self.closes[self.period];
        let current = self.closes[0];
        if base <= 0.0 || !base.is_finite() || !current.is_finite() {
            return None;
        }
        Some((current - base) / base * 100.0)
    }
}
