//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0.

use crate::domain::Bar;

use super::StreamingIndicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    count: usize,
    avg_gain: f64,
    avg_loss: f64,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            prev_close: None,
            count: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            name: format!("rsi_{period}"),
        }
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return 50.0;
        }
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

impl StreamingIndicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn update(&mut self, bar: &Bar) {
        let Some(prev) = self.prev_close.replace(bar.close) else {
            return;
        };
        let change = bar.close - prev;
        if !change.is_finite() {
            return;
        }
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        if self.count < self.period {
            self.avg_gain += gain / self.period as f64;
            self.avg_loss += loss / self.period as f64;
            self.count += 1;
        } else {
            let alpha = 1.0 / self.period as f64;
            self.avg_gain = alpha * gain + (1.0 - alpha) * self.avg_gain;
            self.avg_loss = alpha * loss + (1.0 - alpha) * self.avg_loss;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count == self.period).then(|| compute_rsi(self.avg_gain, self.avg_loss))
    }
}
