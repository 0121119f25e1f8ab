//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded with the
//! mean of the first `period` true ranges. The first bar has no previous
//! close and only primes the series, so the first value lands on bar
//! `period + 1`.

use crate::domain::Bar;

use super::StreamingIndicator;

/// True range of `bar` given the previous session's close.
///
/// NaN inputs yield NaN (`f64::max` would otherwise silently drop them).
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    if bar.high.is_nan() || bar.low.is_nan() || prev_close.is_nan() {
        return f64::NAN;
    }
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    /// True ranges seen so far, saturating at `period`.
    count: usize,
    seed_sum: f64,
    current: Option<f64>,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            prev_close: None,
            count: 0,
            seed_sum: 0.0,
            current: None,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl StreamingIndicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn update(&mut self, bar: &Bar) {
        let Some(prev_close) = self.prev_close.replace(bar.close) else {
            return;
        };
        let tr = true_range(bar, prev_close);
        if !tr.is_finite() {
            return;
        }

        match self.current {
            Some(prev) => {
                let alpha = 1.0 / self.period as f64;
                self.current = Some(alpha * tr + (1.0 - alpha) * prev);
            }
            None => {
                self.seed_sum += tr;
                self.count += 1;
                if self.count == self.period {
                    self.current = Some(self.seed_sum / self.period as f64);
                }
            }
        }
    }

    fn value(&self) -> Option<f64> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        assert_approx(true_range(&bars[1], bars[0].close), 8.0, DEFAULT_EPSILON);
        assert_approx(true_range(&bars[2], bars[1].close), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        assert_approx(true_range(&bars[1], bars[0].close), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // primes prev close
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let mut atr = Atr::new(3);
        let values: Vec<_> = bars
            .iter()
            .map(|bar| {
                atr.update(bar);
                atr.value()
            })
            .collect();

        assert!(values[..3].iter().all(Option::is_none));
        // Seed: mean(8, 9, 6) = 23/3
        assert_approx(values[3].unwrap(), 23.0 / 3.0, DEFAULT_EPSILON);
        // (1/3)*6 + (2/3)*(23/3) = 64/9
        assert_approx(values[4].unwrap(), 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_skips_nan_true_range() {
        let mut bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
        ]);
        bars[1].high = f64::NAN;
        let mut atr = Atr::new(1);
        atr.update(&bars[0]);
        atr.update(&bars[1]);
        assert!(atr.value().is_none());
        atr.update(&bars[2]);
        assert_approx(atr.value().unwrap(), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 15);
    }
}
