//! Streaming indicator implementations.
//!
//! Every indicator implements `StreamingIndicator`: one O(1) amortized
//! `update` per bar, a `lookback` telling how many bars it needs, and a
//! `value` that stays `None` until warm-up is complete. No indicator value at
//! bar t depends on bar t+1 or later.
//!
//! `IndicatorBank` composes a fixed, typed set of them per instrument.

pub mod atr;
pub mod bank;
pub mod extremum;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use atr::{true_range, Atr};
pub use bank::{IndicatorBank, IndicatorBankBuilder};
pub use extremum::{Extremum, ExtremumKind};
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for incrementally updated indicators.
pub trait StreamingIndicator: Send + Sync {
    /// Human-readable name (e.g., "sma_close_50", "atr_21").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces a value.
    fn lookback(&self) -> usize;

    /// Feed the next bar. Bars must arrive in chronological order.
    fn update(&mut self, bar: &Bar);

    /// Current value, `None` until warm-up is complete.
    fn value(&self) -> Option<f64>;

    fn is_ready(&self) -> bool {
        self.value().is_some()
    }
}

/// Which bar field an indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceSource {
    pub fn of(self, bar: &Bar) -> f64 {
        match self {
            PriceSource::Open => bar.open,
            PriceSource::High => bar.high,
            PriceSource::Low => bar.low,
            PriceSource::Close => bar.close,
            PriceSource::Volume => bar.volume as f64,
        }
    }

    fn label(self) -> &'static str {
        match self {
            PriceSource::Open => "open",
            PriceSource::High => "high",
            PriceSource::Low => "low",
            PriceSource::Close => "close",
            PriceSource::Volume => "volume",
        }
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Build bars from (open, high, low, close) tuples, one day apart, volume 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
