//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single instrument.
///
/// Bars carry no symbol: the engine keys instrument state by symbol and a bar
/// only ever reaches the state it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Rejection reasons for bars that fail the sanity check.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BarError {
    #[error("bar on {date} has a NaN price field")]
    Void { date: NaiveDate },
    #[error("bar on {date} has inconsistent OHLC (high={high}, low={low})")]
    Inconsistent { date: NaiveDate, high: f64, low: f64 },
    #[error("bar on {date} has a non-positive price")]
    NonPositive { date: NaiveDate },
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), BarError> {
        if self.is_void() {
            return Err(BarError::Void { date: self.date });
        }
        if self.open <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(BarError::NonPositive { date: self.date });
        }
        let consistent = self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close;
        if !consistent {
            return Err(BarError::Inconsistent {
                date: self.date,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True when the session closed above its open.
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }

    /// Position of the close inside the day's range, 0 (low) to 100 (high).
    ///
    /// `None` for a zero-range bar, where the ratio is undefined.
    pub fn close_range_pct(&self) -> Option<f64> {
        let range = self.range();
        if range <= 0.0 || !range.is_finite() {
            return None;
        }
        Some((self.close - self.low) / range * 100.0)
    }
}
