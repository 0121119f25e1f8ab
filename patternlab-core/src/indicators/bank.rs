//! Per-instrument indicator bank.
//!
//! A closed, typed set of streaming statistics assembled once by
//! `IndicatorBankBuilder`. `update` feeds every member; `is_ready` is gated by
//! the slowest member, so detectors never read a partially warmed bank.

use crate::config::{ConfigError, IndicatorConfig};
use crate::domain::{Bar, BarWindow, RollingWindow};

use super::{Atr, Extremum, PriceSource, Roc, Rsi, Sma, StreamingIndicator};

/// Trading days per week, used for "N weeks ago" tests on daily data.
pub const SESSIONS_PER_WEEK: usize = 5;

/// How many fast-MA readings are kept for multi-day MA patterns.
const FAST_MA_HISTORY: usize = 3;

#[derive(Debug, Clone)]
pub struct IndicatorBank {
    window: BarWindow,
    fast_ma: Sma,
    slow_ma: Sma,
    volume_ma: Sma,
    atr: Atr,
    max_high: Extremum,
    max_volume: Extremum,
    min_low: Extremum,
    fast_ma_history: RollingWindow<f64>,
    rsi: Option<Rsi>,
    roc: Option<Roc>,
}

/// Builder for `IndicatorBank`. Starts from `IndicatorConfig::default()`.
#[derive(Debug, Clone, Default)]
pub struct IndicatorBankBuilder {
    config: IndicatorConfig,
}

impl IndicatorBankBuilder {
    pub fn from_config(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn fast_ma(mut self, period: usize) -> Self {
        self.config.fast_ma = period;
        self
    }

    pub fn slow_ma(mut self, period: usize) -> Self {
        self.config.slow_ma = period;
        self
    }

    pub fn volume_ma(mut self, period: usize) -> Self {
        self.config.volume_ma = period;
        self
    }

    pub fn atr(mut self, period: usize) -> Self {
        self.config.atr = period;
        self
    }

    pub fn extremum(mut self, period: usize) -> Self {
        self.config.extremum = period;
        self
    }

    pub fn window(mut self, capacity: usize) -> Self {
        self.config.window = capacity;
        self
    }

    pub fn rsi(mut self, period: usize) -> Self {
        self.config.rsi = Some(period);
        self
    }

    pub fn roc(mut self, period: usize) -> Self {
        self.config.roc = Some(period);
        self
    }

    /// Validate lookbacks and assemble the bank.
    pub fn build(self) -> Result<IndicatorBank, ConfigError> {
        self.config.validate()?;
        let c = &self.config;
        Ok(IndicatorBank {
            window: BarWindow::new(c.window),
            fast_ma: Sma::close(c.fast_ma),
            slow_ma: Sma::close(c.slow_ma),
            volume_ma: Sma::volume(c.volume_ma),
            atr: Atr::new(c.atr),
            max_high: Extremum::max(c.extremum, PriceSource::High),
            max_volume: Extremum::max(c.extremum, PriceSource::Volume),
            min_low: Extremum::min(c.extremum, PriceSource::Low),
            fast_ma_history: RollingWindow::new(FAST_MA_HISTORY),
            rsi: c.rsi.map(Rsi::new),
            roc: c.roc.map(Roc::new),
        })
    }
}

impl IndicatorBank {
    pub fn builder() -> IndicatorBankBuilder {
        IndicatorBankBuilder::default()
    }

    pub fn from_config(config: &IndicatorConfig) -> Result<Self, ConfigError> {
        IndicatorBankBuilder::from_config(config.clone()).build()
    }

    /// Feed the next bar to every statistic.
    pub fn update(&mut self, bar: &Bar) {
        self.window.push(*bar);
        self.fast_ma.update(bar);
        self.slow_ma.update(bar);
        self.volume_ma.update(bar);
        self.atr.update(bar);
        self.max_high.update(bar);
        self.max_volume.update(bar);
        self.min_low.update(bar);
        if let Some(ma) = self.fast_ma.value() {
            self.fast_ma_history.push(ma);
        }
        if let Some(rsi) = self.rsi.as_mut() {
            rsi.update(bar);
        }
        if let Some(roc) = self.roc.as_mut() {
            roc.update(bar);
        }
    }

    /// Replay a chronological history. Equivalent to calling `update` per bar.
    pub fn warm_up<'a>(&mut self, bars: impl IntoIterator<Item = &'a Bar>) {
        for bar in bars {
            self.update(bar);
        }
    }

    /// True once every statistic has completed its warm-up.
    pub fn is_ready(&self) -> bool {
        self.window.is_ready()
            && self.fast_ma.is_ready()
            && self.slow_ma.is_ready()
            && self.volume_ma.is_ready()
            && self.atr.is_ready()
            && self.max_high.is_ready()
            && self.max_volume.is_ready()
            && self.min_low.is_ready()
            && self.fast_ma_history.is_ready()
            && self.rsi.as_ref().map_or(true, |rsi| rsi.is_ready())
            && self.roc.as_ref().map_or(true, |roc| roc.is_ready())
    }

    /// Bars required before `is_ready` can hold: the slowest member's lookback.
    pub fn warmup_bars(&self) -> usize {
        let members: [usize; 8] = [
            self.window.capacity(),
            self.fast_ma.lookback() + FAST_MA_HISTORY - 1,
            self.slow_ma.lookback(),
            self.volume_ma.lookback(),
            self.atr.lookback(),
            self.max_high.lookback(),
            self.rsi.as_ref().map_or(0, |rsi| rsi.lookback()),
            self.roc.as_ref().map_or(0, |roc| roc.lookback()),
        ];
        members.into_iter().max().unwrap_or(0)
    }

    pub fn bars_seen(&self) -> usize {
        self.window.samples()
    }

    pub fn window(&self) -> &BarWindow {
        &self.window
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.window.get(0)
    }

    pub fn previous(&self) -> Option<&Bar> {
        self.window.get(1)
    }

    pub fn fast_ma(&self) -> Option<f64> {
        self.fast_ma.value()
    }

    pub fn slow_ma(&self) -> Option<f64> {
        self.slow_ma.value()
    }

    pub fn volume_ma(&self) -> Option<f64> {
        self.volume_ma.value()
    }

    pub fn atr(&self) -> Option<f64> {
        self.atr.value()
    }

    pub fn rsi(&self) -> Option<f64> {
        self.rsi.as_ref().and_then(|rsi| rsi.value())
    }

    pub fn roc(&self) -> Option<f64> {
        self.roc.as_ref().and_then(|roc| roc.value())
    }

    pub fn max_high(&self) -> &Extremum {
        &self.max_high
    }

    pub fn max_volume(&self) -> &Extremum {
        &self.max_volume
    }

    pub fn min_low(&self) -> &Extremum {
        &self.min_low
    }

    /// Fast-MA readings, newest first.
    pub fn fast_ma_history(&self) -> &RollingWindow<f64> {
        &self.fast_ma_history
    }

    /// Fast MA above slow MA and the latest close above the slow MA.
    pub fn uptrending(&self) -> bool {
        match (self.fast_ma(), self.slow_ma(), self.latest()) {
            (Some(fast), Some(slow), Some(bar)) => fast > slow && bar.close > slow,
            _ => false,
        }
    }

    /// ATR as a percentage of `close`; `None` for non-positive prices.
    pub fn atr_pct(&self, close: f64) -> Option<f64> {
        let atr = self.atr()?;
        if close <= 0.0 || !close.is_finite() {
            return None;
        }
        Some(atr / close * 100.0)
    }

    /// True when the tracked high was set more than `weeks` weeks ago.
    pub fn high_older_than_weeks(&self, weeks: usize) -> bool {
        self.max_high
            .periods_since()
            .is_some_and(|age| age > SESSIONS_PER_WEEK * weeks)
    }

    /// Largest volume among down days (close < open) in the last `lookback` bars.
    pub fn max_down_day_volume(&self, lookback: usize) -> u64 {
        self.window
            .iter()
            .take(lookback)
            .filter(|bar| bar.close < bar.open)
            .map(|bar| bar.volume)
            .max()
            .unwrap_or(0)
    }
}
