//! Benchmark market regime.
//!
//! A two-state machine driven by the benchmark's daily bars. It starts in
//! `Sell`. Too many distribution days inside the trailing window switch a
//! `Buy` market to `Sell`; a confirmed follow-through day after the most
//! recent market low switches a `Sell` market back to `Buy`. All transitions
//! go through `RegimeDetector::transition`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, RegimeConfig};
use crate::domain::{Bar, RollingWindow};
use crate::indicators::{Extremum, PriceSource, Sma, StreamingIndicator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Buy,
    Sell,
}

/// Classification of one benchmark session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFlags {
    pub distribution: bool,
    pub rally: bool,
    pub follow_through: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DayRecord {
    date: NaiveDate,
    low: f64,
    flags: DayFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeChange {
    pub date: NaiveDate,
    pub from: Regime,
    pub to: Regime,
}

#[derive(Debug, Clone)]
pub struct RegimeDetector {
    config: RegimeConfig,
    regime: Regime,
    /// Session that turned the market to `Sell`; older follow-throughs are stale.
    sell_since: Option<NaiveDate>,
    days: RollingWindow<DayRecord>,
    distribution: RollingWindow<bool>,
    min_low: Extremum,
    volume_ma: Sma,
    previous: Option<Bar>,
}

impl RegimeDetector {
    pub fn new(config: RegimeConfig) -> Result<Self, ConfigError> {
        Self::with_initial_regime(config, Regime::Sell)
    }

    pub fn with_initial_regime(config: RegimeConfig, regime: Regime) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            days: RollingWindow::new(config.lookback),
            distribution: RollingWindow::new(config.distribution_window),
            min_low: Extremum::min(config.lookback, PriceSource::Low),
            volume_ma: Sma::volume(config.volume_ma),
            regime,
            sell_since: None,
            previous: None,
            config,
        })
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.volume_ma.is_ready() && self.days.len() >= 2
    }

    /// Distribution days inside the trailing window.
    pub fn distribution_count(&self) -> usize {
        self.distribution.count_true()
    }

    /// Sessions since the lowest low of the lookback.
    pub fn days_since_low(&self) -> Option<usize> {
        self.min_low.periods_since()
    }

    pub fn latest_flags(&self) -> Option<DayFlags> {
        self.days.latest().map(|day| day.flags)
    }

    fn classify(&self, bar: &Bar, previous: &Bar) -> DayFlags {
        if previous.close <= 0.0 || !bar.close.is_finite() {
            return DayFlags::default();
        }
        let change = (bar.close - previous.close) / previous.close;
        let rising_volume = bar.volume > previous.volume;
        let above_average = self
            .volume_ma
            .value()
            .is_some_and(|avg| bar.volume as f64 > avg);
        DayFlags {
            distribution: change < -self.config.distribution_decline && rising_volume,
            rally: change > 0.0,
            follow_through: change > self.config.follow_through_gain
                && rising_volume
                && above_average,
        }
    }

    /// Apply the next benchmark session. Returns the regime change it caused.
    pub fn update(&mut self, bar: &Bar) -> Option<RegimeChange> {
        self.volume_ma.update(bar);
        self.min_low.update(bar);
        let flags = match &self.previous {
            Some(previous) => self.classify(bar, previous),
            None => DayFlags::default(),
        };
        self.days.push(DayRecord {
            date: bar.date,
            low: bar.low,
            flags,
        });
        if self.previous.is_some() {
            self.distribution.push(flags.distribution);
        }
        self.previous = Some(*bar);

        if !self.is_ready() {
            return None;
        }
        self.transition(bar.date)
    }

    /// Most recent confirmed follow-through day since the market low.
    ///
    /// The nearest rally day after the low anchors the search; the first
    /// follow-through day after it whose low no later session has undercut
    /// wins. A candidate needs `follow_through_confirmation` later sessions.
    /// Candidates dated on or before `after` are skipped.
    fn confirmed_follow_through(&self, after: Option<NaiveDate>) -> Option<NaiveDate> {
        let low_age = self.min_low.periods_since()?;
        let rally = (0..low_age.min(self.days.len()))
            .rev()
            .find(|&i| self.days[i].flags.rally);
        let Some(rally) = rally else {
            debug!(low_age, "no rally day since market low");
            return None;
        };
        let confirmation = self.config.follow_through_confirmation;
        (confirmation..rally).rev().find_map(|i| {
            let candidate = &self.days[i];
            if !candidate.flags.follow_through || after.is_some_and(|since| candidate.date <= since) {
                return None;
            }
            let undercut = (0..i).any(|j| self.days[j].low < candidate.low);
            if undercut {
                debug!(date = %candidate.date, "follow-through day undercut");
                return None;
            }
            Some(candidate.date)
        })
    }

    fn transition(&mut self, date: NaiveDate) -> Option<RegimeChange> {
        let from = self.regime;
        let to = match from {
            Regime::Buy if self.distribution_count() >= self.config.distribution_day_limit => {
                self.sell_since = Some(date);
                Regime::Sell
            }
            Regime::Sell => {
                let ftd = self.confirmed_follow_through(self.sell_since)?;
                debug!(%ftd, "follow-through day confirmed");
                self.sell_since = None;
                self.distribution.clear();
                Regime::Buy
            }
            Regime::Buy => return None,
        };
        self.regime = to;
        info!(%date, ?from, ?to, "market regime changed");
        Some(RegimeChange { date, from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn small_config() -> RegimeConfig {
        RegimeConfig {
            distribution_day_limit: 2,
            distribution_window: 5,
            lookback: 20,
            volume_ma: 2,
            ..RegimeConfig::default()
        }
    }

    fn bar(day: i64, close: f64, volume: u64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day);
        Bar::new(date, close, close * 1.01, close * 0.99, close, volume)
    }

    #[test]
    fn flags_distribution_and_rally() {
        let mut detector = RegimeDetector::new(small_config()).unwrap();
        detector.update(&bar(0, 100.0, 1000));
        detector.update(&bar(1, 97.0, 1500));
        let flags = detector.latest_flags().unwrap();
        assert!(flags.distribution);
        assert!(!flags.rally);

        detector.update(&bar(2, 98.0, 1400));
        let flags = detector.latest_flags().unwrap();
        assert!(flags.rally);
        assert!(!flags.distribution);
    }

    #[test]
    fn decline_on_falling_volume_is_not_distribution() {
        let mut detector = RegimeDetector::new(small_config()).unwrap();
        detector.update(&bar(0, 100.0, 1000));
        detector.update(&bar(1, 97.0, 900));
        assert!(!detector.latest_flags().unwrap().distribution);
    }

    #[test]
    fn buy_flips_to_sell_at_limit() {
        let mut detector =
            RegimeDetector::with_initial_regime(small_config(), Regime::Buy).unwrap();
        assert!(detector.update(&bar(0, 100.0, 1000)).is_none());
        assert!(detector.update(&bar(1, 97.0, 1100)).is_none());
        let change = detector.update(&bar(2, 94.0, 1200)).unwrap();
        assert_eq!(change.from, Regime::Buy);
        assert_eq!(change.to, Regime::Sell);
        assert_eq!(detector.regime(), Regime::Sell);
    }

    #[test]
    fn low_with_no_rally_stays_sell() {
        let mut detector = RegimeDetector::new(small_config()).unwrap();
        for (day, close) in [100.0, 99.0, 98.0, 97.0].into_iter().enumerate() {
            assert!(detector.update(&bar(day as i64, close, 1000)).is_none());
        }
        assert_eq!(detector.days_since_low(), Some(0));
        assert_eq!(detector.regime(), Regime::Sell);
    }

    #[test]
    fn confirmed_follow_through_turns_buy() {
        let mut detector = RegimeDetector::new(small_config()).unwrap();
        detector.update(&bar(0, 100.0, 1000));
        detector.update(&bar(1, 90.0, 1000)); // low
        detector.update(&bar(2, 91.0, 1000)); // rally
        assert!(detector.update(&bar(3, 110.0, 3000)).is_none()); // +20.9%
        assert!(detector.latest_flags().unwrap().follow_through);
        let change = detector.update(&bar(4, 111.0, 1000)).unwrap();
        assert_eq!(change.to, Regime::Buy);
        assert_eq!(detector.distribution_count(), 0);
    }

    #[test]
    fn fresh_follow_through_after_sell_turns_buy_again() {
        let mut detector = RegimeDetector::new(small_config()).unwrap();
        detector.update(&bar(0, 100.0, 1000));
        detector.update(&bar(1, 90.0, 1000)); // low, never undercut below
        detector.update(&bar(2, 91.0, 1000));
        detector.update(&bar(3, 110.0, 3000)); // first follow-through
        assert_eq!(detector.update(&bar(4, 111.0, 1000)).unwrap().to, Regime::Buy);
        for (day, close) in [(5, 120.0), (6, 125.0), (7, 130.0), (8, 135.0)] {
            assert!(detector.update(&bar(day, close, 1000)).is_none());
        }
        // two distribution days; lows stay above the first follow-through's low
        assert!(detector.update(&bar(9, 130.0, 2000)).is_none());
        let sell = detector.update(&bar(10, 126.0, 2500)).unwrap();
        assert_eq!(sell.to, Regime::Sell);

        assert!(detector.update(&bar(11, 151.2, 8000)).is_none()); // +20%
        assert!(detector.latest_flags().unwrap().follow_through);
        let buy = detector.update(&bar(12, 152.0, 1000)).unwrap();
        assert_eq!(buy.from, Regime::Sell);
        assert_eq!(buy.to, Regime::Buy);
        assert_eq!(buy.date, bar(12, 152.0, 1000).date);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = RegimeConfig {
            distribution_window: 1,
            ..small_config()
        };
        assert!(RegimeDetector::new(config).is_err());
    }
}
