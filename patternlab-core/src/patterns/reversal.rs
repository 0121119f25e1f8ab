//! Single-session reversal patterns.
//!
//! Four checks run in a fixed order and the first match wins. A plain
//! reversal day covers the key and outside variants, so under this order
//! the later checks never win; the order is kept regardless.

use serde::{Deserialize, Serialize};

use crate::config::ReversalConfig;
use crate::domain::{Bar, BarWindow, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalPattern {
    ReversalDay,
    KeyReversalDay,
    OutsideReversalDay,
    OutsideKeyReversalDay,
}

impl ReversalPattern {
    /// Evaluation order.
    pub const PRIORITY: [ReversalPattern; 4] = [
        ReversalPattern::ReversalDay,
        ReversalPattern::KeyReversalDay,
        ReversalPattern::OutsideReversalDay,
        ReversalPattern::OutsideKeyReversalDay,
    ];

    /// Direction this pattern signals for the pair, or `Flat`.
    pub fn check(self, today: &Bar, yesterday: &Bar) -> Direction {
        let new_high = today.high > yesterday.high;
        let new_low = today.low < yesterday.low;
        let closes_low = today.close < yesterday.close.min(today.open);
        let closes_high = today.close > yesterday.close.max(today.open);
        let opens_below = today.open < yesterday.close;
        let opens_above = today.open > yesterday.close;

        let (short, long) = match self {
            ReversalPattern::ReversalDay => (new_high && closes_low, new_low && closes_high),
            ReversalPattern::KeyReversalDay => (
                opens_below && new_high && closes_low,
                opens_above && new_low && closes_high,
            ),
            ReversalPattern::OutsideReversalDay => {
                let outside = new_high && new_low;
                (outside && closes_low, outside && closes_high)
            }
            ReversalPattern::OutsideKeyReversalDay => {
                let outside = new_high && new_low;
                (
                    opens_below && outside && closes_low,
                    opens_above && outside && closes_high,
                )
            }
        };
        if short {
            Direction::Short
        } else if long {
            Direction::Long
        } else {
            Direction::Flat
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReversalSignal {
    pub direction: Direction,
    pub pattern: ReversalPattern,
    pub stop: f64,
}

/// Classify today's bar against yesterday's.
///
/// Zero-range or non-positive bars never signal.
pub fn classify(today: &Bar, yesterday: &Bar, config: &ReversalConfig) -> Option<ReversalSignal> {
    if !today.is_sane() || !yesterday.is_sane() || today.range() <= 0.0 {
        return None;
    }
    if config.require_rising_volume && today.volume <= yesterday.volume {
        return None;
    }
    ReversalPattern::PRIORITY.iter().find_map(|&pattern| {
        let direction = pattern.check(today, yesterday);
        let stop = match direction {
            Direction::Short => today.high * (1.0 + config.stop_wiggle),
            Direction::Long => today.low * (1.0 - config.stop_wiggle),
            Direction::Flat => return None,
        };
        Some(ReversalSignal {
            direction,
            pattern,
            stop,
        })
    })
}

#[derive(Debug, Clone, Default)]
pub struct ReversalClassifier {
    config: ReversalConfig,
}

impl ReversalClassifier {
    pub fn new(config: ReversalConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, window: &BarWindow) -> Option<ReversalSignal> {
        let (today, yesterday) = (window.get(0)?, window.get(1)?);
        classify(today, yesterday, &self.config)
    }
}
