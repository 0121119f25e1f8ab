//! Breakout detection against resistance levels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{BreakoutConfig, LevelConfig, VcpConfig};
use crate::domain::Bar;
use crate::indicators::IndicatorBank;

use super::levels::{LevelDetector, ResistanceLevel};
use super::vcp::{analyze_base, VcpVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutKind {
    /// Opened below the level and closed above it.
    Daily,
    /// Closed below the level yesterday and opened above it today.
    Gap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakout {
    pub level: f64,
    pub kind: BreakoutKind,
    /// When the level's representative peak formed.
    pub formed: NaiveDate,
    /// Session of the breakout.
    pub date: NaiveDate,
}

/// Lowest level crossed today on above-average volume.
///
/// `levels` must be ascending; the scan stops at the first level above
/// today's high.
pub fn detect_breakout(
    levels: &[ResistanceLevel],
    today: &Bar,
    yesterday: &Bar,
    volume_avg: f64,
) -> Option<Breakout> {
    for level in levels {
        let price = level.price;
        if price > today.high {
            break;
        }
        if !(today.volume as f64 > volume_avg) {
            continue;
        }
        let kind = if today.open < price && price < today.close {
            BreakoutKind::Daily
        } else if yesterday.close < price && today.open > price {
            BreakoutKind::Gap
        } else {
            continue;
        };
        return Some(Breakout {
            level: price,
            kind,
            formed: level.formed,
            date: today.date,
        });
    }
    None
}

/// Breakout detection with trend, extension and optional VCP gating.
#[derive(Debug, Clone)]
pub struct BreakoutDetector {
    levels: LevelDetector,
    config: BreakoutConfig,
    vcp: VcpConfig,
}

impl BreakoutDetector {
    pub fn new(levels: LevelConfig, config: BreakoutConfig, vcp: VcpConfig) -> Self {
        Self {
            levels: LevelDetector::new(levels),
            config,
            vcp,
        }
    }

    pub fn level_detector(&self) -> &LevelDetector {
        &self.levels
    }

    /// True when the tracked recent high sits no more than `max_extension`
    /// above `level`.
    fn within_extension(&self, bank: &IndicatorBank, level: f64) -> bool {
        bank.max_high()
            .extreme()
            .is_some_and(|high| high <= level * (1.0 + self.config.max_extension))
    }

    /// Today's breakout, if any. Requires a ready bank and an uptrend.
    pub fn detect(&self, bank: &IndicatorBank) -> Option<Breakout> {
        if !bank.is_ready() || !bank.uptrending() {
            return None;
        }
        let (today, yesterday) = (bank.latest()?, bank.previous()?);
        let volume_avg = bank.volume_ma()?;

        let weekly = self.levels.weekly(bank.window());
        let levels = super::levels::levels_from_weekly(&weekly, self.levels.config());
        let breakout = detect_breakout(&levels, today, yesterday, volume_avg)?;

        if !self.within_extension(bank, breakout.level) {
            tracing::debug!(level = breakout.level, "breakout rejected: extended from recent high");
            return None;
        }
        if self.config.require_vcp {
            let analysis = analyze_base(&weekly, breakout.formed, self.vcp.contraction_threshold);
            if analysis.verdict != VcpVerdict::Contracting {
                tracing::debug!(
                    level = breakout.level,
                    verdict = ?analysis.verdict,
                    "breakout rejected: base is not contracting"
                );
                return None;
            }
        }
        Some(breakout)
    }

    /// Whether a previously recorded breakout is still an entry today.
    ///
    /// The close must sit inside `(level, level * (1 + entry_band))`, the
    /// instrument must still be uptrending and not extended.
    pub fn confirm(&self, bank: &IndicatorBank, breakout: &Breakout) -> bool {
        let Some(today) = bank.latest() else {
            return false;
        };
        let level = breakout.level;
        bank.is_ready()
            && bank.uptrending()
            && today.close > level
            && today.close < level * (1.0 + self.config.entry_band)
            && self.within_extension(bank, level)
    }
}
