//! Resistance levels from clustered weekly peaks.
//!
//! A weekly bar `i` is a peak when its high strictly exceeds the highs
//! `peak_range` bars before and after it. Peak prices are walked in ascending
//! order; a peak below `representative * (1 + range_filter)` joins the current
//! cluster, otherwise it opens a new one. The lowest peak of each cluster is
//! its representative, so consecutive levels are always at least
//! `range_filter` apart.
//!
//! Levels are recomputed from the window on demand and go stale on the next
//! bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::domain::BarWindow;

use super::weekly::{resample_weekly, WeeklyBar};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceLevel {
    pub price: f64,
    /// Week-ending date of the peak that represents the level.
    pub formed: NaiveDate,
    /// Peaks merged into the level.
    pub touches: usize,
}

/// A weekly swing high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub price: f64,
    pub formed: NaiveDate,
}

/// Weekly bars that out-top their neighbours `peak_range` weeks away.
///
/// Fewer than `2 * peak_range + 1` weekly bars yields no peaks.
pub fn find_peaks(weekly: &[WeeklyBar], peak_range: usize) -> Vec<Peak> {
    if peak_range == 0 || weekly.len() < 2 * peak_range + 1 {
        return Vec::new();
    }
    (peak_range..weekly.len() - peak_range)
        .filter(|&i| {
            let high = weekly[i].high;
            high > weekly[i - peak_range].high && high > weekly[i + peak_range].high
        })
        .map(|i| Peak {
            price: weekly[i].high,
            formed: weekly[i].week_ending,
        })
        .collect()
}

/// Cluster peaks into ascending levels. First-seen (lowest) peak wins.
pub fn cluster_peaks(peaks: &[Peak], range_filter: f64, min_touches: usize) -> Vec<ResistanceLevel> {
    let mut sorted: Vec<Peak> = peaks
        .iter()
        .copied()
        .filter(|p| p.price.is_finite() && p.price > 0.0)
        .collect();
    // Stable sort: equal prices keep chronological order.
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut levels: Vec<ResistanceLevel> = Vec::new();
    for peak in sorted {
        match levels.last_mut() {
            Some(level) if peak.price < level.price * (1.0 + range_filter) => {
                level.touches += 1;
            }
            _ => levels.push(ResistanceLevel {
                price: peak.price,
                formed: peak.formed,
                touches: 1,
            }),
        }
    }
    levels.retain(|level| level.touches >= min_touches);
    levels
}

/// Levels for an already-resampled weekly series.
pub fn levels_from_weekly(weekly: &[WeeklyBar], config: &LevelConfig) -> Vec<ResistanceLevel> {
    let peaks = find_peaks(weekly, config.peak_range);
    cluster_peaks(&peaks, config.range_filter, config.min_touches)
}

/// Stateless resistance detector over a bar window.
#[derive(Debug, Clone)]
pub struct LevelDetector {
    config: LevelConfig,
}

impl LevelDetector {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Weekly bars of the window, oldest first.
    pub fn weekly(&self, window: &BarWindow) -> Vec<WeeklyBar> {
        resample_weekly(window.iter_chronological(), self.config.week_end)
    }

    /// Ascending resistance levels for the window.
    pub fn detect(&self, window: &BarWindow) -> Vec<ResistanceLevel> {
        levels_from_weekly(&self.weekly(window), &self.config)
    }
}
