//! Volatility contraction inside a base.
//!
//! A correction starts on a week that undercuts the prior week's low right
//! after a week that set a new high, and ends on a week that sets a new high
//! right after a week that set a new low. Its depth is the drop from the
//! correction high to the correction low relative to the open of the
//! starting week.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::weekly::WeeklyBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VcpVerdict {
    /// More than the threshold share of consecutive depths shrink.
    Contracting,
    Expanding,
    /// Fewer than two completed corrections.
    Indeterminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcpAnalysis {
    pub depths: Vec<f64>,
    pub verdict: VcpVerdict,
}

/// Depths of the completed corrections in `weekly`, oldest first.
pub fn correction_depths(weekly: &[WeeklyBar]) -> Vec<f64> {
    let new_high = |i: usize| i > 0 && weekly[i].high > weekly[i - 1].high;
    let new_low = |i: usize| i > 0 && weekly[i].low < weekly[i - 1].low;

    let mut depths = Vec::new();
    let mut start: Option<usize> = None;
    for i in 1..weekly.len() {
        if let Some(s) = start {
            if new_high(i) && new_low(i - 1) {
                let high = weekly[s - 1..i]
                    .iter()
                    .map(|w| w.high)
                    .fold(f64::NEG_INFINITY, f64::max);
                let low = weekly[s..=i]
                    .iter()
                    .map(|w| w.low)
                    .fold(f64::INFINITY, f64::min);
                let open = weekly[s].open;
                if open > 0.0 && (high - low).is_finite() {
                    depths.push((high - low) / open);
                }
                start = None;
            }
        }
        if new_low(i) && new_high(i - 1) {
            start = Some(i);
        }
    }
    depths
}

/// Share of consecutive depth pairs that strictly decrease.
pub fn contraction_ratio(depths: &[f64]) -> Option<f64> {
    if depths.len() < 2 {
        return None;
    }
    let pairs = depths.len() - 1;
    let shrinking = depths.windows(2).filter(|w| w[1] < w[0]).count();
    Some(shrinking as f64 / pairs as f64)
}

pub fn classify_depths(depths: &[f64], threshold: f64) -> VcpVerdict {
    match contraction_ratio(depths) {
        None => VcpVerdict::Indeterminate,
        Some(ratio) if ratio > threshold => VcpVerdict::Contracting,
        Some(_) => VcpVerdict::Expanding,
    }
}

/// Analyse the base that began the week ending on or after `since`.
pub fn analyze_base(weekly: &[WeeklyBar], since: NaiveDate, threshold: f64) -> VcpAnalysis {
    let first = weekly.partition_point(|w| w.week_ending < since);
    let depths = correction_depths(&weekly[first..]);
    let verdict = classify_depths(&depths, threshold);
    VcpAnalysis { depths, verdict }
}
