//! Signals: transient entry and exit events handed to the order layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trade direction implied by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Short,
    Flat,
    Long,
}

impl Direction {
    /// -1 / 0 / +1 encoding used by order layers that multiply quantities.
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Short => -1,
            Direction::Flat => 0,
            Direction::Long => 1,
        }
    }
}

/// What kind of event a signal describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Breakout,
    ReversalLong,
    ReversalShort,
    /// Benchmark flipped to a Sell regime on distribution.
    Distribution,
    /// Benchmark flipped to a Buy regime on a follow-through day.
    FollowThrough,
    HighVolumeClose,
    InsideDay,
    PocketPivot,
    KeyMaPullback,
    MaViolation,
}

impl SignalKind {
    pub fn direction(self) -> Direction {
        match self {
            SignalKind::Breakout
            | SignalKind::ReversalLong
            | SignalKind::FollowThrough
            | SignalKind::HighVolumeClose
            | SignalKind::InsideDay
            | SignalKind::PocketPivot
            | SignalKind::KeyMaPullback => Direction::Long,
            SignalKind::ReversalShort | SignalKind::Distribution | SignalKind::MaViolation => {
                Direction::Short
            }
        }
    }
}

/// A discrete event emitted by the engine.
///
/// Signals are consumed immediately by the caller; the engine keeps no record
/// of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub date: NaiveDate,
    pub kind: SignalKind,
    pub direction: Direction,
    /// Protective stop price, when the pattern defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<f64>,
    /// Risk-sized quantity, filled in by `SignalEngine::size_signal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<u64>,
    /// Price level the pattern refers to (breakout level, etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
}

impl Signal {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, kind: SignalKind) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            kind,
            direction: kind.direction(),
            stop: None,
            size_hint: None,
            level: None,
        }
    }

    pub fn with_stop(mut self, stop: f64) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }
}
