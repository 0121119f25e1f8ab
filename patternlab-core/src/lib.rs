//! PatternLab Core: per-instrument pattern and signal engine.
//!
//! - Rolling indicator bank (moving averages, Wilder ATR, max/min trackers)
//! - Weekly resampling and resistance-level detection
//! - Breakout, VCP and reversal-day detection, plus the momentum setups
//! - Benchmark market-regime state machine
//! - Risk-based position sizing
//!
//! The crate does no I/O. Callers feed chronologically ordered bars and
//! consume `Signal`s synchronously.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod patterns;
pub mod regime;
pub mod sizers;

pub use config::{ConfigError, EngineConfig};
pub use domain::{Bar, Direction, Signal, SignalKind};
pub use engine::{InstrumentState, SignalEngine};
pub use error::EngineError;
pub use regime::Regime;
