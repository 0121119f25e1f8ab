//! Price patterns read from an instrument's window and indicator bank.

pub mod breakout;
pub mod levels;
pub mod reversal;
pub mod setups;
pub mod vcp;
pub mod weekly;

pub use breakout::{detect_breakout, Breakout, BreakoutDetector, BreakoutKind};
pub use levels::{cluster_peaks, find_peaks, LevelDetector, Peak, ResistanceLevel};
pub use reversal::{ReversalClassifier, ReversalPattern, ReversalSignal};
pub use vcp::{analyze_base, classify_depths, correction_depths, VcpAnalysis, VcpVerdict};
pub use weekly::{resample_weekly, week_ending, WeeklyBar};
