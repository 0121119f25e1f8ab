//! Domain types for PatternLab

pub mod bar;
pub mod signal;
pub mod window;

pub use bar::{Bar, BarError};
pub use signal::{Direction, Signal, SignalKind};
pub use window::{BarWindow, RollingWindow};

/// Symbol type alias
pub type Symbol = String;
