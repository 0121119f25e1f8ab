//! Top-level engine error.

use crate::config::ConfigError;
use crate::domain::BarError;
use crate::sizers::SizingError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("rejected bar: {0}")]
    Bar(#[from] BarError),
    #[error("sizing failed: {0}")]
    Sizing(#[from] SizingError),
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}
