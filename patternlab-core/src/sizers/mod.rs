//! Position sizers.
//!
//! Every sizer risks a fixed fraction of equity per position and differs only
//! in how it measures the risk of holding one unit:
//!
//! ```text
//! size = round(equity * risk_fraction / risk_per_unit)
//! ```

pub mod conservative;
pub mod stop_distance;
pub mod volatility;

pub use conservative::ConservativeSizer;
pub use stop_distance::StopDistanceSizer;
pub use volatility::VolatilitySizer;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("risk per unit must be positive, got {0}")]
    NonPositiveRisk(f64),
    #[error("equity must be positive, got {0}")]
    NonPositiveEquity(f64),
    #[error("risk fraction must be in (0, 1], got {0}")]
    InvalidRiskFraction(f64),
    #[error("no volatility estimate yet")]
    MissingVolatility,
}

/// Market context a sizer reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInput {
    pub price: f64,
    pub atr: Option<f64>,
}

/// Units that put `risk_fraction` of `equity` at risk.
pub fn risk_size(equity: f64, risk_fraction: f64, risk_per_unit: f64) -> Result<u64, SizingError> {
    if !(equity.is_finite() && equity > 0.0) {
        return Err(SizingError::NonPositiveEquity(equity));
    }
    if !(risk_fraction > 0.0 && risk_fraction <= 1.0) {
        return Err(SizingError::InvalidRiskFraction(risk_fraction));
    }
    if !(risk_per_unit.is_finite() && risk_per_unit > 0.0) {
        return Err(SizingError::NonPositiveRisk(risk_per_unit));
    }
    Ok((equity * risk_fraction / risk_per_unit).round() as u64)
}

fn check_fraction(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            range: "(0, 1]",
            value,
        })
    }
}

pub trait Sizer: Send + Sync {
    fn risk_fraction(&self) -> f64;

    fn risk_per_unit(&self, input: &SizingInput) -> Result<f64, SizingError>;

    fn size(&self, equity: f64, input: &SizingInput) -> Result<u64, SizingError> {
        risk_size(equity, self.risk_fraction(), self.risk_per_unit(input)?)
    }

    fn name(&self) -> &str;
}
