//! Volatility sizing: one unit risks one ATR.

use crate::config::ConfigError;

use super::{check_fraction, Sizer, SizingError, SizingInput};

#[derive(Debug, Clone)]
pub struct VolatilitySizer {
    risk_fraction: f64,
}

impl VolatilitySizer {
    pub fn new(risk_fraction: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            risk_fraction: check_fraction("sizing.risk_fraction", risk_fraction)?,
        })
    }
}

impl Sizer for VolatilitySizer {
    fn risk_fraction(&self) -> f64 {
        self.risk_fraction
    }

    fn risk_per_unit(&self, input: &SizingInput) -> Result<f64, SizingError> {
        input.atr.ok_or(SizingError::MissingVolatility)
    }

    fn name(&self) -> &str {
        "volatility"
    }
}
