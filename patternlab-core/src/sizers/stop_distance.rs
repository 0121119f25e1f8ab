//! Stop-based sizing: one unit risks a fixed fraction of its price.

use crate::config::ConfigError;

use super::{check_fraction, Sizer, SizingError, SizingInput};

#[derive(Debug, Clone)]
pub struct StopDistanceSizer {
    risk_fraction: f64,
    stop_fraction: f64,
}

impl StopDistanceSizer {
    pub fn new(risk_fraction: f64, stop_fraction: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            risk_fraction: check_fraction("sizing.risk_fraction", risk_fraction)?,
            stop_fraction: check_fraction("sizing.stop_fraction", stop_fraction)?,
        })
    }
}

impl Sizer for StopDistanceSizer {
    fn risk_fraction(&self) -> f64 {
        self.risk_fraction
    }

    fn risk_per_unit(&self, input: &SizingInput) -> Result<f64, SizingError> {
        Ok(input.price * self.stop_fraction)
    }

    fn name(&self) -> &str {
        "stop_distance"
    }
}
