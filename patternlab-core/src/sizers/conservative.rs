//! The smaller of volatility and stop-based sizing.

use crate::config::{ConfigError, SizingConfig};

use super::{Sizer, SizingError, SizingInput, StopDistanceSizer, VolatilitySizer};

#[derive(Debug, Clone)]
pub struct ConservativeSizer {
    volatility: VolatilitySizer,
    stop: StopDistanceSizer,
}

impl ConservativeSizer {
    pub fn new(config: &SizingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            volatility: VolatilitySizer::new(config.risk_fraction)?,
            stop: StopDistanceSizer::new(config.risk_fraction, config.stop_fraction)?,
        })
    }
}

impl Sizer for ConservativeSizer {
    fn risk_fraction(&self) -> f64 {
        self.volatility.risk_fraction()
    }

    /// The larger per-unit risk, which yields the smaller size.
    fn risk_per_unit(&self, input: &SizingInput) -> Result<f64, SizingError> {
        let atr = self.volatility.risk_per_unit(input)?;
        let stop = self.stop.risk_per_unit(input)?;
        Ok(atr.max(stop))
    }

    fn size(&self, equity: f64, input: &SizingInput) -> Result<u64, SizingError> {
        let by_volatility = self.volatility.size(equity, input)?;
        let by_stop = self.stop.size(equity, input)?;
        Ok(by_volatility.min(by_stop))
    }

    fn name(&self) -> &str {
        "conservative"
    }
}
