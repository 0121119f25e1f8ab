//! Engine configuration.
//!
//! Every option is a construction-time constant. Sections map one-to-one onto
//! TOML tables and every field has a default, so a partial file only needs
//! the values it overrides:
//!
//! ```toml
//! [levels]
//! range_filter = 0.01
//!
//! [regime]
//! distribution_day_limit = 5
//! ```

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be >= {min}, got {value}")]
    LengthTooShort {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub levels: LevelConfig,
    pub breakout: BreakoutConfig,
    pub vcp: VcpConfig,
    pub reversal: ReversalConfig,
    pub regime: RegimeConfig,
    pub sizing: SizingConfig,
}

/// Lookback lengths for the per-instrument indicator bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub volume_ma: usize,
    pub atr: usize,
    /// Lookback of the high/volume/low extremum trackers.
    pub extremum: usize,
    /// Capacity of the bar window.
    pub window: usize,
    pub rsi: Option<usize>,
    pub roc: Option<usize>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_ma: 50,
            slow_ma: 200,
            volume_ma: 50,
            atr: 21,
            extremum: 200,
            window: 200,
            rsi: None,
            roc: None,
        }
    }
}

/// Resistance-level detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Relative band above a cluster's representative that merges later peaks.
    pub range_filter: f64,
    /// Weekly bars on each side a peak must exceed.
    pub peak_range: usize,
    /// Weekday that closes each weekly bar.
    pub week_end: Weekday,
    /// Peaks a cluster needs before it counts as a level.
    pub min_touches: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            range_filter: 0.005,
            peak_range: 3,
            week_end: Weekday::Fri,
            min_touches: 1,
        }
    }
}

/// Breakout gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    /// Maximum distance of the recent high above the level.
    pub max_extension: f64,
    /// Band above the level inside which a recorded breakout is still buyable.
    pub entry_band: f64,
    /// Only accept breakouts whose base shows volatility contraction.
    pub require_vcp: bool,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            max_extension: 0.10,
            entry_band: 0.05,
            require_vcp: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcpConfig {
    /// Share of consecutive correction pairs that must shrink.
    pub contraction_threshold: f64,
}

impl Default for VcpConfig {
    fn default() -> Self {
        Self {
            contraction_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalConfig {
    /// Stop offset beyond the reversal bar's extreme.
    pub stop_wiggle: f64,
    pub require_rising_volume: bool,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            stop_wiggle: 0.02,
            require_rising_volume: true,
        }
    }
}

/// Benchmark market-regime detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Daily decline that qualifies as distribution (0.02 = -2%).
    pub distribution_decline: f64,
    /// Daily gain that qualifies as a follow-through day (0.17 = +17%).
    pub follow_through_gain: f64,
    /// Distribution days inside the trailing window that flip Buy to Sell.
    pub distribution_day_limit: usize,
    pub distribution_window: usize,
    /// History searched for the market low, rally and follow-through days.
    pub lookback: usize,
    pub volume_ma: usize,
    /// Later sessions that must hold a follow-through day's low before it
    /// turns the regime to Buy.
    pub follow_through_confirmation: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            distribution_decline: 0.02,
            follow_through_gain: 0.17,
            distribution_day_limit: 6,
            distribution_window: 50,
            lookback: 200,
            volume_ma: 50,
            follow_through_confirmation: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Fraction of equity put at risk per position.
    pub risk_fraction: f64,
    /// Stop distance as a fraction of price for stop-based sizing.
    pub stop_fraction: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_fraction: 0.0075,
            stop_fraction: 0.05,
        }
    }
}

fn min_len(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::LengthTooShort { field, min, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::OutOfRange {
            field,
            range: "(0, inf)",
            value,
        });
    }
    Ok(())
}

fn unit_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0 && value <= 1.0) {
        return Err(ConfigError::OutOfRange {
            field,
            range: "(0, 1]",
            value,
        });
    }
    Ok(())
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        min_len("indicators.fast_ma", self.fast_ma, 1)?;
        min_len("indicators.slow_ma", self.slow_ma, 1)?;
        min_len("indicators.volume_ma", self.volume_ma, 1)?;
        min_len("indicators.atr", self.atr, 1)?;
        min_len("indicators.extremum", self.extremum, 1)?;
        min_len("indicators.window", self.window, 2)?;
        if let Some(rsi) = self.rsi {
            min_len("indicators.rsi", rsi, 1)?;
        }
        if let Some(roc) = self.roc {
            min_len("indicators.roc", roc, 1)?;
        }
        Ok(())
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_fraction("regime.distribution_decline", self.distribution_decline)?;
        positive("regime.follow_through_gain", self.follow_through_gain)?;
        min_len("regime.distribution_day_limit", self.distribution_day_limit, 1)?;
        min_len(
            "regime.distribution_window",
            self.distribution_window,
            self.distribution_day_limit,
        )?;
        min_len("regime.lookback", self.lookback, 2)?;
        min_len("regime.volume_ma", self.volume_ma, 1)?;
        if self.follow_through_confirmation >= self.lookback {
            return Err(ConfigError::OutOfRange {
                field: "regime.follow_through_confirmation",
                range: "[0, lookback)",
                value: self.follow_through_confirmation as f64,
            });
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load from TOML text, then validate.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;

        positive("levels.range_filter", self.levels.range_filter)?;
        min_len("levels.peak_range", self.levels.peak_range, 1)?;
        min_len("levels.min_touches", self.levels.min_touches, 1)?;

        positive("breakout.max_extension", self.breakout.max_extension)?;
        positive("breakout.entry_band", self.breakout.entry_band)?;

        unit_fraction("vcp.contraction_threshold", self.vcp.contraction_threshold)?;

        positive("reversal.stop_wiggle", self.reversal.stop_wiggle)?;

        self.regime.validate()?;

        unit_fraction("sizing.risk_fraction", self.sizing.risk_fraction)?;
        unit_fraction("sizing.stop_fraction", self.sizing.stop_fraction)?;
        Ok(())
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs with identical configs share a fingerprint, which lets callers
    /// tag signal logs with the settings that produced them.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("EngineConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
