//! Configuration for the attribution engine.
//!
//! Every section has defaults, so hosts only need to write the values they
//! want to override:
//!
//! ```toml
//! default_conversion_value = 250.0
//!
//! [time_decay]
//! half_life_days = 3.0
//!
//! [custom]
//! multiplier = 2.0
//! high_value_channels = ["referral"]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AttributionError, Result};
use crate::types::ModelType;

/// Conversion value used when a conversion carries no usable value
pub const DEFAULT_CONVERSION_VALUE: f64 = 100.0;

/// Main configuration for the attribution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fallback value for conversions without a numeric `conversionValue`.
    pub default_conversion_value: f64,
    /// Model used by channel effectiveness analysis when none is requested.
    pub default_channel_model: ModelType,
    /// Time-decay model settings.
    pub time_decay: TimeDecayConfig,
    /// Position-based model settings.
    pub position_based: PositionBasedConfig,
    /// Data-driven model settings.
    pub data_driven: DataDrivenConfig,
    /// Custom model settings.
    pub custom: CustomConfig,
    /// Multi-touch blend settings.
    pub multi_touch: MultiTouchConfig,
    /// Model comparison settings.
    pub comparison: ComparisonConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_conversion_value: DEFAULT_CONVERSION_VALUE,
            default_channel_model: ModelType::Linear,
            time_decay: TimeDecayConfig::default(),
            position_based: PositionBasedConfig::default(),
            data_driven: DataDrivenConfig::default(),
            custom: CustomConfig::default(),
            multi_touch: MultiTouchConfig::default(),
            comparison: ComparisonConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(s).map_err(|e| AttributionError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| AttributionError::Serialization(e.to_string()))
    }

    /// Reject settings that would break the sum-to-100 contract
    pub fn validate(&self) -> Result<()> {
        if !(self.default_conversion_value.is_finite() && self.default_conversion_value > 0.0) {
            return Err(AttributionError::Config(format!(
                "default_conversion_value must be positive, got {}",
                self.default_conversion_value
            )));
        }

        if !(self.time_decay.half_life_days.is_finite() && self.time_decay.half_life_days > 0.0)
        {
            return Err(AttributionError::Config(format!(
                "time_decay.half_life_days must be positive, got {}",
                self.time_decay.half_life_days
            )));
        }

        let pb = &self.position_based;
        if pb.first_weight < 0.0 || pb.last_weight < 0.0 || pb.first_weight + pb.last_weight > 100.0
        {
            return Err(AttributionError::Config(format!(
                "position_based weights must be non-negative and sum to at most 100, got {} + {}",
                pb.first_weight, pb.last_weight
            )));
        }

        let dd = &self.data_driven;
        if dd.position_weight < 0.0 || dd.recency_weight < 0.0 {
            return Err(AttributionError::Config(
                "data_driven weights must be non-negative".into(),
            ));
        }
        if dd.position_weight + dd.recency_weight <= 0.0 {
            return Err(AttributionError::Config(
                "data_driven weights must not both be zero".into(),
            ));
        }

        if !(self.custom.multiplier.is_finite() && self.custom.multiplier > 1.0) {
            return Err(AttributionError::Config(format!(
                "custom.multiplier must be greater than 1.0, got {}",
                self.custom.multiplier
            )));
        }

        let mt = &self.multi_touch;
        if mt.time_weight < 0.0 || mt.position_weight < 0.0 || mt.time_weight + mt.position_weight <= 0.0
        {
            return Err(AttributionError::Config(
                "multi_touch weights must be non-negative and not both zero".into(),
            ));
        }

        if self.comparison.sensitivity_threshold < 0.0 {
            return Err(AttributionError::Config(
                "comparison.sensitivity_threshold must be non-negative".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration for the time-decay model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeDecayConfig {
    /// Days after which a touchpoint's weight halves.
    pub half_life_days: f64,
}

impl Default for TimeDecayConfig {
    fn default() -> Self {
        Self { half_life_days: 7.0 }
    }
}

impl TimeDecayConfig {
    /// Decay rate (lambda) derived from the half-life
    pub fn decay_rate(&self) -> f64 {
        std::f64::consts::LN_2 / self.half_life_days
    }
}

/// Configuration for the position-based (U-shaped) model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionBasedConfig {
    /// Percentage credited to the first touchpoint when N >= 3.
    pub first_weight: f64,
    /// Percentage credited to the last touchpoint when N >= 3.
    pub last_weight: f64,
}

impl Default for PositionBasedConfig {
    fn default() -> Self {
        Self {
            first_weight: 40.0,
            last_weight: 40.0,
        }
    }
}

/// Configuration for the default data-driven strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataDrivenConfig {
    /// Weight of the position-based share in the composite.
    pub position_weight: f64,
    /// Weight of the time-decay share in the composite.
    pub recency_weight: f64,
    /// Historical performance multiplier per channel (unknown channels: 1.0).
    pub channel_performance: HashMap<String, f64>,
}

impl Default for DataDrivenConfig {
    fn default() -> Self {
        Self {
            position_weight: 0.5,
            recency_weight: 0.5,
            channel_performance: HashMap::new(),
        }
    }
}

/// Configuration for the default custom strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomConfig {
    /// Multiplier applied to high-value touchpoints before renormalizing.
    pub multiplier: f64,
    /// Channels whose touchpoints always count as high-value.
    pub high_value_channels: Vec<String>,
    /// Touchpoint types that count as high-value (conversions always do).
    pub high_value_types: Vec<String>,
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.5,
            high_value_channels: Vec::new(),
            high_value_types: Vec::new(),
        }
    }
}

/// Configuration for the blended multi-touch calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiTouchConfig {
    /// Weight of the time-decay share in the blend.
    pub time_weight: f64,
    /// Weight of the position-based share in the blend.
    pub position_weight: f64,
}

impl Default for MultiTouchConfig {
    fn default() -> Self {
        Self {
            time_weight: 0.5,
            position_weight: 0.5,
        }
    }
}

/// Configuration for model comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Spread in percentage points across models that flags a channel.
    pub sensitivity_threshold: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            sensitivity_threshold: 25.0,
        }
    }
}
