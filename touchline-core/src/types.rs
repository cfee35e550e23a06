//! Attribution model types and engine output records
//!
//! Every output is plain serde data so reporting and export consumers can
//! serialize it however they like.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AttributionError;
use crate::journey::{JourneyId, TouchpointId};

/// Version stamped into every calculation's metadata
pub const ALGORITHM_VERSION: &str = "1.0";

/// Closed set of attribution rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    FirstTouch,
    LastTouch,
    Linear,
    TimeDecay,
    PositionBased,
    DataDriven,
    Custom,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstTouch => "first_touch",
            Self::LastTouch => "last_touch",
            Self::Linear => "linear",
            Self::TimeDecay => "time_decay",
            Self::PositionBased => "position_based",
            Self::DataDriven => "data_driven",
            Self::Custom => "custom",
        }
    }

    /// All models for iteration
    pub fn all() -> &'static [ModelType] {
        &[
            Self::FirstTouch,
            Self::LastTouch,
            Self::Linear,
            Self::TimeDecay,
            Self::PositionBased,
            Self::DataDriven,
            Self::Custom,
        ]
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = AttributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::all()
            .iter()
            .copied()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| AttributionError::UnsupportedModel(s.to_string()))
    }
}

/// Context recorded alongside each attribution row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationMetadata {
    pub model_type: ModelType,
    /// 1-based chronological position within the journey
    pub touchpoint_position: usize,
    pub total_touchpoints: usize,
    pub conversion_count: usize,
    pub journey_id: JourneyId,
    pub algorithm_version: String,
    pub calculated_at: DateTime<Utc>,
}

/// Credit assigned to one touchpoint under one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionModel {
    pub touchpoint_id: TouchpointId,
    pub channel: String,
    pub model_type: ModelType,
    /// Share of the conversion credited to this touchpoint (0.0 - 100.0)
    pub attribution_percentage: f64,
    /// Monetary credit: percentage / 100 * journey conversion value
    pub conversion_value: f64,
    pub calculation_metadata: CalculationMetadata,
}

/// Results of one generation run, keyed by model
pub type ModelResults = BTreeMap<ModelType, Vec<AttributionModel>>;

/// Per-channel effectiveness within a journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEffectivenessStats {
    pub touchpoint_count: usize,
    pub conversion_count: usize,
    /// conversion_count / touchpoint_count
    pub conversion_rate: f64,
    pub total_attribution_value: f64,
    /// Attributed value per touchpoint on this channel
    pub roi_score: f64,
}

/// Aggregate view of a single model's output for a journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub total_conversion_value: f64,
    /// Attributed value per channel
    pub channel_breakdown: BTreeMap<String, f64>,
    /// How much to trust this model's split (0.0 - 1.0)
    pub model_confidence: f64,
    /// Touchpoints that received a non-zero share
    pub attributed_touchpoints: usize,
}

/// Credit a channel received under one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelCredit {
    pub attribution_credit: f64,
    pub percentage: f64,
}

/// A channel whose credit swings widely between models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub channel: String,
    pub min_model: ModelType,
    pub min_percentage: f64,
    pub max_model: ModelType,
    pub max_percentage: f64,
    /// max_percentage - min_percentage
    pub spread: f64,
    pub message: String,
}

/// Side-by-side view of several models over one journey
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    /// channel -> model -> credit
    pub channel_comparison: BTreeMap<String, BTreeMap<ModelType, ChannelCredit>>,
    pub model_summary: BTreeMap<ModelType, SummaryRow>,
    pub recommendations: Vec<Recommendation>,
}

/// One row of the blended time-decay / position-based attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTouchAttribution {
    pub touchpoint_id: TouchpointId,
    pub channel: String,
    pub attribution_percentage: f64,
    /// Time-decay share for this touchpoint
    pub time_weight: f64,
    /// Position-based share for this touchpoint
    pub position_weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_roundtrip() {
        for model in ModelType::all() {
            assert_eq!(model.as_str().parse::<ModelType>().unwrap(), *model);
        }
        assert_eq!(ModelType::all().len(), 7);
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = "markov_chain".parse::<ModelType>().unwrap_err();
        assert!(matches!(err, AttributionError::UnsupportedModel(name) if name == "markov_chain"));
        assert!("First_Touch".parse::<ModelType>().is_err());
        assert!("".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_model_type_serde_names() {
        let json = serde_json::to_string(&ModelType::PositionBased).unwrap();
        assert_eq!(json, "\"position_based\"");
        let parsed: ModelType = serde_json::from_str("\"time_decay\"").unwrap();
        assert_eq!(parsed, ModelType::TimeDecay);
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::DataDriven.to_string(), "data_driven");
    }
}
