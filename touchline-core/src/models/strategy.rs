//! Pluggable strategies for the data-driven and custom models
//!
//! Both models are strategy slots on the engine. A strategy only has to
//! return one non-negative weight per window touchpoint; the engine
//! normalizes the result to 100 and falls back to a linear split if the
//! output is unusable.

use crate::config::{CustomConfig, DataDrivenConfig, PositionBasedConfig};
use crate::journey::AttributionWindow;

use super::normalize;
use super::rules::position_based;
use super::time_decay::TimeDecayModel;

/// Lower bound on a composite weight so every touchpoint keeps some credit
const MIN_COMPOSITE_WEIGHT: f64 = 1e-6;

/// Smallest channel performance factor honoured
const MIN_CHANNEL_FACTOR: f64 = 0.01;

/// Trait for distributing credit across an attribution window
pub trait AttributionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// One weight per touchpoint in `window`, in chronological order
    fn distribute(&self, window: &AttributionWindow<'_>) -> Vec<f64>;
}

/// Data-driven composite of position, recency and channel performance
///
/// weight_i = (position_weight * position_share_i + recency_weight *
/// time_share_i) * channel_factor_i
pub struct CompositeStrategy {
    config: DataDrivenConfig,
    position: PositionBasedConfig,
    time_decay: TimeDecayModel,
}

impl CompositeStrategy {
    /// Create with default configuration
    pub fn new() -> Self {
        Self::with_config(
            DataDrivenConfig::default(),
            PositionBasedConfig::default(),
            TimeDecayModel::new(),
        )
    }

    /// Create with custom configuration
    pub fn with_config(
        config: DataDrivenConfig,
        position: PositionBasedConfig,
        time_decay: TimeDecayModel,
    ) -> Self {
        Self {
            config,
            position,
            time_decay,
        }
    }

    /// Historical performance factor for a channel
    pub fn channel_factor(&self, channel: &str) -> f64 {
        self.config
            .channel_performance
            .get(channel)
            .copied()
            .filter(|f| f.is_finite())
            .unwrap_or(1.0)
            .max(MIN_CHANNEL_FACTOR)
    }
}

impl Default for CompositeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributionStrategy for CompositeStrategy {
    fn name(&self) -> &str {
        "composite"
    }

    fn distribute(&self, window: &AttributionWindow<'_>) -> Vec<f64> {
        let position_shares = position_based(window, &self.position);
        let time_shares = self.time_decay.distribute(window);

        let weights: Vec<f64> = window
            .touchpoints()
            .iter()
            .zip(position_shares.iter().zip(time_shares.iter()))
            .map(|(tp, (pos, time))| {
                let base = self.config.position_weight * pos + self.config.recency_weight * time;
                (base * self.channel_factor(&tp.channel)).max(MIN_COMPOSITE_WEIGHT)
            })
            .collect();

        normalize(&weights)
    }
}

/// Linear split with a multiplier on high-value touchpoints
///
/// Conversions always count as high-value; configured channels and
/// touchpoint types are boosted too.
pub struct BoostedLinearStrategy {
    config: CustomConfig,
}

impl BoostedLinearStrategy {
    /// Create with default configuration
    pub fn new() -> Self {
        Self {
            config: CustomConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: CustomConfig) -> Self {
        Self { config }
    }

    fn is_high_value(&self, channel: &str, touchpoint_type: &str, is_conversion: bool) -> bool {
        is_conversion
            || self.config.high_value_channels.iter().any(|c| c == channel)
            || self.config.high_value_types.iter().any(|t| t == touchpoint_type)
    }
}

impl Default for BoostedLinearStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributionStrategy for BoostedLinearStrategy {
    fn name(&self) -> &str {
        "boosted_linear"
    }

    fn distribute(&self, window: &AttributionWindow<'_>) -> Vec<f64> {
        let weights: Vec<f64> = window
            .touchpoints()
            .iter()
            .map(|tp| {
                if self.is_high_value(&tp.channel, &tp.touchpoint_type, tp.is_conversion()) {
                    self.config.multiplier
                } else {
                    1.0
                }
            })
            .collect();

        normalize(&weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::{Journey, Touchpoint};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn journey(steps: &[(&str, &str, i64)]) -> Journey {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let touchpoints = steps
            .iter()
            .map(|(channel, kind, days)| {
                Touchpoint::new(id, *channel, *kind, now - Duration::days(*days))
            })
            .collect();
        Journey::new(id, touchpoints)
    }

    fn standard_journey() -> Journey {
        journey(&[
            ("email", "click", 5),
            ("social_media", "engagement", 3),
            ("website", "conversion", 1),
        ])
    }

    #[test]
    fn test_composite_within_bounds() {
        let journey = standard_journey();
        let window = journey.attribution_window().unwrap();
        let shares = CompositeStrategy::new().distribute(&window);

        assert_eq!(shares.len(), 3);
        for share in &shares {
            assert!(*share > 0.0 && *share <= 100.0);
        }
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_composite_is_deterministic() {
        let journey = standard_journey();
        let window = journey.attribution_window().unwrap();
        let strategy = CompositeStrategy::new();
        assert_eq!(strategy.distribute(&window), strategy.distribute(&window));
    }

    #[test]
    fn test_composite_channel_performance_shifts_credit() {
        let journey = standard_journey();
        let window = journey.attribution_window().unwrap();
        let baseline = CompositeStrategy::new().distribute(&window);

        let mut config = DataDrivenConfig::default();
        config.channel_performance.insert("email".into(), 3.0);
        let boosted = CompositeStrategy::with_config(
            config,
            PositionBasedConfig::default(),
            TimeDecayModel::new(),
        )
        .distribute(&window);

        assert!(boosted[0] > baseline[0]);
    }

    #[test]
    fn test_composite_keeps_middle_positive_without_recency() {
        let journey = standard_journey();
        let window = journey.attribution_window().unwrap();
        let strategy = CompositeStrategy::with_config(
            DataDrivenConfig {
                position_weight: 1.0,
                recency_weight: 0.0,
                ..Default::default()
            },
            PositionBasedConfig {
                first_weight: 50.0,
                last_weight: 50.0,
            },
            TimeDecayModel::new(),
        );

        let shares = strategy.distribute(&window);
        assert!(shares[1] > 0.0);
    }

    #[test]
    fn test_channel_factor_floor() {
        let mut config = DataDrivenConfig::default();
        config.channel_performance.insert("fax".into(), -2.0);
        let strategy = CompositeStrategy::with_config(
            config,
            PositionBasedConfig::default(),
            TimeDecayModel::new(),
        );
        assert_eq!(strategy.channel_factor("fax"), MIN_CHANNEL_FACTOR);
        assert_eq!(strategy.channel_factor("unknown"), 1.0);
    }

    #[test]
    fn test_boosted_linear_exceeds_baseline() {
        let journey = standard_journey();
        let window = journey.attribution_window().unwrap();
        let shares = BoostedLinearStrategy::new().distribute(&window);

        let baseline = 100.0 / 3.0;
        assert!(shares[2] > baseline);
        assert!(shares[0] < baseline);
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_boosted_linear_configured_channels() {
        let journey = standard_journey();
        let window = journey.attribution_window().unwrap();
        let strategy = BoostedLinearStrategy::with_config(CustomConfig {
            multiplier: 2.0,
            high_value_channels: vec!["email".into()],
            high_value_types: vec![],
        });

        let shares = strategy.distribute(&window);
        // weights 2, 1, 2 -> 40 / 20 / 40
        assert!((shares[0] - 40.0).abs() < 0.001);
        assert!((shares[1] - 20.0).abs() < 0.001);
        assert!((shares[2] - 40.0).abs() < 0.001);
    }

    #[test]
    fn test_single_touchpoint_gets_everything() {
        let journey = journey(&[("website", "conversion", 0)]);
        let window = journey.attribution_window().unwrap();
        assert_eq!(BoostedLinearStrategy::new().distribute(&window), vec![100.0]);
        assert_eq!(CompositeStrategy::new().distribute(&window), vec![100.0]);
    }
}
