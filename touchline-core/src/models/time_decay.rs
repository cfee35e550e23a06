//! Time-decay attribution
//!
//! Touchpoints closer to the conversion earn more credit. Each touchpoint's
//! raw weight decays exponentially with the days elapsed before the
//! conversion, and raw weights are normalized to 100.

use crate::config::TimeDecayConfig;
use crate::journey::AttributionWindow;

use super::normalize;

/// Time-decay model using exponential decay
///
/// Weight = e^(-λ * days) where λ = ln 2 / half_life_days
#[derive(Debug, Clone)]
pub struct TimeDecayModel {
    config: TimeDecayConfig,
}

impl TimeDecayModel {
    /// Create a model with default configuration
    pub fn new() -> Self {
        Self {
            config: TimeDecayConfig::default(),
        }
    }

    /// Create a model with custom configuration
    pub fn with_config(config: TimeDecayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimeDecayConfig {
        &self.config
    }

    /// Raw decay weight for a touchpoint `days` before the conversion
    pub fn weight(&self, days: f64) -> f64 {
        (-self.config.decay_rate() * days.max(0.0)).exp()
    }

    /// Percentages for every touchpoint in the window, summing to 100
    pub fn distribute(&self, window: &AttributionWindow<'_>) -> Vec<f64> {
        let weights: Vec<f64> = window
            .touchpoints()
            .iter()
            .map(|tp| self.weight(window.days_before_reference(tp)))
            .collect();
        normalize(&weights)
    }
}

impl Default for TimeDecayModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::{Journey, Touchpoint};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn journey_at(days_ago: &[i64]) -> Journey {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let last = days_ago.len() - 1;
        let touchpoints = days_ago
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let kind = if i == last { "conversion" } else { "click" };
                Touchpoint::new(id, format!("channel-{i}"), kind, now - Duration::days(*d))
            })
            .collect();
        Journey::new(id, touchpoints)
    }

    #[test]
    fn test_weight_at_zero_days() {
        let model = TimeDecayModel::new();
        // e^0 = 1.0
        assert!((model.weight(0.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_weight_halves_at_half_life() {
        let model = TimeDecayModel::new();
        assert!((model.weight(7.0) - 0.5).abs() < 0.001);
        assert!((model.weight(14.0) - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_weight_decreases_with_age() {
        let model = TimeDecayModel::new();
        assert!(model.weight(0.0) > model.weight(1.0));
        assert!(model.weight(1.0) > model.weight(5.0));
        assert!(model.weight(5.0) > model.weight(30.0));
    }

    #[test]
    fn test_configurable_half_life() {
        let fast = TimeDecayModel::with_config(TimeDecayConfig { half_life_days: 1.0 });
        let slow = TimeDecayModel::with_config(TimeDecayConfig {
            half_life_days: 30.0,
        });
        assert!(fast.weight(5.0) < slow.weight(5.0));
    }

    #[test]
    fn test_distribution_monotonic_with_recency() {
        let journey = journey_at(&[5, 3, 1]);
        let window = journey.attribution_window().unwrap();
        let shares = TimeDecayModel::new().distribute(&window);

        assert!(shares[1] >= shares[0]);
        assert!(shares[2] >= shares[1]);
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_simultaneous_touchpoints_split_evenly() {
        let journey = journey_at(&[2, 2]);
        let window = journey.attribution_window().unwrap();
        let shares = TimeDecayModel::new().distribute(&window);
        assert!((shares[0] - 50.0).abs() < 0.001);
        assert!((shares[1] - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_ancient_touchpoints_still_sum_to_100() {
        let journey = journey_at(&[20_000, 10_000, 0]);
        let window = journey.attribution_window().unwrap();
        let shares = TimeDecayModel::new().distribute(&window);
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 0.1);
        assert!((shares[2] - 100.0).abs() < 0.001);
    }
}
