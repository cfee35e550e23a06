//! Blended multi-touch attribution
//!
//! Mixes time-decay and position-based credit using the configured blend
//! weights, then renormalizes the result to 100.

use tracing::debug;

use crate::engine::AttributionEngine;
use crate::journey::Journey;
use crate::models::normalize;
use crate::types::{ModelType, MultiTouchAttribution};

impl AttributionEngine {
    /// Blended credit for every touchpoint of the journey
    ///
    /// Works with or without a conversion; without one the last touchpoint
    /// is the recency reference. Empty for an empty journey.
    pub fn calculate_multi_touch_attribution(&self, journey: &Journey) -> Vec<MultiTouchAttribution> {
        let Some(window) = journey.attribution_window() else {
            return Vec::new();
        };

        let blend = &self.config().multi_touch;
        let mut time_shares = self.distribute(ModelType::TimeDecay, &window);
        let mut position_shares = self.distribute(ModelType::PositionBased, &window);

        let blended: Vec<f64> = time_shares
            .iter()
            .zip(&position_shares)
            .map(|(time, position)| blend.time_weight * time + blend.position_weight * position)
            .collect();
        let mut blended = normalize(&blended);

        for shares in [&mut blended, &mut time_shares, &mut position_shares] {
            shares.resize(journey.len(), 0.0);
        }

        debug!(
            journey_id = %journey.id(),
            window = window.len(),
            touchpoints = journey.len(),
            "Calculated multi-touch attribution"
        );

        journey
            .touchpoints()
            .iter()
            .enumerate()
            .map(|(idx, tp)| MultiTouchAttribution {
                touchpoint_id: tp.id,
                channel: tp.channel.clone(),
                attribution_percentage: blended[idx],
                time_weight: time_shares[idx],
                position_weight: position_shares[idx],
            })
            .collect()
    }
}
