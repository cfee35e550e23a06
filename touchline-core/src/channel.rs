//! Channel effectiveness analysis

use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::AttributionEngine;
use crate::journey::Journey;
use crate::types::{ChannelEffectivenessStats, ModelType};

impl AttributionEngine {
    /// Per-channel effectiveness using the configured default model
    pub fn channel_effectiveness_analysis(
        &self,
        journey: &Journey,
    ) -> BTreeMap<String, ChannelEffectivenessStats> {
        self.channel_effectiveness_for_model(journey, self.config().default_channel_model)
    }

    /// Per-channel effectiveness with attributed value taken from `model`
    ///
    /// Empty for a journey without touchpoints. Without conversions every
    /// channel still reports counts, with zero attributed value.
    pub fn channel_effectiveness_for_model(
        &self,
        journey: &Journey,
        model: ModelType,
    ) -> BTreeMap<String, ChannelEffectivenessStats> {
        let mut stats: BTreeMap<String, ChannelEffectivenessStats> = BTreeMap::new();
        if journey.is_empty() {
            return stats;
        }

        let shares = if journey.has_conversions() {
            self.journey_shares(model, journey)
        } else {
            vec![0.0; journey.len()]
        };
        let conversion_value = journey.conversion_value(self.config().default_conversion_value);

        for (tp, share) in journey.touchpoints().iter().zip(shares) {
            let entry = stats
                .entry(tp.channel.clone())
                .or_insert(ChannelEffectivenessStats {
                    touchpoint_count: 0,
                    conversion_count: 0,
                    conversion_rate: 0.0,
                    total_attribution_value: 0.0,
                    roi_score: 0.0,
                });

            entry.touchpoint_count += 1;
            if tp.is_conversion() {
                entry.conversion_count += 1;
            }
            entry.total_attribution_value += share / 100.0 * conversion_value;
        }

        for entry in stats.values_mut() {
            let count = entry.touchpoint_count as f64;
            entry.conversion_rate = entry.conversion_count as f64 / count;
            entry.roi_score = entry.total_attribution_value / count;
        }

        debug!(
            journey_id = %journey.id(),
            model = %model,
            channels = stats.len(),
            "Analyzed channel effectiveness"
        );

        stats
    }
}
