//! Journey summaries and cross-model comparison
//!
//! Both operations read results from a prior
//! [`generate_attribution_models`](AttributionEngine::generate_attribution_models)
//! run instead of recomputing them.

use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::AttributionEngine;
use crate::journey::Journey;
use crate::types::{
    AttributionModel, ChannelCredit, ModelComparison, ModelResults, ModelType, Recommendation,
    SummaryRow,
};

/// Touchpoint count at which the volume factor reaches ~63%
const CONFIDENCE_VOLUME_SCALE: f64 = 5.0;

/// Confidence in a model's split over `window_len` touchpoints
///
/// Half normalized Shannon entropy of the percentages (even spread scores
/// high), half a saturating volume term (more touchpoints score high).
pub fn model_confidence(percentages: &[f64], window_len: usize) -> f64 {
    let evenness = if window_len > 1 {
        let entropy: f64 = percentages
            .iter()
            .filter(|p| **p > 0.0)
            .map(|p| {
                let share = p / 100.0;
                -share * share.ln()
            })
            .sum();
        (entropy / (window_len as f64).ln()).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let volume = 1.0 - (-(window_len as f64) / CONFIDENCE_VOLUME_SCALE).exp();

    (0.5 * evenness + 0.5 * volume).clamp(0.0, 1.0)
}

fn summarize(rows: &[AttributionModel], window_len: usize) -> SummaryRow {
    let mut channel_breakdown = BTreeMap::new();
    for row in rows {
        *channel_breakdown.entry(row.channel.clone()).or_insert(0.0) += row.conversion_value;
    }

    let window_percentages: Vec<f64> = rows
        .iter()
        .filter(|row| row.calculation_metadata.touchpoint_position <= window_len)
        .map(|row| row.attribution_percentage)
        .collect();

    SummaryRow {
        total_conversion_value: rows.iter().map(|row| row.conversion_value).sum(),
        channel_breakdown,
        model_confidence: model_confidence(&window_percentages, window_len),
        attributed_touchpoints: rows
            .iter()
            .filter(|row| row.attribution_percentage > 0.0)
            .count(),
    }
}

impl AttributionEngine {
    /// Aggregate view of each generated model
    ///
    /// Returns an empty map when the journey has no conversions.
    pub fn journey_attribution_summary(
        &self,
        journey: &Journey,
        results: &ModelResults,
    ) -> BTreeMap<ModelType, SummaryRow> {
        let Some(window) = journey.attribution_window() else {
            return BTreeMap::new();
        };
        if !journey.has_conversions() {
            return BTreeMap::new();
        }

        results
            .iter()
            .map(|(model, rows)| (*model, summarize(rows, window.len())))
            .collect()
    }

    /// Compare channel credit across the generated models
    ///
    /// Channels whose percentage spread across models reaches
    /// `comparison.sensitivity_threshold` are flagged, largest spread first.
    pub fn compare_attribution_models(
        &self,
        journey: &Journey,
        results: &ModelResults,
    ) -> ModelComparison {
        let model_summary = self.journey_attribution_summary(journey, results);
        if model_summary.is_empty() {
            return ModelComparison::default();
        }

        let mut channel_comparison: BTreeMap<String, BTreeMap<ModelType, ChannelCredit>> =
            BTreeMap::new();
        for (model, rows) in results {
            for row in rows {
                let credit = channel_comparison
                    .entry(row.channel.clone())
                    .or_default()
                    .entry(*model)
                    .or_insert(ChannelCredit {
                        attribution_credit: 0.0,
                        percentage: 0.0,
                    });
                credit.attribution_credit += row.conversion_value;
                credit.percentage += row.attribution_percentage;
            }
        }

        let recommendations = if results.len() > 1 {
            self.recommendations(&channel_comparison)
        } else {
            Vec::new()
        };

        debug!(
            journey_id = %journey.id(),
            models = results.len(),
            channels = channel_comparison.len(),
            flagged = recommendations.len(),
            "Compared attribution models"
        );

        ModelComparison {
            channel_comparison,
            model_summary,
            recommendations,
        }
    }

    fn recommendations(
        &self,
        channel_comparison: &BTreeMap<String, BTreeMap<ModelType, ChannelCredit>>,
    ) -> Vec<Recommendation> {
        let threshold = self.config().comparison.sensitivity_threshold;

        let mut recommendations: Vec<Recommendation> = channel_comparison
            .iter()
            .filter_map(|(channel, by_model)| {
                let mut entries = by_model.iter();
                let (first_model, first) = entries.next()?;
                let (mut min_model, mut min) = (*first_model, first.percentage);
                let (mut max_model, mut max) = (*first_model, first.percentage);

                for (model, credit) in entries {
                    if credit.percentage < min {
                        min_model = *model;
                        min = credit.percentage;
                    }
                    if credit.percentage > max {
                        max_model = *model;
                        max = credit.percentage;
                    }
                }

                let spread = max - min;
                (spread >= threshold).then(|| Recommendation {
                    channel: channel.clone(),
                    min_model,
                    min_percentage: min,
                    max_model,
                    max_percentage: max,
                    spread,
                    message: format!(
                        "{channel} credit ranges from {min:.1}% ({min_model}) to {max:.1}% ({max_model}); \
                         its attribution is sensitive to model choice"
                    ),
                })
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.spread
                .total_cmp(&a.spread)
                .then_with(|| a.channel.cmp(&b.channel))
        });
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::Touchpoint;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn standard_journey() -> Journey {
        let id = Uuid::now_v7();
        let now = Utc::now();
        Journey::new(
            id,
            vec![
                Touchpoint::new(id, "email", "click", now - Duration::days(5)),
                Touchpoint::new(id, "social_media", "engagement", now - Duration::days(3)),
                Touchpoint::new(id, "website", "conversion", now - Duration::days(1)),
            ],
        )
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(model_confidence(&[100.0], 1), 0.5 * (1.0 - (-0.2f64).exp()));
        let even = model_confidence(&[25.0; 4], 4);
        let skewed = model_confidence(&[100.0, 0.0, 0.0, 0.0], 4);
        assert!(even > skewed);
        assert!((0.0..=1.0).contains(&even));
        assert!((0.0..=1.0).contains(&skewed));
    }

    #[test]
    fn test_confidence_rewards_more_touchpoints() {
        let few = model_confidence(&[50.0; 2], 2);
        let many = model_confidence(&[10.0; 10], 10);
        assert!(many > few);
    }

    #[test]
    fn test_summary_empty_without_conversions() {
        let engine = AttributionEngine::default();
        let id = Uuid::now_v7();
        let journey = Journey::new(id, vec![Touchpoint::new(id, "email", "click", Utc::now())]);
        let results = engine.generate_attribution_models(&journey, ModelType::all());
        assert!(engine.journey_attribution_summary(&journey, &results).is_empty());
    }

    #[test]
    fn test_summary_rows() {
        let engine = AttributionEngine::default();
        let journey = standard_journey();
        let results = engine.generate_attribution_models(
            &journey,
            &[ModelType::FirstTouch, ModelType::Linear],
        );
        let summary = engine.journey_attribution_summary(&journey, &results);

        let first = &summary[&ModelType::FirstTouch];
        assert_eq!(first.attributed_touchpoints, 1);
        assert_eq!(first.total_conversion_value, 100.0);
        assert_eq!(first.channel_breakdown["email"], 100.0);
        assert_eq!(first.channel_breakdown["website"], 0.0);

        let linear = &summary[&ModelType::Linear];
        assert_eq!(linear.attributed_touchpoints, 3);
        assert!((linear.total_conversion_value - 100.0).abs() < 0.1);
        assert!(linear.model_confidence > first.model_confidence);
    }

    #[test]
    fn test_compare_channel_credit() {
        let engine = AttributionEngine::default();
        let journey = standard_journey();
        let results = engine.generate_attribution_models(
            &journey,
            &[ModelType::FirstTouch, ModelType::PositionBased],
        );
        let comparison = engine.compare_attribution_models(&journey, &results);

        let email = &comparison.channel_comparison["email"];
        assert_eq!(email[&ModelType::FirstTouch].percentage, 100.0);
        assert_eq!(email[&ModelType::PositionBased].percentage, 40.0);
        assert_eq!(email[&ModelType::PositionBased].attribution_credit, 40.0);
        assert_eq!(comparison.model_summary.len(), 2);
    }

    #[test]
    fn test_compare_flags_sensitive_channels() {
        let engine = AttributionEngine::default();
        let journey = standard_journey();
        let results = engine.generate_attribution_models(
            &journey,
            &[ModelType::FirstTouch, ModelType::LastTouch, ModelType::Linear],
        );
        let comparison = engine.compare_attribution_models(&journey, &results);

        // email and social_media swing 0..100, website 0..33.33
        let flagged: Vec<&str> = comparison
            .recommendations
            .iter()
            .map(|r| r.channel.as_str())
            .collect();
        assert_eq!(flagged, vec!["email", "social_media", "website"]);

        let email = &comparison.recommendations[0];
        assert_eq!(email.max_model, ModelType::FirstTouch);
        assert_eq!(email.min_model, ModelType::LastTouch);
        assert_eq!(email.spread, 100.0);
        assert!(email.message.contains("email"));
    }

    #[test]
    fn test_compare_is_deterministic() {
        let engine = AttributionEngine::default();
        let journey = standard_journey();
        let results = engine.generate_attribution_models(&journey, ModelType::all());
        let a = engine.compare_attribution_models(&journey, &results);
        let b = engine.compare_attribution_models(&journey, &results);
        assert_eq!(a.recommendations, b.recommendations);
    }

    #[test]
    fn test_single_model_has_no_recommendations() {
        let engine = AttributionEngine::default();
        let journey = standard_journey();
        let results = engine.generate_attribution_models(&journey, &[ModelType::FirstTouch]);
        let comparison = engine.compare_attribution_models(&journey, &results);
        assert!(comparison.recommendations.is_empty());
        assert_eq!(comparison.channel_comparison.len(), 3);
    }

    #[test]
    fn test_compare_empty_without_conversions() {
        let engine = AttributionEngine::default();
        let comparison = engine.compare_attribution_models(&Journey::empty(), &ModelResults::new());
        assert_eq!(comparison, ModelComparison::default());
    }
}
