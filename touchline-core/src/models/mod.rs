//! Attribution model implementations
//!
//! Each model turns an attribution window into one percentage per
//! touchpoint, summing to 100.

mod rules;
mod strategy;
mod time_decay;

pub use rules::{LINEAR_DRIFT_TOLERANCE, first_touch, last_touch, linear, position_based, round2};
pub use strategy::{AttributionStrategy, BoostedLinearStrategy, CompositeStrategy};
pub use time_decay::TimeDecayModel;

/// Scale non-negative weights so they sum to 100
///
/// Degenerate input (empty, all zero, or non-finite total) yields an even
/// split.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || !total.is_finite() || total <= 0.0 {
        let even = 100.0 / weights.len().max(1) as f64;
        return vec![even; weights.len()];
    }
    weights.iter().map(|w| w / total * 100.0).collect()
}
