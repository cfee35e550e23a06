//! Rule-based attribution models
//!
//! First-touch, last-touch, linear and position-based credit splits. These
//! depend only on chronological position, never on timestamps or channels.

use crate::config::PositionBasedConfig;
use crate::journey::AttributionWindow;

/// Linear rounding drift tolerated before the residual is folded into the
/// last touchpoint
pub const LINEAR_DRIFT_TOLERANCE: f64 = 0.05;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 100% to the first touchpoint
pub fn first_touch(window: &AttributionWindow<'_>) -> Vec<f64> {
    let mut shares = vec![0.0; window.len()];
    shares[0] = 100.0;
    shares
}

/// 100% to the last non-conversion touchpoint before the conversion
///
/// Falls back to the last touchpoint when the window holds only conversions.
pub fn last_touch(window: &AttributionWindow<'_>) -> Vec<f64> {
    let touchpoints = window.touchpoints();
    let credited = touchpoints
        .iter()
        .rposition(|tp| !tp.is_conversion())
        .unwrap_or(touchpoints.len() - 1);

    let mut shares = vec![0.0; touchpoints.len()];
    shares[credited] = 100.0;
    shares
}

/// Equal `100 / N` shares rounded to two decimals
///
/// Rounding is left alone while the total stays within
/// [`LINEAR_DRIFT_TOLERANCE`] of 100; beyond that the residual goes to the
/// last touchpoint.
pub fn linear(window: &AttributionWindow<'_>) -> Vec<f64> {
    let n = window.len();
    let share = round2(100.0 / n as f64);
    let mut shares = vec![share; n];

    let residual = 100.0 - share * n as f64;
    if residual.abs() > LINEAR_DRIFT_TOLERANCE
        && let Some(last) = shares.last_mut()
    {
        *last = round2(*last + residual);
    }

    shares
}

/// U-shaped split: endpoints get fixed weights, the middle shares the rest
pub fn position_based(window: &AttributionWindow<'_>, config: &PositionBasedConfig) -> Vec<f64> {
    match window.len() {
        1 => vec![100.0],
        2 => vec![50.0, 50.0],
        n => {
            let middle = (100.0 - config.first_weight - config.last_weight) / (n - 2) as f64;
            let mut shares = vec![middle; n];
            shares[0] = config.first_weight;
            shares[n - 1] = config.last_weight;
            shares
        }
    }
}
