//! Touchpoint and journey snapshots
//!
//! A [`Journey`] is an immutable, chronologically ordered snapshot of the
//! touchpoints recorded for one subject. The engine only ever reads from a
//! snapshot, so changes in the backing store between calls never affect a
//! computation in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

/// UUIDv7 provides time-ordered unique identifiers
pub type TouchpointId = Uuid;

/// Identifier of the journey a touchpoint belongs to
pub type JourneyId = Uuid;

/// Touchpoint type label that marks a conversion event
pub const CONVERSION_TYPE: &str = "conversion";

/// Metadata keys checked, in order, for a conversion's monetary value
pub const CONVERSION_VALUE_KEYS: &[&str] = &["conversionValue", "conversion_value"];

/// A single observed customer interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub id: TouchpointId,
    pub journey_id: JourneyId,
    /// Categorical channel label, e.g. "email" or "social_media"
    pub channel: String,
    /// Categorical interaction label, e.g. "click" or "conversion"
    pub touchpoint_type: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Touchpoint {
    /// Create a touchpoint with a generated ID and empty metadata
    pub fn new(
        journey_id: JourneyId,
        channel: impl Into<String>,
        touchpoint_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            journey_id,
            channel: channel.into(),
            touchpoint_type: touchpoint_type.into(),
            occurred_at,
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Attach an explicit conversion value
    pub fn with_conversion_value(self, value: f64) -> Self {
        self.with_metadata(CONVERSION_VALUE_KEYS[0], Value::from(value))
    }

    pub fn is_conversion(&self) -> bool {
        self.touchpoint_type == CONVERSION_TYPE
    }

    /// Explicit conversion value from metadata, if present and well-formed
    ///
    /// Accepts JSON numbers and numeric strings. Negative or non-finite
    /// values are treated as malformed.
    pub fn explicit_conversion_value(&self) -> Option<f64> {
        let raw = CONVERSION_VALUE_KEYS
            .iter()
            .find_map(|key| self.metadata.get(*key))?;

        let value = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;

        (value.is_finite() && value >= 0.0).then_some(value)
    }

    /// Conversion value, falling back to `default` when metadata is missing
    /// or malformed
    pub fn conversion_value_or(&self, default: f64) -> f64 {
        match self.explicit_conversion_value() {
            Some(value) => value,
            None => {
                if CONVERSION_VALUE_KEYS
                    .iter()
                    .any(|key| self.metadata.contains_key(*key))
                {
                    warn!(
                        touchpoint_id = %self.id,
                        default,
                        "Malformed conversion value, using default"
                    );
                }
                default
            }
        }
    }
}

/// Immutable, chronologically ordered snapshot of a journey
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "JourneySnapshot")]
pub struct Journey {
    id: JourneyId,
    touchpoints: Vec<Touchpoint>,
}

/// Unordered wire form of a journey
#[derive(Deserialize)]
struct JourneySnapshot {
    id: JourneyId,
    #[serde(default)]
    touchpoints: Vec<Touchpoint>,
}

impl From<JourneySnapshot> for Journey {
    fn from(snapshot: JourneySnapshot) -> Self {
        Journey::new(snapshot.id, snapshot.touchpoints)
    }
}

impl Journey {
    /// Build a snapshot from touchpoints in any order
    ///
    /// Touchpoints are stable-sorted by `occurred_at`, so ties keep their
    /// insertion order. Touchpoints owned by a different journey are dropped.
    pub fn new(id: JourneyId, touchpoints: Vec<Touchpoint>) -> Self {
        let total = touchpoints.len();
        let mut touchpoints: Vec<Touchpoint> = touchpoints
            .into_iter()
            .filter(|tp| tp.journey_id == id)
            .collect();

        if touchpoints.len() != total {
            warn!(
                journey_id = %id,
                dropped = total - touchpoints.len(),
                "Dropped touchpoints belonging to another journey"
            );
        }

        touchpoints.sort_by_key(|tp| tp.occurred_at);
        Self { id, touchpoints }
    }

    /// An empty journey with a fresh ID
    pub fn empty() -> Self {
        Self {
            id: Uuid::now_v7(),
            touchpoints: Vec::new(),
        }
    }

    pub fn id(&self) -> JourneyId {
        self.id
    }

    /// Touchpoints in ascending chronological order
    pub fn touchpoints(&self) -> &[Touchpoint] {
        &self.touchpoints
    }

    /// Conversion touchpoints in chronological order
    pub fn conversions(&self) -> impl Iterator<Item = &Touchpoint> {
        self.touchpoints.iter().filter(|tp| tp.is_conversion())
    }

    pub fn conversion_count(&self) -> usize {
        self.conversions().count()
    }

    pub fn has_conversions(&self) -> bool {
        self.touchpoints.iter().any(Touchpoint::is_conversion)
    }

    pub fn len(&self) -> usize {
        self.touchpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touchpoints.is_empty()
    }

    /// 0-based chronological index of a touchpoint
    pub fn position_of(&self, id: TouchpointId) -> Option<usize> {
        self.touchpoints.iter().position(|tp| tp.id == id)
    }

    /// Total conversion value across every conversion in the journey
    pub fn conversion_value(&self, default: f64) -> f64 {
        self.conversions()
            .map(|tp| tp.conversion_value_or(default))
            .sum()
    }

    /// The span of touchpoints eligible for credit
    ///
    /// Ends at the last conversion when there is one, otherwise covers the
    /// whole journey. Returns `None` for an empty journey.
    pub fn attribution_window(&self) -> Option<AttributionWindow<'_>> {
        let end = self
            .touchpoints
            .iter()
            .rposition(Touchpoint::is_conversion)
            .map(|idx| idx + 1)
            .unwrap_or(self.touchpoints.len());

        AttributionWindow::new(&self.touchpoints[..end])
    }
}

/// Ordered touchpoints that share credit for one conversion
#[derive(Debug, Clone, Copy)]
pub struct AttributionWindow<'a> {
    touchpoints: &'a [Touchpoint],
    reference_time: DateTime<Utc>,
}

impl<'a> AttributionWindow<'a> {
    /// Window over chronologically ordered touchpoints
    ///
    /// The last touchpoint's timestamp is the reference time for recency.
    pub fn new(touchpoints: &'a [Touchpoint]) -> Option<Self> {
        let last = touchpoints.last()?;
        Some(Self {
            touchpoints,
            reference_time: last.occurred_at,
        })
    }

    pub fn touchpoints(&self) -> &'a [Touchpoint] {
        self.touchpoints
    }

    /// Number of touchpoints in the window (never zero)
    pub fn len(&self) -> usize {
        self.touchpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touchpoints.is_empty()
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Days elapsed between a touchpoint and the reference time, never negative
    pub fn days_before_reference(&self, touchpoint: &Touchpoint) -> f64 {
        let elapsed = self.reference_time - touchpoint.occurred_at;
        (elapsed.num_milliseconds() as f64 / 86_400_000.0).max(0.0)
    }
}
