//! touchline-core - Multi-touch attribution engine
//!
//! Given a journey snapshot (chronologically ordered touchpoints ending in
//! one or more conversions), the engine distributes conversion credit across
//! touchpoints under each attribution model, aggregates credit per channel,
//! compares models, and blends time-decay with position-based credit.
//!
//! The engine is synchronous and side-effect free. Persistence and batch
//! scheduling live with the caller (see `touchline-batch`).

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod journey;
pub mod models;
pub mod multi_touch;
pub mod summary;
pub mod types;

pub use config::{
    ComparisonConfig, CustomConfig, DEFAULT_CONVERSION_VALUE, DataDrivenConfig, EngineConfig,
    MultiTouchConfig, PositionBasedConfig, TimeDecayConfig,
};
pub use engine::AttributionEngine;
pub use error::{AttributionError, Result};
pub use journey::{
    AttributionWindow, CONVERSION_TYPE, Journey, JourneyId, Touchpoint, TouchpointId,
};
pub use models::{AttributionStrategy, BoostedLinearStrategy, CompositeStrategy, TimeDecayModel};
pub use summary::model_confidence;
pub use types::{
    ALGORITHM_VERSION, AttributionModel, CalculationMetadata, ChannelCredit,
    ChannelEffectivenessStats, ModelComparison, ModelResults, ModelType, MultiTouchAttribution,
    Recommendation, SummaryRow,
};
