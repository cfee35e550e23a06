//! touchline-batch - Journey stores and batch attribution runs
//!
//! The attribution engine itself is pure. This crate provides the seams to
//! the surrounding system: traits for reading journey snapshots and writing
//! results back, an in-memory store, and a cancellable runner for
//! recomputing attribution across many journeys.

pub mod error;
pub mod runner;
pub mod store;

pub use error::{BatchError, Result};
pub use runner::{BatchConfig, BatchOutcome, attribution_batch_loop, start_attribution_batch};
pub use store::{AttributionSink, InMemoryJourneyStore, JourneySource};
