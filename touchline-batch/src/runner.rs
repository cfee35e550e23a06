//! Cancellable batch recomputation of attribution
//!
//! Walks every journey in a [`JourneySource`], generates attribution for the
//! configured models and hands the rows to an [`AttributionSink`]. The run
//! checks its cancellation token between journeys, so a shutdown never
//! leaves a journey half-written.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use touchline_core::{AttributionEngine, JourneyId, ModelType};

use crate::error::Result;
use crate::store::{AttributionSink, JourneySource};

/// Default number of journeys between progress logs
const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Whether batch recomputation is enabled
    pub enabled: bool,
    /// Models generated for each journey
    pub models: Vec<ModelType>,
    /// Journeys between progress logs
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            models: ModelType::all().to_vec(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Result of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Journeys whose results were stored
    pub processed: usize,
    /// Journeys that vanished or had no conversions
    pub skipped: usize,
    /// Journeys that failed, with the error message
    pub failures: Vec<(JourneyId, String)>,
    /// Run stopped early on the shutdown token
    pub cancelled: bool,
    /// Run was disabled by configuration
    pub disabled: bool,
}

impl BatchOutcome {
    fn disabled() -> Self {
        Self {
            disabled: true,
            ..Default::default()
        }
    }

    /// Whether every visited journey succeeded
    pub fn is_success(&self) -> bool {
        !self.disabled && self.failures.is_empty()
    }
}

/// Start a batch run on a background task
///
/// # Arguments
/// * `engine` - Attribution engine shared with the caller
/// * `source` - Journey store to read snapshots from
/// * `sink` - Destination for generated rows
/// * `config` - Batch configuration
/// * `shutdown` - Cancellation token for graceful shutdown
pub fn start_attribution_batch(
    engine: Arc<AttributionEngine>,
    source: Arc<dyn JourneySource>,
    sink: Arc<dyn AttributionSink>,
    config: BatchConfig,
    shutdown: CancellationToken,
) -> JoinHandle<Result<BatchOutcome>> {
    tokio::spawn(async move {
        attribution_batch_loop(engine, source, sink, config, shutdown).await
    })
}

/// Recompute attribution for every journey in `source`
///
/// Missing journeys and journeys without conversions are skipped. A failure
/// on one journey is recorded and the run moves on. Listing journeys is the
/// only failure that aborts the run.
pub async fn attribution_batch_loop(
    engine: Arc<AttributionEngine>,
    source: Arc<dyn JourneySource>,
    sink: Arc<dyn AttributionSink>,
    config: BatchConfig,
    shutdown: CancellationToken,
) -> Result<BatchOutcome> {
    if !config.enabled {
        debug!("Attribution batch disabled");
        return Ok(BatchOutcome::disabled());
    }

    let ids = source.journey_ids().await?;
    info!(journeys = ids.len(), models = config.models.len(), "Starting attribution batch");

    let mut outcome = BatchOutcome::default();

    for (idx, id) in ids.into_iter().enumerate() {
        let loaded = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!(visited = idx, "Attribution batch received shutdown signal");
                outcome.cancelled = true;
                break;
            }

            loaded = source.load_journey(id) => loaded,
        };

        match loaded {
            Ok(Some(journey)) if journey.has_conversions() => {
                let results = engine.generate_attribution_models(&journey, &config.models);
                match sink.store_results(id, &results).await {
                    Ok(()) => outcome.processed += 1,
                    Err(e) => {
                        warn!(journey_id = %id, error = %e, "Failed to store attribution results");
                        outcome.failures.push((id, e.to_string()));
                    }
                }
            }
            Ok(Some(_)) | Ok(None) => {
                outcome.skipped += 1;
            }
            Err(e) => {
                warn!(journey_id = %id, error = %e, "Failed to load journey");
                outcome.failures.push((id, e.to_string()));
            }
        }

        if config.progress_interval > 0 && (idx + 1) % config.progress_interval == 0 {
            debug!(
                visited = idx + 1,
                processed = outcome.processed,
                skipped = outcome.skipped,
                failed = outcome.failures.len(),
                "Attribution batch progress"
            );
        }

        tokio::task::yield_now().await;
    }

    info!(
        processed = outcome.processed,
        skipped = outcome.skipped,
        failed = outcome.failures.len(),
        cancelled = outcome.cancelled,
        "Attribution batch finished"
    );

    Ok(outcome)
}
