//! Attribution engine
//!
//! Computes per-touchpoint credit for a journey snapshot under each
//! attribution model. The engine is a pure computation: it holds no mutable
//! state, performs no I/O and can be shared across threads.

use chrono::Utc;
use tracing::{debug, instrument, trace, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::journey::{AttributionWindow, Journey, Touchpoint};
use crate::models::{
    AttributionStrategy, BoostedLinearStrategy, CompositeStrategy, TimeDecayModel, first_touch,
    last_touch, linear, normalize, position_based,
};
use crate::types::{ALGORITHM_VERSION, AttributionModel, CalculationMetadata, ModelResults, ModelType};

/// Multi-touch attribution engine
pub struct AttributionEngine {
    config: EngineConfig,
    time_decay: TimeDecayModel,
    data_driven: Box<dyn AttributionStrategy>,
    custom: Box<dyn AttributionStrategy>,
}

impl AttributionEngine {
    /// Create an engine with the default strategies built from `config`
    ///
    /// Fails with `Config` when `config` does not pass
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an engine with host-supplied data-driven and custom strategies
    ///
    /// Fails with `Config` when `config` does not pass
    /// [`EngineConfig::validate`].
    pub fn with_strategies(
        config: EngineConfig,
        data_driven: Box<dyn AttributionStrategy>,
        custom: Box<dyn AttributionStrategy>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, data_driven, custom))
    }

    /// Build the default strategies from an already validated config
    fn build(config: EngineConfig) -> Self {
        let time_decay = TimeDecayModel::with_config(config.time_decay.clone());
        let data_driven = CompositeStrategy::with_config(
            config.data_driven.clone(),
            config.position_based.clone(),
            time_decay.clone(),
        );
        let custom = BoostedLinearStrategy::with_config(config.custom.clone());

        Self::assemble(config, Box::new(data_driven), Box::new(custom))
    }

    fn assemble(
        config: EngineConfig,
        data_driven: Box<dyn AttributionStrategy>,
        custom: Box<dyn AttributionStrategy>,
    ) -> Self {
        let time_decay = TimeDecayModel::with_config(config.time_decay.clone());
        Self {
            config,
            time_decay,
            data_driven,
            custom,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Percentages for every touchpoint in the window under `model`
    pub fn distribute(&self, model: ModelType, window: &AttributionWindow<'_>) -> Vec<f64> {
        let shares = match model {
            ModelType::FirstTouch => first_touch(window),
            ModelType::LastTouch => last_touch(window),
            ModelType::Linear => linear(window),
            ModelType::TimeDecay => self.time_decay.distribute(window),
            ModelType::PositionBased => position_based(window, &self.config.position_based),
            ModelType::DataDriven => self.strategy_shares(self.data_driven.as_ref(), window),
            ModelType::Custom => self.strategy_shares(self.custom.as_ref(), window),
        };

        trace!(model = %model, touchpoints = window.len(), ?shares, "Distributed credit");
        shares
    }

    /// Run a pluggable strategy and hold it to the sum-to-100 contract
    fn strategy_shares(
        &self,
        strategy: &dyn AttributionStrategy,
        window: &AttributionWindow<'_>,
    ) -> Vec<f64> {
        let weights = strategy.distribute(window);
        let usable = weights.len() == window.len()
            && weights.iter().all(|w| w.is_finite() && *w >= 0.0)
            && weights.iter().any(|w| *w > 0.0);

        if !usable {
            warn!(
                strategy = strategy.name(),
                expected = window.len(),
                returned = weights.len(),
                "Strategy returned unusable weights, falling back to linear"
            );
            return linear(window);
        }

        normalize(&weights)
    }

    /// Percentages aligned with every touchpoint of the journey
    ///
    /// Touchpoints after the last conversion get 0. Empty for an empty
    /// journey.
    pub fn journey_shares(&self, model: ModelType, journey: &Journey) -> Vec<f64> {
        let Some(window) = journey.attribution_window() else {
            return Vec::new();
        };

        let mut shares = self.distribute(model, &window);
        shares.resize(journey.len(), 0.0);
        shares
    }

    /// Credit one touchpoint receives under `model` (0.0 - 100.0)
    ///
    /// A touchpoint that is not part of the journey, or that falls after the
    /// last conversion, receives 0.
    pub fn calculate_attribution_for_touchpoint(
        &self,
        touchpoint: &Touchpoint,
        model: ModelType,
        journey: &Journey,
    ) -> f64 {
        let Some(position) = journey.position_of(touchpoint.id) else {
            debug!(touchpoint_id = %touchpoint.id, journey_id = %journey.id(), "Touchpoint not in journey");
            return 0.0;
        };

        let Some(window) = journey.attribution_window() else {
            return 0.0;
        };

        if position >= window.len() {
            return 0.0;
        }

        self.distribute(model, &window)[position]
    }

    /// Like [`calculate_attribution_for_touchpoint`](Self::calculate_attribution_for_touchpoint)
    /// for a model name supplied at runtime
    ///
    /// Fails with `UnsupportedModel` for names outside the closed set.
    pub fn calculate_attribution_by_name(
        &self,
        touchpoint: &Touchpoint,
        model: &str,
        journey: &Journey,
    ) -> Result<f64> {
        let model: ModelType = model.parse()?;
        Ok(self.calculate_attribution_for_touchpoint(touchpoint, model, journey))
    }

    /// Attribution rows for every touchpoint under each requested model
    ///
    /// A journey with several conversions is credited as one window ending
    /// at its last conversion, not conversion by conversion. The shares of
    /// each model sum to 100 over that window and `conversion_value` splits
    /// the summed value of every conversion. Touchpoints after the last
    /// conversion get a 0% row.
    ///
    /// Returns an empty map when the journey has no conversions.
    #[instrument(skip(self, journey), fields(journey_id = %journey.id()))]
    pub fn generate_attribution_models(
        &self,
        journey: &Journey,
        models: &[ModelType],
    ) -> ModelResults {
        let mut results = ModelResults::new();

        if !journey.has_conversions() {
            debug!(touchpoints = journey.len(), "No conversions, skipping attribution");
            return results;
        }

        let conversion_value = journey.conversion_value(self.config.default_conversion_value);
        let conversion_count = journey.conversion_count();
        let calculated_at = Utc::now();

        for &model in models {
            if results.contains_key(&model) {
                continue;
            }

            let shares = self.journey_shares(model, journey);
            let rows = journey
                .touchpoints()
                .iter()
                .zip(shares)
                .enumerate()
                .map(|(idx, (tp, percentage))| AttributionModel {
                    touchpoint_id: tp.id,
                    channel: tp.channel.clone(),
                    model_type: model,
                    attribution_percentage: percentage,
                    conversion_value: percentage / 100.0 * conversion_value,
                    calculation_metadata: CalculationMetadata {
                        model_type: model,
                        touchpoint_position: idx + 1,
                        total_touchpoints: journey.len(),
                        conversion_count,
                        journey_id: journey.id(),
                        algorithm_version: ALGORITHM_VERSION.to_string(),
                        calculated_at,
                    },
                })
                .collect();

            results.insert(model, rows);
        }

        debug!(
            models = results.len(),
            touchpoints = journey.len(),
            conversion_value,
            "Generated attribution models"
        );

        results
    }

    /// Like [`generate_attribution_models`](Self::generate_attribution_models)
    /// for model names supplied at runtime
    ///
    /// Every name is validated before anything is computed, so an unknown
    /// name yields no partial result.
    pub fn generate_attribution_models_by_name(
        &self,
        journey: &Journey,
        models: &[&str],
    ) -> Result<ModelResults> {
        let models = models
            .iter()
            .map(|name| name.parse::<ModelType>())
            .collect::<Result<Vec<_>>>()?;
        Ok(self.generate_attribution_models(journey, &models))
    }
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}
