//! End-to-end attribution and optimization run
//!
//! Journeys are built once; each configured model is attributed on its
//! own rayon task, then metrics are aggregated per model and the primary
//! model's table drives the budget plan.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::abtest::{ABTestResult, AbTestEvaluator, ArmSample, TargetMetric};
use crate::attribution::{AttributionModel, AttributionResult, ModelComparison, attribute_all};
use crate::config::PipelineConfig;
use crate::error::{AbTestError, ModelError, Result};
use crate::journey::{BuildReport, Journey, JourneyBuilder};
use crate::metrics::{
    MetricsAggregator, MetricsTable, ParetoSummary, ParetoValue, TableKey, pareto, tally,
};
use crate::optimize::{BudgetOptimizer, BudgetPlan};
use crate::types::{Channel, Event, TimeWindow};

/// Everything one run derives from its events and budgets
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub config_fingerprint: String,
    pub window: TimeWindow,
    pub primary_model: AttributionModel,
    pub build_report: BuildReport,
    /// One table per model, in configured order
    pub tables: Vec<MetricsTable>,
    pub comparison: ModelComparison,
    pub plan: BudgetPlan,
    /// Revenue concentration under the primary model
    pub pareto: Option<ParetoSummary>,
}

impl PipelineOutput {
    pub fn table(&self, model: &AttributionModel) -> Option<&MetricsTable> {
        self.tables.iter().find(|t| &t.key.model == model)
    }

    pub fn primary_table(&self) -> Option<&MetricsTable> {
        self.table(&self.primary_model)
    }
}

/// Configured pipeline, validated up front
pub struct Pipeline {
    config: PipelineConfig,
    fingerprint: String,
    models: Vec<AttributionModel>,
    primary: AttributionModel,
    builder: JourneyBuilder,
    aggregator: MetricsAggregator,
    optimizer: BudgetOptimizer,
    evaluator: AbTestEvaluator,
}

impl Pipeline {
    /// Validate every section of `config` and prepare the stages.
    ///
    /// The primary model is computed even when it is not listed among the
    /// configured models.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let mut models = config.attribution.models()?;
        let primary = config.attribution.primary()?;
        if !models.contains(&primary) {
            models.push(primary);
        }
        if models.is_empty() {
            return Err(
                ModelError::InvalidConfig("no attribution models configured".into()).into(),
            );
        }
        for model in &models {
            model.validate()?;
        }
        config.optimizer.validate()?;

        let aggregator = MetricsAggregator::with_weights(config.metrics.weights.clone())?;
        let evaluator = AbTestEvaluator::with_config(config.abtest.clone())?;
        let fingerprint = config.fingerprint()?;

        Ok(Self {
            builder: JourneyBuilder::with_config(config.journey.clone()),
            optimizer: BudgetOptimizer::with_config(config.optimizer.clone()),
            config,
            fingerprint,
            models,
            primary,
            aggregator,
            evaluator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn models(&self) -> &[AttributionModel] {
        &self.models
    }

    pub fn primary_model(&self) -> AttributionModel {
        self.primary
    }

    /// Build journeys, attribute, aggregate and optimize.
    ///
    /// Identical events, budgets and configuration always produce
    /// identical output.
    pub fn run(&self, events: &[Event], budgets: &BTreeMap<Channel, f64>) -> Result<PipelineOutput> {
        let journeys = self.builder.build(events);

        let window = match self.config.metrics.window {
            Some(window) => window,
            None => TimeWindow::covering(journeys.all().flat_map(|j| j.events())).unwrap_or_else(
                || TimeWindow::new(DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::UNIX_EPOCH),
            ),
        };

        let results = self.attribute(&journeys.converted)?;
        let totals = tally(journeys.all(), &window);

        let tables: Vec<MetricsTable> = results
            .iter()
            .map(|(model, model_results)| {
                let key = TableKey {
                    window,
                    model: *model,
                    config_fingerprint: self.fingerprint.clone(),
                };
                self.aggregator.aggregate(&totals, model_results, key)
            })
            .collect();

        let comparison = ModelComparison::from_results(&results);

        let primary_rows = tables
            .iter()
            .find(|t| t.key.model == self.primary)
            .map(|t| t.rows.as_slice())
            .unwrap_or_default();
        let plan = self.optimizer.recommend(primary_rows, budgets)?;
        let pareto = pareto(primary_rows, ParetoValue::CreditedRevenue);

        info!(
            events = events.len(),
            converted = journeys.converted.len(),
            unconverted = journeys.unconverted.len(),
            rejected = journeys.report.rejected_count(),
            models = tables.len(),
            "Pipeline run complete"
        );

        Ok(PipelineOutput {
            config_fingerprint: self.fingerprint.clone(),
            window,
            primary_model: self.primary,
            build_report: journeys.report,
            tables,
            comparison,
            plan,
            pareto,
        })
    }

    /// Attribute converted journeys under every model, one task per model
    fn attribute(
        &self,
        converted: &[Journey],
    ) -> std::result::Result<Vec<(AttributionModel, Vec<AttributionResult>)>, ModelError> {
        self.models
            .par_iter()
            .map(|model| {
                let results = attribute_all(converted, model)?;
                debug!(model = %model, conversions = results.len(), "Attributed journeys");
                Ok::<_, ModelError>((*model, results))
            })
            .collect()
    }

    /// Test two arms with the configured significance settings
    pub fn evaluate(&self, control: &ArmSample, treatment: &ArmSample) -> Result<ABTestResult> {
        Ok(self.evaluator.evaluate(control, treatment)?)
    }

    /// Compare two channels of a metrics table as control and treatment
    pub fn compare_channels(
        &self,
        table: &MetricsTable,
        control: &Channel,
        treatment: &Channel,
        target: TargetMetric,
    ) -> Result<ABTestResult> {
        let arm = |label: &'static str, channel: &Channel| {
            table
                .get(channel)
                .map(|m| ArmSample::from_metrics(m, target))
                .ok_or_else(|| AbTestError::MissingArm(label, channel.to_string()))
        };
        let control = arm("control", control)?;
        let treatment = arm("treatment", treatment)?;
        self.evaluate(&control, &treatment)
    }
}
