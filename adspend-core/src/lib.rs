//! adspend-core - Multi-touch attribution and budget optimization
//!
//! This crate turns a batch of ad events (impressions, clicks, conversions)
//! into per-channel efficiency metrics and a budget reallocation plan.
//!
//! # Pipeline
//!
//! - **Journeys** ([`JourneyBuilder`]) group events per user, bounded by a
//!   lookback window and terminated by a conversion
//! - **Attribution** ([`attribute`]) credits conversion revenue to channels
//!   under one of five [`AttributionModel`]s
//! - **Metrics** ([`MetricsAggregator`]) compute per-channel ratios and a
//!   composite efficiency score for one window and model
//! - **Optimization** ([`BudgetOptimizer`]) shifts a fixed budget toward
//!   efficient channels within per-channel caps
//! - **A/B testing** ([`AbTestEvaluator`]) checks whether a difference in a
//!   proportion metric is significant and adequately powered
//!
//! [`Pipeline`] runs every stage from one [`PipelineConfig`].

pub mod abtest;
pub mod attribution;
pub mod config;
pub mod error;
pub mod journey;
pub mod metrics;
pub mod optimize;
pub mod pipeline;
pub mod synth;
pub mod types;

pub use abtest::{ABTestResult, AbTestConfig, AbTestEvaluator, ArmSample, TargetMetric};
pub use attribution::{
    AttributionConfig, AttributionModel, AttributionResult, ComparisonRow, ModelComparison,
    ModelCorrelation,
    attribute, attribute_all,
};
pub use config::PipelineConfig;
pub use error::{AbTestError, AdspendError, DataError, ModelError, OptimizeError, Result};
pub use journey::{BuildReport, Journey, JourneyBuilder, JourneyConfig, JourneySet};
pub use metrics::{
    ChannelMetrics, EfficiencyWeights, MetricsAggregator, MetricsConfig, MetricsTable, TableKey,
};
pub use optimize::{
    BudgetAllocation, BudgetOptimizer, BudgetPlan, OptimizerConfig, PlanWarning, Recommendation,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use synth::{ChannelProfile, SynthConfig};
pub use types::{Channel, Event, EventType, TimeWindow};
