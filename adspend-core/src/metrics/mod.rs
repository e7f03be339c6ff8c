//! Metrics aggregation
//!
//! Per-channel counts, efficiency ratios, composite scoring and Pareto
//! breakdowns for one window and attribution model.

mod aggregate;
mod pareto;
mod tally;

pub use aggregate::{
    ChannelMetrics, EfficiencyWeights, MetricsAggregator, MetricsConfig, MetricsSummary,
    MetricsTable, TableKey,
};
pub use pareto::{ParetoSummary, ParetoValue, pareto};
pub use tally::{ChannelTotals, tally};
