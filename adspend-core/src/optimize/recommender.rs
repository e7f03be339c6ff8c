//! Greedy marginal-efficiency budget reallocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::OptimizeError;
use crate::metrics::ChannelMetrics;
use crate::types::Channel;

use super::types::{BudgetAllocation, BudgetPlan, PlanWarning, Recommendation};

/// Configuration for budget optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Channels scoring below this give up budget (default: 0.3)
    pub low_efficiency_threshold: f64,
    /// Channels scoring above this receive budget (default: 0.8)
    pub opportunity_threshold: f64,
    /// Largest change any channel may see, as a fraction of its budget (default: 0.40)
    pub max_shift_pct: f64,
    /// Changes within ± this percentage are labelled "maintain" (default: 10.0)
    pub recommendation_band_pct: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            low_efficiency_threshold: 0.3,
            opportunity_threshold: 0.8,
            max_shift_pct: 0.40,
            recommendation_band_pct: 10.0,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !unit(self.low_efficiency_threshold) || !unit(self.opportunity_threshold) {
            return Err(OptimizeError::InvalidConfig(
                "thresholds must lie in [0, 1]".into(),
            ));
        }
        if self.low_efficiency_threshold > self.opportunity_threshold {
            return Err(OptimizeError::InvalidConfig(format!(
                "low efficiency threshold {} exceeds opportunity threshold {}",
                self.low_efficiency_threshold, self.opportunity_threshold
            )));
        }
        if !unit(self.max_shift_pct) || self.max_shift_pct == 0.0 {
            return Err(OptimizeError::InvalidConfig(
                "max shift must lie in (0, 1]".into(),
            ));
        }
        if !self.recommendation_band_pct.is_finite() || self.recommendation_band_pct < 0.0 {
            return Err(OptimizeError::InvalidConfig(
                "recommendation band must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Recommends a reallocation of a fixed total budget
pub struct BudgetOptimizer {
    config: OptimizerConfig,
}

impl BudgetOptimizer {
    /// Create with default configuration
    pub fn new() -> Self {
        Self {
            config: OptimizerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Shift budget from low-efficiency channels to high-efficiency ones.
    ///
    /// Optimal budgets are non-negative, sum to the current total, and no
    /// channel moves by more than `max_shift_pct` of its current budget.
    /// When only one side of the exchange exists the plan comes back
    /// unchanged with a [`PlanWarning`] rather than an error.
    pub fn recommend(
        &self,
        metrics: &[ChannelMetrics],
        budgets: &BTreeMap<Channel, f64>,
    ) -> Result<BudgetPlan, OptimizeError> {
        self.config.validate()?;
        for (channel, budget) in budgets {
            if !budget.is_finite() || *budget < 0.0 {
                return Err(OptimizeError::InvalidBudget {
                    channel: channel.clone(),
                    value: *budget,
                });
            }
        }

        let by_channel: BTreeMap<&Channel, &ChannelMetrics> =
            metrics.iter().map(|m| (&m.channel, m)).collect();
        let low = self.config.low_efficiency_threshold;
        let high = self.config.opportunity_threshold;
        let max_shift = self.config.max_shift_pct;

        let mut missing_metrics = Vec::new();
        let mut donors: Vec<(&Channel, f64)> = Vec::new();
        let mut receivers: Vec<(&Channel, f64, f64)> = Vec::new();

        for (channel, &budget) in budgets {
            let Some(m) = by_channel.get(channel) else {
                missing_metrics.push(channel.clone());
                continue;
            };
            let score = m.efficiency_score;
            if score < low && budget > 0.0 {
                donors.push((channel, budget * max_shift * (low - score) / low));
            } else if score > high && budget > 0.0 {
                receivers.push((channel, score, budget * max_shift));
            }
        }

        if !missing_metrics.is_empty() {
            warn!(
                channels = missing_metrics.len(),
                "Budgeted channels have no metrics; leaving unchanged"
            );
        }

        let warning = match (donors.is_empty(), receivers.is_empty()) {
            (true, true) => {
                let unchanged = BTreeMap::new();
                return Ok(self.plan(budgets, &by_channel, &unchanged, None, missing_metrics));
            }
            (true, false) => Some(PlanWarning::NoDonors {
                receivers: receivers.iter().map(|(c, _, _)| (*c).clone()).collect(),
            }),
            (false, true) => Some(PlanWarning::NoReceivers {
                donors: donors.iter().map(|(c, _)| (*c).clone()).collect(),
            }),
            (false, false) => None,
        };
        if let Some(warning) = warning {
            warn!(warning = %warning.message(), "Returning unchanged budget plan");
            return Ok(self.plan(
                budgets,
                &by_channel,
                &BTreeMap::new(),
                Some(warning),
                missing_metrics,
            ));
        }

        let pool: f64 = donors.iter().map(|(_, r)| r).sum();
        let capacity: f64 = receivers.iter().map(|(_, _, c)| c).sum();
        let moved = pool.min(capacity);
        let scale = if pool > 0.0 { moved / pool } else { 0.0 };

        let mut changes: BTreeMap<&Channel, f64> = BTreeMap::new();
        for (channel, reduction) in &donors {
            changes.insert(channel, -reduction * scale);
        }

        receivers.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let mut remaining = moved;
        for (channel, _, cap) in &receivers {
            let give = remaining.min(*cap);
            if give <= 0.0 {
                break;
            }
            changes.insert(channel, give);
            remaining -= give;
        }

        info!(
            donors = donors.len(),
            receivers = receivers.len(),
            moved,
            "Reallocated budget"
        );

        Ok(self.plan(budgets, &by_channel, &changes, None, missing_metrics))
    }

    fn plan(
        &self,
        budgets: &BTreeMap<Channel, f64>,
        metrics: &BTreeMap<&Channel, &ChannelMetrics>,
        changes: &BTreeMap<&Channel, f64>,
        warning: Option<PlanWarning>,
        missing_metrics: Vec<Channel>,
    ) -> BudgetPlan {
        let total_budget: f64 = budgets.values().sum();
        let band = self.config.recommendation_band_pct;
        let mut weighted_change = 0.0;

        let allocations = budgets
            .iter()
            .map(|(channel, &current)| {
                let change = changes.get(channel).copied().unwrap_or(0.0);
                let m = metrics.get(channel);
                let efficiency_score = m.map(|m| m.efficiency_score);
                let roas = m.and_then(|m| m.roas).unwrap_or(0.0);
                let change_pct = if current > 0.0 {
                    change / current * 100.0
                } else {
                    0.0
                };
                weighted_change += change * efficiency_score.unwrap_or(0.0);

                let recommendation = if change_pct > band {
                    Recommendation::Increase
                } else if change_pct < -band {
                    Recommendation::Decrease
                } else {
                    Recommendation::Maintain
                };

                BudgetAllocation {
                    channel: channel.clone(),
                    current_budget: current,
                    optimal_budget: (current + change).max(0.0),
                    change,
                    change_pct,
                    efficiency_score,
                    expected_lift: change * roas,
                    recommendation,
                }
            })
            .collect();

        let expected_improvement_pct = if total_budget > 0.0 {
            weighted_change / total_budget * 100.0
        } else {
            0.0
        };

        BudgetPlan {
            total_budget,
            allocations,
            expected_improvement_pct,
            warning,
            missing_metrics,
        }
    }
}

impl Default for BudgetOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
