//! Budget plan records.

use serde::{Deserialize, Serialize};

use crate::types::Channel;

/// Suggested direction for a channel's budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Increase,
    Maintain,
    Decrease,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Maintain => "maintain",
            Self::Decrease => "decrease",
        }
    }
}

/// Why a plan was returned unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// Channels qualify for more budget but none is inefficient enough to give any up
    NoDonors { receivers: Vec<Channel> },
    /// Channels are inefficient but none qualifies to receive their budget
    NoReceivers { donors: Vec<Channel> },
}

impl PlanWarning {
    pub fn message(&self) -> String {
        match self {
            Self::NoDonors { receivers } => format!(
                "{} channel(s) qualify for more budget but no channel is below the efficiency threshold",
                receivers.len()
            ),
            Self::NoReceivers { donors } => format!(
                "{} channel(s) are below the efficiency threshold but no channel is above the opportunity threshold",
                donors.len()
            ),
        }
    }
}

/// Current and recommended budget for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub channel: Channel,
    pub current_budget: f64,
    pub optimal_budget: f64,
    pub change: f64,
    /// Change relative to current budget, in percent (0 when current is 0)
    pub change_pct: f64,
    /// Absent when the channel has a budget but no metrics
    pub efficiency_score: Option<f64>,
    /// Projected change in credited revenue at the channel's current ROAS
    pub expected_lift: f64,
    pub recommendation: Recommendation,
}

/// Fixed-total budget reallocation across channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub total_budget: f64,
    /// Sorted by channel
    pub allocations: Vec<BudgetAllocation>,
    /// Efficiency-weighted budget movement relative to the total, in percent
    pub expected_improvement_pct: f64,
    pub warning: Option<PlanWarning>,
    /// Budgeted channels with no metrics; left unchanged
    pub missing_metrics: Vec<Channel>,
}

impl BudgetPlan {
    pub fn get(&self, channel: &Channel) -> Option<&BudgetAllocation> {
        self.allocations.iter().find(|a| &a.channel == channel)
    }

    pub fn optimal_total(&self) -> f64 {
        self.allocations.iter().map(|a| a.optimal_budget).sum()
    }

    /// Total budget moved between channels
    pub fn moved(&self) -> f64 {
        self.allocations
            .iter()
            .map(|a| a.change)
            .filter(|c| *c > 0.0)
            .sum()
    }

    pub fn is_unchanged(&self) -> bool {
        self.allocations.iter().all(|a| a.change == 0.0)
    }
}
