//! Budget optimization
//!
//! Reallocates a fixed total budget from inefficient channels toward
//! efficient ones, within per-channel shift caps.

mod recommender;
mod types;

pub use recommender::{BudgetOptimizer, OptimizerConfig};
pub use types::{BudgetAllocation, BudgetPlan, PlanWarning, Recommendation};
