//! Attribution engine
//!
//! Credits each converted journey's revenue to the channels that touched
//! it, under a closed set of credit-assignment models.

mod comparison;
mod engine;
mod model;
mod types;

pub use comparison::{ComparisonRow, ModelComparison, ModelCorrelation};
pub use engine::{attribute, attribute_all};
pub use model::{AttributionConfig, AttributionModel, DEFAULT_HALF_LIFE_DAYS};
pub use types::AttributionResult;
