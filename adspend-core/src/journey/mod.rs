//! Journey construction
//!
//! Turns an unordered batch of events into per-user journeys that end at a
//! conversion or at lookback-window expiry.

mod builder;
mod types;

pub use builder::{BuildReport, JourneyBuilder, JourneyConfig, JourneyIssue, JourneySet};
pub use types::Journey;
