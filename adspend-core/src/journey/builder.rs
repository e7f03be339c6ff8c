//! Groups raw events into per-user journeys.

use std::collections::{BTreeMap, HashSet};

use chrono::Duration;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::DataError;
use crate::types::Event;

use super::types::Journey;

/// Configuration for journey construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyConfig {
    /// Lookback window in days (default: 30)
    ///
    /// Touchpoints older than this before a conversion are not credited,
    /// and a gap longer than this between two events ends a journey.
    pub lookback_days: u32,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self { lookback_days: 30 }
    }
}

impl JourneyConfig {
    pub fn lookback(&self) -> Duration {
        Duration::days(i64::from(self.lookback_days))
    }
}

/// A problem found while building one user's journey
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyIssue {
    pub user_id: String,
    pub event_count: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: DataError,
}

/// Summary of a build: what was kept, dropped and rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub events_seen: usize,
    pub duplicates_dropped: usize,
    pub converted_journeys: usize,
    pub unconverted_journeys: usize,
    /// Journeys excluded from every downstream stage
    pub rejected: Vec<JourneyIssue>,
    /// Journeys kept despite an anomaly (orphan conversions)
    pub warnings: Vec<JourneyIssue>,
}

impl BuildReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Output of [`JourneyBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct JourneySet {
    /// Journeys terminated by a conversion; input to attribution
    pub converted: Vec<Journey>,
    /// Journeys that expired without converting; count toward CTR only
    pub unconverted: Vec<Journey>,
    pub report: BuildReport,
}

impl JourneySet {
    /// Every accepted journey, converted first
    pub fn all(&self) -> impl Iterator<Item = &Journey> {
        self.converted.iter().chain(self.unconverted.iter())
    }
}

/// Splits an unordered event batch into validated journeys
pub struct JourneyBuilder {
    config: JourneyConfig,
}

impl JourneyBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: JourneyConfig::default(),
        }
    }

    /// Create a builder with custom configuration
    pub fn with_config(config: JourneyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JourneyConfig {
        &self.config
    }

    /// Build journeys from `events`.
    ///
    /// Never fails as a whole: journeys with structural problems are
    /// listed in the report's `rejected` and everything else proceeds.
    pub fn build(&self, events: &[Event]) -> JourneySet {
        let mut set = JourneySet::default();
        set.report.events_seen = events.len();

        let mut seen = HashSet::with_capacity(events.len());
        let mut by_user: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
        for event in events {
            if !seen.insert(event.event_id.as_str()) {
                set.report.duplicates_dropped += 1;
                continue;
            }
            by_user.entry(event.user_id.as_str()).or_default().push(event);
        }

        if set.report.duplicates_dropped > 0 {
            warn!(
                duplicates = set.report.duplicates_dropped,
                "Dropped duplicate event ids"
            );
        }

        for (user_id, mut user_events) in by_user {
            user_events.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
            for candidate in self.split(user_events) {
                self.accept(&mut set, user_id, candidate);
            }
        }

        set.report.converted_journeys = set.converted.len();
        set.report.unconverted_journeys = set.unconverted.len();

        info!(
            events = set.report.events_seen,
            converted = set.report.converted_journeys,
            unconverted = set.report.unconverted_journeys,
            rejected = set.report.rejected_count(),
            "Built journeys"
        );

        set
    }

    /// Split one user's time-ordered events at conversions and gaps
    fn split(&self, events: Vec<&Event>) -> Vec<Vec<Event>> {
        let lookback = self.config.lookback();
        let mut journeys = Vec::new();
        let mut open: Vec<Event> = Vec::new();

        for event in events {
            if event.is_conversion() {
                let cutoff = event.timestamp - lookback;
                let expired = open.partition_point(|e| e.timestamp < cutoff);
                if expired > 0 {
                    journeys.push(open.drain(..expired).collect());
                }
                open.push(event.clone());
                journeys.push(std::mem::take(&mut open));
                continue;
            }

            if let Some(last) = open.last()
                && event.timestamp - last.timestamp > lookback
            {
                journeys.push(std::mem::take(&mut open));
            }
            open.push(event.clone());
        }

        if !open.is_empty() {
            journeys.push(open);
        }

        journeys
    }

    fn accept(&self, set: &mut JourneySet, user_id: &str, events: Vec<Event>) {
        let event_count = events.len();
        match Journey::new(user_id, events) {
            Ok(journey) => {
                if journey.is_orphan_conversion()
                    && let Some(conversion) = journey.conversion()
                {
                    set.report.warnings.push(JourneyIssue {
                        user_id: user_id.to_string(),
                        event_count,
                        error: DataError::OrphanConversion {
                            user_id: user_id.to_string(),
                            event_id: conversion.event_id.clone(),
                        },
                    });
                }
                if journey.is_converted() {
                    set.converted.push(journey);
                } else {
                    set.unconverted.push(journey);
                }
            }
            Err(error) => {
                debug!(user_id, %error, "Rejected journey");
                set.report.rejected.push(JourneyIssue {
                    user_id: user_id.to_string(),
                    event_count,
                    error,
                });
            }
        }
    }
}

impl Default for JourneyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize_display<S: Serializer>(error: &DataError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
