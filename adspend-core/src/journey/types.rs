//! Journey type and its structural invariants.

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::types::{Event, EventType};

/// Ordered events for one user, ending at a conversion or window expiry.
///
/// Invariants (checked by [`Journey::new`]): events are sorted ascending
/// by timestamp, there is at most one conversion, and a conversion is
/// always the final event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    user_id: String,
    events: Vec<Event>,
}

impl Journey {
    /// Validate `events` and wrap them as a journey.
    ///
    /// Rejects empty identifiers, negative or non-finite amounts,
    /// timestamps before the Unix epoch, out-of-order events, and
    /// conversions anywhere but the final position.
    pub fn new(user_id: impl Into<String>, events: Vec<Event>) -> Result<Self, DataError> {
        let user_id = user_id.into();

        for event in &events {
            validate_event(event)?;
        }

        for pair in events.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(DataError::NonMonotonic {
                    user_id,
                    event_id: pair[1].event_id.clone(),
                });
            }
        }

        let last = events.len().saturating_sub(1);
        if let Some((_, misplaced)) = events
            .iter()
            .enumerate()
            .find(|(idx, e)| e.is_conversion() && *idx != last)
        {
            return Err(DataError::MisplacedConversion {
                user_id,
                event_id: misplaced.event_id.clone(),
            });
        }

        Ok(Self { user_id, events })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The terminal conversion, if the journey converted
    pub fn conversion(&self) -> Option<&Event> {
        self.events.last().filter(|e| e.is_conversion())
    }

    pub fn is_converted(&self) -> bool {
        self.conversion().is_some()
    }

    /// Events eligible for attribution credit, in time order.
    ///
    /// A converted journey with no impressions or clicks falls back to the
    /// conversion itself so that its revenue is still credited.
    pub fn touchpoints(&self) -> &[Event] {
        match self.conversion() {
            Some(_) if self.events.len() == 1 => &self.events,
            Some(_) => &self.events[..self.events.len() - 1],
            None => &self.events,
        }
    }

    /// Whether a conversion has no prior touchpoint
    pub fn is_orphan_conversion(&self) -> bool {
        self.is_converted() && self.events.len() == 1
    }

    /// Conversion revenue, zero for unconverted journeys
    pub fn revenue(&self) -> f64 {
        self.conversion().map_or(0.0, |c| c.revenue)
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

fn validate_event(event: &Event) -> Result<(), DataError> {
    for (field, value) in [
        ("event_id", &event.event_id),
        ("user_id", &event.user_id),
        ("channel", &event.channel.0),
    ] {
        if value.trim().is_empty() {
            return Err(DataError::MissingField {
                event_id: event.event_id.clone(),
                field,
            });
        }
    }

    for (field, value) in [("cost", event.cost), ("revenue", event.revenue)] {
        if !value.is_finite() || value < 0.0 {
            return Err(DataError::InvalidAmount {
                event_id: event.event_id.clone(),
                field,
                value,
            });
        }
    }

    if event.timestamp.timestamp() < 0 {
        return Err(DataError::BeforeEpoch {
            event_id: event.event_id.clone(),
        });
    }

    Ok(())
}
