//! Core data types shared by every stage of the pipeline.

mod event;
mod window;

pub use event::{Channel, Event, EventType};
pub use window::TimeWindow;
