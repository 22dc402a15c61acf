//! Trace sinks for lifecycle records
//!
//! A sink is queried per category before any record is produced, so a
//! disabled category costs nothing, not even a command-line read.

pub mod json;
pub mod logging;

pub use json::JsonSink;
pub use logging::{init_logger, LogSink};

use crate::models::{LifecycleEvent, TraceError};
use serde::Serialize;

/// Destination for typed lifecycle records
pub trait TraceSink {
    /// Whether records of `category` are currently wanted
    fn is_enabled(&self, category: &str) -> bool;

    /// Deliver one record
    fn record(&mut self, event: &LifecycleEvent) -> Result<(), TraceError>;
}

impl<S: TraceSink + ?Sized> TraceSink for Box<S> {
    fn is_enabled(&self, category: &str) -> bool {
        (**self).is_enabled(category)
    }

    fn record(&mut self, event: &LifecycleEvent) -> Result<(), TraceError> {
        (**self).record(event)
    }
}

/// Output record: the lifecycle event stamped with the time it was written
#[derive(Debug, Serialize)]
struct TimestampedRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a LifecycleEvent,
}

/// Render `event` as a single-line JSON object stamped with the current time
pub fn render_record(event: &LifecycleEvent) -> Result<String, TraceError> {
    let record = TimestampedRecord {
        timestamp: chrono::Utc::now().to_rfc3339(),
        event,
    };
    Ok(serde_json::to_string(&record)?)
}

/// Human-readable one-line summary of a record
pub fn summarize(event: &LifecycleEvent) -> String {
    match event.instance_id() {
        Some(id) if !id.is_empty() => {
            format!("KVM VM {} by pid {} (instance {})", verb(event), event.pid(), id)
        }
        _ => format!("KVM VM {} by pid {}", verb(event), event.pid()),
    }
}

fn verb(event: &LifecycleEvent) -> &'static str {
    match event.phase() {
        crate::models::LifecyclePhase::Created => "created",
        crate::models::LifecyclePhase::Destroyed => "destroyed",
    }
}
