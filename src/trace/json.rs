//! JSON-lines trace sink

use crate::models::{LifecycleEvent, LifecyclePhase, TraceError};
use crate::trace::{render_record, TraceSink};
use std::collections::HashSet;
use std::io::Write;

/// Writes one JSON object per line to `W`, flushing after each record
pub struct JsonSink<W: Write> {
    writer: W,
    enabled: HashSet<&'static str>,
}

impl<W: Write> JsonSink<W> {
    /// Sink with every category enabled
    pub fn new(writer: W) -> Self {
        Self::with_phases(writer, [LifecyclePhase::Created, LifecyclePhase::Destroyed])
    }

    /// Sink with only the categories of `phases` enabled
    pub fn with_phases(writer: W, phases: impl IntoIterator<Item = LifecyclePhase>) -> Self {
        Self {
            writer,
            enabled: phases.into_iter().map(LifecyclePhase::category).collect(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for JsonSink<W> {
    fn is_enabled(&self, category: &str) -> bool {
        self.enabled.contains(category)
    }

    fn record(&mut self, event: &LifecycleEvent) -> Result<(), TraceError> {
        let line = render_record(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
