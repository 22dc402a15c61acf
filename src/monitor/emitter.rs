//! Production of exactly one trace record per lifecycle transition

use crate::models::{LifecycleEvent, LifecyclePhase};
use crate::monitor::resolver::IdentityResolver;
use crate::trace::TraceSink;

/// Turns classified transitions into records delivered to a trace sink
pub struct LifecycleEmitter<R, S> {
    resolver: R,
    sink: S,
}

impl<R: IdentityResolver, S: TraceSink> LifecycleEmitter<R, S> {
    pub fn new(resolver: R, sink: S) -> Self {
        Self { resolver, sink }
    }

    /// Emit the record for one transition.
    ///
    /// The sink is asked first; when the phase's category is disabled
    /// nothing else happens, in particular no identity resolution. A
    /// sink delivery failure is logged and dropped. Returns the record
    /// that was handed to the sink.
    pub fn emit(&mut self, phase: LifecyclePhase, pid: i32) -> Option<LifecycleEvent> {
        if !self.sink.is_enabled(phase.category()) {
            return None;
        }

        let event = match phase {
            LifecyclePhase::Created => LifecycleEvent::created(pid, self.resolver.resolve(pid)),
            // The argument vector of a destroying process is not worth reading
            LifecyclePhase::Destroyed => LifecycleEvent::destroyed(pid),
        };

        if let Err(e) = self.sink.record(&event) {
            log::warn!("Dropped {} record for pid {}: {}", phase, pid, e);
        }

        Some(event)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
