use crate::models::{LifecycleEvent, MonitorError};
use crate::monitor::classifier::EventClassifier;
use crate::monitor::emitter::LifecycleEmitter;
use crate::monitor::resolver::IdentityResolver;
use crate::monitor::uevent::NotificationSource;
use crate::trace::TraceSink;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Polling loop tying a notification source to the lifecycle emitter
pub struct Monitor<N, R, S> {
    source: N,
    classifier: EventClassifier,
    emitter: LifecycleEmitter<R, S>,
    interval: Duration,
}

impl<N, R, S> Monitor<N, R, S>
where
    N: NotificationSource,
    R: IdentityResolver,
    S: TraceSink,
{
    pub fn new(
        source: N,
        classifier: EventClassifier,
        emitter: LifecycleEmitter<R, S>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            classifier,
            emitter,
            interval,
        }
    }

    /// Process every notification currently available, in arrival order.
    ///
    /// Returns the records emitted during this pass. A receive error ends
    /// the pass early; it is logged, not propagated.
    pub fn drain(&mut self) -> Vec<LifecycleEvent> {
        let mut emitted = Vec::new();

        loop {
            let notification = match self.source.receive() {
                Ok(Some(notification)) => notification,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("{}", e);
                    break;
                }
            };

            // Anything else on the channel is irrelevant and dropped silently
            if let Some(classification) = self.classifier.classify_notification(&notification) {
                if let Some(event) = self.emitter.emit(classification.phase, classification.pid) {
                    emitted.push(event);
                }
            }
        }

        emitted
    }

    /// One readiness check, draining if anything is pending
    pub fn poll_once(&mut self) -> Result<Vec<LifecycleEvent>, MonitorError> {
        if self.source.is_ready()? {
            Ok(self.drain())
        } else {
            Ok(Vec::new())
        }
    }

    /// Run until `running` is cleared, keeping a steady polling cadence
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        log::info!(
            "Watching {} for VM lifecycle events (interval: {:.2}s)",
            self.classifier.device_node(),
            self.interval.as_secs_f64()
        );

        while running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();

            match self.poll_once() {
                Ok(events) if !events.is_empty() => {
                    log::debug!("Emitted {} lifecycle record(s)", events.len());
                }
                Ok(_) => {}
                Err(e) => log::warn!("{}", e),
            }

            // Calculate sleep time to maintain interval
            let cycle_duration = cycle_start.elapsed();
            if let Some(sleep_duration) = self.interval.checked_sub(cycle_duration) {
                std::thread::sleep(sleep_duration);
            }
        }

        log::info!("Monitoring stopped");
        Ok(())
    }

    pub fn emitter(&self) -> &LifecycleEmitter<R, S> {
        &self.emitter
    }

    pub fn source(&self) -> &N {
        &self.source
    }
}
