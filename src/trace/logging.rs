//! Structured lifecycle logging through the `log` facade
//!
//! Each category is its own log target, so a category is disabled the
//! same way any log target is, e.g. `RUST_LOG=kvm_udev::kvm_created=off`.

use crate::constants::{CATEGORY_KVM_CREATED, CATEGORY_KVM_DESTROYED};
use crate::models::{LifecycleEvent, LifecyclePhase, TraceError};
use crate::trace::{render_record, summarize, TraceSink};
use anyhow::Result;
use log::Level;
use std::collections::HashSet;

/// Trace sink writing records as structured log lines
#[derive(Debug, Clone)]
pub struct LogSink {
    enabled: HashSet<&'static str>,
}

impl LogSink {
    /// Sink with every category enabled (subject to the log filter)
    pub fn new() -> Self {
        Self::with_phases([LifecyclePhase::Created, LifecyclePhase::Destroyed])
    }

    /// Sink with only the categories of `phases` enabled
    pub fn with_phases(phases: impl IntoIterator<Item = LifecyclePhase>) -> Self {
        Self {
            enabled: phases.into_iter().map(LifecyclePhase::category).collect(),
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for LogSink {
    fn is_enabled(&self, category: &str) -> bool {
        self.enabled.contains(category) && log::log_enabled!(target: category, Level::Info)
    }

    fn record(&mut self, event: &LifecycleEvent) -> Result<(), TraceError> {
        let data = render_record(event)?;

        // Format the complete log message with structured data
        log::info!(target: event.phase().category(), "{} | {}", summarize(event), data);
        Ok(())
    }
}

/// Filter used when `RUST_LOG` is unset. Quiet mode silences diagnostics
/// but keeps both lifecycle categories at `info`.
pub fn default_filter(quiet: bool) -> String {
    if quiet {
        format!("warn,{}=info,{}=info", CATEGORY_KVM_CREATED, CATEGORY_KVM_DESTROYED)
    } else {
        "info".to_string()
    }
}

/// Install the stderr logger; `RUST_LOG` overrides the default filter
pub fn init_logger(quiet: bool) -> Result<()> {
    let filter = default_filter(quiet);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))
}
