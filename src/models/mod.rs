//! Data models module
//!
//! Defines core data structures:
//! - RawNotification: Property bag of one hotplug notification
//! - LifecyclePhase: Which VM lifecycle transition a notification represents
//! - InstanceId: Bounded VM instance identifier taken from a command line
//! - LifecycleEvent: Typed trace record handed to a trace sink

use crate::constants::{
    CATEGORY_KVM_CREATED, CATEGORY_KVM_DESTROYED, DEV_ROOT, INSTANCE_ID_CAPACITY, PROP_DEVNAME,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;


/// One raw hotplug notification as delivered by a notification source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNotification {
    /// Device node the notification concerns, if any
    devnode: Option<String>,
    /// Notification properties (`KEY=VALUE` entries)
    properties: BTreeMap<String, String>,
}

impl RawNotification {
    /// Build a notification from its properties, deriving the device node
    /// from `DEVNAME` (relative names live under `/dev`).
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        let devnode = properties.get(PROP_DEVNAME).map(|name| devnode_from_devname(name));
        Self { devnode, properties }
    }

    /// Build a notification from `(key, value)` pairs; the first occurrence of a key wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut properties = BTreeMap::new();
        for (key, value) in pairs {
            properties.entry(key.into()).or_insert_with(|| value.into());
        }
        Self::new(properties)
    }

    /// Override the device node regardless of `DEVNAME`
    pub fn with_devnode(mut self, devnode: impl Into<String>) -> Self {
        self.devnode = Some(devnode.into());
        self
    }

    pub fn devnode(&self) -> Option<&str> {
        self.devnode.as_deref()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

fn devnode_from_devname(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("{}/{}", DEV_ROOT, name)
    }
}

/// VM lifecycle transition signalled by the kvm device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecyclePhase {
    #[serde(rename = "kvm_created")]
    Created,
    #[serde(rename = "kvm_destroyed")]
    Destroyed,
}

impl LifecyclePhase {
    /// Trace category records of this phase are emitted under
    pub fn category(self) -> &'static str {
        match self {
            LifecyclePhase::Created => CATEGORY_KVM_CREATED,
            LifecyclePhase::Destroyed => CATEGORY_KVM_DESTROYED,
        }
    }

    /// Short event name used in records and configuration files
    pub fn event_name(self) -> &'static str {
        match self {
            LifecyclePhase::Created => "kvm_created",
            LifecyclePhase::Destroyed => "kvm_destroyed",
        }
    }

    /// Look up a phase by short event name or full category
    pub fn from_name(name: &str) -> Option<Self> {
        [LifecyclePhase::Created, LifecyclePhase::Destroyed]
            .into_iter()
            .find(|phase| phase.event_name() == name || phase.category() == name)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// VM instance identifier, at most `INSTANCE_ID_CAPACITY` characters.
///
/// Longer values are truncated rather than rejected: a QEMU-style UUID is
/// exactly 36 characters, anything beyond that is cut off silently.
/// An empty identifier means resolution found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(value: &str) -> Self {
        Self(value.chars().take(INSTANCE_ID_CAPACITY).collect())
    }

    /// Decode a raw command-line argument, replacing invalid UTF-8
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(&String::from_utf8_lossy(bytes))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed trace record for one VM lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    #[serde(rename = "event")]
    phase: LifecyclePhase,
    pid: i32,
    /// Present (possibly empty) for creations only
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<InstanceId>,
}

impl LifecycleEvent {
    pub fn created(pid: i32, instance_id: InstanceId) -> Self {
        Self {
            phase: LifecyclePhase::Created,
            pid,
            instance_id: Some(instance_id),
        }
    }

    pub fn destroyed(pid: i32) -> Self {
        Self {
            phase: LifecyclePhase::Destroyed,
            pid,
            instance_id: None,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn instance_id(&self) -> Option<&InstanceId> {
        self.instance_id.as_ref()
    }
}

/// Custom error types for monitoring operations
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Note: bounds must match POLLING_INTERVAL_MIN/MAX in constants.rs
    #[error("Invalid polling interval: {0}. Must be between 0.1 and 300.0 seconds")]
    InvalidInterval(f64),
    #[error("Failed to create notification channel: {0}")]
    SourceSetup(nix::Error),
    #[error("Failed to receive notification: {0}")]
    SourceReceive(nix::Error),
}

/// Errors raised while delivering a record to a trace sink
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Failed to serialize trace record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write trace record: {0}")]
    Write(#[from] std::io::Error),
}
