//! Classification of raw hotplug notifications into VM lifecycle transitions

use crate::constants::{
    KVM_EVENT_CREATE, KVM_EVENT_DESTROY, KVM_NODE, PROP_EVENT, PROP_PID, UNKNOWN_PID,
};
use crate::models::{LifecyclePhase, RawNotification};
use std::collections::BTreeMap;

/// A notification recognised as a monitored-device transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub phase: LifecyclePhase,
    /// Originating process, or `UNKNOWN_PID`
    pub pid: i32,
}

/// Decides which notifications concern the monitored device node
#[derive(Debug, Clone)]
pub struct EventClassifier {
    device_node: String,
}

impl EventClassifier {
    pub fn new(device_node: impl Into<String>) -> Self {
        Self {
            device_node: device_node.into(),
        }
    }

    pub fn device_node(&self) -> &str {
        &self.device_node
    }

    /// Classify a notification by device node and properties.
    ///
    /// Returns `None` for other device nodes and for `EVENT` values other
    /// than `create`/`destroy`, including a missing `EVENT`.
    pub fn classify(
        &self,
        devnode: Option<&str>,
        properties: &BTreeMap<String, String>,
    ) -> Option<Classification> {
        if devnode != Some(self.device_node.as_str()) {
            return None;
        }

        let phase = match properties.get(PROP_EVENT).map(String::as_str) {
            Some(KVM_EVENT_CREATE) => LifecyclePhase::Created,
            Some(KVM_EVENT_DESTROY) => LifecyclePhase::Destroyed,
            _ => return None,
        };

        let pid = match properties.get(PROP_PID) {
            Some(value) => {
                let pid = parse_pid(value);
                if pid == UNKNOWN_PID {
                    log::debug!("Malformed PID property {:?}, reporting unknown pid", value);
                }
                pid
            }
            None => UNKNOWN_PID,
        };

        Some(Classification { phase, pid })
    }

    pub fn classify_notification(&self, notification: &RawNotification) -> Option<Classification> {
        self.classify(notification.devnode(), notification.properties())
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(KVM_NODE)
    }
}

/// Parse a pid with automatic base detection.
///
/// `0x`/`0X` selects hexadecimal, a leading `0` octal, anything else
/// decimal. The whole value must parse and fit an `i32`; otherwise the
/// result is `UNKNOWN_PID`.
pub fn parse_pid(value: &str) -> i32 {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (digits, radix) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (hex, 16)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (&unsigned[1..], 8)
    } else {
        (unsigned, 10)
    };

    // from_str_radix accepts its own sign prefix, which must not follow ours
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return UNKNOWN_PID;
    }

    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(|pid| i32::try_from(pid).ok())
        .unwrap_or(UNKNOWN_PID)
}
