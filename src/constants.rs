//! Global constants for kvm-udev
//!
//! Centralized location for application-wide constants

use std::time::Duration;

/// Device node whose hotplug notifications are traced
pub const KVM_NODE: &str = "/dev/kvm";

/// `EVENT` property value the kvm module sends when a VM is created
pub const KVM_EVENT_CREATE: &str = "create";

/// `EVENT` property value the kvm module sends when a VM is destroyed
pub const KVM_EVENT_DESTROY: &str = "destroy";

/// Command-line flag whose following argument is the VM instance identifier
pub const KVM_UUID_PARAM: &str = "-uuid";

/// Maximum number of characters kept from an instance identifier
pub const INSTANCE_ID_CAPACITY: usize = 36;

/// Pid reported when a notification carries no usable `PID` property
pub const UNKNOWN_PID: i32 = -1;

// Notification property keys
pub const PROP_EVENT: &str = "EVENT";
pub const PROP_PID: &str = "PID";
pub const PROP_DEVNAME: &str = "DEVNAME";
pub const PROP_SUBSYSTEM: &str = "SUBSYSTEM";
pub const PROP_ACTION: &str = "ACTION";
pub const PROP_DEVPATH: &str = "DEVPATH";

/// Subsystem the kvm device registers under
pub const DEFAULT_SUBSYSTEM: &str = "misc";

/// Directory prefixed to relative `DEVNAME` values
pub const DEV_ROOT: &str = "/dev";

/// Root of the per-process metadata pseudo-filesystem
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Reference polling interval
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(250);

/// Note: bounds must match the message of `MonitorError::InvalidInterval`
pub const POLLING_INTERVAL_MIN: f64 = 0.1;
pub const POLLING_INTERVAL_MAX: f64 = 300.0;

/// Trace category (and log target) for VM creation records
pub const CATEGORY_KVM_CREATED: &str = "kvm_udev::kvm_created";

/// Trace category (and log target) for VM destruction records
pub const CATEGORY_KVM_DESTROYED: &str = "kvm_udev::kvm_destroyed";

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kvm-udev/config.toml";

/// Receive buffer for a single netlink datagram
pub const UEVENT_BUFFER_SIZE: usize = 8192;
