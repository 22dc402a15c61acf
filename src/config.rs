//! Configuration management
//!
//! Handles TOML configuration parsing, defaults and validation

use crate::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_POLLING_INTERVAL, DEFAULT_PROC_ROOT, DEFAULT_SUBSYSTEM, KVM_NODE,
    KVM_UUID_PARAM, POLLING_INTERVAL_MAX, POLLING_INTERVAL_MIN,
};
use crate::models::{LifecyclePhase, MonitorError};
use crate::monitor::NetlinkGroup;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub monitor: MonitorSettings,
    pub trace: TraceSettings,
}

/// Notification and process metadata settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSettings {
    /// Polling interval in seconds (0.1-300.0)
    pub polling_interval: f64,
    /// Device node whose notifications are traced
    pub device_node: String,
    /// Command-line flag preceding the instance identifier
    pub instance_flag: String,
    /// Netlink group to listen on
    pub netlink_group: NetlinkGroup,
    /// Only accept notifications of this subsystem (empty = all)
    pub subsystem: String,
    /// Root of the per-process metadata filesystem
    pub proc_root: PathBuf,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL.as_secs_f64(),
            device_node: KVM_NODE.to_string(),
            instance_flag: KVM_UUID_PARAM.to_string(),
            netlink_group: NetlinkGroup::default(),
            subsystem: DEFAULT_SUBSYSTEM.to_string(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }
}

/// Where records go and which ones are wanted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceSettings {
    pub sink: SinkKind,
    /// Enabled event names (`kvm_created`, `kvm_destroyed`)
    pub categories: Vec<String>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            categories: vec![
                LifecyclePhase::Created.event_name().to_string(),
                LifecyclePhase::Destroyed.event_name().to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Structured log lines on stderr
    #[default]
    Log,
    /// JSON lines on stdout
    Json,
}

impl Configuration {
    /// Load and validate a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Configuration = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Load an explicit file (which must exist), else the default file if
    /// present, else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Configuration file not found: {}", path.display());
                }
                Self::load_from_file(path)
            }
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::load_from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn default_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    pub fn validate(&self) -> Result<()> {
        validate_interval(self.monitor.polling_interval)?;

        if !self.monitor.device_node.starts_with('/') {
            bail!(
                "device_node must be an absolute path, got {:?}",
                self.monitor.device_node
            );
        }

        if self.monitor.instance_flag.is_empty() {
            bail!("instance_flag must not be empty");
        }

        for category in &self.trace.categories {
            if LifecyclePhase::from_name(category).is_none() {
                bail!(
                    "Unknown trace category {:?} (expected kvm_created or kvm_destroyed)",
                    category
                );
            }
        }

        Ok(())
    }

    pub fn polling_duration(&self) -> Duration {
        Duration::from_secs_f64(self.monitor.polling_interval)
    }

    pub fn subsystem_filter(&self) -> Option<String> {
        if self.monitor.subsystem.is_empty() {
            None
        } else {
            Some(self.monitor.subsystem.clone())
        }
    }

    /// Phases whose records are enabled, in declaration order without duplicates
    pub fn enabled_phases(&self) -> Vec<LifecyclePhase> {
        let mut phases = Vec::new();
        for phase in self.trace.categories.iter().filter_map(|c| LifecyclePhase::from_name(c)) {
            if !phases.contains(&phase) {
                phases.push(phase);
            }
        }
        phases
    }
}

/// Check a polling interval in seconds against the accepted bounds
pub fn validate_interval(seconds: f64) -> Result<(), MonitorError> {
    if !(POLLING_INTERVAL_MIN..=POLLING_INTERVAL_MAX).contains(&seconds) {
        return Err(MonitorError::InvalidInterval(seconds));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();

        assert_eq!(config.polling_duration(), Duration::from_millis(250));
        assert_eq!(config.monitor.device_node, "/dev/kvm");
        assert_eq!(config.monitor.instance_flag, "-uuid");
        assert_eq!(config.monitor.netlink_group, NetlinkGroup::Udev);
        assert_eq!(config.subsystem_filter(), Some("misc".to_string()));
        assert_eq!(config.trace.sink, SinkKind::Log);
        assert_eq!(
            config.enabled_phases(),
            vec![LifecyclePhase::Created, LifecyclePhase::Destroyed]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[monitor]
polling_interval = 1.5
device_node = "/dev/kvm"
instance_flag = "--uuid"
netlink_group = "kernel"
subsystem = ""
proc_root = "/host/proc"

[trace]
sink = "json"
categories = ["kvm_destroyed"]
"#,
        )
        .unwrap();

        let config = Configuration::load_from_file(&path).unwrap();
        assert_eq!(config.polling_duration(), Duration::from_millis(1500));
        assert_eq!(config.monitor.instance_flag, "--uuid");
        assert_eq!(config.monitor.netlink_group, NetlinkGroup::Kernel);
        assert_eq!(config.subsystem_filter(), None);
        assert_eq!(config.monitor.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.trace.sink, SinkKind::Json);
        assert_eq!(config.enabled_phases(), vec![LifecyclePhase::Destroyed]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[trace]\nsink = \"json\"\n").unwrap();

        let config = Configuration::load_from_file(&path).unwrap();
        assert_eq!(config.trace.sink, SinkKind::Json);
        assert_eq!(config.monitor.device_node, "/dev/kvm");
        assert_eq!(config.enabled_phases().len(), 2);
    }

    #[test]
    fn test_interval_bounds() {
        assert!(validate_interval(0.1).is_ok());
        assert!(validate_interval(300.0).is_ok());
        assert!(validate_interval(0.05).is_err());
        assert!(validate_interval(301.0).is_err());
        assert!(validate_interval(f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_interval() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[monitor]\npolling_interval = 0.05\n").unwrap();

        let err = Configuration::load_from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid polling interval"));
    }

    #[test]
    fn test_rejects_unknown_category() {
        let mut config = Configuration::default();
        config.trace.categories.push("kvm_exit".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_relative_device_node_and_empty_flag() {
        let mut config = Configuration::default();
        config.monitor.device_node = "kvm".to_string();
        assert!(config.validate().is_err());

        let mut config = Configuration::default();
        config.monitor.instance_flag.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "[monitor]\npoll = 1.0\n").unwrap();
        assert!(Configuration::load_from_file(&path).is_err());

        fs::write(&path, "[trace]\nsink = \"syslog\"\n").unwrap();
        assert!(Configuration::load_from_file(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = Configuration::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let mut config = Configuration::default();
        config.trace.categories = vec![
            "kvm_created".to_string(),
            "kvm_udev::kvm_created".to_string(),
        ];
        assert_eq!(config.enabled_phases(), vec![LifecyclePhase::Created]);
    }
}
