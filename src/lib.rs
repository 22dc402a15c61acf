//! kvm-udev - KVM virtual machine lifecycle tracing library
//!
//! This library exposes the notification classification, command-line
//! identity resolution and trace sinks used by the `kvm-udev` sensor.

pub mod config;
pub mod constants;
pub mod models;
pub mod monitor;
pub mod trace;
