//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - Configuration file selection
//! - Polling interval override
//! - Trace output selection (log/JSON)
//! - Netlink group selection
//! - Quiet mode, help and version

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kvm_udev::config::validate_interval;
use std::path::PathBuf;

/// Options given on the command line; `None` means "keep the configured value"
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub config_path: Option<PathBuf>,
    pub interval: Option<f64>,
    pub json_output: bool,
    pub kernel_events: bool,
    pub quiet_mode: bool,
}

fn version() -> &'static str {
    concat!(env!("KVM_UDEV_VERSION"), " (", env!("GIT_HASH"), ")")
}

pub fn build_command() -> Command {
    Command::new("kvm-udev")
        .version(version())
        .about("Trace KVM virtual machine creation and destruction")
        .long_about(
            "Passive sensor that listens for udev notifications on /dev/kvm and reports \
             each VM creation (with the QEMU -uuid of the creating process) and destruction.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: /etc/kvm-udev/config.toml if present)"),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Polling interval in seconds (0.1-300.0)"),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Write lifecycle records as JSON lines to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("kernel")
                .short('k')
                .long("kernel")
                .help("Listen to raw kernel uevents instead of the udev daemon")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue),
        )
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliOptions> {
    options_from_matches(&build_command().get_matches())
}

fn options_from_matches(matches: &ArgMatches) -> Result<CliOptions> {
    let interval = matches.get_one::<f64>("interval").copied();
    if let Some(seconds) = interval {
        validate_interval(seconds)?;
    }

    Ok(CliOptions {
        config_path: matches.get_one::<PathBuf>("config").cloned(),
        interval,
        json_output: matches.get_flag("json"),
        kernel_events: matches.get_flag("kernel"),
        quiet_mode: matches.get_flag("quiet"),
    })
}
