#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use kvm_udev::config::{Configuration, SinkKind};
use kvm_udev::monitor::{
    CmdlineResolver, EventClassifier, LifecycleEmitter, Monitor, NetlinkGroup, UeventSocket,
};
use kvm_udev::trace::{init_logger, JsonSink, LogSink, TraceSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> Result<()> {
    let options = cli::parse_args()?;

    init_logger(options.quiet_mode)?;

    let mut config = Configuration::load(options.config_path.as_deref())?;
    if let Some(interval) = options.interval {
        config.monitor.polling_interval = interval;
    }
    if options.json_output {
        config.trace.sink = SinkKind::Json;
    }
    if options.kernel_events {
        config.monitor.netlink_group = NetlinkGroup::Kernel;
    }

    // Any failure before this point exits non-zero without monitoring
    let source = UeventSocket::open(config.monitor.netlink_group, config.subsystem_filter())
        .context("Cannot listen for device notifications")?;

    // Set up interrupt handling
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone())
        .context("Failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, interrupted.clone())
        .context("Failed to register SIGTERM handler")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_monitor = running.clone();
    std::thread::spawn(move || {
        while !interrupted.load(Ordering::Relaxed) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        running_monitor.store(false, Ordering::SeqCst);
    });

    let phases = config.enabled_phases();
    let sink: Box<dyn TraceSink> = match config.trace.sink {
        SinkKind::Log => Box::new(LogSink::with_phases(phases)),
        SinkKind::Json => Box::new(JsonSink::with_phases(std::io::stdout(), phases)),
    };

    let resolver = CmdlineResolver::new(&config.monitor.proc_root, &config.monitor.instance_flag);
    let mut monitor = Monitor::new(
        source,
        EventClassifier::new(&config.monitor.device_node),
        LifecycleEmitter::new(resolver, sink),
        config.polling_duration(),
    );

    log::info!("kvm-udev started (pid {})", std::process::id());
    monitor.run(&running)?;
    log::info!("Received shutdown signal");

    Ok(())
}
