//! Library half of the `pal-sim` command-line driver: loads a YAML
//! configuration, reads a plain-text command trace, drives `pal-core`'s
//! façade and reports the resulting statistics. `main.rs` only wires up
//! logging and argument parsing around [`run`].

pub mod config;
pub mod report;
pub mod trace;

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use pal_core::Scheduler;
use pal_latency::NandLatency;

use config::Config;
use report::{Report, SharedReport};

/// Loads `config_path`, replays `trace_path` through a fresh [`Scheduler`]
/// and returns the accumulated [`Report`].
pub fn run(config_path: &Path, trace_path: &Path) -> Result<Report> {
    let config_text = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading configuration file {}", config_path.display()))?;
    let config: Config = serde_yaml::from_str(&config_text)
        .with_context(|| format!("parsing configuration file {}", config_path.display()))?;

    let parameter = config.parameter();
    parameter.validate().context("invalid device geometry")?;
    let layout = config.address_layout()?;
    let latency = Box::new(NandLatency::new(config.technology));

    let sink = SharedReport::new();
    let report_handle = sink.handle();

    let mut scheduler =
        Scheduler::new(parameter, layout, latency).context("constructing scheduler")?;
    if config.track_conflicts {
        scheduler = scheduler.with_conflict_tracking();
    }
    let mut scheduler = scheduler.with_statistics_sink(Box::new(sink));

    let commands = trace::read_file(trace_path)?;
    log::info!("replaying {} commands from {}", commands.len(), trace_path.display());
    for command in commands {
        let ppn = command.ppn;
        let placed = scheduler
            .submit(command)
            .with_context(|| format!("scheduling command for ppn {ppn}"))?;
        log::debug!(
            "ppn={} op={:?} arrival={} start={} finish={}",
            placed.ppn,
            placed.operation,
            placed.arrival_tick,
            placed.start_tick,
            placed.finish_tick
        );
    }

    scheduler.verify().context("busy timeline verification failed after replay")?;
    drop(scheduler);

    Rc::try_unwrap(report_handle)
        .map_err(|_| anyhow::anyhow!("statistics sink still shared after scheduler was dropped"))
        .map(|cell| cell.into_inner())
}
