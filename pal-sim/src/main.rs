#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Replays a plain-text NAND command trace through the pal-core timeline
/// scheduler and prints the resulting utilization/conflict report.
#[derive(Parser, Debug)]
#[command(name = "pal-sim", version, about)]
struct Args {
    /// Path to a YAML device configuration (see `pal_sim::config::Config`).
    #[arg(long, short)]
    config: PathBuf,

    /// Path to a plain-text command trace (see `pal_sim::trace`).
    #[arg(long, short)]
    trace: PathBuf,
}

fn main() -> ExitCode {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    std::env::set_var("RUST_LOG", level.clone());
    pretty_env_logger::formatted_builder()
        .parse_filters(&level)
        .format_timestamp_secs()
        .init();

    let args = Args::parse();
    match pal_sim::run(&args.config, &args.trace) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
