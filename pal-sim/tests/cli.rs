//! Drives `pal_sim::run` end to end against a bundled configuration and
//! trace, the way the `pal-sim` binary itself does.

use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn replays_the_bundled_trace_and_reports_every_command() {
    let report = pal_sim::run(&fixture("device.yaml"), &fixture("trace.txt")).unwrap();
    let text = report.to_string();

    // Two reads + one write + a four-page erase = 7 page-granular commands
    // recorded through add_latency.
    assert!(text.contains("commands scheduled : 7"));
    assert!(text.contains("merge snapshots     : 2")); // the flagged write, plus the erase's implicit merge
}

#[test]
fn rejects_a_trace_with_an_out_of_range_ppn() {
    // device.yaml addresses 32 pages (1*1*2*1*4*4); this trace's only
    // command targets ppn 32, the first one out of range.
    let result = pal_sim::run(&fixture("device.yaml"), &fixture("trace_invalid_ppn.txt"));
    let err = result.unwrap_err();
    assert!(err.to_string().contains("ppn 32"), "unexpected error: {err:#}");
}
