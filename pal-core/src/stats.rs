//! The statistics collaborator contract (spec §6 "Statistics contract").
//!
//! The core does not aggregate histograms, power or throughput itself (§1);
//! it only calls these hooks after every commit and at explicit snapshot
//! points. `pal-sim` supplies a concrete sink.

use crate::address::Cpdpbp;
use crate::command::{Command, ConflictReport};

/// Per-phase latency figures reported for one committed command, handed to
/// [`StatisticsSink::add_latency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseLatencies {
    pub dma0: u64,
    pub mem: u64,
    pub dma1: u64,
}

/// Receives scheduler-driven statistics events. Never constructed by
/// `pal-core` itself — only called through.
pub trait StatisticsSink {
    /// Advances the sink's notion of the latest tick observed.
    fn update_last_tick(&mut self, tick: u64);

    /// Reports one committed command's placement, optionally including its
    /// conflict accounting (spec §4.6 "Conflict accounting").
    fn add_latency(
        &mut self,
        command: &Command,
        cpdpbp: &Cpdpbp,
        die_index: u32,
        latencies: PhaseLatencies,
        conflict: Option<ConflictReport>,
    );

    /// Invoked when a command requests `mergeSnapshot`, or unconditionally
    /// after an erase (spec §4.7 "submit").
    fn merge_snapshot(&mut self);
}

/// A [`StatisticsSink`] that discards every event; the default when no
/// collaborator is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatisticsSink;

impl StatisticsSink for NullStatisticsSink {
    fn update_last_tick(&mut self, _tick: u64) {}

    fn add_latency(
        &mut self,
        _command: &Command,
        _cpdpbp: &Cpdpbp,
        _die_index: u32,
        _latencies: PhaseLatencies,
        _conflict: Option<ConflictReport>,
    ) {
    }

    fn merge_snapshot(&mut self) {}
}
