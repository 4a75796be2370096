//! A concrete `StatisticsSink` (spec §6 "Statistics contract") that
//! accumulates the figures a command-line driver wants to print: per-die
//! command counts, per-operation conflict counts and the queueing delay
//! they cost, and a running count of merge-snapshot invocations.
//!
//! `pal-core` itself aggregates no more than its own per-resource/
//! per-operation busy counters (spec §1); this is the "statistics
//! aggregation beyond what the scheduler itself maintains" the spec calls
//! out as an external collaborator's job.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use pal_core::{Command, ConflictKind, ConflictReport, Cpdpbp, PhaseLatencies, StatisticsSink};

/// Running totals for one die.
#[derive(Debug, Default, Clone, Copy)]
struct DieTotals {
    commands: u64,
    dma0_ticks: u64,
    mem_ticks: u64,
    dma1_ticks: u64,
}

/// Accumulates statistics across a run, printable as a human-readable
/// report.
#[derive(Debug, Default)]
pub struct Report {
    last_tick: u64,
    per_die: BTreeMap<u32, DieTotals>,
    conflicts: [u64; 3],
    total_queueing_delay: u64,
    commands_with_conflict: u64,
    merge_snapshots: u64,
    commands_seen: u64,
}

impl StatisticsSink for Report {
    fn update_last_tick(&mut self, tick: u64) {
        self.last_tick = self.last_tick.max(tick);
    }

    fn add_latency(
        &mut self,
        _command: &Command,
        _cpdpbp: &Cpdpbp,
        die_index: u32,
        latencies: PhaseLatencies,
        conflict: Option<ConflictReport>,
    ) {
        self.commands_seen += 1;
        let totals = self.per_die.entry(die_index).or_default();
        totals.commands += 1;
        totals.dma0_ticks += latencies.dma0;
        totals.mem_ticks += latencies.mem;
        totals.dma1_ticks += latencies.dma1;

        if let Some(report) = conflict {
            if !report.kind.is_none() {
                self.commands_with_conflict += 1;
                self.total_queueing_delay += report.queueing_delay;
                for (i, kind) in [ConflictKind::DMA0, ConflictKind::MEM, ConflictKind::DMA1]
                    .into_iter()
                    .enumerate()
                {
                    if report.kind.contains(kind) {
                        self.conflicts[i] += 1;
                    }
                }
            }
        }
    }

    fn merge_snapshot(&mut self) {
        self.merge_snapshots += 1;
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "commands scheduled : {}", self.commands_seen)?;
        writeln!(f, "last completion tick: {}", self.last_tick)?;
        writeln!(f, "merge snapshots     : {}", self.merge_snapshots)?;
        writeln!(
            f,
            "commands with conflict: {} (DMA0={} MEM={} DMA1={}), total queueing delay {}",
            self.commands_with_conflict,
            self.conflicts[0],
            self.conflicts[1],
            self.conflicts[2],
            self.total_queueing_delay
        )?;
        writeln!(f, "per-die busy ticks:")?;
        for (die, totals) in &self.per_die {
            writeln!(
                f,
                "  die {die}: {} commands, dma0={} mem={} dma1={}",
                totals.commands, totals.dma0_ticks, totals.mem_ticks, totals.dma1_ticks
            )?;
        }
        Ok(())
    }
}

/// A [`Report`] behind an `Rc<RefCell<_>>`, so a caller can hand a
/// `Box<dyn StatisticsSink>` to `Scheduler::with_statistics_sink` while
/// keeping a handle to read the totals back out afterwards — the same
/// pattern the core crate's own `scenario_6` test uses for its counting
/// sink.
#[derive(Debug, Clone, Default)]
pub struct SharedReport(Rc<RefCell<Report>>);

impl SharedReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the inner handle; reading it after the scheduler has
    /// finished with the boxed sink observes every recorded event.
    pub fn handle(&self) -> Rc<RefCell<Report>> {
        self.0.clone()
    }
}

impl StatisticsSink for SharedReport {
    fn update_last_tick(&mut self, tick: u64) {
        self.0.borrow_mut().update_last_tick(tick);
    }

    fn add_latency(
        &mut self,
        command: &Command,
        cpdpbp: &Cpdpbp,
        die_index: u32,
        latencies: PhaseLatencies,
        conflict: Option<ConflictReport>,
    ) {
        self.0.borrow_mut().add_latency(command, cpdpbp, die_index, latencies, conflict);
    }

    fn merge_snapshot(&mut self) {
        self.0.borrow_mut().merge_snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_core::Operation;

    #[test]
    fn accumulates_per_die_totals_and_conflicts() {
        let mut report = Report::default();
        let command = Command::new(0, Operation::Read, 0, false);
        let cpdpbp = Cpdpbp::default();
        report.add_latency(
            &command,
            &cpdpbp,
            3,
            PhaseLatencies { dma0: 10, mem: 100, dma1: 10 },
            Some(ConflictReport { kind: ConflictKind::MEM, queueing_delay: 42 }),
        );
        report.merge_snapshot();

        assert_eq!(report.commands_with_conflict, 1);
        assert_eq!(report.total_queueing_delay, 42);
        assert_eq!(report.conflicts[1], 1);
        assert_eq!(report.merge_snapshots, 1);
        assert_eq!(report.per_die[&3].mem_ticks, 100);
    }
}
