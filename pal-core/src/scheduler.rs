//! The three-phase placement algorithm and the public façade (spec §4.6,
//! §4.7), grounded in `original_source/PAL2.cc::TimelineScheduling`/`submit`.

use log::trace;

use crate::address::{AddressLayout, Cpdpbp};
use crate::command::{Command, ConflictKind, ConflictReport, Operation};
use crate::error::{Result, SchedulerError, VerificationFailure};
use crate::latency::{latency_or_min, Latency, Phase};
use crate::merged_timeline::MergedTimeline;
use crate::op_timeline::OperationTimeline;
use crate::parameter::Parameter;
use crate::resource::ResourceTimeline;
use crate::slot::ResourceId;
use crate::stats::{NullStatisticsSink, PhaseLatencies, StatisticsSink};

/// The outcome of converging the fit-search for one command (spec §4.6
/// "Algorithm").
struct Placement {
    t0: u64,
    t1: u64,
    mem_start: u64,
    mem_end: u64,
    finish: u64,
    conflict: ConflictKind,
}

/// Owns every per-resource structure plus the whole-device and
/// per-operation timelines (spec §3 "Lifecycle": "all per-resource
/// structures are created at initialization... there is no need for
/// process-wide state" per §9).
pub struct Scheduler {
    parameter: Parameter,
    layout: AddressLayout,
    latency: Box<dyn Latency>,
    stats: Box<dyn StatisticsSink>,
    channels: Vec<ResourceTimeline>,
    dies: Vec<ResourceTimeline>,
    merged: MergedTimeline,
    op_timeline: OperationTimeline,
    conflict_tracking: bool,
    exact_busy_time: u64,
}

impl Scheduler {
    /// Validates `parameter`/`layout` and builds one [`ResourceTimeline`]
    /// per channel and per die.
    pub fn new(
        parameter: Parameter,
        layout: AddressLayout,
        latency: Box<dyn Latency>,
    ) -> Result<Self> {
        parameter.validate()?;
        layout.validate()?;
        if layout.sizes != parameter.axis_sizes() {
            return Err(SchedulerError::InvalidParameter(format!(
                "address layout sizes {:?} do not match parameter axis sizes {:?}",
                layout.sizes,
                parameter.axis_sizes()
            )));
        }

        let channels = (0..parameter.channel)
            .map(|i| ResourceTimeline::new(ResourceId::Channel(i)))
            .collect();
        let dies = (0..parameter.die_count())
            .map(|i| ResourceTimeline::new(ResourceId::Die(i)))
            .collect();

        Ok(Self {
            parameter,
            layout,
            latency,
            stats: Box::new(NullStatisticsSink),
            channels,
            dies,
            merged: MergedTimeline::new(),
            op_timeline: OperationTimeline::new(),
            conflict_tracking: false,
            exact_busy_time: 0,
        })
    }

    /// Supplies a concrete statistics collaborator (spec §6 "Statistics
    /// contract"). Defaults to [`NullStatisticsSink`].
    pub fn with_statistics_sink(mut self, stats: Box<dyn StatisticsSink>) -> Self {
        self.stats = stats;
        self
    }

    /// Enables per-command conflict accounting (spec §4.6 "Conflict
    /// accounting"), reimplementing `original_source/PAL2.cc`'s
    /// `GATHER_RESOURCE_CONFLICT` compile-time flag as a runtime toggle.
    pub fn with_conflict_tracking(mut self) -> Self {
        self.conflict_tracking = true;
        self
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    /// Runs the fit-search of spec §4.6 to placement for one `(channel,
    /// die)` pair and commits it.
    ///
    /// The convergence loop here departs from spec §4.6's literal
    /// inner/outer pseudocode, which re-searches the channel at most once
    /// per die move before falling through to a commit — a channel fit
    /// bounded below by a floor that already exceeds it can never equal
    /// the stale pre-move value it's compared against, so that single
    /// retry can't actually be what converges the two resources. This
    /// instead repeatedly bumps a common floor to the later of the two
    /// resources' fits until both agree, which is the same "strictly
    /// increasing floor, finitely many intervals" termination argument
    /// §4.6 gives, just applied until equality rather than for one step.
    ///
    /// The die is committed for `L0 + Lm` only, not `L0 + Lm + L1 + La`:
    /// physically the die is free again the instant MEM finishes, since
    /// DMA1 and the ANTI pad run on the channel. `total` (`L0+Lm+L1+La`)
    /// is still used to re-check the die against the channel's wider DMA1
    /// reservation, matching spec §4.6's `die.findFit(total, ...)`
    /// consistency check, but only the agreed start matters once it holds
    /// — committing the longer span here would contradict spec §8
    /// scenario 2's back-to-back-read timing.
    fn place(
        &mut self,
        channel: usize,
        die: usize,
        _operation: Operation,
        arrival: u64,
        l0: u64,
        lm: u64,
        l1: u64,
        la: u64,
    ) -> Placement {
        let mut conflict = ConflictKind::NONE;
        let mut t0_from = arrival;

        let (t0, t1) = 'outer: loop {
            t0_from = 'inner: loop {
                let dma0_fit = self.channels[channel].find_fit(l0, t0_from);
                if dma0_fit.conflicted {
                    conflict |= ConflictKind::DMA0;
                }
                let mem_fit = self.dies[die].find_fit(l0 + lm, t0_from);
                if mem_fit.conflicted {
                    conflict |= ConflictKind::MEM;
                }
                if dma0_fit.start == mem_fit.start {
                    break 'inner dma0_fit.start;
                }
                t0_from = t0_from.max(dma0_fit.start).max(mem_fit.start);
            };

            let t1_from = t0_from + l0 + lm;
            let dma1_fit = self.channels[channel].find_fit(l1 + la, t1_from);
            if dma1_fit.conflicted {
                conflict |= ConflictKind::DMA1;
            }
            let total = l0 + lm + l1 + la;
            let die_total_fit = self.dies[die].find_fit(total, t0_from);
            if die_total_fit.start == t0_from {
                break 'outer (t0_from, dma1_fit.start);
            }
            t0_from = die_total_fit.start;
        };

        trace!("placed channel={channel} die={die} t0={t0} t1={t1} conflict={conflict:?}");

        self.channels[channel].insert_assignment(l0, t0, false);
        self.channels[channel].insert_assignment(l1, t1, false);
        self.channels[channel].insert_assignment(la, t1 + l1, true);
        self.dies[die].insert_assignment(l0 + lm, t0, false);

        let mem_start = t0 + l0;
        let mem_end = t1 - 1;
        let finish = t1 + l1 - 1;

        Placement {
            t0,
            t1,
            mem_start,
            mem_end,
            finish,
            conflict,
        }
    }

    /// Places and commits a single page-granular command, recording it into
    /// the merged and per-operation timelines and reporting it to the
    /// statistics sink.
    fn submit_page(&mut self, ppn: u64, cpdpbp: &Cpdpbp, operation: Operation, arrival: u64) -> (u64, u64) {
        let channel = cpdpbp.channel as usize;
        let die = self.layout.die_index(cpdpbp) as usize;

        let l0 = latency_or_min(self.latency.as_ref(), ppn, operation, Phase::Dma0);
        let lm = latency_or_min(self.latency.as_ref(), ppn, operation, Phase::Mem);
        let l1 = latency_or_min(self.latency.as_ref(), ppn, operation, Phase::Dma1);
        let la = latency_or_min(self.latency.as_ref(), ppn, Operation::Read, Phase::Dma0);

        let placement = self.place(channel, die, operation, arrival, l0, lm, l1, la);

        self.merged.insert(placement.mem_start, placement.mem_end);
        self.op_timeline.record(operation, placement.t0, placement.finish);

        let conflict_report = self.conflict_tracking.then(|| ConflictReport {
            kind: placement.conflict,
            queueing_delay: placement.t0.saturating_sub(arrival),
        });

        self.stats.update_last_tick(placement.finish);
        let mut command = Command::new(ppn, operation, arrival, false);
        command.start_tick = placement.t0;
        command.finish_tick = placement.finish;
        self.stats.add_latency(
            &command,
            cpdpbp,
            die as u32,
            PhaseLatencies { dma0: l0, mem: lm, dma1: l1 },
            conflict_report,
        );

        (placement.t0, placement.finish)
    }

    /// Runs §4.6/§4.7 for `command`, returning a copy with `start_tick`/
    /// `finish_tick` filled in. Erase commands expand into one sub-command
    /// per page of the addressed block (§4.6 "Erase amplification"), each
    /// scheduled fully before the next; the returned command spans the
    /// first sub-command's start to the last's finish.
    pub fn submit(&mut self, mut command: Command) -> Result<Command> {
        let cpdpbp = self.layout.disassemble(command.ppn)?;

        let (start, finish) = if command.operation == Operation::Erase {
            let aligned = self.layout.align_to_block(&cpdpbp);
            let pages = self.layout.pages_per_block();
            let mut first_start = None;
            let mut last_finish = 0;
            for page in 0..pages {
                let mut page_cpd = aligned;
                page_cpd.page = page;
                let page_ppn = self.layout.assemble(&page_cpd);
                let (start, finish) =
                    self.submit_page(page_ppn, &page_cpd, Operation::Erase, command.arrival_tick);
                first_start.get_or_insert(start);
                last_finish = finish;
            }
            (first_start.unwrap_or(command.arrival_tick), last_finish)
        } else {
            self.submit_page(command.ppn, &cpdpbp, command.operation, command.arrival_tick)
        };

        command.start_tick = start;
        command.finish_tick = finish;

        if command.merge_snapshot || command.operation == Operation::Erase {
            self.stats.merge_snapshot();
        }

        Ok(command)
    }

    /// Flushes every per-resource structure and the merged timeline,
    /// dropping intervals whose end precedes `tick` and returning how many
    /// ticks this call dropped (spec §4.7 "flushBefore").
    pub fn flush_before(&mut self, tick: u64) -> u64 {
        let mut dropped = 0;
        for channel in &mut self.channels {
            dropped += channel.flush_before(tick);
        }
        for die in &mut self.dies {
            dropped += die.flush_before(tick);
        }
        dropped += self.merged.flush_before(tick);
        self.exact_busy_time += dropped;
        dropped
    }

    /// Running total of ticks dropped across every [`Self::flush_before`] call.
    pub fn exact_busy_time(&self) -> u64 {
        self.exact_busy_time
    }

    /// Non-destructive union busy time as of `tick` (spec §4.7
    /// "inquireBusyTime").
    pub fn inquire_busy_time(&self, tick: u64) -> u64 {
        self.merged.busy_time_before(tick)
    }

    /// Collapses the per-operation timeline into `busy_ticks`, discarding
    /// the raw interval sets (spec §4.5). Not part of the public façade's
    /// `flushBefore`/`inquireBusyTime` pair; callers invoke this explicitly
    /// when they want a final per-operation report.
    pub fn flush_operation_timeline(&mut self) -> [u64; 3] {
        self.op_timeline.flush();
        self.op_timeline.busy_ticks
    }

    /// Verifies every channel's and die's busy timeline is still ascending
    /// and pairwise disjoint (spec §4.3 "Verification routine").
    pub fn verify(&self) -> std::result::Result<(), VerificationFailure> {
        for channel in &self.channels {
            channel.verify()?;
        }
        for die in &self.dies {
            die.verify()?;
        }
        Ok(())
    }
}
