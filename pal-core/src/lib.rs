//! Three-phase timeline scheduler for a multi-channel, multi-die NAND flash
//! subsystem (spec §1).
//!
//! Given a stream of [`Command`]s targeting physical page numbers, this
//! crate assigns each one three contiguous busy intervals — DMA0, MEM, DMA1
//! — on its channel and die, while honoring the constraint that a resource
//! executes only one operation at a time, and tracks the resulting
//! per-resource and per-operation utilization. Configuration parsing,
//! per-technology latency tables and statistics aggregation beyond what the
//! scheduler itself maintains are deliberately out of scope; see
//! [`Latency`] and [`StatisticsSink`] for the collaborator traits this
//! crate depends on instead.

mod address;
mod busy_timeline;
mod command;
mod error;
mod free_index;
mod latency;
mod merged_timeline;
mod op_timeline;
mod parameter;
mod resource;
mod scheduler;
mod slot;
mod stats;

pub use address::{AddressLayout, Cpdpbp, MisalignStripe, BLOCK, CHANNEL, DIE, PAGE, PLANE, WAY};
pub use command::{Command, ConflictKind, ConflictReport, Operation};
pub use error::{Result, SchedulerError, VerificationFailure};
pub use latency::{Latency, Phase};
pub use parameter::Parameter;
pub use scheduler::Scheduler;
pub use slot::{ResourceId, TimeSlot};
pub use stats::{NullStatisticsSink, PhaseLatencies, StatisticsSink};

#[cfg(test)]
mod tests {
    use super::*;

    fn single_channel_single_die_layout() -> AddressLayout {
        AddressLayout {
            sizes: [1, 1, 1, 1, 4, 4],
            permutation: [CHANNEL as u8, WAY as u8, DIE as u8, PLANE as u8, BLOCK as u8, PAGE as u8],
            misalign: None,
        }
    }

    fn single_channel_single_die_parameter() -> Parameter {
        Parameter {
            channel: 1,
            way: 1,
            die: 1,
            plane: 1,
            block: 4,
            page: 4,
            page_size: 4096,
            super_page_size: 4096,
        }
    }

    struct FixedLatency {
        dma0: u64,
        mem: u64,
        dma1: u64,
    }

    impl Latency for FixedLatency {
        fn get_latency(&self, _page_index: u64, _operation: Operation, phase: Phase) -> u64 {
            match phase {
                Phase::Dma0 => self.dma0,
                Phase::Mem => self.mem,
                Phase::Dma1 => self.dma1,
            }
        }
    }

    fn slc_scheduler() -> Scheduler {
        let latency = FixedLatency { dma0: 1000, mem: 100_000, dma1: 1000 };
        Scheduler::new(
            single_channel_single_die_parameter(),
            single_channel_single_die_layout(),
            Box::new(latency),
        )
        .unwrap()
    }

    #[test]
    fn scenario_1_single_read() {
        let mut scheduler = slc_scheduler();
        let command = scheduler
            .submit(Command::new(0, Operation::Read, 0, false))
            .unwrap();
        assert_eq!(command.start_tick, 0);
        assert_eq!(command.finish_tick, 101_999);
    }

    #[test]
    fn scenario_2_back_to_back_reads_queue_on_the_die() {
        let mut scheduler = slc_scheduler();
        let first = scheduler
            .submit(Command::new(0, Operation::Read, 0, false))
            .unwrap();
        let second = scheduler
            .submit(Command::new(1, Operation::Read, 0, false))
            .unwrap();
        assert_eq!((first.start_tick, first.finish_tick), (0, 101_999));
        assert_eq!((second.start_tick, second.finish_tick), (102_000, 203_999));
    }

    #[test]
    fn scenario_3_later_arrival_still_queues_after_the_first() {
        let mut scheduler = slc_scheduler();
        let first = scheduler
            .submit(Command::new(0, Operation::Read, 0, false))
            .unwrap();
        let second = scheduler
            .submit(Command::new(1, Operation::Read, 50_000, false))
            .unwrap();
        assert_eq!((first.start_tick, first.finish_tick), (0, 101_999));
        assert_eq!((second.start_tick, second.finish_tick), (102_000, 203_999));
    }

    #[test]
    fn scenario_4_erase_expands_to_one_sub_command_per_page() {
        let mut scheduler = slc_scheduler();
        let command = scheduler
            .submit(Command::new(0, Operation::Erase, 0, false))
            .unwrap();
        let erase_page_span = 1000 + 100_000 + 1000;
        assert!(command.finish_tick >= 3 * erase_page_span);
    }

    #[test]
    fn scenario_6_merge_snapshot_is_invoked_exactly_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct CountingSink(Rc<RefCell<u32>>);
        impl StatisticsSink for CountingSink {
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
            fn merge_snapshot(&mut self) {
                *self.0.borrow_mut() += 1;
            }
        }

        let count = Rc::new(RefCell::new(0));
        let mut scheduler = slc_scheduler().with_statistics_sink(Box::new(CountingSink(count.clone())));
        scheduler
            .submit(Command::new(0, Operation::Read, 0, false))
            .unwrap();
        scheduler
            .submit(Command::new(1, Operation::Write, 0, true))
            .unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn invalid_ppn_is_rejected() {
        let mut scheduler = slc_scheduler();
        let result = scheduler.submit(Command::new(1_000_000, Operation::Read, 0, false));
        assert!(matches!(result, Err(SchedulerError::InvalidPpn { .. })));
    }

    #[test]
    fn busy_timelines_stay_verifiable_after_several_commands() {
        let mut scheduler = slc_scheduler();
        for ppn in 0..3 {
            scheduler
                .submit(Command::new(ppn, Operation::Read, ppn * 10, false))
                .unwrap();
        }
        assert!(scheduler.verify().is_ok());
    }
}
