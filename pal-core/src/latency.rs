//! The `Latency` collaborator contract (spec §6 "Inputs to construction").
//!
//! The core deliberately does not own a per-technology latency table (§1);
//! it only depends on this trait. `pal-latency` supplies a concrete SLC/MLC/TLC
//! implementation.

use crate::command::Operation;

/// One of the three phases a command passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Dma0,
    Mem,
    Dma1,
}

/// Supplies phase durations, in ticks, for a given page and operation.
pub trait Latency {
    /// Ticks `page_index`'s `operation` spends in `phase`. A return of `0`
    /// is not an error on its own; callers substitute a minimum of one tick
    /// and log it (spec §7 "LatencyZero").
    fn get_latency(&self, page_index: u64, operation: Operation, phase: Phase) -> u64;
}

/// Looks up `phase`'s duration for `operation` at `page_index`, substituting
/// and logging a minimum of one tick if the collaborator returns zero (spec
/// §7 "LatencyZero").
pub(crate) fn latency_or_min(
    latency: &dyn Latency,
    page_index: u64,
    operation: Operation,
    phase: Phase,
) -> u64 {
    let ticks = latency.get_latency(page_index, operation, phase);
    if ticks == 0 {
        log::warn!(
            "Latency collaborator returned 0 ticks for page {page_index} operation {operation:?} phase {phase:?}; substituting 1"
        );
        1
    } else {
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ZeroLatency;
    impl Latency for ZeroLatency {
        fn get_latency(&self, _page_index: u64, _operation: Operation, _phase: Phase) -> u64 {
            0
        }
    }

    #[test]
    fn zero_latency_is_substituted_with_one_tick() {
        let latency = ZeroLatency;
        assert_eq!(latency_or_min(&latency, 0, Operation::Read, Phase::Dma0), 1);
    }
}
