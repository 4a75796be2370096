//! Concrete SLC/MLC/TLC latency tables for `pal-core`'s [`Latency`]
//! collaborator (spec.md §1, §6), grounded in
//! `original_source/fil/pal/LatencySLC.cc`'s per-phase, per-operation
//! lookup shape and `original_source/fil/config.cc`'s per-bit-level
//! `tR`/`tPROG`/`tBERS` timing fields.
//!
//! `pal-core` deliberately does not own a latency table; this crate is the
//! minimal concrete collaborator a runnable workspace needs to drive it.

use pal_core::{Latency, Operation, Phase};

/// NAND cell technology: how many bits each cell stores.
///
/// Only the MEM phase depends on this. `original_source/fil/config.cc`
/// indexes `tR`/`tPROG` by bit level, while DMA timing derives from
/// `dmaSpeed`/`dmaWidth`, which do not vary with `NANDType` — so DMA0/DMA1
/// stay fixed across technologies here and only MEM scales.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Technology {
    #[default]
    Slc,
    Mlc,
    Tlc,
}

impl Technology {
    /// Multiplier applied to the SLC MEM-phase baseline, following the
    /// roughly-doubling growth of `tR`/`tPROG` per additional bit per cell
    /// in `fil/config.cc`'s level-indexed timing arrays.
    fn mem_multiplier(self) -> u64 {
        match self {
            Technology::Slc => 1,
            Technology::Mlc => 2,
            Technology::Tlc => 3,
        }
    }
}

/// Per-phase tick counts for one operation kind.
#[derive(Debug, Clone, Copy)]
struct OperationTiming {
    dma0: u64,
    mem: u64,
    dma1: u64,
}

/// A concrete [`Latency`] collaborator for one NAND technology.
///
/// Mirrors `LatencySLC.cc`'s constructor: every operation's per-phase timing
/// is computed once here, then looked up by [`Latency::get_latency`]
/// without recomputation. The timing does not vary by page index (the
/// source's `GetPageType` always returns `PAGE_LSB` for SLC; MLC/TLC page
/// type does not change these particular phase latencies either).
#[derive(Debug, Clone)]
pub struct NandLatency {
    read: OperationTiming,
    write: OperationTiming,
    erase: OperationTiming,
}

impl NandLatency {
    /// Builds the default table for `technology`.
    pub fn new(technology: Technology) -> Self {
        let m = technology.mem_multiplier();
        Self {
            read: OperationTiming {
                dma0: 1_000,
                mem: 100_000 * m,
                dma1: 1_000,
            },
            write: OperationTiming {
                dma0: 1_000,
                mem: 300_000 * m,
                dma1: 200,
            },
            erase: OperationTiming {
                dma0: 100,
                mem: 3_000_000 * m,
                dma1: 100,
            },
        }
    }

    /// Builds a table from caller-supplied per-operation, per-phase ticks,
    /// bypassing the default technology scaling entirely.
    pub fn custom(
        read: (u64, u64, u64),
        write: (u64, u64, u64),
        erase: (u64, u64, u64),
    ) -> Self {
        let timing = |(dma0, mem, dma1): (u64, u64, u64)| OperationTiming { dma0, mem, dma1 };
        Self {
            read: timing(read),
            write: timing(write),
            erase: timing(erase),
        }
    }

    fn timing(&self, operation: Operation) -> &OperationTiming {
        match operation {
            Operation::Read => &self.read,
            Operation::Write => &self.write,
            Operation::Erase => &self.erase,
        }
    }
}

impl Latency for NandLatency {
    fn get_latency(&self, _page_index: u64, operation: Operation, phase: Phase) -> u64 {
        let timing = self.timing(operation);
        match phase {
            Phase::Dma0 => timing.dma0,
            Phase::Mem => timing.mem,
            Phase::Dma1 => timing.dma1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_phase_scales_with_technology() {
        let slc = NandLatency::new(Technology::Slc);
        let tlc = NandLatency::new(Technology::Tlc);
        assert_eq!(
            slc.get_latency(0, Operation::Read, Phase::Mem) * 3,
            tlc.get_latency(0, Operation::Read, Phase::Mem)
        );
    }

    #[test]
    fn dma_phases_do_not_scale_with_technology() {
        let slc = NandLatency::new(Technology::Slc);
        let mlc = NandLatency::new(Technology::Mlc);
        assert_eq!(
            slc.get_latency(0, Operation::Write, Phase::Dma0),
            mlc.get_latency(0, Operation::Write, Phase::Dma0)
        );
    }

    #[test]
    fn erase_mem_phase_dominates_the_other_operations() {
        let slc = NandLatency::new(Technology::Slc);
        assert!(
            slc.get_latency(0, Operation::Erase, Phase::Mem)
                > slc.get_latency(0, Operation::Write, Phase::Mem)
        );
        assert!(
            slc.get_latency(0, Operation::Write, Phase::Mem)
                > slc.get_latency(0, Operation::Read, Phase::Mem)
        );
    }

    #[test]
    fn custom_table_overrides_the_default_scaling() {
        let custom = NandLatency::custom((1, 2, 3), (4, 5, 6), (7, 8, 9));
        assert_eq!(custom.get_latency(0, Operation::Write, Phase::Mem), 5);
        assert_eq!(custom.get_latency(0, Operation::Erase, Phase::Dma1), 9);
    }
}
