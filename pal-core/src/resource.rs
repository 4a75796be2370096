//! A single shared resource (one channel or one die): its free-slot index,
//! busy timeline and `StartPoint` frontier, combined behind the
//! find-fit/commit operations the scheduler actually drives (spec §3
//! "StartPoint", §4.2, §4.3).

use crate::busy_timeline::BusyTimeline;
use crate::error::VerificationFailure;
use crate::free_index::FreeSlotIndex;
use crate::slot::ResourceId;

/// Outcome of [`ResourceTimeline::find_fit`]: always succeeds, because a
/// miss against the free-slot index falls back to the `StartPoint`
/// frontier, which is unconditionally free (spec §4.2 "the caller will
/// fall back to `StartPoint`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceFit {
    pub start: u64,
    pub conflicted: bool,
}

/// One channel's or one die's scheduling state.
#[derive(Debug, Clone)]
pub struct ResourceTimeline {
    id: ResourceId,
    free: FreeSlotIndex,
    busy: BusyTimeline,
    /// The frontier beyond which the resource is unconditionally free;
    /// every free interval ends strictly before this tick (spec §3
    /// "StartPoint").
    start_point: u64,
}

impl ResourceTimeline {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            free: FreeSlotIndex::new(),
            busy: BusyTimeline::new(),
            start_point: 0,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The earliest start `>= earliest_start` of a free interval of length
    /// `>= min_length`, falling back to `StartPoint` on a miss.
    pub fn find_fit(&self, min_length: u64, earliest_start: u64) -> ResourceFit {
        match self.free.find_fit(min_length, earliest_start) {
            Some(fit) => ResourceFit {
                start: fit.start,
                conflicted: fit.conflicted,
            },
            None => ResourceFit {
                start: earliest_start.max(self.start_point),
                conflicted: false,
            },
        }
    }

    /// Commits `[actual_start, actual_start + length - 1]`.
    ///
    /// When `actual_start` lands at or past `StartPoint`, the gap between
    /// the old frontier and `actual_start` is registered as a new free
    /// interval and the frontier advances past this assignment. Otherwise
    /// the free interval containing `actual_start` is split around it
    /// (spec §4.2 "insertAssignment").
    ///
    /// `split` marks a reservation that is immediately reclaimable — the
    /// ANTI anticipatory pad (spec §4.6) — rather than a real commitment:
    /// `original_source/PAL2.cc` only ever passes `split=1` for that pad,
    /// and never records it in its (commented-out) busy-list maintenance
    /// either. So a `split` assignment re-registers its own span as free
    /// and is left out of the [`BusyTimeline`], leaving it free for the
    /// very next command to claim.
    pub fn insert_assignment(&mut self, length: u64, actual_start: u64, split: bool) {
        if actual_start >= self.start_point {
            if actual_start > self.start_point {
                self.free.insert_free(actual_start - self.start_point, self.start_point);
            }
            if split {
                self.free.insert_free(length, actual_start);
            }
            self.start_point = actual_start + length;
        } else {
            let found = self.free.consume(length, actual_start, split);
            debug_assert!(
                found,
                "committed start {actual_start} on {:?} was not covered by StartPoint or a free interval",
                self.id
            );
        }
        if !split {
            self.busy.insert(actual_start, actual_start + length - 1);
        }
    }

    /// Drops free and busy intervals entirely before `current_tick`,
    /// returning the number of busy ticks dropped.
    pub fn flush_before(&mut self, current_tick: u64) -> u64 {
        self.free.flush_before(current_tick);
        self.busy.flush_before(current_tick)
    }

    pub fn verify(&self) -> Result<(), VerificationFailure> {
        self.busy.verify(self.id)
    }
}
