//! Per-resource record of committed busy intervals (spec §4.3).

use std::collections::BTreeMap;

use crate::error::VerificationFailure;
use crate::slot::{ResourceId, TimeSlot};

/// An ascending, pairwise-disjoint sequence of committed [`TimeSlot`]s for
/// one resource.
///
/// The teacher's `queuing::queue::ConcurrentQueue` is an intrusive,
/// pointer-linked structure for the same reason spec.md's design notes call
/// out: here we use a `BTreeMap` keyed by start tick instead of hand-rolled
/// `next` pointers, which gives the same "ascending scan" contract without
/// unsafe code.
#[derive(Debug, Default, Clone)]
pub struct BusyTimeline {
    slots: BTreeMap<u64, u64>,
}

impl BusyTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `[start, end]` as busy.
    pub fn insert(&mut self, start: u64, end: u64) {
        self.slots.insert(start, end);
    }

    /// Drops every slot entirely before `current_tick`.
    pub fn flush_before(&mut self, current_tick: u64) -> u64 {
        let mut dropped = 0;
        self.slots.retain(|&start, &mut end| {
            if end < current_tick {
                dropped += end - start + 1;
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Iterates the committed slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.slots.iter().map(|(&start, &end)| TimeSlot { start, end })
    }

    /// Verifies the ascending, pairwise-disjoint invariant, reporting the
    /// resource identifier and the offending pair on violation.
    pub fn verify(&self, resource: ResourceId) -> Result<(), VerificationFailure> {
        let mut iter = self.iter();
        let Some(mut prev) = iter.next() else {
            return Ok(());
        };
        if prev.start > prev.end {
            return Err(VerificationFailure {
                resource,
                prev,
                next: prev,
            });
        }
        for next in iter {
            if prev.end >= next.start || next.start > next.end {
                return Err(VerificationFailure { resource, prev, next });
            }
            prev = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_ascending_disjoint_slots() {
        let mut t = BusyTimeline::new();
        t.insert(0, 9);
        t.insert(10, 19);
        assert!(t.verify(ResourceId::Channel(0)).is_ok());
    }

    #[test]
    fn verify_rejects_overlap() {
        let mut t = BusyTimeline::new();
        t.insert(0, 10);
        t.insert(5, 15);
        assert!(t.verify(ResourceId::Channel(0)).is_err());
    }

    #[test]
    fn flush_before_drops_expired_and_sums_their_length() {
        let mut t = BusyTimeline::new();
        t.insert(0, 9);
        t.insert(100, 109);
        let dropped = t.flush_before(50);
        assert_eq!(dropped, 10);
        assert_eq!(t.iter().count(), 1);
    }
}
