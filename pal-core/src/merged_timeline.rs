//! The whole-device union of every MEM interval ever committed (spec §4.4).

use std::collections::BTreeMap;

/// An ascending, pairwise-disjoint union of `[start, end]` spans.
///
/// original_source/PAL2.cc builds this with an intrusive linked list,
/// walking it from the head to find the insertion point on every call. A
/// `BTreeMap` keyed by start tick gives the same four merge cases (§4.4)
/// with `range` queries instead of manual prev/next pointer surgery.
#[derive(Debug, Default, Clone)]
pub struct MergedTimeline {
    slots: BTreeMap<u64, u64>,
}

impl MergedTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `[s, e]`, joining it with any overlapping or touching slot
    /// and removing slots it subsumes.
    pub fn insert(&mut self, s: u64, e: u64) {
        let mut new_start = s;
        let mut new_end = e;

        // Any slot starting at or before `new_start` that reaches into or
        // past it absorbs the left edge.
        if let Some((&start, &end)) = self.slots.range(..=new_start).next_back() {
            if end >= new_start {
                new_start = start;
                new_end = new_end.max(end);
            }
        }

        // Every slot whose start falls within [new_start, new_end] is
        // subsumed; the rightmost one may extend past `new_end`.
        let absorbed: Vec<u64> = self
            .slots
            .range(new_start..=new_end)
            .map(|(&start, _)| start)
            .collect();
        for start in absorbed {
            if let Some(end) = self.slots.remove(&start) {
                new_end = new_end.max(end);
            }
        }

        self.slots.insert(new_start, new_end);
    }

    /// Total length of the union, in ticks.
    pub fn total_length(&self) -> u64 {
        self.slots.iter().map(|(&s, &e)| e - s + 1).sum()
    }

    /// Drops every slot whose end precedes `current_tick`, truncating a
    /// slot that straddles `current_tick` instead of dropping it whole, and
    /// returns the number of ticks dropped.
    pub fn flush_before(&mut self, current_tick: u64) -> u64 {
        let mut dropped = 0;
        let straddling: Vec<(u64, u64)> = self
            .slots
            .iter()
            .filter(|&(&start, &end)| start < current_tick && end >= current_tick)
            .map(|(&s, &e)| (s, e))
            .collect();
        self.slots.retain(|&start, &mut end| {
            if end < current_tick {
                dropped += end - start + 1;
                false
            } else {
                true
            }
        });
        for (start, end) in straddling {
            dropped += current_tick - start;
            self.slots.remove(&start);
            self.slots.insert(current_tick, end);
        }
        dropped
    }

    /// Non-destructive union-busy-time as of `current_tick`: ticks covered
    /// by fully past slots plus the covered portion of a straddling slot.
    pub fn busy_time_before(&self, current_tick: u64) -> u64 {
        self.slots
            .iter()
            .map(|(&start, &end)| {
                if end < current_tick {
                    end - start + 1
                } else if start < current_tick {
                    current_tick - start
                } else {
                    0
                }
            })
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.slots.iter().map(|(&s, &e)| (s, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_inserts_stay_separate() {
        let mut m = MergedTimeline::new();
        m.insert(0, 9);
        m.insert(20, 29);
        assert_eq!(m.iter().count(), 2);
        assert_eq!(m.total_length(), 20);
    }

    #[test]
    fn overlapping_insert_merges() {
        let mut m = MergedTimeline::new();
        m.insert(0, 9);
        m.insert(5, 19);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(0, 19)]);
    }

    #[test]
    fn insert_subsumes_intermediate_slots() {
        let mut m = MergedTimeline::new();
        m.insert(0, 9);
        m.insert(20, 29);
        m.insert(40, 49);
        m.insert(0, 49);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(0, 49)]);
    }

    #[test]
    fn insert_inside_existing_slot_is_noop() {
        let mut m = MergedTimeline::new();
        m.insert(0, 99);
        m.insert(10, 20);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(0, 99)]);
    }

    #[test]
    fn busy_time_before_truncates_straddling_slot() {
        let mut m = MergedTimeline::new();
        m.insert(0, 99);
        assert_eq!(m.busy_time_before(50), 50);
        assert_eq!(m.busy_time_before(200), 100);
    }

    #[test]
    fn flush_before_truncates_and_reports_dropped_ticks() {
        let mut m = MergedTimeline::new();
        m.insert(0, 99);
        let dropped = m.flush_before(50);
        assert_eq!(dropped, 50);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![(50, 99)]);
    }
}
