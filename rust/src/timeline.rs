//! Per-day resource occupancy with sorted, non-overlapping busy intervals.

use rustc_hash::FxHashMap;

use crate::problem::Resource;

/// Tracks busy minutes for one resource on one day.
///
/// Intervals are half-open `[start, end)` in minutes since midnight. Maintains
/// the invariant that `busy` is sorted by start and contains no overlapping or
/// touching intervals, so lookups are a binary search.
#[derive(Clone, Debug, Default)]
pub struct ResourceTimeline {
    busy: Vec<(u32, u32)>,
}

impl ResourceTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy intervals, sorted and merged.
    pub fn busy(&self) -> &[(u32, u32)] {
        &self.busy
    }

    /// Mark `[start, end)` busy, merging with existing intervals it overlaps or touches.
    pub fn reserve(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        // Ends are sorted too, so both bounds are binary searches
        let first = self.busy.partition_point(|&(_, e)| e < start);
        let last = self.busy.partition_point(|&(s, _)| s <= end);
        if first == last {
            self.busy.insert(first, (start, end));
            return;
        }
        let merged = (start.min(self.busy[first].0), end.max(self.busy[last - 1].1));
        self.busy.splice(first..last, [merged]);
    }

    /// Earliest start `>= from` at which `[start, start + duration)` is free.
    pub fn next_free(&self, from: u32, duration: u32) -> u32 {
        let mut candidate = from;
        // Skip intervals that end at or before the candidate
        let mut idx = self.busy.partition_point(|(_, end)| *end <= candidate);

        while idx < self.busy.len() {
            let (busy_start, busy_end) = self.busy[idx];
            if candidate + duration <= busy_start {
                return candidate;
            }
            candidate = candidate.max(busy_end);
            idx += 1;
        }

        candidate
    }

    /// Check if `[start, end)` does not touch any busy minute.
    pub fn is_free(&self, start: u32, end: u32) -> bool {
        let idx = self.busy.partition_point(|(_, e)| *e <= start);
        match self.busy.get(idx) {
            Some((busy_start, _)) => *busy_start >= end,
            None => true,
        }
    }
}

/// Occupancy of every resource used on one shooting day.
#[derive(Clone, Debug, Default)]
pub struct DayBook {
    timelines: FxHashMap<Resource, ResourceTimeline>,
}

impl DayBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest start inside `[open, close]` where all `resources` are free for `duration`.
    ///
    /// Returns `None` when no such slot exists before `close`.
    pub fn earliest_slot(
        &self,
        resources: &[Resource],
        open: u32,
        close: u32,
        duration: u32,
    ) -> Option<u32> {
        let mut candidate = open;
        loop {
            if candidate + duration > close {
                return None;
            }
            let mut moved = false;
            for resource in resources {
                if let Some(timeline) = self.timelines.get(resource) {
                    let next = timeline.next_free(candidate, duration);
                    if next > candidate {
                        candidate = next;
                        moved = true;
                    }
                }
            }
            if !moved {
                return Some(candidate);
            }
        }
    }

    /// Mark `[start, end)` busy for every resource in `resources`.
    pub fn reserve(&mut self, resources: &[Resource], start: u32, end: u32) {
        for resource in resources {
            self.timelines
                .entry(*resource)
                .or_default()
                .reserve(start, end);
        }
    }

    /// Committed minutes of the busiest resource among `resources`.
    pub fn load(&self, resources: &[Resource]) -> u32 {
        resources
            .iter()
            .filter_map(|r| self.timelines.get(r))
            .map(|t| t.busy.iter().map(|(s, e)| e - s).sum::<u32>())
            .max()
            .unwrap_or(0)
    }
}
