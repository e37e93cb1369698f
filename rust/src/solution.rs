//! Candidate solutions: one date-and-time slot per scene.

use std::collections::BTreeMap;

/// Start/end marker for a scene whose time has not been packed yet.
///
/// Sorts after every real start, so a moved scene is packed after whatever
/// already sits on its new date.
pub const PENDING: u32 = u32::MAX;

/// Placement of one scene: day index into the window, `[start, end)` in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub day: u32,
    pub start: u32,
    pub end: u32,
}

impl Slot {
    pub fn pending(day: u32) -> Self {
        Self {
            day,
            start: PENDING,
            end: PENDING,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.start == PENDING || self.end == PENDING
    }
}

/// A full assignment, indexed by scene.
///
/// Solutions are values: the drivers clone and mutate them freely, and the
/// best one found is kept separately from the working copies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    slots: Vec<Slot>,
}

impl Solution {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Solution with every scene on the given day and no times yet.
    pub fn from_days(days: &[u32]) -> Self {
        Self {
            slots: days.iter().map(|&day| Slot::pending(day)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, scene: usize) -> Slot {
        self.slots[scene]
    }

    pub fn day(&self, scene: usize) -> u32 {
        self.slots[scene].day
    }

    pub fn set_slot(&mut self, scene: usize, slot: Slot) {
        self.slots[scene] = slot;
    }

    /// Move a scene to another day; its time is re-packed by the next repair.
    pub fn set_day(&mut self, scene: usize, day: u32) {
        self.slots[scene] = Slot::pending(day);
    }

    pub fn days(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.day).collect()
    }

    /// Distinct days with at least one scene, ascending.
    pub fn shooting_days(&self) -> Vec<u32> {
        let mut days = self.days();
        days.sort_unstable();
        days.dedup();
        days
    }

    /// Scene indices grouped by day, days ascending and scenes in index order.
    pub fn scenes_by_day(&self) -> BTreeMap<u32, Vec<usize>> {
        let mut by_day: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (scene, slot) in self.slots.iter().enumerate() {
            by_day.entry(slot.day).or_default().push(scene);
        }
        by_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_day_marks_pending() {
        let mut solution = Solution::new(vec![
            Slot {
                day: 0,
                start: 540,
                end: 600,
            },
            Slot {
                day: 1,
                start: 540,
                end: 660,
            },
        ]);
        solution.set_day(0, 3);
        assert!(solution.slot(0).is_pending());
        assert_eq!(solution.day(0), 3);
        assert!(!solution.slot(1).is_pending());
    }

    #[test]
    fn test_shooting_days_and_grouping() {
        let solution = Solution::from_days(&[4, 1, 4, 2]);
        assert_eq!(solution.shooting_days(), vec![1, 2, 4]);
        let by_day = solution.scenes_by_day();
        assert_eq!(by_day[&4], vec![0, 2]);
        assert_eq!(by_day.keys().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
    }
}
