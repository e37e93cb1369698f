//! Feasibility repair: removes actor/location double-booking from a solution.
//!
//! Scenes are packed day by day from the day-start anchor. On each day the
//! scenes keep their current relative order (by start time, then priority) and
//! each one takes the earliest slot where all of its resources are free, so
//! scenes sharing a resource end up back to back. A scene that no longer fits
//! before the end of its day is moved to the next day that can take it. A scene
//! that fits nowhere keeps its day and is left overlapping; the evaluator
//! charges for it.

use rustc_hash::FxHashMap;
use std::cmp::Reverse;

use crate::log_debug;
use crate::problem::Problem;
use crate::solution::{Slot, Solution};
use crate::timeline::DayBook;

/// What one repair call changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Scenes moved to another day
    pub relocated: usize,
    /// Scenes that could not be placed without overlap
    pub unresolved: usize,
}

/// Repair `solution` in place.
///
/// One bounded pass: every scene is packed at most once and tries each other
/// day at most once, so the call always terminates.
pub fn repair(problem: &Problem, solution: &mut Solution) -> RepairReport {
    let mut report = RepairReport::default();
    if solution.len() != problem.scene_count() || problem.day_count() == 0 {
        return report;
    }
    let last_day = problem.day_count() as u32 - 1;

    // Out-of-window days and unavailable days go to the nearest usable day
    for scene in 0..solution.len() {
        let day = solution.day(scene);
        if day > last_day {
            solution.set_day(scene, last_day);
        }
        let day = solution.day(scene);
        if !problem.is_available(scene, day) {
            if let Some(nearest) = nearest_feasible_day(problem.feasible_days(scene), day) {
                solution.set_day(scene, nearest);
                report.relocated += 1;
            }
        }
    }

    let mut order: Vec<usize> = (0..solution.len()).collect();
    order.sort_by_key(|&scene| {
        let slot = solution.slot(scene);
        (
            slot.day,
            slot.start,
            Reverse(problem.scene(scene).priority),
            scene,
        )
    });

    let mut books: FxHashMap<u32, DayBook> = FxHashMap::default();
    for scene in order {
        let day = solution.day(scene);
        let data = problem.scene(scene);

        if let Some(slot) = place(problem, &mut books, scene, day) {
            solution.set_slot(scene, slot);
            continue;
        }

        let candidates = problem.candidate_days(scene);
        let pivot = candidates.partition_point(|&c| c <= day);
        let moved = candidates[pivot..]
            .iter()
            .chain(candidates[..pivot].iter())
            .filter(|&&alt| alt != day)
            .find_map(|&alt| place(problem, &mut books, scene, alt));

        match moved {
            Some(slot) => {
                log_debug!(
                    problem.verbosity(),
                    "repair: scene {} moved from day {} to day {}",
                    data.id,
                    day,
                    slot.day
                );
                solution.set_slot(scene, slot);
                report.relocated += 1;
            }
            None => {
                let (open, close) = problem.bounds(scene, day);
                let start = close.saturating_sub(data.duration).max(open);
                let slot = Slot {
                    day,
                    start,
                    end: start + data.duration,
                };
                books
                    .entry(day)
                    .or_default()
                    .reserve(&data.resources, slot.start, slot.end);
                solution.set_slot(scene, slot);
                report.unresolved += 1;
            }
        }
    }

    report
}

/// Earliest conflict-free slot for the scene on `day`, reserved in `books`.
fn place(
    problem: &Problem,
    books: &mut FxHashMap<u32, DayBook>,
    scene: usize,
    day: u32,
) -> Option<Slot> {
    let data = problem.scene(scene);
    let (open, close) = problem.bounds(scene, day);
    let book = books.entry(day).or_default();
    let start = book.earliest_slot(&data.resources, open, close, data.duration)?;
    let end = start + data.duration;
    book.reserve(&data.resources, start, end);
    Some(Slot { day, start, end })
}

/// Closest day in a sorted list, preferring the earlier one on ties.
fn nearest_feasible_day(feasible: &[u32], day: u32) -> Option<u32> {
    feasible
        .iter()
        .copied()
        .min_by_key(|&f| (f.abs_diff(day), f))
}
