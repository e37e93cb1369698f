//! Initial-solution builder.
//!
//! Scenes are grouped by location to keep crews in one place, groups are
//! visited by their most important scene, and each scene takes the earliest
//! slot on or after the current date cursor that its resources allow. The
//! cursor wraps around the window, so the walk is bounded even when there are
//! more scenes than days.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

use crate::log_checks;
use crate::problem::Problem;
use crate::registry::EntityIdx;
use crate::repair::repair;
use crate::solution::{Slot, Solution};
use crate::timeline::DayBook;

/// Deterministic seed solution shared by every strategy.
pub fn build_initial(problem: &Problem) -> Solution {
    let groups = location_groups(problem);
    let order: Vec<usize> = groups.into_iter().flatten().collect();
    construct(problem, &order, 0)
}

/// Randomized variant used to spread a population over the search space.
///
/// Group order and the starting date are drawn from `rng`; within a group
/// scenes keep their priority order.
pub fn build_randomized<R: Rng>(problem: &Problem, rng: &mut R) -> Solution {
    if problem.scene_count() == 0 {
        return Solution::default();
    }
    let mut groups = location_groups(problem);
    groups.shuffle(rng);
    let order: Vec<usize> = groups.into_iter().flatten().collect();
    let cursor = rng.gen_range(0..problem.day_count() as u32);
    construct(problem, &order, cursor)
}

/// Scenes grouped by location, groups ordered by their highest priority.
///
/// Scenes without a location form the last group.
fn location_groups(problem: &Problem) -> Vec<Vec<usize>> {
    let mut by_location: FxHashMap<Option<EntityIdx>, Vec<usize>> = FxHashMap::default();
    for (scene, data) in problem.scenes().iter().enumerate() {
        by_location.entry(data.location).or_default().push(scene);
    }

    let mut groups: Vec<(Option<EntityIdx>, Vec<usize>)> = by_location.into_iter().collect();
    for (_, scenes) in &mut groups {
        scenes.sort_by_key(|&s| (Reverse(problem.scene(s).priority), s));
    }
    groups.sort_by_key(|(location, scenes)| {
        let top = scenes
            .first()
            .map(|&s| problem.scene(s).priority)
            .unwrap_or(0);
        (location.is_none(), Reverse(top), *location)
    });
    groups.into_iter().map(|(_, scenes)| scenes).collect()
}

fn construct(problem: &Problem, order: &[usize], start_day: u32) -> Solution {
    let scene_count = problem.scene_count();
    if scene_count == 0 {
        return Solution::default();
    }
    let day_count = problem.day_count() as u32;
    let mut books: Vec<DayBook> = vec![DayBook::new(); day_count as usize];
    let mut slots: Vec<Slot> = vec![Slot::pending(0); scene_count];
    let mut cursor = start_day.min(day_count - 1);
    let mut fallbacks = 0usize;

    for &scene in order {
        let data = problem.scene(scene);
        let placed = (0..day_count)
            .map(|offset| (cursor + offset) % day_count)
            .filter(|&day| problem.is_available(scene, day))
            .find_map(|day| {
                let (open, close) = problem.bounds(scene, day);
                books[day as usize]
                    .earliest_slot(&data.resources, open, close, data.duration)
                    .map(|start| Slot {
                        day,
                        start,
                        end: start + data.duration,
                    })
            });

        let slot = match placed {
            Some(slot) => {
                cursor = slot.day;
                slot
            }
            None => {
                // Least conflicting day: fewest unavailable resources, then lightest load
                fallbacks += 1;
                let day = (0..day_count)
                    .min_by_key(|&day| {
                        (
                            problem.unavailable_count(scene, day),
                            books[day as usize].load(&data.resources),
                            day,
                        )
                    })
                    .unwrap_or(0);
                let (open, close) = problem.bounds(scene, day);
                let start = close.saturating_sub(data.duration).max(open);
                Slot {
                    day,
                    start,
                    end: start + data.duration,
                }
            }
        };
        books[slot.day as usize].reserve(&data.resources, slot.start, slot.end);
        slots[scene] = slot;
    }

    log_checks!(
        problem.verbosity(),
        "builder: placed {} scenes, {} on a least-conflicting day",
        scene_count,
        fallbacks
    );

    let mut solution = Solution::new(slots);
    repair(problem, &mut solution);
    solution
}
