//! Cost evaluator: the scalar fitness minimized by every search strategy.
//!
//! Evaluation is total: a malformed slot or a solution of the wrong shape is
//! charged the invalid penalty instead of failing. Every sum runs over sorted
//! vectors, so the same solution always produces the same cost bit for bit.

use crate::problem::{Problem, Resource};
use crate::solution::Solution;

/// Components of one evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CostBreakdown {
    /// Daily rates, once per resource per distinct day used
    pub resource_cost: f64,
    pub conflict_penalty: f64,
    pub availability_penalty: f64,
    pub transition_penalty: f64,
    pub length_penalty: f64,
    pub invalid_penalty: f64,
    /// Overlapping scene pairs, counted per shared resource
    pub conflicts: usize,
    /// Resources used on a day (or outside a window) they are not available
    pub unavailable: usize,
    pub malformed: usize,
    pub shooting_days: usize,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.resource_cost
            + self.conflict_penalty
            + self.availability_penalty
            + self.transition_penalty
            + self.length_penalty
            + self.invalid_penalty
    }
}

/// Fitness of `solution`; lower is better, always finite and non-negative.
pub fn evaluate(problem: &Problem, solution: &Solution) -> f64 {
    let total = breakdown(problem, solution).total();
    if total.is_finite() && total >= 0.0 {
        total
    } else {
        problem.weights().invalid_penalty
    }
}

/// Itemized fitness of `solution`.
pub fn breakdown(problem: &Problem, solution: &Solution) -> CostBreakdown {
    let weights = problem.weights();
    let mut cost = CostBreakdown::default();

    if solution.len() != problem.scene_count() {
        cost.malformed = 1;
        cost.invalid_penalty = weights.invalid_penalty;
        return cost;
    }

    let day_count = problem.day_count() as u32;
    // (day, resource, start, end) for every well-formed slot
    let mut usage: Vec<(u32, Resource, u32, u32)> = Vec::with_capacity(solution.len() * 3);
    let mut days: Vec<u32> = Vec::with_capacity(solution.len());
    let mut locations: Vec<(u32, u32)> = Vec::new();

    for (scene, slot) in solution.slots().iter().enumerate() {
        let data = problem.scene(scene);
        if slot.day >= day_count
            || slot.is_pending()
            || slot.end <= slot.start
            || slot.end - slot.start != data.duration
        {
            cost.malformed += 1;
            continue;
        }

        let (open, close) = problem.bounds(scene, slot.day);
        let outside = usize::from(slot.start < open || slot.end > close);
        cost.unavailable += problem.unavailable_count(scene, slot.day) + outside;

        days.push(slot.day);
        if let Some(location) = data.location {
            locations.push((slot.day, location));
        }
        for &resource in &data.resources {
            usage.push((slot.day, resource, slot.start, slot.end));
        }
    }

    usage.sort_unstable();
    days.sort_unstable();
    days.dedup();
    locations.sort_unstable();
    locations.dedup();

    // Billing and overlaps, one (day, resource) group at a time
    for group in usage.chunk_by(|a, b| a.0 == b.0 && a.1 == b.1) {
        cost.resource_cost += problem.resource_rate(group[0].1);
        for (i, &(_, _, _, end)) in group.iter().enumerate() {
            cost.conflicts += group[i + 1..]
                .iter()
                .take_while(|&&(_, _, start, _)| start < end)
                .count();
        }
    }

    // Location changes between back-to-back calendar days that both use a location
    let per_day: Vec<&[(u32, u32)]> = locations.chunk_by(|a, b| a.0 == b.0).collect();
    let changes: usize = per_day
        .windows(2)
        .filter(|pair| pair[1][0].0 == pair[0][0].0 + 1)
        .map(|pair| symmetric_difference(pair[0], pair[1]))
        .sum();

    cost.shooting_days = days.len();
    cost.conflict_penalty = cost.conflicts as f64 * weights.conflict_penalty;
    cost.availability_penalty = cost.unavailable as f64 * weights.availability_penalty;
    cost.transition_penalty = changes as f64 * weights.transition_penalty;
    cost.length_penalty = cost.shooting_days as f64 * weights.day_penalty;
    cost.invalid_penalty = cost.malformed as f64 * weights.invalid_penalty;
    cost
}

/// Size of the symmetric difference of two sorted location lists.
fn symmetric_difference(a: &[(u32, u32)], b: &[(u32, u32)]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].1.cmp(&b[j].1) {
            std::cmp::Ordering::Less => {
                count += 1;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                count += 1;
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    count + (a.len() - i) + (b.len() - j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{d, make_input, make_mixed_input, make_problem};
    use crate::models::{Actor, Scene, ScheduleInput};
    use crate::repair::repair;
    use crate::solution::Slot;

    fn slot(day: u32, start: u32, end: u32) -> Slot {
        Slot { day, start, end }
    }

    #[test]
    fn test_resource_billed_once_per_day() {
        let problem = make_problem(&make_input());
        let mut solution = Solution::from_days(&[0, 0, 0]);
        repair(&problem, &mut solution);

        let cost = breakdown(&problem, &solution);
        // One day of the lead (1000) and the studio (500), not three
        assert_eq!(cost.resource_cost, 1500.0);
        assert_eq!(cost.shooting_days, 1);
        assert_eq!(cost.conflicts, 0);
        assert_eq!(evaluate(&problem, &solution), 1600.0);
    }

    #[test]
    fn test_separate_days_pay_separately() {
        let problem = make_problem(&make_input());
        let mut solution = Solution::from_days(&[0, 2, 4]);
        repair(&problem, &mut solution);

        let cost = breakdown(&problem, &solution);
        assert_eq!(cost.resource_cost, 4500.0);
        assert_eq!(cost.length_penalty, 300.0);
        // Same location every day
        assert_eq!(cost.transition_penalty, 0.0);
        assert_eq!(cost.total(), 4800.0);
    }

    #[test]
    fn test_three_scenes_one_actor_one_day() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.actors = vec![Actor::new("a", 700.0)];
        input.scenes = (0..3)
            .map(|i| Scene::new(format!("s{}", i), 1.0).with_actors(["a"]))
            .collect();
        let problem = make_problem(&input);
        let mut solution = Solution::from_days(&[0, 0, 0]);
        repair(&problem, &mut solution);
        assert_eq!(breakdown(&problem, &solution).resource_cost, 700.0);
    }

    #[test]
    fn test_location_transition_penalty() {
        let problem = make_problem(&make_mixed_input(2));
        let mut solution = Solution::from_days(&[0, 1]);
        repair(&problem, &mut solution);
        // beach then loft: one location dropped, one added
        assert_eq!(breakdown(&problem, &solution).transition_penalty, 1000.0);
    }

    #[test]
    fn test_transition_only_between_adjacent_days() {
        let problem = make_problem(&make_mixed_input(2));
        // A rest day between beach and loft: the crew has time to move
        let mut gap = Solution::from_days(&[0, 2]);
        repair(&problem, &mut gap);
        assert_eq!(breakdown(&problem, &gap).transition_penalty, 0.0);

        // A day without any location does not bridge two located days
        let mut input = make_mixed_input(2);
        input.scenes.push(Scene::new("rehearsal", 1.0));
        let problem = make_problem(&input);
        let mut bridged = Solution::from_days(&[0, 2, 1]);
        repair(&problem, &mut bridged);
        let cost = breakdown(&problem, &bridged);
        assert_eq!(cost.shooting_days, 3);
        assert_eq!(cost.transition_penalty, 0.0);
    }

    #[test]
    fn test_residual_overlap_is_penalized() {
        let problem = make_problem(&make_input());
        let solution = Solution::new(vec![
            slot(0, 540, 660),
            slot(0, 600, 780),
            slot(2, 540, 600),
        ]);
        let cost = breakdown(&problem, &solution);
        // Overlap on both the actor and the location
        assert_eq!(cost.conflicts, 2);
        assert_eq!(cost.conflict_penalty, 20_000.0);
    }

    #[test]
    fn test_unavailable_day_is_penalized() {
        let problem = make_problem(&make_input());
        let solution = Solution::new(vec![
            slot(1, 540, 660),
            slot(3, 540, 720),
            slot(4, 540, 600),
        ]);
        let cost = breakdown(&problem, &solution);
        assert_eq!(cost.unavailable, 2);
        assert_eq!(cost.availability_penalty, 20_000.0);
    }

    #[test]
    fn test_malformed_slots_cost_invalid_penalty() {
        let problem = make_problem(&make_input());
        let solution = Solution::new(vec![
            slot(0, 540, 660),
            Slot::pending(2),
            slot(99, 540, 600),
        ]);
        let cost = breakdown(&problem, &solution);
        assert_eq!(cost.malformed, 2);
        assert!(evaluate(&problem, &solution) >= 2_000_000.0);

        let short = Solution::from_days(&[0]);
        assert_eq!(evaluate(&problem, &short), 1_000_000.0);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let problem = make_problem(&make_mixed_input(12));
        let days: Vec<u32> = (0..12).map(|i| (i * 7 % 5) as u32).collect();
        let mut solution = Solution::from_days(&days);
        repair(&problem, &mut solution);

        let first = evaluate(&problem, &solution);
        for _ in 0..10 {
            assert_eq!(evaluate(&problem, &solution).to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_empty_problem_costs_nothing() {
        let problem = make_problem(&ScheduleInput::new(d(2025, 1, 1)));
        assert_eq!(evaluate(&problem, &Solution::default()), 0.0);
    }

    #[test]
    fn test_symmetric_difference() {
        let a = [(0, 1), (0, 3)];
        let b = [(1, 2), (1, 3), (1, 4)];
        assert_eq!(symmetric_difference(&a, &b), 3);
        assert_eq!(symmetric_difference(&a, &[]), 2);
    }
}
