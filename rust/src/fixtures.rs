//! Shared test inputs.

use chrono::NaiveDate;

use crate::config::OptimizerConfig;
use crate::models::{Actor, AvailabilityCalendar, Location, Scene, ScheduleInput};
use crate::problem::Problem;
use crate::solution::Solution;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Three studio scenes with the lead actor over 2025-01-01..=2025-01-05.
///
/// The lead is off on the 2nd and the studio is closed on the 4th, so the only
/// feasible dates are the 1st, 3rd and 5th.
pub fn make_input() -> ScheduleInput {
    let mut input = ScheduleInput::new(d(2025, 1, 1));
    input.end_date = Some(d(2025, 1, 5));
    input.actors = vec![Actor::new("lead", 1000.0)];
    input.locations = vec![Location::new("studio", 500.0)];
    input.scenes = vec![
        Scene::new("s1", 2.0)
            .with_priority(8)
            .with_location("studio")
            .with_actors(["lead"]),
        Scene::new("s2", 3.0)
            .with_priority(5)
            .with_location("studio")
            .with_actors(["lead"]),
        Scene::new("s3", 1.0)
            .with_priority(3)
            .with_location("studio")
            .with_actors(["lead"]),
    ];
    input.actor_availability.insert(
        "lead".to_string(),
        AvailabilityCalendar::new().unavailable_on([d(2025, 1, 2)]),
    );
    input.location_availability.insert(
        "studio".to_string(),
        AvailabilityCalendar::new().unavailable_on([d(2025, 1, 4)]),
    );
    input
}

/// A larger input with several locations, shared actors, and no calendars.
pub fn make_mixed_input(scene_count: usize) -> ScheduleInput {
    let mut input = ScheduleInput::new(d(2025, 3, 3));
    input.actors = vec![
        Actor::new("ana", 800.0),
        Actor::new("ben", 650.0),
        Actor::new("cleo", 900.0),
    ];
    input.locations = vec![
        Location::new("beach", 1200.0),
        Location::new("loft", 400.0),
        Location::new("street", 300.0),
    ];
    let actor_names = ["ana", "ben", "cleo"];
    let location_names = ["beach", "loft", "street"];
    input.scenes = (0..scene_count)
        .map(|i| {
            Scene::new(format!("sc{:02}", i), 1.0 + (i % 4) as f64)
                .with_priority((i % 10) as i32 + 1)
                .with_location(location_names[i % 3])
                .with_actors([actor_names[i % 3], actor_names[(i + 1) % 3]])
        })
        .collect();
    input
}

pub fn make_problem(input: &ScheduleInput) -> Problem {
    Problem::new(input, &OptimizerConfig::default()).unwrap()
}

/// Pairs of scenes that share a resource and overlap in time on the same day.
pub fn count_overlaps(problem: &Problem, solution: &Solution) -> usize {
    let mut count = 0;
    for a in 0..solution.len() {
        for b in (a + 1)..solution.len() {
            let (sa, sb) = (solution.slot(a), solution.slot(b));
            let shared = problem
                .scene(a)
                .resources
                .iter()
                .any(|r| problem.scene(b).resources.contains(r));
            if shared && sa.day == sb.day && sa.start < sb.end && sb.start < sa.end {
                count += 1;
            }
        }
    }
    count
}
