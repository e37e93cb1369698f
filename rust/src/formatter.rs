//! Conversion of an internal solution into the external [`Schedule`].

use chrono::{NaiveDate, NaiveTime, ParseResult};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::models::{Schedule, ScheduledScene};
use crate::problem::{Problem, Resource};
use crate::solution::Solution;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

pub fn parse_time(s: &str) -> ParseResult<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
}

/// Time of day for minutes since midnight; `None` past the end of the day.
pub fn time_of(minutes: u32) -> Option<NaiveTime> {
    if minutes >= 24 * 60 {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0)
}

/// Build the external schedule for `solution`.
///
/// Scenes whose slot cannot be expressed as a date and two times are dropped
/// with a warning. A solution of the wrong shape yields an empty schedule.
pub fn format_schedule(problem: &Problem, solution: &Solution, algorithm_used: &str) -> Schedule {
    if solution.len() != problem.scene_count() {
        warn!(
            expected = problem.scene_count(),
            got = solution.len(),
            "solution does not cover the scene list, returning an empty schedule"
        );
        return Schedule::empty(algorithm_used);
    }

    let mut kept: Vec<(usize, NaiveDate, NaiveTime, NaiveTime)> = Vec::with_capacity(solution.len());
    for (scene, slot) in solution.slots().iter().enumerate() {
        let parts = (
            problem.date(slot.day),
            time_of(slot.start),
            time_of(slot.end),
        );
        match parts {
            (Some(date), Some(start), Some(end)) if start < end => {
                kept.push((scene, date, start, end));
            }
            _ => {
                warn!(
                    scene_id = %problem.scene(scene).id,
                    day = slot.day,
                    start = slot.start,
                    end = slot.end,
                    "dropping scene with a malformed slot"
                );
            }
        }
    }

    // Split each resource-day rate evenly between the scenes using it
    let mut usage: BTreeMap<(u32, Resource), Vec<usize>> = BTreeMap::new();
    for (i, &(scene, ..)) in kept.iter().enumerate() {
        let day = solution.day(scene);
        for &resource in &problem.scene(scene).resources {
            usage.entry((day, resource)).or_default().push(i);
        }
    }
    let mut shares = vec![0.0; kept.len()];
    let mut total_cost = 0.0;
    for (&(_, resource), users) in &usage {
        let rate = problem.resource_rate(resource);
        total_cost += rate;
        let share = rate / users.len() as f64;
        for &i in users {
            shares[i] += share;
        }
    }

    let mut assignments: Vec<ScheduledScene> = kept
        .iter()
        .zip(shares)
        .map(|(&(scene, date, start_time, end_time), cost)| ScheduledScene {
            scene_id: problem.scene(scene).id.clone(),
            date,
            start_time,
            end_time,
            cost,
        })
        .collect();
    assignments.sort_by(|a, b| {
        (a.date, a.start_time, &a.scene_id).cmp(&(b.date, b.start_time, &b.scene_id))
    });

    let mut dates: Vec<NaiveDate> = assignments.iter().map(|a| a.date).collect();
    dates.dedup();

    let mut metadata = HashMap::new();
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        let span = (*last - *first).num_days() + 1;
        metadata.insert("span_days".to_string(), span.to_string());
    }
    let dropped = solution.len() - assignments.len();
    if dropped > 0 {
        metadata.insert("dropped_scenes".to_string(), dropped.to_string());
    }

    Schedule {
        assignments,
        total_cost,
        total_days: dates.len(),
        algorithm_used: algorithm_used.to_string(),
        metadata,
    }
}
