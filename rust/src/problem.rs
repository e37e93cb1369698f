//! Validated, indexed view of one optimization run.
//!
//! All boundary checks happen here exactly once: string ids become dense
//! indices, calendars become per-day lookup tables, and malformed fields are
//! replaced by documented defaults. The search code never sees a string id or
//! a missing field.

use chrono::{Days, NaiveDate};
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::warn;

use crate::config::{minutes_of, CostWeights, MissingDatePolicy, OptimizerConfig};
use crate::models::{AvailabilityCalendar, DayAvailability, ScheduleInput};
use crate::registry::{EntityIdx, EntityRegistry};

/// Minutes used when a scene has no usable duration.
const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Errors that prevent building a problem at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("End date {end} is before start date {start}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },
    #[error("Date window of {days} days starting {start} overflows the calendar")]
    WindowOverflow { start: NaiveDate, days: u64 },
}

/// A shared resource that can be double-booked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Actor(EntityIdx),
    Location(EntityIdx),
}

/// A scene after validation.
#[derive(Clone, Debug)]
pub struct SceneData {
    pub id: String,
    /// Duration in whole minutes, never longer than the working day.
    pub duration: u32,
    pub priority: u8,
    pub location: Option<EntityIdx>,
    /// Sorted, deduplicated.
    pub actors: Vec<EntityIdx>,
    /// Actors followed by the location, if any.
    pub resources: Vec<Resource>,
}

/// Resolved availability of a location on one day of the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DayRule {
    available: bool,
    open: u32,
    close: u32,
}

/// Read-only, indexed problem data shared by every search component.
#[derive(Clone, Debug)]
pub struct Problem {
    scenes: Vec<SceneData>,
    actors: EntityRegistry,
    locations: EntityRegistry,
    dates: Vec<NaiveDate>,
    /// [actor][day]
    actor_available: Vec<Vec<bool>>,
    /// [location][day]
    location_days: Vec<Vec<DayRule>>,
    /// [scene] -> days on which every required resource is available
    feasible_days: Vec<Vec<u32>>,
    day_start: u32,
    day_end: u32,
    weights: CostWeights,
    verbosity: u8,
}

impl Problem {
    /// Build the problem for one run.
    ///
    /// Degenerate data (bad durations, negative rates, unknown references,
    /// duplicate ids) is repaired with a warning; only an unusable date window
    /// is an error.
    pub fn new(input: &ScheduleInput, config: &OptimizerConfig) -> Result<Self, InputError> {
        let dates = build_window(input, config)?;
        let day_start = config.day_start_minutes();
        let day_end = config.day_end_minutes();
        let day_length = day_end.saturating_sub(day_start).max(1);

        let mut actors = EntityRegistry::with_capacity(input.actors.len());
        for actor in &input.actors {
            let rate = sanitize_rate(actor.daily_rate, "actor", &actor.id);
            if actors.register(&actor.id, rate).is_none() {
                warn!(actor_id = %actor.id, "duplicate actor id, keeping the first record");
            }
        }

        let mut locations = EntityRegistry::with_capacity(input.locations.len());
        for location in &input.locations {
            let rate = sanitize_rate(location.daily_rate, "location", &location.id);
            if locations.register(&location.id, rate).is_none() {
                warn!(location_id = %location.id, "duplicate location id, keeping the first record");
            }
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut scenes = Vec::with_capacity(input.scenes.len());
        for scene in &input.scenes {
            if !seen.insert(scene.id.as_str()) {
                warn!(scene_id = %scene.id, "duplicate scene id, keeping the first record");
                continue;
            }

            let duration = scene_minutes(scene.duration_hours, day_length, &scene.id);
            let priority = scene.priority.clamp(1, 10) as u8;

            let location = scene.location_id.as_deref().map(|id| {
                let (idx, added) = locations.resolve_or_add(id);
                if added {
                    warn!(scene_id = %scene.id, location_id = %id, "unknown location, billed at rate 0");
                }
                idx
            });

            let linked = input
                .scene_actor_links
                .get(&scene.id)
                .map(|ids| ids.as_slice())
                .unwrap_or(&[]);
            let mut cast: Vec<EntityIdx> = scene
                .actor_ids
                .iter()
                .chain(linked.iter())
                .map(|id| {
                    let (idx, added) = actors.resolve_or_add(id);
                    if added {
                        warn!(scene_id = %scene.id, actor_id = %id, "unknown actor, billed at rate 0");
                    }
                    idx
                })
                .collect();
            cast.sort_unstable();
            cast.dedup();

            let mut resources: Vec<Resource> = cast.iter().map(|&a| Resource::Actor(a)).collect();
            if let Some(loc) = location {
                resources.push(Resource::Location(loc));
            }

            scenes.push(SceneData {
                id: scene.id.clone(),
                duration,
                priority,
                location,
                actors: cast,
                resources,
            });
        }

        let policy = config.missing_date;
        let actor_available = actors
            .ids()
            .map(|id| {
                let calendar = input.actor_availability.get(id);
                dates
                    .iter()
                    .map(|&date| resolve_day(calendar, date, policy).available)
                    .collect()
            })
            .collect();

        let location_days = locations
            .ids()
            .map(|id| {
                let calendar = input.location_availability.get(id);
                dates
                    .iter()
                    .map(|&date| {
                        let day = resolve_day(calendar, date, policy);
                        let open = day.window_start.map(minutes_of).unwrap_or(day_start).max(day_start);
                        let close = day.window_end.map(minutes_of).unwrap_or(day_end).min(day_end);
                        DayRule {
                            available: day.available && open < close,
                            open,
                            close,
                        }
                    })
                    .collect()
            })
            .collect();

        let mut problem = Self {
            scenes,
            actors,
            locations,
            dates,
            actor_available,
            location_days,
            feasible_days: Vec::new(),
            day_start,
            day_end,
            weights: config.weights,
            verbosity: config.verbosity,
        };
        problem.feasible_days = (0..problem.scene_count())
            .map(|scene| {
                (0..problem.day_count() as u32)
                    .filter(|&day| problem.unavailable_count(scene, day) == 0)
                    .collect()
            })
            .collect();

        Ok(problem)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn day_count(&self) -> usize {
        self.dates.len()
    }

    pub fn scene(&self, scene: usize) -> &SceneData {
        &self.scenes[scene]
    }

    pub fn scenes(&self) -> &[SceneData] {
        &self.scenes
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        self.dates.get(day as usize).copied()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn actor_id(&self, actor: EntityIdx) -> Option<&str> {
        self.actors.id(actor)
    }

    pub fn location_id(&self, location: EntityIdx) -> Option<&str> {
        self.locations.id(location)
    }

    pub fn actor_rate(&self, actor: EntityIdx) -> f64 {
        self.actors.rate(actor)
    }

    pub fn location_rate(&self, location: EntityIdx) -> f64 {
        self.locations.rate(location)
    }

    pub fn resource_rate(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Actor(a) => self.actor_rate(a),
            Resource::Location(l) => self.location_rate(l),
        }
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Packing anchor in minutes since midnight.
    pub fn day_start(&self) -> u32 {
        self.day_start
    }

    pub fn day_end(&self) -> u32 {
        self.day_end
    }

    /// Days on which the scene can be shot without violating availability.
    pub fn feasible_days(&self, scene: usize) -> &[u32] {
        &self.feasible_days[scene]
    }

    /// Days a search may place the scene on: its feasible days, or every day
    /// when it has none (repair and the evaluator then carry the violation).
    pub fn candidate_days(&self, scene: usize) -> Vec<u32> {
        let feasible = self.feasible_days(scene);
        if feasible.is_empty() {
            (0..self.day_count() as u32).collect()
        } else {
            feasible.to_vec()
        }
    }

    pub fn is_available(&self, scene: usize, day: u32) -> bool {
        self.unavailable_count(scene, day) == 0
    }

    /// Number of required resources that cannot be used for this scene on this day.
    ///
    /// A location whose allowed window is shorter than the scene counts as unavailable.
    pub fn unavailable_count(&self, scene: usize, day: u32) -> usize {
        let data = &self.scenes[scene];
        let d = day as usize;
        let actors = data
            .actors
            .iter()
            .filter(|&&a| {
                !self
                    .actor_available
                    .get(a as usize)
                    .and_then(|days| days.get(d))
                    .copied()
                    .unwrap_or(true)
            })
            .count();
        let location = match data.location.and_then(|l| self.location_rule(l, day)) {
            Some(rule) if !rule.available || rule.close - rule.open < data.duration => 1,
            _ => 0,
        };
        actors + location
    }

    /// Allowed `[open, close]` minutes for the scene on the day.
    pub fn bounds(&self, scene: usize, day: u32) -> (u32, u32) {
        let data = &self.scenes[scene];
        match data.location.and_then(|l| self.location_rule(l, day)) {
            Some(rule) if rule.available => (rule.open, rule.close),
            _ => (self.day_start, self.day_end),
        }
    }

    fn location_rule(&self, location: EntityIdx, day: u32) -> Option<DayRule> {
        self.location_days
            .get(location as usize)
            .and_then(|days| days.get(day as usize))
            .copied()
    }
}

fn build_window(
    input: &ScheduleInput,
    config: &OptimizerConfig,
) -> Result<Vec<NaiveDate>, InputError> {
    let start = input.start_date;
    let days = match input.end_date {
        Some(end) if end < start => return Err(InputError::InvertedWindow { start, end }),
        Some(end) => (end - start).num_days() as u64 + 1,
        None => config.default_window_factor as u64 * input.scenes.len() as u64 + 1,
    };

    (0..days)
        .map(|offset| {
            start
                .checked_add_days(Days::new(offset))
                .ok_or(InputError::WindowOverflow { start, days })
        })
        .collect()
}

fn resolve_day(
    calendar: Option<&AvailabilityCalendar>,
    date: NaiveDate,
    policy: MissingDatePolicy,
) -> DayAvailability {
    // A resource without any calendar is treated as always available
    let Some(calendar) = calendar else {
        return DayAvailability::AVAILABLE;
    };
    match calendar.get(date) {
        Some(day) => *day,
        None => match policy {
            MissingDatePolicy::Available => DayAvailability::AVAILABLE,
            MissingDatePolicy::Unavailable => DayAvailability::UNAVAILABLE,
        },
    }
}

fn sanitize_rate(rate: f64, kind: &str, id: &str) -> f64 {
    if rate.is_finite() && rate >= 0.0 {
        rate
    } else {
        warn!(kind, id, rate, "invalid daily rate, using 0");
        0.0
    }
}

fn scene_minutes(hours: f64, day_length: u32, scene_id: &str) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        warn!(scene_id, hours, "invalid scene duration, using 1 hour");
        return DEFAULT_DURATION_MINUTES.min(day_length);
    }
    let minutes = (hours * 60.0).round().max(1.0);
    if minutes > day_length as f64 {
        warn!(scene_id, hours, day_length, "scene longer than the working day, clamped");
        return day_length;
    }
    minutes as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{d, make_input};
    use crate::models::{Actor, Location, Scene};
    use chrono::NaiveTime;

    #[test]
    fn test_window_defaults_to_twice_scene_count() {
        let mut input = make_input();
        input.end_date = None;
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(problem.day_count(), 2 * input.scenes.len() + 1);
        assert_eq!(problem.dates()[0], input.start_date);
    }

    #[test]
    fn test_inverted_window_is_an_error() {
        let mut input = make_input();
        input.end_date = Some(d(2024, 12, 1));
        let err = Problem::new(&input, &OptimizerConfig::default()).unwrap_err();
        assert!(matches!(err, InputError::InvertedWindow { .. }));
    }

    #[test]
    fn test_durations_are_sanitized() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.scenes = vec![
            Scene::new("ok", 1.5),
            Scene::new("nan", f64::NAN),
            Scene::new("negative", -2.0),
            Scene::new("huge", 30.0),
        ];
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(problem.scene(0).duration, 90);
        assert_eq!(problem.scene(1).duration, 60);
        assert_eq!(problem.scene(2).duration, 60);
        // Clamped to the 09:00-19:00 working day
        assert_eq!(problem.scene(3).duration, 600);
    }

    #[test]
    fn test_duplicate_scene_keeps_first() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.scenes = vec![Scene::new("s", 1.0), Scene::new("s", 4.0)];
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(problem.scene_count(), 1);
        assert_eq!(problem.scene(0).duration, 60);
    }

    #[test]
    fn test_links_merge_with_scene_actors() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.actors = vec![Actor::new("a", 100.0), Actor::new("b", 200.0)];
        input.scenes = vec![Scene::new("s", 1.0).with_actors(["a"])];
        input
            .scene_actor_links
            .insert("s".to_string(), vec!["b".to_string(), "a".to_string()]);
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(problem.scene(0).actors, vec![0, 1]);
        assert_eq!(
            problem.scene(0).resources,
            vec![Resource::Actor(0), Resource::Actor(1)]
        );
    }

    #[test]
    fn test_unknown_references_are_billed_at_zero() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.scenes = vec![Scene::new("s", 1.0)
            .with_location("nowhere")
            .with_actors(["ghost"])];
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(problem.actor_count(), 1);
        assert_eq!(problem.location_count(), 1);
        assert_eq!(problem.actor_id(0), Some("ghost"));
        assert_eq!(problem.actor_rate(0), 0.0);
        assert_eq!(problem.location_rate(0), 0.0);
    }

    #[test]
    fn test_negative_rate_becomes_zero() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.actors = vec![Actor::new("a", -50.0)];
        input.locations = vec![Location::new("l", f64::INFINITY)];
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(problem.actor_rate(0), 0.0);
        assert_eq!(problem.location_rate(0), 0.0);
    }

    #[test]
    fn test_feasible_days_follow_calendars() {
        let input = make_input();
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        // Actor off on day 2, location off on day 4 (1-based)
        for scene in 0..problem.scene_count() {
            assert_eq!(problem.feasible_days(scene), &[0, 2, 4]);
        }
        assert_eq!(problem.unavailable_count(0, 1), 1);
        assert_eq!(problem.unavailable_count(0, 3), 1);
    }

    #[test]
    fn test_missing_date_policy_unavailable() {
        let mut input = make_input();
        // Calendar only knows about the first day
        let mut calendar = AvailabilityCalendar::new();
        calendar.set_available(d(2025, 1, 1), true);
        input.actor_availability.insert("lead".to_string(), calendar);
        input.location_availability.clear();

        let available = Problem::new(&input, &OptimizerConfig::default()).unwrap();
        assert_eq!(available.feasible_days(0), &[0, 1, 2, 3, 4]);

        let config = OptimizerConfig {
            missing_date: MissingDatePolicy::Unavailable,
            ..Default::default()
        };
        let strict = Problem::new(&input, &config).unwrap();
        assert_eq!(strict.feasible_days(0), &[0]);
    }

    #[test]
    fn test_location_window_narrows_bounds() {
        let mut input = make_input();
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let mut calendar = AvailabilityCalendar::new();
        calendar.set(d(2025, 1, 1), DayAvailability::window(t(12), t(14)));
        calendar.set(d(2025, 1, 3), DayAvailability::window(t(6), t(23)));
        input
            .location_availability
            .insert("studio".to_string(), calendar);
        let problem = Problem::new(&input, &OptimizerConfig::default()).unwrap();

        assert_eq!(problem.bounds(0, 0), (12 * 60, 14 * 60));
        // Window wider than the working day is cut to the working day
        assert_eq!(problem.bounds(0, 2), (9 * 60, 19 * 60));
        // Scene 1 lasts 3 hours and does not fit the 2-hour window
        assert!(problem.is_available(0, 0));
        assert!(!problem.is_available(1, 0));
    }
}
