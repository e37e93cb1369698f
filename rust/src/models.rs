//! Core data types for the shooting-schedule optimizer.
//!
//! These are the plain records exchanged with callers: everything here is
//! read-only input for one optimization run, except [`Schedule`] and
//! [`ScheduledScene`] which are produced by it.

use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "python")]
use pyo3::prelude::*;

// Note: We use std HashMap here for PyO3 interface compatibility

/// A unit of shooting work.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub id: String,
    /// Estimated duration in hours (fractional).
    pub duration_hours: f64,
    /// Priority on a 1-10 scale (10 = most important).
    pub priority: i32,
    pub location_id: Option<String>,
    /// Required actors. Merged with the separately supplied scene/actor links.
    pub actor_ids: Vec<String>,
}

impl Scene {
    pub fn new(id: impl Into<String>, duration_hours: f64) -> Self {
        Self {
            id: id.into(),
            duration_hours,
            priority: 5,
            location_id: None,
            actor_ids: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_actors<I, S>(mut self, actor_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actor_ids = actor_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// A performer billed per shooting day.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub id: String,
    pub daily_rate: f64,
}

impl Actor {
    pub fn new(id: impl Into<String>, daily_rate: f64) -> Self {
        Self {
            id: id.into(),
            daily_rate,
        }
    }
}

/// A shooting location billed per day of use.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub id: String,
    pub daily_rate: f64,
}

impl Location {
    pub fn new(id: impl Into<String>, daily_rate: f64) -> Self {
        Self {
            id: id.into(),
            daily_rate,
        }
    }
}

/// Availability of one resource on one date.
///
/// The optional window only applies to locations: scenes there must fit inside it.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayAvailability {
    pub available: bool,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
}

impl DayAvailability {
    pub const AVAILABLE: Self = Self {
        available: true,
        window_start: None,
        window_end: None,
    };

    pub const UNAVAILABLE: Self = Self {
        available: false,
        window_start: None,
        window_end: None,
    };

    pub fn window(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            available: true,
            window_start: Some(start),
            window_end: Some(end),
        }
    }
}

/// Date-indexed availability of one actor or location.
///
/// Dates without an entry are resolved by [`crate::MissingDatePolicy`].
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AvailabilityCalendar {
    pub days: HashMap<NaiveDate, DayAvailability>,
}

impl AvailabilityCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, date: NaiveDate, availability: DayAvailability) {
        self.days.insert(date, availability);
    }

    pub fn set_available(&mut self, date: NaiveDate, available: bool) {
        let entry = if available {
            DayAvailability::AVAILABLE
        } else {
            DayAvailability::UNAVAILABLE
        };
        self.days.insert(date, entry);
    }

    /// Builder-style helper marking a set of dates unavailable.
    pub fn unavailable_on<I: IntoIterator<Item = NaiveDate>>(mut self, dates: I) -> Self {
        for date in dates {
            self.set_available(date, false);
        }
        self
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.days.get(&date)
    }
}

/// Everything one optimization run reads.
#[derive(Clone, Debug, Default)]
pub struct ScheduleInput {
    pub scenes: Vec<Scene>,
    pub actors: Vec<Actor>,
    pub locations: Vec<Location>,
    /// actor_id -> calendar
    pub actor_availability: HashMap<String, AvailabilityCalendar>,
    /// location_id -> calendar
    pub location_availability: HashMap<String, AvailabilityCalendar>,
    /// scene_id -> actor_ids, supplied separately from the scenes themselves
    pub scene_actor_links: HashMap<String, Vec<String>>,
    pub start_date: NaiveDate,
    /// Last shooting date (inclusive). Derived from the scene count when absent.
    pub end_date: Option<NaiveDate>,
}

impl ScheduleInput {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            ..Default::default()
        }
    }
}

/// Error returned when parsing an unknown algorithm selector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown optimization algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

/// Search strategy selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    TabuSearch,
    ParticleSwarm,
    AntColony,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::TabuSearch,
        Algorithm::ParticleSwarm,
        Algorithm::AntColony,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TabuSearch => "tabu_search",
            Self::ParticleSwarm => "particle_swarm",
            Self::AntColony => "ant_colony",
        }
    }

    /// Short code stored with persisted schedules.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TabuSearch => "TSBM",
            Self::ParticleSwarm => "PSOBM",
            Self::AntColony => "ACOBM",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tabu_search" | "tsbm" => Ok(Self::TabuSearch),
            "particle_swarm" | "psobm" => Ok(Self::ParticleSwarm),
            "ant_colony" | "acobm" => Ok(Self::AntColony),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Which tier of the fallback policy produced a schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackTier {
    /// The requested metaheuristic produced the result.
    Requested,
    /// The search produced nothing usable; the initial solution was returned.
    InitialSolution,
    /// Not even an initial solution could be built; a placeholder was returned.
    Placeholder,
}

impl FallbackTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "none",
            Self::InitialSolution => "initial_solution",
            Self::Placeholder => "placeholder",
        }
    }
}

/// A scene bound to a date and time interval.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledScene {
    pub scene_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// This scene's share of the resource-day cost.
    pub cost: f64,
}

/// Result of an optimization run.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    /// Sorted by (date, start_time, scene_id).
    pub assignments: Vec<ScheduledScene>,
    /// Resource-day cost: each actor/location billed once per distinct day used.
    pub total_cost: f64,
    /// Number of distinct shooting days.
    pub total_days: usize,
    pub algorithm_used: String,
    pub metadata: HashMap<String, String>,
}

impl Schedule {
    /// A structurally valid schedule with no assignments and zero totals.
    pub fn empty(algorithm_used: &str) -> Self {
        Self {
            algorithm_used: algorithm_used.to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, scene_id: &str) -> Option<&ScheduledScene> {
        self.assignments.iter().find(|a| a.scene_id == scene_id)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn fallback_tier(&self) -> Option<&str> {
        self.metadata.get("fallback_tier").map(|s| s.as_str())
    }
}
