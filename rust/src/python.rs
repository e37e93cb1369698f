//! Python bindings.

use chrono::{NaiveDate, NaiveTime};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::config::{time_limit_from_secs, CostWeights, OptimizerConfig};
use crate::formatter::{format_date, format_time};
use crate::models::{
    Actor, Algorithm, AvailabilityCalendar, DayAvailability, Location, Scene, Schedule,
    ScheduleInput, ScheduledScene,
};
use crate::optimizer::optimize;

#[pymethods]
impl Scene {
    #[new]
    #[pyo3(signature = (id, duration_hours=1.0, priority=5, location_id=None, actor_ids=None))]
    fn py_new(
        id: String,
        duration_hours: f64,
        priority: i32,
        location_id: Option<String>,
        actor_ids: Option<Vec<String>>,
    ) -> Self {
        Self {
            id,
            duration_hours,
            priority,
            location_id,
            actor_ids: actor_ids.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Scene(id={:?}, duration_hours={}, priority={}, location_id={:?}, actors={})",
            self.id,
            self.duration_hours,
            self.priority,
            self.location_id,
            self.actor_ids.len()
        )
    }
}

#[pymethods]
impl Actor {
    #[new]
    #[pyo3(signature = (id, daily_rate=0.0))]
    fn py_new(id: String, daily_rate: f64) -> Self {
        Self { id, daily_rate }
    }

    fn __repr__(&self) -> String {
        format!("Actor(id={:?}, daily_rate={})", self.id, self.daily_rate)
    }
}

#[pymethods]
impl Location {
    #[new]
    #[pyo3(signature = (id, daily_rate=0.0))]
    fn py_new(id: String, daily_rate: f64) -> Self {
        Self { id, daily_rate }
    }

    fn __repr__(&self) -> String {
        format!("Location(id={:?}, daily_rate={})", self.id, self.daily_rate)
    }
}

#[pymethods]
impl DayAvailability {
    #[new]
    #[pyo3(signature = (available=true, window_start=None, window_end=None))]
    fn py_new(
        available: bool,
        window_start: Option<NaiveTime>,
        window_end: Option<NaiveTime>,
    ) -> Self {
        Self {
            available,
            window_start,
            window_end,
        }
    }

    fn __repr__(&self) -> String {
        let window = match (self.window_start, self.window_end) {
            (Some(start), Some(end)) => format!("{}-{}", format_time(start), format_time(end)),
            _ => "all day".to_string(),
        };
        format!(
            "DayAvailability(available={}, window={})",
            self.available, window
        )
    }
}

#[pymethods]
impl AvailabilityCalendar {
    #[new]
    #[pyo3(signature = (days=None))]
    fn py_new(days: Option<HashMap<NaiveDate, DayAvailability>>) -> Self {
        Self {
            days: days.unwrap_or_default(),
        }
    }

    #[pyo3(name = "set_available")]
    fn py_set_available(&mut self, date: NaiveDate, available: bool) {
        self.set_available(date, available);
    }

    #[pyo3(name = "set")]
    fn py_set(&mut self, date: NaiveDate, availability: DayAvailability) {
        self.set(date, availability);
    }

    fn __len__(&self) -> usize {
        self.days.len()
    }

    fn __repr__(&self) -> String {
        format!("AvailabilityCalendar(days={})", self.days.len())
    }
}

#[pymethods]
impl CostWeights {
    #[new]
    #[pyo3(signature = (
        conflict_penalty=10_000.0,
        availability_penalty=10_000.0,
        transition_penalty=500.0,
        day_penalty=100.0,
        invalid_penalty=1_000_000.0
    ))]
    fn py_new(
        conflict_penalty: f64,
        availability_penalty: f64,
        transition_penalty: f64,
        day_penalty: f64,
        invalid_penalty: f64,
    ) -> Self {
        Self {
            conflict_penalty,
            availability_penalty,
            transition_penalty,
            day_penalty,
            invalid_penalty,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "CostWeights(conflict={}, availability={}, transition={}, day={}, invalid={})",
            self.conflict_penalty,
            self.availability_penalty,
            self.transition_penalty,
            self.day_penalty,
            self.invalid_penalty
        )
    }
}

#[pymethods]
impl ScheduledScene {
    fn __repr__(&self) -> String {
        format!(
            "ScheduledScene(scene_id={:?}, date={}, start={}, end={}, cost={:.2})",
            self.scene_id,
            format_date(self.date),
            format_time(self.start_time),
            format_time(self.end_time),
            self.cost
        )
    }
}

#[pymethods]
impl Schedule {
    #[pyo3(name = "get")]
    fn py_get(&self, scene_id: &str) -> Option<ScheduledScene> {
        self.get(scene_id).cloned()
    }

    fn __len__(&self) -> usize {
        self.assignments.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Schedule(algorithm={}, scenes={}, total_cost={:.2}, total_days={})",
            self.algorithm_used,
            self.assignments.len(),
            self.total_cost,
            self.total_days
        )
    }
}

/// Optimize a shooting schedule.
///
/// # Arguments
/// * `scenes`, `actors`, `locations` - Entities of the production
/// * `actor_availability`, `location_availability` - Calendars keyed by entity id
/// * `scene_actor_links` - Scene id to actor ids, merged with each scene's own actors
/// * `start_date`, `end_date` - Inclusive window; defaults to twice the scene count in days
/// * `algorithm` - `tabu_search`, `particle_swarm`, `ant_colony` or their short codes
/// * `weights` - Fitness weights
/// * `seed` - Seed for the random choices of the search
/// * `time_limit_secs` - Wall-clock budget; the best schedule so far is returned on expiry
///
/// # Raises
/// * ValueError if the algorithm is unknown
#[pyfunction]
#[pyo3(signature = (
    scenes,
    actors,
    locations,
    actor_availability,
    location_availability,
    scene_actor_links,
    start_date,
    end_date=None,
    algorithm="ant_colony",
    weights=None,
    seed=None,
    time_limit_secs=None
))]
#[allow(clippy::too_many_arguments)]
fn optimize_schedule(
    py: Python<'_>,
    scenes: Vec<Scene>,
    actors: Vec<Actor>,
    locations: Vec<Location>,
    actor_availability: HashMap<String, AvailabilityCalendar>,
    location_availability: HashMap<String, AvailabilityCalendar>,
    scene_actor_links: HashMap<String, Vec<String>>,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    algorithm: &str,
    weights: Option<CostWeights>,
    seed: Option<u64>,
    time_limit_secs: Option<f64>,
) -> PyResult<Schedule> {
    let algorithm: Algorithm = algorithm
        .parse()
        .map_err(|e: crate::models::UnknownAlgorithm| PyValueError::new_err(e.to_string()))?;

    let mut config = OptimizerConfig::default();
    if let Some(weights) = weights {
        config.weights = weights;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.time_limit = time_limit_from_secs(time_limit_secs);

    let input = ScheduleInput {
        scenes,
        actors,
        locations,
        actor_availability,
        location_availability,
        scene_actor_links,
        start_date,
        end_date,
    };

    // The search runs on the rayon pool; no Python objects are touched
    Ok(py.allow_threads(|| optimize(&input, algorithm, &config)))
}

/// The shoot_optimizer Python module.
#[pymodule]
fn shoot_optimizer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data types
    m.add_class::<Scene>()?;
    m.add_class::<Actor>()?;
    m.add_class::<Location>()?;
    m.add_class::<DayAvailability>()?;
    m.add_class::<AvailabilityCalendar>()?;
    m.add_class::<ScheduledScene>()?;
    m.add_class::<Schedule>()?;

    // Config types
    m.add_class::<CostWeights>()?;

    // Entry point
    m.add_function(wrap_pyfunction!(optimize_schedule, m)?)?;

    Ok(())
}
