//! Configuration types for the optimizer.

use chrono::{NaiveTime, Timelike};
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Errors raised when a configuration cannot be used as given.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Day start {start} must be before day end {end}")]
    InvalidDayBounds { start: NaiveTime, end: NaiveTime },
    #[error("Cost weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("Invalid {driver} parameter: {reason}")]
    InvalidDriverParameter {
        driver: &'static str,
        reason: String,
    },
}

/// How a date missing from an availability calendar is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingDatePolicy {
    /// No entry means the resource can be used that day.
    #[default]
    Available,
    /// No entry means the resource cannot be used that day.
    Unavailable,
}

/// Tunable weights of the fitness function.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostWeights {
    /// Penalty per residual actor/location time overlap
    pub conflict_penalty: f64,
    /// Penalty per resource scheduled on a day it is unavailable (or outside its window)
    pub availability_penalty: f64,
    /// Cost per location changed between consecutive shooting days
    pub transition_penalty: f64,
    /// Cost per distinct shooting day
    pub day_penalty: f64,
    /// Penalty per malformed slot or structurally invalid solution
    pub invalid_penalty: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            conflict_penalty: 10_000.0,
            availability_penalty: 10_000.0,
            transition_penalty: 500.0,
            day_penalty: 100.0,
            invalid_penalty: 1_000_000.0,
        }
    }
}

impl CostWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("conflict_penalty", self.conflict_penalty),
            ("availability_penalty", self.availability_penalty),
            ("transition_penalty", self.transition_penalty),
            ("day_penalty", self.day_penalty),
            ("invalid_penalty", self.invalid_penalty),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Tabu search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TabuConfig {
    pub max_iterations: usize,
    /// Stop after this many consecutive iterations without a new best
    pub max_no_improvement: usize,
    /// Upper bound on tenure; the effective tenure is min(this, scenes / 2), at least 1
    pub max_tenure: usize,
    /// Maximum number of candidate moves evaluated per iteration
    pub neighborhood_size: usize,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_no_improvement: 100,
            max_tenure: 20,
            neighborhood_size: 64,
        }
    }
}

impl TabuConfig {
    pub fn tenure(&self, scene_count: usize) -> usize {
        self.max_tenure.min(scene_count / 2).max(1)
    }
}

/// Particle swarm parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SwarmConfig {
    /// Upper bound on particles; the effective count is min(this, 2 * scenes)
    pub max_particles: usize,
    pub max_iterations: usize,
    pub max_no_improvement: usize,
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
    /// Velocity clamp in days; defaults to the window length when None
    pub max_velocity: Option<f64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_particles: 30,
            max_iterations: 100,
            max_no_improvement: 20,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            max_velocity: None,
        }
    }
}

impl SwarmConfig {
    pub fn particle_count(&self, scene_count: usize) -> usize {
        self.max_particles.min(scene_count * 2).max(1)
    }
}

/// Ant colony parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ColonyConfig {
    /// Upper bound on ants; the effective count is min(this, scenes)
    pub max_ants: usize,
    pub max_iterations: usize,
    /// Optional early exit after this many iterations without a new best
    pub max_no_improvement: Option<usize>,
    pub evaporation_rate: f64,
    /// Pheromone influence
    pub alpha: f64,
    /// Heuristic influence
    pub beta: f64,
    pub initial_pheromone: f64,
    /// Pheromone never decays below this floor
    pub min_pheromone: f64,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            max_ants: 20,
            max_iterations: 100,
            max_no_improvement: None,
            evaporation_rate: 0.1,
            alpha: 1.0,
            beta: 2.0,
            initial_pheromone: 1.0,
            min_pheromone: 1e-9,
        }
    }
}

impl ColonyConfig {
    pub fn ant_count(&self, scene_count: usize) -> usize {
        self.max_ants.min(scene_count).max(1)
    }
}

/// Configuration for one optimization run.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerConfig {
    /// Anchor from which each day's scenes are packed
    pub day_start: NaiveTime,
    /// No scene may end after this time
    pub day_end: NaiveTime,
    pub missing_date: MissingDatePolicy,
    pub weights: CostWeights,
    pub tabu: TabuConfig,
    pub swarm: SwarmConfig,
    pub colony: ColonyConfig,
    /// Seed for every random choice made during the run
    pub seed: u64,
    /// Wall-clock budget for the search; best-so-far is returned on expiry
    pub time_limit: Option<Duration>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
    /// Window length in days per scene when no end date is given
    pub default_window_factor: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN),
            missing_date: MissingDatePolicy::Available,
            weights: CostWeights::default(),
            tabu: TabuConfig::default(),
            swarm: SwarmConfig::default(),
            colony: ColonyConfig::default(),
            seed: 42,
            time_limit: None,
            verbosity: 0,
            default_window_factor: 2,
        }
    }
}

impl OptimizerConfig {
    /// Day start as minutes since midnight.
    pub fn day_start_minutes(&self) -> u32 {
        minutes_of(self.day_start)
    }

    /// Day end as minutes since midnight.
    pub fn day_end_minutes(&self) -> u32 {
        minutes_of(self.day_end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_start_minutes() >= self.day_end_minutes() {
            return Err(ConfigError::InvalidDayBounds {
                start: self.day_start,
                end: self.day_end,
            });
        }
        self.weights.validate()?;

        let swarm = &self.swarm;
        for (name, value) in [
            ("inertia", swarm.inertia),
            ("cognitive", swarm.cognitive),
            ("social", swarm.social),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDriverParameter {
                    driver: "particle_swarm",
                    reason: format!("{} must be finite and non-negative, got {}", name, value),
                });
            }
        }
        if let Some(v) = swarm.max_velocity {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::InvalidDriverParameter {
                    driver: "particle_swarm",
                    reason: format!("max_velocity must be positive, got {}", v),
                });
            }
        }

        let colony = &self.colony;
        if !(0.0..1.0).contains(&colony.evaporation_rate) {
            return Err(ConfigError::InvalidDriverParameter {
                driver: "ant_colony",
                reason: format!(
                    "evaporation_rate must be in [0, 1), got {}",
                    colony.evaporation_rate
                ),
            });
        }
        for (name, value) in [
            ("alpha", colony.alpha),
            ("beta", colony.beta),
            ("initial_pheromone", colony.initial_pheromone),
            ("min_pheromone", colony.min_pheromone),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDriverParameter {
                    driver: "ant_colony",
                    reason: format!("{} must be finite and non-negative, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

/// Wall-clock budget from a number of seconds.
///
/// Non-finite, non-positive and unrepresentable values mean no limit.
pub fn time_limit_from_secs(secs: Option<f64>) -> Option<Duration> {
    secs.filter(|s| s.is_finite() && *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
}

/// Minutes since midnight, ignoring seconds.
pub fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}
