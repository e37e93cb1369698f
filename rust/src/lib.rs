//! Shooting-schedule optimizer.
//!
//! Assigns film scenes to shooting dates and time slots so that actor and
//! location day rates are minimized, resource calendars are respected, and no
//! actor or location is double-booked. Three interchangeable metaheuristics
//! (tabu search, particle swarm, ant colony) share one builder, one repair
//! procedure and one cost evaluator.
//!
//! ```no_run
//! use shoot_optimizer::{optimize, Algorithm, OptimizerConfig, Scene, ScheduleInput};
//! use chrono::NaiveDate;
//!
//! let mut input = ScheduleInput::new(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
//! input.scenes = vec![Scene::new("opening", 2.5).with_location("harbor")];
//! let schedule = optimize(&input, Algorithm::TabuSearch, &OptimizerConfig::default());
//! println!("{} days, cost {}", schedule.total_days, schedule.total_cost);
//! ```

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

pub mod builder;
pub mod config;
pub mod evaluate;
pub mod formatter;
pub mod logging;
pub mod models;
pub mod optimizer;
pub mod problem;
pub mod registry;
pub mod repair;
pub mod search;
pub mod solution;
pub mod timeline;

#[cfg(feature = "python")]
mod python;

#[cfg(test)]
mod fixtures;

pub use config::{
    ColonyConfig, ConfigError, CostWeights, MissingDatePolicy, OptimizerConfig, SwarmConfig,
    TabuConfig,
};
pub use evaluate::{breakdown, evaluate, CostBreakdown};
pub use models::{
    Actor, Algorithm, AvailabilityCalendar, DayAvailability, FallbackTier, Location, Scene,
    Schedule, ScheduleInput, ScheduledScene, UnknownAlgorithm,
};
pub use optimizer::{optimize, optimize_by_name, optimize_with};
pub use problem::{InputError, Problem};
pub use search::{SearchContext, SearchOutcome, SearchStrategy, StopReason};
pub use solution::{Slot, Solution};
