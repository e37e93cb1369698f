//! Search strategies.
//!
//! Every driver shares the builder, repair and evaluator and differs only in
//! its search loop. A driver owns its state (tabu list, swarm, pheromone
//! table) for the duration of one call.

pub mod budget;
pub mod colony;
pub mod swarm;
pub mod tabu;

use std::time::Instant;

use crate::config::OptimizerConfig;
use crate::models::Algorithm;
use crate::problem::Problem;
use crate::solution::Solution;

pub use budget::{Budget, StopReason};
pub use colony::AntColony;
pub use swarm::ParticleSwarm;
pub use tabu::TabuSearch;

/// Per-call inputs every strategy receives besides the problem.
#[derive(Clone, Copy, Debug)]
pub struct SearchContext {
    pub seed: u64,
    pub deadline: Option<Instant>,
}

impl SearchContext {
    pub fn new(seed: u64, deadline: Option<Instant>) -> Self {
        Self { seed, deadline }
    }
}

/// Best solution found by one search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub solution: Solution,
    pub cost: f64,
    pub iterations: usize,
    /// Best cost before the first iteration and after each one
    pub history: Vec<f64>,
    pub stop: StopReason,
}

/// Common interface of the search drivers.
pub trait SearchStrategy {
    fn algorithm(&self) -> Algorithm;

    /// Improve on `seed`. Returns `None` when the search has nothing usable to offer.
    fn search(
        &mut self,
        problem: &Problem,
        seed: &Solution,
        ctx: &SearchContext,
    ) -> Option<SearchOutcome>;
}

/// Driver for `algorithm`, configured from `config`.
pub fn strategy_for(algorithm: Algorithm, config: &OptimizerConfig) -> Box<dyn SearchStrategy> {
    match algorithm {
        Algorithm::TabuSearch => Box::new(TabuSearch::new(config.tabu.clone())),
        Algorithm::ParticleSwarm => Box::new(ParticleSwarm::new(config.swarm.clone())),
        Algorithm::AntColony => Box::new(AntColony::new(config.colony.clone())),
    }
}

/// Whether a driver can work on this seed at all.
pub(crate) fn usable_seed(problem: &Problem, seed: &Solution) -> bool {
    problem.scene_count() > 0 && seed.len() == problem.scene_count()
}
