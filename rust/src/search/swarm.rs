//! Particle-swarm driver over the discrete date axis.
//!
//! Each particle carries one velocity per scene, measured in days. Times are
//! not part of the particle state: repair re-packs every day after a move.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{usable_seed, Budget, SearchContext, SearchOutcome, SearchStrategy};
use crate::builder::build_randomized;
use crate::config::SwarmConfig;
use crate::evaluate::evaluate;
use crate::models::Algorithm;
use crate::problem::Problem;
use crate::repair::repair;
use crate::solution::Solution;
use crate::{log_changes, log_checks};

/// One member of the swarm.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Solution,
    /// Days per iteration, one entry per scene
    pub velocity: Vec<f64>,
    pub best_position: Solution,
    pub best_cost: f64,
}

impl Particle {
    fn new(problem: &Problem, mut position: Solution) -> Self {
        repair(problem, &mut position);
        let cost = evaluate(problem, &position);
        Self {
            velocity: vec![0.0; position.len()],
            best_position: position.clone(),
            best_cost: cost,
            position,
        }
    }

    /// Move toward the personal and global bests, then repair and re-evaluate.
    fn step<R: Rng>(
        &mut self,
        problem: &Problem,
        global_best: &[u32],
        config: &SwarmConfig,
        max_velocity: f64,
        rng: &mut R,
    ) {
        let last_day = problem.day_count().saturating_sub(1) as f64;
        for scene in 0..self.position.len() {
            let day = self.position.day(scene) as f64;
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            let velocity = config.inertia * self.velocity[scene]
                + config.cognitive * r1 * (self.best_position.day(scene) as f64 - day)
                + config.social * r2 * (global_best[scene] as f64 - day);
            let velocity = velocity.clamp(-max_velocity, max_velocity);
            self.velocity[scene] = velocity;

            // Clamped to the window, not wrapped
            let next = (day + velocity).round().clamp(0.0, last_day) as u32;
            if next != self.position.day(scene) {
                self.position.set_day(scene, next);
            }
        }

        repair(problem, &mut self.position);
        let cost = evaluate(problem, &self.position);
        if cost < self.best_cost {
            self.best_position = self.position.clone();
            self.best_cost = cost;
        }
    }
}

pub struct ParticleSwarm {
    config: SwarmConfig,
    particles: Vec<Particle>,
}

impl ParticleSwarm {
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Index of the particle with the lowest personal best, first on ties.
    fn leader(&self) -> Option<usize> {
        self.particles
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.best_cost.total_cmp(&b.1.best_cost).then(a.0.cmp(&b.0)))
            .map(|(i, _)| i)
    }
}

impl SearchStrategy for ParticleSwarm {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ParticleSwarm
    }

    fn search(
        &mut self,
        problem: &Problem,
        seed: &Solution,
        ctx: &SearchContext,
    ) -> Option<SearchOutcome> {
        if !usable_seed(problem, seed) {
            return None;
        }
        let verbosity = problem.verbosity();
        let count = self.config.particle_count(problem.scene_count());
        let max_velocity = self
            .config
            .max_velocity
            .unwrap_or(problem.day_count() as f64);
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);

        // The seed solution leads; the rest of the swarm starts from randomized builds
        self.particles = Vec::with_capacity(count);
        self.particles.push(Particle::new(problem, seed.clone()));
        for _ in 1..count {
            let position = build_randomized(problem, &mut rng);
            self.particles.push(Particle::new(problem, position));
        }

        let leader = self.leader()?;
        let mut best = self.particles[leader].best_position.clone();
        let mut best_cost = self.particles[leader].best_cost;
        let mut history = vec![best_cost];
        let mut budget = Budget::new(
            self.config.max_iterations,
            Some(self.config.max_no_improvement),
            ctx.deadline,
        );

        log_changes!(
            verbosity,
            "particle swarm: {} particles, {} scenes, initial best {:.2}",
            count,
            problem.scene_count(),
            best_cost
        );

        let stop = loop {
            if let Some(reason) = budget.exhausted() {
                break reason;
            }

            // Particles move independently against a frozen global best
            let global_best = best.days();
            let seeds: Vec<u64> = (0..self.particles.len()).map(|_| rng.gen()).collect();
            let config = &self.config;
            self.particles
                .par_iter_mut()
                .zip(seeds.par_iter())
                .for_each(|(particle, &particle_seed)| {
                    let mut particle_rng = ChaCha8Rng::seed_from_u64(particle_seed);
                    particle.step(problem, &global_best, config, max_velocity, &mut particle_rng);
                });

            let mut improved = false;
            if let Some(leader) = self.leader() {
                let candidate = &self.particles[leader];
                if candidate.best_cost < best_cost {
                    best = candidate.best_position.clone();
                    best_cost = candidate.best_cost;
                    improved = true;
                    log_checks!(
                        verbosity,
                        "particle swarm: new best {:.2} from particle {} at iteration {}",
                        best_cost,
                        leader,
                        budget.iterations() + 1
                    );
                }
            }
            budget.record(improved);
            history.push(best_cost);
        };

        log_changes!(
            verbosity,
            "particle swarm: stopped ({}) after {} iterations, best cost {:.2}",
            stop.as_str(),
            budget.iterations(),
            best_cost
        );

        Some(SearchOutcome {
            solution: best,
            cost: best_cost,
            iterations: budget.iterations(),
            history,
            stop,
        })
    }
}
