//! Tabu search driver.
//!
//! A move reassigns one scene to another date; repair then packs it after
//! whatever already sits there. Each iteration takes the best non-tabu move
//! even when it is worse than the current solution, and the move is then
//! forbidden for `tenure` iterations through a bounded FIFO.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::VecDeque;

use super::{usable_seed, Budget, SearchContext, SearchOutcome, SearchStrategy, StopReason};
use crate::config::TabuConfig;
use crate::evaluate::evaluate;
use crate::models::Algorithm;
use crate::problem::Problem;
use crate::repair::repair;
use crate::solution::Solution;
use crate::{log_changes, log_checks, log_debug};

/// Move a scene to a day.
type Move = (usize, u32);

pub struct TabuSearch {
    config: TabuConfig,
    tabu: VecDeque<Move>,
}

impl TabuSearch {
    pub fn new(config: TabuConfig) -> Self {
        Self {
            config,
            tabu: VecDeque::new(),
        }
    }

    /// Moves currently forbidden, oldest first.
    pub fn tabu_moves(&self) -> impl Iterator<Item = &Move> {
        self.tabu.iter()
    }

    /// Non-tabu moves from `current`, sampled down to the neighborhood size.
    fn neighborhood(&self, problem: &Problem, current: &Solution, rng: &mut ChaCha8Rng) -> Vec<Move> {
        let moves: Vec<Move> = (0..problem.scene_count())
            .flat_map(|scene| {
                let day = current.day(scene);
                problem
                    .candidate_days(scene)
                    .into_iter()
                    .filter(move |&alt| alt != day)
                    .map(move |alt| (scene, alt))
            })
            .filter(|m| !self.tabu.contains(m))
            .collect();

        if moves.len() <= self.config.neighborhood_size {
            return moves;
        }
        moves
            .choose_multiple(rng, self.config.neighborhood_size)
            .copied()
            .collect()
    }

    fn remember(&mut self, mv: Move, tenure: usize) {
        self.tabu.push_back(mv);
        while self.tabu.len() > tenure {
            self.tabu.pop_front();
        }
    }
}

impl SearchStrategy for TabuSearch {
    fn algorithm(&self) -> Algorithm {
        Algorithm::TabuSearch
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
        let tenure = self.config.tenure(problem.scene_count());
        self.tabu.clear();
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);

        let mut current = seed.clone();
        repair(problem, &mut current);
        let mut best = current.clone();
        let mut best_cost = evaluate(problem, &current);
        let mut history = vec![best_cost];
        let mut budget = Budget::new(
            self.config.max_iterations,
            Some(self.config.max_no_improvement),
            ctx.deadline,
        );

        log_changes!(
            verbosity,
            "tabu search: {} scenes, tenure {}, seed cost {:.2}",
            problem.scene_count(),
            tenure,
            best_cost
        );

        let stop = loop {
            if let Some(reason) = budget.exhausted() {
                break reason;
            }
            let moves = self.neighborhood(problem, &current, &mut rng);

            // Neighbors are independent: evaluate them in parallel against the unchanged current
            let chosen = moves
                .par_iter()
                .map(|&(scene, day)| {
                    let mut candidate = current.clone();
                    candidate.set_day(scene, day);
                    repair(problem, &mut candidate);
                    let cost = evaluate(problem, &candidate);
                    (cost, (scene, day), candidate)
                })
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let Some((cost, mv, candidate)) = chosen else {
                break StopReason::NoMove;
            };
            log_debug!(
                verbosity,
                "tabu search: iteration {} moves scene {} to day {} (cost {:.2})",
                budget.iterations() + 1,
                problem.scene(mv.0).id,
                mv.1,
                cost
            );

            current = candidate;
            self.remember(mv, tenure);

            let improved = cost < best_cost;
            if improved {
                best = current.clone();
                best_cost = cost;
                log_checks!(
                    verbosity,
                    "tabu search: new best {:.2} at iteration {}",
                    best_cost,
                    budget.iterations() + 1
                );
            }
            budget.record(improved);
            history.push(best_cost);
        };

        log_changes!(
            verbosity,
            "tabu search: stopped ({}) after {} iterations, best cost {:.2}",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{count_overlaps, d, make_input, make_mixed_input, make_problem};
    use crate::models::{Scene, ScheduleInput};

    fn run(problem: &Problem, seed: &Solution, config: TabuConfig) -> (TabuSearch, SearchOutcome) {
        let mut tabu = TabuSearch::new(config);
        let outcome = tabu
            .search(problem, seed, &SearchContext::new(42, None))
            .unwrap();
        (tabu, outcome)
    }

    #[test]
    fn test_finds_single_day_schedule() {
        let problem = make_problem(&make_input());
        // Spread over three days: 3 x 1500 resource cost + 300 length penalty
        let seed = Solution::from_days(&[0, 2, 4]);
        let (_, outcome) = run(&problem, &seed, TabuConfig::default());

        assert!(outcome.cost <= 1600.0);
        assert_eq!(outcome.solution.shooting_days().len(), 1);
        assert_eq!(count_overlaps(&problem, &outcome.solution), 0);
    }

    #[test]
    fn test_best_cost_never_increases() {
        let problem = make_problem(&make_mixed_input(10));
        let days: Vec<u32> = (0..10).collect();
        let (_, outcome) = run(&problem, &Solution::from_days(&days), TabuConfig::default());

        assert_eq!(outcome.history.len(), outcome.iterations + 1);
        assert!(outcome.history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(outcome.history.last().copied(), Some(outcome.cost));
    }

    #[test]
    fn test_tabu_list_is_bounded_by_tenure() {
        let problem = make_problem(&make_mixed_input(10));
        let config = TabuConfig {
            max_iterations: 30,
            ..Default::default()
        };
        let tenure = config.tenure(10);
        let (tabu, _) = run(&problem, &Solution::from_days(&[0; 10]), config);
        assert!(tabu.tabu_moves().count() <= tenure);
        assert!(tabu.tabu_moves().count() > 0);
    }

    #[test]
    fn test_no_move_terminates() {
        let mut input = ScheduleInput::new(d(2025, 1, 1));
        input.end_date = Some(d(2025, 1, 1));
        input.scenes = vec![Scene::new("only", 1.0)];
        let problem = make_problem(&input);

        let (_, outcome) = run(&problem, &Solution::from_days(&[0]), TabuConfig::default());
        assert_eq!(outcome.stop, StopReason::NoMove);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_no_improvement_cap() {
        let problem = make_problem(&make_input());
        let config = TabuConfig {
            max_no_improvement: 5,
            ..Default::default()
        };
        let (_, outcome) = run(&problem, &Solution::from_days(&[0, 0, 0]), config);
        assert_eq!(outcome.stop, StopReason::NoImprovement);
        assert!(outcome.iterations < 1000);
    }

    #[test]
    fn test_same_seed_same_result() {
        let problem = make_problem(&make_mixed_input(12));
        let seed = Solution::from_days(&[3; 12]);
        let (_, a) = run(&problem, &seed, TabuConfig::default());
        let (_, b) = run(&problem, &seed, TabuConfig::default());
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.cost.to_bits(), b.cost.to_bits());
    }
}
