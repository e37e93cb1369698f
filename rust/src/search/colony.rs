//! Ant-colony driver.
//!
//! Every ant builds a full solution scene by scene, picking each date with
//! probability proportional to `pheromone^alpha * heuristic^beta`. The
//! heuristic prefers early dates on which the scene still fits. Once all ants
//! of an iteration are done the table evaporates and each ant deposits
//! `1 / (cost + 0.1)` on the (scene, date) pairs it used.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{usable_seed, Budget, SearchContext, SearchOutcome, SearchStrategy};
use crate::config::ColonyConfig;
use crate::evaluate::evaluate;
use crate::models::Algorithm;
use crate::problem::Problem;
use crate::repair::repair;
use crate::solution::Solution;
use crate::timeline::DayBook;
use crate::{log_changes, log_checks, log_debug};

/// Pheromone weight per (scene, day), stored row-major by scene.
#[derive(Clone, Debug, Default)]
pub struct PheromoneTable {
    days: usize,
    values: Vec<f64>,
}

impl PheromoneTable {
    pub fn new(scenes: usize, days: usize, initial: f64) -> Self {
        Self {
            days,
            values: vec![initial; scenes * days],
        }
    }

    pub fn get(&self, scene: usize, day: u32) -> f64 {
        self.values
            .get(scene * self.days + day as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Multiply every cell by `1 - rate`, never going below `floor`.
    pub fn evaporate(&mut self, rate: f64, floor: f64) {
        for value in &mut self.values {
            *value = (*value * (1.0 - rate)).max(floor);
        }
    }

    /// Add `amount` to every (scene, day) pair used by `solution`.
    pub fn deposit(&mut self, solution: &Solution, amount: f64) {
        for (scene, slot) in solution.slots().iter().enumerate() {
            if (slot.day as usize) < self.days {
                if let Some(value) = self.values.get_mut(scene * self.days + slot.day as usize) {
                    *value += amount;
                }
            }
        }
    }
}

pub struct AntColony {
    config: ColonyConfig,
    pheromone: PheromoneTable,
}

impl AntColony {
    pub fn new(config: ColonyConfig) -> Self {
        Self {
            config,
            pheromone: PheromoneTable::default(),
        }
    }

    pub fn pheromone(&self) -> &PheromoneTable {
        &self.pheromone
    }

    /// One ant's walk: visit scenes in random order and pick a date for each.
    fn construct<R: Rng>(&self, problem: &Problem, rng: &mut R) -> Solution {
        let scene_count = problem.scene_count();
        let day_count = problem.day_count() as u32;
        let mut order: Vec<usize> = (0..scene_count).collect();
        order.shuffle(rng);

        let mut books = vec![DayBook::new(); day_count as usize];
        let mut days = vec![0u32; scene_count];

        for scene in order {
            let data = problem.scene(scene);
            let candidates = problem.feasible_days(scene);

            let day = if candidates.is_empty() {
                // Nothing is available: any date, repair and the evaluator sort it out
                rng.gen_range(0..day_count)
            } else {
                let weights: Vec<f64> = candidates
                    .iter()
                    .map(|&day| {
                        let (open, close) = problem.bounds(scene, day);
                        let crowded = books[day as usize]
                            .earliest_slot(&data.resources, open, close, data.duration)
                            .is_none();
                        let penalty = if crowded { day_count as f64 } else { 0.0 };
                        let heuristic = 1.0 / (1.0 + day as f64 + penalty);
                        self.pheromone.get(scene, day).powf(self.config.alpha)
                            * heuristic.powf(self.config.beta)
                    })
                    .collect();
                match roulette(&weights, rng) {
                    Some(i) => candidates[i],
                    None => candidates[rng.gen_range(0..candidates.len())],
                }
            };

            let (open, close) = problem.bounds(scene, day);
            let book = &mut books[day as usize];
            if let Some(start) = book.earliest_slot(&data.resources, open, close, data.duration) {
                book.reserve(&data.resources, start, start + data.duration);
            }
            days[scene] = day;
        }

        let mut solution = Solution::from_days(&days);
        repair(problem, &mut solution);
        solution
    }
}

/// Index drawn with probability proportional to its weight.
///
/// `None` when the weights do not form a usable distribution.
fn roulette<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let mut target = rng.gen::<f64>() * total;
    for (i, &weight) in weights.iter().enumerate() {
        if target < weight {
            return Some(i);
        }
        target -= weight;
    }
    // Rounding can leave the target just past the last bucket
    weights.iter().rposition(|&w| w > 0.0)
}

impl SearchStrategy for AntColony {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AntColony
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
        let ants = self.config.ant_count(problem.scene_count());
        self.pheromone = PheromoneTable::new(
            problem.scene_count(),
            problem.day_count(),
            self.config.initial_pheromone,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);

        let mut best = seed.clone();
        repair(problem, &mut best);
        let mut best_cost = evaluate(problem, &best);
        let mut history = vec![best_cost];
        let mut budget = Budget::new(
            self.config.max_iterations,
            self.config.max_no_improvement,
            ctx.deadline,
        );

        log_changes!(
            verbosity,
            "ant colony: {} ants, {} scenes, {} days, seed cost {:.2}",
            ants,
            problem.scene_count(),
            problem.day_count(),
            best_cost
        );

        let stop = loop {
            if let Some(reason) = budget.exhausted() {
                break reason;
            }

            // Ants read the table but never write it until the whole batch is done
            let seeds: Vec<u64> = (0..ants).map(|_| rng.gen()).collect();
            let colony = &*self;
            let tours: Vec<(Solution, f64)> = seeds
                .par_iter()
                .map(|&ant_seed| {
                    let mut ant_rng = ChaCha8Rng::seed_from_u64(ant_seed);
                    let solution = colony.construct(problem, &mut ant_rng);
                    let cost = evaluate(problem, &solution);
                    (solution, cost)
                })
                .collect();

            self.pheromone
                .evaporate(self.config.evaporation_rate, self.config.min_pheromone);
            for (solution, cost) in &tours {
                self.pheromone.deposit(solution, 1.0 / (cost + 0.1));
            }
            log_debug!(
                verbosity,
                "ant colony: iteration {} deposited {} tours",
                budget.iterations() + 1,
                tours.len()
            );

            let mut improved = false;
            let iteration_best = tours
                .into_iter()
                .enumerate()
                .min_by(|a, b| a.1 .1.total_cmp(&b.1 .1).then(a.0.cmp(&b.0)));
            if let Some((ant, (solution, cost))) = iteration_best {
                if cost < best_cost {
                    best = solution;
                    best_cost = cost;
                    improved = true;
                    log_checks!(
                        verbosity,
                        "ant colony: new best {:.2} from ant {} at iteration {}",
                        best_cost,
                        ant,
                        budget.iterations() + 1
                    );
                }
            }
            budget.record(improved);
            history.push(best_cost);
        };

        log_changes!(
            verbosity,
            "ant colony: stopped ({}) after {} iterations, best cost {:.2}",
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
    use crate::builder::build_initial;
    use crate::fixtures::{count_overlaps, d, make_input, make_mixed_input, make_problem};
    use crate::models::AvailabilityCalendar;
    use crate::search::StopReason;

    #[test]
    fn test_pheromone_evaporation_has_a_floor() {
        let mut table = PheromoneTable::new(2, 3, 1.0);
        table.evaporate(0.5, 0.3);
        assert_eq!(table.get(0, 0), 0.5);
        table.evaporate(0.5, 0.3);
        assert_eq!(table.get(1, 2), 0.3);
    }

    #[test]
    fn test_pheromone_deposit_on_used_pairs() {
        let mut table = PheromoneTable::new(2, 3, 1.0);
        table.deposit(&Solution::from_days(&[2, 0]), 0.25);
        assert_eq!(table.get(0, 2), 1.25);
        assert_eq!(table.get(1, 0), 1.25);
        assert_eq!(table.get(0, 0), 1.0);
        // Out-of-range days are ignored
        table.deposit(&Solution::from_days(&[7, 0]), 1.0);
        assert_eq!(table.get(1, 0), 2.25);
    }

    #[test]
    fn test_roulette() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(roulette(&[0.0, 0.0], &mut rng), None);
        assert_eq!(roulette(&[f64::NAN, 1.0], &mut rng), None);
        for _ in 0..50 {
            assert_eq!(roulette(&[0.0, 2.0, 0.0], &mut rng), Some(1));
        }
    }

    #[test]
    fn test_ants_only_pick_available_days() {
        let problem = make_problem(&make_input());
        let colony = AntColony {
            config: ColonyConfig::default(),
            pheromone: PheromoneTable::new(3, 5, 1.0),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            let solution = colony.construct(&problem, &mut rng);
            assert!(solution.days().iter().all(|day| [0, 2, 4].contains(day)));
            assert_eq!(count_overlaps(&problem, &solution), 0);
        }
    }

    #[test]
    fn test_ants_without_feasible_days_still_assign() {
        let mut input = make_input();
        let everything: Vec<_> = (1..=5).map(|day| d(2025, 1, day)).collect();
        input.actor_availability.insert(
            "lead".to_string(),
            AvailabilityCalendar::new().unavailable_on(everything),
        );
        let problem = make_problem(&input);
        let colony = AntColony {
            config: ColonyConfig::default(),
            pheromone: PheromoneTable::new(3, 5, 1.0),
        };
        let solution = colony.construct(&problem, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(solution.len(), 3);
        assert!(solution.slots().iter().all(|slot| !slot.is_pending()));
    }

    #[test]
    fn test_pheromone_concentrates_on_good_days() {
        let problem = make_problem(&make_input());
        let mut colony = AntColony::new(ColonyConfig::default());
        let outcome = colony
            .search(&problem, &build_initial(&problem), &SearchContext::new(42, None))
            .unwrap();
        assert!(outcome.cost <= 1600.0);
        assert_eq!(outcome.stop, StopReason::IterationCap);
        assert!(colony.pheromone().get(0, 0) > colony.pheromone().get(0, 4));
    }

    #[test]
    fn test_optional_early_exit() {
        let problem = make_problem(&make_input());
        let mut colony = AntColony::new(ColonyConfig {
            max_no_improvement: Some(4),
            ..Default::default()
        });
        let outcome = colony
            .search(&problem, &build_initial(&problem), &SearchContext::new(42, None))
            .unwrap();
        assert_eq!(outcome.stop, StopReason::NoImprovement);
        assert_eq!(outcome.iterations, 4);
    }

    #[test]
    fn test_best_cost_never_increases() {
        let problem = make_problem(&make_mixed_input(9));
        let mut colony = AntColony::new(ColonyConfig {
            max_iterations: 30,
            ..Default::default()
        });
        let days: Vec<u32> = (0..9).map(|i| 18 - i).collect();
        let outcome = colony
            .search(&problem, &Solution::from_days(&days), &SearchContext::new(9, None))
            .unwrap();
        assert!(outcome.history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(count_overlaps(&problem, &outcome.solution), 0);
    }
}
