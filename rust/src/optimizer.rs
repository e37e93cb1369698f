//! The `optimize` entry point and its tiered fallback policy.
//!
//! The call always returns a structurally valid [`Schedule`]:
//!
//! 1. the requested strategy's best solution;
//! 2. if the strategy produced nothing usable, the builder's initial solution;
//! 3. if not even that could be built, a single-scene placeholder.
//!
//! The tier that produced the result is recorded in `algorithm_used` and in
//! the `fallback_tier` metadata entry.

use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, warn};

use crate::builder::build_initial;
use crate::config::OptimizerConfig;
use crate::evaluate::breakdown;
use crate::formatter::{format_schedule, time_of};
use crate::log_changes;
use crate::logging::run_span;
use crate::models::{
    Algorithm, FallbackTier, Schedule, ScheduleInput, ScheduledScene, UnknownAlgorithm,
};
use crate::problem::Problem;
use crate::search::{strategy_for, SearchContext, SearchOutcome, SearchStrategy};
use crate::solution::Solution;

/// Optimize `input` with `algorithm`.
pub fn optimize(input: &ScheduleInput, algorithm: Algorithm, config: &OptimizerConfig) -> Schedule {
    let config = effective_config(config);
    let mut strategy = strategy_for(algorithm, &config);
    optimize_with(input, strategy.as_mut(), &config)
}

/// Optimize with an algorithm given by name or short code.
pub fn optimize_by_name(
    input: &ScheduleInput,
    algorithm: &str,
    config: &OptimizerConfig,
) -> Result<Schedule, UnknownAlgorithm> {
    let algorithm: Algorithm = algorithm.parse()?;
    Ok(optimize(input, algorithm, config))
}

/// Optimize with an already constructed strategy.
pub fn optimize_with(
    input: &ScheduleInput,
    strategy: &mut dyn SearchStrategy,
    config: &OptimizerConfig,
) -> Schedule {
    let started = Instant::now();
    let requested = strategy.algorithm();
    let _run = run_span(requested.as_str(), input.scenes.len(), config.seed).entered();

    if input.scenes.is_empty() {
        warn!(algorithm = requested.as_str(), "no scenes provided, returning an empty schedule");
        let mut schedule = Schedule::empty(requested.as_str());
        annotate(&mut schedule, requested, FallbackTier::Requested);
        return schedule;
    }
    if input.actors.is_empty() {
        warn!("no actors provided");
    }
    if input.locations.is_empty() {
        warn!("no locations provided");
    }

    let problem = match Problem::new(input, config) {
        Ok(problem) => problem,
        Err(e) => {
            error!(error = %e, "cannot build the problem, returning a placeholder schedule");
            return placeholder(input, config, requested);
        }
    };

    let seed = build_initial(&problem);
    // A limit too large to represent as an instant means no deadline
    let deadline = config
        .time_limit
        .and_then(|limit| started.checked_add(limit));
    let ctx = SearchContext::new(config.seed, deadline);

    log_changes!(
        config.verbosity,
        "optimizing {} scenes over {} days with {}",
        problem.scene_count(),
        problem.day_count(),
        requested
    );

    let outcome = strategy
        .search(&problem, &seed, &ctx)
        .filter(|outcome| is_usable(&problem, outcome));

    let (solution, tier, iterations, stop) = match outcome {
        Some(outcome) => (
            outcome.solution,
            FallbackTier::Requested,
            outcome.iterations,
            Some(outcome.stop),
        ),
        None => {
            warn!(
                algorithm = requested.as_str(),
                "search produced no usable solution, falling back to the initial solution"
            );
            (seed, FallbackTier::InitialSolution, 0, None)
        }
    };

    let algorithm_used = match tier {
        FallbackTier::Requested => requested.as_str(),
        other => other.as_str(),
    };
    let mut schedule = format_schedule(&problem, &solution, algorithm_used);
    if schedule.is_empty() {
        error!(
            algorithm = algorithm_used,
            "schedule lost every scene while formatting, returning a placeholder"
        );
        return placeholder(input, config, requested);
    }

    annotate(&mut schedule, requested, tier);
    record_quality(&mut schedule, &problem, &solution);
    schedule
        .metadata
        .insert("iterations".to_string(), iterations.to_string());
    if let Some(stop) = stop {
        schedule
            .metadata
            .insert("stop_reason".to_string(), stop.as_str().to_string());
    }
    schedule.metadata.insert(
        "elapsed_ms".to_string(),
        started.elapsed().as_millis().to_string(),
    );

    log_changes!(
        config.verbosity,
        "{}: {} scenes on {} days, total cost {:.2}",
        schedule.algorithm_used,
        schedule.assignments.len(),
        schedule.total_days,
        schedule.total_cost
    );
    schedule
}

/// The configuration actually used: invalid settings fall back to the defaults.
fn effective_config(config: &OptimizerConfig) -> OptimizerConfig {
    match config.validate() {
        Ok(()) => config.clone(),
        Err(e) => {
            warn!(error = %e, "invalid optimizer configuration, using defaults");
            OptimizerConfig {
                seed: config.seed,
                time_limit: config.time_limit,
                verbosity: config.verbosity,
                ..Default::default()
            }
        }
    }
}

fn is_usable(problem: &Problem, outcome: &SearchOutcome) -> bool {
    outcome.cost.is_finite() && outcome.solution.len() == problem.scene_count()
}

fn annotate(schedule: &mut Schedule, requested: Algorithm, tier: FallbackTier) {
    let metadata = &mut schedule.metadata;
    metadata.insert(
        "requested_algorithm".to_string(),
        requested.as_str().to_string(),
    );
    metadata.insert("algorithm_code".to_string(), requested.code().to_string());
    metadata.insert("fallback_tier".to_string(), tier.as_str().to_string());
}

fn record_quality(schedule: &mut Schedule, problem: &Problem, solution: &Solution) {
    let cost = breakdown(problem, solution);
    let metadata = &mut schedule.metadata;
    metadata.insert("fitness".to_string(), format!("{:.2}", cost.total()));
    metadata.insert("residual_conflicts".to_string(), cost.conflicts.to_string());
    metadata.insert(
        "availability_violations".to_string(),
        cost.unavailable.to_string(),
    );
}

/// Minimal schedule: the first scene on the start date at the start of the day.
fn placeholder(input: &ScheduleInput, config: &OptimizerConfig, requested: Algorithm) -> Schedule {
    let tier = FallbackTier::Placeholder;
    let mut schedule = Schedule::empty(tier.as_str());
    annotate(&mut schedule, requested, tier);

    let Some(scene) = input.scenes.first() else {
        return schedule;
    };
    let day_start = config.day_start_minutes();
    let day_end = config.day_end_minutes().max(day_start + 1);
    let hours = if scene.duration_hours.is_finite() && scene.duration_hours > 0.0 {
        scene.duration_hours
    } else {
        1.0
    };
    let minutes = ((hours * 60.0).round() as u32).clamp(1, day_end - day_start);

    let (Some(start_time), Some(end_time)) = (time_of(day_start), time_of(day_start + minutes))
    else {
        return schedule;
    };

    let rate_of = |rates: &HashMap<&str, f64>, id: &str| rates.get(id).copied().unwrap_or(0.0);
    // Reversed so the first record of a duplicated id wins
    let actor_rates: HashMap<&str, f64> = input
        .actors
        .iter()
        .rev()
        .map(|a| (a.id.as_str(), a.daily_rate.max(0.0)))
        .collect();
    let location_rates: HashMap<&str, f64> = input
        .locations
        .iter()
        .rev()
        .map(|l| (l.id.as_str(), l.daily_rate.max(0.0)))
        .collect();
    let mut actors: Vec<&str> = scene
        .actor_ids
        .iter()
        .chain(input.scene_actor_links.get(&scene.id).into_iter().flatten())
        .map(String::as_str)
        .collect();
    actors.sort_unstable();
    actors.dedup();
    let cost: f64 = actors.iter().map(|id| rate_of(&actor_rates, id)).sum::<f64>()
        + scene
            .location_id
            .as_deref()
            .map(|id| rate_of(&location_rates, id))
            .unwrap_or(0.0);
    let cost = if cost.is_finite() { cost } else { 0.0 };

    schedule.assignments.push(ScheduledScene {
        scene_id: scene.id.clone(),
        date: input.start_date,
        start_time,
        end_time,
        cost,
    });
    schedule.total_cost = cost;
    schedule.total_days = 1;
    schedule
        .metadata
        .insert("span_days".to_string(), "1".to_string());
    schedule
}
