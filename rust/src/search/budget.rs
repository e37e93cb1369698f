//! Termination tracking shared by the search drivers.

use std::time::Instant;

/// Why a search loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    IterationCap,
    NoImprovement,
    Deadline,
    /// Every candidate move was tabu or none existed
    NoMove,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IterationCap => "iteration_cap",
            Self::NoImprovement => "no_improvement",
            Self::Deadline => "deadline",
            Self::NoMove => "no_move",
        }
    }
}

/// Iteration cap, non-improvement cap and wall-clock deadline, whichever comes first.
#[derive(Clone, Debug)]
pub struct Budget {
    max_iterations: usize,
    max_no_improvement: Option<usize>,
    deadline: Option<Instant>,
    iterations: usize,
    stale: usize,
}

impl Budget {
    pub fn new(
        max_iterations: usize,
        max_no_improvement: Option<usize>,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            max_iterations,
            max_no_improvement,
            deadline,
            iterations: 0,
            stale: 0,
        }
    }

    /// Count one finished iteration.
    pub fn record(&mut self, improved: bool) {
        self.iterations += 1;
        if improved {
            self.stale = 0;
        } else {
            self.stale += 1;
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Reason to stop before starting another iteration, if any.
    pub fn exhausted(&self) -> Option<StopReason> {
        if self.iterations >= self.max_iterations {
            return Some(StopReason::IterationCap);
        }
        if let Some(cap) = self.max_no_improvement {
            if self.stale >= cap {
                return Some(StopReason::NoImprovement);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(StopReason::Deadline),
            _ => None,
        }
    }
}
