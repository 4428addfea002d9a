//! Tunable parameters for the motif finders.

use std::time::Duration;
use std::time::Instant;

use super::pwm::DEFAULT_PSEUDOCOUNT;

/// The default number of independent Gibbs trials.
pub const DEFAULT_GIBBS_TRIALS: usize = 10;

/// The default number of independent EM trials.
pub const DEFAULT_EM_TRIALS: usize = 100;

/// The default wall-clock budget of a single Gibbs trial.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// The default convergence threshold of the EM finder.
pub const DEFAULT_EPSILON: f64 = 0.01;

// --- Budget ------------------------------------------------------------------

/// The amount of work a single Gibbs trial may perform before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Stop after the given wall-clock duration.
    Timeout(Duration),
    /// Stop after the given number of refinement passes.
    Passes(usize),
    /// Never stop before converging.
    Unlimited,
}

impl Budget {
    /// Check whether the budget is exhausted.
    pub fn exhausted(&self, passes: usize, started: Instant) -> bool {
        match *self {
            Budget::Timeout(timeout) => started.elapsed() > timeout,
            Budget::Passes(max) => passes >= max,
            Budget::Unlimited => false,
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Budget::Timeout(DEFAULT_TIMEOUT)
    }
}

impl From<Duration> for Budget {
    fn from(timeout: Duration) -> Self {
        Budget::Timeout(timeout)
    }
}

// --- GibbsConfig -------------------------------------------------------------

/// Parameters of the Gibbs sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct GibbsConfig {
    /// The frequency replacing zero cells of leave-one-out matrices.
    pub pseudocount: f64,
    /// The budget of every trial.
    pub budget: Budget,
}

impl GibbsConfig {
    /// Use a different pseudocount.
    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    /// Use a different budget.
    pub fn with_budget<B: Into<Budget>>(mut self, budget: B) -> Self {
        self.budget = budget.into();
        self
    }
}

impl Default for GibbsConfig {
    fn default() -> Self {
        Self {
            pseudocount: DEFAULT_PSEUDOCOUNT,
            budget: Budget::default(),
        }
    }
}

// --- EmConfig ----------------------------------------------------------------

/// Parameters of the expectation-maximization finder.
#[derive(Debug, Clone, PartialEq)]
pub struct EmConfig {
    /// The belief difference under which the search has converged.
    pub epsilon: f64,
    /// The count added to every expected count in the M-step.
    pub pseudocount: f64,
    /// An optional cap on the number of E/M iterations.
    pub max_iterations: Option<usize>,
}

impl EmConfig {
    /// Use a different convergence threshold.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Use a different M-step pseudocount.
    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    /// Cap the number of iterations of a single run.
    pub fn with_max_iterations<N: Into<Option<usize>>>(mut self, max: N) -> Self {
        self.max_iterations = max.into();
        self
    }
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            pseudocount: 1.0,
            max_iterations: None,
        }
    }
}
