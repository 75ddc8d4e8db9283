//! Parameter optimization.
//!
//! One generic [`grid_search`] does the work for every family; a
//! [`ParameterSpace`] only says which candidates exist and in what order.
//! Scoring a candidate is `generate` followed by `profit`.

pub mod search;
pub mod space;

pub use search::{grid_search, SearchOutcome};
pub use space::{round_to, IntRange, ParameterSpace, RealRange, MAX_CANDIDATES, REAL_STEP};

use crate::domain::PriceSeries;
use crate::signals::{generate, RuleParams};

/// Realized-profit score of one parameter tuple, or `None` when the tuple does
/// not fit the series.
pub fn score(series: &PriceSeries, params: &RuleParams) -> Option<f64> {
    generate(series, params, 1).map(|history| history.profit())
}

/// Grid-search executor.
///
/// Evaluation runs on the rayon pool by default; results are identical either
/// way.
#[derive(Debug, Clone)]
pub struct Optimizer {
    parallel: bool,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Find the best-scoring tuple in `space` for `series`.
    ///
    /// Falls back to the family's default tuple with score 0 when nothing
    /// scores strictly above zero.
    pub fn optimize(&self, series: &PriceSeries, space: &ParameterSpace) -> SearchOutcome<RuleParams> {
        let candidates = space.candidates();
        grid_search(
            &candidates,
            space.family().default_params(),
            |params| score(series, params),
            self.parallel,
        )
    }
}
