//! Exhaustive search over an ordered candidate list.

use rayon::prelude::*;
use serde::Serialize;

/// Winner of a grid search plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome<P> {
    pub best_score: f64,
    pub best_params: P,
    /// Candidates that produced a score.
    pub evaluated: usize,
    /// Candidates the scorer rejected as "no result".
    pub skipped: usize,
}

/// Score every candidate and keep the best.
///
/// The running best starts at `(0.0, fallback)` and only moves on a strictly
/// greater score, so the earliest candidate reaching the maximum wins ties and
/// a space where nothing beats zero returns the fallback. `score` returning
/// `None` means "no result" and is never treated as a zero.
///
/// With `parallel` set, scoring fans out over the rayon pool; scores are still
/// collected in candidate order and reduced sequentially, so both modes return
/// the same winner.
pub fn grid_search<P, F>(candidates: &[P], fallback: P, score: F, parallel: bool) -> SearchOutcome<P>
where
    P: Clone + Send + Sync,
    F: Fn(&P) -> Option<f64> + Send + Sync,
{
    let scores: Vec<Option<f64>> = if parallel {
        candidates.par_iter().map(&score).collect()
    } else {
        candidates.iter().map(&score).collect()
    };

    let mut outcome = SearchOutcome {
        best_score: 0.0,
        best_params: fallback,
        evaluated: 0,
        skipped: 0,
    };

    for (candidate, score) in candidates.iter().zip(scores) {
        match score {
            Some(s) => {
                outcome.evaluated += 1;
                if s > outcome.best_score {
                    outcome.best_score = s;
                    outcome.best_params = candidate.clone();
                }
            }
            None => outcome.skipped += 1,
        }
    }

    outcome
}
