//! # Minimum Run Count Module
//!
//! The number of model evaluations a search curve needs depends on the
//! highest frequency assigned to it: every harmonic examined must stay
//! below the Nyquist limit. The eFAST frequency assignment and the engine's
//! length checks consult a [`MinimumRuns`] lookup rather than a fixed table,
//! so a caller can substitute a published table of their own.

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{FastError, Result};
use crate::frequency::classic_frequency_set;
use crate::{DEFAULT_HARMONIC_ORDER, MAX_PARAMS};

/// Floor on the sample count of any search curve (Saltelli et al. 1999).
pub const MIN_SAMPLES_PER_CURVE: usize = 65;

/// Lookup of the minimum number of model runs for a given factor count.
pub trait MinimumRuns: Send + Sync {
    fn minimum_runs(&self, num_params: usize) -> Result<usize>;
}

impl<F> MinimumRuns for F
where
    F: Fn(usize) -> Result<usize> + Send + Sync,
{
    fn minimum_runs(&self, num_params: usize) -> Result<usize> {
        self(num_params)
    }
}

/// Minimum runs derived from the Cukier frequency tables.
///
/// Entry `n` is `2 * M * max(ω) + 1` over the classic frequencies for `n`
/// factors with `M = 4`, raised to [`MIN_SAMPLES_PER_CURVE`]. Every entry
/// is odd.
#[derive(Debug, Clone, Copy, Default)]
pub struct CukierRuns;

/// Computed once on first use; index 0 corresponds to one factor.
static CUKIER_RUNS: Lazy<Vec<usize>> = Lazy::new(|| {
    (1..=MAX_PARAMS)
        .map(|num_params| {
            let highest = classic_frequency_set(num_params, DEFAULT_HARMONIC_ORDER)
                .ok()
                .and_then(|set| set.into_iter().max())
                .unwrap_or(0);
            (2 * DEFAULT_HARMONIC_ORDER * highest + 1).max(MIN_SAMPLES_PER_CURVE)
        })
        .collect()
});

impl MinimumRuns for CukierRuns {
    fn minimum_runs(&self, num_params: usize) -> Result<usize> {
        if num_params == 0 || num_params > MAX_PARAMS {
            return Err(FastError::domain(format!(
                "no minimum run count for {num_params} factors (supported: 1..={MAX_PARAMS})"
            )));
        }
        let runs = CUKIER_RUNS[num_params - 1];
        debug!(num_params, runs, "minimum runs lookup");
        Ok(runs)
    }
}
