//! # Frequency Assignment Module
//!
//! Every factor oscillates along the search curve at its own integer
//! frequency. The frequencies are chosen so that, up to the harmonic order
//! examined, no factor's harmonics land on another factor's bins.
//!
//! ## Features
//! - Classic FAST: one shared frequency set built from Cukier et al. (1975), Table VI
//! - eFAST: one frequency set per factor, each with a dedicated search frequency

use tracing::debug;

use crate::error::{FastError, Result};
use crate::runs::{CukierRuns, MinimumRuns};
use crate::MAX_PARAMS;

/// Integer angular frequencies, one per factor.
pub type FrequencySet = Vec<usize>;

/// Cukier et al. 1975, Table VI, Omega_n column.
pub const CUKIER_FREQUENCIES: [usize; 50] = [
    0, 0, 1, 5, 11, 1, 17, 23, 19, 25, 41, 31, 23, 87, 67, 73, 58, 143, 149, 99, 119, 237, 267,
    283, 151, 385, 157, 215, 449, 163, 337, 253, 375, 441, 673, 773, 875, 873, 587, 849, 623, 637,
    891, 943, 1171, 1225, 1335, 1725, 1663, 2019,
];

/// Cukier et al. 1975, Table VI, d_n column.
pub const CUKIER_FREQ_OFFSETS: [usize; 49] = [
    4, 8, 6, 10, 20, 22, 32, 40, 38, 26, 56, 62, 46, 76, 96, 60, 86, 126, 134, 112, 92, 128, 154,
    196, 34, 416, 106, 208, 328, 198, 382, 88, 348, 186, 140, 170, 284, 568, 302, 438, 410, 248,
    448, 388, 596, 217, 100, 488, 166,
];

pub(crate) fn check_args(num_params: usize, harmonic_order: usize) -> Result<()> {
    if num_params == 0 || num_params > MAX_PARAMS {
        return Err(FastError::domain(format!(
            "num_params {num_params} is outside the supported range 1..={MAX_PARAMS}"
        )));
    }
    if harmonic_order == 0 {
        return Err(FastError::domain("harmonic order must be at least 1"));
    }
    Ok(())
}

/// Builds the classic FAST frequency set for `num_params` factors.
///
/// The first factor takes `CUKIER_FREQUENCIES[num_params - 1]`; factor `i`
/// (1-based, `i >= 2`) takes the previous frequency plus
/// `CUKIER_FREQ_OFFSETS[num_params - i]`.
///
/// The harmonic order does not change the assignment, it is only validated.
pub fn classic_frequency_set(num_params: usize, harmonic_order: usize) -> Result<FrequencySet> {
    check_args(num_params, harmonic_order)?;

    let mut omega = CUKIER_FREQUENCIES[num_params - 1];
    let mut frequencies = Vec::with_capacity(num_params);
    frequencies.push(omega);
    for i in 2..=num_params {
        omega += CUKIER_FREQ_OFFSETS[num_params - i];
        frequencies.push(omega);
    }
    Ok(frequencies)
}

/// Builds the eFAST frequency sets using the bundled [`CukierRuns`] table.
pub fn efast_frequency_sets(num_params: usize, harmonic_order: usize) -> Result<Vec<FrequencySet>> {
    efast_frequency_sets_with(&CukierRuns, num_params, harmonic_order)
}

/// Builds the eFAST frequency sets, one per factor.
///
/// Set `i` gives factor `i` the search frequency `ω₀` and every other factor
/// a low complementary frequency, keeping the complementary list in order
/// around position `i`.
///
/// # Arguments
/// * `runs` - Minimum sample-count lookup used to size the search frequency
/// * `num_params` - Number of factors (1..=49)
/// * `harmonic_order` - Number of harmonics that must stay free of interference
pub fn efast_frequency_sets_with<R: MinimumRuns + ?Sized>(
    runs: &R,
    num_params: usize,
    harmonic_order: usize,
) -> Result<Vec<FrequencySet>> {
    check_args(num_params, harmonic_order)?;

    let num_samples = runs.minimum_runs(num_params)?;
    let search = search_frequency(num_samples, harmonic_order)?;
    let m = search / double_order(harmonic_order)?;

    let others = num_params - 1;
    let complementary: Vec<usize> = if m >= others {
        linear_spread(m, others)
    } else {
        // Not enough room below ω₀; reuse low frequencies.
        (0..others).map(|j| (j % num_params) + 1).collect()
    };

    debug!(num_params, num_samples, search, m, ?complementary, "eFAST frequencies");

    let sets = (0..num_params)
        .map(|i| {
            (0..num_params)
                .map(|j| match j.cmp(&i) {
                    std::cmp::Ordering::Equal => search,
                    std::cmp::Ordering::Less => complementary[j],
                    std::cmp::Ordering::Greater => complementary[j - 1],
                })
                .collect()
        })
        .collect();
    Ok(sets)
}

/// Search frequency `ω₀ = ⌊(N - 1) / 2M⌋` for a curve of `num_samples` runs.
pub fn search_frequency(num_samples: usize, harmonic_order: usize) -> Result<usize> {
    if harmonic_order == 0 {
        return Err(FastError::domain("harmonic order must be at least 1"));
    }
    let search = num_samples.saturating_sub(1) / double_order(harmonic_order)?;
    if search == 0 {
        return Err(FastError::domain(format!(
            "{num_samples} samples leave no search frequency for harmonic order {harmonic_order}"
        )));
    }
    Ok(search)
}

/// `2M`, rejecting orders too large to double.
fn double_order(harmonic_order: usize) -> Result<usize> {
    harmonic_order.checked_mul(2).ok_or_else(|| {
        FastError::domain(format!("harmonic order {harmonic_order} is too large"))
    })
}

/// `count` evenly spaced integers from 1 to `end` inclusive, floored.
fn linear_spread(end: usize, count: usize) -> Vec<usize> {
    match count {
        0 => Vec::new(),
        1 => vec![1],
        _ => (0..count)
            .map(|j| 1 + (end - 1) * j / (count - 1))
            .collect(),
    }
}
