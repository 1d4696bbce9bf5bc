//! # Spectral Sensitivity Module
//!
//! Turns model outputs sampled along a search curve into sensitivity
//! indices by reading each factor's share of the output variance off the
//! power spectrum.
//!
//! ## Methods
//! - Classic FAST: the half-period series is mirrored, transformed once, and
//!   each factor collects the power at the first `M` harmonics of its frequency.
//! - eFAST: one run per factor. The first-order index collects the power at
//!   harmonics of the search frequency; the total-order index is the complement
//!   of the power found below half the search frequency.

use tracing::debug;

use crate::error::{FastError, Result};
use crate::fft::{extend, perform_fft, remove_dc_offset, spectrum_to_magnitudes};
use crate::frequency::{self, FrequencySet, classic_frequency_set, efast_frequency_sets_with};
use crate::report::{FactorSensitivity, SensitivityReport};
use crate::runs::{CukierRuns, MinimumRuns};
use crate::DEFAULT_HARMONIC_ORDER;

/// Rejects a total variance that is not positive or that sits at the
/// rounding floor of the transform (`n * ε²` of the squared mean).
fn check_variance(total_variance: f64, mean: f64, n: usize) -> Result<()> {
    let floor = n as f64 * f64::EPSILON * f64::EPSILON * mean * mean;
    // Written as a negation so that NaN is rejected too.
    if !(total_variance > 0.0 && total_variance > floor) {
        return Err(FastError::DegenerateInput { total_variance });
    }
    Ok(())
}

fn check_harmonic_order(harmonic_order: usize) -> Result<()> {
    if harmonic_order == 0 {
        return Err(FastError::domain("harmonic order must be at least 1"));
    }
    Ok(())
}

/// Computes classic FAST indices, one per factor in factor order.
///
/// 1. The outputs are centered, mirrored with [`extend`] and transformed.
/// 2. Magnitudes are divided by the original sample count `n` and only
///    bins `0..=n` are kept.
/// 3. Total variance is the squared magnitude summed over bins `1..=n`.
/// 4. Each factor sums the squared magnitude at `f, 2f, ..., Mf`. Harmonics
///    beyond the kept bins are dropped, as is the DC bin for a zero frequency.
///
/// # Errors
/// * `Domain` - `num_params` outside `1..=49` or `harmonic_order == 0`
/// * `Shape` - empty `model_outputs`
/// * `DegenerateInput` - the outputs do not vary
pub fn classic_sensitivities(
    model_outputs: &[f64],
    num_params: usize,
    harmonic_order: usize,
) -> Result<Vec<f64>> {
    let frequencies = classic_frequency_set(num_params, harmonic_order)?;
    classic_with_frequencies(model_outputs, &frequencies, harmonic_order)
}

fn classic_with_frequencies(
    model_outputs: &[f64],
    frequencies: &[usize],
    harmonic_order: usize,
) -> Result<Vec<f64>> {
    let n = model_outputs.len();
    if n == 0 {
        return Err(FastError::shape("model outputs", "at least one sample", 0));
    }

    let mut centered = model_outputs.to_vec();
    let mean = remove_dc_offset(&mut centered);
    let spectrum = perform_fft(&extend(&centered));
    let mut magnitudes = spectrum_to_magnitudes(&spectrum, n as f64);
    magnitudes.truncate(n + 1);
    let num_bins = magnitudes.len();

    let total: f64 = magnitudes[1..].iter().map(|m| m * m).sum();
    check_variance(total, mean, n)?;
    debug!(n, num_bins, total, "classic FAST spectrum");

    let indices = frequencies
        .iter()
        .map(|&frequency| {
            // Harmonic bins only grow, so stop at the first one out of range.
            // A zero frequency stays on the DC bin and contributes nothing.
            let power: f64 = (1..=harmonic_order)
                .map_while(|p| frequency.checked_mul(p))
                .take_while(|&bin| bin > 0 && bin < num_bins)
                .map(|bin| magnitudes[bin] * magnitudes[bin])
                .sum();
            power / total
        })
        .collect();
    Ok(indices)
}

/// Normalized one-sided power of an unextended eFAST run.
struct HalfSpectrum {
    /// `|X_k|^2 / n^2` for bins `k = 1..n/2`; index `k - 1` holds bin `k`.
    lambda_sq: Vec<f64>,
    /// `2 * Σ lambda_sq`
    variance: f64,
    num_samples: usize,
}

impl HalfSpectrum {
    fn new(model_outputs: &[f64]) -> Result<Self> {
        let n = model_outputs.len();
        if n == 0 {
            return Err(FastError::shape("model outputs", "at least one sample", 0));
        }

        let mut centered = model_outputs.to_vec();
        let mean = remove_dc_offset(&mut centered);
        let spectrum = perform_fft(&centered);
        let scale = (n as f64) * (n as f64);
        let lambda_sq: Vec<f64> = spectrum
            .iter()
            .take(n / 2)
            .skip(1)
            .map(|c| c.norm_sqr() / scale)
            .collect();
        let variance = 2.0 * lambda_sq.iter().sum::<f64>();
        check_variance(variance, mean, n)?;
        debug!(n, bins = lambda_sq.len(), variance, "eFAST spectrum");

        Ok(Self {
            lambda_sq,
            variance,
            num_samples: n,
        })
    }

    /// `2 * Σ lambda_sq[k]` over `indices`, failing at the first index past the end.
    fn power_at(&self, indices: impl IntoIterator<Item = usize>) -> Result<f64> {
        let mut power = 0.0;
        for k in indices {
            let value = self.lambda_sq.get(k).ok_or_else(|| {
                // lambda_sq.len() = n/2 - 1, so index k needs n/2 >= k + 2
                let needed = k.saturating_add(2).saturating_mul(2);
                FastError::shape(
                    "model outputs",
                    format!("at least {needed} samples"),
                    self.num_samples,
                )
            })?;
            power += value;
        }
        Ok(2.0 * power)
    }

    /// Share of the variance at λ indices `pω - 1`, `p = 1..M`.
    fn first_order(&self, search_frequency: usize, harmonic_order: usize) -> Result<f64> {
        let indices = (1..harmonic_order).map(|p| {
            p.checked_mul(search_frequency)
                .map_or(usize::MAX, |bin| bin - 1)
        });
        Ok(self.power_at(indices)? / self.variance)
    }

    /// One minus the share of the variance at λ indices `0..⌊ω/2⌋`.
    fn total_order(&self, search_frequency: usize) -> Result<f64> {
        let dt = self.power_at(0..search_frequency / 2)?;
        Ok(1.0 - dt / self.variance)
    }
}

fn check_search_frequency(search_frequency: usize) -> Result<()> {
    if search_frequency == 0 {
        return Err(FastError::domain("search frequency must be positive"));
    }
    Ok(())
}

/// Computes the eFAST first-order index of the factor driven at `search_frequency`.
///
/// The numerator is `2 * Σ λ²` at λ indices `pω - 1` for `p = 1..M`
/// (bins `ω, 2ω, ..., (M-1)ω`); the denominator is `2 * Σ λ²` over every bin
/// from 1 to `n/2 - 1`.
///
/// # Errors
/// * `Domain` - `search_frequency == 0` or `harmonic_order == 0`
/// * `Shape` - the series is too short to hold the requested harmonics
/// * `DegenerateInput` - the outputs do not vary
pub fn efast_first_order(
    model_outputs: &[f64],
    search_frequency: usize,
    harmonic_order: usize,
) -> Result<f64> {
    check_search_frequency(search_frequency)?;
    check_harmonic_order(harmonic_order)?;
    HalfSpectrum::new(model_outputs)?.first_order(search_frequency, harmonic_order)
}

/// Computes the eFAST total-order index of the factor driven at `search_frequency`.
///
/// The power in λ indices `0..⌊ω/2⌋` (bins `1..=⌊ω/2⌋`) is attributed to
/// the other factors, which all oscillate below half the search frequency;
/// the index is one minus that share.
///
/// # Errors
/// Same as [`efast_first_order`].
pub fn efast_total_order(
    model_outputs: &[f64],
    search_frequency: usize,
    harmonic_order: usize,
) -> Result<f64> {
    check_search_frequency(search_frequency)?;
    check_harmonic_order(harmonic_order)?;
    HalfSpectrum::new(model_outputs)?.total_order(search_frequency)
}

/// Sensitivity engine with the minimum-run lookup injected.
///
/// The free functions above perform the bare index arithmetic. The engine
/// adds the checks that tie a series to a factor count: one odd-length
/// series per curve, each at least as long as the lookup demands.
#[derive(Debug, Clone)]
pub struct SensitivityEngine<R = CukierRuns> {
    runs: R,
    harmonic_order: usize,
}

impl Default for SensitivityEngine<CukierRuns> {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitivityEngine<CukierRuns> {
    /// Engine backed by the bundled [`CukierRuns`] table and `M = 4`.
    pub fn new() -> Self {
        Self::with_runs(CukierRuns)
    }
}

impl<R: MinimumRuns> SensitivityEngine<R> {
    pub fn with_runs(runs: R) -> Self {
        Self {
            runs,
            harmonic_order: DEFAULT_HARMONIC_ORDER,
        }
    }

    /// Sets the harmonic order `M` used by every analysis of this engine.
    pub fn with_harmonic_order(mut self, harmonic_order: usize) -> Result<Self> {
        check_harmonic_order(harmonic_order)?;
        self.harmonic_order = harmonic_order;
        Ok(self)
    }

    pub fn harmonic_order(&self) -> usize {
        self.harmonic_order
    }

    pub fn minimum_runs(&self, num_params: usize) -> Result<usize> {
        self.runs.minimum_runs(num_params)
    }

    pub fn classic_frequencies(&self, num_params: usize) -> Result<FrequencySet> {
        classic_frequency_set(num_params, self.harmonic_order)
    }

    pub fn efast_frequencies(&self, num_params: usize) -> Result<Vec<FrequencySet>> {
        efast_frequency_sets_with(&self.runs, num_params, self.harmonic_order)
    }

    /// Search frequency shared by every eFAST run for `num_params` factors.
    pub fn search_frequency(&self, num_params: usize) -> Result<usize> {
        frequency::check_args(num_params, self.harmonic_order)?;
        frequency::search_frequency(self.runs.minimum_runs(num_params)?, self.harmonic_order)
    }

    fn check_series(&self, model_outputs: &[f64], num_params: usize) -> Result<()> {
        let n = model_outputs.len();
        let minimum = self.runs.minimum_runs(num_params)?;
        if n < minimum {
            return Err(FastError::shape(
                "model outputs",
                format!("at least {minimum} samples for {num_params} factors"),
                n,
            ));
        }
        if n % 2 == 0 {
            return Err(FastError::shape("model outputs", "an odd number of samples", n));
        }
        Ok(())
    }

    /// Classic FAST indices after validating the series length.
    pub fn classic(&self, model_outputs: &[f64], num_params: usize) -> Result<Vec<f64>> {
        let frequencies = self.classic_frequencies(num_params)?;
        self.check_series(model_outputs, num_params)?;
        classic_with_frequencies(model_outputs, &frequencies, self.harmonic_order)
    }

    /// First- and total-order indices for one eFAST run.
    ///
    /// `factor` is the 1-based factor whose search curve produced `model_outputs`.
    pub fn efast_factor(
        &self,
        factor: usize,
        model_outputs: &[f64],
        search_frequency: usize,
    ) -> Result<FactorSensitivity> {
        check_search_frequency(search_frequency)?;
        let half = HalfSpectrum::new(model_outputs)?;
        let first_order = half.first_order(search_frequency, self.harmonic_order)?;
        let total_order = half.total_order(search_frequency)?;
        debug!(factor, first_order, total_order, "eFAST factor");
        Ok(FactorSensitivity {
            factor,
            first_order,
            total_order: Some(total_order),
        })
    }

    /// eFAST indices for every factor, given one run per factor in factor order.
    pub fn efast(
        &self,
        outputs_per_factor: &[Vec<f64>],
        num_params: usize,
    ) -> Result<Vec<FactorSensitivity>> {
        let search = self.prepare_efast(outputs_per_factor, num_params)?;
        outputs_per_factor
            .iter()
            .enumerate()
            .map(|(i, outputs)| self.efast_factor(i + 1, outputs, search))
            .collect()
    }

    /// Validates a set of eFAST runs and returns their search frequency.
    pub fn prepare_efast(&self, outputs_per_factor: &[Vec<f64>], num_params: usize) -> Result<usize> {
        let search = self.search_frequency(num_params)?;
        if outputs_per_factor.len() != num_params {
            return Err(FastError::shape(
                "eFAST runs",
                format!("one series per factor ({num_params})"),
                outputs_per_factor.len(),
            ));
        }
        for outputs in outputs_per_factor {
            self.check_series(outputs, num_params)?;
        }
        Ok(search)
    }

    /// Classic analysis packaged as a report.
    pub fn classic_report(&self, model_outputs: &[f64], num_params: usize) -> Result<SensitivityReport> {
        let indices = self.classic(model_outputs, num_params)?;
        Ok(SensitivityReport::from_classic(
            self.harmonic_order,
            model_outputs.len(),
            indices,
        ))
    }

    /// eFAST analysis packaged as a report.
    pub fn efast_report(
        &self,
        outputs_per_factor: &[Vec<f64>],
        num_params: usize,
    ) -> Result<SensitivityReport> {
        let factors = self.efast(outputs_per_factor, num_params)?;
        Ok(SensitivityReport::from_efast(
            self.harmonic_order,
            outputs_per_factor.first().map_or(0, Vec::len),
            factors,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    fn tone(n: usize, frequency: usize) -> Vec<f64> {
        (0..n)
            .map(|j| (2.0 * PI * frequency as f64 * j as f64 / n as f64).sin())
            .collect()
    }

    #[test]
    fn test_constant_outputs_are_degenerate() {
        let outputs = vec![5.0; 105];
        assert!(matches!(
            classic_sensitivities(&outputs, 3, 4),
            Err(FastError::DegenerateInput { .. })
        ));
        assert!(matches!(
            efast_first_order(&outputs, 13, 4),
            Err(FastError::DegenerateInput { .. })
        ));
        assert!(matches!(
            efast_total_order(&outputs, 13, 4),
            Err(FastError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_zero_outputs_are_degenerate() {
        let outputs = vec![0.0; 65];
        assert!(matches!(
            efast_first_order(&outputs, 8, 4),
            Err(FastError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_first_order_of_pure_tone() {
        let outputs = tone(65, 8);
        assert_approx_eq!(efast_first_order(&outputs, 8, 4).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(efast_total_order(&outputs, 8, 4).unwrap(), 1.0, 1e-9);
    }

    #[test]
    fn test_first_order_of_foreign_tone() {
        // A factor held at frequency 1 explains nothing at the search frequency.
        let outputs = tone(65, 1);
        assert_approx_eq!(efast_first_order(&outputs, 8, 4).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(efast_total_order(&outputs, 8, 4).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn test_first_order_counts_harmonics_below_m() {
        let fundamental = tone(129, 8);
        let third = tone(129, 24);
        let fourth = tone(129, 32);
        let outputs: Vec<f64> = (0..129)
            .map(|j| fundamental[j] + third[j] + fourth[j])
            .collect();
        // Bins 8 and 24 count, bin 32 (p = M) does not.
        assert_approx_eq!(efast_first_order(&outputs, 8, 4).unwrap(), 2.0 / 3.0, 1e-9);
    }

    #[test]
    fn test_efast_rejects_zero_search_frequency() {
        let outputs = tone(65, 8);
        assert!(matches!(efast_first_order(&outputs, 0, 4), Err(FastError::Domain(_))));
        assert!(matches!(efast_total_order(&outputs, 0, 4), Err(FastError::Domain(_))));
    }

    #[test]
    fn test_efast_harmonics_past_spectrum() {
        // 33 samples keep bins 1..=15; 3 * 8 = 24 is out of reach.
        let outputs = tone(33, 4);
        assert!(matches!(
            efast_first_order(&outputs, 8, 4),
            Err(FastError::Shape { actual: 33, .. })
        ));
    }

    #[test]
    fn test_classic_single_tone_at_factor_frequency() {
        // Half-period samples of sin(9s) on [-π/2, π/2].
        let n = 105;
        let outputs: Vec<f64> = (0..n)
            .map(|j| (9.0 * (-PI / 2.0 + PI * j as f64 / (n - 1) as f64)).sin())
            .collect();
        let indices = classic_sensitivities(&outputs, 3, 4).unwrap();
        assert_eq!(indices.len(), 3);
        assert!(indices[1] > 0.9, "factor 2 index {}", indices[1]);
        assert!(indices[0] < 0.05);
        assert!(indices[2] < 0.05);
    }

    #[test]
    fn test_classic_drops_harmonics_past_spectrum() {
        // n = 21 keeps bins 0..=21; of factor 3's harmonics 13..=52 only 13 survives.
        let outputs: Vec<f64> = (0..21).map(|j| ((j * 7) % 5) as f64).collect();
        let indices = classic_sensitivities(&outputs, 3, 4).unwrap();
        let n = outputs.len();
        let magnitudes = spectrum_to_magnitudes(&perform_fft(&extend(&outputs)), n as f64);
        let total: f64 = magnitudes[1..=n].iter().map(|m| m * m).sum();
        assert_approx_eq!(indices[2], magnitudes[13] * magnitudes[13] / total, 1e-12);
    }

    #[test]
    fn test_classic_zero_frequency_contributes_nothing() {
        // Two factors: frequencies [0, 4].
        let outputs: Vec<f64> = (0..65).map(|j| (j as f64 * 0.37).sin() + 3.0).collect();
        let indices = classic_sensitivities(&outputs, 2, 4).unwrap();
        assert_eq!(indices[0], 0.0);
        assert!(indices[1] >= 0.0 && indices[1] <= 1.0);
    }

    #[test]
    fn test_engine_length_checks() {
        let engine = SensitivityEngine::new();
        let short = tone(63, 1);
        assert!(matches!(engine.classic(&short, 3), Err(FastError::Shape { actual: 63, .. })));

        let even = tone(106, 1);
        assert!(matches!(engine.classic(&even, 3), Err(FastError::Shape { actual: 106, .. })));

        let runs = vec![tone(65, 8)];
        assert!(matches!(engine.efast(&runs, 2), Err(FastError::Shape { actual: 1, .. })));
    }

    #[test]
    fn test_engine_with_custom_runs() {
        let runs = |_: usize| -> Result<usize> { Ok(129) };
        let engine = SensitivityEngine::with_runs(runs);
        assert_eq!(engine.search_frequency(2).unwrap(), 16);

        let outputs = vec![tone(129, 16), tone(129, 2)];
        let factors = engine.efast(&outputs, 2).unwrap();
        assert_approx_eq!(factors[0].first_order, 1.0, 1e-9);
        assert_approx_eq!(factors[1].first_order, 0.0, 1e-9);
        assert_eq!(factors[1].factor, 2);
    }

    fn half_curve_tone(n: usize, frequency: f64) -> Vec<f64> {
        (0..n)
            .map(|j| (frequency * (-PI / 2.0 + PI * j as f64 / (n - 1) as f64)).sin())
            .collect()
    }

    #[test]
    fn test_small_variation_on_large_mean() {
        let outputs: Vec<f64> = tone(65, 8).iter().map(|s| 1e6 + 1e-5 * s).collect();
        assert_approx_eq!(efast_first_order(&outputs, 8, 4).unwrap(), 1.0, 1e-6);
        assert_approx_eq!(efast_total_order(&outputs, 8, 4).unwrap(), 1.0, 1e-6);

        let plain = classic_sensitivities(&half_curve_tone(105, 9.0), 3, 4).unwrap();
        let offset: Vec<f64> = half_curve_tone(105, 9.0)
            .iter()
            .map(|s| 1e6 + 1e-5 * s)
            .collect();
        let indices = classic_sensitivities(&offset, 3, 4).unwrap();
        for (a, b) in indices.iter().zip(&plain) {
            assert_approx_eq!(*a, *b, 1e-4);
        }
        assert!(indices[1] > 0.9);
    }

    #[test]
    fn test_constant_with_large_mean_is_degenerate() {
        let outputs = vec![1e6 + 0.1; 65];
        assert!(matches!(
            efast_first_order(&outputs, 8, 4),
            Err(FastError::DegenerateInput { .. })
        ));
        assert!(matches!(
            classic_sensitivities(&outputs, 1, 4),
            Err(FastError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_total_order_stops_at_half_search_frequency() {
        // λ indices 0..4, i.e. bins 1..=4, for both ω = 8 and ω = 9.
        for search in [8, 9] {
            assert_approx_eq!(efast_total_order(&tone(65, 4), search, 4).unwrap(), 0.0, 1e-9);
            assert_approx_eq!(efast_total_order(&tone(65, 5), search, 4).unwrap(), 1.0, 1e-9);
        }
    }

    #[test]
    fn test_first_order_reaches_last_bin() {
        // 51 samples keep bins 1..=24; the third harmonic of 8 is the last one.
        assert_approx_eq!(efast_first_order(&tone(51, 24), 8, 4).unwrap(), 1.0, 1e-9);
        // 49 samples stop at bin 23.
        assert!(matches!(
            efast_first_order(&tone(49, 8), 8, 4),
            Err(FastError::Shape { actual: 49, .. })
        ));
    }

    #[test]
    fn test_unbounded_harmonic_order() {
        let outputs = half_curve_tone(105, 9.0);
        // Every harmonic of a nonzero frequency is past bin 105 by p = 106.
        assert_eq!(
            classic_sensitivities(&outputs, 3, usize::MAX).unwrap(),
            classic_sensitivities(&outputs, 3, 106).unwrap()
        );
        let indices = classic_sensitivities(&outputs, 2, usize::MAX).unwrap();
        assert_eq!(indices[0], 0.0);

        assert!(matches!(
            efast_first_order(&tone(65, 8), 8, usize::MAX),
            Err(FastError::Shape { actual: 65, .. })
        ));
        assert!(matches!(
            efast_first_order(&tone(65, 8), usize::MAX, 3),
            Err(FastError::Shape { actual: 65, .. })
        ));
        assert!(matches!(
            efast_total_order(&tone(65, 8), usize::MAX, 4),
            Err(FastError::Shape { actual: 65, .. })
        ));
    }

    #[test]
    fn test_efast_factor_matches_free_functions() {
        let fast = tone(65, 8);
        let slow = tone(65, 2);
        let outputs: Vec<f64> = (0..65).map(|j| 2.0 * fast[j] + slow[j] + 0.5).collect();
        let factor = SensitivityEngine::new().efast_factor(1, &outputs, 8).unwrap();
        assert_eq!(factor.first_order, efast_first_order(&outputs, 8, 4).unwrap());
        assert_eq!(factor.total_order, Some(efast_total_order(&outputs, 8, 4).unwrap()));
        assert_approx_eq!(factor.first_order, 0.8, 1e-9);
    }

    #[test]
    fn test_engine_search_frequency_matches_sets() {
        let engine = SensitivityEngine::new();
        for n in 1..=crate::MAX_PARAMS {
            assert_eq!(
                engine.search_frequency(n).unwrap(),
                engine.efast_frequencies(n).unwrap()[0][0]
            );
        }
        assert!(matches!(engine.search_frequency(0), Err(FastError::Domain(_))));
        assert!(matches!(engine.search_frequency(50), Err(FastError::Domain(_))));

        let runs = |_: usize| -> Result<usize> { Ok(5) };
        let engine = SensitivityEngine::with_runs(runs);
        assert!(matches!(engine.search_frequency(2), Err(FastError::Domain(_))));
    }

    #[test]
    fn test_engine_rejects_zero_harmonic_order() {
        assert!(matches!(
            SensitivityEngine::new().with_harmonic_order(0),
            Err(FastError::Domain(_))
        ));
    }
}
