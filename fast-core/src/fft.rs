//! # Fast Fourier Transform (FFT) Module
//!
//! This module provides the spectral plumbing used by the sensitivity engine.
//! It handles mirroring of half-period search-curve samples, the forward
//! transform itself, and magnitude extraction.
//!
//! ## Features
//! - Arbitrary-length FFT using RustFFT (model runs are odd-length)
//! - Mirror extension of a half-period series into a full period
//! - DC offset removal so small variations survive a large mean
//! - Scaled magnitude spectra for power calculations

use rustfft::{FftPlanner, num_complex::Complex};

/// Mirrors a sampled series into one full period.
///
/// The classic search curve only covers half a period. Appending the
/// series in reverse, without repeating its last element, produces the
/// periodic signal the transform expects:
/// `[a, b, c]` becomes `[a, b, c, b, a]`.
///
/// # Arguments
/// * `series` - Model outputs along the search curve
///
/// # Returns
/// * `Vec<f64>` - Series of length `2n - 1` (empty for empty input)
pub fn extend(series: &[f64]) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }

    let mut extended = Vec::with_capacity(2 * n - 1);
    extended.extend_from_slice(series);
    extended.extend(series[..n - 1].iter().rev());
    extended
}

/// Removes the DC offset from a series by making its average value zero.
///
/// Only bin 0 of the transform depends on the mean, so the sensitivity
/// indices are unchanged. Centering keeps a small variation on a large
/// mean from drowning in the rounding of the transform.
///
/// # Arguments
/// * `signal` - Series to center (modified in-place)
///
/// # Returns
/// * `f64` - The mean that was removed (0.0 for an empty series)
pub fn remove_dc_offset(signal: &mut [f64]) -> f64 {
    let len = signal.len();
    if len == 0 {
        return 0.0;
    }
    let avg = signal.iter().sum::<f64>() / len as f64;
    for sample in signal.iter_mut() {
        *sample -= avg;
    }
    avg
}

/// Performs a forward FFT on a real signal and returns the complex spectrum.
///
/// Unlike an audio frame there is no windowing here; callers that want the
/// DC offset gone remove it first with [`remove_dc_offset`].
///
/// # Arguments
/// * `signal` - Input series (any length, including odd lengths)
///
/// # Returns
/// * `Vec<Complex<f64>>` - Complex frequency spectrum, same length as the input
pub fn perform_fft(signal: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .collect();

    if buffer.is_empty() {
        return buffer;
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer
}

/// Calculates the magnitude vector from a complex spectrum.
///
/// # Arguments
/// * `spectrum` - Complex frequency spectrum from FFT
/// * `scale` - Divisor applied to every magnitude (usually the sample count)
///
/// # Returns
/// * `Vec<f64>` - `|X_k| / scale` for every bin
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f64>], scale: f64) -> Vec<f64> {
    spectrum
        .iter()
        .map(|c| c.norm() / scale) // .norm() is sqrt(re^2 + im^2)
        .collect()
}
