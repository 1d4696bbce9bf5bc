// fast-core/src/lib.rs

//! The core logic for Fourier Amplitude Sensitivity Testing.
//! This crate is responsible for frequency assignment, series extension,
//! and the spectral decomposition that yields sensitivity indices
//! for both classic FAST and extended FAST (eFAST). It is completely
//! headless and performs no I/O.

pub mod error;
pub mod fft;
pub mod frequency;
pub mod report;
pub mod runs;
pub mod sampling;
pub mod sensitivity;

pub use error::{FastError, Result};
pub use frequency::{FrequencySet, classic_frequency_set, efast_frequency_sets};
pub use report::{FactorSensitivity, Method, SensitivityReport};
pub use runs::{CukierRuns, MinimumRuns};
pub use sampling::{CurveSpan, FactorBounds, SampleGenerator, SearchCurve};
pub use sensitivity::{
    SensitivityEngine, classic_sensitivities, efast_first_order, efast_total_order,
};

/// Number of harmonics examined per factor when the caller does not choose one.
pub const DEFAULT_HARMONIC_ORDER: usize = 4;

/// Largest factor count covered by the reference frequency tables.
pub const MAX_PARAMS: usize = 49;
