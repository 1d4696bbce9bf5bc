//! # Search Curve Sampling Module
//!
//! The engine never evaluates a model. Whoever drives it needs input points
//! laid out along the search curve; this module defines that boundary as the
//! [`SampleGenerator`] trait and provides the standard curve as a default.
//!
//! Each factor follows `x_i(s) = min + (max - min) * (1/2 + asin(sin(ω_i s)) / π)`,
//! a triangle wave that visits its range uniformly.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{FastError, Result};

/// Lower and upper bound of one factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorBounds {
    pub min: f64,
    pub max: f64,
}

impl FactorBounds {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(FastError::domain(format!("invalid factor bounds [{min}, {max}]")));
        }
        Ok(Self { min, max })
    }

    fn validate(&self) -> Result<()> {
        Self::new(self.min, self.max).map(|_| ())
    }
}

/// Produces model input points from factor bounds and a frequency set.
pub trait SampleGenerator {
    /// Returns `num_samples` rows, each holding one value per factor.
    fn generate(
        &self,
        bounds: &[FactorBounds],
        frequencies: &[usize],
        num_samples: usize,
    ) -> Result<Vec<Vec<f64>>>;
}

/// Portion of the period covered by the curve parameter `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveSpan {
    /// `s_j = 2πj / N`, one full period without repeating the start (eFAST).
    #[default]
    Full,
    /// `s_j = -π/2 + πj / (N - 1)`, half a period; the engine mirrors the
    /// outputs back into a full period (classic FAST).
    Half,
}

/// The standard FAST search curve.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCurve {
    pub span: CurveSpan,
}

impl SearchCurve {
    pub fn new(span: CurveSpan) -> Self {
        Self { span }
    }

    fn parameter(&self, j: usize, num_samples: usize) -> f64 {
        match self.span {
            CurveSpan::Full => 2.0 * PI * j as f64 / num_samples as f64,
            CurveSpan::Half if num_samples > 1 => {
                -PI / 2.0 + PI * j as f64 / (num_samples - 1) as f64
            }
            CurveSpan::Half => 0.0,
        }
    }
}

impl SampleGenerator for SearchCurve {
    fn generate(
        &self,
        bounds: &[FactorBounds],
        frequencies: &[usize],
        num_samples: usize,
    ) -> Result<Vec<Vec<f64>>> {
        if bounds.len() != frequencies.len() {
            return Err(FastError::shape(
                "factor bounds",
                format!("one per frequency ({})", frequencies.len()),
                bounds.len(),
            ));
        }
        for b in bounds {
            b.validate()?;
        }

        let rows = (0..num_samples)
            .map(|j| {
                let s = self.parameter(j, num_samples);
                bounds
                    .iter()
                    .zip(frequencies)
                    .map(|(b, &omega)| {
                        let unit = 0.5 + (omega as f64 * s).sin().asin() / PI;
                        b.min + (b.max - b.min) * unit
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }
}
