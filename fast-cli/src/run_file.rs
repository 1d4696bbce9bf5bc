//! # Run Files
//!
//! JSON documents exchanged with whatever evaluates the model: the outputs
//! collected along the search curve(s) go in, a [`SensitivityReport`] comes out.

use anyhow::{Context, Result, bail};
use fast_core::{DEFAULT_HARMONIC_ORDER, FactorBounds, Method, SensitivityReport};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Model outputs for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outputs {
    /// A single classic search curve.
    Single(Vec<f64>),
    /// One eFAST curve per factor, in factor order.
    PerFactor(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub method: Method,
    pub num_params: usize,
    #[serde(default = "default_harmonic_order")]
    pub harmonic_order: usize,
    pub outputs: Outputs,
}

fn default_harmonic_order() -> usize {
    DEFAULT_HARMONIC_ORDER
}

impl RunFile {
    /// Checks that the output layout matches the method.
    pub fn validate(&self) -> Result<()> {
        match (self.method, &self.outputs) {
            (Method::Classic, Outputs::Single(_)) | (Method::Efast, Outputs::PerFactor(_)) => Ok(()),
            (Method::Classic, Outputs::PerFactor(_)) => {
                bail!("classic runs take a single output series, found one per factor")
            }
            (Method::Efast, Outputs::Single(_)) => {
                bail!("eFAST runs take one output series per factor, found a single series")
            }
        }
    }
}

/// Search-curve samples written for the model to evaluate.
#[derive(Debug, Clone, Serialize)]
pub struct SampleFile {
    pub method: Method,
    pub num_params: usize,
    pub harmonic_order: usize,
    /// One frequency set per curve.
    pub frequencies: Vec<Vec<usize>>,
    /// One sample matrix per curve; rows are model evaluations.
    pub curves: Vec<Vec<Vec<f64>>>,
}

/// Loads a run file from JSON.
pub fn load_run(path: &Path) -> Result<RunFile> {
    let run: RunFile = read_json(path)?;
    run.validate()
        .with_context(|| format!("invalid run file {}", path.display()))?;
    Ok(run)
}

/// Loads factor bounds (a JSON array of `{ "min": .., "max": .. }`).
pub fn load_bounds(path: &Path) -> Result<Vec<FactorBounds>> {
    let bounds: Vec<FactorBounds> = read_json(path)?;
    for (i, b) in bounds.iter().enumerate() {
        FactorBounds::new(b.min, b.max).with_context(|| format!("factor {}", i + 1))?;
    }
    Ok(bounds)
}

/// Saves a sensitivity report as pretty-printed JSON.
pub fn save_report(report: &SensitivityReport, path: &Path) -> Result<()> {
    write_json(report, path)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(value)?;
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}
