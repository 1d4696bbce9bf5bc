//! # Factor Worker Pool
//!
//! eFAST curves are independent of one another, so each factor's indices are
//! computed on a worker thread. Jobs and results travel over crossbeam
//! channels; results are put back into factor order before returning.

use anyhow::{Result, anyhow};
use fast_core::{FactorSensitivity, MinimumRuns, SensitivityEngine};
use std::thread;
use tracing::{debug, info};

struct Job<'a> {
    factor: usize,
    outputs: &'a [f64],
}

/// Runs the eFAST analysis for every factor across `workers` threads.
pub fn efast_parallel<R: MinimumRuns>(
    engine: &SensitivityEngine<R>,
    outputs_per_factor: &[Vec<f64>],
    num_params: usize,
    workers: usize,
) -> Result<Vec<FactorSensitivity>> {
    let search = engine.prepare_efast(outputs_per_factor, num_params)?;
    let workers = workers.clamp(1, num_params);
    info!(num_params, workers, search, "[WORKERS] Starting eFAST analysis");

    let (job_tx, job_rx) = crossbeam_channel::unbounded();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();

    for (i, outputs) in outputs_per_factor.iter().enumerate() {
        // The receiver outlives this loop, so sending cannot fail.
        let _ = job_tx.send(Job {
            factor: i + 1,
            outputs,
        });
    }
    drop(job_tx);

    thread::scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for job in job_rx.iter() {
                    debug!(worker, factor = job.factor, "[WORKERS] Analyzing factor");
                    let result = engine.efast_factor(job.factor, job.outputs, search);
                    if result_tx.send((job.factor, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<FactorSensitivity>> = vec![None; num_params];
    for (factor, result) in result_rx.iter() {
        slots[factor - 1] = Some(result?);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.ok_or_else(|| anyhow!("no result for factor {}", i + 1)))
        .collect()
}
