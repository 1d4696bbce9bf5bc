use serde::{Deserialize, Serialize};

/// Which FAST variant produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Classic,
    Efast,
}

/// Sensitivity of the model output to a single factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSensitivity {
    pub factor: usize,    // 1-based factor index
    pub first_order: f64, // classic multi-harmonic index or eFAST first-order index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_order: Option<f64>, // eFAST only
}

/// The complete result of one sensitivity analysis.
/// This is the top-level object written to and read from report files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub method: Method,
    pub num_params: usize,
    pub harmonic_order: usize,
    pub num_samples: usize,
    pub factors: Vec<FactorSensitivity>,
}

impl SensitivityReport {
    /// Report for one classic run; `indices` are in factor order.
    pub fn from_classic(harmonic_order: usize, num_samples: usize, indices: Vec<f64>) -> Self {
        let factors: Vec<FactorSensitivity> = indices
            .into_iter()
            .enumerate()
            .map(|(i, first_order)| FactorSensitivity {
                factor: i + 1,
                first_order,
                total_order: None,
            })
            .collect();
        Self {
            method: Method::Classic,
            num_params: factors.len(),
            harmonic_order,
            num_samples,
            factors,
        }
    }

    /// Report for a set of eFAST runs, one factor result per run.
    pub fn from_efast(
        harmonic_order: usize,
        num_samples: usize,
        factors: Vec<FactorSensitivity>,
    ) -> Self {
        Self {
            method: Method::Efast,
            num_params: factors.len(),
            harmonic_order,
            num_samples,
            factors,
        }
    }

    /// Factors sorted from most to least influential by first-order index.
    pub fn ranked(&self) -> Vec<&FactorSensitivity> {
        let mut ranked: Vec<&FactorSensitivity> = self.factors.iter().collect();
        ranked.sort_by(|a, b| {
            b.first_order
                .partial_cmp(&a.first_order)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Share of the output variance not claimed by any first-order index.
    pub fn unexplained(&self) -> f64 {
        1.0 - self.factors.iter().map(|f| f.first_order).sum::<f64>()
    }
}
