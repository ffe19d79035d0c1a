//! Логистическая регрессия (только инференс)

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::classifier::{check_width, ChurnClassifier};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    coef: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn validate(&self) -> Result<()> {
        if self.coef.is_empty() {
            return Err(PipelineError::InvalidModel("logistic model has no coefficients".to_string()));
        }
        if !self.intercept.is_finite() || self.coef.iter().any(|w| !w.is_finite()) {
            return Err(PipelineError::InvalidModel(
                "logistic model has non-finite weights".to_string(),
            ));
        }
        Ok(())
    }
}

impl ChurnClassifier for LogisticModel {
    fn n_features(&self) -> Option<usize> {
        Some(self.coef.len())
    }

    fn predict_proba(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.coef.len(), X)?;
        let weights = Array1::from(self.coef.clone());
        let scores = X.dot(&weights) + self.intercept;
        Ok(scores.mapv(|z| 1.0 / (1.0 + (-z).exp())))
    }
}
