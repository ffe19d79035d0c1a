//! Стандартизация числовых признаков

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawScaler {
    columns: Vec<String>,
    #[serde(default)]
    mean: Option<Vec<f64>>,
    #[serde(default)]
    scale: Option<Vec<f64>>,
}

/// (x - mean) / scale по каждому столбцу; параметры фиксируются при обучении
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawScaler", into = "RawScaler")]
pub struct StandardScaler {
    columns: Vec<String>,
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl TryFrom<RawScaler> for StandardScaler {
    type Error = String;

    fn try_from(raw: RawScaler) -> std::result::Result<Self, Self::Error> {
        match (raw.mean, raw.scale) {
            (Some(mean), Some(scale)) => {
                if mean.len() != raw.columns.len() || scale.len() != raw.columns.len() {
                    return Err(format!(
                        "scaler has {} columns but {} means and {} scales",
                        raw.columns.len(),
                        mean.len(),
                        scale.len()
                    ));
                }
                Ok(Self::from_params(raw.columns, mean, scale))
            }
            (None, None) => Ok(Self::unfitted(raw.columns)),
            _ => Err("scaler must define both mean and scale".to_string()),
        }
    }
}

impl From<StandardScaler> for RawScaler {
    fn from(scaler: StandardScaler) -> Self {
        Self {
            columns: scaler.columns,
            mean: scaler.mean.map(|m| m.to_vec()),
            scale: scaler.scale.map(|s| s.to_vec()),
        }
    }
}

impl StandardScaler {
    pub fn unfitted(columns: Vec<String>) -> Self {
        Self {
            columns,
            mean: None,
            scale: None,
        }
    }

    pub fn from_params(columns: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Self {
        let mut scale = Array1::from(scale);
        // Избегаем деления на ноль
        for val in scale.iter_mut() {
            if val.abs() < 1e-10 {
                *val = 1.0;
            }
        }
        Self {
            columns,
            mean: Some(Array1::from(mean)),
            scale: Some(scale),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some() && self.scale.is_some()
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(PipelineError::MalformedInput("empty dataset".to_string()));
        }
        self.check_width(X)?;

        let mean = X
            .mean_axis(Axis(0))
            .ok_or(PipelineError::MalformedInput("failed to compute mean".to_string()))?;
        let std = X.std_axis(Axis(0), 0.0);

        *self = Self::from_params(self.columns.clone(), mean.to_vec(), std.to_vec());
        Ok(())
    }

    /// Ограничений на диапазон нет: выбросы дают большие стандартизованные значения
    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(mean), Some(scale)) => (mean, scale),
            _ => return Err(PipelineError::NotFitted("scaler")),
        };
        self.check_width(X)?;

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - mean[i]) / scale[i];
            }
        }

        Ok(normalized)
    }

    fn check_width(&self, X: &Array2<f64>) -> Result<()> {
        if X.ncols() != self.columns.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: self.columns.len(),
                actual: X.ncols(),
            });
        }
        Ok(())
    }
}
