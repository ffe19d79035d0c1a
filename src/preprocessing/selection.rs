//! Выбор признаков в порядке, который ожидает классификатор

use ndarray::{s, Array2};

use super::encoding::FeatureEncoder;
use super::normalization::StandardScaler;
use super::table::FeatureTable;
use crate::error::Result;

/// Порядок: выбранные категориальные признаки, затем числовые столбцы скейлера
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    categorical: Vec<String>,
    numerical: Vec<String>,
}

impl FeatureSelector {
    pub fn new(categorical: Vec<String>, numerical: Vec<String>) -> Self {
        Self {
            categorical,
            numerical,
        }
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.categorical
            .iter()
            .chain(self.numerical.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.categorical.len() + self.numerical.len()
    }

    /// Кодирует, масштабирует и собирает матрицу признаков (n_rows, n_features).
    /// Отсутствующий столбец - ошибка, значения по умолчанию здесь не подставляются.
    pub fn select(
        &self,
        table: &FeatureTable,
        encoder: &FeatureEncoder,
        scaler: &StandardScaler,
    ) -> Result<Array2<f64>> {
        let n_rows = table.n_rows();
        let n_cat = self.categorical.len();
        let mut features = Array2::zeros((n_rows, self.n_features()));

        for (j, column) in self.categorical.iter().enumerate() {
            let codes = encoder.encode_column(column, table.categorical(column)?)?;
            for (i, code) in codes.into_iter().enumerate() {
                features[[i, j]] = code;
            }
        }

        let mut numerical = Array2::zeros((n_rows, self.numerical.len()));
        for (j, column) in self.numerical.iter().enumerate() {
            for (i, &value) in table.numeric(column)?.iter().enumerate() {
                numerical[[i, j]] = value;
            }
        }
        features
            .slice_mut(s![.., n_cat..])
            .assign(&scaler.transform(&numerical)?);

        Ok(features)
    }
}
