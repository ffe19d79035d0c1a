//! Интерфейс классификатора оттока

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::logistic::LogisticModel;
use crate::error::{PipelineError, Result};

/// Обученный бинарный классификатор (1 = отток)
pub trait ChurnClassifier: Send + Sync {
    /// Число признаков, на которых обучалась модель (None - неизвестно)
    fn n_features(&self) -> Option<usize>;

    /// Вероятность класса 1 для каждой строки, в диапазоне [0, 1]
    fn predict_proba(&self, X: &Array2<f64>) -> Result<Array1<f64>>;

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<u8>> {
        Ok(self
            .predict_proba(X)?
            .mapv(|p| if p > 0.5 { 1 } else { 0 }))
    }
}

/// Сериализованная модель из бандла
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    RandomForest(RandomForest),
    Logistic(LogisticModel),
}

impl ModelSpec {
    /// Проверяет модель и упаковывает её за общим интерфейсом
    pub fn into_classifier(self) -> Result<Box<dyn ChurnClassifier>> {
        match self {
            ModelSpec::RandomForest(forest) => {
                forest.validate()?;
                Ok(Box::new(forest))
            }
            ModelSpec::Logistic(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

/// Заглушка для режима разработки: любая попытка предсказания - ошибка
#[derive(Debug, Clone, Copy, Default)]
pub struct UnfittedClassifier;

impl ChurnClassifier for UnfittedClassifier {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_proba(&self, _X: &Array2<f64>) -> Result<Array1<f64>> {
        Err(PipelineError::NotFitted("classifier"))
    }
}

pub(crate) fn check_width(expected: usize, X: &Array2<f64>) -> Result<()> {
    if X.ncols() != expected {
        return Err(PipelineError::ShapeMismatch {
            expected,
            actual: X.ncols(),
        });
    }
    Ok(())
}
