//! Конвейер предсказания: кодирование -> масштабирование -> выбор признаков -> классификация

use crate::error::{PipelineError, Result};
use crate::models::ModelBundle;
use crate::preprocessing::FeatureTable;
use crate::types::{ChurnPrediction, CustomerRecord};

/// Значение "Point Earned" по умолчанию для пакетных загрузок без этого столбца
pub const DEFAULT_POINT_EARNED: f64 = 500.0;

pub const ADMINISTRATIVE_COLUMNS: [&str; 3] = ["RowNumber", "CustomerId", "Complain"];

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Подставляется только в пакетном режиме; одиночная запись всегда содержит поле.
    /// None - отсутствие столбца считается ошибкой.
    pub batch_point_earned_default: Option<f64>,
    /// Служебные столбцы, удаляемые из загруженной таблицы, если они есть
    pub dropped_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_point_earned_default: Some(DEFAULT_POINT_EARNED),
            dropped_columns: ADMINISTRATIVE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

pub struct PredictionPipeline {
    bundle: ModelBundle,
    config: PipelineConfig,
}

impl PredictionPipeline {
    pub fn new(bundle: ModelBundle, config: PipelineConfig) -> Self {
        Self { bundle, config }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Общая часть обоих путей. Ответ классификатора не изменяется,
    /// вероятность только переводится в проценты.
    pub fn predict_table(&self, table: &FeatureTable) -> Result<Vec<ChurnPrediction>> {
        if table.n_rows() == 0 {
            return Err(PipelineError::MalformedInput("no rows to predict".to_string()));
        }

        let bundle = &self.bundle;
        let features = bundle
            .selector()
            .select(table, bundle.encoder(), bundle.scaler())?;

        let classifier = bundle.classifier();
        let labels = classifier.predict(&features)?;
        let probabilities = classifier.predict_proba(&features)?;

        if labels.len() != table.n_rows() || probabilities.len() != table.n_rows() {
            return Err(PipelineError::ShapeMismatch {
                expected: table.n_rows(),
                actual: labels.len().min(probabilities.len()),
            });
        }

        if let Some(&p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(PipelineError::InvalidProbability(p));
        }

        Ok(labels
            .iter()
            .zip(probabilities.iter())
            .map(|(&label, &p)| ChurnPrediction {
                label,
                probability: p * 100.0,
            })
            .collect())
    }

    pub fn predict(&self, record: &CustomerRecord) -> Result<ChurnPrediction> {
        let predictions = self.predict_table(&record.to_table()?)?;
        predictions
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::MalformedInput("empty prediction".to_string()))
    }
}
