//! Кодирование категориальных признаков

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLabelEncoder {
    classes: Vec<String>,
}

/// Словарь одного столбца: код = индекс значения в `classes`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawLabelEncoder", into = "RawLabelEncoder")]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
    is_fitted: bool,
}

impl From<RawLabelEncoder> for LabelEncoder {
    fn from(raw: RawLabelEncoder) -> Self {
        Self::new(raw.classes)
    }
}

impl From<LabelEncoder> for RawLabelEncoder {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            classes,
            index,
            is_fitted: true,
        }
    }

    pub fn unfitted() -> Self {
        Self {
            classes: Vec::new(),
            index: HashMap::new(),
            is_fitted: false,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn transform_one(&self, column: &str, value: &str) -> Result<usize> {
        if !self.is_fitted {
            return Err(PipelineError::NotFitted("label encoder"));
        }
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| PipelineError::UnknownCategory {
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    pub fn transform(&self, column: &str, values: &[String]) -> Result<Vec<f64>> {
        values
            .iter()
            .map(|v| self.transform_one(column, v).map(|code| code as f64))
            .collect()
    }
}

/// Набор кодировщиков по именам столбцов
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureEncoder {
    encoders: HashMap<String, LabelEncoder>,
}

impl FeatureEncoder {
    pub fn new(encoders: HashMap<String, LabelEncoder>) -> Self {
        Self { encoders }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn is_fitted(&self) -> bool {
        self.encoders.values().all(LabelEncoder::is_fitted)
    }

    fn encoder(&self, column: &str) -> Result<&LabelEncoder> {
        self.encoders
            .get(column)
            .ok_or_else(|| PipelineError::MissingEncoder(column.to_string()))
    }

    pub fn encode(&self, column: &str, value: &str) -> Result<usize> {
        self.encoder(column)?.transform_one(column, value)
    }

    pub fn encode_column(&self, column: &str, values: &[String]) -> Result<Vec<f64>> {
        self.encoder(column)?.transform(column, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geography() -> LabelEncoder {
        LabelEncoder::new(vec!["France".into(), "Germany".into(), "Spain".into()])
    }

    #[test]
    fn codes_follow_class_order() {
        let encoder = geography();
        assert_eq!(encoder.transform_one("Geography", "France").unwrap(), 0);
        assert_eq!(encoder.transform_one("Geography", "Spain").unwrap(), 2);
        let codes = encoder
            .transform("Geography", &["Germany".into(), "France".into()])
            .unwrap();
        assert_eq!(codes, vec![1.0, 0.0]);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = geography().transform_one("Geography", "Italy").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownCategory { ref column, ref value }
                if column == "Geography" && value == "Italy"
        ));
        // регистр значим
        assert!(geography().transform_one("Geography", "france").is_err());
    }

    #[test]
    fn column_fails_as_a_whole() {
        let values = vec!["France".to_string(), "Atlantis".to_string()];
        assert!(geography().transform("Geography", &values).is_err());
    }

    #[test]
    fn unfitted_encoder_fails() {
        let err = LabelEncoder::unfitted()
            .transform_one("Gender", "Male")
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFitted(_)));
    }

    #[test]
    fn deserializes_from_classes() {
        let encoder: FeatureEncoder = serde_json::from_str(
            r#"{"Gender": {"classes": ["Female", "Male"]}}"#,
        )
        .unwrap();
        assert_eq!(encoder.encode("Gender", "Male").unwrap(), 1);
        assert!(matches!(
            encoder.encode("Card Type", "GOLD"),
            Err(PipelineError::MissingEncoder(_))
        ));
    }
}
