//! Бандл обученных артефактов: классификатор, скейлер, кодировщики, список признаков

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::classifier::{ChurnClassifier, ModelSpec, UnfittedClassifier};
use crate::preprocessing::{FeatureEncoder, FeatureSelector, LabelEncoder, StandardScaler};
use crate::types::{CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS};

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read model bundle {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse model bundle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model bundle: {0}")]
    Invalid(String),
}

#[derive(Deserialize)]
struct RawBundle {
    model: ModelSpec,
    scaler: StandardScaler,
    selected_cat_features: Vec<String>,
    label_encoders: FeatureEncoder,
}

/// Неизменяемый набор артефактов; загружается один раз и разделяется между запросами
pub struct ModelBundle {
    classifier: Box<dyn ChurnClassifier>,
    scaler: StandardScaler,
    encoder: FeatureEncoder,
    selector: FeatureSelector,
    is_placeholder: bool,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("features", &self.selector.feature_names())
            .field("is_placeholder", &self.is_placeholder)
            .finish()
    }
}

impl ModelBundle {
    pub fn new(
        classifier: Box<dyn ChurnClassifier>,
        scaler: StandardScaler,
        selected_cat_features: Vec<String>,
        encoder: FeatureEncoder,
    ) -> Result<Self, BundleError> {
        if let Some(missing) = selected_cat_features.iter().find(|c| !encoder.has_column(c)) {
            return Err(BundleError::Invalid(format!(
                "no label encoder for selected feature '{}'",
                missing
            )));
        }

        let selector = FeatureSelector::new(selected_cat_features, scaler.columns().to_vec());
        if let Some(n) = classifier.n_features() {
            if n != selector.n_features() {
                return Err(BundleError::Invalid(format!(
                    "classifier expects {} features but the bundle selects {}",
                    n,
                    selector.n_features()
                )));
            }
        }

        Ok(Self {
            classifier,
            scaler,
            encoder,
            selector,
            is_placeholder: false,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, BundleError> {
        let raw: RawBundle = serde_json::from_str(json)?;
        let classifier = raw
            .model
            .into_classifier()
            .map_err(|e| BundleError::Invalid(e.to_string()))?;
        Self::new(
            classifier,
            raw.scaler,
            raw.selected_cat_features,
            raw.label_encoders,
        )
    }

    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let json = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Загрузка с деградацией до заглушки: только для режима разработки
    pub fn load_or_placeholder(path: &Path) -> Self {
        match Self::load(path) {
            Ok(bundle) => {
                tracing::info!(
                    "Model loaded successfully from {} ({} features)",
                    path.display(),
                    bundle.selector.n_features()
                );
                bundle
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                tracing::warn!("Using untrained placeholder model, predictions will fail");
                Self::placeholder()
            }
        }
    }

    pub fn placeholder() -> Self {
        let categorical: Vec<String> = CATEGORICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        let numerical: Vec<String> = NUMERICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        let encoders: HashMap<String, LabelEncoder> = categorical
            .iter()
            .map(|c| (c.clone(), LabelEncoder::unfitted()))
            .collect();

        Self {
            classifier: Box::new(UnfittedClassifier),
            scaler: StandardScaler::unfitted(numerical.clone()),
            encoder: FeatureEncoder::new(encoders),
            selector: FeatureSelector::new(categorical, numerical),
            is_placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    pub fn classifier(&self) -> &dyn ChurnClassifier {
        self.classifier.as_ref()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn selector(&self) -> &FeatureSelector {
        &self.selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BUNDLE_JSON;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_bundle_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(BUNDLE_JSON.as_bytes()).unwrap();

        let bundle = ModelBundle::load(file.path()).unwrap();
        assert!(!bundle.is_placeholder());
        assert_eq!(
            bundle.selector().feature_names(),
            vec![
                "Geography", "Gender", "Card Type", "CreditScore", "Age", "Balance",
                "EstimatedSalary", "Tenure", "NumOfProducts"
            ]
        );
        assert_eq!(bundle.encoder().encode("Card Type", "GOLD").unwrap(), 1);
    }

    #[test]
    fn rejects_feature_count_mismatch() {
        let json = BUNDLE_JSON.replace(r#""n_features": 9"#, r#""n_features": 8"#);
        let err = ModelBundle::from_json(&json).unwrap_err();
        assert!(matches!(err, BundleError::Invalid(_)));
    }

    #[test]
    fn rejects_selected_feature_without_encoder() {
        let json = BUNDLE_JSON.replace(r#""Card Type": {"#, r#""Card": {"#);
        assert!(matches!(
            ModelBundle::from_json(&json),
            Err(BundleError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_broken_forest_at_load() {
        let start = BUNDLE_JSON.find(r#""trees": ["#).unwrap();
        let end = BUNDLE_JSON.find(r#""scaler""#).unwrap();
        let empty = format!(
            "{}\"trees\": []\n  }},\n  {}",
            &BUNDLE_JSON[..start],
            &BUNDLE_JSON[end..]
        );
        assert!(matches!(
            ModelBundle::from_json(&empty),
            Err(BundleError::Invalid(_))
        ));

        let out_of_range = BUNDLE_JSON.replacen(r#"{"value": 0.1}"#, r#"{"value": 7.5}"#, 1);
        assert_ne!(out_of_range, BUNDLE_JSON);
        assert!(matches!(
            ModelBundle::from_json(&out_of_range),
            Err(BundleError::Invalid(_))
        ));

        let bad_feature = BUNDLE_JSON.replacen(r#""feature": 8"#, r#""feature": 12"#, 1);
        assert!(ModelBundle::from_json(&bad_feature).is_err());
    }

    #[test]
    fn broken_bundle_file_falls_back_to_placeholder() {
        let mut file = NamedTempFile::new().unwrap();
        let json = BUNDLE_JSON.replacen(r#"{"value": 0.8}"#, r#"{"value": -1.0}"#, 1);
        file.write_all(json.as_bytes()).unwrap();
        assert!(ModelBundle::load_or_placeholder(file.path()).is_placeholder());
    }

    #[test]
    fn missing_file_falls_back_to_placeholder() {
        let bundle = ModelBundle::load_or_placeholder(Path::new("/nonexistent/model.json"));
        assert!(bundle.is_placeholder());
        assert!(!bundle.scaler().is_fitted());
        assert!(!bundle.encoder().is_fitted());
        assert_eq!(bundle.selector().n_features(), 9);
    }
}
