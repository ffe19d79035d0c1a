//! Ошибки конвейера предсказаний

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("malformed value in column '{column}' at row {row}")]
    MalformedValue { column: String, row: usize },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("{0} is not fitted")]
    NotFitted(&'static str),

    #[error("no label encoder for column '{0}'")]
    MissingEncoder(String),

    #[error("shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("column '{column}' has {actual} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("classifier returned probability {0} outside [0, 1]")]
    InvalidProbability(f64),

    #[error("table error: {0}")]
    Table(#[from] polars::error::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Ошибка вызвана входными данными пользователя (а не состоянием сервиса)
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            PipelineError::UnknownCategory { .. }
                | PipelineError::MissingColumn(_)
                | PipelineError::MalformedValue { .. }
                | PipelineError::MalformedInput(_)
        )
    }

    /// Сообщение для пользователя; детали внутренних ошибок не раскрываются
    pub fn user_message(&self) -> String {
        if self.is_expected() {
            format!("Prediction failed: {}", self)
        } else {
            "Prediction failed due to an internal error".to_string()
        }
    }
}
