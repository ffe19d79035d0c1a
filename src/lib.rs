//! Churn Predict - Rust библиотека

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod results;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{PipelineError, Result};
pub use models::{ChurnClassifier, ModelBundle};
pub use pipeline::{PipelineConfig, PredictionPipeline};
pub use types::*;
