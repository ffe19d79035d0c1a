//! Конфигурация сервиса из переменных окружения

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::pipeline::{PipelineConfig, DEFAULT_POINT_EARNED};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_PATH: &str = "model.json";
pub const DEFAULT_RESULTS_DIR: &str = "static/results";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_RESULTS_RETENTION_HOURS: u64 = 24;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub model_path: PathBuf,
    pub results_dir: PathBuf,
    /// None - результаты хранятся, пока их не удалит оператор
    pub results_retention: Option<Duration>,
    pub max_upload_bytes: usize,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("Invalid LISTEN_ADDR value")?;

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .context("Invalid MAX_UPLOAD_BYTES value")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let results_retention = match lookup("RESULTS_RETENTION_HOURS") {
            Some(raw) if raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => {
                let hours = raw
                    .parse::<u64>()
                    .context("Invalid RESULTS_RETENTION_HOURS value")?;
                Some(Duration::from_secs(hours * 3600))
            }
            None => Some(Duration::from_secs(DEFAULT_RESULTS_RETENTION_HOURS * 3600)),
        };

        // "none" отключает подстановку: пакет без столбца будет отклонён
        let batch_point_earned_default = match lookup("BATCH_POINT_EARNED_DEFAULT") {
            Some(raw) if raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .context("Invalid BATCH_POINT_EARNED_DEFAULT value")?,
            ),
            None => Some(DEFAULT_POINT_EARNED),
        };

        Ok(Self {
            listen_addr,
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            results_dir: lookup("RESULTS_DIR")
                .unwrap_or_else(|| DEFAULT_RESULTS_DIR.to_string())
                .into(),
            results_retention,
            max_upload_bytes,
            pipeline: PipelineConfig {
                batch_point_earned_default,
                ..PipelineConfig::default()
            },
        })
    }
}
