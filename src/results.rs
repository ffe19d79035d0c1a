//! Хранилище файлов с результатами пакетных предсказаний

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use polars::prelude::*;
use rand::Rng;

use crate::error::Result;

/// Уникальный идентификатор результата: "<UTC время>-<16 hex>"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle(String);

impl ResultHandle {
    pub fn generate() -> Self {
        let suffix: u64 = rand::thread_rng().gen();
        Self(format!("{}-{:016x}", Utc::now().format("%Y%m%dT%H%M%S"), suffix))
    }

    /// Принимает только строки, которые мог выдать `generate`
    pub fn parse(raw: &str) -> Option<Self> {
        let (timestamp, suffix) = raw.split_once('-')?;
        let timestamp_ok = timestamp.len() == 15
            && timestamp.chars().enumerate().all(|(i, c)| {
                if i == 8 {
                    c == 'T'
                } else {
                    c.is_ascii_digit()
                }
            });
        let suffix_ok = suffix.len() == 16 && suffix.chars().all(|c| c.is_ascii_hexdigit());
        if timestamp_ok && suffix_ok {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
    /// None - файлы не удаляются автоматически
    retention: Option<Duration>,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            retention: None,
        })
    }

    pub fn with_retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, handle: &ResultHandle) -> PathBuf {
        self.dir.join(format!("{}.csv", handle.as_str()))
    }

    /// Каждый вызов пишет в собственный файл, одновременные загрузки не пересекаются
    pub fn persist(&self, df: &mut DataFrame) -> Result<ResultHandle> {
        let (handle, mut file) = loop {
            let handle = ResultHandle::generate();
            match File::options()
                .write(true)
                .create_new(true)
                .open(self.path_for(&handle))
            {
                Ok(file) => break (handle, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        };
        CsvWriter::new(&mut file).include_header(true).finish(df)?;

        tracing::info!("Saved batch result {} ({} rows)", handle, df.height());

        // сбой очистки не должен ломать уже записанный результат
        if let Err(e) = self.prune() {
            tracing::warn!("Failed to prune old results: {}", e);
        }
        Ok(handle)
    }

    /// Удаляет результаты старше срока хранения. Трогает только файлы,
    /// имя которых является идентификатором результата.
    pub fn prune(&self) -> Result<usize> {
        let Some(retention) = self.retention else {
            return Ok(0);
        };
        let now = SystemTime::now();

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_result = path.extension().map_or(false, |ext| ext == "csv")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(ResultHandle::parse)
                    .is_some();
            if !is_result {
                continue;
            }

            let modified = std::fs::metadata(&path)?.modified()?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age > retention {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    // уже удалён параллельной очисткой
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if removed > 0 {
            tracing::info!("Pruned {} expired batch results", removed);
        }
        Ok(removed)
    }

    /// None - результата с таким идентификатором нет
    pub fn read(&self, handle: &ResultHandle) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(handle)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
