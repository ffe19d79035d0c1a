//! Таблица признаков: общий вход для одиночного и пакетного предсказания

use std::collections::HashMap;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Categorical(Vec<String>),
    Numeric(Vec<f64>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Categorical(values) => values.len(),
            Column::Numeric(values) => values.len(),
        }
    }
}

/// Именованные столбцы одинаковой длины
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    n_rows: usize,
    columns: HashMap<String, Column>,
}

impl FeatureTable {
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            columns: HashMap::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn insert_categorical(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        self.insert(name, Column::Categorical(values))
    }

    pub fn insert_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.insert(name, Column::Numeric(values))
    }

    /// Длина столбца обязана совпадать с числом строк таблицы
    fn insert(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.n_rows {
            return Err(PipelineError::RaggedColumn {
                column: name.to_string(),
                expected: self.n_rows,
                actual: column.len(),
            });
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn categorical(&self, name: &str) -> Result<&[String]> {
        match self.columns.get(name) {
            Some(Column::Categorical(values)) => Ok(values),
            Some(Column::Numeric(_)) => Err(PipelineError::MalformedInput(format!(
                "column '{}' must be categorical",
                name
            ))),
            None => Err(PipelineError::MissingColumn(name.to_string())),
        }
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.columns.get(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(Column::Categorical(_)) => Err(PipelineError::MalformedInput(format!(
                "column '{}' must be numeric",
                name
            ))),
            None => Err(PipelineError::MissingColumn(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_kind() {
        let mut table = FeatureTable::new(2);
        table.insert_categorical("Gender", vec!["Male".into(), "Female".into()]).unwrap();
        table.insert_numeric("Age", vec![30.0, 41.0]).unwrap();

        assert_eq!(table.numeric("Age").unwrap(), &[30.0, 41.0]);
        assert_eq!(table.categorical("Gender").unwrap()[1], "Female");
        assert!(matches!(
            table.numeric("Tenure"),
            Err(PipelineError::MissingColumn(c)) if c == "Tenure"
        ));
        assert!(matches!(
            table.numeric("Gender"),
            Err(PipelineError::MalformedInput(_))
        ));
    }

    #[test]
    fn ragged_column_is_rejected() {
        let mut table = FeatureTable::new(2);
        let err = table
            .insert_categorical("Card Type", vec!["GOLD".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RaggedColumn { expected: 2, actual: 1, .. }
        ));
        assert!(!err.is_expected());
        assert!(!table.contains("Card Type"));

        assert!(table.insert_numeric("Age", vec![1.0, 2.0, 3.0]).is_err());
    }
}
