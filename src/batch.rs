//! Пакетное предсказание по загруженной CSV-таблице

use std::io::Cursor;

use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::pipeline::{PipelineConfig, PredictionPipeline};
use crate::preprocessing::FeatureTable;
use crate::types::{ChurnPrediction, CHURN_PROBABILITY, POINT_EARNED, PREDICTION};

pub fn read_csv(bytes: &[u8]) -> Result<DataFrame> {
    // типы выводятся по всему файлу: дробное значение может встретиться в любой строке
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| PipelineError::MalformedInput(format!("unreadable CSV: {}", e)))?;
    Ok(df)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Удаляет служебные столбцы и подставляет "Point Earned", если настроено
pub fn prepare(mut df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    for column in &config.dropped_columns {
        if has_column(&df, column) {
            df = df.drop(column)?;
        }
    }

    if !has_column(&df, POINT_EARNED) {
        if let Some(default) = config.batch_point_earned_default {
            tracing::debug!("'{}' missing, using default {}", POINT_EARNED, default);
            let height = df.height();
            df.with_column(Series::new(POINT_EARNED, vec![default; height]))?;
        }
    }

    Ok(df)
}

fn categorical_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df
        .column(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))?;
    let values = series.str().map_err(|_| {
        PipelineError::MalformedInput(format!("column '{}' must contain text values", name))
    })?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or(PipelineError::MalformedValue {
                column: name.to_string(),
                row: row + 1,
            })
        })
        .collect()
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))?;
    // нечисловые и пустые ячейки превращаются в null
    let casted = series.cast(&DataType::Float64)?;
    let values = casted.f64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.filter(|v| v.is_finite()).ok_or(PipelineError::MalformedValue {
                column: name.to_string(),
                row: row + 1,
            })
        })
        .collect()
}

/// Извлекает столбцы, нужные классификатору, в общую таблицу признаков
pub fn extract_features(df: &DataFrame, pipeline: &PredictionPipeline) -> Result<FeatureTable> {
    let selector = pipeline.bundle().selector();

    let mut table = FeatureTable::new(df.height());
    for name in selector.categorical() {
        table.insert_categorical(name, categorical_column(df, name)?)?;
    }
    for name in selector.numerical() {
        table.insert_numeric(name, numeric_column(df, name)?)?;
    }
    Ok(table)
}

/// Добавляет "Prediction" и "Churn Probability" последними столбцами
pub fn append_predictions(mut df: DataFrame, predictions: &[ChurnPrediction]) -> Result<DataFrame> {
    for column in [PREDICTION, CHURN_PROBABILITY] {
        if has_column(&df, column) {
            df = df.drop(column)?;
        }
    }

    let labels: Vec<i32> = predictions.iter().map(|p| p.label as i32).collect();
    let probabilities: Vec<f64> = predictions.iter().map(|p| p.probability).collect();
    df.with_column(Series::new(PREDICTION, labels))?;
    df.with_column(Series::new(CHURN_PROBABILITY, probabilities))?;
    Ok(df)
}

impl PredictionPipeline {
    /// Всё или ничего: при любой ошибке результата нет
    pub fn predict_batch(&self, df: DataFrame) -> Result<DataFrame> {
        let df = prepare(df, self.config())?;
        if df.height() == 0 {
            return Err(PipelineError::MalformedInput("uploaded file has no rows".to_string()));
        }

        let table = extract_features(&df, self)?;
        let predictions = self.predict_table(&table)?;

        let churned = predictions.iter().filter(|p| p.label == 1).count();
        tracing::info!("Batch prediction: {} rows, {} predicted to churn", df.height(), churned);

        append_predictions(df, &predictions)
    }

    pub fn predict_csv(&self, bytes: &[u8]) -> Result<DataFrame> {
        self.predict_batch(read_csv(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelBundle;
    use crate::testing::BUNDLE_JSON;

    const HEADER: &str = "RowNumber,CustomerId,Surname,CreditScore,Geography,Gender,Age,Tenure,Balance,NumOfProducts,HasCrCard,IsActiveMember,EstimatedSalary,Complain,Satisfaction Score,Card Type";

    fn pipeline(config: PipelineConfig) -> PredictionPipeline {
        PredictionPipeline::new(ModelBundle::from_json(BUNDLE_JSON).unwrap(), config)
    }

    fn csv(rows: &[&str]) -> Vec<u8> {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text.into_bytes()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn drops_admin_columns_and_appends_results() {
        let bytes = csv(&[
            "1,15634602,Hargrave,650,France,Female,40,5,50000.0,2,1,1,60000.0,1,3,GOLD",
            "2,15647311,Hill,600,Germany,Male,60,1,0.0,1,0,1,112542.58,0,2,SILVER",
        ]);
        let out = pipeline(PipelineConfig::default()).predict_csv(&bytes).unwrap();

        let columns = names(&out);
        for dropped in ["RowNumber", "CustomerId", "Complain"] {
            assert!(!columns.iter().any(|c| c == dropped));
        }
        let n = columns.len();
        assert_eq!(&columns[n - 2..], &["Prediction".to_string(), "Churn Probability".to_string()]);

        let labels: Vec<Option<i32>> = out.column(PREDICTION).unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(labels, vec![Some(0), Some(1)]);

        // исходные значения не заменяются закодированными
        let geography: Vec<Option<&str>> = out.column("Geography").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(geography, vec![Some("France"), Some("Germany")]);
    }

    #[test]
    fn late_fractional_value_is_read_as_float() {
        let mut rows: Vec<String> = (1..=150)
            .map(|i| format!("{i},{i},A,650,France,Female,40,5,0,2,1,1,60000,0,3,GOLD"))
            .collect();
        rows.push("151,151,B,608,Spain,Female,41,1,83807.86,1,0,1,112542.58,0,3,DIAMOND".to_string());
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();

        let out = pipeline(PipelineConfig::default()).predict_csv(&csv(&rows)).unwrap();
        assert_eq!(out.height(), 151);
        let balance = out.column("Balance").unwrap().cast(&DataType::Float64).unwrap();
        assert_eq!(balance.f64().unwrap().get(150), Some(83807.86));
    }

    #[test]
    fn missing_point_earned_defaults_per_row() {
        let bytes = csv(&[
            "1,1,A,650,France,Female,40,5,50000.0,2,1,1,60000.0,1,3,GOLD",
            "2,2,B,700,Spain,Male,30,3,1000.0,1,1,0,50000.0,0,4,DIAMOND",
        ]);
        let out = pipeline(PipelineConfig::default()).predict_csv(&bytes).unwrap();
        let points: Vec<Option<f64>> = out.column(POINT_EARNED).unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(points, vec![Some(500.0), Some(500.0)]);
    }

    #[test]
    fn disabled_default_keeps_column_absent() {
        let config = PipelineConfig {
            batch_point_earned_default: None,
            ..PipelineConfig::default()
        };
        let bytes = csv(&["1,1,A,650,France,Female,40,5,50000.0,2,1,1,60000.0,1,3,GOLD"]);
        let out = pipeline(config).predict_csv(&bytes).unwrap();
        assert!(out.column(POINT_EARNED).is_err());
    }

    #[test]
    fn existing_point_earned_is_kept() {
        let text = "CreditScore,Geography,Gender,Age,Tenure,Balance,NumOfProducts,EstimatedSalary,Card Type,Point Earned\n\
                    650,France,Female,40,5,50000.0,2,60000.0,GOLD,321\n";
        let out = pipeline(PipelineConfig::default()).predict_csv(text.as_bytes()).unwrap();
        let points = out.column(POINT_EARNED).unwrap().cast(&DataType::Float64).unwrap();
        assert_eq!(points.f64().unwrap().get(0), Some(321.0));
    }

    #[test]
    fn unknown_category_fails_whole_table() {
        let bytes = csv(&[
            "1,1,A,650,France,Female,40,5,50000.0,2,1,1,60000.0,1,3,GOLD",
            "2,2,B,700,Italy,Male,30,3,1000.0,1,1,0,50000.0,0,4,DIAMOND",
        ]);
        let err = pipeline(PipelineConfig::default()).predict_csv(&bytes).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { value, .. } if value == "Italy"));
    }

    #[test]
    fn malformed_number_reports_row() {
        let bytes = csv(&[
            "1,1,A,650,France,Female,40,5,50000.0,2,1,1,60000.0,1,3,GOLD",
            "2,2,B,700,Spain,Male,thirty,3,1000.0,1,1,0,50000.0,0,4,DIAMOND",
        ]);
        let err = pipeline(PipelineConfig::default()).predict_csv(&bytes).unwrap_err();
        assert!(err.is_expected());
        assert!(matches!(err, PipelineError::MalformedValue { column, row: 2 } if column == "Age"));
    }

    #[test]
    fn missing_required_column() {
        let text = "CreditScore,Geography,Gender,Tenure,Balance,NumOfProducts,EstimatedSalary,Card Type\n\
                    650,France,Female,5,50000.0,2,60000.0,GOLD\n";
        let err = pipeline(PipelineConfig::default()).predict_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "Age"));
    }

    #[test]
    fn header_only_upload_is_rejected() {
        let err = pipeline(PipelineConfig::default()).predict_csv(&csv(&[])).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
    }
}
