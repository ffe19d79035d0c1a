/// Типы данных для предсказания оттока

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PipelineError;
use crate::preprocessing::FeatureTable;

// Имена столбцов в том виде, в котором на них обучалась модель
pub const CREDIT_SCORE: &str = "CreditScore";
pub const GEOGRAPHY: &str = "Geography";
pub const GENDER: &str = "Gender";
pub const AGE: &str = "Age";
pub const TENURE: &str = "Tenure";
pub const BALANCE: &str = "Balance";
pub const NUM_OF_PRODUCTS: &str = "NumOfProducts";
pub const HAS_CR_CARD: &str = "HasCrCard";
pub const IS_ACTIVE_MEMBER: &str = "IsActiveMember";
pub const ESTIMATED_SALARY: &str = "EstimatedSalary";
pub const CARD_TYPE: &str = "Card Type";
pub const SATISFACTION_SCORE: &str = "Satisfaction Score";
pub const POINT_EARNED: &str = "Point Earned";

pub const PREDICTION: &str = "Prediction";
pub const CHURN_PROBABILITY: &str = "Churn Probability";

pub const CATEGORICAL_COLUMNS: [&str; 3] = [GEOGRAPHY, GENDER, CARD_TYPE];

pub const NUMERICAL_COLUMNS: [&str; 6] = [
    CREDIT_SCORE,
    AGE,
    BALANCE,
    ESTIMATED_SALARY,
    TENURE,
    NUM_OF_PRODUCTS,
];

/// Столбцы, которые не участвуют в предсказании, но сохраняются в записи
pub const PASSTHROUGH_COLUMNS: [&str; 4] =
    [HAS_CR_CARD, IS_ACTIVE_MEMBER, SATISFACTION_SCORE, POINT_EARNED];

pub const GEOGRAPHY_CHOICES: [&str; 3] = ["France", "Spain", "Germany"];
pub const GENDER_CHOICES: [&str; 2] = ["Male", "Female"];
pub const CARD_TYPE_CHOICES: [&str; 4] = ["SILVER", "GOLD", "PLATINUM", "DIAMOND"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub credit_score: i32,
    pub geography: String,
    pub gender: String,
    pub age: i32,
    pub tenure: i32,
    pub balance: f64,
    pub num_of_products: i32,
    pub has_credit_card: i32,
    pub is_active_member: i32,
    pub estimated_salary: f64,
    pub card_type: String,
    pub satisfaction_score: i32,
    pub point_earned: i32,
}

impl CustomerRecord {
    /// Таблица из одной строки для общего конвейера
    pub fn to_table(&self) -> Result<FeatureTable, PipelineError> {
        let mut table = FeatureTable::new(1);
        table.insert_categorical(GEOGRAPHY, vec![self.geography.clone()])?;
        table.insert_categorical(GENDER, vec![self.gender.clone()])?;
        table.insert_categorical(CARD_TYPE, vec![self.card_type.clone()])?;

        table.insert_numeric(CREDIT_SCORE, vec![self.credit_score as f64])?;
        table.insert_numeric(AGE, vec![self.age as f64])?;
        table.insert_numeric(TENURE, vec![self.tenure as f64])?;
        table.insert_numeric(BALANCE, vec![self.balance])?;
        table.insert_numeric(NUM_OF_PRODUCTS, vec![self.num_of_products as f64])?;
        table.insert_numeric(HAS_CR_CARD, vec![self.has_credit_card as f64])?;
        table.insert_numeric(IS_ACTIVE_MEMBER, vec![self.is_active_member as f64])?;
        table.insert_numeric(ESTIMATED_SALARY, vec![self.estimated_salary])?;
        table.insert_numeric(SATISFACTION_SCORE, vec![self.satisfaction_score as f64])?;
        table.insert_numeric(POINT_EARNED, vec![self.point_earned as f64])?;
        Ok(table)
    }
}

/// Данные формы предсказания: запись клиента плюс фамилия для отображения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerForm {
    pub surname: String,
    #[serde(flatten)]
    pub record: CustomerRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
#[error("invalid form: {}", join_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CustomerForm {
    /// Проверка диапазонов и допустимых значений; собирает все нарушения сразу
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        let r = &self.record;

        let surname = self.surname.trim();
        if surname.is_empty() {
            errors.push(FieldError {
                field: "surname",
                message: "This field is required.".to_string(),
            });
        } else if surname.chars().count() > 100 {
            errors.push(FieldError {
                field: "surname",
                message: "Field cannot be longer than 100 characters.".to_string(),
            });
        }

        check_range(&mut errors, "credit_score", r.credit_score as f64, 300.0, Some(900.0));
        check_range(&mut errors, "age", r.age as f64, 18.0, Some(100.0));
        check_range(&mut errors, "tenure", r.tenure as f64, 0.0, Some(20.0));
        check_range(&mut errors, "balance", r.balance, 0.0, None);
        check_range(&mut errors, "num_of_products", r.num_of_products as f64, 1.0, Some(4.0));
        check_range(&mut errors, "has_credit_card", r.has_credit_card as f64, 0.0, Some(1.0));
        check_range(&mut errors, "is_active_member", r.is_active_member as f64, 0.0, Some(1.0));
        check_range(&mut errors, "estimated_salary", r.estimated_salary, 0.0, None);
        check_range(&mut errors, "satisfaction_score", r.satisfaction_score as f64, 1.0, Some(5.0));
        check_range(&mut errors, "point_earned", r.point_earned as f64, 0.0, Some(1000.0));

        check_choice(&mut errors, "geography", &r.geography, &GEOGRAPHY_CHOICES);
        check_choice(&mut errors, "gender", &r.gender, &GENDER_CHOICES);
        check_choice(&mut errors, "card_type", &r.card_type, &CARD_TYPE_CHOICES);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }
}

fn check_range(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: f64,
    min: f64,
    max: Option<f64>,
) {
    let out_of_range = !value.is_finite() || value < min || max.map_or(false, |m| value > m);
    if out_of_range {
        let message = match max {
            Some(max) => format!("Number must be between {} and {}.", min, max),
            None => format!("Number must be at least {}.", min),
        };
        errors.push(FieldError { field, message });
    }
}

fn check_choice(errors: &mut Vec<FieldError>, field: &'static str, value: &str, choices: &[&str]) {
    if !choices.contains(&value) {
        errors.push(FieldError {
            field,
            message: "Not a valid choice.".to_string(),
        });
    }
}

/// Результат предсказания: метка (1 = отток) и вероятность оттока в процентах
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub label: u8,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub success: bool,
    pub customer_name: String,
    pub prediction: u8,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub success: bool,
    pub result_file: String,
    pub download_url: String,
    pub rows: usize,
}
