//! Общие фикстуры для модульных тестов

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};

use crate::error::Result;
use crate::models::ChurnClassifier;
use crate::types::{CustomerForm, CustomerRecord};

pub const BUNDLE_JSON: &str = include_str!("../demos/model.json");

pub fn sample_form() -> CustomerForm {
    CustomerForm {
        surname: "Hargrave".to_string(),
        record: sample_record(),
    }
}

pub fn sample_record() -> CustomerRecord {
    CustomerRecord {
        credit_score: 650,
        geography: "France".to_string(),
        gender: "Female".to_string(),
        age: 40,
        tenure: 5,
        balance: 50000.0,
        num_of_products: 2,
        has_credit_card: 1,
        is_active_member: 1,
        estimated_salary: 60000.0,
        card_type: "GOLD".to_string(),
        satisfaction_score: 3,
        point_earned: 500,
    }
}

/// Детерминированный классификатор с фиксированным ответом
pub struct StubClassifier {
    pub label: u8,
    pub proba: f64,
    pub n_features: usize,
}

impl ChurnClassifier for StubClassifier {
    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_proba(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_elem(X.nrows(), self.proba))
    }

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<u8>> {
        Ok(Array1::from_elem(X.nrows(), self.label))
    }
}
