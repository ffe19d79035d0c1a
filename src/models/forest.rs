//! Случайный лес решающих деревьев (только инференс)

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::classifier::{check_width, ChurnClassifier};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// value - доля класса 1 в листе
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_single(&self, sample: &ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    /// Первый лист со значением вне [0, 1] (NaN тоже)
    fn invalid_leaf(&self) -> Option<f64> {
        match self {
            TreeNode::Leaf { value } => (!(0.0..=1.0).contains(value)).then_some(*value),
            TreeNode::Split { left, right, .. } => left.invalid_leaf().or_else(|| right.invalid_leaf()),
        }
    }

    fn max_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => [Some(*feature), left.max_feature(), right.max_feature()]
                .into_iter()
                .flatten()
                .max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<TreeNode>,
}

impl RandomForest {
    pub fn new(n_features: usize, trees: Vec<TreeNode>) -> Result<Self> {
        let forest = Self { n_features, trees };
        forest.validate()?;
        Ok(forest)
    }

    /// Проверка структуры при загрузке: деревья есть, не ссылаются на лишние
    /// признаки, а листья содержат вероятности
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(PipelineError::InvalidModel("random forest has no trees".to_string()));
        }
        if let Some(max) = self.trees.iter().filter_map(TreeNode::max_feature).max() {
            if max >= self.n_features {
                return Err(PipelineError::InvalidModel(format!(
                    "split on feature {} but the forest has {} features",
                    max, self.n_features
                )));
            }
        }
        if let Some(value) = self.trees.iter().find_map(TreeNode::invalid_leaf) {
            return Err(PipelineError::InvalidModel(format!(
                "leaf value {} is not a probability",
                value
            )));
        }
        Ok(())
    }
}

impl ChurnClassifier for RandomForest {
    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_proba(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(self.n_features, X)?;

        let n_trees = self.trees.len() as f64;
        let mut probabilities = Array1::zeros(X.nrows());
        for (i, row) in X.rows().into_iter().enumerate() {
            let sum: f64 = self.trees.iter().map(|t| t.predict_single(&row)).sum();
            probabilities[i] = sum / n_trees;
        }

        Ok(probabilities)
    }
}
