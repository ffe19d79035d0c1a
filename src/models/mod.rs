/// ML модели

pub mod bundle;
pub mod classifier;
pub mod forest;
pub mod logistic;

pub use bundle::{BundleError, ModelBundle};
pub use classifier::{ChurnClassifier, ModelSpec, UnfittedClassifier};
pub use forest::{RandomForest, TreeNode};
pub use logistic::LogisticModel;
