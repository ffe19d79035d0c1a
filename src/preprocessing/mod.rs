/// Модуль предобработки данных

pub mod encoding;
pub mod normalization;
pub mod selection;
pub mod table;

pub use encoding::{FeatureEncoder, LabelEncoder};
pub use normalization::StandardScaler;
pub use selection::FeatureSelector;
pub use table::{Column, FeatureTable};
