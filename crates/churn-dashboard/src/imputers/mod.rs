//! Imputation module for handling missing values.
//!
//! This module provides the two strategies the cleaner applies:
//! - Mode imputation for categorical service and offer columns
//! - KNN imputation for the numeric usage columns

mod knn;
mod mode;

pub use knn::KNNImputer;
pub use mode::ModeImputer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a column's gaps were filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ImputationMethod {
    Mode,
    NearestNeighbors { k: usize },
}

/// One fill operation performed while cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationStep {
    pub column: String,
    #[serde(flatten)]
    pub method: ImputationMethod,
    /// Number of cells that were filled.
    pub filled: usize,
    /// The constant fill value, for methods that use one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Display for ImputationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.method, &self.value) {
            (ImputationMethod::Mode, Some(value)) => write!(
                f,
                "Filled {} missing '{}' values with mode '{}'",
                self.filled, self.column, value
            ),
            (ImputationMethod::Mode, None) => write!(
                f,
                "Filled {} missing '{}' values with mode",
                self.filled, self.column
            ),
            (ImputationMethod::NearestNeighbors { k }, _) => write!(
                f,
                "Imputed {} missing '{}' values from {} nearest neighbors",
                self.filled, self.column, k
            ),
        }
    }
}
