//! Configuration types for the churn dashboard.
//!
//! This module provides configuration options using the builder pattern.
//! Defaults reproduce the telecom churn dataset layout, so most callers only
//! need [`DashboardConfig::default()`].

use crate::error::{DashboardError, Result};
use crate::schema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for loading, cleaning and summarizing the dataset.
///
/// Use [`DashboardConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use churn_dashboard::config::DashboardConfig;
///
/// let config = DashboardConfig::builder()
///     .knn_neighbors(5)
///     .age_histogram_bins(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Categorical columns whose missing entries are replaced by the mode.
    /// Default: the eleven service and offer columns.
    pub categorical_fill_columns: Vec<String>,

    /// Numeric columns imputed with nearest neighbours. They also form the
    /// feature space used for the distance computation.
    /// Default: long distance charges and GB download.
    pub knn_columns: Vec<String>,

    /// Number of neighbours averaged by the KNN imputer.
    /// Default: 3
    pub knn_neighbors: usize,

    /// Columns that must be present for the dataset to load.
    /// Default: Age and both KNN columns.
    pub required_columns: Vec<String>,

    /// Number of rows used by the CSV reader for schema inference.
    /// `None` scans the whole file.
    /// Default: 10000
    pub infer_schema_length: Option<usize>,

    /// Number of equal-width bins of the age distribution panel.
    /// Default: 20
    pub age_histogram_bins: usize,

    /// Cell values read as missing, in addition to empty cells.
    /// Default: the common NA markers (`NA`, `N/A`, `NaN`, `null`, ...).
    /// `None` is not among them: in the Offer column it is a real value.
    pub null_values: Vec<String>,
}

/// Tokens read as missing by default.
pub const DEFAULT_NULL_VALUES: [&str; 17] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "n/a", "nan", "null",
];

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            categorical_fill_columns: to_owned(&schema::CATEGORICAL_FILL_COLUMNS),
            knn_columns: to_owned(&schema::KNN_COLUMNS),
            knn_neighbors: 3,
            required_columns: to_owned(&schema::REQUIRED_COLUMNS),
            infer_schema_length: Some(10_000),
            age_histogram_bins: 20,
            null_values: to_owned(&DEFAULT_NULL_VALUES),
        }
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl DashboardConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: DashboardConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| DashboardError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        if self.knn_columns.is_empty() {
            return Err(ConfigValidationError::EmptyColumnList(
                "knn_columns".to_string(),
            ));
        }

        if self.age_histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidHistogramBins(
                self.age_histogram_bins,
            ));
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidSchemaLength);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Column list '{0}' must not be empty")]
    EmptyColumnList(String),

    #[error("Invalid histogram bin count: {0} (must be at least 1)")]
    InvalidHistogramBins(usize),

    #[error("Schema inference length must be at least 1 row")]
    InvalidSchemaLength,
}

impl From<ConfigValidationError> for DashboardError {
    fn from(e: ConfigValidationError) -> Self {
        DashboardError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`DashboardConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    categorical_fill_columns: Option<Vec<String>>,
    knn_columns: Option<Vec<String>>,
    knn_neighbors: Option<usize>,
    required_columns: Option<Vec<String>>,
    infer_schema_length: Option<Option<usize>>,
    age_histogram_bins: Option<usize>,
    null_values: Option<Vec<String>>,
}

impl DashboardConfigBuilder {
    /// Set the categorical columns filled with their mode.
    pub fn categorical_fill_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_fill_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the numeric columns imputed with nearest neighbours.
    pub fn knn_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.knn_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set the columns that must be present in the source.
    pub fn required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set how many rows the CSV reader inspects to infer column types.
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the number of bins of the age distribution.
    pub fn age_histogram_bins(mut self, bins: usize) -> Self {
        self.age_histogram_bins = Some(bins);
        self
    }

    /// Set the cell values read as missing.
    pub fn null_values<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DashboardConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<DashboardConfig, ConfigValidationError> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            categorical_fill_columns: self
                .categorical_fill_columns
                .unwrap_or(defaults.categorical_fill_columns),
            knn_columns: self.knn_columns.unwrap_or(defaults.knn_columns),
            knn_neighbors: self.knn_neighbors.unwrap_or(defaults.knn_neighbors),
            required_columns: self.required_columns.unwrap_or(defaults.required_columns),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            age_histogram_bins: self
                .age_histogram_bins
                .unwrap_or(defaults.age_histogram_bins),
            null_values: self.null_values.unwrap_or(defaults.null_values),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.knn_neighbors, 3);
        assert_eq!(config.categorical_fill_columns.len(), 11);
        assert_eq!(
            config.knn_columns,
            vec![
                "Avg Monthly Long Distance Charges".to_string(),
                "Avg Monthly GB Download".to_string()
            ]
        );
        assert!(config.required_columns.contains(&"Age".to_string()));
        assert_eq!(config.age_histogram_bins, 20);
        assert!(config.null_values.contains(&"N/A".to_string()));
        assert!(!config.null_values.contains(&"None".to_string()));
    }

    #[test]
    fn test_builder_defaults() {
        let config = DashboardConfig::builder().build().unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = DashboardConfig::builder()
            .knn_neighbors(5)
            .categorical_fill_columns(["Offer"])
            .required_columns(Vec::<String>::new())
            .infer_schema_length(None)
            .age_histogram_bins(10)
            .null_values(["-"])
            .build()
            .unwrap();

        assert_eq!(config.knn_neighbors, 5);
        assert_eq!(config.categorical_fill_columns, vec!["Offer".to_string()]);
        assert!(config.required_columns.is_empty());
        assert_eq!(config.infer_schema_length, None);
        assert_eq!(config.age_histogram_bins, 10);
        assert_eq!(config.null_values, vec!["-".to_string()]);
    }

    #[test]
    fn test_validation_invalid_knn_neighbors() {
        let result = DashboardConfig::builder().knn_neighbors(0).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidKnnNeighbors(0)
        ));
    }

    #[test]
    fn test_validation_empty_knn_columns() {
        let result = DashboardConfig::builder()
            .knn_columns(Vec::<String>::new())
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyColumnList(_)
        ));
    }

    #[test]
    fn test_validation_zero_bins() {
        let result = DashboardConfig::builder().age_histogram_bins(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        // Omitted fields fall back to defaults
        let json = r#"{ "knn_neighbors": 7 }"#;

        let config: DashboardConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.knn_neighbors, 7);
        assert_eq!(config.categorical_fill_columns.len(), 11);
        assert_eq!(config.age_histogram_bins, 20);
    }

    #[test]
    fn test_config_serialization() {
        let config = DashboardConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: DashboardConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }
}
