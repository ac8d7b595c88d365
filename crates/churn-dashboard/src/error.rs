//! Error and degradation types for the churn dashboard.
//!
//! Two kinds of failure exist:
//!
//! - [`DashboardError`] is a hard failure. The data-source class of errors
//!   (unreadable file, missing required column, unfillable numeric column)
//!   aborts the whole dashboard and is reported once at startup.
//! - [`Notice`] is a soft failure contained to a single feature: a metric or
//!   panel whose columns are absent, or a filter combination that matched no
//!   rows. Everything else keeps computing.
//!
//! Both are serializable so a renderer can display them as-is.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for loading, cleaning and filtering.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The source file does not exist.
    #[error("Data source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source exists but could not be read or parsed as CSV.
    #[error("Failed to read data source '{source_name}': {reason}")]
    SourceUnreadable { source_name: String, reason: String },

    /// One or more hard-required columns are absent.
    #[error("Data source is missing required columns: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),

    /// A required column has an unusable data type.
    #[error("Column '{column}' has type {actual}, expected {expected}")]
    InvalidColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    /// No valid values found in a column that must be fully populated.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// A filter selection is malformed (e.g. an inverted age range).
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DashboardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::SourceUnreadable { .. } => "SOURCE_UNREADABLE",
            Self::MissingRequiredColumns(_) => "MISSING_REQUIRED_COLUMNS",
            Self::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error belongs to the data-source class.
    ///
    /// These errors are fatal: the dataset cannot be loaded or cleaned, so
    /// there is nothing to filter. They are never retried.
    pub fn is_data_source_error(&self) -> bool {
        match self {
            Self::SourceNotFound(_)
            | Self::SourceUnreadable { .. }
            | Self::MissingRequiredColumns(_)
            | Self::InvalidColumnType { .. }
            | Self::NoValidValues(_)
            | Self::ImputationFailed { .. }
            | Self::Io(_)
            | Self::Polars(_) => true,
            Self::WithContext { source, .. } => source.is_data_source_error(),
            Self::InvalidFilter(_) | Self::InvalidConfig(_) | Self::Json(_) => false,
        }
    }

    /// Check if this error is recoverable by changing user input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidFilter(_) | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Serialize implementation for renderer compatibility.
///
/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for DashboardError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DashboardError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DashboardError::Polars(e).with_context(context))
    }
}

// ============================================================================
// Non-fatal degradations
// ============================================================================

/// A non-fatal condition that disables one feature of the dashboard.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A feature needs columns the dataset does not have.
    #[error("{feature}: data not available in this dataset (missing {})", .columns.join(", "))]
    ColumnUnavailable {
        feature: String,
        columns: Vec<String>,
    },

    /// The current filter combination matched no rows.
    #[error("No data for the current filter selection")]
    EmptyFilterResult,
}

impl Notice {
    pub fn column_unavailable(feature: impl Into<String>, columns: &[&str]) -> Self {
        Notice::ColumnUnavailable {
            feature: feature.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            DashboardError::SourceNotFound(PathBuf::from("x.csv")).error_code(),
            "SOURCE_NOT_FOUND"
        );
        assert_eq!(
            DashboardError::MissingRequiredColumns(vec!["Age".to_string()]).error_code(),
            "MISSING_REQUIRED_COLUMNS"
        );
    }

    #[test]
    fn test_data_source_class() {
        assert!(DashboardError::SourceNotFound(PathBuf::from("x.csv")).is_data_source_error());
        assert!(DashboardError::NoValidValues("Age".to_string()).is_data_source_error());
        assert!(!DashboardError::InvalidFilter("bad".to_string()).is_data_source_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(DashboardError::InvalidFilter("bad".to_string()).is_recoverable());
        assert!(!DashboardError::MissingRequiredColumns(vec![]).is_recoverable());
    }

    #[test]
    fn test_missing_columns_message_lists_all() {
        let error = DashboardError::MissingRequiredColumns(vec![
            "Age".to_string(),
            "Avg Monthly GB Download".to_string(),
        ]);
        assert_eq!(
            error.to_string(),
            "Data source is missing required columns: Age, Avg Monthly GB Download"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = DashboardError::MissingRequiredColumns(vec!["Age".to_string()]);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("MISSING_REQUIRED_COLUMNS"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = DashboardError::NoValidValues("Avg Monthly GB Download".to_string())
            .with_context("While cleaning telecom.csv");
        assert!(error.to_string().contains("While cleaning"));
        assert_eq!(error.error_code(), "NO_VALID_VALUES");
        assert!(error.is_data_source_error());
    }

    #[test]
    fn test_notice_serialization() {
        let notice = Notice::column_unavailable("Offer popularity", &["Offer"]);
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["kind"], "column_unavailable");
        assert_eq!(json["columns"][0], "Offer");

        let json = serde_json::to_value(Notice::EmptyFilterResult).unwrap();
        assert_eq!(json["kind"], "empty_filter_result");
    }
}
