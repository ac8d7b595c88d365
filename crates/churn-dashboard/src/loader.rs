//! Loading and cleaning of the churn dataset.
//!
//! The loader runs once per source: it reads the CSV, checks the hard
//! requirements, mode-fills the categorical service columns and KNN-imputes
//! the numeric usage columns. [`TableCache`] memoizes the result so repeated
//! requests for the same source share one [`CleanedTable`].
//!
//! ```rust,ignore
//! use churn_dashboard::{DashboardConfig, DataSource, TableCache};
//!
//! let mut cache = TableCache::new(DashboardConfig::default());
//! let table = cache.get_or_load(&DataSource::path("telecom_customer_churn.csv"))?;
//! let again = cache.get_or_load(&DataSource::path("telecom_customer_churn.csv"))?;
//! assert!(std::sync::Arc::ptr_eq(&table, &again));
//! ```

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result, ResultExt};
use crate::imputers::{KNNImputer, ModeImputer};
use crate::schema;
use crate::table::{CleanedTable, CleaningReport};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the raw dataset comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A CSV file on disk.
    Path(PathBuf),
    /// CSV content already in memory, with a display name.
    Inline { name: String, data: Vec<u8> },
}

impl DataSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        DataSource::Path(path.into())
    }

    pub fn inline(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        DataSource::Inline {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Display name used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            DataSource::Path(path) => path.display().to_string(),
            DataSource::Inline { name, .. } => name.clone(),
        }
    }

    /// Identity of the source used as the cache key.
    ///
    /// Files are identified by their canonical path, inline data by name and
    /// content digest.
    fn key(&self) -> Result<SourceKey> {
        match self {
            DataSource::Path(path) => {
                let canonical = std::fs::canonicalize(path)
                    .map_err(|_| DashboardError::SourceNotFound(path.clone()))?;
                Ok(SourceKey::File(canonical))
            }
            DataSource::Inline { name, data } => {
                let mut hasher = DefaultHasher::new();
                data.hash(&mut hasher);
                Ok(SourceKey::Inline {
                    name: name.clone(),
                    len: data.len(),
                    digest: hasher.finish(),
                })
            }
        }
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            DataSource::Path(path) => {
                if !path.exists() {
                    return Err(DashboardError::SourceNotFound(path.clone()));
                }
                std::fs::read(path).map_err(|e| DashboardError::SourceUnreadable {
                    source_name: self.name(),
                    reason: e.to_string(),
                })
            }
            DataSource::Inline { data, .. } => Ok(data.clone()),
        }
    }
}

impl From<&Path> for DataSource {
    fn from(path: &Path) -> Self {
        DataSource::Path(path.to_path_buf())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    File(PathBuf),
    Inline { name: String, len: usize, digest: u64 },
}

// ============================================================================
// Load & clean
// ============================================================================

/// Read `source` and produce the cleaned table.
///
/// Fails with a data-source error when the source is missing, unreadable,
/// lacks a required column or cannot be imputed.
pub fn load_and_clean(source: &DataSource, config: &DashboardConfig) -> Result<CleanedTable> {
    config.validate()?;

    info!("Loading dataset from: {}", source.name());
    let raw = read_csv(source, config)?;
    info!("Dataset loaded successfully: {:?}", raw.shape());

    clean_dataframe(source.name(), raw, config)
}

/// Clean an already loaded frame.
///
/// Steps, each over the full table:
/// 1. check required columns and the numeric type of `Age` and the KNN columns
/// 2. mode-fill the categorical fill list
/// 3. KNN-impute the numeric columns
pub fn clean_dataframe(
    source_name: impl Into<String>,
    raw: DataFrame,
    config: &DashboardConfig,
) -> Result<CleanedTable> {
    let source_name = source_name.into();
    let mut df = raw;

    let missing: Vec<String> = config
        .required_columns
        .iter()
        .filter(|col| df.column(col).is_err())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::MissingRequiredColumns(missing));
    }

    let numeric_columns: Vec<String> = std::iter::once(schema::AGE.to_string())
        .chain(config.knn_columns.iter().cloned())
        .filter(|col| df.column(col).is_ok())
        .collect();
    for col in &numeric_columns {
        ensure_numeric(&mut df, col)?;
    }

    let skipped_columns: Vec<String> = config
        .categorical_fill_columns
        .iter()
        .filter(|col| df.column(col).is_err())
        .cloned()
        .collect();
    if !skipped_columns.is_empty() {
        warn!(
            "Columns not present in dataset, related features disabled: {:?}",
            skipped_columns
        );
    }

    info!("Filling categorical columns with their mode...");
    let mut steps = ModeImputer::fill_columns(&mut df, &config.categorical_fill_columns)
        .context("Mode imputation")?;

    let knn_columns: Vec<String> = config
        .knn_columns
        .iter()
        .filter(|col| df.column(col).is_ok())
        .cloned()
        .collect();
    if !knn_columns.is_empty() {
        info!(
            "KNN imputation (k={}) for {:?}...",
            config.knn_neighbors, knn_columns
        );
        let (imputed, knn_steps) = KNNImputer::new(config.knn_neighbors)
            .fit_transform(&df, &knn_columns)
            .context("KNN imputation")?;
        df = imputed;
        steps.extend(knn_steps);
    }

    for step in &steps {
        debug!("{}", step);
    }

    let report = CleaningReport {
        rows: df.height(),
        columns: df.width(),
        steps,
        skipped_columns,
    };
    info!(
        "Cleaning complete: {} cells filled across {} columns",
        report.total_filled(),
        report.steps.len()
    );

    Ok(CleanedTable::new(source_name, df, report))
}

/// Make sure a column that must hold numbers does.
///
/// An entirely empty column is read as strings by the CSV reader; it is cast
/// to Float64 so later stages see a numeric column with no values.
fn ensure_numeric(df: &mut DataFrame, col: &str) -> Result<()> {
    let column = df.column(col)?;
    if is_numeric_dtype(column.dtype()) {
        return Ok(());
    }

    if column.null_count() == column.len() {
        let cast = column.cast(&DataType::Float64)?;
        df.replace(col, cast.take_materialized_series())?;
        return Ok(());
    }

    Err(DashboardError::InvalidColumnType {
        column: col.to_string(),
        expected: "numeric".to_string(),
        actual: column.dtype().to_string(),
    })
}

/// Read and parse the CSV content.
///
/// A parse failure is fatal; the content is never rewritten and retried.
fn read_csv(source: &DataSource, config: &DashboardConfig) -> Result<DataFrame> {
    let bytes = source.read_bytes()?;

    parse_csv(bytes, config).map_err(|e| {
        debug!("Parsing {} failed: {}", source.name(), e);
        DashboardError::SourceUnreadable {
            source_name: source.name(),
            reason: e.to_string(),
        }
    })
}

fn parse_csv(bytes: Vec<u8>, config: &DashboardConfig) -> PolarsResult<DataFrame> {
    let mut parse_options = CsvParseOptions::default().with_quote_char(Some(b'"'));
    if !config.null_values.is_empty() {
        let tokens = config
            .null_values
            .iter()
            .map(|token| token.as_str().into())
            .collect();
        parse_options = parse_options.with_null_values(Some(NullValues::AllColumns(tokens)));
    }

    CsvReadOptions::default()
        .with_infer_schema_length(config.infer_schema_length)
        .with_has_header(true)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}
