//! Immutable table wrappers handed to the renderer.
//!
//! [`CleanedTable`] is produced once by the loader and never mutated.
//! [`FilteredTable`] is derived from it per filter interaction and dropped
//! afterwards. Neither exposes a mutable handle to its frame.

use crate::imputers::ImputationStep;
use crate::schema::{self, Availability};
use crate::utils::any_value_to_json;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Record of the fills applied while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows: usize,
    pub columns: usize,
    pub steps: Vec<ImputationStep>,
    /// Fill-list columns that were not present in the source.
    pub skipped_columns: Vec<String>,
}

impl CleaningReport {
    /// Total number of cells filled across all steps.
    pub fn total_filled(&self) -> usize {
        self.steps.iter().map(|s| s.filled).sum()
    }
}

/// The dataset after cleaning. Read-only for the rest of the process.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    source_name: String,
    df: DataFrame,
    report: CleaningReport,
}

impl CleanedTable {
    pub(crate) fn new(source_name: String, df: DataFrame, report: CleaningReport) -> Self {
        Self {
            source_name,
            df,
            report,
        }
    }

    /// Display name of the source the table was loaded from.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn report(&self) -> &CleaningReport {
        &self.report
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.df)
    }

    /// Capability check against this table.
    pub fn check_columns(&self, needs: &[&'static str]) -> Availability {
        schema::check_columns(&self.df, needs)
    }

    pub fn to_columnar(&self) -> PolarsResult<ColumnarTable> {
        ColumnarTable::from_df(&self.df)
    }
}

/// A transient, filtered view of the cleaned table.
#[derive(Debug, Clone)]
pub struct FilteredTable {
    df: DataFrame,
}

impl FilteredTable {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn check_columns(&self, needs: &[&'static str]) -> Availability {
        schema::check_columns(&self.df, needs)
    }

    pub fn to_columnar(&self) -> PolarsResult<ColumnarTable> {
        ColumnarTable::from_df(&self.df)
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

// ============================================================================
// Column-oriented export
// ============================================================================

/// A single column of values ready for JSON serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnData {
    pub name: String,
    pub dtype: String,
    pub values: Vec<serde_json::Value>,
}

/// Column-oriented table structure consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnarTable {
    pub row_count: usize,
    pub columns: Vec<ColumnData>,
}

impl ColumnarTable {
    pub fn from_df(df: &DataFrame) -> PolarsResult<Self> {
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let mut values = Vec::with_capacity(series.len());
            for idx in 0..series.len() {
                values.push(any_value_to_json(series.get(idx)?));
            }
            columns.push(ColumnData {
                name: column.name().to_string(),
                dtype: column.dtype().to_string(),
                values,
            });
        }

        Ok(Self {
            row_count: df.height(),
            columns,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name)
    }
}

static_assertions::assert_impl_all!(CleanedTable: Send, Sync);
