//! Mode imputation for categorical columns.

use super::{ImputationMethod, ImputationStep};
use crate::error::Result;
use crate::utils::{fill_string_nulls, string_mode};
use polars::prelude::*;
use tracing::{debug, warn};

/// Replaces missing categorical entries with the column's most frequent value.
///
/// The mode is computed over non-missing entries only, so a filled value is
/// always one that already occurred in the column. See
/// [`string_mode`](crate::utils::string_mode) for the tie-break rule.
pub struct ModeImputer;

impl ModeImputer {
    /// Fill every listed column in place.
    ///
    /// Columns absent from the frame are skipped; they surface later as
    /// unavailable features. Returns one step per column that was filled.
    pub fn fill_columns(df: &mut DataFrame, columns: &[String]) -> Result<Vec<ImputationStep>> {
        let mut steps = Vec::new();

        for col in columns {
            if df.column(col).is_err() {
                debug!("Skipping mode fill for absent column '{}'", col);
                continue;
            }
            if let Some(step) = Self::fill_column(df, col)? {
                steps.push(step);
            }
        }

        Ok(steps)
    }

    /// Fill a single column, returning `None` when nothing was filled.
    pub fn fill_column(df: &mut DataFrame, col: &str) -> Result<Option<ImputationStep>> {
        let series = df.column(col)?.as_materialized_series().clone();
        let missing = series.null_count();

        if missing == 0 {
            return Ok(None);
        }

        let Some(mode_val) = string_mode(&series) else {
            warn!("Column '{}' has no observed values, leaving it unfilled", col);
            return Ok(None);
        };

        let filled = fill_string_nulls(&series, &mode_val)?;
        df.replace(col, filled)?;

        debug!("Filled {} values in '{}' with mode '{}'", missing, col, mode_val);

        Ok(Some(ImputationStep {
            column: col.to_string(),
            method: ImputationMethod::Mode,
            filled: missing,
            value: Some(mode_val),
        }))
    }
}
