//! Sidebar filters: contract type, age range and offer.
//!
//! # Empty selections
//!
//! A multi-select filter is either [`Selection::All`] (the default, full
//! domain, no restriction) or [`Selection::Only`] with an explicit set of
//! values. `Only` with an empty set is a deliberate "exclude everything"
//! and yields no rows as long as the column has any values. A filter over a
//! column that is absent or holds no values at all never restricts.

use crate::error::{DashboardError, Notice, Result};
use crate::schema::{self, Availability};
use crate::table::{CleanedTable, FilteredTable};
use crate::utils::{column_as_f64, column_as_strings};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Allowed values of a multi-select filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "values", rename_all = "snake_case")]
pub enum Selection {
    /// Every value passes.
    #[default]
    All,
    /// Only the listed values pass; rows with a missing value never do.
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }

    /// An explicit empty selection.
    pub fn none() -> Self {
        Selection::Only(BTreeSet::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    fn allows(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => value.is_some_and(|v| values.contains(v)),
        }
    }
}

/// Inclusive age bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    min: i64,
    max: i64,
}

impl AgeRange {
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(DashboardError::InvalidFilter(format!(
                "age range minimum {} exceeds maximum {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, age: f64) -> bool {
        age >= self.min as f64 && age <= self.max as f64
    }
}

/// The full set of filter predicates for one interaction.
///
/// The default selection restricts nothing and returns the cleaned table
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub contract_types: Selection,
    /// `None` means no age restriction. When set, rows with a missing age
    /// are excluded.
    pub age_range: Option<AgeRange>,
    pub offers: Selection,
}

impl FilterSelection {
    /// The sidebar's initial state: every listed value selected and the age
    /// slider spanning the full bounds.
    ///
    /// Unlike [`FilterSelection::default`], this excludes rows whose contract,
    /// offer or age is missing.
    pub fn from_options(options: &FilterOptions) -> Self {
        let contract_types = if options.contract_types.is_empty() {
            Selection::All
        } else {
            Selection::only(options.contract_types.iter().cloned())
        };
        let offers = match &options.offers {
            Some(offers) if !offers.is_empty() => Selection::only(offers.iter().cloned()),
            _ => Selection::All,
        };

        Self {
            contract_types,
            age_range: Some(options.full_age_range()),
            offers,
        }
    }
}

/// The values a user can choose from, derived from the cleaned table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct contract types, sorted. Empty when the column is absent.
    pub contract_types: Vec<String>,
    /// Integer age bounds; `(0, 100)` when no age is known.
    pub age_bounds: (i64, i64),
    /// Distinct offers, sorted. `None` when the Offer column is absent.
    pub offers: Option<Vec<String>>,
}

impl FilterOptions {
    pub const DEFAULT_AGE_BOUNDS: (i64, i64) = (0, 100);

    pub fn from_table(table: &CleanedTable) -> Result<Self> {
        let df = table.df();

        let contract_types = if df.column(schema::CONTRACT).is_ok() {
            distinct_values(df, schema::CONTRACT)?
        } else {
            Vec::new()
        };

        let offers = if df.column(schema::OFFER).is_ok() {
            Some(distinct_values(df, schema::OFFER)?)
        } else {
            None
        };

        let age_bounds = if df.column(schema::AGE).is_ok() {
            let ages: Vec<f64> = column_as_f64(df, schema::AGE)?
                .into_iter()
                .flatten()
                .collect();
            let min = ages.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = ages.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if ages.is_empty() {
                Self::DEFAULT_AGE_BOUNDS
            } else {
                (min.floor() as i64, max.ceil() as i64)
            }
        } else {
            Self::DEFAULT_AGE_BOUNDS
        };

        Ok(Self {
            contract_types,
            age_bounds,
            offers,
        })
    }

    /// Age range covering every known age.
    pub fn full_age_range(&self) -> AgeRange {
        AgeRange {
            min: self.age_bounds.0,
            max: self.age_bounds.1,
        }
    }
}

fn distinct_values(df: &DataFrame, col: &str) -> Result<Vec<String>> {
    let values: BTreeSet<String> = column_as_strings(df, col)?.into_iter().flatten().collect();
    Ok(values.into_iter().collect())
}

// ============================================================================
// Filtering
// ============================================================================

/// Apply every predicate of `selection` conjunctively.
///
/// Returns the filtered rows plus a notice for each filter that referenced
/// an absent column (that filter is skipped).
pub fn filter_table(
    table: &CleanedTable,
    selection: &FilterSelection,
) -> Result<(FilteredTable, Vec<Notice>)> {
    let df = table.df();
    let mut keep = vec![true; df.height()];
    let mut notices = Vec::new();

    apply_selection(
        df,
        schema::CONTRACT,
        "Contract filter",
        &selection.contract_types,
        &mut keep,
        &mut notices,
    )?;

    if let Some(range) = selection.age_range {
        match schema::check_columns(df, &[schema::AGE]) {
            Availability::Available => {
                let ages = column_as_f64(df, schema::AGE)?;
                for (flag, age) in keep.iter_mut().zip(ages) {
                    *flag &= age.is_some_and(|a| range.contains(a));
                }
            }
            Availability::Unavailable { missing } => {
                notices.push(Notice::column_unavailable("Age filter", &missing));
            }
        }
    }

    apply_selection(
        df,
        schema::OFFER,
        "Offer filter",
        &selection.offers,
        &mut keep,
        &mut notices,
    )?;

    let mask = BooleanChunked::from_slice("mask".into(), &keep);
    let filtered = df.filter(&mask)?;
    debug!("Filtered {} of {} rows", filtered.height(), df.height());

    Ok((FilteredTable::new(filtered), notices))
}

fn apply_selection(
    df: &DataFrame,
    col: &'static str,
    feature: &str,
    selection: &Selection,
    keep: &mut [bool],
    notices: &mut Vec<Notice>,
) -> Result<()> {
    if selection.is_all() {
        return Ok(());
    }

    if let Availability::Unavailable { missing } = schema::check_columns(df, &[col]) {
        notices.push(Notice::column_unavailable(feature, &missing));
        return Ok(());
    }

    let values = column_as_strings(df, col)?;
    if values.iter().all(Option::is_none) {
        // Empty domain: nothing to choose from, nothing to restrict
        return Ok(());
    }

    for (flag, value) in keep.iter_mut().zip(&values) {
        *flag &= selection.allows(value.as_deref());
    }

    Ok(())
}
