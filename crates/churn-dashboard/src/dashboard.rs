//! The filter-and-summarize engine behind the dashboard.
//!
//! [`apply_filters`] is the per-interaction entry point: it narrows the
//! cleaned table and recomputes the headline metrics. [`Dashboard`] wraps a
//! shared cleaned table together with its filter options and produces full
//! [`DashboardSnapshot`]s for the renderer.

use crate::config::DashboardConfig;
use crate::error::{Notice, Result};
use crate::filters::{FilterOptions, FilterSelection, filter_table};
use crate::loader::{DataSource, TableCache};
use crate::metrics::Metrics;
use crate::panels::PanelSet;
use crate::table::{CleanedTable, CleaningReport, FilteredTable};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one filter interaction.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: FilteredTable,
    pub metrics: Metrics,
    /// Non-fatal conditions raised by the filters and metrics.
    pub notices: Vec<Notice>,
}

/// Filter the cleaned table and compute the metrics over the result.
///
/// An empty result is not an error: both metrics report no data and an
/// [`Notice::EmptyFilterResult`] is raised.
pub fn apply_filters(table: &CleanedTable, selection: &FilterSelection) -> Result<FilterOutcome> {
    let (filtered, mut notices) = filter_table(table, selection)?;

    if filtered.is_empty() {
        debug!("Filter selection matched no rows");
        notices.push(Notice::EmptyFilterResult);
    }

    let (metrics, metric_notices) = Metrics::compute(&filtered)?;
    notices.extend(metric_notices);

    Ok(FilterOutcome {
        table: filtered,
        metrics,
        notices,
    })
}

/// A loaded dataset ready to be filtered.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: Arc<CleanedTable>,
    options: FilterOptions,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(table: Arc<CleanedTable>, config: DashboardConfig) -> Result<Self> {
        let options = FilterOptions::from_table(&table)?;
        Ok(Self {
            table,
            options,
            config,
        })
    }

    /// Load (or reuse) the source through `cache`.
    pub fn open(cache: &mut TableCache, source: &DataSource) -> Result<Self> {
        let table = cache.get_or_load(source)?;
        Self::new(table, cache.config().clone())
    }

    pub fn table(&self) -> &Arc<CleanedTable> {
        &self.table
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn apply_filters(&self, selection: &FilterSelection) -> Result<FilterOutcome> {
        apply_filters(&self.table, selection)
    }

    /// Everything the renderer needs for one selection.
    pub fn snapshot(&self, selection: &FilterSelection) -> Result<DashboardSnapshot> {
        let outcome = self.apply_filters(selection)?;
        let (panels, panel_notices) = PanelSet::compute(&outcome.table, &self.config)?;

        let mut notices = outcome.notices;
        notices.extend(panel_notices);

        info!(
            "Snapshot: {} of {} rows, {} notices",
            outcome.table.height(),
            self.table.height(),
            notices.len()
        );

        Ok(DashboardSnapshot {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: self.table.source_name().to_string(),
            total_rows: self.table.height(),
            filtered_rows: outcome.table.height(),
            selection: selection.clone(),
            options: self.options.clone(),
            metrics: outcome.metrics,
            panels,
            notices,
            cleaning: self.table.report().clone(),
        })
    }
}

/// Serializable view of the dashboard for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub generated_at: String,
    pub source: String,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub selection: FilterSelection,
    pub options: FilterOptions,
    pub metrics: Metrics,
    pub panels: PanelSet,
    pub notices: Vec<Notice>,
    pub cleaning: CleaningReport,
}
