//! Telecom Churn Dashboard Data Engine
//!
//! Loads a telecom customer churn CSV, repairs its gaps once, and answers
//! filter interactions with headline metrics and panel data series. Drawing
//! is left to the renderer; everything here serializes with serde.
//!
//! # Overview
//!
//! - **Loading & cleaning**: mode fill for the categorical service columns,
//!   NaN-aware KNN imputation for the numeric usage columns
//! - **Load-once cache**: [`TableCache`] hands out one shared
//!   [`CleanedTable`] per source
//! - **Filtering**: contract, age range and offer predicates with explicit
//!   empty-selection semantics ([`Selection`])
//! - **Metrics**: churn rate and average revenue, with a no-data sentinel
//! - **Panels**: distributions, revenue and churn breakdowns, each checked
//!   against the columns the dataset actually has
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use churn_dashboard::{
//!     AgeRange, Dashboard, DashboardConfig, DataSource, FilterSelection, Selection, TableCache,
//! };
//!
//! let mut cache = TableCache::new(DashboardConfig::default());
//! let dashboard = Dashboard::open(&mut cache, &DataSource::path("telecom_customer_churn.csv"))?;
//!
//! let selection = FilterSelection {
//!     contract_types: Selection::only(["Month-to-Month"]),
//!     age_range: Some(AgeRange::new(25, 40)?),
//!     offers: Selection::All,
//! };
//!
//! let outcome = dashboard.apply_filters(&selection)?;
//! println!("Churn rate: {}", outcome.metrics.churn_rate_display());
//! println!("Avg revenue: {}", outcome.metrics.avg_revenue_display());
//!
//! for notice in &outcome.notices {
//!     println!("note: {}", notice);
//! }
//! ```
//!
//! # Degradation
//!
//! Problems with the source itself are fatal [`DashboardError`]s. Anything
//! narrower (a missing optional column, a selection that matches nothing)
//! becomes a [`Notice`] and only the affected metric or panel is disabled.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod filters;
pub mod imputers;
pub mod loader;
pub mod metrics;
pub mod panels;
pub mod schema;
pub mod table;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, DashboardConfig, DashboardConfigBuilder};
pub use dashboard::{Dashboard, DashboardSnapshot, FilterOutcome, apply_filters};
pub use error::{DashboardError, Notice, Result as DashboardResult, ResultExt};
pub use filters::{AgeRange, FilterOptions, FilterSelection, Selection, filter_table};
pub use imputers::{ImputationMethod, ImputationStep, KNNImputer, ModeImputer};
pub use loader::{DataSource, TableCache, clean_dataframe, load_and_clean};
pub use metrics::{MetricValue, Metrics};
pub use panels::{
    CategoryCount, CategoryValue, ContractChurn, HistogramBin, Panel, PanelSet, ScatterPoint,
};
pub use schema::{Availability, check_columns};
pub use table::{CleanedTable, CleaningReport, ColumnData, ColumnarTable, FilteredTable};
pub use utils::{format_currency, format_percentage};
