//! Headline metrics over a filtered table.

use crate::error::{Notice, Result};
use crate::schema::{self, Availability};
use crate::table::FilteredTable;
use crate::utils::{column_as_f64, column_as_strings, format_currency, format_percentage};
use serde::{Deserialize, Serialize};

/// Columns the churn rate needs.
pub const CHURN_RATE_COLUMNS: &[&str] = &[schema::CUSTOMER_STATUS];
/// Columns the average revenue needs.
pub const AVG_REVENUE_COLUMNS: &[&str] = &[schema::TOTAL_REVENUE];

/// A metric result, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricValue {
    Value { value: f64 },
    /// The filtered table has no rows (or no values) to aggregate.
    NoData,
    /// The columns the metric needs are absent.
    Unavailable { columns: Vec<String> },
}

impl MetricValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Value { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, MetricValue::NoData)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, MetricValue::Unavailable { .. })
    }

    fn display_with(&self, format: impl Fn(f64) -> String) -> String {
        match self {
            MetricValue::Value { value } => format(*value),
            MetricValue::NoData => "No data".to_string(),
            MetricValue::Unavailable { .. } => "Not available".to_string(),
        }
    }
}

/// The two sidebar metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Percentage of rows whose status is `Churned`.
    pub churn_rate: MetricValue,
    /// Mean total revenue over rows that have one.
    pub avg_revenue: MetricValue,
}

impl Metrics {
    /// Compute both metrics. Each one degrades independently.
    pub fn compute(table: &FilteredTable) -> Result<(Self, Vec<Notice>)> {
        let mut notices = Vec::new();

        let churn_rate = match table.check_columns(CHURN_RATE_COLUMNS) {
            Availability::Available => churn_rate(table)?,
            Availability::Unavailable { missing } => {
                notices.push(Notice::column_unavailable("Churn rate", &missing));
                unavailable(&missing)
            }
        };

        let avg_revenue = match table.check_columns(AVG_REVENUE_COLUMNS) {
            Availability::Available => avg_revenue(table)?,
            Availability::Unavailable { missing } => {
                notices.push(Notice::column_unavailable("Average revenue", &missing));
                unavailable(&missing)
            }
        };

        Ok((
            Self {
                churn_rate,
                avg_revenue,
            },
            notices,
        ))
    }

    /// Churn rate as shown in the sidebar, e.g. `26.5%`.
    pub fn churn_rate_display(&self) -> String {
        self.churn_rate.display_with(format_percentage)
    }

    /// Average revenue as shown in the sidebar, e.g. `$3,034.38`.
    pub fn avg_revenue_display(&self) -> String {
        self.avg_revenue.display_with(format_currency)
    }
}

fn unavailable(missing: &[&str]) -> MetricValue {
    MetricValue::Unavailable {
        columns: missing.iter().map(|c| c.to_string()).collect(),
    }
}

fn churn_rate(table: &FilteredTable) -> Result<MetricValue> {
    if table.is_empty() {
        return Ok(MetricValue::NoData);
    }

    let statuses = column_as_strings(table.df(), schema::CUSTOMER_STATUS)?;
    let churned = statuses
        .iter()
        .filter(|s| s.as_deref() == Some(schema::STATUS_CHURNED))
        .count();

    Ok(MetricValue::Value {
        value: churned as f64 / statuses.len() as f64 * 100.0,
    })
}

fn avg_revenue(table: &FilteredTable) -> Result<MetricValue> {
    let revenue: Vec<f64> = column_as_f64(table.df(), schema::TOTAL_REVENUE)?
        .into_iter()
        .flatten()
        .collect();

    if revenue.is_empty() {
        return Ok(MetricValue::NoData);
    }

    Ok(MetricValue::Value {
        value: revenue.iter().sum::<f64>() / revenue.len() as f64,
    })
}
