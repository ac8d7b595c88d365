//! Data series behind each dashboard panel.
//!
//! Every panel declares the columns it reads. A panel whose columns are
//! absent reports [`Panel::Unavailable`]; a panel with nothing to show under
//! the current filters reports [`Panel::NoData`]. Drawing is left to the
//! renderer.

use crate::config::DashboardConfig;
use crate::error::{Notice, Result};
use crate::schema::{self, Availability};
use crate::table::FilteredTable;
use crate::utils::{column_as_f64, column_as_strings};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One panel's data, or the reason it cannot be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    NoData,
    Unavailable { columns: Vec<String> },
}

impl<T> Panel<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Panel::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Panel::Unavailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryValue {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Color group (contract type).
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractChurn {
    pub contract: String,
    pub churned: usize,
    pub stayed: usize,
    /// `churned / (churned + stayed) * 100`; `None` without either status.
    pub churn_rate: Option<f64>,
}

/// All panels of the dashboard, grouped as the tabs show them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSet {
    // Customer overview
    pub gender_distribution: Panel<Vec<CategoryCount>>,
    pub marital_status: Panel<Vec<CategoryCount>>,
    pub age_distribution: Panel<Vec<HistogramBin>>,

    // Revenue analysis
    pub revenue_by_contract: Panel<Vec<CategoryValue>>,
    pub revenue_vs_age: Panel<Vec<ScatterPoint>>,
    pub monthly_vs_total_charges: Panel<Vec<ScatterPoint>>,

    // Churn analysis
    pub status_distribution: Panel<Vec<CategoryCount>>,
    pub churn_reasons: Panel<Vec<CategoryCount>>,
    pub churn_rate_by_contract: Panel<Vec<ContractChurn>>,

    // Offer analysis
    pub offer_popularity: Panel<Vec<CategoryCount>>,
    pub revenue_by_offer: Panel<Vec<CategoryValue>>,
}

impl PanelSet {
    /// Compute every panel over the filtered rows.
    pub fn compute(table: &FilteredTable, config: &DashboardConfig) -> Result<(Self, Vec<Notice>)> {
        let mut notices = Vec::new();
        let n = &mut notices;
        let bins = config.age_histogram_bins;

        let panels = PanelSet {
            gender_distribution: build(table, "Gender distribution", &[schema::GENDER], n, |df| {
                value_counts(df, schema::GENDER)
            })?,
            marital_status: build(table, "Marital status", &[schema::MARRIED], n, |df| {
                value_counts(df, schema::MARRIED)
            })?,
            age_distribution: build(table, "Age distribution", &[schema::AGE], n, |df| {
                age_histogram(df, bins)
            })?,
            revenue_by_contract: build(
                table,
                "Revenue by contract type",
                &[schema::CONTRACT, schema::TOTAL_REVENUE],
                n,
                |df| {
                    let mut means = grouped_revenue(df, schema::CONTRACT)?
                        .into_iter()
                        .map(|(label, (sum, count))| CategoryValue {
                            label,
                            value: sum / count as f64,
                        })
                        .collect::<Vec<_>>();
                    means.sort_by(|a, b| a.label.cmp(&b.label));
                    Ok(means)
                },
            )?,
            revenue_vs_age: build(
                table,
                "Revenue vs age",
                &[schema::AGE, schema::TOTAL_REVENUE, schema::CONTRACT],
                n,
                |df| scatter(df, schema::AGE, schema::TOTAL_REVENUE),
            )?,
            monthly_vs_total_charges: build(
                table,
                "Monthly vs total charges",
                &[schema::MONTHLY_CHARGE, schema::TOTAL_CHARGES, schema::CONTRACT],
                n,
                |df| scatter(df, schema::MONTHLY_CHARGE, schema::TOTAL_CHARGES),
            )?,
            status_distribution: build(
                table,
                "Customer status distribution",
                &[schema::CUSTOMER_STATUS],
                n,
                |df| value_counts(df, schema::CUSTOMER_STATUS),
            )?,
            churn_reasons: build(table, "Churn reasons", &[schema::CHURN_CATEGORY], n, |df| {
                value_counts(df, schema::CHURN_CATEGORY)
            })?,
            churn_rate_by_contract: build(
                table,
                "Churn rate by contract type",
                &[schema::CONTRACT, schema::CUSTOMER_STATUS],
                n,
                churn_by_contract,
            )?,
            offer_popularity: build(table, "Offer popularity", &[schema::OFFER], n, |df| {
                value_counts(df, schema::OFFER)
            })?,
            revenue_by_offer: build(
                table,
                "Revenue by offer",
                &[schema::OFFER, schema::TOTAL_REVENUE],
                n,
                |df| {
                    let mut sums = grouped_revenue(df, schema::OFFER)?
                        .into_iter()
                        .map(|(label, (sum, _))| CategoryValue { label, value: sum })
                        .collect::<Vec<_>>();
                    sums.sort_by(|a, b| b.value.total_cmp(&a.value).then(a.label.cmp(&b.label)));
                    Ok(sums)
                },
            )?,
        };

        Ok((panels, notices))
    }
}

fn build<T>(
    table: &FilteredTable,
    feature: &str,
    needs: &[&'static str],
    notices: &mut Vec<Notice>,
    compute: impl FnOnce(&DataFrame) -> Result<Vec<T>>,
) -> Result<Panel<Vec<T>>> {
    if let Availability::Unavailable { missing } = table.check_columns(needs) {
        notices.push(Notice::column_unavailable(feature, &missing));
        return Ok(Panel::Unavailable {
            columns: missing.iter().map(|c| c.to_string()).collect(),
        });
    }

    if table.is_empty() {
        return Ok(Panel::NoData);
    }

    let data = compute(table.df())?;
    if data.is_empty() {
        Ok(Panel::NoData)
    } else {
        Ok(Panel::Ready(data))
    }
}

/// Counts of non-missing values, most frequent first, ties by label.
fn value_counts(df: &DataFrame, col: &str) -> Result<Vec<CategoryCount>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in column_as_strings(df, col)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut result: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    // Stable sort keeps label order among equal counts
    result.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(result)
}

/// Equal-width bins spanning the observed ages.
fn age_histogram(df: &DataFrame, bins: usize) -> Result<Vec<HistogramBin>> {
    let ages: Vec<f64> = column_as_f64(df, schema::AGE)?
        .into_iter()
        .flatten()
        .collect();
    if ages.is_empty() {
        return Ok(Vec::new());
    }

    let min = ages.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = ages.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return Ok(vec![HistogramBin {
            start: min,
            end: max,
            count: ages.len(),
        }]);
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for age in &ages {
        let idx = (((age - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect())
}

/// Revenue `(sum, count)` per value of `group_col`, skipping rows missing either.
fn grouped_revenue(df: &DataFrame, group_col: &str) -> Result<BTreeMap<String, (f64, usize)>> {
    let groups = column_as_strings(df, group_col)?;
    let revenue = column_as_f64(df, schema::TOTAL_REVENUE)?;

    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (group, value) in groups.into_iter().zip(revenue) {
        if let (Some(group), Some(value)) = (group, value) {
            let entry = totals.entry(group).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    Ok(totals)
}

/// Points for a scatter plot colored by contract type.
fn scatter(df: &DataFrame, x_col: &str, y_col: &str) -> Result<Vec<ScatterPoint>> {
    let xs = column_as_f64(df, x_col)?;
    let ys = column_as_f64(df, y_col)?;
    let groups = column_as_strings(df, schema::CONTRACT)?;

    Ok(xs
        .into_iter()
        .zip(ys)
        .zip(groups)
        .filter_map(|((x, y), group)| Some(ScatterPoint { x: x?, y: y?, group }))
        .collect())
}

fn churn_by_contract(df: &DataFrame) -> Result<Vec<ContractChurn>> {
    let contracts = column_as_strings(df, schema::CONTRACT)?;
    let statuses = column_as_strings(df, schema::CUSTOMER_STATUS)?;

    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (contract, status) in contracts.into_iter().zip(statuses) {
        let Some(contract) = contract else { continue };
        let entry = counts.entry(contract).or_insert((0, 0));
        match status.as_deref() {
            Some(schema::STATUS_CHURNED) => entry.0 += 1,
            Some(schema::STATUS_STAYED) => entry.1 += 1,
            _ => {}
        }
    }

    Ok(counts
        .into_iter()
        .map(|(contract, (churned, stayed))| {
            let decided = churned + stayed;
            ContractChurn {
                contract,
                churned,
                stayed,
                churn_rate: (decided > 0).then(|| churned as f64 / decided as f64 * 100.0),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn customers() -> FilteredTable {
        FilteredTable::new(
            df![
                "Gender" => ["Male", "Female", "Male", "Female", "Male"],
                "Married" => ["Yes", "No", "No", "Yes", "Yes"],
                "Age" => [20i64, 30, 40, 50, 60],
                "Contract" => ["Month-to-Month", "One Year", "Month-to-Month", "Two Year", "One Year"],
                "Offer" => ["Offer A", "None", "Offer A", "Offer B", "None"],
                "Monthly Charge" => [70.0, 20.0, 90.0, 50.0, 30.0],
                "Total Charges" => [700.0, 400.0, 90.0, 3000.0, 900.0],
                "Total Revenue" => [800.0, 500.0, 100.0, 3500.0, 1000.0],
                "Customer Status" => ["Churned", "Stayed", "Joined", "Stayed", "Churned"],
                "Churn Category" => [Some("Competitor"), None, None, None, Some("Price")],
            ]
            .unwrap(),
        )
    }

    fn compute(table: &FilteredTable) -> (PanelSet, Vec<Notice>) {
        PanelSet::compute(table, &DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_value_counts_ordering() {
        let (panels, notices) = compute(&customers());
        assert!(notices.is_empty());

        assert_eq!(
            panels.gender_distribution.data().unwrap(),
            &vec![
                CategoryCount { label: "Male".to_string(), count: 3 },
                CategoryCount { label: "Female".to_string(), count: 2 },
            ]
        );
        // Equal counts fall back to label order
        let offers: Vec<&str> = panels
            .offer_popularity
            .data()
            .unwrap()
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(offers, vec!["None", "Offer A", "Offer B"]);
    }

    #[test]
    fn test_churn_reasons_ignore_missing_categories() {
        let (panels, _) = compute(&customers());
        let reasons = panels.churn_reasons.data().unwrap();

        assert_eq!(reasons.len(), 2);
        assert_eq!(reasons.iter().map(|r| r.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_churn_rate_by_contract() {
        let (panels, _) = compute(&customers());
        let rates = panels.churn_rate_by_contract.data().unwrap();

        assert_eq!(rates.len(), 3);
        // Month-to-Month: one churned, one joined (ignored)
        assert_eq!(rates[0].contract, "Month-to-Month");
        assert_eq!(rates[0].churn_rate, Some(100.0));
        // One Year: one churned, one stayed
        assert_eq!(rates[1].churn_rate, Some(50.0));
        // Two Year: one stayed
        assert_eq!(rates[2].churn_rate, Some(0.0));
    }

    #[test]
    fn test_churn_rate_without_decided_statuses_is_none() {
        let table = FilteredTable::new(
            df![
                "Contract" => ["One Year"],
                "Customer Status" => ["Joined"],
            ]
            .unwrap(),
        );

        let (panels, _) = compute(&table);
        assert_eq!(panels.churn_rate_by_contract.data().unwrap()[0].churn_rate, None);
    }

    #[test]
    fn test_revenue_panels() {
        let (panels, _) = compute(&customers());

        let by_contract = panels.revenue_by_contract.data().unwrap();
        assert_eq!(by_contract[0].label, "Month-to-Month");
        assert_eq!(by_contract[0].value, 450.0);

        let by_offer = panels.revenue_by_offer.data().unwrap();
        assert_eq!(by_offer[0].label, "Offer B");
        assert_eq!(by_offer[0].value, 3500.0);
        assert_eq!(by_offer[1].label, "None");
        assert_eq!(by_offer[1].value, 1500.0);
    }

    #[test]
    fn test_scatter_points() {
        let (panels, _) = compute(&customers());

        let points = panels.revenue_vs_age.data().unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(
            points[0],
            ScatterPoint {
                x: 20.0,
                y: 800.0,
                group: Some("Month-to-Month".to_string())
            }
        );
    }

    #[test]
    fn test_age_histogram_bins() {
        let df = df!["Age" => [20i64, 30, 40, 50, 60]].unwrap();
        let bins = age_histogram(&df, 4).unwrap();

        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].start, 20.0);
        assert_eq!(bins[3].end, 60.0);
        // The maximum lands in the last bin
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_age_histogram_single_value() {
        let df = df!["Age" => [35i64, 35]].unwrap();
        let bins = age_histogram(&df, 20).unwrap();

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn test_empty_table_panels_report_no_data() {
        let table = customers();
        let empty = FilteredTable::new(table.df().head(Some(0)));

        let (panels, notices) = compute(&empty);

        assert_eq!(panels.gender_distribution, Panel::NoData);
        assert_eq!(panels.revenue_by_offer, Panel::NoData);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_missing_offer_column_disables_offer_panels_only() {
        let table = FilteredTable::new(customers().df().drop("Offer").unwrap());

        let (panels, notices) = compute(&table);

        assert!(panels.offer_popularity.is_unavailable());
        assert!(panels.revenue_by_offer.is_unavailable());
        assert!(panels.revenue_by_contract.is_ready());
        assert!(panels.gender_distribution.is_ready());
        assert_eq!(notices.len(), 2);
    }

    #[test]
    fn test_panel_serialization() {
        let panel: Panel<Vec<CategoryCount>> = Panel::Unavailable {
            columns: vec!["Offer".to_string()],
        };
        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["data"]["columns"][0], "Offer");
    }
}
