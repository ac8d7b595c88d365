//! Column names of the telecom churn dataset and capability checks.
//!
//! Every consumer of the cleaned table (a metric, a panel, a filter) declares
//! the columns it needs up front and asks [`check_columns`] whether they are
//! present. The answer decides whether that one feature is computed or
//! reported as unavailable.

use polars::prelude::DataFrame;

pub const CUSTOMER_ID: &str = "Customer ID";
pub const GENDER: &str = "Gender";
pub const AGE: &str = "Age";
pub const MARRIED: &str = "Married";

pub const CONTRACT: &str = "Contract";
pub const INTERNET_TYPE: &str = "Internet Type";
pub const OFFER: &str = "Offer";
pub const MULTIPLE_LINES: &str = "Multiple Lines";
pub const ONLINE_SECURITY: &str = "Online Security";
pub const ONLINE_BACKUP: &str = "Online Backup";
pub const DEVICE_PROTECTION_PLAN: &str = "Device Protection Plan";
pub const PREMIUM_TECH_SUPPORT: &str = "Premium Tech Support";
pub const STREAMING_TV: &str = "Streaming TV";
pub const STREAMING_MOVIES: &str = "Streaming Movies";
pub const STREAMING_MUSIC: &str = "Streaming Music";
pub const UNLIMITED_DATA: &str = "Unlimited Data";

pub const MONTHLY_CHARGE: &str = "Monthly Charge";
pub const TOTAL_CHARGES: &str = "Total Charges";
pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const AVG_LONG_DISTANCE_CHARGES: &str = "Avg Monthly Long Distance Charges";
pub const AVG_GB_DOWNLOAD: &str = "Avg Monthly GB Download";

pub const CUSTOMER_STATUS: &str = "Customer Status";
pub const CHURN_CATEGORY: &str = "Churn Category";

/// Status label marking a churned customer.
pub const STATUS_CHURNED: &str = "Churned";
/// Status label marking a retained customer.
pub const STATUS_STAYED: &str = "Stayed";

/// Categorical service and offer columns whose gaps are filled with the mode.
pub const CATEGORICAL_FILL_COLUMNS: [&str; 11] = [
    MULTIPLE_LINES,
    INTERNET_TYPE,
    ONLINE_SECURITY,
    ONLINE_BACKUP,
    OFFER,
    DEVICE_PROTECTION_PLAN,
    PREMIUM_TECH_SUPPORT,
    STREAMING_TV,
    STREAMING_MOVIES,
    STREAMING_MUSIC,
    UNLIMITED_DATA,
];

/// Numeric columns imputed with nearest neighbours.
pub const KNN_COLUMNS: [&str; 2] = [AVG_LONG_DISTANCE_CHARGES, AVG_GB_DOWNLOAD];

/// Columns without which the dataset is rejected at load time.
pub const REQUIRED_COLUMNS: [&str; 3] = [AGE, AVG_LONG_DISTANCE_CHARGES, AVG_GB_DOWNLOAD];

/// Result of a capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable { missing: Vec<&'static str> },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// Missing column names, empty when available.
    pub fn missing(&self) -> &[&'static str] {
        match self {
            Availability::Available => &[],
            Availability::Unavailable { missing } => missing,
        }
    }
}

/// Check whether every column in `needs` exists in `df`.
pub fn check_columns(df: &DataFrame, needs: &[&'static str]) -> Availability {
    let missing: Vec<&'static str> = needs
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();

    if missing.is_empty() {
        Availability::Available
    } else {
        Availability::Unavailable { missing }
    }
}
