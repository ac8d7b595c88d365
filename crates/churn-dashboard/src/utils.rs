//! Shared utilities for the churn dashboard.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use num_format::{Locale, ToFormattedString};
use polars::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Column Extraction Utilities
// =============================================================================

/// Read a column as optional `f64` values, one per row.
///
/// Non-numeric entries become `None`.
pub fn column_as_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Read a column as optional strings, one per row.
pub fn column_as_strings(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent value) of a Series as a string.
///
/// Ties are broken by picking the lexicographically smallest candidate, so
/// the result is the same on every run regardless of row order.
pub fn string_mode(series: &Series) -> Option<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return None;
    }

    let str_series = non_null.cast(&DataType::String).ok()?;
    let str_chunked = str_series.str().ok()?;

    let mut value_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending order; a strict comparison keeps the first
    let mut best: Option<(&str, usize)> = None;
    for (val, count) in value_counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((val, count));
        }
    }

    best.map(|(val, _)| val.to_string())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a string Series with a specific value.
///
/// Non-null entries are kept verbatim; the result is a String series.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.cast(&DataType::String)?;
    let filled: Vec<String> = str_series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Renderer Conversion Utilities
// =============================================================================

/// Converts a Polars `AnyValue` to a JSON `Value`.
///
/// NaN and infinite floats become `null` since JSON cannot represent them.
/// Types without a natural JSON form are stringified.
pub fn any_value_to_json(value: AnyValue) -> serde_json::Value {
    use serde_json::{Number, Value};

    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => Number::from_f64(v as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(format!("{}", other)),
    }
}

// =============================================================================
// Display Formatting Utilities
// =============================================================================

/// Format a percentage with one decimal, e.g. `26.5%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a currency amount with thousands separators and two decimals,
/// e.g. `$3,034.38`.
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_string_mode() {
        let series = Series::new("test".into(), &["a", "b", "a", "c", "a"]);
        assert_eq!(string_mode(&series), Some("a".to_string()));
    }

    #[test]
    fn test_string_mode_tie_picks_smallest() {
        let series = Series::new("test".into(), &["Yes", "No", "Yes", "No", "Maybe"]);
        assert_eq!(string_mode(&series), Some("No".to_string()));

        // Order of appearance must not matter
        let series = Series::new("test".into(), &["No", "Yes", "Yes", "No"]);
        assert_eq!(string_mode(&series), Some("No".to_string()));
    }

    #[test]
    fn test_string_mode_ignores_nulls() {
        let series = Series::new("test".into(), &[None, None, None, Some("Fiber Optic")]);
        assert_eq!(string_mode(&series), Some("Fiber Optic".to_string()));

        let all_null = Series::new("test".into(), &[Option::<&str>::None, None]);
        assert_eq!(string_mode(&all_null), None);
    }

    #[test]
    fn test_fill_string_nulls_keeps_values_verbatim() {
        let series = Series::new("test".into(), &[Some("DSL"), None, Some("Cable")]);
        let filled = fill_string_nulls(&series, "DSL").unwrap();

        assert_eq!(filled.null_count(), 0);
        let values: Vec<&str> = filled.str().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec!["DSL", "DSL", "Cable"]);
    }

    #[test]
    fn test_column_as_f64_casts_integers() {
        let df = df!["Age" => [Some(30i64), None, Some(45)]].unwrap();
        let values = column_as_f64(&df, "Age").unwrap();
        assert_eq!(values, vec![Some(30.0), None, Some(45.0)]);
    }

    #[test]
    fn test_any_value_to_json() {
        assert_eq!(any_value_to_json(AnyValue::Null), serde_json::Value::Null);
        assert_eq!(any_value_to_json(AnyValue::Int64(5)), serde_json::json!(5));
        assert_eq!(
            any_value_to_json(AnyValue::Float64(f64::NAN)),
            serde_json::Value::Null
        );
        assert_eq!(
            any_value_to_json(AnyValue::String("Churned")),
            serde_json::json!("Churned")
        );
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(26.537), "26.5%");
        assert_eq!(format_percentage(0.0), "0.0%");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(3034.379), "$3,034.38");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_currency(-42.1), "-$42.10");
    }
}
