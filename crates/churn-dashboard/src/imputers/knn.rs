use super::{ImputationMethod, ImputationStep};
use crate::error::{DashboardError, Result};
use crate::utils::{column_as_f64, is_numeric_dtype};
use polars::prelude::*;
use tracing::debug;

/// Nearest-neighbour imputer for numeric columns.
///
/// The imputed columns also form the feature space: the distance between two
/// rows is computed over the dimensions both rows have observed, scaled up to
/// the full dimensionality (NaN-aware Euclidean distance). The `k` nearest
/// donors are averaged with uniform weights.
pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1), // Ensure at least 1 neighbor
        }
    }

    /// Fill every missing value of `columns`, returning the new frame and one
    /// step per column that had gaps.
    ///
    /// Every column must exist, be numeric and hold at least one value.
    pub fn fit_transform(
        &self,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<(DataFrame, Vec<ImputationStep>)> {
        let mut result_df = df.clone();
        let mut steps = Vec::new();

        for col_name in columns {
            let column = df.column(col_name)?;
            if column.null_count() == column.len() && column.len() > 0 {
                return Err(DashboardError::NoValidValues(col_name.clone()));
            }
            if !is_numeric_dtype(column.dtype()) {
                return Err(DashboardError::InvalidColumnType {
                    column: col_name.clone(),
                    expected: "numeric".to_string(),
                    actual: column.dtype().to_string(),
                });
            }
        }

        // Distances always use the original values, never freshly imputed ones
        let data_matrix = self.create_data_matrix(df, columns)?;
        let n_cols = columns.len();

        for (col_idx, col_name) in columns.iter().enumerate() {
            let missing_rows: Vec<usize> = data_matrix
                .iter()
                .enumerate()
                .filter(|(_, row)| row[col_idx].is_none())
                .map(|(idx, _)| idx)
                .collect();

            if missing_rows.is_empty() {
                continue;
            }

            debug!(
                "KNN imputing {} values in '{}'",
                missing_rows.len(),
                col_name
            );

            let column_mean = Self::column_mean(&data_matrix, col_idx).ok_or_else(|| {
                DashboardError::ImputationFailed {
                    column: col_name.clone(),
                    reason: "no observed values".to_string(),
                }
            })?;

            let mut imputed_values: Vec<Option<f64>> =
                data_matrix.iter().map(|row| row[col_idx]).collect();

            for &row_idx in &missing_rows {
                let donors = self.nearest_donors(&data_matrix, row_idx, col_idx, n_cols);
                let value = if donors.is_empty() {
                    column_mean
                } else {
                    donors
                        .iter()
                        .filter_map(|&donor| data_matrix[donor][col_idx])
                        .sum::<f64>()
                        / donors.len() as f64
                };
                imputed_values[row_idx] = Some(value);
            }

            let imputed_series = Series::new(col_name.as_str().into(), imputed_values);
            result_df.replace(col_name, imputed_series)?;

            steps.push(ImputationStep {
                column: col_name.clone(),
                method: ImputationMethod::NearestNeighbors {
                    k: self.n_neighbors,
                },
                filled: missing_rows.len(),
                value: None,
            });
        }

        Ok((result_df, steps))
    }

    /// Create a data matrix from the dataframe for distance calculations
    fn create_data_matrix(
        &self,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<Vec<Vec<Option<f64>>>> {
        let n_rows = df.height();
        let mut matrix = vec![vec![None; columns.len()]; n_rows];

        for (col_idx, col_name) in columns.iter().enumerate() {
            let values = column_as_f64(df, col_name)?;
            for (row, value) in matrix.iter_mut().zip(values) {
                row[col_idx] = value;
            }
        }

        Ok(matrix)
    }

    /// Find up to `k` donor rows for a missing cell.
    ///
    /// A donor has the target column observed and shares at least one
    /// observed dimension with the target row. Equal distances are ordered
    /// by row index.
    fn nearest_donors(
        &self,
        data_matrix: &[Vec<Option<f64>>],
        target_row: usize,
        target_col: usize,
        n_cols: usize,
    ) -> Vec<usize> {
        let mut distances: Vec<(usize, f64)> = data_matrix
            .iter()
            .enumerate()
            .filter(|(row, values)| *row != target_row && values[target_col].is_some())
            .filter_map(|(row, values)| {
                self.calculate_distance(&data_matrix[target_row], values, n_cols)
                    .map(|distance| (row, distance))
            })
            .collect();

        distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        distances
            .into_iter()
            .take(self.n_neighbors)
            .map(|(row, _)| row)
            .collect()
    }

    /// NaN-aware Euclidean distance between two rows.
    ///
    /// Only jointly observed dimensions contribute; the sum is scaled by
    /// `n_cols / present`. Returns `None` when no dimension is shared.
    fn calculate_distance(
        &self,
        row1: &[Option<f64>],
        row2: &[Option<f64>],
        n_cols: usize,
    ) -> Option<f64> {
        let mut sum_squared_diff = 0.0;
        let mut present = 0;

        for (a, b) in row1.iter().zip(row2).take(n_cols) {
            if let (Some(val1), Some(val2)) = (a, b) {
                let diff = val1 - val2;
                sum_squared_diff += diff * diff;
                present += 1;
            }
        }

        if present == 0 {
            return None;
        }

        Some((n_cols as f64 / present as f64 * sum_squared_diff).sqrt())
    }

    fn column_mean(data_matrix: &[Vec<Option<f64>>], col_idx: usize) -> Option<f64> {
        let observed: Vec<f64> = data_matrix.iter().filter_map(|row| row[col_idx]).collect();
        if observed.is_empty() {
            None
        } else {
            Some(observed.iter().sum::<f64>() / observed.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn value_at(df: &DataFrame, col: &str, row: usize) -> f64 {
        df.column(col)
            .unwrap()
            .get(row)
            .unwrap()
            .try_extract::<f64>()
            .unwrap()
    }

    // ========================================================================
    // KNNImputer::new() tests
    // ========================================================================

    #[test]
    fn test_knn_imputer_new_with_valid_neighbors() {
        let imputer = KNNImputer::new(3);
        assert_eq!(imputer.n_neighbors, 3);
    }

    #[test]
    fn test_knn_imputer_new_with_zero_neighbors_defaults_to_one() {
        let imputer = KNNImputer::new(0);
        assert_eq!(imputer.n_neighbors, 1);
    }

    // ========================================================================
    // fit_transform() tests
    // ========================================================================

    #[test]
    fn test_fit_transform_uniform_mean_of_three_nearest() {
        let imputer = KNNImputer::new(3);

        // Row 2 misses "b"; its nearest rows by "a" are 1, 3 (distance 1) and 0, 4
        // (distance 2). Ties at distance 2 go to the lower row index (row 0).
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "b" => [Some(10.0), Some(20.0), None, Some(40.0), Some(50.0)],
        ]
        .unwrap();

        let (result, steps) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();

        assert_eq!(result.column("b").unwrap().null_count(), 0);
        let imputed = value_at(&result, "b", 2);
        assert!((imputed - (20.0 + 40.0 + 10.0) / 3.0).abs() < 1e-9);

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].column, "b");
        assert_eq!(steps[0].filled, 1);
    }

    #[test]
    fn test_fit_transform_no_missing_values() {
        let imputer = KNNImputer::new(3);

        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [10.0, 20.0, 30.0],
        ]
        .unwrap();

        let (result, steps) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();

        assert!(steps.is_empty());
        assert!(result.equals_missing(&df));
    }

    #[test]
    fn test_fit_transform_fewer_donors_than_k_uses_all() {
        let imputer = KNNImputer::new(3);

        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [Some(10.0), None, Some(30.0)],
        ]
        .unwrap();

        let (result, _) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();

        assert!((value_at(&result, "b", 1) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_transform_row_missing_everything_uses_column_mean() {
        let imputer = KNNImputer::new(3);

        // Row 3 has no observed feature, so no donor overlaps with it
        let df = df![
            "a" => [Some(1.0), Some(2.0), Some(6.0), None],
            "b" => [Some(10.0), Some(20.0), Some(60.0), None],
        ]
        .unwrap();

        let (result, steps) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();

        assert!((value_at(&result, "a", 3) - 3.0).abs() < 1e-9);
        assert!((value_at(&result, "b", 3) - 30.0).abs() < 1e-9);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_fit_transform_uses_original_values_for_distance() {
        let imputer = KNNImputer::new(1);

        // Row 1 misses "a", row 2 misses "b". Row 2's imputed "b" must not
        // make it a donor candidate for row 1's "a" (it has no "a" anyway),
        // and row 1's donor must be chosen on original "b" values only.
        let df = df![
            "a" => [Some(1.0), None, Some(9.0), Some(5.0)],
            "b" => [Some(100.0), Some(500.0), None, Some(480.0)],
        ]
        .unwrap();

        let (result, _) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();

        // Nearest to b=500 among rows with "a" observed and "b" observed is row 3
        assert_eq!(value_at(&result, "a", 1), 5.0);
        // Row 2 has only "a"=9; nearest by "a" with "b" observed is row 3 (a=5)
        assert_eq!(value_at(&result, "b", 2), 480.0);
    }

    #[test]
    fn test_fit_transform_imputed_within_donor_range() {
        let imputer = KNNImputer::new(3);

        let df = df![
            "a" => [Some(1.0), Some(1.5), Some(2.0), Some(8.0), Some(9.0), Some(1.2), None],
            "b" => [Some(5.0), Some(7.0), Some(6.0), Some(80.0), Some(90.0), None, Some(85.0)],
        ]
        .unwrap();
        let columns = cols(&["a", "b"]);

        let matrix = imputer.create_data_matrix(&df, &columns).unwrap();
        let (result, _) = imputer.fit_transform(&df, &columns).unwrap();

        for (row, col_idx, col) in [(5usize, 1usize, "b"), (6, 0, "a")] {
            let donors = imputer.nearest_donors(&matrix, row, col_idx, 2);
            assert!(!donors.is_empty());
            let donor_values: Vec<f64> =
                donors.iter().filter_map(|&d| matrix[d][col_idx]).collect();
            let min = donor_values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = donor_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            let imputed = value_at(&result, col, row);
            assert!(imputed >= min && imputed <= max, "{col}[{row}] = {imputed}");
        }
    }

    #[test]
    fn test_fit_transform_integer_column_becomes_float() {
        let imputer = KNNImputer::new(2);

        let df = df![
            "a" => [1i64, 2, 3],
            "b" => [Some(10i64), None, Some(30)],
        ]
        .unwrap();

        let (result, _) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();

        let b = result.column("b").unwrap();
        assert_eq!(b.dtype(), &DataType::Float64);
        assert_eq!(b.null_count(), 0);
    }

    #[test]
    fn test_fit_transform_all_null_column_is_error() {
        let imputer = KNNImputer::new(3);

        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [Option::<f64>::None, None, None],
        ]
        .unwrap();

        let err = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap_err();
        assert!(matches!(err, DashboardError::NoValidValues(ref c) if c == "b"));
    }

    #[test]
    fn test_fit_transform_string_column_is_error() {
        let imputer = KNNImputer::new(3);

        let df = df![
            "a" => [1.0, 2.0],
            "b" => [Some("x"), None],
        ]
        .unwrap();

        let err = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidColumnType { .. }));
    }

    #[test]
    fn test_fit_transform_empty_dataframe() {
        let imputer = KNNImputer::new(3);

        let df = df![
            "a" => Vec::<f64>::new(),
            "b" => Vec::<f64>::new(),
        ]
        .unwrap();

        let (result, steps) = imputer.fit_transform(&df, &cols(&["a", "b"])).unwrap();
        assert_eq!(result.height(), 0);
        assert!(steps.is_empty());
    }

    // ========================================================================
    // calculate_distance() tests
    // ========================================================================

    #[test]
    fn test_calculate_distance_identical_rows() {
        let imputer = KNNImputer::new(3);

        let row = vec![Some(1.0), Some(2.0)];
        assert_eq!(imputer.calculate_distance(&row, &row, 2), Some(0.0));
    }

    #[test]
    fn test_calculate_distance_full_overlap() {
        let imputer = KNNImputer::new(3);

        let row1 = vec![Some(0.0), Some(0.0)];
        let row2 = vec![Some(3.0), Some(4.0)];

        assert_eq!(imputer.calculate_distance(&row1, &row2, 2), Some(5.0));
    }

    #[test]
    fn test_calculate_distance_partial_overlap_is_scaled() {
        let imputer = KNNImputer::new(3);

        let row1 = vec![None, Some(0.0)];
        let row2 = vec![Some(3.0), Some(4.0)];

        // sqrt(2 / 1 * 16)
        let distance = imputer.calculate_distance(&row1, &row2, 2).unwrap();
        assert!((distance - 32.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_calculate_distance_no_common_features() {
        let imputer = KNNImputer::new(3);

        let row1 = vec![Some(1.0), None];
        let row2 = vec![None, Some(2.0)];

        assert_eq!(imputer.calculate_distance(&row1, &row2, 2), None);
    }
}
