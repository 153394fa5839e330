use crate::config::KnnWeighting;
use crate::error::{PreprocessingError, Result};
use crate::utils::column_as_f64;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// K-nearest-neighbours imputer.
///
/// Distances are nan-euclidean: only coordinates present in both rows are
/// compared and the squared sum is scaled up by `n_features / n_present`.
/// A missing cell is filled from the `k` closest reference rows that have a
/// value in that column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KNNImputer {
    n_neighbors: usize,
    weighting: KnnWeighting,
}

/// A [`KNNImputer`] fitted on a reference table.
///
/// Holds the reference rows and per-column means. It is an ordinary value:
/// fit it once on the training cohort and pass it to wherever other tables
/// must be imputed with the same statistics.
#[derive(Debug, Clone)]
pub struct FittedKnnImputer {
    n_neighbors: usize,
    weighting: KnnWeighting,
    columns: Vec<String>,
    reference: Vec<Vec<Option<f64>>>,
    column_means: Vec<f64>,
}

static_assertions::assert_impl_all!(FittedKnnImputer: Send, Sync);

impl KNNImputer {
    /// Imputer averaging over `n_neighbors` donors (at least one).
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            weighting: KnnWeighting::default(),
        }
    }

    /// Set how donor values are combined.
    pub fn with_weighting(mut self, weighting: KnnWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Learn the reference rows from `columns` of `df`.
    ///
    /// Fails when the table is empty or when a column has no observed value,
    /// since such a column could never be filled.
    pub fn fit(&self, df: &DataFrame, columns: &[String]) -> Result<FittedKnnImputer> {
        if df.height() == 0 {
            return Err(PreprocessingError::ImputationFailed {
                column: columns.first().cloned().unwrap_or_default(),
                reason: "reference table has no rows".to_string(),
            });
        }

        let reference = create_data_matrix(df, columns)?;

        let mut column_means = Vec::with_capacity(columns.len());
        for (col_idx, col_name) in columns.iter().enumerate() {
            let observed: Vec<f64> = reference.iter().filter_map(|row| row[col_idx]).collect();
            if observed.is_empty() {
                return Err(PreprocessingError::ImputationFailed {
                    column: col_name.clone(),
                    reason: "no observed values in the reference table".to_string(),
                });
            }
            column_means.push(observed.iter().sum::<f64>() / observed.len() as f64);
        }

        debug!(
            "KNN imputer fitted on {} rows x {} columns (k = {})",
            reference.len(),
            columns.len(),
            self.n_neighbors
        );

        Ok(FittedKnnImputer {
            n_neighbors: self.n_neighbors,
            weighting: self.weighting,
            columns: columns.to_vec(),
            reference,
            column_means,
        })
    }

    /// Fit on `df` and impute the same table.
    pub fn fit_transform(
        &self,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<(FittedKnnImputer, DataFrame)> {
        let fitted = self.fit(df, columns)?;
        let imputed = fitted.transform(df)?;
        Ok((fitted, imputed))
    }
}

impl FittedKnnImputer {
    /// Columns the imputer was fitted on, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Number of reference rows available as donors.
    pub fn n_reference_rows(&self) -> usize {
        self.reference.len()
    }

    /// Impute the fitted columns of `df`.
    ///
    /// Returns a table with exactly the fitted columns, as `Float64`, without
    /// nulls.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.transform_counted(df).map(|(imputed, _)| imputed)
    }

    /// Like [`FittedKnnImputer::transform`], also returning how many cells
    /// were filled per column.
    pub fn transform_counted(&self, df: &DataFrame) -> Result<(DataFrame, BTreeMap<String, usize>)> {
        let mut matrix = create_data_matrix(df, &self.columns)?;
        let mut imputed_counts = vec![0usize; self.columns.len()];

        for row in matrix.iter_mut() {
            let missing_cols: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, value)| value.is_none())
                .map(|(idx, _)| idx)
                .collect();

            if missing_cols.is_empty() {
                continue;
            }

            let distances: Vec<Option<f64>> = self
                .reference
                .iter()
                .map(|reference_row| nan_euclidean_distance(row, reference_row))
                .collect();

            // Fill from the original row so imputed cells never feed later ones.
            let mut filled = Vec::with_capacity(missing_cols.len());
            for &col_idx in &missing_cols {
                filled.push((col_idx, self.impute_value(&distances, col_idx)));
            }
            for (col_idx, value) in filled {
                row[col_idx] = Some(value);
                imputed_counts[col_idx] += 1;
            }
        }

        let columns: Vec<Column> = self
            .columns
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let values: Vec<f64> = matrix
                    .iter()
                    .map(|row| row[col_idx].unwrap_or(self.column_means[col_idx]))
                    .collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();

        let counts = self
            .columns
            .iter()
            .cloned()
            .zip(imputed_counts)
            .filter(|(_, count)| *count > 0)
            .collect();

        Ok((DataFrame::new(columns)?, counts))
    }

    /// Impute a single missing value from the nearest reference donors.
    fn impute_value(&self, distances: &[Option<f64>], target_col: usize) -> f64 {
        let mut donors: Vec<(usize, f64)> = distances
            .iter()
            .enumerate()
            .filter_map(|(row_idx, distance)| {
                let distance = (*distance)?;
                self.reference[row_idx][target_col].map(|_| (row_idx, distance))
            })
            .collect();

        if donors.is_empty() {
            // No donor shares a coordinate with this row
            return self.column_means[target_col];
        }

        // Ties resolve by reference row order so repeated runs agree.
        donors.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let k = self.n_neighbors.min(donors.len());
        let nearest = &donors[..k];

        let value_of = |row_idx: usize| self.reference[row_idx][target_col].unwrap_or_default();

        match self.weighting {
            KnnWeighting::Uniform => {
                nearest.iter().map(|(row_idx, _)| value_of(*row_idx)).sum::<f64>() / k as f64
            }
            KnnWeighting::Distance => {
                // Donors at distance zero take all the weight.
                let exact: Vec<f64> = nearest
                    .iter()
                    .filter(|(_, distance)| *distance == 0.0)
                    .map(|(row_idx, _)| value_of(*row_idx))
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }

                let mut weighted_sum = 0.0;
                let mut weight_sum = 0.0;
                for &(row_idx, distance) in nearest {
                    let weight = 1.0 / distance;
                    weighted_sum += value_of(row_idx) * weight;
                    weight_sum += weight;
                }

                weighted_sum / weight_sum
            }
        }
    }
}

/// Row-major copy of `columns` with nulls as `None`.
fn create_data_matrix(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    let n_rows = df.height();
    let n_cols = columns.len();
    let mut matrix = vec![vec![None; n_cols]; n_rows];

    for (col_idx, col_name) in columns.iter().enumerate() {
        let values = column_as_f64(df, col_name)?;
        for (row, value) in matrix.iter_mut().zip(values) {
            row[col_idx] = value;
        }
    }

    Ok(matrix)
}

/// Euclidean distance over the coordinates present in both rows, scaled by
/// `n_cols / n_present`. `None` when the rows share no coordinate.
fn nan_euclidean_distance(row1: &[Option<f64>], row2: &[Option<f64>]) -> Option<f64> {
    let mut sum_squared_diff = 0.0;
    let mut present = 0usize;

    for (a, b) in row1.iter().zip(row2) {
        if let (Some(a), Some(b)) = (a, b) {
            let diff = a - b;
            sum_squared_diff += diff * diff;
            present += 1;
        }
    }

    if present == 0 {
        return None;
    }

    let weight = row1.len() as f64 / present as f64;
    Some((weight * sum_squared_diff).sqrt())
}
