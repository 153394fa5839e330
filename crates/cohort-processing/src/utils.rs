//! Shared utilities for cohort preprocessing.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

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

/// Read a column as `f64` values, keeping nulls.
///
/// Numeric and all-null columns are cast directly. Text columns are parsed
/// value by value; blank cells are nulls and any other unparsable cell fails
/// with [`PreprocessingError::PreconditionFailed`].
pub fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()))?;

    if is_numeric_dtype(column.dtype()) || matches!(column.dtype(), DataType::Null | DataType::Boolean)
    {
        let as_float = column.cast(&DataType::Float64)?;
        Ok(as_float
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    } else {
        let as_text = column.cast(&DataType::String)?;
        as_text
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => text
                    .parse::<f64>()
                    .map(|x| Some(x).filter(|x| !x.is_nan()))
                    .map_err(|_| {
                        PreprocessingError::PreconditionFailed(format!(
                            "non-numeric value '{}' in numeric column '{}' at row {}",
                            text, name, row
                        ))
                    }),
            })
            .collect()
    }
}

/// Read a column as text keys, keeping nulls. Used for label factorization.
pub fn column_as_keys(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()))?;

    if matches!(column.dtype(), DataType::Float32 | DataType::Float64) {
        // NaN counts as missing, like a null.
        let as_float = column.cast(&DataType::Float64)?;
        return Ok(as_float
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(|x| x.to_string()))
            .collect());
    }

    let as_text = column.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
