//! Documented record-level corrections of the raw cohort data.
//!
//! These are fixed, cohort-specific repairs rather than general cleaning
//! rules: rows without a diagnosis are dropped, a single erroneous body
//! temperature in the reference cohort is overwritten, and white blood cell
//! counts recorded in the wrong unit in the validation cohort are rescaled.

use crate::config::{BodyTempCorrection, PreprocessingConfig};
use crate::error::{PreprocessingError, Result};
use crate::schema::{BODY_TEMP_COLUMN, DIAGNOSIS_COLUMN, WBC_COUNT_COLUMN};
use crate::utils::{column_as_f64, column_as_keys};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What the body-temperature fix found and changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyTempFix {
    /// Rows below the threshold.
    pub matches: usize,
    /// Position (after filtering) of the corrected row.
    pub corrected_row: usize,
}

/// Drop every row whose diagnosis label is missing.
///
/// Returns the filtered table and the number of dropped rows.
pub fn drop_missing_diagnosis(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let keep: Vec<bool> = column_as_keys(df, DIAGNOSIS_COLUMN)?
        .iter()
        .map(Option::is_some)
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();

    if dropped == 0 {
        return Ok((df.clone(), 0));
    }

    let mask = BooleanChunked::new("keep".into(), &keep);
    let filtered = df.filter(&mask)?;
    info!("Dropped {} rows with missing {}", dropped, DIAGNOSIS_COLUMN);
    Ok((filtered, dropped))
}

/// Overwrite the erroneous body temperature record.
///
/// A temperature below `config.body_temp_threshold` is a known data-entry
/// error and is replaced with `config.body_temp_replacement`. Finding no such
/// row is a precondition failure. Several matching rows fail under
/// [`BodyTempCorrection::ExactlyOne`]; under [`BodyTempCorrection::FirstMatch`]
/// only the first is corrected and the rest are reported.
pub fn correct_body_temperature(
    df: &DataFrame,
    config: &PreprocessingConfig,
) -> Result<(DataFrame, BodyTempFix)> {
    let mut values = column_as_f64(df, BODY_TEMP_COLUMN)?;

    let matching: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_some_and(|t| t < config.body_temp_threshold))
        .map(|(idx, _)| idx)
        .collect();

    let Some(&first) = matching.first() else {
        return Err(PreprocessingError::PreconditionFailed(format!(
            "no {} value below {} to correct",
            BODY_TEMP_COLUMN, config.body_temp_threshold
        )));
    };

    if matching.len() > 1 {
        match config.body_temp_correction {
            BodyTempCorrection::ExactlyOne => {
                return Err(PreprocessingError::PreconditionFailed(format!(
                    "expected exactly one {} value below {}, found {} (rows {:?})",
                    BODY_TEMP_COLUMN,
                    config.body_temp_threshold,
                    matching.len(),
                    matching
                )));
            }
            BodyTempCorrection::FirstMatch => {
                warn!(
                    "{} rows have {} below {}; only row {} is corrected",
                    matching.len(),
                    BODY_TEMP_COLUMN,
                    config.body_temp_threshold,
                    first
                );
            }
        }
    }

    debug!(
        "Correcting {} at row {}: {:?} -> {}",
        BODY_TEMP_COLUMN, first, values[first], config.body_temp_replacement
    );
    values[first] = Some(config.body_temp_replacement);

    let mut result_df = df.clone();
    result_df.replace(BODY_TEMP_COLUMN, Series::new(BODY_TEMP_COLUMN.into(), values))?;

    Ok((
        result_df,
        BodyTempFix {
            matches: matching.len(),
            corrected_row: first,
        },
    ))
}

/// Divide every `WBCCount` above `config.wbc_unit_threshold` by
/// `config.wbc_unit_divisor`.
///
/// Returns the corrected table and the number of rescaled rows.
pub fn rescale_wbc_count(
    df: &DataFrame,
    config: &PreprocessingConfig,
) -> Result<(DataFrame, usize)> {
    let mut rescaled = 0;
    let values: Vec<Option<f64>> = column_as_f64(df, WBC_COUNT_COLUMN)?
        .into_iter()
        .map(|value| match value {
            Some(v) if v > config.wbc_unit_threshold => {
                rescaled += 1;
                Some(v / config.wbc_unit_divisor)
            }
            other => other,
        })
        .collect();

    let mut result_df = df.clone();
    result_df.replace(WBC_COUNT_COLUMN, Series::new(WBC_COUNT_COLUMN.into(), values))?;

    if rescaled > 0 {
        info!(
            "Rescaled {} {} values above {}",
            rescaled, WBC_COUNT_COLUMN, config.wbc_unit_threshold
        );
    }

    Ok((result_df, rescaled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
        df.column(column)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_drop_missing_diagnosis() {
        let df = df![
            "DiagnosisByCriteria" => [Some("appendicitis"), None, Some("noAppendicitis"), None],
            "Age" => [10.0, 11.0, 12.0, 13.0],
        ]
        .unwrap();

        let (filtered, dropped) = drop_missing_diagnosis(&df).unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(filtered.height(), 2);
        assert_eq!(f64_values(&filtered, "Age"), vec![Some(10.0), Some(12.0)]);
    }

    #[test]
    fn test_drop_missing_diagnosis_keeps_complete_table() {
        let df = df!["DiagnosisByCriteria" => ["a", "b"]].unwrap();
        let (filtered, dropped) = drop_missing_diagnosis(&df).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_correct_body_temperature() {
        let df = df!["BodyTemp" => [Some(37.5), Some(-1.0), None, Some(38.2)]].unwrap();
        let (fixed, fix) =
            correct_body_temperature(&df, &PreprocessingConfig::default()).unwrap();

        assert_eq!(
            f64_values(&fixed, "BodyTemp"),
            vec![Some(37.5), Some(36.9), None, Some(38.2)]
        );
        assert_eq!(fix.matches, 1);
        assert_eq!(fix.corrected_row, 1);
    }

    #[test]
    fn test_correct_body_temperature_without_sentinel_fails() {
        let df = df!["BodyTemp" => [37.5, 38.0]].unwrap();
        let err = correct_body_temperature(&df, &PreprocessingConfig::default()).unwrap_err();
        assert!(err.is_precondition_error());
    }

    #[test]
    fn test_correct_body_temperature_threshold_is_strict() {
        let df = df!["BodyTemp" => [37.5, 30.0]].unwrap();
        let err = correct_body_temperature(&df, &PreprocessingConfig::default()).unwrap_err();
        assert!(err.is_precondition_error());

        let df = df!["BodyTemp" => [30.0, 29.9]].unwrap();
        let (fixed, fix) =
            correct_body_temperature(&df, &PreprocessingConfig::default()).unwrap();
        assert_eq!(f64_values(&fixed, "BodyTemp"), vec![Some(30.0), Some(36.9)]);
        assert_eq!(fix.matches, 1);
        assert_eq!(fix.corrected_row, 1);
    }

    #[test]
    fn test_correct_body_temperature_first_match_only() {
        let df = df!["BodyTemp" => [3.7, 37.0, 3.8]].unwrap();
        let (fixed, fix) =
            correct_body_temperature(&df, &PreprocessingConfig::default()).unwrap();

        assert_eq!(
            f64_values(&fixed, "BodyTemp"),
            vec![Some(36.9), Some(37.0), Some(3.8)]
        );
        assert_eq!(fix.matches, 2);
        assert_eq!(fix.corrected_row, 0);
    }

    #[test]
    fn test_correct_body_temperature_exactly_one_rejects_duplicates() {
        let df = df!["BodyTemp" => [3.7, 37.0, 3.8]].unwrap();
        let config = PreprocessingConfig::builder()
            .body_temp_correction(BodyTempCorrection::ExactlyOne)
            .build()
            .unwrap();

        let err = correct_body_temperature(&df, &config).unwrap_err();
        assert!(err.is_precondition_error());
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_rescale_wbc_count() {
        let df = df!["WBCCount" => [Some(15000.0), Some(8.0), None, Some(1000.0)]].unwrap();
        let (fixed, rescaled) = rescale_wbc_count(&df, &PreprocessingConfig::default()).unwrap();

        assert_eq!(
            f64_values(&fixed, "WBCCount"),
            vec![Some(15.0), Some(8.0), None, Some(1000.0)]
        );
        assert_eq!(rescaled, 1);
    }
}
