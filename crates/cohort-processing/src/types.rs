use crate::corrections::BodyTempFix;
use crate::encoding::EncodingStats;
use crate::error::Result;
use crate::factorize::Factorization;
use crate::imputers::FittedKnnImputer;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role of a cohort in the harmonization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortRole {
    /// Training population; the imputer is fitted on it (Regensburg).
    Reference,
    /// External validation population; imputed with the reference statistics
    /// (Dusseldorf).
    Validation,
}

impl CohortRole {
    /// Returns a human-readable name for the cohort.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Reference => "Reference cohort (Regensburg)",
            Self::Validation => "Validation cohort (Dusseldorf)",
        }
    }
}

// ============================================================================
// Processing summary
// ============================================================================

/// Summary of everything done to one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    pub cohort: CohortRole,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_dropped_missing_diagnosis: usize,
    /// Only present for the reference cohort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_temp_fix: Option<BodyTempFix>,
    pub encoding: EncodingStats,
    /// Filled cells per feature column (columns without gaps are omitted).
    pub imputed_cells: BTreeMap<String, usize>,
    pub wbc_rescaled_rows: usize,
    /// Distinct outcome values per outcome column, in code order.
    pub outcome_levels: BTreeMap<String, Vec<Option<String>>>,
    /// Rows with a missing label per outcome column.
    pub missing_outcomes: BTreeMap<String, usize>,
    pub duration_ms: u64,
    /// RFC 3339 timestamp of when processing finished.
    pub processed_at: String,
}

impl CohortReport {
    pub(crate) fn new(cohort: CohortRole, rows_before: usize) -> Self {
        Self {
            cohort,
            rows_before,
            rows_after: 0,
            rows_dropped_missing_diagnosis: 0,
            body_temp_fix: None,
            encoding: EncodingStats::default(),
            imputed_cells: BTreeMap::new(),
            wbc_rescaled_rows: 0,
            outcome_levels: BTreeMap::new(),
            missing_outcomes: BTreeMap::new(),
            duration_ms: 0,
            processed_at: String::new(),
        }
    }

    pub(crate) fn record_outcomes(&mut self, levels: BTreeMap<String, Factorization>) {
        for (column, factorization) in levels {
            self.missing_outcomes
                .insert(column.clone(), factorization.missing);
            self.outcome_levels.insert(column, factorization.levels);
        }
    }

    /// Total number of cells filled by the imputer.
    pub fn total_imputed(&self) -> usize {
        self.imputed_cells.values().sum()
    }

    /// Pretty-printed JSON document of the report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// A cleaned cohort table and its report.
#[derive(Debug, Clone)]
pub struct CohortOutput {
    pub data: DataFrame,
    pub report: CohortReport,
}

/// Output of the reference cohort, including the fitted imputer that must be
/// reused for the validation cohort.
#[derive(Debug, Clone)]
pub struct ReferenceOutput {
    pub data: DataFrame,
    pub imputer: FittedKnnImputer,
    pub report: CohortReport,
}

/// Both cleaned cohorts.
#[derive(Debug, Clone)]
pub struct PreprocessingOutput {
    pub reference: CohortOutput,
    pub validation: CohortOutput,
}

impl PreprocessingOutput {
    /// Both reports, for serialization as one document.
    pub fn reports(&self) -> [&CohortReport; 2] {
        [&self.reference.report, &self.validation.report]
    }

    /// Both reports as one pretty-printed JSON array, reference first.
    pub fn reports_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.reports())?)
    }

    /// Split into the two cleaned tables.
    pub fn into_tables(self) -> (DataFrame, DataFrame) {
        (self.reference.data, self.validation.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessingError;

    fn sample_report() -> CohortReport {
        let mut report = CohortReport::new(CohortRole::Reference, 10);
        report.rows_after = 9;
        report.rows_dropped_missing_diagnosis = 1;
        report.body_temp_fix = Some(BodyTempFix {
            matches: 1,
            corrected_row: 2,
        });
        report.imputed_cells.insert("CRPEntry".to_string(), 2);
        report.imputed_cells.insert("Age".to_string(), 1);
        report
    }

    #[test]
    fn test_total_imputed() {
        assert_eq!(sample_report().total_imputed(), 3);
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = sample_report();
        let json = report.to_json().unwrap();

        assert!(json.contains("\"cohort\": \"reference\""));
        assert_eq!(CohortReport::from_json(&json).unwrap(), report);
    }

    #[test]
    fn test_validation_report_omits_body_temp_fix() {
        let json = CohortReport::new(CohortRole::Validation, 4).to_json().unwrap();
        assert!(!json.contains("body_temp_fix"));
    }

    #[test]
    fn test_from_json_rejects_malformed_report() {
        let err = CohortReport::from_json("{\"cohort\": \"reference\"}").unwrap_err();
        assert!(matches!(err, PreprocessingError::Json(_)));
        assert_eq!(err.error_code(), "JSON_ERROR");
    }
}
