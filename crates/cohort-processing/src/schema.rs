//! Shared column schema of the two appendicitis cohorts.
//!
//! Both cohorts are projected onto [`VARS_INCLUDED`]. The order of that list is
//! the output column order: the 38 feature columns come first and the three
//! outcome columns last.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

/// Every column kept from the raw cohort tables, in output order.
pub const VARS_INCLUDED: [&str; 41] = [
    "Age",
    "BMI",
    "Sex",
    "Height",
    "Weight",
    "AlvaradoScore",
    "PediatricAppendicitisScore",
    "AppendixOnSono",
    "AppendixDiameter",
    "MigratoryPain",
    "LowerAbdominalPainRight",
    "ReboundTenderness",
    "CoughingPain",
    "PsoasSign",
    "Nausea",
    "AppetiteLoss",
    "BodyTemp",
    "WBCCount",
    "NeutrophilPerc",
    "KetonesInUrine",
    "ErythrocytesInUrine",
    "WBCInUrine",
    "CRPEntry",
    "Dysuria",
    "Stool",
    "Peritonitis",
    "FreeFluids",
    "AppendixWallLayers",
    "Kokarde",
    "TissuePerfusion",
    "SurroundingTissueReaction",
    "PathLymphNodes",
    "MesentricLymphadenitis",
    "BowelWallThick",
    "Ileus",
    "FecalImpaction",
    "Meteorism",
    "Enteritis",
    "DiagnosisByCriteria",
    "TreatmentGroupBinar",
    "AppendicitisComplications",
];

/// Columns holding text labels from a fixed per-column enumeration.
pub const VARS_CATEGORICAL: [&str; 27] = [
    "Sex",
    "AppendixOnSono",
    "MigratoryPain",
    "LowerAbdominalPainRight",
    "ReboundTenderness",
    "CoughingPain",
    "PsoasSign",
    "Nausea",
    "AppetiteLoss",
    "KetonesInUrine",
    "ErythrocytesInUrine",
    "WBCInUrine",
    "Dysuria",
    "Stool",
    "Peritonitis",
    "FreeFluids",
    "AppendixWallLayers",
    "Kokarde",
    "TissuePerfusion",
    "SurroundingTissueReaction",
    "PathLymphNodes",
    "MesentricLymphadenitis",
    "BowelWallThick",
    "Ileus",
    "FecalImpaction",
    "Meteorism",
    "Enteritis",
];

/// Continuous or count-valued measurements.
pub const VARS_NUMERICAL: [&str; 11] = [
    "Age",
    "BMI",
    "Height",
    "Weight",
    "AlvaradoScore",
    "PediatricAppendicitisScore",
    "AppendixDiameter",
    "BodyTemp",
    "WBCCount",
    "NeutrophilPerc",
    "CRPEntry",
];

/// Outcome labels, factorized instead of imputed.
pub const OUTCOME_COLUMNS: [&str; 3] = [
    "DiagnosisByCriteria",
    "TreatmentGroupBinar",
    "AppendicitisComplications",
];

pub const DIAGNOSIS_COLUMN: &str = "DiagnosisByCriteria";
pub const BODY_TEMP_COLUMN: &str = "BodyTemp";
pub const WBC_COUNT_COLUMN: &str = "WBCCount";

/// Check whether a column is one of the three outcome labels.
#[inline]
pub fn is_outcome(column: &str) -> bool {
    OUTCOME_COLUMNS.contains(&column)
}

/// Feature columns (everything included except the outcomes), in output order.
pub fn feature_columns() -> Vec<String> {
    VARS_INCLUDED
        .iter()
        .filter(|col| !is_outcome(col))
        .map(|col| col.to_string())
        .collect()
}

/// List the included columns absent from a table.
pub fn missing_columns(df: &DataFrame) -> Vec<String> {
    let present: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();

    VARS_INCLUDED
        .iter()
        .filter(|col| !present.contains(col))
        .map(|col| col.to_string())
        .collect()
}

/// Validate that a raw cohort table carries every included column.
pub fn validate_schema(df: &DataFrame) -> Result<()> {
    let missing = missing_columns(df);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PreprocessingError::SchemaMismatch { missing })
    }
}

/// Validate a raw cohort table and project it onto [`VARS_INCLUDED`].
pub fn select_included(df: &DataFrame) -> Result<DataFrame> {
    validate_schema(df)?;
    Ok(df.select(VARS_INCLUDED)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let mut all: Vec<&str> = VARS_CATEGORICAL
            .iter()
            .chain(VARS_NUMERICAL.iter())
            .chain(OUTCOME_COLUMNS.iter())
            .copied()
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), VARS_INCLUDED.len());

        let mut included = VARS_INCLUDED.to_vec();
        included.sort_unstable();
        assert_eq!(all, included);
    }

    #[test]
    fn test_outcomes_are_last() {
        assert_eq!(&VARS_INCLUDED[38..], &OUTCOME_COLUMNS[..]);
    }

    #[test]
    fn test_feature_columns() {
        let features = feature_columns();
        assert_eq!(features.len(), 38);
        assert_eq!(features[0], "Age");
        assert_eq!(features[37], "Enteritis");
        assert!(!features.iter().any(|c| is_outcome(c)));
    }

    #[test]
    fn test_validate_schema_reports_missing_columns() {
        let df = df![
            "Age" => [10.0],
            "BodyTemp" => [37.0],
        ]
        .unwrap();

        match validate_schema(&df) {
            Err(PreprocessingError::SchemaMismatch { missing }) => {
                assert_eq!(missing.len(), 39);
                assert!(missing.contains(&"Sex".to_string()));
                assert!(!missing.contains(&"Age".to_string()));
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_select_included_reorders_and_drops_extras() {
        let mut columns: Vec<Column> = VARS_INCLUDED
            .iter()
            .rev()
            .map(|name| Column::new((*name).into(), [1.0f64]))
            .collect();
        columns.push(Column::new("PatientId".into(), ["p1"]));
        let df = DataFrame::new(columns).unwrap();

        let selected = select_included(&df).unwrap();
        let names: Vec<String> = selected
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, VARS_INCLUDED.map(String::from).to_vec());
    }
}
