//! Categorical encoding of the clinical label columns.
//!
//! Every categorical column has a fixed label → code table. The tables are
//! part of the data contract: codes must stay exactly as listed so models
//! trained on one export can score another.
//!
//! Values that are not in a column's table, and the sentinel `-1`, become
//! missing so that the imputer fills them. This is a silent fallback: unknown
//! labels are counted in [`EncodingStats`] and logged, never raised.

use crate::error::{PreprocessingError, Result};
use crate::utils::is_numeric_dtype;
use once_cell::sync::Lazy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Reserved code marking a missing categorical value prior to imputation.
pub const MISSING_SENTINEL: i64 = -1;

/// Label → code table of one categorical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoricalEncoding {
    pub column: &'static str,
    pub labels: &'static [(&'static str, i64)],
}

impl CategoricalEncoding {
    /// Code of a raw label, or `None` when the label is not part of the table.
    pub fn code(&self, label: &str) -> Option<i64> {
        self.labels
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, code)| *code)
    }

    /// Check whether an already numeric value is one of this column's codes.
    pub fn is_code(&self, code: i64) -> bool {
        self.labels.iter().any(|(_, known)| *known == code)
    }
}

/// Fixed encodings of all 27 categorical columns.
pub const CATEGORICAL_VALUE_MAP: [CategoricalEncoding; 27] = [
    CategoricalEncoding {
        column: "Sex",
        labels: &[("male", 1), ("female", 0)],
    },
    CategoricalEncoding {
        column: "AppendixOnSono",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "MigratoryPain",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "LowerAbdominalPainRight",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "ReboundTenderness",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "CoughingPain",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "PsoasSign",
        labels: &[("negative", 0), ("positive", 1)],
    },
    CategoricalEncoding {
        column: "Nausea",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "AppetiteLoss",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "KetonesInUrine",
        labels: &[("+", 1), ("no", 0), ("+++", 3), ("++", 2)],
    },
    CategoricalEncoding {
        column: "ErythrocytesInUrine",
        labels: &[("+", 1), ("no", 0), ("++", 2), ("+++", 3)],
    },
    CategoricalEncoding {
        column: "WBCInUrine",
        labels: &[("no", 0), ("+", 1), ("+++", 3), ("++", 2)],
    },
    CategoricalEncoding {
        column: "Dysuria",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "Stool",
        labels: &[("normal", 0), ("obstipation", 1), ("diarrhea", 2)],
    },
    CategoricalEncoding {
        column: "Peritonitis",
        labels: &[("no", 0), ("local", 1), ("generalised", 2)],
    },
    CategoricalEncoding {
        column: "FreeFluids",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "AppendixWallLayers",
        labels: &[("aufgehoben", 1), ("intakt", 0)],
    },
    CategoricalEncoding {
        column: "Kokarde",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "TissuePerfusion",
        labels: &[("unremarkable", 0), ("hypoperfused", 1), ("hyperperfused", 2)],
    },
    CategoricalEncoding {
        column: "SurroundingTissueReaction",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "PathLymphNodes",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "MesentricLymphadenitis",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "BowelWallThick",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "Ileus",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "FecalImpaction",
        labels: &[("yes", 1), ("no", 0)],
    },
    CategoricalEncoding {
        column: "Meteorism",
        labels: &[("no", 0), ("yes", 1)],
    },
    CategoricalEncoding {
        column: "Enteritis",
        labels: &[("no", 0), ("yes", 1)],
    },
];

static ENCODINGS_BY_COLUMN: Lazy<HashMap<&'static str, &'static CategoricalEncoding>> =
    Lazy::new(|| {
        CATEGORICAL_VALUE_MAP
            .iter()
            .map(|encoding| (encoding.column, encoding))
            .collect()
    });

/// Look up the encoding table of a categorical column.
pub fn encoding_for(column: &str) -> Option<&'static CategoricalEncoding> {
    ENCODINGS_BY_COLUMN.get(column).copied()
}

/// Encode a single raw label of a categorical column.
///
/// Returns `None` (missing) for unknown columns, unknown labels and the
/// sentinel `"-1"`.
///
/// ```rust,ignore
/// assert_eq!(encode("KetonesInUrine", "++"), Some(2));
/// assert_eq!(encode("Sex", "Male"), None);
/// ```
pub fn encode(column: &str, label: &str) -> Option<i64> {
    encoding_for(column)?.code(label)
}

/// Per-column counts of values that were coerced to missing during encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingStats {
    /// Present values outside the column's label table.
    pub unmapped: BTreeMap<String, usize>,
    /// Explicit `-1` sentinels.
    pub sentinels: BTreeMap<String, usize>,
}

impl EncodingStats {
    /// Total number of unknown labels across all columns.
    pub fn total_unmapped(&self) -> usize {
        self.unmapped.values().sum()
    }

    /// Total number of sentinel values across all columns.
    pub fn total_sentinels(&self) -> usize {
        self.sentinels.values().sum()
    }

    fn record(&mut self, column: &str, unmapped: usize, sentinels: usize) {
        if unmapped > 0 {
            self.unmapped.insert(column.to_string(), unmapped);
        }
        if sentinels > 0 {
            self.sentinels.insert(column.to_string(), sentinels);
        }
    }
}

/// Encode one column, returning the `Float64` codes plus the number of unknown
/// labels and sentinels that were turned into nulls.
pub fn encode_column(
    column: &Column,
    encoding: &CategoricalEncoding,
) -> Result<(Series, usize, usize)> {
    let mut unmapped = 0;
    let mut sentinels = 0;
    let len = column.len();
    let mut codes: Vec<Option<f64>> = Vec::with_capacity(len);

    if matches!(column.dtype(), DataType::Null) {
        codes.resize(len, None);
    } else if is_numeric_dtype(column.dtype()) || matches!(column.dtype(), DataType::Boolean) {
        let as_float = column.cast(&DataType::Float64)?;
        for value in as_float.f64()?.into_iter() {
            codes.push(match value {
                None => None,
                Some(v) if v.is_nan() => None,
                Some(v) if v == MISSING_SENTINEL as f64 => {
                    sentinels += 1;
                    None
                }
                Some(v) if v.fract() == 0.0 && encoding.is_code(v as i64) => Some(v),
                Some(_) => {
                    unmapped += 1;
                    None
                }
            });
        }
    } else {
        let as_text = column.cast(&DataType::String)?;
        for value in as_text.str()?.into_iter() {
            codes.push(match value {
                None => None,
                Some(label) => match encoding.code(label) {
                    Some(code) => Some(code as f64),
                    None if label == "-1" => {
                        sentinels += 1;
                        None
                    }
                    None => {
                        unmapped += 1;
                        None
                    }
                },
            });
        }
    }

    Ok((
        Series::new(column.name().clone(), codes),
        unmapped,
        sentinels,
    ))
}

/// Apply the categorical value map to all 27 categorical columns.
///
/// Columns not covered by the map are left untouched. Every categorical
/// column must be present.
pub fn encode_categoricals(df: &DataFrame) -> Result<(DataFrame, EncodingStats)> {
    let mut result_df = df.clone();
    let mut stats = EncodingStats::default();

    for encoding in CATEGORICAL_VALUE_MAP.iter() {
        let column = df
            .column(encoding.column)
            .map_err(|_| PreprocessingError::ColumnNotFound(encoding.column.to_string()))?;

        let (encoded, unmapped, sentinels) = encode_column(column, encoding)?;
        if unmapped > 0 {
            debug!(
                "'{}': {} values outside the label table set to missing",
                encoding.column, unmapped
            );
        }
        stats.record(encoding.column, unmapped, sentinels);
        result_df.replace(encoding.column, encoded)?;
    }

    Ok((result_df, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::VARS_CATEGORICAL;

    #[test]
    fn test_map_covers_every_categorical_column() {
        let mapped: Vec<&str> = CATEGORICAL_VALUE_MAP.iter().map(|e| e.column).collect();
        assert_eq!(mapped, VARS_CATEGORICAL.to_vec());
    }

    #[test]
    fn test_documented_codes() {
        assert_eq!(encode("Sex", "male"), Some(1));
        assert_eq!(encode("Sex", "female"), Some(0));
        assert_eq!(encode("PsoasSign", "positive"), Some(1));
        assert_eq!(encode("KetonesInUrine", "no"), Some(0));
        assert_eq!(encode("KetonesInUrine", "+"), Some(1));
        assert_eq!(encode("KetonesInUrine", "++"), Some(2));
        assert_eq!(encode("KetonesInUrine", "+++"), Some(3));
        assert_eq!(encode("WBCInUrine", "+++"), Some(3));
        assert_eq!(encode("Stool", "diarrhea"), Some(2));
        assert_eq!(encode("Peritonitis", "generalised"), Some(2));
        assert_eq!(encode("AppendixWallLayers", "aufgehoben"), Some(1));
        assert_eq!(encode("AppendixWallLayers", "intakt"), Some(0));
        assert_eq!(encode("TissuePerfusion", "hyperperfused"), Some(2));
        assert_eq!(encode("Enteritis", "yes"), Some(1));
    }

    #[test]
    fn test_every_label_round_trips_through_lookup() {
        for encoding in CATEGORICAL_VALUE_MAP.iter() {
            for (label, code) in encoding.labels {
                assert_eq!(encode(encoding.column, label), Some(*code));
            }
        }
    }

    #[test]
    fn test_unknown_values_are_missing() {
        assert_eq!(encode("Sex", "Male"), None);
        assert_eq!(encode("Sex", "-1"), None);
        assert_eq!(encode("Stool", "constipation"), None);
        assert_eq!(encode("Age", "yes"), None);
    }

    #[test]
    fn test_encode_string_column() {
        let column = Column::new(
            "KetonesInUrine".into(),
            [Some("no"), Some("+++"), None, Some("-1"), Some("lots")],
        );
        let encoding = encoding_for("KetonesInUrine").unwrap();
        let (encoded, unmapped, sentinels) = encode_column(&column, encoding).unwrap();

        let values: Vec<Option<f64>> = encoded.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0.0), Some(3.0), None, None, None]);
        assert_eq!(unmapped, 1);
        assert_eq!(sentinels, 1);
    }

    #[test]
    fn test_encode_numeric_column_keeps_valid_codes() {
        let column = Column::new("Stool".into(), [Some(0i64), Some(2), Some(-1), Some(7), None]);
        let encoding = encoding_for("Stool").unwrap();
        let (encoded, unmapped, sentinels) = encode_column(&column, encoding).unwrap();

        let values: Vec<Option<f64>> = encoded.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0.0), Some(2.0), None, None, None]);
        assert_eq!(unmapped, 1);
        assert_eq!(sentinels, 1);
    }

    #[test]
    fn test_encode_float_nan_is_missing_not_unmapped() {
        let column = Column::new("Sex".into(), [f64::NAN, 1.0, 0.0, 0.5]);
        let encoding = encoding_for("Sex").unwrap();
        let (encoded, unmapped, sentinels) = encode_column(&column, encoding).unwrap();

        let values: Vec<Option<f64>> = encoded.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![None, Some(1.0), Some(0.0), None]);
        assert_eq!(unmapped, 1);
        assert_eq!(sentinels, 0);
    }

    #[test]
    fn test_encode_all_null_column() {
        let column = Column::full_null("Kokarde".into(), 3, &DataType::Null);
        let encoding = encoding_for("Kokarde").unwrap();
        let (encoded, unmapped, _) = encode_column(&column, encoding).unwrap();

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.null_count(), 3);
        assert_eq!(unmapped, 0);
    }

    #[test]
    fn test_encode_categoricals_requires_columns() {
        let df = df!["Sex" => ["male"]].unwrap();
        let err = encode_categoricals(&df).unwrap_err();
        assert!(matches!(err, PreprocessingError::ColumnNotFound(ref c) if c == "AppendixOnSono"));
    }
}
