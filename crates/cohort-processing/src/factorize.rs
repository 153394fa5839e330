//! Factorization of outcome labels.
//!
//! Distinct values receive zero-based integer codes in the order they are
//! first encountered. Codes are computed per column and per cohort, so the
//! same label can map to different codes in the two cohorts.

use crate::config::MissingLabelPolicy;
use crate::error::Result;
use crate::schema::OUTCOME_COLUMNS;
use crate::utils::column_as_keys;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Code assigned to missing labels under [`MissingLabelPolicy::Sentinel`].
pub const MISSING_LABEL_CODE: i64 = -1;

/// Result of factorizing one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factorization {
    /// One code per input row.
    pub codes: Vec<i64>,
    /// Distinct values in code order; `levels[c]` is the value coded `c`.
    /// A `None` level only appears under [`MissingLabelPolicy::Category`].
    pub levels: Vec<Option<String>>,
    /// Number of rows with a missing label.
    pub missing: usize,
}

/// Factorize a sequence of labels.
pub fn factorize_values(values: &[Option<String>], policy: MissingLabelPolicy) -> Factorization {
    let mut lookup: HashMap<Option<&str>, i64> = HashMap::new();
    let mut levels = Vec::new();
    let mut codes = Vec::with_capacity(values.len());
    let mut missing = 0;

    for value in values {
        let key = value.as_deref();
        if key.is_none() {
            missing += 1;
            if policy == MissingLabelPolicy::Sentinel {
                codes.push(MISSING_LABEL_CODE);
                continue;
            }
        }

        let code = *lookup.entry(key).or_insert_with(|| {
            levels.push(value.clone());
            (levels.len() - 1) as i64
        });
        codes.push(code);
    }

    Factorization {
        codes,
        levels,
        missing,
    }
}

/// Factorize one column of a table into an `Int64` series of the same name.
pub fn factorize(
    df: &DataFrame,
    column: &str,
    policy: MissingLabelPolicy,
) -> Result<(Series, Factorization)> {
    let keys = column_as_keys(df, column)?;
    let factorization = factorize_values(&keys, policy);
    let series = Series::new(column.into(), factorization.codes.clone());
    Ok((series, factorization))
}

/// Factorize the three outcome columns independently.
///
/// Returns the coded series in [`OUTCOME_COLUMNS`] order together with the
/// levels of each column.
pub fn factorize_outcomes(
    df: &DataFrame,
    policy: MissingLabelPolicy,
) -> Result<(Vec<Series>, BTreeMap<String, Factorization>)> {
    let mut series = Vec::with_capacity(OUTCOME_COLUMNS.len());
    let mut levels = BTreeMap::new();

    for column in OUTCOME_COLUMNS {
        let (coded, factorization) = factorize(df, column, policy)?;
        series.push(coded);
        levels.insert(column.to_string(), factorization);
    }

    Ok((series, levels))
}
