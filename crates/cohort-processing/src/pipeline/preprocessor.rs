//! Cohort preprocessor.
//!
//! Runs the fixed cleaning sequence over the reference and validation
//! cohorts. The imputer fitted on the reference cohort is returned as a value
//! and handed explicitly to the validation step.

use crate::config::PreprocessingConfig;
use crate::corrections::{correct_body_temperature, drop_missing_diagnosis, rescale_wbc_count};
use crate::encoding::encode_categoricals;
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::factorize::factorize_outcomes;
use crate::imputers::{FittedKnnImputer, KNNImputer};
use crate::schema::{feature_columns, select_included};
use crate::types::{CohortOutput, CohortReport, CohortRole, PreprocessingOutput, ReferenceOutput};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// Cleans and harmonizes the two appendicitis cohorts.
///
/// # Example
///
/// ```rust,ignore
/// use cohort_processing::{CohortPreprocessor, PreprocessingConfig};
///
/// let preprocessor = CohortPreprocessor::new(PreprocessingConfig::default())?;
///
/// let reference = preprocessor.preprocess_reference(&regensburg)?;
/// let validation = preprocessor.preprocess_validation(&dusseldorf, &reference.imputer)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CohortPreprocessor {
    config: PreprocessingConfig,
}

static_assertions::assert_impl_all!(CohortPreprocessor: Send, Sync);

impl CohortPreprocessor {
    /// Create a preprocessor, validating the configuration.
    pub fn new(config: PreprocessingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Process both cohorts: the first is the reference, the second the
    /// validation cohort.
    pub fn run(&self, reference: &DataFrame, validation: &DataFrame) -> Result<PreprocessingOutput> {
        let reference = self.preprocess_reference(reference)?;
        let validation = self.preprocess_validation(validation, &reference.imputer)?;

        Ok(PreprocessingOutput {
            reference: CohortOutput {
                data: reference.data,
                report: reference.report,
            },
            validation,
        })
    }

    /// Clean the reference cohort and fit the imputer on it.
    ///
    /// 1. Project onto the included columns.
    /// 2. Drop rows without a diagnosis.
    /// 3. Correct the erroneous body temperature.
    /// 4. Encode categorical columns.
    /// 5. Fit the KNN imputer on the feature columns and impute them.
    /// 6. Append the factorized outcome columns.
    pub fn preprocess_reference(&self, raw: &DataFrame) -> Result<ReferenceOutput> {
        let start_time = Instant::now();
        let role = CohortRole::Reference;
        info!("Preprocessing {} ({} rows)", role.display_name(), raw.height());

        let mut report = CohortReport::new(role, raw.height());

        let selected = select_included(raw).context(role.display_name())?;
        let (filtered, dropped) = drop_missing_diagnosis(&selected)?;
        report.rows_dropped_missing_diagnosis = dropped;

        let (corrected, fix) =
            correct_body_temperature(&filtered, &self.config).context(role.display_name())?;
        report.body_temp_fix = Some(fix);

        let (encoded, encoding_stats) = encode_categoricals(&corrected)?;
        report.encoding = encoding_stats;

        let features = feature_columns();
        let imputer = KNNImputer::new(self.config.knn_neighbors)
            .with_weighting(self.config.knn_weighting)
            .fit(&encoded, &features)
            .context("Fitting imputer on reference cohort")?;
        let (imputed, imputed_cells) = imputer
            .transform_counted(&encoded)
            .context("Imputing reference cohort")?;
        report.imputed_cells = imputed_cells;

        let data = self.attach_outcomes(imputed, &encoded, &mut report)?;
        self.finish_report(&mut report, &data, start_time);

        Ok(ReferenceOutput {
            data,
            imputer,
            report,
        })
    }

    /// Clean the validation cohort with an imputer fitted on the reference
    /// cohort.
    ///
    /// Rows are never dropped and no body-temperature fix is applied. After
    /// imputation, `WBCCount` values recorded in the wrong unit are rescaled.
    pub fn preprocess_validation(
        &self,
        raw: &DataFrame,
        imputer: &FittedKnnImputer,
    ) -> Result<CohortOutput> {
        let start_time = Instant::now();
        let role = CohortRole::Validation;
        info!("Preprocessing {} ({} rows)", role.display_name(), raw.height());

        let features = feature_columns();
        if imputer.columns() != features.as_slice() {
            return Err(PreprocessingError::InvalidConfig(
                "imputer was not fitted on the cohort feature columns".to_string(),
            ));
        }

        let mut report = CohortReport::new(role, raw.height());

        let selected = select_included(raw).context(role.display_name())?;

        let (encoded, encoding_stats) = encode_categoricals(&selected)?;
        report.encoding = encoding_stats;

        let (imputed, imputed_cells) = imputer
            .transform_counted(&encoded)
            .context("Imputing validation cohort")?;
        report.imputed_cells = imputed_cells;

        let assembled = self.attach_outcomes(imputed, &encoded, &mut report)?;

        let (data, rescaled) = rescale_wbc_count(&assembled, &self.config)?;
        report.wbc_rescaled_rows = rescaled;

        self.finish_report(&mut report, &data, start_time);

        Ok(CohortOutput { data, report })
    }

    /// Append the factorized outcome columns after the imputed features.
    fn attach_outcomes(
        &self,
        features: DataFrame,
        source: &DataFrame,
        report: &mut CohortReport,
    ) -> Result<DataFrame> {
        let (outcomes, levels) = factorize_outcomes(source, self.config.missing_label_policy)?;

        for (column, factorization) in &levels {
            debug!(
                "'{}': {} levels, {} missing",
                column,
                factorization.levels.len(),
                factorization.missing
            );
        }
        report.record_outcomes(levels);

        let outcome_columns: Vec<Column> = outcomes.into_iter().map(Column::from).collect();
        Ok(features.hstack(&outcome_columns)?)
    }

    fn finish_report(&self, report: &mut CohortReport, data: &DataFrame, start_time: Instant) {
        report.rows_after = data.height();
        report.duration_ms = start_time.elapsed().as_millis() as u64;
        report.processed_at = chrono::Utc::now().to_rfc3339();

        info!(
            "{} done: {} -> {} rows, {} cells imputed",
            report.cohort.display_name(),
            report.rows_before,
            report.rows_after,
            report.total_imputed()
        );
    }
}

/// Clean both cohorts with the default configuration.
///
/// Returns `(reference_clean, validation_clean)`.
pub fn run_preprocessing(
    cohort_a_raw: &DataFrame,
    cohort_b_raw: &DataFrame,
) -> Result<(DataFrame, DataFrame)> {
    let output = CohortPreprocessor::default().run(cohort_a_raw, cohort_b_raw)?;
    Ok(output.into_tables())
}

/// Count the nulls remaining in the given columns of a table.
pub fn remaining_nulls(df: &DataFrame, columns: &[String]) -> BTreeMap<String, usize> {
    columns
        .iter()
        .filter_map(|name| {
            df.column(name)
                .ok()
                .map(|column| (name.clone(), column.null_count()))
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}
