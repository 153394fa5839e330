//! Appendicitis Cohort Preprocessing Library
//!
//! Cleans and harmonizes two pediatric appendicitis cohorts into one shared,
//! fully numeric schema, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Schema**: both cohorts are projected onto the same 41 included columns
//! - **Corrections**: rows without a diagnosis are dropped, a known erroneous
//!   body temperature is fixed, mis-scaled white blood cell counts are rescaled
//! - **Encoding**: 27 categorical columns are mapped through fixed label tables
//! - **Imputation**: a KNN imputer fitted on the reference cohort fills the
//!   feature columns of both cohorts
//! - **Outcomes**: the three outcome labels are factorized per cohort
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cohort_processing::run_preprocessing;
//!
//! let (regensburg_clean, dusseldorf_clean) = run_preprocessing(&regensburg, &dusseldorf)?;
//! ```
//!
//! # Explicit fit / transform
//!
//! ```rust,ignore
//! use cohort_processing::{CohortPreprocessor, PreprocessingConfig, BodyTempCorrection};
//!
//! let config = PreprocessingConfig::builder()
//!     .body_temp_correction(BodyTempCorrection::ExactlyOne)
//!     .build()?;
//! let preprocessor = CohortPreprocessor::new(config)?;
//!
//! let reference = preprocessor.preprocess_reference(&regensburg)?;
//! let validation = preprocessor.preprocess_validation(&dusseldorf, &reference.imputer)?;
//!
//! println!("{}", reference.report.to_json()?);
//! ```

pub mod config;
pub mod corrections;
pub mod encoding;
pub mod error;
pub mod factorize;
pub mod imputers;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    BodyTempCorrection, ConfigValidationError, KnnWeighting, MissingLabelPolicy,
    PreprocessingConfig, PreprocessingConfigBuilder,
};
pub use corrections::BodyTempFix;
pub use encoding::{CATEGORICAL_VALUE_MAP, CategoricalEncoding, EncodingStats, encode};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use factorize::{Factorization, MISSING_LABEL_CODE, factorize_values};
pub use imputers::{FittedKnnImputer, KNNImputer};
pub use pipeline::{CohortPreprocessor, remaining_nulls, run_preprocessing};
pub use schema::{OUTCOME_COLUMNS, VARS_CATEGORICAL, VARS_INCLUDED, VARS_NUMERICAL};
pub use types::{CohortOutput, CohortReport, CohortRole, PreprocessingOutput, ReferenceOutput};
