//! Cohort preprocessing pipeline.
//!
//! This module provides the preprocessor that composes schema selection,
//! record corrections, categorical encoding, imputation and outcome
//! factorization into the two cohort runs.

mod preprocessor;

pub use preprocessor::{CohortPreprocessor, remaining_nulls, run_preprocessing};
