//! Custom error types for cohort preprocessing.
//!
//! This module provides the error hierarchy using `thiserror`. Every failure
//! is fatal for the run: schema problems, violated data preconditions and
//! imputation failures abort processing and are surfaced to the caller.
//!
//! Errors are serializable so they can be handed to JSON consumers as a
//! `{code, message}` pair.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for cohort preprocessing.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// One or more required columns are absent from an input table.
    #[error("Input table is missing required columns: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// A single column looked up by name is absent.
    #[error("Column '{0}' does not exist in the cohort table")]
    ColumnNotFound(String),

    /// A documented data precondition does not hold.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid preprocessing configuration: {0}")]
    InvalidConfig(String),

    /// The imputer cannot be fitted or applied for a column.
    #[error("Cannot impute column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    #[error("Dataframe operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Report serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Any of the above, annotated with the step that failed.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Wrap the error with a description of the failing step.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the shape of the input tables.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::SchemaMismatch { .. } | Self::ColumnNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }

    /// Check if this error is a violated data precondition.
    pub fn is_precondition_error(&self) -> bool {
        match self {
            Self::PreconditionFailed(_) => true,
            Self::WithContext { source, .. } => source.is_precondition_error(),
            _ => false,
        }
    }
}

impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result of a preprocessing step.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Attach step context to fallible polars and preprocessing calls.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
