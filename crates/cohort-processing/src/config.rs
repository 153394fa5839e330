//! Configuration types for cohort preprocessing.
//!
//! The defaults reproduce the documented cleaning rules of the two appendicitis
//! cohorts. They are exposed so a caller can tighten the handling of ambiguous
//! input (multiple body-temperature sentinels, missing outcome labels) without
//! touching the processing code.

use serde::{Deserialize, Serialize};

/// Weighting of neighbour values in KNN imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KnnWeighting {
    /// Plain mean of the k nearest donors
    #[default]
    Uniform,
    /// Inverse-distance weighted mean of the k nearest donors. Donors at
    /// distance zero, if any, share all the weight.
    Distance,
}

/// How the single-row body-temperature fix treats the sentinel rows it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BodyTempCorrection {
    /// Correct the first matching row. Fails when no row matches; additional
    /// matches are left untouched, logged and reported.
    #[default]
    FirstMatch,
    /// Require exactly one matching row; zero or several matches fail.
    ExactlyOne,
}

/// Encoding of missing outcome labels during factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissingLabelPolicy {
    /// Missing labels receive [`crate::factorize::MISSING_LABEL_CODE`],
    /// which never collides with a valid category.
    #[default]
    Sentinel,
    /// Missing is treated as one more category and receives the code of its
    /// first-seen position.
    Category,
}

/// Configuration for cohort preprocessing.
///
/// Use [`PreprocessingConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use cohort_processing::config::{BodyTempCorrection, PreprocessingConfig};
///
/// let config = PreprocessingConfig::builder()
///     .knn_neighbors(5)
///     .body_temp_correction(BodyTempCorrection::ExactlyOne)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Number of neighbours used by the KNN imputer.
    /// Default: 5
    pub knn_neighbors: usize,

    /// Weighting of donor values in KNN imputation.
    /// Default: Uniform
    pub knn_weighting: KnnWeighting,

    /// Body temperatures strictly below this value are data-entry errors.
    /// Default: 30.0
    pub body_temp_threshold: f64,

    /// Value written over the erroneous body temperature.
    /// Default: 36.9
    pub body_temp_replacement: f64,

    /// Matching rule for the body-temperature fix.
    /// Default: FirstMatch
    pub body_temp_correction: BodyTempCorrection,

    /// `WBCCount` values strictly above this were recorded in the wrong unit
    /// (validation cohort only).
    /// Default: 1000.0
    pub wbc_unit_threshold: f64,

    /// Divisor applied to `WBCCount` values above the threshold.
    /// Default: 1000.0
    pub wbc_unit_divisor: f64,

    /// Encoding of missing outcome labels.
    /// Default: Sentinel
    pub missing_label_policy: MissingLabelPolicy,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            knn_neighbors: 5,
            knn_weighting: KnnWeighting::default(),
            body_temp_threshold: 30.0,
            body_temp_replacement: 36.9,
            body_temp_correction: BodyTempCorrection::default(),
            wbc_unit_threshold: 1000.0,
            wbc_unit_divisor: 1000.0,
            missing_label_policy: MissingLabelPolicy::default(),
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PreprocessingConfigBuilder {
        PreprocessingConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        for (field, value) in [
            ("body_temp_threshold", self.body_temp_threshold),
            ("body_temp_replacement", self.body_temp_replacement),
            ("wbc_unit_threshold", self.wbc_unit_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigValidationError::NonFiniteValue {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !self.wbc_unit_divisor.is_finite() || self.wbc_unit_divisor <= 0.0 {
            return Err(ConfigValidationError::InvalidDivisor(self.wbc_unit_divisor));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),

    #[error("Invalid value for '{field}': {value} (must be finite)")]
    NonFiniteValue { field: String, value: f64 },

    #[error("Invalid WBC unit divisor: {0} (must be finite and positive)")]
    InvalidDivisor(f64),
}

impl From<ConfigValidationError> for crate::error::PreprocessingError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::PreprocessingError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PreprocessingConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PreprocessingConfigBuilder {
    knn_neighbors: Option<usize>,
    knn_weighting: Option<KnnWeighting>,
    body_temp_threshold: Option<f64>,
    body_temp_replacement: Option<f64>,
    body_temp_correction: Option<BodyTempCorrection>,
    wbc_unit_threshold: Option<f64>,
    wbc_unit_divisor: Option<f64>,
    missing_label_policy: Option<MissingLabelPolicy>,
}

impl PreprocessingConfigBuilder {
    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Set how donor values are weighted during KNN imputation.
    pub fn knn_weighting(mut self, weighting: KnnWeighting) -> Self {
        self.knn_weighting = Some(weighting);
        self
    }

    /// Set the body temperature below which a record is considered a
    /// data-entry error.
    pub fn body_temp_threshold(mut self, threshold: f64) -> Self {
        self.body_temp_threshold = Some(threshold);
        self
    }

    /// Set the value written over the erroneous body temperature.
    pub fn body_temp_replacement(mut self, value: f64) -> Self {
        self.body_temp_replacement = Some(value);
        self
    }

    /// Set the matching rule for the body-temperature fix.
    pub fn body_temp_correction(mut self, correction: BodyTempCorrection) -> Self {
        self.body_temp_correction = Some(correction);
        self
    }

    /// Set the `WBCCount` value above which the unit is considered wrong.
    pub fn wbc_unit_threshold(mut self, threshold: f64) -> Self {
        self.wbc_unit_threshold = Some(threshold);
        self
    }

    /// Set the divisor applied to `WBCCount` values above the threshold.
    pub fn wbc_unit_divisor(mut self, divisor: f64) -> Self {
        self.wbc_unit_divisor = Some(divisor);
        self
    }

    /// Set how missing outcome labels are encoded.
    pub fn missing_label_policy(mut self, policy: MissingLabelPolicy) -> Self {
        self.missing_label_policy = Some(policy);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PreprocessingConfig` or an error if validation fails.
    pub fn build(self) -> Result<PreprocessingConfig, ConfigValidationError> {
        let defaults = PreprocessingConfig::default();
        let config = PreprocessingConfig {
            knn_neighbors: self.knn_neighbors.unwrap_or(defaults.knn_neighbors),
            knn_weighting: self.knn_weighting.unwrap_or_default(),
            body_temp_threshold: self
                .body_temp_threshold
                .unwrap_or(defaults.body_temp_threshold),
            body_temp_replacement: self
                .body_temp_replacement
                .unwrap_or(defaults.body_temp_replacement),
            body_temp_correction: self.body_temp_correction.unwrap_or_default(),
            wbc_unit_threshold: self
                .wbc_unit_threshold
                .unwrap_or(defaults.wbc_unit_threshold),
            wbc_unit_divisor: self.wbc_unit_divisor.unwrap_or(defaults.wbc_unit_divisor),
            missing_label_policy: self.missing_label_policy.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessingConfig::default();
        assert_eq!(config.knn_neighbors, 5);
        assert_eq!(config.knn_weighting, KnnWeighting::Uniform);
        assert_eq!(config.body_temp_threshold, 30.0);
        assert_eq!(config.body_temp_replacement, 36.9);
        assert_eq!(config.body_temp_correction, BodyTempCorrection::FirstMatch);
        assert_eq!(config.wbc_unit_threshold, 1000.0);
        assert_eq!(config.wbc_unit_divisor, 1000.0);
        assert_eq!(config.missing_label_policy, MissingLabelPolicy::Sentinel);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = PreprocessingConfig::builder().build().unwrap();
        assert_eq!(config, PreprocessingConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PreprocessingConfig::builder()
            .knn_neighbors(3)
            .knn_weighting(KnnWeighting::Distance)
            .body_temp_correction(BodyTempCorrection::ExactlyOne)
            .missing_label_policy(MissingLabelPolicy::Category)
            .wbc_unit_threshold(500.0)
            .build()
            .unwrap();

        assert_eq!(config.knn_neighbors, 3);
        assert_eq!(config.knn_weighting, KnnWeighting::Distance);
        assert_eq!(config.body_temp_correction, BodyTempCorrection::ExactlyOne);
        assert_eq!(config.missing_label_policy, MissingLabelPolicy::Category);
        assert_eq!(config.wbc_unit_threshold, 500.0);
        assert_eq!(config.wbc_unit_divisor, 1000.0);
    }

    #[test]
    fn test_validation_invalid_knn_neighbors() {
        let result = PreprocessingConfig::builder().knn_neighbors(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidKnnNeighbors(0)
        ));
    }

    #[test]
    fn test_validation_non_finite_threshold() {
        let result = PreprocessingConfig::builder()
            .body_temp_threshold(f64::NAN)
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NonFiniteValue { .. }
        ));
    }

    #[test]
    fn test_validation_zero_divisor() {
        let result = PreprocessingConfig::builder().wbc_unit_divisor(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDivisor(_)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "knn_neighbors": 7,
            "knn_weighting": "Distance",
            "body_temp_threshold": 30.0,
            "body_temp_replacement": 36.9,
            "body_temp_correction": "ExactlyOne",
            "wbc_unit_threshold": 1000.0,
            "wbc_unit_divisor": 1000.0,
            "missing_label_policy": "Category"
        }"#;

        let config: PreprocessingConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.knn_neighbors, 7);
        assert_eq!(config.knn_weighting, KnnWeighting::Distance);
        assert_eq!(config.body_temp_correction, BodyTempCorrection::ExactlyOne);
        assert_eq!(config.missing_label_policy, MissingLabelPolicy::Category);
        assert!(config.validate().is_ok());
    }
}
