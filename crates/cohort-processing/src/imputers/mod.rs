//! Imputation module for handling missing values.
//!
//! Imputation is split into an explicit fit step, which learns from a
//! reference table, and a transform step that can be applied to any table
//! with the same columns.

mod knn;

pub use knn::{FittedKnnImputer, KNNImputer};
