//! Imputation module for filling missing values.
//!
//! Provides the statistical fill strategies (mean, median, zero, mode and
//! placeholders) used by the missing-value step of the cleaner.

mod statistical;

pub use statistical::StatisticalImputer;
