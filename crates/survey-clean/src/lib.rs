//! Customer Survey Cleaning Library
//!
//! A batch cleaning pipeline for customer survey tables, built with Rust and Polars.
//!
//! # Overview
//!
//! A run takes a table of survey responses with a fixed ten-column schema
//! through four stages:
//!
//! - **Loading**: the embedded sample or a CSV file, checked against the schema
//! - **Cleaning**: missing values, duplicates, out-of-range numbers, text
//!   formatting and date normalization, in that order
//! - **Writing**: the cleaned table as CSV
//! - **Reporting**: before/after quality metrics, SVG charts and a JSON report
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use survey_clean::{CleaningConfig, DatasetLoader, OutputConfig, Pipeline};
//!
//! let dataset = DatasetLoader::load_csv("survey.csv")?;
//!
//! let result = Pipeline::builder()
//!     .config(CleaningConfig::default())
//!     .output(OutputConfig::default().output_dir("output"))
//!     .input_source("survey.csv")
//!     .build()?
//!     .run(dataset)?;
//!
//! println!("{}", result.report.summary_text());
//! ```
//!
//! # Configuration
//!
//! Every cleaning convention is explicit in [`CleaningConfig`]:
//!
//! ```rust,ignore
//! use survey_clean::config::*;
//!
//! let config = CleaningConfig::builder()
//!     .missing_numeric(NumericImputation::Mean)
//!     .text_imputation("email", TextImputation::Drop)
//!     .range(NumericRange::new("age", Some(18.0), Some(99.0), OutlierStrategy::Remove))
//!     .invalid_dates(InvalidDatePolicy::Abort)
//!     .build()?;
//! ```
//!
//! # Using the Cleaner Directly
//!
//! The pipeline only adds I/O and reporting around [`Cleaner`], which can be
//! used on its own:
//!
//! ```rust,ignore
//! use survey_clean::{Cleaner, CleaningConfig, DatasetLoader};
//!
//! let outcome = Cleaner::new(CleaningConfig::default())?
//!     .clean(DatasetLoader::load_embedded()?)?;
//!
//! for step in &outcome.steps {
//!     println!("{}: {} value(s) changed", step.step, step.values_changed);
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;
pub mod writer;

// Re-exports for convenient access
pub use cleaner::Cleaner;
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, InvalidDatePolicy,
    NumericImputation, NumericRange, OutlierStrategy, OutputConfig, TextImputation,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::DatasetLoader;
pub use pipeline::{
    CleaningStage, ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineResult,
    ProgressReporter, ProgressUpdate,
};
pub use quality::{QualityComparison, QualityIssue, QualityMetrics, RangeViolations};
pub use reporting::{ChartRenderer, CleaningReport, ReportGenerator, RunSummary};
pub use types::{
    CleaningOutcome, CleaningStep, ColumnKind, Dataset, RowIssue, StepReport, SurveyRecord,
};
pub use writer::DatasetWriter;
