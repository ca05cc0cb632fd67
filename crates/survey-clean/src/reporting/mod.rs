//! Report generation module.
//!
//! Builds the JSON run report and renders the SVG validation charts. Both
//! only observe the datasets; nothing here changes the cleaned data.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_clean::reporting::{ReportGenerator, ReportParams};
//!
//! let report = ReportGenerator::build_report(ReportParams {
//!     input_source: "survey.csv",
//!     outcome: &outcome,
//!     comparison: &comparison,
//!     config: &config,
//!     output_files: &[],
//!     duration_ms: 42,
//! });
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

mod charts;
mod generator;

pub use charts::{
    ANALYSIS_CHART_FILE, ChartRenderer, QUALITY_CHART_FILE, SvgCanvas, escape_xml, histogram,
};
pub use generator::{CleaningReport, REPORT_FILE, ReportGenerator, ReportParams, RunSummary};
