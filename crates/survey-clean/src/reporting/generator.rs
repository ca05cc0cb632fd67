use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::quality::{QualityComparison, QualityIssue};
use crate::types::{AGE, CleaningOutcome, CleaningStep, RowIssue, SATISFACTION_RATING, StepReport};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

pub const REPORT_FILE: &str = "cleaning_report.json";

/// Full report of one cleaning run.
///
/// Used for the `--json` CLI output and for the report file written next to
/// the cleaned CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Input file path, or the embedded sample marker
    pub input_source: String,
    /// Files written by the run
    pub output_files: Vec<String>,
    pub summary: RunSummary,
    /// What each cleaning step did
    pub steps: Vec<StepReport>,
    /// Rows dropped because they could not be cleaned
    pub row_issues: Vec<RowIssue>,
    pub quality: QualityComparison,
    /// Defects found in the input
    pub issues_found: Vec<QualityIssue>,
    /// Product category counts after cleaning
    pub category_counts: BTreeMap<String, usize>,
    /// Configuration the run used
    pub config: CleaningConfig,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub duplicates_removed: usize,
    pub missing_values_fixed: usize,
    pub invalid_ages_corrected: usize,
    pub invalid_ratings_corrected: usize,
    pub text_values_standardized: usize,
    pub dates_normalized: usize,
    pub rows_with_errors: usize,
    pub quality_score_before: f64,
    pub quality_score_after: f64,
}

/// Parameters for building a [`CleaningReport`].
pub struct ReportParams<'a> {
    pub input_source: &'a str,
    pub outcome: &'a CleaningOutcome,
    pub comparison: &'a QualityComparison,
    pub config: &'a CleaningConfig,
    pub output_files: &'a [PathBuf],
    pub duration_ms: u64,
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build the report of a finished run.
    pub fn build_report(params: ReportParams<'_>) -> CleaningReport {
        let ReportParams {
            input_source,
            outcome,
            comparison,
            config,
            output_files,
            duration_ms,
        } = params;

        let before = &comparison.before;
        let after = &comparison.after;
        let step_total = |step: CleaningStep, f: fn(&StepReport) -> usize| -> usize {
            outcome.steps.iter().filter(|s| s.step == step).map(f).sum()
        };
        let corrected = |column: &str| {
            let found = before.violations(column).map_or(0, |v| v.total());
            let left = after.violations(column).map_or(0, |v| v.total());
            found.saturating_sub(left)
        };

        let summary = RunSummary {
            duration_ms,
            rows_before: before.rows,
            rows_after: after.rows,
            rows_removed: before.rows.saturating_sub(after.rows),
            duplicates_removed: step_total(CleaningStep::Duplicates, StepReport::rows_removed),
            missing_values_fixed: before.missing_required.saturating_sub(after.missing_required),
            invalid_ages_corrected: corrected(AGE),
            invalid_ratings_corrected: corrected(SATISFACTION_RATING),
            text_values_standardized: step_total(CleaningStep::Text, |s| s.values_changed),
            dates_normalized: step_total(CleaningStep::Dates, |s| s.values_changed),
            rows_with_errors: outcome.row_issues.len(),
            quality_score_before: before.quality_score(),
            quality_score_after: after.quality_score(),
        };

        CleaningReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_source: input_source.to_string(),
            output_files: output_files.iter().map(|p| p.display().to_string()).collect(),
            summary,
            steps: outcome.steps.clone(),
            row_issues: outcome.row_issues.clone(),
            quality: comparison.clone(),
            issues_found: before.issues(),
            category_counts: after.category_values.clone(),
            config: config.clone(),
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_report_to_file(&self, report: &CleaningReport) -> Result<PathBuf> {
        let report_path = self.output_dir.join(REPORT_FILE);
        let write_error = |reason: String| CleaningError::Write {
            path: report_path.display().to_string(),
            reason,
        };

        fs::create_dir_all(&self.output_dir).map_err(|e| write_error(e.to_string()))?;
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&report_path).map_err(|e| write_error(e.to_string()))?;
        file.write_all(json.as_bytes())
            .map_err(|e| write_error(e.to_string()))?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

impl CleaningReport {
    /// Plain-text run summary for the console.
    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();

        let _ = writeln!(out, "=== DATA CLEANING RESULTS ===");
        let _ = writeln!(out, "Input: {}", self.input_source);
        let _ = writeln!(out, "Original dataset: {} rows", s.rows_before);
        let _ = writeln!(out, "Cleaned dataset:  {} rows", s.rows_after);
        let _ = writeln!(out, "Improvements:");
        let _ = writeln!(out, "  - Removed {} duplicate row(s)", s.duplicates_removed);
        let _ = writeln!(out, "  - Fixed {} missing value(s)", s.missing_values_fixed);
        let _ = writeln!(out, "  - Corrected {} invalid age(s)", s.invalid_ages_corrected);
        let _ = writeln!(out, "  - Corrected {} invalid rating(s)", s.invalid_ratings_corrected);
        let _ = writeln!(out, "  - Standardized {} text value(s)", s.text_values_standardized);
        let _ = writeln!(out, "  - Normalized {} date(s)", s.dates_normalized);
        if s.rows_with_errors > 0 {
            let _ = writeln!(
                out,
                "  - Dropped {} row(s) that could not be cleaned",
                s.rows_with_errors
            );
        }
        let _ = writeln!(
            out,
            "Quality score: {:.1} -> {:.1}",
            s.quality_score_before, s.quality_score_after
        );

        if !self.category_counts.is_empty() {
            let _ = writeln!(out, "Product categories:");
            for (category, count) in &self.category_counts {
                let _ = writeln!(out, "  {:<20} {}", category, count);
            }
        }

        if !self.output_files.is_empty() {
            let _ = writeln!(out, "Files written:");
            for file in &self.output_files {
                let _ = writeln!(out, "  {}", file);
            }
        }
        let _ = write!(out, "Completed in {} ms", s.duration_ms);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::Cleaner;
    use crate::loader::DatasetLoader;
    use crate::quality::QualityMetrics;
    use pretty_assertions::assert_eq;

    fn sample_report(output_files: &[PathBuf]) -> CleaningReport {
        let config = CleaningConfig::default();
        let raw = DatasetLoader::load_embedded().unwrap();
        let before = QualityMetrics::assess(&raw, &config).unwrap();
        let outcome = Cleaner::new(config.clone()).unwrap().clean(raw).unwrap();
        let after = QualityMetrics::assess(&outcome.dataset, &config).unwrap();
        let comparison = QualityComparison::new(before, after);

        ReportGenerator::build_report(ReportParams {
            input_source: DatasetLoader::EMBEDDED_SOURCE,
            outcome: &outcome,
            comparison: &comparison,
            config: &config,
            output_files,
            duration_ms: 12,
        })
    }

    #[test]
    fn test_build_report_summary() {
        let report = sample_report(&[]);
        let s = &report.summary;

        assert_eq!(s.rows_before, 6);
        assert_eq!(s.rows_after, 5);
        assert_eq!(s.rows_removed, 1);
        assert_eq!(s.duplicates_removed, 1);
        assert_eq!(s.invalid_ages_corrected, 2);
        assert_eq!(s.invalid_ratings_corrected, 1);
        assert_eq!(s.dates_normalized, 3);
        assert_eq!(s.rows_with_errors, 0);
        assert_eq!(report.steps.len(), 5);
        assert_eq!(report.category_counts.get("Clothing"), Some(&2));
        assert!(!report.issues_found.is_empty());
    }

    #[test]
    fn test_summary_text() {
        let report = sample_report(&[PathBuf::from("output/cleaned_customer_survey.csv")]);
        let text = report.summary_text();

        assert!(text.contains("Original dataset: 6 rows"));
        assert!(text.contains("Corrected 2 invalid age(s)"));
        assert!(text.contains("Home & Garden"));
        assert!(text.contains("output/cleaned_customer_survey.csv"));
        assert!(!text.contains("could not be cleaned"));
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report(&[]);
        let generator = ReportGenerator::new(dir.path());

        let path = generator.write_report_to_file(&report).unwrap();
        assert!(path.ends_with(REPORT_FILE));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["rows_after"], 5);
        assert_eq!(json["input_source"], DatasetLoader::EMBEDDED_SOURCE);
        assert_eq!(json["steps"][0]["step"], "missing_values");
    }
}
