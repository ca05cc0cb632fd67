//! Data quality assessment module.
//!
//! [`QualityMetrics::assess`] counts the defects the cleaner is meant to fix:
//! missing values, duplicate rows, out-of-range numbers, non-canonical dates
//! and inconsistently formatted text. Comparing the metrics of the raw and the
//! cleaned dataset shows what a run achieved.

mod analyzer;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Out-of-range counts for one ranged column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeViolations {
    pub column: String,
    pub below: usize,
    pub above: usize,
}

impl RangeViolations {
    pub fn total(&self) -> usize {
        self.below + self.above
    }
}

/// Quality metrics of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub rows: usize,
    /// Missing (null, blank or marker) cells per column, in schema order.
    pub missing_by_column: Vec<(String, usize)>,
    /// Missing cells in required columns.
    pub missing_required: usize,
    /// Rows that duplicate an earlier row after normalization.
    pub duplicate_rows: usize,
    pub out_of_range: Vec<RangeViolations>,
    /// Dates that are unparseable or not in the canonical format.
    pub non_canonical_dates: usize,
    /// Text values that text standardization would rewrite.
    pub inconsistent_text: usize,
    pub invalid_emails: usize,
    /// Distinct product category spellings with their counts.
    pub category_values: BTreeMap<String, usize>,
}

impl QualityMetrics {
    /// Total missing cells across all columns.
    pub fn missing_total(&self) -> usize {
        self.missing_by_column.iter().map(|(_, n)| n).sum()
    }

    /// Total out-of-range values across all ranged columns.
    pub fn out_of_range_total(&self) -> usize {
        self.out_of_range.iter().map(RangeViolations::total).sum()
    }

    /// Out-of-range counts of one column.
    pub fn violations(&self, column: &str) -> Option<&RangeViolations> {
        self.out_of_range.iter().find(|v| v.column == column)
    }

    /// Number of defects found, comparable before and after cleaning.
    pub fn issue_count(&self) -> usize {
        self.missing_required
            + self.duplicate_rows
            + self.out_of_range_total()
            + self.non_canonical_dates
            + self.inconsistent_text
    }

    /// Quality score in [0, 100]: the share of cells free of defects.
    pub fn quality_score(&self) -> f64 {
        let cells = self.rows * self.missing_by_column.len();
        if cells == 0 {
            return 100.0;
        }
        let score = 100.0 * (1.0 - self.issue_count() as f64 / cells as f64);
        score.clamp(0.0, 100.0)
    }

    /// Human-readable list of the defects found.
    pub fn issues(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        for (column, count) in &self.missing_by_column {
            if *count > 0 {
                issues.push(QualityIssue::new(
                    "missing_values",
                    Some(column.as_str()),
                    *count,
                    format!("{} missing value(s) in '{}'", count, column),
                ));
            }
        }
        if self.duplicate_rows > 0 {
            issues.push(QualityIssue::new(
                "duplicates",
                None,
                self.duplicate_rows,
                format!("{} duplicate row(s)", self.duplicate_rows),
            ));
        }
        for violation in &self.out_of_range {
            if violation.total() > 0 {
                issues.push(QualityIssue::new(
                    "out_of_range",
                    Some(violation.column.as_str()),
                    violation.total(),
                    format!(
                        "{} value(s) out of range in '{}' ({} below, {} above)",
                        violation.total(),
                        violation.column,
                        violation.below,
                        violation.above
                    ),
                ));
            }
        }
        if self.non_canonical_dates > 0 {
            issues.push(QualityIssue::new(
                "date_format",
                Some(crate::types::SURVEY_DATE),
                self.non_canonical_dates,
                format!("{} date(s) not in canonical format", self.non_canonical_dates),
            ));
        }
        if self.inconsistent_text > 0 {
            issues.push(QualityIssue::new(
                "text_format",
                None,
                self.inconsistent_text,
                format!("{} inconsistently formatted text value(s)", self.inconsistent_text),
            ));
        }
        if self.invalid_emails > 0 {
            issues.push(QualityIssue::new(
                "invalid_email",
                Some(crate::types::EMAIL),
                self.invalid_emails,
                format!("{} invalid e-mail address(es)", self.invalid_emails),
            ));
        }

        issues
    }
}

/// One defect category found by the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub issue_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub count: usize,
    pub description: String,
}

impl QualityIssue {
    fn new(issue_type: &str, column: Option<&str>, count: usize, description: String) -> Self {
        Self {
            issue_type: issue_type.to_string(),
            column: column.map(str::to_string),
            count,
            description,
        }
    }
}

/// Quality metrics of the raw and the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityComparison {
    pub before: QualityMetrics,
    pub after: QualityMetrics,
}

impl QualityComparison {
    pub fn new(before: QualityMetrics, after: QualityMetrics) -> Self {
        Self { before, after }
    }

    /// Change of the quality score, in points.
    pub fn score_improvement(&self) -> f64 {
        self.after.quality_score() - self.before.quality_score()
    }

    /// Per-category defect counts `(label, before, after)`, as charted.
    pub fn categories(&self) -> Vec<(&'static str, usize, usize)> {
        vec![
            (
                "Missing Values",
                self.before.missing_required,
                self.after.missing_required,
            ),
            (
                "Duplicates",
                self.before.duplicate_rows,
                self.after.duplicate_rows,
            ),
            (
                "Out-of-Range",
                self.before.out_of_range_total(),
                self.after.out_of_range_total(),
            ),
            (
                "Date Format",
                self.before.non_canonical_dates,
                self.after.non_canonical_dates,
            ),
            (
                "Text Format",
                self.before.inconsistent_text,
                self.after.inconsistent_text,
            ),
        ]
    }
}
