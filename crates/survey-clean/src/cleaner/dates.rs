//! Date normalization.
//!
//! Survey exports mix ISO, US, European and spelled-out dates. Each value is
//! tried against the canonical format first, then the configured formats in
//! order, and rewritten in the canonical format; values matching none of them
//! are row errors.

use crate::config::{CleaningConfig, InvalidDatePolicy};
use crate::error::Result;
use crate::types::{
    CUSTOMER_ID, CleaningStep, Dataset, RowIssue, SURVEY_DATE, StepOutput, StepReport,
};
use crate::utils::{int_values, text_values};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, warn};

/// Parse a date using the first matching format.
///
/// Formats that include a time of day are accepted; the time is discarded.
pub fn parse_date<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    formats.iter().find_map(|format| {
        let format = format.as_ref();
        NaiveDate::parse_from_str(value, format)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(value, format)
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}

/// Rewrite a date in the canonical format, if it parses.
///
/// A value already in the canonical format keeps its reading, so normalizing
/// twice gives the same date.
pub fn normalize_date(value: &str, config: &CleaningConfig) -> Option<String> {
    parse_date(value, std::slice::from_ref(&config.canonical_date_format))
        .or_else(|| parse_date(value, &config.date_formats))
        .map(|date| date.format(&config.canonical_date_format).to_string())
}

pub(crate) fn run(dataset: Dataset, config: &CleaningConfig) -> Result<StepOutput> {
    let mut report = StepReport::new(CleaningStep::Dates, dataset.height());
    let df = dataset.frame();
    let ids = int_values(df, CUSTOMER_ID)?;
    let values = text_values(df, SURVEY_DATE)?;

    let mut keep = vec![true; values.len()];
    let mut row_issues = Vec::new();
    let mut normalized: Vec<Option<String>> = Vec::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value.as_deref().and_then(|v| normalize_date(v, config)) {
            Some(canonical) => {
                if value.as_deref() != Some(canonical.as_str()) {
                    report.values_changed += 1;
                }
                normalized.push(Some(canonical));
            }
            None => {
                let issue = RowIssue {
                    row,
                    customer_id: ids[row],
                    column: SURVEY_DATE.to_string(),
                    value: value.clone(),
                    reason: "date matches none of the accepted formats".to_string(),
                };
                if config.invalid_dates == InvalidDatePolicy::Abort {
                    return Err(issue.to_error());
                }
                warn!("Dropping row: {}", issue.to_error());
                row_issues.push(issue);
                keep[row] = false;
                normalized.push(value.clone());
            }
        }
    }

    let mut df = df.clone();
    df.replace(SURVEY_DATE, Series::new(SURVEY_DATE.into(), normalized))?;
    let dataset = Dataset::from_conformed(df).filter_rows(&keep)?;

    if report.values_changed > 0 {
        report.actions.push(format!(
            "Normalized {} date(s) to '{}'",
            report.values_changed, config.canonical_date_format
        ));
    }
    if !row_issues.is_empty() {
        report.actions.push(format!(
            "Dropped {} row(s) with unparseable dates",
            row_issues.len()
        ));
    }
    report.rows_after = dataset.height();
    debug!(
        "Dates: {} normalized, {} row(s) dropped",
        report.values_changed,
        row_issues.len()
    );

    Ok(StepOutput {
        dataset,
        report,
        row_issues,
    })
}
