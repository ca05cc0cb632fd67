//! Duplicate row removal.
//!
//! Two rows are duplicates when their normalized keys match: text compared
//! after trimming, whitespace collapsing and case folding, dates after
//! re-parsing to the canonical format, numbers as stored. The first
//! occurrence is kept.

use super::dates::normalize_date;
use crate::config::CleaningConfig;
use crate::error::Result;
use crate::types::{CleaningStep, ColumnKind, Dataset, SURVEY_COLUMNS, StepOutput, StepReport};
use crate::utils::{comparison_key, float_values, int_values, is_missing_text, text_values};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

const FIELD_SEPARATOR: char = '\u{1f}';
const NULL_FIELD: &str = "\u{0}";

/// Normalized comparison key of every row.
pub fn row_keys(df: &DataFrame, config: &CleaningConfig) -> Result<Vec<String>> {
    let mut keys = vec![String::new(); df.height()];

    for (index, spec) in SURVEY_COLUMNS.iter().enumerate() {
        let fields: Vec<String> = match spec.kind {
            ColumnKind::Integer => int_values(df, spec.name)?
                .into_iter()
                .map(|v| v.map_or_else(|| NULL_FIELD.to_string(), |v| v.to_string()))
                .collect(),
            ColumnKind::Float => float_values(df, spec.name)?
                .into_iter()
                .map(|v| v.map_or_else(|| NULL_FIELD.to_string(), |v| v.to_string()))
                .collect(),
            ColumnKind::Text => text_values(df, spec.name)?
                .into_iter()
                .map(|v| text_field(v.as_deref()))
                .collect(),
            ColumnKind::Date => text_values(df, spec.name)?
                .into_iter()
                .map(|v| match v.as_deref().and_then(|v| normalize_date(v, config)) {
                    Some(date) => date,
                    None => text_field(v.as_deref()),
                })
                .collect(),
        };

        for (key, field) in keys.iter_mut().zip(fields) {
            if index > 0 {
                key.push(FIELD_SEPARATOR);
            }
            key.push_str(&field);
        }
    }

    Ok(keys)
}

fn text_field(value: Option<&str>) -> String {
    if is_missing_text(value) {
        NULL_FIELD.to_string()
    } else {
        comparison_key(value.unwrap_or_default())
    }
}

/// Mask that keeps the first occurrence of every key.
pub fn first_occurrences(keys: &[String]) -> Vec<bool> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter().map(|key| seen.insert(key.as_str())).collect()
}

/// Number of rows that duplicate an earlier row.
pub fn count_duplicates(df: &DataFrame, config: &CleaningConfig) -> Result<usize> {
    let keys = row_keys(df, config)?;
    Ok(first_occurrences(&keys).iter().filter(|keep| !**keep).count())
}

pub(crate) fn run(dataset: Dataset, config: &CleaningConfig) -> Result<StepOutput> {
    let mut report = StepReport::new(CleaningStep::Duplicates, dataset.height());

    if !config.remove_duplicates {
        report
            .actions
            .push("Duplicate removal disabled".to_string());
        return Ok(StepOutput {
            dataset,
            report,
            row_issues: Vec::new(),
        });
    }

    let keys = row_keys(dataset.frame(), config)?;
    let keep = first_occurrences(&keys);
    let dataset = dataset.filter_rows(&keep)?;
    report.rows_after = dataset.height();

    let removed = report.rows_removed();
    if removed > 0 {
        let pct = (removed as f64 / report.rows_before as f64) * 100.0;
        report.actions.push(format!(
            "Removed {} duplicate row(s) ({:.1}%)",
            removed, pct
        ));
        debug!("Removed {} duplicate rows", removed);
    } else {
        debug!("No duplicate rows found");
    }

    Ok(StepOutput {
        dataset,
        report,
        row_issues: Vec::new(),
    })
}
