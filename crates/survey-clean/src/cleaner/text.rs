//! Text standardization.

use crate::config::CleaningConfig;
use crate::error::Result;
use crate::types::{
    CleaningStep, ColumnKind, Dataset, SURVEY_COLUMNS, StepOutput, StepReport, TextStyle,
};
use crate::utils::{
    collapse_whitespace, is_boolean_false, is_boolean_true, text_values, title_case,
};
use polars::prelude::*;
use tracing::debug;

/// Rewrite one value according to its column's text style.
///
/// `undecided` is used for yes/no answers that are neither (e.g. `Maybe`).
pub fn standardize_value(style: TextStyle, value: &str, undecided: &str) -> String {
    match style {
        TextStyle::Untouched => value.to_string(),
        TextStyle::Plain => collapse_whitespace(value),
        TextStyle::Title => title_case(&collapse_whitespace(value)),
        TextStyle::Lower => collapse_whitespace(value).to_lowercase(),
        TextStyle::YesNo => {
            if is_boolean_true(value) {
                "Yes".to_string()
            } else if is_boolean_false(value) {
                "No".to_string()
            } else {
                undecided.to_string()
            }
        }
    }
}

pub(crate) fn run(dataset: Dataset, config: &CleaningConfig) -> Result<StepOutput> {
    let mut report = StepReport::new(CleaningStep::Text, dataset.height());
    let mut df = dataset.into_frame();

    let columns = SURVEY_COLUMNS
        .iter()
        .filter(|spec| spec.kind == ColumnKind::Text && spec.style != TextStyle::Untouched);

    for spec in columns {
        let mut changed = 0;
        let values: Vec<Option<String>> = text_values(&df, spec.name)?
            .into_iter()
            .map(|value| {
                value.map(|v| {
                    let standardized =
                        standardize_value(spec.style, &v, &config.undecided_recommendation);
                    if standardized != v {
                        changed += 1;
                    }
                    standardized
                })
            })
            .collect();

        if changed > 0 {
            df.replace(spec.name, Series::new(spec.name.into(), values))?;
            report.values_changed += changed;
            report.actions.push(format!(
                "Standardized {} value(s) in '{}' ({:?})",
                changed, spec.name, spec.style
            ));
            debug!("Standardized {} values in '{}'", changed, spec.name);
        }
    }

    Ok(StepOutput {
        dataset: Dataset::from_conformed(df),
        report,
        row_issues: Vec::new(),
    })
}
