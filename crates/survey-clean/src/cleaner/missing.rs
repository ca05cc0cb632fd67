//! Missing-value handling.
//!
//! Rows that cannot be completed (no `customer_id`, or a missing value in a
//! column whose strategy is `Drop`) are removed first; the remaining gaps are
//! then filled from statistics of the surviving rows.

use crate::config::{CleaningConfig, NumericImputation, TextImputation};
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::types::{
    CUSTOMER_ID, CleaningStep, ColumnKind, Dataset, RowIssue, SURVEY_COLUMNS, StepOutput,
    StepReport, WOULD_RECOMMEND,
};
use crate::utils::{int_values, is_missing_text, numeric_values, text_values};
use tracing::{debug, warn};

/// Fallback for mode imputation when a column has no usable value at all.
const UNSPECIFIED: &str = "Unspecified";

pub(crate) fn run(dataset: Dataset, config: &CleaningConfig) -> Result<StepOutput> {
    let mut report = StepReport::new(CleaningStep::MissingValues, dataset.height());
    let df = dataset.frame();
    let ids = int_values(df, CUSTOMER_ID)?;

    let mut keep = vec![true; dataset.height()];
    let mut row_issues = Vec::new();

    let mut drop_row = |row: usize, column: &str, value: Option<String>, reason: &str| {
        if keep[row] {
            keep[row] = false;
            row_issues.push(RowIssue {
                row,
                customer_id: ids[row],
                column: column.to_string(),
                value,
                reason: reason.to_string(),
            });
        }
    };

    for (row, id) in ids.iter().enumerate() {
        if id.is_none() {
            drop_row(row, CUSTOMER_ID, None, "missing customer identifier");
        }
    }

    for spec in SURVEY_COLUMNS.iter().filter(|s| s.name != CUSTOMER_ID) {
        let drops = match spec.kind {
            ColumnKind::Integer | ColumnKind::Float => {
                config.missing_numeric == NumericImputation::Drop
            }
            ColumnKind::Text | ColumnKind::Date => {
                config.text_imputation(spec.name) == TextImputation::Drop
            }
        };
        if !drops {
            continue;
        }

        if spec.kind.is_numeric() {
            for (row, value) in numeric_values(df, spec.name)?.iter().enumerate() {
                if value.is_none() {
                    drop_row(row, spec.name, None, "missing required value");
                }
            }
        } else {
            for (row, value) in text_values(df, spec.name)?.into_iter().enumerate() {
                if is_missing_text(value.as_deref()) {
                    drop_row(row, spec.name, value, "missing required value");
                }
            }
        }
    }

    for issue in &row_issues {
        warn!("Dropping row: {}", issue.to_error());
    }
    if !row_issues.is_empty() {
        report.actions.push(format!(
            "Dropped {} row(s) with missing required values",
            row_issues.len()
        ));
    }

    let dataset = dataset.filter_rows(&keep)?;
    let mut df = dataset.into_frame();
    let all_kept = vec![true; df.height()];

    for spec in SURVEY_COLUMNS.iter().filter(|s| s.name != CUSTOMER_ID) {
        match spec.kind {
            ColumnKind::Integer | ColumnKind::Float => {
                let values = numeric_values(&df, spec.name)?;
                if values.iter().all(Option::is_some) {
                    continue;
                }
                let range = config.range_for(spec.name);
                let strategy = config.missing_numeric;
                let fill =
                    StatisticalImputer::numeric_fill_value(&values, &all_kept, strategy, range)
                        .unwrap_or_else(|| {
                            let fallback = range.map_or(0.0, |r| r.clamp(0.0));
                            warn!(
                                "No valid values in '{}' to impute from, using {}",
                                spec.name, fallback
                            );
                            fallback
                        });
                let method = format!("{:?}", strategy).to_lowercase();
                report.values_changed += StatisticalImputer::fill_numeric(
                    &mut df,
                    spec.name,
                    fill,
                    &mut report.actions,
                    &method,
                )?;
            }
            ColumnKind::Text | ColumnKind::Date => {
                let (fill, method) = match config.text_imputation(spec.name) {
                    TextImputation::Placeholder(value) => (value, "placeholder"),
                    TextImputation::Mode => {
                        let values = text_values(&df, spec.name)?;
                        let mode = StatisticalImputer::text_mode(&values, &all_kept)
                            .unwrap_or_else(|| {
                                if spec.name == WOULD_RECOMMEND {
                                    config.undecided_recommendation.clone()
                                } else {
                                    UNSPECIFIED.to_string()
                                }
                            });
                        (mode, "mode")
                    }
                    // Already removed above.
                    TextImputation::Drop => continue,
                };
                report.values_changed += StatisticalImputer::fill_text(
                    &mut df,
                    spec.name,
                    &fill,
                    &mut report.actions,
                    method,
                )?;
            }
        }
    }

    report.rows_after = df.height();
    debug!(
        "Missing values: {} filled, {} row(s) dropped",
        report.values_changed,
        report.rows_removed()
    );

    Ok(StepOutput {
        dataset: Dataset::from_conformed(df),
        report,
        row_issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AGE, EMAIL, NAME, PRODUCT_CATEGORY, PURCHASE_AMOUNT, SURVEY_DATE, SurveyRecord,
    };
    use crate::utils::float_values;
    use pretty_assertions::assert_eq;

    fn record(id: i64, name: &str, category: &str, amount: Option<f64>) -> SurveyRecord {
        SurveyRecord::new(
            id,
            name,
            30,
            "a@x.com",
            "2024-01-15",
            4,
            category,
            amount,
            "Yes",
            "",
        )
    }

    #[test]
    fn test_fills_numeric_with_median() {
        let dataset = Dataset::from_records(&[
            record(1, "Ann", "Books", Some(10.0)),
            record(2, "Bo", "Books", None),
            record(3, "Cy", "Books", Some(30.0)),
            record(4, "Di", "Books", Some(20.0)),
        ])
        .unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        let amounts = float_values(output.dataset.frame(), PURCHASE_AMOUNT).unwrap();
        assert_eq!(amounts[1], Some(20.0));
        assert_eq!(output.report.values_changed, 1);
        assert!(output.row_issues.is_empty());
    }

    #[test]
    fn test_fills_text_placeholders_and_mode() {
        let dataset = Dataset::from_records(&[
            record(1, "", "Books", Some(1.0)),
            record(2, "Bo", "N/A", Some(1.0)),
            record(3, "Cy", "Books", Some(1.0)),
        ])
        .unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        let records = output.dataset.records().unwrap();
        assert_eq!(records[0].name.as_deref(), Some("Unknown Customer"));
        assert_eq!(records[1].product_category.as_deref(), Some("Books"));
    }

    #[test]
    fn test_drops_rows_without_identifier_or_date() {
        let mut no_id = record(1, "Ann", "Books", Some(1.0));
        no_id.customer_id = None;
        let mut no_date = record(2, "Bo", "Books", Some(1.0));
        no_date.survey_date = Some("  ".to_string());
        let dataset =
            Dataset::from_records(&[no_id, no_date, record(3, "Cy", "Books", Some(1.0))]).unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        assert_eq!(output.dataset.height(), 1);
        assert_eq!(output.report.rows_removed(), 2);

        let columns: Vec<&str> = output.row_issues.iter().map(|i| i.column.as_str()).collect();
        assert_eq!(columns, vec![CUSTOMER_ID, SURVEY_DATE]);
        assert_eq!(output.row_issues[1].customer_id, Some(2));
    }

    #[test]
    fn test_drop_strategy_for_numeric_columns() {
        let config = CleaningConfig::builder()
            .missing_numeric(NumericImputation::Drop)
            .build()
            .unwrap();
        let dataset = Dataset::from_records(&[
            record(1, "Ann", "Books", None),
            record(2, "Bo", "Books", Some(5.0)),
        ])
        .unwrap();

        let output = run(dataset, &config).unwrap();
        assert_eq!(output.dataset.height(), 1);
        assert_eq!(output.row_issues[0].column, PURCHASE_AMOUNT);
    }

    #[test]
    fn test_imputation_ignores_out_of_range_values() {
        let mut young = record(1, "Ann", "Books", Some(1.0));
        young.age = Some(-5);
        let mut old = record(2, "Bo", "Books", Some(1.0));
        old.age = Some(150);
        let mut missing = record(3, "Cy", "Books", Some(1.0));
        missing.age = None;
        let mut valid = record(4, "Di", "Books", Some(1.0));
        valid.age = Some(40);

        let dataset = Dataset::from_records(&[young, old, missing, valid]).unwrap();
        let output = run(dataset, &CleaningConfig::default()).unwrap();
        let ages = int_values(output.dataset.frame(), AGE).unwrap();
        assert_eq!(ages[2], Some(40));
    }

    #[test]
    fn test_complete_dataset_is_unchanged() {
        let dataset = Dataset::from_records(&[
            record(1, "Ann", "Books", Some(1.0)),
            record(2, "Bo", "Clothing", Some(2.0)),
        ])
        .unwrap();

        let output = run(dataset.clone(), &CleaningConfig::default()).unwrap();
        assert_eq!(output.dataset, dataset);
        assert_eq!(output.report.values_changed, 0);
        assert!(output.report.actions.is_empty());
    }

    #[test]
    fn test_email_marker_gets_placeholder() {
        let mut row = record(1, "Ann", "Books", Some(1.0));
        row.email = Some("null".to_string());
        let dataset = Dataset::from_records(&[row]).unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        let emails = text_values(output.dataset.frame(), EMAIL).unwrap();
        assert_eq!(emails[0].as_deref(), Some("no_email@unknown.com"));
        let names = text_values(output.dataset.frame(), NAME).unwrap();
        assert_eq!(names[0].as_deref(), Some("Ann"));
        let categories = text_values(output.dataset.frame(), PRODUCT_CATEGORY).unwrap();
        assert_eq!(categories[0].as_deref(), Some("Books"));
    }
}
