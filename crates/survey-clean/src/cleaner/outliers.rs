//! Outlier correction for ranged numeric columns.

use crate::config::{CleaningConfig, NumericRange, OutlierStrategy};
use crate::error::{CleaningError, Result};
use crate::types::{CleaningStep, ColumnKind, Dataset, StepOutput, StepReport, column_spec};
use crate::utils::{median, numeric_values};
use polars::prelude::*;
use tracing::debug;

/// Corrected values of one column and the rows whose value must be removed.
struct Correction {
    values: Vec<Option<f64>>,
    below: usize,
    above: usize,
    remove: Vec<usize>,
}

fn correct_column(values: &[Option<f64>], range: &NumericRange, round: bool) -> Correction {
    let valid: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| range.contains(*v))
        .collect();
    let replacement = median(&valid).map(|m| if round { m.round() } else { m });

    let mut correction = Correction {
        values: Vec::with_capacity(values.len()),
        below: 0,
        above: 0,
        remove: Vec::new(),
    };

    for (row, value) in values.iter().enumerate() {
        let corrected = match *value {
            Some(v) if !range.contains(v) => {
                if range.is_below(v) {
                    correction.below += 1;
                } else {
                    correction.above += 1;
                }
                match range.strategy {
                    OutlierStrategy::Cap => Some(range.clamp(v)),
                    // Falls back to clamping when there is no in-range value.
                    OutlierStrategy::Median => Some(replacement.unwrap_or_else(|| range.clamp(v))),
                    OutlierStrategy::Remove => {
                        correction.remove.push(row);
                        Some(v)
                    }
                }
            }
            other => other,
        };
        correction.values.push(corrected);
    }

    correction
}

pub(crate) fn run(dataset: Dataset, config: &CleaningConfig) -> Result<StepOutput> {
    let mut report = StepReport::new(CleaningStep::Outliers, dataset.height());
    let mut df = dataset.into_frame();
    let mut keep = vec![true; df.height()];

    for range in &config.ranges {
        let spec = column_spec(&range.column)
            .ok_or_else(|| CleaningError::ColumnNotFound(range.column.clone()))?;
        let values = numeric_values(&df, spec.name)?;
        let is_integer = spec.kind == ColumnKind::Integer;
        let correction = correct_column(&values, range, is_integer);

        let flagged = correction.below + correction.above;
        if flagged == 0 {
            continue;
        }

        for &row in &correction.remove {
            keep[row] = false;
        }

        let series = if is_integer {
            let ints: Vec<Option<i64>> = correction
                .values
                .iter()
                .map(|v| v.map(|v| v.round() as i64))
                .collect();
            Series::new(spec.name.into(), ints)
        } else {
            Series::new(spec.name.into(), correction.values)
        };
        df.replace(spec.name, series)?;

        let action = match range.strategy {
            OutlierStrategy::Cap => "capped to range",
            OutlierStrategy::Median => "replaced with median",
            OutlierStrategy::Remove => "removed",
        };
        if range.strategy != OutlierStrategy::Remove {
            report.values_changed += flagged;
        }
        report.actions.push(format!(
            "'{}': {} value(s) outside [{}, {}] {} ({} below, {} above)",
            spec.name,
            flagged,
            range.min.map_or("-inf".to_string(), |v| v.to_string()),
            range.max.map_or("inf".to_string(), |v| v.to_string()),
            action,
            correction.below,
            correction.above
        ));
        debug!("Outliers in '{}': {} {}", spec.name, flagged, action);
    }

    let dataset = Dataset::from_conformed(df).filter_rows(&keep)?;
    report.rows_after = dataset.height();

    Ok(StepOutput {
        dataset,
        report,
        row_issues: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AGE, PURCHASE_AMOUNT, SATISFACTION_RATING, SurveyRecord};
    use crate::utils::{float_values, int_values};
    use pretty_assertions::assert_eq;

    fn record(id: i64, age: i64, rating: i64, amount: f64) -> SurveyRecord {
        SurveyRecord::new(
            id,
            "Ann",
            age,
            "a@x.com",
            "2024-01-15",
            rating,
            "Books",
            Some(amount),
            "Yes",
            "",
        )
    }

    #[test]
    fn test_age_outliers_replaced_with_median() {
        let dataset = Dataset::from_records(&[
            record(1, 25, 5, 10.0),
            record(2, 150, 4, 10.0),
            record(3, 30, 3, 10.0),
            record(4, -5, 4, 10.0),
            record(5, 35, 2, 10.0),
        ])
        .unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        let ages = int_values(output.dataset.frame(), AGE).unwrap();
        assert_eq!(ages, vec![Some(25), Some(30), Some(30), Some(30), Some(35)]);
        assert_eq!(output.report.values_changed, 2);
        assert!(output.report.actions[0].contains("1 below, 1 above"));
    }

    #[test]
    fn test_rating_and_amount_are_capped() {
        let dataset = Dataset::from_records(&[
            record(1, 25, 6, -3.0),
            record(2, 25, 0, 10.0),
        ])
        .unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        assert_eq!(
            int_values(output.dataset.frame(), SATISFACTION_RATING).unwrap(),
            vec![Some(5), Some(1)]
        );
        assert_eq!(
            float_values(output.dataset.frame(), PURCHASE_AMOUNT).unwrap(),
            vec![Some(0.0), Some(10.0)]
        );
    }

    #[test]
    fn test_remove_strategy_drops_rows() {
        let config = CleaningConfig::builder()
            .range(NumericRange::new(AGE, Some(0.0), Some(120.0), OutlierStrategy::Remove))
            .build()
            .unwrap();
        let dataset =
            Dataset::from_records(&[record(1, 25, 5, 1.0), record(2, -5, 5, 1.0)]).unwrap();

        let output = run(dataset, &config).unwrap();
        assert_eq!(output.dataset.height(), 1);
        assert_eq!(output.report.rows_removed(), 1);
        assert_eq!(output.report.values_changed, 0);
    }

    #[test]
    fn test_median_without_valid_values_falls_back_to_clamp() {
        let dataset =
            Dataset::from_records(&[record(1, -5, 5, 1.0), record(2, 200, 5, 1.0)]).unwrap();

        let output = run(dataset, &CleaningConfig::default()).unwrap();
        assert_eq!(
            int_values(output.dataset.frame(), AGE).unwrap(),
            vec![Some(0), Some(120)]
        );
    }

    #[test]
    fn test_in_range_dataset_is_unchanged() {
        let dataset =
            Dataset::from_records(&[record(1, 25, 5, 1.0), record(2, 40, 1, 0.0)]).unwrap();

        let output = run(dataset.clone(), &CleaningConfig::default()).unwrap();
        assert_eq!(output.dataset, dataset);
        assert!(output.report.actions.is_empty());
    }
}
