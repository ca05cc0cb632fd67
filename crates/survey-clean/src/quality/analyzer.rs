use super::{QualityMetrics, RangeViolations};
use crate::cleaner::{count_duplicates, normalize_date, standardize_value};
use crate::config::CleaningConfig;
use crate::error::Result;
use crate::types::{
    ColumnKind, Dataset, EMAIL, PRODUCT_CATEGORY, SURVEY_COLUMNS, SURVEY_DATE, TextStyle,
};
use crate::utils::{is_missing_text, is_valid_email, numeric_values, text_values};
use std::collections::BTreeMap;
use tracing::debug;

impl QualityMetrics {
    /// Assess a dataset against the cleaning conventions of `config`.
    pub fn assess(dataset: &Dataset, config: &CleaningConfig) -> Result<Self> {
        let df = dataset.frame();

        let mut missing_by_column = Vec::with_capacity(SURVEY_COLUMNS.len());
        let mut missing_required = 0;
        let mut inconsistent_text = 0;

        for spec in &SURVEY_COLUMNS {
            let missing = if spec.kind.is_numeric() {
                numeric_values(df, spec.name)?
                    .iter()
                    .filter(|v| v.is_none())
                    .count()
            } else {
                let values = text_values(df, spec.name)?;
                if spec.kind == ColumnKind::Text && spec.style != TextStyle::Untouched {
                    inconsistent_text += values
                        .iter()
                        .flatten()
                        .filter(|v| !is_missing_text(Some(v.as_str())))
                        .filter(|v| {
                            standardize_value(spec.style, v, &config.undecided_recommendation)
                                != **v
                        })
                        .count();
                }
                values
                    .iter()
                    .filter(|v| is_missing_text(v.as_deref()))
                    .count()
            };

            if spec.required {
                missing_required += missing;
            }
            missing_by_column.push((spec.name.to_string(), missing));
        }

        let mut out_of_range = Vec::with_capacity(config.ranges.len());
        for range in &config.ranges {
            let values = numeric_values(df, &range.column)?;
            let mut violations = RangeViolations {
                column: range.column.clone(),
                below: 0,
                above: 0,
            };
            for value in values.into_iter().flatten() {
                if range.is_below(value) {
                    violations.below += 1;
                } else if !range.contains(value) {
                    violations.above += 1;
                }
            }
            out_of_range.push(violations);
        }

        let non_canonical_dates = text_values(df, SURVEY_DATE)?
            .iter()
            .flatten()
            .filter(|v| !is_missing_text(Some(v.as_str())))
            .filter(|v| normalize_date(v, config).as_deref() != Some(v.as_str()))
            .count();

        let invalid_emails = text_values(df, EMAIL)?
            .iter()
            .flatten()
            .filter(|v| !is_missing_text(Some(v.as_str())) && !is_valid_email(v.trim()))
            .count();

        let mut category_values = BTreeMap::new();
        for value in text_values(df, PRODUCT_CATEGORY)?.into_iter().flatten() {
            if !is_missing_text(Some(value.as_str())) {
                *category_values.entry(value).or_insert(0) += 1;
            }
        }

        let metrics = Self {
            rows: dataset.height(),
            missing_by_column,
            missing_required,
            duplicate_rows: count_duplicates(df, config)?,
            out_of_range,
            non_canonical_dates,
            inconsistent_text,
            invalid_emails,
            category_values,
        };

        debug!(
            "Assessed {} rows: {} issue(s), score {:.1}",
            metrics.rows,
            metrics.issue_count(),
            metrics.quality_score()
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::Cleaner;
    use crate::loader::DatasetLoader;
    use crate::quality::QualityComparison;
    use crate::types::{AGE, COMMENTS, NAME, PURCHASE_AMOUNT, SATISFACTION_RATING};
    use pretty_assertions::assert_eq;

    fn missing(metrics: &QualityMetrics, column: &str) -> usize {
        metrics
            .missing_by_column
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, n)| *n)
            .unwrap()
    }

    #[test]
    fn test_assess_raw_sample() {
        let dataset = DatasetLoader::load_embedded().unwrap();
        let metrics = QualityMetrics::assess(&dataset, &CleaningConfig::default()).unwrap();

        assert_eq!(metrics.rows, 6);
        assert_eq!(missing(&metrics, NAME), 1);
        assert_eq!(missing(&metrics, EMAIL), 1);
        assert_eq!(missing(&metrics, PURCHASE_AMOUNT), 1);
        assert_eq!(missing(&metrics, COMMENTS), 2);
        assert_eq!(metrics.missing_required, 3);
        assert_eq!(metrics.duplicate_rows, 1);

        let ages = metrics.violations(AGE).unwrap();
        assert_eq!((ages.below, ages.above), (1, 1));
        assert_eq!(metrics.violations(SATISFACTION_RATING).unwrap().above, 1);

        assert_eq!(metrics.non_canonical_dates, 3);
        assert_eq!(metrics.invalid_emails, 0);
        assert_eq!(metrics.category_values.len(), 6);
        assert_eq!(metrics.category_values.get("Clothing"), Some(&1));
        assert!(metrics.inconsistent_text > 0);
    }

    #[test]
    fn test_assess_cleaned_sample_has_no_issues() {
        let config = CleaningConfig::default();
        let raw = DatasetLoader::load_embedded().unwrap();
        let before = QualityMetrics::assess(&raw, &config).unwrap();

        let cleaned = Cleaner::new(config.clone()).unwrap().clean(raw).unwrap().dataset;
        let after = QualityMetrics::assess(&cleaned, &config).unwrap();

        assert_eq!(after.issue_count(), 0);
        assert_eq!(after.quality_score(), 100.0);
        assert_eq!(after.category_values.len(), 4);

        let comparison = QualityComparison::new(before, after);
        assert!(comparison.score_improvement() > 0.0);
        assert!(comparison.categories().iter().all(|(_, _, after)| *after == 0));
    }

    #[test]
    fn test_issues_describe_defects() {
        let dataset = DatasetLoader::load_embedded().unwrap();
        let metrics = QualityMetrics::assess(&dataset, &CleaningConfig::default()).unwrap();
        let issues = metrics.issues();

        assert!(issues.iter().any(|i| i.issue_type == "duplicates" && i.count == 1));
        assert!(issues
            .iter()
            .any(|i| i.issue_type == "out_of_range" && i.column.as_deref() == Some(AGE)));
    }

    #[test]
    fn test_empty_dataset_scores_full() {
        let dataset = Dataset::from_records(&[]).unwrap();
        let metrics = QualityMetrics::assess(&dataset, &CleaningConfig::default()).unwrap();
        assert_eq!(metrics.rows, 0);
        assert_eq!(metrics.quality_score(), 100.0);
        assert!(metrics.issues().is_empty());
    }
}
