//! Data cleaning module.
//!
//! The cleaner applies five steps in a fixed order:
//! 1. Missing-value handling
//! 2. Duplicate removal
//! 3. Outlier correction
//! 4. Text standardization
//! 5. Date normalization
//!
//! followed by a final duplicate pass, since rows can collapse onto each
//! other once their text and dates are normalized. Each step consumes a
//! [`Dataset`] and returns a new one together with a [`StepReport`] and the
//! rows it had to drop.

mod dates;
mod duplicates;
mod missing;
mod outliers;
mod text;

pub use dates::{normalize_date, parse_date};
pub use duplicates::{count_duplicates, row_keys};
pub use text::standardize_value;

use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::types::{CleaningOutcome, CleaningStep, Dataset, StepOutput};
use tracing::{debug, info};

/// Applies the cleaning steps to a dataset.
#[derive(Debug, Clone)]
pub struct Cleaner {
    config: CleaningConfig,
}

impl Cleaner {
    /// Create a cleaner, validating the configuration.
    pub fn new(config: CleaningConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Run every step in order.
    pub fn clean(&self, dataset: Dataset) -> Result<CleaningOutcome> {
        self.clean_with(dataset, |_, _| {})
    }

    /// Run every step in order, calling `on_step` with the step and its
    /// index before each one starts.
    pub fn clean_with<F>(&self, dataset: Dataset, mut on_step: F) -> Result<CleaningOutcome>
    where
        F: FnMut(CleaningStep, usize),
    {
        info!("Cleaning {} rows", dataset.height());

        let mut dataset = dataset;
        let mut steps = Vec::with_capacity(CleaningStep::ORDER.len() + 1);
        let mut row_issues = Vec::new();

        for (index, step) in CleaningStep::ORDER.into_iter().enumerate() {
            on_step(step, index);
            let output = self.apply_step(step, dataset)?;
            info!(
                "{}: {} -> {} rows, {} value(s) changed",
                step,
                output.report.rows_before,
                output.report.rows_after,
                output.report.values_changed
            );
            for action in &output.report.actions {
                debug!("  {}", action);
            }
            dataset = output.dataset;
            steps.push(output.report);
            row_issues.extend(output.row_issues);
        }

        let guard = duplicates::run(dataset, &self.config)?;
        dataset = guard.dataset;
        if guard.report.rows_removed() > 0 {
            info!(
                "Final duplicate pass removed {} row(s)",
                guard.report.rows_removed()
            );
            steps.push(guard.report);
        }

        info!("Cleaning complete: {} rows remain", dataset.height());

        Ok(CleaningOutcome {
            dataset,
            steps,
            row_issues,
        })
    }

    /// Run a single step.
    pub fn apply_step(&self, step: CleaningStep, dataset: Dataset) -> Result<StepOutput> {
        match step {
            CleaningStep::MissingValues => missing::run(dataset, &self.config),
            CleaningStep::Duplicates => duplicates::run(dataset, &self.config),
            CleaningStep::Outliers => outliers::run(dataset, &self.config),
            CleaningStep::Text => text::run(dataset, &self.config),
            CleaningStep::Dates => dates::run(dataset, &self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DatasetLoader;
    use crate::types::{SURVEY_DATE, SurveyRecord};
    use pretty_assertions::assert_eq;

    fn clean_sample() -> CleaningOutcome {
        let cleaner = Cleaner::new(CleaningConfig::default()).unwrap();
        cleaner.clean(DatasetLoader::load_embedded().unwrap()).unwrap()
    }

    #[test]
    fn test_clean_embedded_sample() {
        let outcome = clean_sample();
        let records = outcome.dataset.records().unwrap();

        let expected = vec![
            SurveyRecord::new(
                1,
                "John Smith",
                25,
                "john@email.com",
                "2024-01-15",
                5,
                "Electronics",
                Some(299.99),
                "Yes",
                "Great product!",
            ),
            SurveyRecord::new(
                2,
                "Jane Doe",
                30,
                "jane@email.com",
                "2024-01-16",
                4,
                "Clothing",
                Some(89.5),
                "Yes",
                "Good quality",
            ),
            SurveyRecord::new(
                3,
                "Bob Johnson",
                30,
                "no_email@unknown.com",
                "2024-01-17",
                3,
                "Books",
                Some(25.0),
                "No",
                "",
            ),
            SurveyRecord::new(
                4,
                "Alice Brown",
                30,
                "alice@email.com",
                "2024-01-17",
                5,
                "Home & Garden",
                Some(450.0),
                "No",
                "Poor delivery",
            ),
            SurveyRecord::new(
                5,
                "Unknown Customer",
                35,
                "test@email.com",
                "2024-01-18",
                2,
                "Clothing",
                Some(299.99),
                "Yes",
                "",
            ),
        ];
        assert_eq!(records, expected);
        assert!(outcome.row_issues.is_empty());
    }

    #[test]
    fn test_step_reports_in_order() {
        let outcome = clean_sample();
        let order: Vec<CleaningStep> = outcome.steps.iter().map(|s| s.step).collect();
        assert_eq!(order, CleaningStep::ORDER.to_vec());

        let duplicates = outcome.step(CleaningStep::Duplicates).unwrap();
        assert_eq!(duplicates.rows_before, 6);
        assert_eq!(duplicates.rows_after, 5);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cleaner = Cleaner::new(CleaningConfig::default()).unwrap();
        let once = cleaner
            .clean(DatasetLoader::load_embedded().unwrap())
            .unwrap()
            .dataset;
        let twice = cleaner.clean(once.clone()).unwrap().dataset;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_final_pass_removes_rows_collapsed_by_normalization() {
        let a = SurveyRecord::new(
            1,
            "Ann",
            30,
            "a@x.com",
            "2024-01-15",
            4,
            "Books",
            Some(1.0),
            "yes",
            "",
        );
        let mut b = a.clone();
        b.would_recommend = Some("y".to_string());

        let cleaner = Cleaner::new(CleaningConfig::default()).unwrap();
        let outcome = cleaner.clean(Dataset::from_records(&[a, b]).unwrap()).unwrap();
        assert_eq!(outcome.dataset.height(), 1);
        assert_eq!(outcome.steps.len(), CleaningStep::ORDER.len() + 1);
    }

    #[test]
    fn test_clean_with_reports_each_step() {
        let cleaner = Cleaner::new(CleaningConfig::default()).unwrap();
        let mut seen = Vec::new();
        cleaner
            .clean_with(DatasetLoader::load_embedded().unwrap(), |step, index| {
                seen.push((index, step))
            })
            .unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[4], (4, CleaningStep::Dates));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CleaningConfig::default();
        config.date_formats.clear();
        let err = Cleaner::new(config).unwrap_err();
        assert!(matches!(err, CleaningError::InvalidConfig(_)));
    }

    #[test]
    fn test_unparseable_date_is_dropped_not_fatal() {
        let bad = SurveyRecord::new(
            9,
            "Zed",
            40,
            "z@x.com",
            "sometime",
            3,
            "Books",
            Some(5.0),
            "No",
            "",
        );
        let mut records = DatasetLoader::sample_records();
        records.push(bad);

        let cleaner = Cleaner::new(CleaningConfig::default()).unwrap();
        let outcome = cleaner.clean(Dataset::from_records(&records).unwrap()).unwrap();
        assert_eq!(outcome.dataset.height(), 5);
        assert_eq!(outcome.row_issues.len(), 1);
        assert_eq!(outcome.row_issues[0].column, SURVEY_DATE);
    }
}
