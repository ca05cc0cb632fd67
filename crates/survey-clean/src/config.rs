//! Configuration types for the cleaning pipeline.
//!
//! Every convention the cleaner relies on (how missing values are filled,
//! which numeric ranges are plausible, which date spellings are accepted) is
//! spelled out here instead of being left to library defaults.

use crate::error::CleaningError;
use crate::types::{
    AGE, COMMENTS, ColumnKind, EMAIL, NAME, PRODUCT_CATEGORY, PURCHASE_AMOUNT,
    SATISFACTION_RATING, SURVEY_DATE, WOULD_RECOMMEND, column_spec,
};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Strategy for filling missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericImputation {
    /// Use the mean of the non-null, in-range values
    Mean,
    /// Use the median of the non-null, in-range values
    #[default]
    Median,
    /// Use zero (moved into the valid range if one is configured)
    Zero,
    /// Drop rows with missing values
    Drop,
}

/// Strategy for filling missing text values in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextImputation {
    /// Fill with a fixed placeholder
    Placeholder(String),
    /// Fill with the most frequent value
    Mode,
    /// Drop rows with missing values
    Drop,
}

/// Strategy for numeric values outside their valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierStrategy {
    /// Clamp to the nearest range bound
    #[default]
    Cap,
    /// Replace with the median of the in-range values
    Median,
    /// Remove rows containing out-of-range values
    Remove,
}

/// What to do with a date that matches none of the accepted formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidDatePolicy {
    /// Log the row error and drop the row
    #[default]
    DropRow,
    /// Fail the whole run
    Abort,
}

/// Plausible range for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub column: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub strategy: OutlierStrategy,
}

impl NumericRange {
    pub fn new(
        column: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
        strategy: OutlierStrategy,
    ) -> Self {
        Self {
            column: column.into(),
            min,
            max,
            strategy,
        }
    }

    /// Whether `value` lies within the (inclusive) bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Clamp `value` into the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }

    /// Whether `value` lies below the lower bound.
    pub fn is_below(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min)
    }
}

/// Date formats accepted by date normalization, tried in order.
///
/// Day-first and month-first slash dates are ambiguous; month-first wins
/// for slashes and day-first for dashes and dots. Slash dates that can only
/// be day-first still parse.
pub const DEFAULT_DATE_FORMATS: [&str; 13] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Canonical output date format.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration for the cleaner.
///
/// Use [`CleaningConfig::builder()`] to create a configuration with a fluent
/// API, or [`CleaningConfig::from_json_file`] to load one. Missing JSON fields
/// take their default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Strategy for missing numeric values (`age`, `satisfaction_rating`,
    /// `purchase_amount`). Rows missing `customer_id` are always dropped.
    /// Default: Median
    pub missing_numeric: NumericImputation,

    /// Per-column strategy for missing text values.
    /// Default: placeholders for `name`/`email`, mode for categorical columns,
    /// empty string for `comments`, drop for `survey_date`.
    pub missing_text: BTreeMap<String, TextImputation>,

    /// Whether to remove duplicate rows.
    /// Default: true
    pub remove_duplicates: bool,

    /// Valid ranges for numeric columns.
    /// Default: age 0-120 (median), rating 1-5 (cap), purchase amount >= 0 (cap)
    pub ranges: Vec<NumericRange>,

    /// Accepted input date formats, tried in order.
    pub date_formats: Vec<String>,

    /// Output date format.
    /// Default: "%Y-%m-%d"
    pub canonical_date_format: String,

    /// Handling of unparseable dates.
    /// Default: DropRow
    pub invalid_dates: InvalidDatePolicy,

    /// Value for `would_recommend` answers that are neither yes nor no.
    /// Default: "No"
    pub undecided_recommendation: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_numeric: NumericImputation::default(),
            missing_text: default_text_imputation(),
            remove_duplicates: true,
            ranges: default_ranges(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            canonical_date_format: CANONICAL_DATE_FORMAT.to_string(),
            invalid_dates: InvalidDatePolicy::default(),
            undecided_recommendation: "No".to_string(),
        }
    }
}

fn default_text_imputation() -> BTreeMap<String, TextImputation> {
    BTreeMap::from([
        (
            NAME.to_string(),
            TextImputation::Placeholder("Unknown Customer".to_string()),
        ),
        (
            EMAIL.to_string(),
            TextImputation::Placeholder("no_email@unknown.com".to_string()),
        ),
        (SURVEY_DATE.to_string(), TextImputation::Drop),
        (PRODUCT_CATEGORY.to_string(), TextImputation::Mode),
        (WOULD_RECOMMEND.to_string(), TextImputation::Mode),
        (COMMENTS.to_string(), TextImputation::Placeholder(String::new())),
    ])
}

fn default_ranges() -> Vec<NumericRange> {
    vec![
        NumericRange::new(AGE, Some(0.0), Some(120.0), OutlierStrategy::Median),
        NumericRange::new(SATISFACTION_RATING, Some(1.0), Some(5.0), OutlierStrategy::Cap),
        NumericRange::new(PURCHASE_AMOUNT, Some(0.0), None, OutlierStrategy::Cap),
    ]
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CleaningError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleaningError::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config: CleaningConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Imputation strategy for a text column.
    ///
    /// Columns without an explicit entry fall back to `Drop` when required
    /// and to an empty placeholder otherwise.
    pub fn text_imputation(&self, column: &str) -> TextImputation {
        if let Some(strategy) = self.missing_text.get(column) {
            return strategy.clone();
        }
        match column_spec(column) {
            Some(spec) if !spec.required => TextImputation::Placeholder(String::new()),
            _ => TextImputation::Drop,
        }
    }

    /// Valid range for a numeric column, if configured.
    pub fn range_for(&self, column: &str) -> Option<&NumericRange> {
        self.ranges.iter().find(|r| r.column == column)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for range in &self.ranges {
            let spec = match column_spec(&range.column) {
                Some(spec) if spec.kind.is_numeric() => spec,
                Some(_) => return Err(ConfigValidationError::NotNumeric(range.column.clone())),
                None => return Err(ConfigValidationError::UnknownColumn(range.column.clone())),
            };
            if spec.kind == ColumnKind::Integer
                && let Some(bound) = [range.min, range.max]
                    .into_iter()
                    .flatten()
                    .find(|b| b.fract() != 0.0)
            {
                return Err(ConfigValidationError::FractionalBound {
                    column: range.column.clone(),
                    bound,
                });
            }
            if let (Some(min), Some(max)) = (range.min, range.max)
                && min > max
            {
                return Err(ConfigValidationError::InvalidRange {
                    column: range.column.clone(),
                    min,
                    max,
                });
            }
            if self.ranges.iter().filter(|r| r.column == range.column).count() > 1 {
                return Err(ConfigValidationError::DuplicateRange(range.column.clone()));
            }
        }

        for (column, strategy) in &self.missing_text {
            let spec = column_spec(column)
                .ok_or_else(|| ConfigValidationError::UnknownColumn(column.clone()))?;
            if !spec.kind.is_textual() {
                return Err(ConfigValidationError::NotText(column.clone()));
            }
            if let TextImputation::Placeholder(value) = strategy
                && spec.required
                && value.trim().is_empty()
            {
                return Err(ConfigValidationError::EmptyPlaceholder(column.clone()));
            }
            if spec.kind == ColumnKind::Date && *strategy == TextImputation::Mode {
                return Err(ConfigValidationError::UnsupportedDateImputation);
            }
        }

        if self.date_formats.is_empty() {
            return Err(ConfigValidationError::NoDateFormats);
        }
        for format in self.date_formats.iter().chain([&self.canonical_date_format]) {
            if !is_valid_date_format(format) {
                return Err(ConfigValidationError::InvalidDateFormat(format.clone()));
            }
        }
        if !self.date_formats.contains(&self.canonical_date_format) {
            return Err(ConfigValidationError::CanonicalFormatNotAccepted(
                self.canonical_date_format.clone(),
            ));
        }

        if self.undecided_recommendation.trim().is_empty() {
            return Err(ConfigValidationError::EmptyUndecidedRecommendation);
        }

        Ok(())
    }
}

fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' is not numeric and cannot have a valid range")]
    NotNumeric(String),

    #[error("Column '{0}' is not a text column")]
    NotText(String),

    #[error("Invalid range for '{column}': min {min} is greater than max {max}")]
    InvalidRange { column: String, min: f64, max: f64 },

    #[error("Bound {bound} of integer column '{column}' must be a whole number")]
    FractionalBound { column: String, bound: f64 },

    #[error("More than one range configured for '{0}'")]
    DuplicateRange(String),

    #[error("Placeholder for required column '{0}' must not be empty")]
    EmptyPlaceholder(String),

    #[error("Mode imputation is not supported for dates")]
    UnsupportedDateImputation,

    #[error("At least one accepted date format is required")]
    NoDateFormats,

    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("Canonical date format '{0}' must also be an accepted input format")]
    CanonicalFormatNotAccepted(String),

    #[error("Undecided recommendation value must not be empty")]
    EmptyUndecidedRecommendation,
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    missing_numeric: Option<NumericImputation>,
    missing_text: BTreeMap<String, TextImputation>,
    remove_duplicates: Option<bool>,
    ranges: Vec<NumericRange>,
    date_formats: Option<Vec<String>>,
    canonical_date_format: Option<String>,
    invalid_dates: Option<InvalidDatePolicy>,
    undecided_recommendation: Option<String>,
}

impl CleaningConfigBuilder {
    /// Set the strategy for missing numeric values.
    pub fn missing_numeric(mut self, strategy: NumericImputation) -> Self {
        self.missing_numeric = Some(strategy);
        self
    }

    /// Override the missing-value strategy of one text column.
    pub fn text_imputation(mut self, column: impl Into<String>, strategy: TextImputation) -> Self {
        self.missing_text.insert(column.into(), strategy);
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Set or replace the valid range of a numeric column.
    pub fn range(mut self, range: NumericRange) -> Self {
        self.ranges.retain(|r| r.column != range.column);
        self.ranges.push(range);
        self
    }

    /// Replace the list of accepted date formats.
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    /// Set the output date format.
    pub fn canonical_date_format(mut self, format: impl Into<String>) -> Self {
        self.canonical_date_format = Some(format.into());
        self
    }

    /// Set the handling of unparseable dates.
    pub fn invalid_dates(mut self, policy: InvalidDatePolicy) -> Self {
        self.invalid_dates = Some(policy);
        self
    }

    /// Set the value undecided recommendation answers are mapped to.
    pub fn undecided_recommendation(mut self, value: impl Into<String>) -> Self {
        self.undecided_recommendation = Some(value.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();

        let mut missing_text = defaults.missing_text;
        missing_text.extend(self.missing_text);

        let mut ranges = defaults.ranges;
        for range in self.ranges {
            ranges.retain(|r| r.column != range.column);
            ranges.push(range);
        }

        let config = CleaningConfig {
            missing_numeric: self.missing_numeric.unwrap_or_default(),
            missing_text,
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            ranges,
            date_formats: self.date_formats.unwrap_or(defaults.date_formats),
            canonical_date_format: self
                .canonical_date_format
                .unwrap_or(defaults.canonical_date_format),
            invalid_dates: self.invalid_dates.unwrap_or_default(),
            undecided_recommendation: self
                .undecided_recommendation
                .unwrap_or(defaults.undecided_recommendation),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Where and what the pipeline writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for the cleaned CSV, charts and report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// File name of the cleaned CSV.
    /// Default: "cleaned_customer_survey.csv"
    pub csv_file_name: String,

    /// Whether to render validation charts.
    /// Default: true
    pub write_charts: bool,

    /// Whether to write the JSON report.
    /// Default: true
    pub write_report: bool,

    /// Whether to write anything at all. When false, results stay in memory.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            csv_file_name: "cleaned_customer_survey.csv".to_string(),
            write_charts: true,
            write_report: true,
            save_to_disk: true,
        }
    }
}

impl OutputConfig {
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn csv_file_name(mut self, name: impl Into<String>) -> Self {
        self.csv_file_name = name.into();
        self
    }

    pub fn write_charts(mut self, write: bool) -> Self {
        self.write_charts = write;
        self
    }

    pub fn write_report(mut self, write: bool) -> Self {
        self.write_report = write;
        self
    }

    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = save;
        self
    }

    /// Full path of the cleaned CSV.
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file_name)
    }
}
