//! Survey schema, records, and the in-memory [`Dataset`].
//!
//! A [`Dataset`] is a polars `DataFrame` that is guaranteed to carry exactly
//! the columns of [`SURVEY_COLUMNS`], in that order, with their canonical
//! dtypes. Every cleaning step takes a `Dataset` by value and returns a new
//! one, so the schema invariant holds between steps.

use crate::error::{CleaningError, Result};
use crate::utils::{float_values, int_values, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CUSTOMER_ID: &str = "customer_id";
pub const NAME: &str = "name";
pub const AGE: &str = "age";
pub const EMAIL: &str = "email";
pub const SURVEY_DATE: &str = "survey_date";
pub const SATISFACTION_RATING: &str = "satisfaction_rating";
pub const PRODUCT_CATEGORY: &str = "product_category";
pub const PURCHASE_AMOUNT: &str = "purchase_amount";
pub const WOULD_RECOMMEND: &str = "would_recommend";
pub const COMMENTS: &str = "comments";

/// Storage kind of a survey column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    /// Free-form date text; normalized to the canonical format by the cleaner.
    Date,
}

impl ColumnKind {
    /// Polars dtype used to store this kind.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Text | Self::Date => DataType::String,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Date)
    }
}

/// How the text standardization step rewrites a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    /// Not touched by text standardization.
    Untouched,
    /// Trim and collapse whitespace only.
    Plain,
    /// Trim, collapse whitespace, then title case.
    Title,
    /// Trim, then lower case.
    Lower,
    /// Map boolean-like answers onto `Yes` / `No`.
    YesNo,
}

/// Static description of one survey column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Required columns must be non-empty in cleaned output.
    pub required: bool,
    pub style: TextStyle,
}

const fn column(
    name: &'static str,
    kind: ColumnKind,
    required: bool,
    style: TextStyle,
) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required,
        style,
    }
}

/// The fixed survey schema in canonical column order.
pub const SURVEY_COLUMNS: [ColumnSpec; 10] = [
    column(CUSTOMER_ID, ColumnKind::Integer, true, TextStyle::Untouched),
    column(NAME, ColumnKind::Text, true, TextStyle::Title),
    column(AGE, ColumnKind::Integer, true, TextStyle::Untouched),
    column(EMAIL, ColumnKind::Text, true, TextStyle::Lower),
    column(SURVEY_DATE, ColumnKind::Date, true, TextStyle::Untouched),
    column(SATISFACTION_RATING, ColumnKind::Integer, true, TextStyle::Untouched),
    column(PRODUCT_CATEGORY, ColumnKind::Text, true, TextStyle::Title),
    column(PURCHASE_AMOUNT, ColumnKind::Float, true, TextStyle::Untouched),
    column(WOULD_RECOMMEND, ColumnKind::Text, true, TextStyle::YesNo),
    column(COMMENTS, ColumnKind::Text, false, TextStyle::Plain),
];

/// Look up a column of the survey schema by name.
pub fn column_spec(name: &str) -> Option<&'static ColumnSpec> {
    SURVEY_COLUMNS.iter().find(|spec| spec.name == name)
}

/// Column names in canonical order.
pub fn column_names() -> impl Iterator<Item = &'static str> {
    SURVEY_COLUMNS.iter().map(|spec| spec.name)
}

/// One survey response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub customer_id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub survey_date: Option<String>,
    pub satisfaction_rating: Option<i64>,
    pub product_category: Option<String>,
    pub purchase_amount: Option<f64>,
    pub would_recommend: Option<String>,
    pub comments: Option<String>,
}

impl SurveyRecord {
    /// Convenience constructor for fully populated rows.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: i64,
        name: &str,
        age: i64,
        email: &str,
        survey_date: &str,
        satisfaction_rating: i64,
        product_category: &str,
        purchase_amount: Option<f64>,
        would_recommend: &str,
        comments: &str,
    ) -> Self {
        Self {
            customer_id: Some(customer_id),
            name: Some(name.to_string()),
            age: Some(age),
            email: Some(email.to_string()),
            survey_date: Some(survey_date.to_string()),
            satisfaction_rating: Some(satisfaction_rating),
            product_category: Some(product_category.to_string()),
            purchase_amount,
            would_recommend: Some(would_recommend.to_string()),
            comments: Some(comments.to_string()),
        }
    }
}

/// An ordered table of survey records sharing the fixed schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    /// Wrap a DataFrame, conforming it to the survey schema.
    ///
    /// Columns are reordered to canonical order and cast to their canonical
    /// dtypes. Missing or unexpected columns, and values that cannot be cast,
    /// yield [`CleaningError::SchemaMismatch`].
    pub fn new(df: DataFrame) -> Result<Self> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<&str> = column_names()
            .filter(|name| !present.iter().any(|p| p.as_str() == *name))
            .collect();
        if !missing.is_empty() {
            return Err(CleaningError::SchemaMismatch(format!(
                "missing columns: {}",
                missing.join(", ")
            )));
        }

        let unexpected: Vec<&String> = present
            .iter()
            .filter(|p| column_spec(p).is_none())
            .collect();
        if !unexpected.is_empty() {
            return Err(CleaningError::SchemaMismatch(format!(
                "unexpected columns: {:?}",
                unexpected
            )));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(SURVEY_COLUMNS.len());
        for spec in &SURVEY_COLUMNS {
            let series = df.column(spec.name)?.as_materialized_series();
            let target = spec.kind.dtype();
            let conformed = if series.dtype() == &target {
                series.clone()
            } else {
                series.strict_cast(&target).map_err(|e| {
                    CleaningError::SchemaMismatch(format!(
                        "column '{}' cannot be stored as {}: {}",
                        spec.name, target, e
                    ))
                })?
            };
            columns.push(conformed.into());
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    /// Build a dataset from records.
    pub fn from_records(records: &[SurveyRecord]) -> Result<Self> {
        let ids: Vec<Option<i64>> = records.iter().map(|r| r.customer_id).collect();
        let names: Vec<Option<String>> = records.iter().map(|r| r.name.clone()).collect();
        let ages: Vec<Option<i64>> = records.iter().map(|r| r.age).collect();
        let emails: Vec<Option<String>> = records.iter().map(|r| r.email.clone()).collect();
        let dates: Vec<Option<String>> = records.iter().map(|r| r.survey_date.clone()).collect();
        let ratings: Vec<Option<i64>> = records.iter().map(|r| r.satisfaction_rating).collect();
        let categories: Vec<Option<String>> = records
            .iter()
            .map(|r| r.product_category.clone())
            .collect();
        let amounts: Vec<Option<f64>> = records.iter().map(|r| r.purchase_amount).collect();
        let recommends: Vec<Option<String>> = records
            .iter()
            .map(|r| r.would_recommend.clone())
            .collect();
        let comments: Vec<Option<String>> = records.iter().map(|r| r.comments.clone()).collect();

        let columns: Vec<Column> = vec![
            Series::new(CUSTOMER_ID.into(), ids).into(),
            Series::new(NAME.into(), names).into(),
            Series::new(AGE.into(), ages).into(),
            Series::new(EMAIL.into(), emails).into(),
            Series::new(SURVEY_DATE.into(), dates).into(),
            Series::new(SATISFACTION_RATING.into(), ratings).into(),
            Series::new(PRODUCT_CATEGORY.into(), categories).into(),
            Series::new(PURCHASE_AMOUNT.into(), amounts).into(),
            Series::new(WOULD_RECOMMEND.into(), recommends).into(),
            Series::new(COMMENTS.into(), comments).into(),
        ];

        Self::new(DataFrame::new(columns)?)
    }

    /// Wrap a frame produced by a cleaning step that kept the schema intact.
    pub(crate) fn from_conformed(df: DataFrame) -> Self {
        debug_assert_eq!(df.width(), SURVEY_COLUMNS.len());
        Self { df }
    }

    /// Materialize the rows as records.
    pub fn records(&self) -> Result<Vec<SurveyRecord>> {
        let df = &self.df;
        let ids = int_values(df, CUSTOMER_ID)?;
        let names = text_values(df, NAME)?;
        let ages = int_values(df, AGE)?;
        let emails = text_values(df, EMAIL)?;
        let dates = text_values(df, SURVEY_DATE)?;
        let ratings = int_values(df, SATISFACTION_RATING)?;
        let categories = text_values(df, PRODUCT_CATEGORY)?;
        let amounts = float_values(df, PURCHASE_AMOUNT)?;
        let recommends = text_values(df, WOULD_RECOMMEND)?;
        let comments = text_values(df, COMMENTS)?;

        Ok((0..df.height())
            .map(|i| SurveyRecord {
                customer_id: ids[i],
                name: names[i].clone(),
                age: ages[i],
                email: emails[i].clone(),
                survey_date: dates[i].clone(),
                satisfaction_rating: ratings[i],
                product_category: categories[i].clone(),
                purchase_amount: amounts[i],
                would_recommend: recommends[i].clone(),
                comments: comments[i].clone(),
            })
            .collect())
    }

    /// Borrow the underlying frame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    /// Number of records.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns (always the schema width).
    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Keep only the rows whose mask entry is `true`.
    pub(crate) fn filter_rows(&self, keep: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice("keep".into(), keep);
        Ok(Self::from_conformed(self.df.filter(&mask)?))
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.df.equals_missing(&other.df)
    }
}

/// The five cleaning steps in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStep {
    MissingValues,
    Duplicates,
    Outliers,
    Text,
    Dates,
}

impl CleaningStep {
    /// Execution order used by the cleaner.
    pub const ORDER: [CleaningStep; 5] = [
        Self::MissingValues,
        Self::Duplicates,
        Self::Outliers,
        Self::Text,
        Self::Dates,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MissingValues => "Handling Missing Values",
            Self::Duplicates => "Removing Duplicates",
            Self::Outliers => "Correcting Outliers",
            Self::Text => "Standardizing Text",
            Self::Dates => "Normalizing Dates",
        }
    }
}

impl fmt::Display for CleaningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a single cleaning step did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: CleaningStep,
    pub rows_before: usize,
    pub rows_after: usize,
    /// Number of individual cell values rewritten.
    pub values_changed: usize,
    /// Human-readable log of actions taken.
    pub actions: Vec<String>,
}

impl StepReport {
    pub fn new(step: CleaningStep, rows_before: usize) -> Self {
        Self {
            step,
            rows_before,
            rows_after: rows_before,
            values_changed: 0,
            actions: Vec::new(),
        }
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// A record that could not be cleaned and was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    /// Zero-based row position within the step's input.
    pub row: usize,
    pub customer_id: Option<i64>,
    pub column: String,
    pub value: Option<String>,
    pub reason: String,
}

impl RowIssue {
    /// The issue as a [`CleaningError::RowCleaning`], for logging or aborting.
    pub fn to_error(&self) -> CleaningError {
        let reason = match &self.value {
            Some(value) => format!("{} ('{}')", self.reason, value),
            None => self.reason.clone(),
        };
        CleaningError::RowCleaning {
            row: self.row,
            column: self.column.clone(),
            reason,
        }
    }
}

/// Output of one cleaning step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub dataset: Dataset,
    pub report: StepReport,
    pub row_issues: Vec<RowIssue>,
}

/// Output of the full cleaning sequence.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub dataset: Dataset,
    pub steps: Vec<StepReport>,
    pub row_issues: Vec<RowIssue>,
}

impl CleaningOutcome {
    /// Report of a given step, if it ran.
    pub fn step(&self, step: CleaningStep) -> Option<&StepReport> {
        self.steps.iter().find(|r| r.step == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(id: i64) -> SurveyRecord {
        SurveyRecord::new(
            id,
            "John Smith",
            25,
            "john@email.com",
            "2024-01-15",
            5,
            "Electronics",
            Some(299.99),
            "Yes",
            "Great product!",
        )
    }

    #[test]
    fn test_from_records_round_trip() {
        let records = vec![sample_record(1), sample_record(2)];
        let dataset = Dataset::from_records(&records).unwrap();

        assert_eq!(dataset.height(), 2);
        assert_eq!(dataset.width(), SURVEY_COLUMNS.len());
        assert_eq!(dataset.records().unwrap(), records);
    }

    #[test]
    fn test_new_reorders_and_casts_columns() {
        let df = df![
            "comments" => ["ok"],
            "would_recommend" => ["Yes"],
            "purchase_amount" => [10i32],
            "product_category" => ["Books"],
            "satisfaction_rating" => [4i32],
            "survey_date" => ["2024-01-15"],
            "email" => ["a@b.com"],
            "age" => [30i32],
            "name" => ["Ann"],
            "customer_id" => [7i32],
        ]
        .unwrap();

        let dataset = Dataset::new(df).unwrap();
        let names: Vec<String> = dataset
            .frame()
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let expected: Vec<String> = column_names().map(String::from).collect();
        assert_eq!(names, expected);
        assert_eq!(
            dataset.frame().column(PURCHASE_AMOUNT).unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(dataset.records().unwrap()[0].customer_id, Some(7));
    }

    #[test]
    fn test_new_rejects_missing_columns() {
        let df = df!["customer_id" => [1i64], "name" => ["Ann"]].unwrap();
        let err = Dataset::new(df).unwrap_err();
        assert!(matches!(err, CleaningError::SchemaMismatch(_)));
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_new_rejects_unexpected_columns() {
        let dataset = Dataset::from_records(&[sample_record(1)]).unwrap();
        let mut df = dataset.into_frame();
        df.with_column(Series::new("loyalty_tier".into(), ["gold"]))
            .unwrap();

        let err = Dataset::new(df).unwrap_err();
        assert!(err.to_string().contains("loyalty_tier"));
    }

    #[test]
    fn test_new_rejects_uncastable_values() {
        let dataset = Dataset::from_records(&[sample_record(1)]).unwrap();
        let mut df = dataset.into_frame();
        df.replace(AGE, Series::new(AGE.into(), ["thirty"])).unwrap();

        let err = Dataset::new(df).unwrap_err();
        assert!(matches!(err, CleaningError::SchemaMismatch(_)));
    }

    #[test]
    fn test_dataset_equality_treats_nulls_as_equal() {
        let mut record = sample_record(1);
        record.purchase_amount = None;
        let a = Dataset::from_records(&[record.clone()]).unwrap();
        let b = Dataset::from_records(&[record]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_row_issue_to_error() {
        let issue = RowIssue {
            row: 2,
            customer_id: Some(9),
            column: SURVEY_DATE.to_string(),
            value: Some("soon".to_string()),
            reason: "unparseable date".to_string(),
        };
        let err = issue.to_error();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_step_order() {
        assert_eq!(CleaningStep::ORDER[0], CleaningStep::MissingValues);
        assert_eq!(CleaningStep::ORDER[4], CleaningStep::Dates);
    }
}
