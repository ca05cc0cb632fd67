//! Error types for the survey cleaning pipeline.
//!
//! Load and write failures are fatal and abort a run. Row-level failures
//! ([`CleaningError::RowCleaning`]) are normally logged and the offending row
//! dropped; they only surface as an `Err` when the configuration asks to
//! abort on unparseable values.
//!
//! Errors serialize as `{code, message}` so they can be embedded in the JSON
//! report or printed by the CLI in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// The input could not be read (missing file, unreadable CSV).
    #[error("Failed to load dataset from '{source_name}': {reason}")]
    Load { source_name: String, reason: String },

    /// The input does not match the survey schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A single record could not be normalized.
    #[error("Row {row}, column '{column}': {reason}")]
    RowCleaning {
        row: usize,
        column: String,
        reason: String,
    },

    /// The cleaned dataset could not be written.
    #[error("Failed to write '{path}': {reason}")]
    Write { path: String, reason: String },

    /// A validation chart could not be rendered or saved.
    #[error("Failed to render chart '{chart}': {reason}")]
    ChartRendering { chart: String, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::RowCleaning { .. } => "ROW_CLEANING_ERROR",
            Self::Write { .. } => "WRITE_ERROR",
            Self::ChartRendering { .. } => "CHART_RENDERING_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error aborts a run.
    ///
    /// Only row-level cleaning failures are non-fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::RowCleaning { .. } => false,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => true,
        }
    }

    /// Check if this error happened while loading input.
    pub fn is_load_error(&self) -> bool {
        match self {
            Self::Load { .. } | Self::SchemaMismatch(_) => true,
            Self::WithContext { source, .. } => source.is_load_error(),
            _ => false,
        }
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            CleaningError::SchemaMismatch("age".to_string()).error_code(),
            "SCHEMA_MISMATCH"
        );
        assert_eq!(
            CleaningError::Write {
                path: "out.csv".to_string(),
                reason: "denied".to_string()
            }
            .error_code(),
            "WRITE_ERROR"
        );
    }

    #[test]
    fn test_row_cleaning_is_not_fatal() {
        let error = CleaningError::RowCleaning {
            row: 3,
            column: "survey_date".to_string(),
            reason: "unparseable date 'soon'".to_string(),
        };
        assert!(!error.is_fatal());
        assert!(!error.with_context("During date normalization").is_fatal());
    }

    #[test]
    fn test_load_errors_are_fatal() {
        let error = CleaningError::Load {
            source_name: "missing.csv".to_string(),
            reason: "file not found".to_string(),
        };
        assert!(error.is_fatal());
        assert!(error.is_load_error());
        assert!(CleaningError::SchemaMismatch("x".to_string()).is_load_error());
        assert!(!CleaningError::InvalidConfig("x".to_string()).is_load_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = CleaningError::ColumnNotFound("age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("age"));
    }

    #[test]
    fn test_with_context() {
        let error =
            CleaningError::ColumnNotFound("email".to_string()).with_context("During loading");
        assert!(error.to_string().contains("During loading"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_context_on_polars_result() {
        let result: polars::prelude::PolarsResult<()> = Err(
            polars::error::PolarsError::ColumnNotFound("age".into()),
        );
        let error = result.context("Reading column 'age'").unwrap_err();

        assert_eq!(error.error_code(), "POLARS_ERROR");
        assert!(error.is_fatal());
        assert!(error.to_string().starts_with("Reading column 'age': "));
    }

    #[test]
    fn test_context_keeps_row_error_non_fatal() {
        let result: Result<()> = Err(CleaningError::RowCleaning {
            row: 0,
            column: "survey_date".to_string(),
            reason: "unparseable".to_string(),
        });
        let error = result.context("Normalizing dates").unwrap_err();

        assert_eq!(error.error_code(), "ROW_CLEANING_ERROR");
        assert!(!error.is_fatal());
    }
}
