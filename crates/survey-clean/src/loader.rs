//! Dataset loading.
//!
//! CSV input is read with every column as text and then parsed column by
//! column against the survey schema, so that a value that does not fit its
//! column is reported as a schema mismatch instead of silently becoming null.

use crate::error::{CleaningError, Result, ResultExt};
use crate::types::{ColumnKind, Dataset, SURVEY_COLUMNS, SurveyRecord, column_spec};
use crate::utils::{is_missing_text, parse_integer_string, parse_numeric_string, text_values};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Loads survey datasets from the embedded sample or from CSV files.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Name reported for the embedded sample in logs and reports.
    pub const EMBEDDED_SOURCE: &'static str = "<embedded sample>";

    /// The built-in six-row sample with typical survey export defects.
    pub fn sample_records() -> Vec<SurveyRecord> {
        vec![
            SurveyRecord::new(
                1,
                "John Smith",
                25,
                "john@email.com",
                "2024-01-15",
                5,
                "electronics",
                Some(299.99),
                "Yes",
                "Great product!",
            ),
            SurveyRecord::new(
                2,
                " jane doe ",
                150,
                "JANE@EMAIL.COM",
                "01/16/2024",
                4,
                "CLOTHING",
                Some(89.50),
                "yes",
                "  Good quality  ",
            ),
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
                3,
                "Bob Johnson",
                30,
                "",
                "2024-01-17",
                3,
                "Books",
                Some(25.00),
                "Maybe",
                "",
            ),
            SurveyRecord::new(
                4,
                "Alice Brown",
                -5,
                "alice@email.com",
                "17-01-2024",
                6,
                "home & garden",
                Some(450.00),
                "NO",
                "Poor delivery",
            ),
            SurveyRecord::new(
                5,
                "",
                35,
                "test@email.com",
                "2024/01/18",
                2,
                "Clothing",
                None,
                "Yes",
                "",
            ),
        ]
    }

    /// Build the embedded sample dataset.
    pub fn load_embedded() -> Result<Dataset> {
        let dataset = Dataset::from_records(&Self::sample_records())?;
        info!(
            "Loaded {} with {} rows",
            Self::EMBEDDED_SOURCE,
            dataset.height()
        );
        Ok(dataset)
    }

    /// Load a dataset from a CSV file with a header row.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        if !path.is_file() {
            return Err(CleaningError::Load {
                source_name,
                reason: "file not found".to_string(),
            });
        }

        info!("Loading dataset from: {}", source_name);

        // Schema inference disabled: every column arrives as String.
        let raw = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| CleaningError::Load {
                source_name: source_name.clone(),
                reason: e.to_string(),
            })?;

        debug!("Raw CSV shape: {:?}", raw.shape());
        Self::from_text_frame(&raw)
    }

    /// Parse an all-text frame against the survey schema.
    pub fn from_text_frame(raw: &DataFrame) -> Result<Dataset> {
        let headers: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if let Some(unexpected) = headers.iter().find(|h| column_spec(h).is_none()) {
            return Err(CleaningError::SchemaMismatch(format!(
                "unexpected column '{}'",
                unexpected
            )));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(SURVEY_COLUMNS.len());
        for spec in &SURVEY_COLUMNS {
            let position = headers
                .iter()
                .position(|h| h == spec.name)
                .ok_or_else(|| {
                    CleaningError::SchemaMismatch(format!("missing column '{}'", spec.name))
                })?;
            let raw_name = raw.get_column_names()[position].to_string();
            let values = text_values(raw, &raw_name)
                .context(format!("Reading column '{}'", raw_name))?;

            let series = match spec.kind {
                ColumnKind::Integer => Series::new(
                    spec.name.into(),
                    parse_column(spec.name, &values, parse_integer_string)?,
                ),
                ColumnKind::Float => Series::new(
                    spec.name.into(),
                    parse_column(spec.name, &values, parse_numeric_string)?,
                ),
                ColumnKind::Text | ColumnKind::Date => Series::new(spec.name.into(), values),
            };
            columns.push(series.into());
        }

        let df = DataFrame::new(columns).context("Assembling survey columns")?;
        Dataset::new(df)
    }
}

/// Parse every non-missing cell; a cell that fails to parse is a schema
/// mismatch naming the first offending row.
fn parse_column<T>(
    column: &str,
    values: &[Option<String>],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            if is_missing_text(value.as_deref()) {
                return Ok(None);
            }
            let text = value.as_deref().unwrap_or_default();
            parse(text).map(Some).ok_or_else(|| {
                CleaningError::SchemaMismatch(format!(
                    "column '{}' row {}: '{}' is not a valid number",
                    column, row, text
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AGE, CUSTOMER_ID, NAME, PURCHASE_AMOUNT};
    use crate::utils::{float_values, int_values};
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "customer_id,name,age,email,survey_date,satisfaction_rating,product_category,purchase_amount,would_recommend,comments";

    #[test]
    fn test_load_embedded_sample() {
        let dataset = DatasetLoader::load_embedded().unwrap();
        assert_eq!(dataset.height(), 6);
        assert_eq!(dataset.width(), SURVEY_COLUMNS.len());

        let amounts = float_values(dataset.frame(), PURCHASE_AMOUNT).unwrap();
        assert_eq!(amounts[5], None);
    }

    #[test]
    fn test_load_csv_parses_typed_columns() {
        let file = write_csv(&format!(
            "{HEADER}\n7,Ann Lee,41,ann@x.com,2024-02-01,4,Books,\"$1,250.00\",Yes,fine\n8,Bo,,bo@x.com,2024-02-02,3,Books,,No,\n"
        ));

        let dataset = DatasetLoader::load_csv(file.path()).unwrap();
        assert_eq!(dataset.height(), 2);
        assert_eq!(
            int_values(dataset.frame(), CUSTOMER_ID).unwrap(),
            vec![Some(7), Some(8)]
        );
        assert_eq!(int_values(dataset.frame(), AGE).unwrap(), vec![Some(41), None]);
        assert_eq!(
            float_values(dataset.frame(), PURCHASE_AMOUNT).unwrap(),
            vec![Some(1250.0), None]
        );
    }

    #[test]
    fn test_load_csv_reorders_columns() {
        let file = write_csv(
            "name,customer_id,age,email,survey_date,satisfaction_rating,product_category,purchase_amount,would_recommend,comments\nAnn,7,41,ann@x.com,2024-02-01,4,Books,10,Yes,ok\n",
        );

        let dataset = DatasetLoader::load_csv(file.path()).unwrap();
        let first = dataset.frame().get_column_names()[0].to_string();
        assert_eq!(first, CUSTOMER_ID);
        assert_eq!(
            dataset.records().unwrap()[0].name.as_deref(),
            Some("Ann")
        );
        assert_eq!(dataset.frame().column(NAME).unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = DatasetLoader::load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, CleaningError::Load { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_csv_missing_column() {
        let file = write_csv("customer_id,name\n1,Ann\n");
        let err = DatasetLoader::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, CleaningError::SchemaMismatch(_)));
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_load_csv_unexpected_column() {
        let file = write_csv(&format!(
            "{HEADER},loyalty_tier\n1,Ann,30,a@x.com,2024-01-01,3,Books,1,Yes,ok,gold\n"
        ));
        let err = DatasetLoader::load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("loyalty_tier"));
    }

    #[test]
    fn test_load_csv_non_numeric_age() {
        let file = write_csv(&format!(
            "{HEADER}\n1,Ann,thirty,a@x.com,2024-01-01,3,Books,1,Yes,ok\n"
        ));
        let err = DatasetLoader::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, CleaningError::SchemaMismatch(_)));
        assert!(err.to_string().contains("thirty"));
    }

    #[test]
    fn test_missing_markers_become_null() {
        let file = write_csv(&format!(
            "{HEADER}\n1,Ann,N/A,a@x.com,2024-01-01,3,Books,null,Yes,ok\n"
        ));
        let dataset = DatasetLoader::load_csv(file.path()).unwrap();
        let record = &dataset.records().unwrap()[0];
        assert_eq!(record.age, None);
        assert_eq!(record.purchase_amount, None);
    }
}
