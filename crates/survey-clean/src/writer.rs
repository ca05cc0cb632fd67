//! CSV output of cleaned datasets.

use crate::error::{CleaningError, Result};
use crate::types::Dataset;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes datasets as CSV with a header row, in canonical column order.
pub struct DatasetWriter;

impl DatasetWriter {
    /// Write `dataset` to `path`, creating parent directories as needed.
    pub fn write_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let write_error = |reason: String| CleaningError::Write {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }

        let mut file = File::create(path).map_err(|e| write_error(e.to_string()))?;
        let mut df = dataset.frame().clone();

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut df)
            .map_err(|e| write_error(e.to_string()))?;

        info!("Cleaned dataset saved: {}", path.display());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DatasetLoader;
    use crate::types::SurveyRecord;

    fn sample() -> Dataset {
        Dataset::from_records(&[SurveyRecord::new(
            1,
            "Smith, John",
            25,
            "john@email.com",
            "2024-01-15",
            5,
            "Electronics",
            Some(299.99),
            "Yes",
            "Great product!",
        )])
        .unwrap()
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = DatasetWriter::write_csv(&sample(), dir.path().join("out.csv")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("customer_id,name,age,email,survey_date,satisfaction_rating,product_category,purchase_amount,would_recommend,comments")
        );
        assert_eq!(
            lines.next(),
            Some("1,\"Smith, John\",25,john@email.com,2024-01-15,5,Electronics,299.99,Yes,Great product!")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_csv_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("out.csv");

        DatasetWriter::write_csv(&sample(), &nested).unwrap();
        assert!(nested.is_file());
    }

    #[test]
    fn test_written_csv_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = sample();
        let path = DatasetWriter::write_csv(&dataset, dir.path().join("out.csv")).unwrap();

        let reloaded = DatasetLoader::load_csv(&path).unwrap();
        assert_eq!(reloaded, dataset);
    }

    #[test]
    fn test_write_csv_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = DatasetWriter::write_csv(&sample(), blocker.join("out.csv")).unwrap_err();
        assert!(matches!(err, CleaningError::Write { .. }));
        assert!(err.is_fatal());
    }
}
