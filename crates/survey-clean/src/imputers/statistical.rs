//! Statistical imputation methods.
//!
//! Provides mean, median, zero, mode and placeholder fills. Central
//! tendencies are computed only over rows that survive the step and, when a
//! valid range is configured, only over in-range values, so an implausible
//! age never drags the fill value with it.

use crate::config::{NumericImputation, NumericRange};
use crate::error::Result;
use crate::utils::{
    float_values, int_values, is_missing_text, mean, median, string_mode, text_values,
};
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Compute the value used to fill missing cells of a numeric column.
    ///
    /// `keep` marks rows that are not about to be dropped. Returns `None`
    /// for [`NumericImputation::Drop`] or when no reference value exists.
    pub fn numeric_fill_value(
        values: &[Option<f64>],
        keep: &[bool],
        strategy: NumericImputation,
        range: Option<&NumericRange>,
    ) -> Option<f64> {
        let reference: Vec<f64> = values
            .iter()
            .zip(keep)
            .filter_map(|(value, &kept)| if kept { *value } else { None })
            .filter(|value| range.is_none_or(|r| r.contains(*value)))
            .collect();

        match strategy {
            NumericImputation::Median => median(&reference),
            NumericImputation::Mean => mean(&reference),
            NumericImputation::Zero => Some(range.map_or(0.0, |r| r.clamp(0.0))),
            NumericImputation::Drop => None,
        }
    }

    /// Fill nulls of a numeric column with `fill_value`.
    ///
    /// Integer columns receive the rounded value. Returns the number of
    /// cells filled.
    pub fn fill_numeric(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        processing_steps: &mut Vec<String>,
        method: &str,
    ) -> Result<usize> {
        let dtype = df.column(col_name)?.dtype().clone();
        let filled = if dtype == DataType::Int64 {
            let values = int_values(df, col_name)?;
            let count = values.iter().filter(|v| v.is_none()).count();
            let rounded = fill_value.round() as i64;
            let result: Vec<Option<i64>> = values
                .into_iter()
                .map(|v| Some(v.unwrap_or(rounded)))
                .collect();
            df.replace(col_name, Series::new(col_name.into(), result))?;
            if count > 0 {
                processing_steps.push(format!(
                    "Filled {} missing value(s) in '{}' with {}: {}",
                    count, col_name, method, rounded
                ));
            }
            count
        } else {
            let values = float_values(df, col_name)?;
            let count = values.iter().filter(|v| v.is_none()).count();
            let result: Vec<Option<f64>> = values
                .into_iter()
                .map(|v| Some(v.unwrap_or(fill_value)))
                .collect();
            df.replace(col_name, Series::new(col_name.into(), result))?;
            if count > 0 {
                processing_steps.push(format!(
                    "Filled {} missing value(s) in '{}' with {}: {:.2}",
                    count, col_name, method, fill_value
                ));
            }
            count
        };

        Ok(filled)
    }

    /// Most frequent value among kept, non-missing cells.
    pub fn text_mode(values: &[Option<String>], keep: &[bool]) -> Option<String> {
        string_mode(
            values
                .iter()
                .zip(keep)
                .filter(|(value, kept)| **kept && !is_missing_text(value.as_deref()))
                .filter_map(|(value, _)| value.as_deref()),
        )
    }

    /// Replace missing cells (null, blank or marker) of a text column.
    ///
    /// Returns the number of cells whose value changed; a blank cell filled
    /// with an empty placeholder is not counted.
    pub fn fill_text(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: &str,
        processing_steps: &mut Vec<String>,
        method: &str,
    ) -> Result<usize> {
        let values = text_values(df, col_name)?;
        let mut count = 0;
        let result: Vec<Option<String>> = values
            .into_iter()
            .map(|value| {
                if is_missing_text(value.as_deref()) {
                    if value.as_deref() != Some(fill_value) {
                        count += 1;
                    }
                    Some(fill_value.to_string())
                } else {
                    value
                }
            })
            .collect();

        df.replace(col_name, Series::new(col_name.into(), result))?;

        if count > 0 {
            processing_steps.push(format!(
                "Filled {} missing value(s) in '{}' with {}: '{}'",
                count, col_name, method, fill_value
            ));
        }
        Ok(count)
    }
}
