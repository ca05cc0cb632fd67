//! Shared utilities for the cleaning pipeline.
//!
//! Column extraction helpers, string normalization primitives and small
//! statistics used by several cleaning steps and by the quality analyzer.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)*\.[A-Za-z]{2,}$").expect("Invalid regex: email")
});

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a String column into owned values.
pub fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read an Int64 column.
pub fn int_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.i64()?.into_iter().collect())
}

/// Read a Float64 column.
pub fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    Ok(series.f64()?.into_iter().collect())
}

/// Read any numeric column as f64 values.
pub fn numeric_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

// =============================================================================
// Missing Value Markers
// =============================================================================

/// Common error/missing value markers in survey exports.
pub const ERROR_MARKERS: [&str; 11] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "nan", "#n/a", "-", "?",
];

/// Check if a string is an error/missing value marker.
///
/// # Example
///
/// ```rust
/// use survey_clean::utils::is_error_marker;
///
/// assert!(is_error_marker("N/A"));
/// assert!(!is_error_marker("42"));
/// ```
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Whether a text cell counts as missing (null, blank, or a marker).
pub fn is_missing_text(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v.trim().is_empty() || is_error_marker(v),
    }
}

// =============================================================================
// Numeric Parsing
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a float, tolerating currency and separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Try to parse a string as an integer; `"25.0"` is accepted, `"25.5"` is not.
pub fn parse_integer_string(s: &str) -> Option<i64> {
    let cleaned = clean_numeric_string(s);
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    parse_numeric_string(s)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

// =============================================================================
// Text Normalization
// =============================================================================

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Title-case a string: the first letter of every alphabetic run is upper
/// case, the rest lower case (`"o'neil"` → `"O'Neil"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(ch);
            prev_is_alpha = false;
        }
    }
    out
}

/// Case- and whitespace-insensitive comparison key for a text value.
pub fn comparison_key(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

/// Whether a value looks like an e-mail address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_PATTERN.is_match(s)
}

// =============================================================================
// Boolean Detection
// =============================================================================

/// Common boolean true representations.
pub const BOOLEAN_TRUE_VALUES: [&str; 8] =
    ["true", "yes", "1", "t", "y", "on", "yeah", "yep"];

/// Common boolean false representations.
pub const BOOLEAN_FALSE_VALUES: [&str; 8] =
    ["false", "no", "0", "f", "n", "off", "nope", "never"];

/// Check if a string represents a boolean true value.
pub fn is_boolean_true(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    BOOLEAN_TRUE_VALUES.iter().any(|&v| v == lower)
}

/// Check if a string represents a boolean false value.
pub fn is_boolean_false(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    BOOLEAN_FALSE_VALUES.iter().any(|&v| v == lower)
}

// =============================================================================
// Statistics
// =============================================================================

/// Median of a slice; `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Series::new(PlSmallStr::EMPTY, values).median()
}

/// Arithmetic mean of a slice; `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Series::new(PlSmallStr::EMPTY, values).mean()
}

/// Most frequent value, grouping spellings by [`comparison_key`].
///
/// Ties go to the group seen first; the returned value is the first spelling
/// of the winning group.
pub fn string_mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<String, (usize, usize, &'a str)> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        let entry = counts
            .entry(comparison_key(value))
            .or_insert((0, position, value));
        entry.0 += 1;
    }

    counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, value)| value.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("ERROR"));
        assert!(is_error_marker("N/A"));
        assert!(is_error_marker("  MISSING  "));
        assert!(!is_error_marker("42"));
        assert!(!is_error_marker("hello"));
    }

    #[test]
    fn test_is_missing_text() {
        assert!(is_missing_text(None));
        assert!(is_missing_text(Some("")));
        assert!(is_missing_text(Some("   ")));
        assert!(is_missing_text(Some("null")));
        assert!(!is_missing_text(Some("Bob")));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("hello"), None);
    }

    #[test]
    fn test_parse_integer_string() {
        assert_eq!(parse_integer_string("25"), Some(25));
        assert_eq!(parse_integer_string(" -5 "), Some(-5));
        assert_eq!(parse_integer_string("30.0"), Some(30));
        assert_eq!(parse_integer_string("30.5"), None);
        assert_eq!(parse_integer_string("thirty"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Good   quality  "), "Good quality");
        assert_eq!(collapse_whitespace("\tjane\n doe "), "jane doe");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("jane doe"), "Jane Doe");
        assert_eq!(title_case("CLOTHING"), "Clothing");
        assert_eq!(title_case("home & garden"), "Home & Garden");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case(&title_case("mIxEd CaSe")), "Mixed Case");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("john@email.com"));
        assert!(is_valid_email("no_email@unknown.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn test_boolean_detection() {
        assert!(is_boolean_true("Yes"));
        assert!(is_boolean_true(" y "));
        assert!(is_boolean_false("NO"));
        assert!(!is_boolean_true("maybe"));
        assert!(!is_boolean_false("maybe"));
    }

    #[test]
    fn test_median_and_mean() {
        assert_eq!(median(&[25.0, 35.0, 30.0]), Some(30.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_string_mode_groups_spellings() {
        let values = ["Clothing", "books", "CLOTHING", "Books", "clothing"];
        assert_eq!(string_mode(values), Some("Clothing".to_string()));
    }

    #[test]
    fn test_string_mode_tie_prefers_first_seen() {
        assert_eq!(string_mode(["No", "Yes"]), Some("No".to_string()));
        assert_eq!(string_mode(Vec::<&str>::new()), None);
    }
}
