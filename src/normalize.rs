use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Formatting stripped from numeric cells before parsing, in order.
pub const NUMERIC_NOISE: [&str; 3] = [",", "₹", "$"];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first before day-first, so 03/04/2024 reads as March 4th.
const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumn {
    pub values: Vec<Option<f64>>,
    pub failures: usize,
}

impl NormalizedColumn {
    pub fn parsed_count(&self) -> usize {
        self.values.len() - self.failures
    }
}

/// Plain number parse used for type inference: no currency stripping.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Strip currency symbols and thousands separators, then parse.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let mut cleaned = cell.to_string();
    for noise in NUMERIC_NOISE {
        cleaned = cleaned.replace(noise, "");
    }
    parse_number(&cleaned)
}

/// Coerce every cell leniently; unparseable cells become missing.
pub fn normalize_numeric_lenient(cells: &[String]) -> NormalizedColumn {
    let values: Vec<Option<f64>> = cells.iter().map(|cell| parse_amount(cell)).collect();
    let failures = values.iter().filter(|value| value.is_none()).count();
    NormalizedColumn { values, failures }
}

/// Coerce a selected column, failing only when nothing in it parses.
pub fn normalize_numeric(name: &str, cells: &[String]) -> EngineResult<NormalizedColumn> {
    let normalized = normalize_numeric_lenient(cells);
    if normalized.parsed_count() == 0 {
        return Err(EngineError::UnparseableColumn(name.to_string()));
    }
    if normalized.failures > 0 {
        debug!(
            column = name,
            failures = normalized.failures,
            "numeric cells coerced to missing"
        );
    }
    Ok(normalized)
}

pub fn parse_datetime(cell: &str) -> Option<NaiveDateTime> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(value.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(value);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn coerce_dates(cells: &[String]) -> Vec<Option<NaiveDateTime>> {
    cells.iter().map(|cell| parse_datetime(cell)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn strips_currency_and_separators() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.50));
        assert_eq!(parse_amount(" ₹ 12,00,000 "), Some(1_200_000.0));
        assert_eq!(parse_amount("-$40"), Some(-40.0));
    }

    #[test]
    fn bad_cells_become_missing() {
        let normalized = normalize_numeric("Sales", &cells(&["10", "n/a", "", "$5"])).unwrap();
        assert_eq!(normalized.values, vec![Some(10.0), None, None, Some(5.0)]);
        assert_eq!(normalized.failures, 2);
    }

    #[test]
    fn non_finite_values_are_missing() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn column_without_any_number_is_rejected() {
        let err = normalize_numeric("Notes", &cells(&["abc", "", "xyz"])).unwrap_err();
        assert!(matches!(err, EngineError::UnparseableColumn(name) if name == "Notes"));
    }

    #[test]
    fn lenient_normalization_never_fails() {
        let normalized = normalize_numeric_lenient(&cells(&["abc"]));
        assert_eq!(normalized.values, vec![None]);
        assert_eq!(normalized.parsed_count(), 0);
    }

    #[test]
    fn parses_common_date_shapes() {
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        assert_eq!(parse_datetime("2024-01-15"), Some(midnight(2024, 1, 15)));
        assert_eq!(parse_datetime("03/04/2024"), Some(midnight(2024, 3, 4)));
        assert_eq!(parse_datetime("25/12/2023"), Some(midnight(2023, 12, 25)));
        assert_eq!(parse_datetime("15 Jan 2024"), Some(midnight(2024, 1, 15)));
        assert_eq!(parse_datetime("Jan 15, 2024"), Some(midnight(2024, 1, 15)));
        assert_eq!(
            parse_datetime("2024-01-15 08:30:05"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(8, 30, 5)
        );
        assert_eq!(
            parse_datetime("2024-01-15T10:00:00+02:00"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
        );
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_datetime("East"), None);
        assert_eq!(parse_datetime("$100"), None);
        assert_eq!(parse_datetime(""), None);
    }

    fn with_separators(whole: u64) -> String {
        let digits = whole.to_string();
        let mut out = String::new();
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }

    proptest! {
        #[test]
        fn recovers_formatted_amounts(
            whole in 0u64..10_000_000_000,
            cents in 0u64..100,
            prefix in prop::sample::select(vec!["", "$", "₹"]),
        ) {
            let cell = format!("{}{}.{:02}", prefix, with_separators(whole), cents);
            let expected: f64 = format!("{}.{:02}", whole, cents).parse().unwrap();
            prop_assert_eq!(parse_amount(&cell), Some(expected));
        }
    }
}
