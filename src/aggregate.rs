use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::error::{EngineError, EngineResult};
use crate::models::{AggregateSeries, KpiSummary};

/// Total, mean and maximum over the non-missing values of a column.
pub fn summary(column: &str, values: &[Option<f64>]) -> EngineResult<KpiSummary> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return Err(EngineError::UnparseableColumn(column.to_string()));
    }

    let total: f64 = present.iter().sum();
    let maximum = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(KpiSummary {
        total,
        average: total / present.len() as f64,
        maximum,
        count: present.len(),
    })
}

/// Sum values per exact category label, in first-seen order. Rows with a
/// blank label are skipped; labels whose values are all missing sum to 0.
pub fn by_category(categories: &[String], values: &[Option<f64>]) -> AggregateSeries<String> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(String, f64)> = Vec::new();

    for (label, value) in categories.iter().zip(values) {
        if label.trim().is_empty() {
            continue;
        }
        let slot = *positions.entry(label.as_str()).or_insert_with(|| {
            entries.push((label.clone(), 0.0));
            entries.len() - 1
        });
        if let Some(value) = value {
            entries[slot].1 += value;
        }
    }

    AggregateSeries { entries }
}

/// Sum values per exact timestamp, ascending. Unparsed dates are dropped.
pub fn by_time(
    dates: &[Option<NaiveDateTime>],
    values: &[Option<f64>],
) -> AggregateSeries<NaiveDateTime> {
    let mut buckets: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();

    for (date, value) in dates.iter().zip(values) {
        let Some(date) = date else {
            continue;
        };
        let entry = buckets.entry(*date).or_insert(0.0);
        if let Some(value) = value {
            *entry += value;
        }
    }

    AggregateSeries {
        entries: buckets.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn summary_skips_missing_values() {
        let kpi = summary("Sales", &[Some(100.0), None, Some(300.0), Some(50.0)]).unwrap();
        assert_eq!(kpi.total, 450.0);
        assert_eq!(kpi.average, 150.0);
        assert_eq!(kpi.maximum, 300.0);
        assert_eq!(kpi.count, 3);
    }

    #[test]
    fn summary_of_all_missing_is_a_configuration_error() {
        let err = summary("Sales", &[None, None]).unwrap_err();
        assert!(err.is_configuration());
        assert!(summary("Sales", &[]).is_err());
    }

    #[test]
    fn summary_handles_negative_maximum() {
        let kpi = summary("Delta", &[Some(-5.0), Some(-2.0)]).unwrap();
        assert_eq!(kpi.maximum, -2.0);
    }

    #[test]
    fn category_sums_match_restricted_totals() {
        let categories = labels(&["East", "West", "East", "North", "", "West"]);
        let values = [Some(100.0), Some(50.0), Some(300.0), None, Some(9.0), Some(1.5)];
        let series = by_category(&categories, &values);

        assert_eq!(
            series.entries,
            vec![
                ("East".to_string(), 400.0),
                ("West".to_string(), 51.5),
                ("North".to_string(), 0.0),
            ]
        );
    }

    #[test]
    fn category_labels_are_exact_strings() {
        let series = by_category(&labels(&["east", "East"]), &[Some(1.0), Some(2.0)]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn time_groups_by_exact_timestamp_in_ascending_order() {
        let dates = [Some(at(2, 0)), None, Some(at(1, 0)), Some(at(1, 1)), Some(at(2, 0))];
        let values = [Some(1.0), Some(99.0), Some(2.0), Some(3.0), Some(4.0)];
        let series = by_time(&dates, &values);

        assert_eq!(
            series.entries,
            vec![(at(1, 0), 2.0), (at(1, 1), 3.0), (at(2, 0), 5.0)]
        );
    }

    #[test]
    fn empty_inputs_give_empty_series() {
        assert!(by_category(&[], &[]).is_empty());
        assert!(by_time(&[], &[]).is_empty());
    }
}
