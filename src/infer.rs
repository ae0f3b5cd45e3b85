use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::Selection;
use crate::normalize::{parse_datetime, parse_number};
use crate::table::{Column, ColumnData, Table};

/// Share of cells that must parse as dates for a column to count as a date column.
pub const DATE_PARSE_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Date,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Date => "date",
        };
        f.write_str(label)
    }
}

pub fn infer_kind(column: &Column) -> ColumnKind {
    let cells = match &column.data {
        ColumnData::Numeric(_) => return ColumnKind::Numeric,
        ColumnData::Date(_) => return ColumnKind::Date,
        ColumnData::Text(cells) => cells,
    };

    let mut non_empty = cells.iter().filter(|cell| !cell.trim().is_empty()).peekable();
    if non_empty.peek().is_some() && non_empty.all(|cell| parse_number(cell).is_some()) {
        return ColumnKind::Numeric;
    }

    if cells.is_empty() {
        return ColumnKind::Categorical;
    }

    let parsed = cells
        .iter()
        .filter(|cell| parse_datetime(cell).is_some())
        .count();
    let ratio = parsed as f64 / cells.len() as f64;
    if ratio >= DATE_PARSE_THRESHOLD {
        ColumnKind::Date
    } else {
        ColumnKind::Categorical
    }
}

pub fn infer_kinds(table: &Table) -> Vec<(String, ColumnKind)> {
    table
        .columns()
        .iter()
        .map(|column| {
            let kind = infer_kind(column);
            debug!(column = %column.name, %kind, "inferred column kind");
            (column.name.clone(), kind)
        })
        .collect()
}

/// First qualifying column for each role.
pub fn default_selection(table: &Table) -> Selection {
    let kinds = infer_kinds(table);
    let first_of = |wanted: ColumnKind| {
        kinds
            .iter()
            .find(|(_, kind)| *kind == wanted)
            .map(|(name, _)| name.clone())
    };

    Selection {
        numeric: first_of(ColumnKind::Numeric),
        category: first_of(ColumnKind::Categorical),
        date: first_of(ColumnKind::Date),
    }
}

/// Merge an explicit selection over inferred defaults. Explicit names must
/// exist in the table.
pub fn resolve(table: &Table, explicit: &Selection, inferred: &Selection) -> EngineResult<Selection> {
    for name in [&explicit.numeric, &explicit.category, &explicit.date]
        .into_iter()
        .flatten()
    {
        if !table.has_column(name) {
            return Err(EngineError::MissingColumn(name.clone()));
        }
    }

    Ok(Selection {
        numeric: explicit.numeric.clone().or_else(|| inferred.numeric.clone()),
        category: explicit.category.clone().or_else(|| inferred.category.clone()),
        date: explicit.date.clone().or_else(|| inferred.date.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::table_of;

    fn sample() -> Table {
        table_of(
            &["Region", "Sales", "Day", "Notes"],
            &[
                &["East", "100", "2024-01-01", "ok"],
                &["West", "", "2024-01-02", "late"],
                &["East", "50.5", "soon", "ok"],
                &["North", "7", "2024-01-04", ""],
                &["East", "12", "2024-01-05", "ok"],
            ],
        )
    }

    #[test]
    fn classifies_each_column() {
        let kinds = infer_kinds(&sample());
        assert_eq!(
            kinds,
            vec![
                ("Region".to_string(), ColumnKind::Categorical),
                ("Sales".to_string(), ColumnKind::Numeric),
                ("Day".to_string(), ColumnKind::Date),
                ("Notes".to_string(), ColumnKind::Categorical),
            ]
        );
    }

    #[test]
    fn date_threshold_is_inclusive_at_sixty_percent() {
        let table = table_of(
            &["When"],
            &[&["2024-01-01"], &["2024-02-01"], &["2024-03-01"], &["x"], &["y"]],
        );
        assert_eq!(infer_kind(&table.columns()[0]), ColumnKind::Date);

        let table = table_of(&["When"], &[&["2024-01-01"], &["x"]]);
        assert_eq!(infer_kind(&table.columns()[0]), ColumnKind::Categorical);
    }

    #[test]
    fn empty_columns_are_categorical() {
        let table = table_of(&["Blank"], &[&[""], &[""]]);
        assert_eq!(infer_kind(&table.columns()[0]), ColumnKind::Categorical);

        let table = table_of(&["NoRows"], &[]);
        assert_eq!(infer_kind(&table.columns()[0]), ColumnKind::Categorical);
    }

    #[test]
    fn currency_columns_are_not_numeric_without_a_hint() {
        let table = table_of(&["Sales"], &[&["$100"], &["$300"]]);
        assert_eq!(infer_kind(&table.columns()[0]), ColumnKind::Categorical);
    }

    #[test]
    fn defaults_pick_first_of_each_kind() {
        let defaults = default_selection(&sample());
        assert_eq!(defaults.numeric.as_deref(), Some("Sales"));
        assert_eq!(defaults.category.as_deref(), Some("Region"));
        assert_eq!(defaults.date.as_deref(), Some("Day"));
    }

    #[test]
    fn explicit_choice_overrides_defaults() {
        let table = sample();
        let explicit = Selection {
            category: Some("Notes".to_string()),
            ..Selection::default()
        };
        let resolved = resolve(&table, &explicit, &default_selection(&table)).unwrap();
        assert_eq!(resolved.category.as_deref(), Some("Notes"));
        assert_eq!(resolved.numeric.as_deref(), Some("Sales"));
    }

    #[test]
    fn explicit_unknown_column_is_rejected() {
        let table = sample();
        let explicit = Selection {
            numeric: Some("Profit".to_string()),
            ..Selection::default()
        };
        let err = resolve(&table, &explicit, &Selection::default()).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn(name) if name == "Profit"));
    }
}
