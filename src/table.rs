use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::normalize;

pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cell storage for one column. Columns start out as raw text from the
/// source and are coerced in place once a role is assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "cells", rename_all = "snake_case")]
pub enum ColumnData {
    Text(Vec<String>),
    Numeric(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(cells) => cells.len(),
            ColumnData::Numeric(cells) => cells.len(),
            ColumnData::Date(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn text(name: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(cells),
        }
    }

    /// Stringified cell, with missing values rendered as an empty string.
    pub fn cell_text(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Text(cells) => cells.get(row).cloned().unwrap_or_default(),
            ColumnData::Numeric(cells) => cells
                .get(row)
                .copied()
                .flatten()
                .map(|value| value.to_string())
                .unwrap_or_default(),
            ColumnData::Date(cells) => cells
                .get(row)
                .copied()
                .flatten()
                .map(|value| value.format(DATETIME_DISPLAY_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn cells_as_text(&self) -> Vec<String> {
        (0..self.data.len()).map(|row| self.cell_text(row)).collect()
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match &self.data {
            ColumnData::Text(cells) => cells.get(row).map_or(true, |cell| cell.trim().is_empty()),
            ColumnData::Numeric(cells) => cells.get(row).copied().flatten().is_none(),
            ColumnData::Date(cells) => cells.get(row).copied().flatten().is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.data.len()).filter(|row| self.is_missing(*row)).count()
    }

    pub fn distinct_count(&self) -> usize {
        let mut seen = HashSet::new();
        for row in 0..self.data.len() {
            if !self.is_missing(row) {
                seen.insert(self.cell_text(row));
            }
        }
        seen.len()
    }
}

/// Rectangular table of named columns. Row order is the source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a text table from a header row and data rows. Short rows are
    /// padded with empty cells, long rows are truncated to the header width,
    /// and duplicate header names get a `.N` suffix.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = dedupe_headers(headers);
        let row_count = rows.len();
        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(row_count); headers.len()];

        for row in rows {
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get(idx).cloned().unwrap_or_default());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::text(name, cells))
            .collect();

        Self { columns, row_count }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> EngineResult<&Column> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
    }

    fn column_mut(&mut self, name: &str) -> EngineResult<&mut Column> {
        self.columns
            .iter_mut()
            .find(|column| column.name == name)
            .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
    }

    /// Coerce a column to numeric in place and return its values.
    pub fn coerce_numeric(&mut self, name: &str) -> EngineResult<&[Option<f64>]> {
        let column = self.column_mut(name)?;
        if !matches!(column.data, ColumnData::Numeric(_)) {
            let normalized = normalize::normalize_numeric(name, &column.cells_as_text())?;
            column.data = ColumnData::Numeric(normalized.values);
        }
        match &column.data {
            ColumnData::Numeric(values) => Ok(values),
            _ => unreachable!("column was just coerced to numeric"),
        }
    }

    /// Coerce a column to dates in place; unparseable cells become missing.
    pub fn coerce_date(&mut self, name: &str) -> EngineResult<&[Option<NaiveDateTime>]> {
        let column = self.column_mut(name)?;
        if !matches!(column.data, ColumnData::Date(_)) {
            let parsed = normalize::coerce_dates(&column.cells_as_text());
            column.data = ColumnData::Date(parsed);
        }
        match &column.data {
            ColumnData::Date(values) => Ok(values),
            _ => unreachable!("column was just coerced to dates"),
        }
    }

    /// Add a derived numeric column, replacing any previous column of the same name.
    pub fn put_numeric_column(&mut self, name: &str, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.row_count);
        let data = ColumnData::Numeric(values);
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.data = data,
            None => self.columns.push(Column {
                name: name.to_string(),
                data,
            }),
        }
    }
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.trim().to_string()
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

#[cfg(test)]
pub(crate) fn table_of(headers: &[&str], rows: &[&[&str]]) -> Table {
    Table::from_rows(
        headers.iter().map(|header| header.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}
