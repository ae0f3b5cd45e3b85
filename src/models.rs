use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::infer::ColumnKind;

/// Column roles for one analysis pass. `None` means the role is unassigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub numeric: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
}

impl Selection {
    /// Build a selection from UI-style names, where the literal "None"
    /// (or a blank) means no column.
    pub fn from_names(numeric: Option<&str>, category: Option<&str>, date: Option<&str>) -> Self {
        Self {
            numeric: role_name(numeric),
            category: role_name(category),
            date: role_name(date),
        }
    }

    /// Fill unassigned roles from `fallback`.
    pub fn or(self, fallback: Selection) -> Selection {
        Selection {
            numeric: self.numeric.or(fallback.numeric),
            category: self.category.or(fallback.category),
            date: self.date.or(fallback.date),
        }
    }

    pub fn role_of(&self, column: &str) -> ColumnRole {
        if self.numeric.as_deref() == Some(column) {
            ColumnRole::Numeric
        } else if self.category.as_deref() == Some(column) {
            ColumnRole::Category
        } else if self.date.as_deref() == Some(column) {
            ColumnRole::Date
        } else {
            ColumnRole::None
        }
    }
}

pub(crate) fn role_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|name| !name.is_empty() && *name != "None")
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    None,
    Numeric,
    Category,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub role: ColumnRole,
    pub non_missing: usize,
    pub missing: usize,
    pub distinct: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total: f64,
    pub average: f64,
    pub maximum: f64,
    pub count: usize,
}

/// Grouped sums in first-seen key order unless explicitly sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSeries<K> {
    pub entries: Vec<(K, f64)>,
}

impl<K: PartialEq> AggregateSeries<K> {
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sorted_by_value_desc(mut self) -> Self {
        self.entries
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self
    }
}

impl<K> Default for AggregateSeries<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VarianceStatus {
    Sufficient { mean: f64, std_dev: f64 },
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyRow {
    pub index: usize,
    pub value: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub status: VarianceStatus,
    /// One entry per table row; missing values and degenerate columns carry `None`.
    pub z_scores: Vec<Option<f64>>,
    pub anomalies: Vec<AnomalyRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub run_id: String,
    pub selection: Selection,
    pub columns: Vec<ColumnProfile>,
    pub row_count: usize,
    pub summary: KpiSummary,
    pub numeric_missing: usize,
    pub by_category: AggregateSeries<String>,
    pub by_time: AggregateSeries<NaiveDateTime>,
    pub anomalies: AnomalyReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentLabel {
    Positive,
    RiskFocused,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::RiskFocused => "Risk-Focused/Defensive",
            SentimentLabel::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaturityLabel {
    Advanced,
    Intermediate,
    Basic,
}

impl std::fmt::Display for MaturityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MaturityLabel::Advanced => "Advanced",
            MaturityLabel::Intermediate => "Intermediate",
            MaturityLabel::Basic => "Basic",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub positive_hits: usize,
    pub negative_hits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentScoreCard {
    pub executive_summary: String,
    pub sentiment: Sentiment,
    pub mentions_kpi: bool,
    pub mentions_percentage: bool,
    pub risk_hits: usize,
    pub risk_coverage: u32,
    pub ai_hits: usize,
    pub maturity: MaturityLabel,
}
