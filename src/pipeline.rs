use tracing::{info, info_span, warn};

use crate::aggregate;
use crate::anomaly;
use crate::error::{EngineError, EngineResult};
use crate::infer;
use crate::models::{AggregateSeries, Analysis, ColumnProfile, Selection, VarianceStatus};
use crate::table::Table;

/// Name of the derived per-row standard score column.
pub const Z_SCORE_COLUMN: &str = "z_score";

pub fn profile_columns(table: &Table, selection: &Selection) -> Vec<ColumnProfile> {
    table
        .columns()
        .iter()
        .map(|column| {
            let missing = column.missing_count();
            ColumnProfile {
                name: column.name.clone(),
                kind: infer::infer_kind(column),
                role: selection.role_of(&column.name),
                non_missing: table.row_count() - missing,
                missing,
                distinct: column.distinct_count(),
            }
        })
        .collect()
}

/// Run one analysis pass over `table` with a resolved selection. The active
/// numeric and date columns are coerced in place and a `z_score` column is
/// added; everything returned is recomputed from scratch.
pub fn analyze(table: &mut Table, selection: &Selection, run_id: &str) -> EngineResult<Analysis> {
    let span = info_span!("analyze", run_id);
    let _guard = span.enter();

    let numeric_name = selection
        .numeric
        .as_deref()
        .ok_or(EngineError::NoColumnSelected { role: "numeric" })?;

    for name in [&selection.category, &selection.date].into_iter().flatten() {
        table.column(name)?;
    }

    let columns = profile_columns(table, selection);

    let values = table.coerce_numeric(numeric_name)?.to_vec();
    let numeric_missing = values.iter().filter(|value| value.is_none()).count();
    if numeric_missing > 0 {
        warn!(
            column = numeric_name,
            missing = numeric_missing,
            "excluding unparseable values from aggregates"
        );
    }

    let summary = aggregate::summary(numeric_name, &values)?;

    let by_category = match selection.category.as_deref() {
        Some(name) => aggregate::by_category(&table.column(name)?.cells_as_text(), &values),
        None => AggregateSeries::default(),
    };

    let by_time = match selection.date.as_deref() {
        Some(name) => {
            let dates = table.coerce_date(name)?;
            aggregate::by_time(dates, &values)
        }
        None => AggregateSeries::default(),
    };

    let anomalies = anomaly::detect(&values);
    if anomalies.status == VarianceStatus::Insufficient {
        info!(column = numeric_name, "insufficient variance, no anomalies reported");
    }
    table.put_numeric_column(Z_SCORE_COLUMN, anomalies.z_scores.clone());

    info!(
        rows = table.row_count(),
        total = summary.total,
        groups = by_category.len(),
        trend_points = by_time.len(),
        anomalies = anomalies.anomalies.len(),
        "analysis complete"
    );

    Ok(Analysis {
        run_id: run_id.to_string(),
        selection: selection.clone(),
        columns,
        row_count: table.row_count(),
        summary,
        numeric_missing,
        by_category,
        by_time,
        anomalies,
    })
}
