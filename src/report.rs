use std::fmt::Write;

use crate::dashboard::Dashboard;
use crate::models::{Analysis, DocumentScoreCard, VarianceStatus};
use crate::table::DATETIME_DISPLAY_FORMAT;

const MAX_LISTED_ROWS: usize = 20;

/// Two decimals with thousands separators, e.g. `₹ 1,234.50`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    if symbol.is_empty() {
        format!("{sign}{grouped}.{fraction}")
    } else {
        format!("{sign}{symbol} {grouped}.{fraction}")
    }
}

fn format_mean(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(value) => format!("{value:.precision$}{unit}"),
        None => "n/a".to_string(),
    }
}

pub fn build_analysis_report(source: &str, analysis: &Analysis, currency: &str) -> String {
    let mut output = String::new();
    let numeric = analysis.selection.numeric.as_deref().unwrap_or("None");

    let _ = writeln!(output, "# Data Profile Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} rows, run {})",
        source, analysis.row_count, analysis.run_id
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Columns");
    for column in &analysis.columns {
        let _ = writeln!(
            output,
            "- {} ({}): {} values, {} missing, {} distinct",
            column.name, column.kind, column.non_missing, column.missing, column.distinct
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## KPIs for {}", numeric);
    let _ = writeln!(output, "- Total: {}", format_currency(analysis.summary.total, currency));
    let _ = writeln!(output, "- Average: {}", format_currency(analysis.summary.average, currency));
    let _ = writeln!(output, "- Maximum: {}", format_currency(analysis.summary.maximum, currency));
    if analysis.numeric_missing > 0 {
        let _ = writeln!(
            output,
            "- {} unparseable values excluded",
            analysis.numeric_missing
        );
    }

    let _ = writeln!(output);
    match analysis.selection.category.as_deref() {
        Some(category) => {
            let _ = writeln!(output, "## {} by {}", numeric, category);
            if analysis.by_category.is_empty() {
                let _ = writeln!(output, "No categories present.");
            }
            for (label, total) in &analysis.by_category.entries {
                let _ = writeln!(output, "- {}: {}", label, format_currency(*total, currency));
            }
        }
        None => {
            let _ = writeln!(output, "## Category Breakdown");
            let _ = writeln!(output, "No category column selected.");
        }
    }

    let _ = writeln!(output);
    match analysis.selection.date.as_deref() {
        Some(date) => {
            let _ = writeln!(output, "## {} over {}", numeric, date);
            if analysis.by_time.is_empty() {
                let _ = writeln!(output, "No parseable dates.");
            }
            for (when, total) in &analysis.by_time.entries {
                let _ = writeln!(
                    output,
                    "- {}: {}",
                    when.format(DATETIME_DISPLAY_FORMAT),
                    format_currency(*total, currency)
                );
            }
        }
        None => {
            let _ = writeln!(output, "## Trend");
            let _ = writeln!(output, "No date column selected.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Anomalies");
    match analysis.anomalies.status {
        VarianceStatus::Insufficient => {
            let _ = writeln!(output, "Insufficient variance for anomaly detection.");
        }
        VarianceStatus::Sufficient { mean, std_dev } => {
            let _ = writeln!(output, "Mean {:.2}, standard deviation {:.2}.", mean, std_dev);
            if analysis.anomalies.anomalies.is_empty() {
                let _ = writeln!(output, "No anomalies detected.");
            }
            for row in analysis.anomalies.anomalies.iter().take(MAX_LISTED_ROWS) {
                let _ = writeln!(
                    output,
                    "- row {}: {} (z {:.2})",
                    row.index,
                    format_currency(row.value, currency),
                    row.z_score
                );
            }
        }
    }

    output
}

pub fn build_document_report(source: &str, card: &DocumentScoreCard) -> String {
    let mut output = String::new();
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    let _ = writeln!(output, "# Document Governance Scorecard");
    let _ = writeln!(output, "Generated for {}", source);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Executive Summary");
    if card.executive_summary.is_empty() {
        let _ = writeln!(output, "No key insights found.");
    } else {
        let _ = writeln!(output, "{}", card.executive_summary);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Scores");
    let _ = writeln!(
        output,
        "- Sentiment: {} ({} positive, {} negative)",
        card.sentiment.label, card.sentiment.positive_hits, card.sentiment.negative_hits
    );
    let _ = writeln!(output, "- Mentions KPIs: {}", yes_no(card.mentions_kpi));
    let _ = writeln!(output, "- Quantified targets (%): {}", yes_no(card.mentions_percentage));
    let _ = writeln!(
        output,
        "- Risk coverage: {}/100 ({} keyword hits)",
        card.risk_coverage, card.risk_hits
    );
    let _ = writeln!(output, "- AI maturity: {} ({} term hits)", card.maturity, card.ai_hits);

    output
}

pub fn build_dashboard_report(source: &str, dashboard: &Dashboard, currency: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Transformation Control Dashboard");
    let _ = writeln!(output, "Generated for {}", source);

    let technical = &dashboard.technical;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Technical Health");
    let _ = writeln!(
        output,
        "- {} modules: {} migrated, {} pending",
        technical.total_modules, technical.migrated, technical.pending
    );
    if let Some(progress) = technical.progress {
        let _ = writeln!(output, "- Migration progress: {:.1}%", progress * 100.0);
    }

    let integration = &dashboard.integration;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Integration Performance");
    let _ = writeln!(output, "- Total APIs: {}", integration.total_apis);
    let _ = writeln!(output, "- Documented: {:.1}%", integration.documented_pct);
    let _ = writeln!(output, "- Auth enabled: {:.1}%", integration.auth_enabled_pct);
    let _ = writeln!(
        output,
        "- Avg response: {}",
        format_mean(integration.avg_response_ms, 0, " ms")
    );
    let _ = writeln!(
        output,
        "- Avg error rate: {}",
        format_mean(integration.avg_error_rate_pct, 2, "%")
    );

    let ai = &dashboard.ai;
    let _ = writeln!(output);
    let _ = writeln!(output, "## AI Performance");
    let _ = writeln!(output, "- Live models: {}", ai.live_models);
    let _ = writeln!(output, "- Avg accuracy: {}", format_mean(ai.avg_accuracy_pct, 1, "%"));
    let _ = writeln!(output, "- Avg inference: {}", format_mean(ai.avg_inference_ms, 0, " ms"));
    let _ = writeln!(
        output,
        "- Business impact: {}",
        format_mean(ai.avg_business_impact_pct, 1, "%")
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Reporting & Adoption");
    let _ = writeln!(output, "- Reports migrated: {}", dashboard.reporting.migrated_reports);
    let _ = writeln!(
        output,
        "- Avg user adoption: {}",
        format_mean(dashboard.reporting.avg_adoption_pct, 1, "%")
    );

    let revenue = &dashboard.revenue;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Revenue Alignment");
    let _ = writeln!(
        output,
        "- Projected revenue: {}",
        format_currency(revenue.projected_revenue, currency)
    );
    let _ = writeln!(
        output,
        "- Annual cost saving: {}",
        format_currency(revenue.annual_cost_saving, currency)
    );
    for (module, total) in &revenue.revenue_by_module.entries {
        let _ = writeln!(output, "  - {}: {}", module, format_currency(*total, currency));
    }

    let risk = &dashboard.risk;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Management");
    let _ = writeln!(output, "- High risk items: {}", risk.high_risk_items);
    for (category, exposure) in &risk.exposure_by_category.entries {
        let _ = writeln!(output, "  - {}: exposure {:.0}", category, exposure);
    }

    output
}
