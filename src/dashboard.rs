use serde::Serialize;
use tracing::info;

use crate::aggregate;
use crate::error::EngineResult;
use crate::models::AggregateSeries;
use crate::normalize::normalize_numeric_lenient;
use crate::sources::Workbook;
use crate::table::Table;

pub const MODULES_SHEET: &str = "Modules_Tracking";
pub const API_SHEET: &str = "API_Metrics";
pub const AI_SHEET: &str = "AI_Performance";
pub const REPORTS_SHEET: &str = "Reporting_Adoption";
pub const REVENUE_SHEET: &str = "Revenue_Model";
pub const RISK_SHEET: &str = "Risk_Register";

/// Risk items whose impact × probability exceeds this count as high risk.
pub const HIGH_RISK_ABOVE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalHealth {
    pub total_modules: usize,
    pub migrated: usize,
    pub pending: usize,
    /// Migrated share in 0..=1; `None` when there are no modules.
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationPerformance {
    pub total_apis: usize,
    pub documented_pct: f64,
    pub auth_enabled_pct: f64,
    pub avg_response_ms: Option<f64>,
    pub avg_error_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiPerformance {
    pub live_models: usize,
    pub avg_accuracy_pct: Option<f64>,
    pub avg_inference_ms: Option<f64>,
    pub avg_business_impact_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportingAdoption {
    pub migrated_reports: usize,
    pub avg_adoption_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueAlignment {
    pub projected_revenue: f64,
    pub annual_cost_saving: f64,
    pub revenue_by_module: AggregateSeries<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskManagement {
    pub calculated_risk: Vec<Option<f64>>,
    pub high_risk_items: usize,
    pub exposure_by_category: AggregateSeries<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub technical: TechnicalHealth,
    pub integration: IntegrationPerformance,
    pub ai: AiPerformance,
    pub reporting: ReportingAdoption,
    pub revenue: RevenueAlignment,
    pub risk: RiskManagement,
}

pub fn build_dashboard(workbook: &Workbook) -> EngineResult<Dashboard> {
    let dashboard = Dashboard {
        technical: technical_health(workbook.sheet(MODULES_SHEET)?)?,
        integration: integration_performance(workbook.sheet(API_SHEET)?)?,
        ai: ai_performance(workbook.sheet(AI_SHEET)?)?,
        reporting: reporting_adoption(workbook.sheet(REPORTS_SHEET)?)?,
        revenue: revenue_alignment(workbook.sheet(REVENUE_SHEET)?)?,
        risk: risk_management(workbook.sheet(RISK_SHEET)?)?,
    };
    info!(
        modules = dashboard.technical.total_modules,
        apis = dashboard.integration.total_apis,
        high_risk = dashboard.risk.high_risk_items,
        "built transformation dashboard"
    );
    Ok(dashboard)
}

pub fn technical_health(sheet: &Table) -> EngineResult<TechnicalHealth> {
    let total_modules = sheet.row_count();
    let migrated = count_equal(sheet, "Status", "Migrated")?;
    Ok(TechnicalHealth {
        total_modules,
        migrated,
        pending: total_modules - migrated,
        progress: (total_modules > 0).then(|| migrated as f64 / total_modules as f64),
    })
}

pub fn integration_performance(sheet: &Table) -> EngineResult<IntegrationPerformance> {
    Ok(IntegrationPerformance {
        total_apis: sheet.row_count(),
        documented_pct: share_equal(sheet, "Documented", "Yes")? * 100.0,
        auth_enabled_pct: share_equal(sheet, "Auth_Enabled", "Yes")? * 100.0,
        avg_response_ms: column_mean(sheet, "Avg_Response_Time_ms")?,
        avg_error_rate_pct: column_mean(sheet, "Error_Rate_%")?,
    })
}

pub fn ai_performance(sheet: &Table) -> EngineResult<AiPerformance> {
    Ok(AiPerformance {
        live_models: count_equal(sheet, "Model_Status", "Live")?,
        avg_accuracy_pct: column_mean(sheet, "Accuracy_%")?,
        avg_inference_ms: column_mean(sheet, "Inference_Time_ms")?,
        avg_business_impact_pct: column_mean(sheet, "Business_Impact_%")?,
    })
}

pub fn reporting_adoption(sheet: &Table) -> EngineResult<ReportingAdoption> {
    Ok(ReportingAdoption {
        migrated_reports: count_equal(sheet, "Migrated", "Yes")?,
        avg_adoption_pct: column_mean(sheet, "Adoption_%")?,
    })
}

pub fn revenue_alignment(sheet: &Table) -> EngineResult<RevenueAlignment> {
    let revenue = lenient_values(sheet, "Projected_Revenue")?;
    let modules = sheet.column("Module_Name")?.cells_as_text();
    Ok(RevenueAlignment {
        projected_revenue: revenue.iter().flatten().sum(),
        annual_cost_saving: lenient_values(sheet, "Annual_Cost_Saving")?
            .iter()
            .flatten()
            .sum(),
        revenue_by_module: aggregate::by_category(&modules, &revenue),
    })
}

pub fn risk_management(sheet: &Table) -> EngineResult<RiskManagement> {
    let impact = lenient_values(sheet, "Impact_Score_1_10")?;
    let probability = lenient_values(sheet, "Probability_1_10")?;
    let categories = sheet.column("Risk_Category")?.cells_as_text();

    let calculated_risk: Vec<Option<f64>> = impact
        .iter()
        .zip(&probability)
        .map(|(impact, probability)| Some((*impact)? * (*probability)?))
        .collect();
    let high_risk_items = calculated_risk
        .iter()
        .flatten()
        .filter(|risk| **risk > HIGH_RISK_ABOVE)
        .count();

    Ok(RiskManagement {
        exposure_by_category: aggregate::by_category(&categories, &calculated_risk),
        calculated_risk,
        high_risk_items,
    })
}

fn count_equal(sheet: &Table, column: &str, expected: &str) -> EngineResult<usize> {
    let column = sheet.column(column)?;
    Ok((0..sheet.row_count())
        .filter(|row| column.cell_text(*row) == expected)
        .count())
}

/// Share of rows equal to `expected`; 0 for an empty sheet.
fn share_equal(sheet: &Table, column: &str, expected: &str) -> EngineResult<f64> {
    let matches = count_equal(sheet, column, expected)?;
    if sheet.row_count() == 0 {
        return Ok(0.0);
    }
    Ok(matches as f64 / sheet.row_count() as f64)
}

fn lenient_values(sheet: &Table, column: &str) -> EngineResult<Vec<Option<f64>>> {
    let cells = sheet.column(column)?.cells_as_text();
    Ok(normalize_numeric_lenient(&cells).values)
}

/// Mean of parseable values; `None` when nothing parses.
fn column_mean(sheet: &Table, column: &str) -> EngineResult<Option<f64>> {
    let values = lenient_values(sheet, column)?;
    Ok(aggregate::summary(column, &values).ok().map(|kpi| kpi.average))
}
