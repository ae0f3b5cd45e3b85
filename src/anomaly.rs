use tracing::debug;

use crate::models::{AnomalyReport, AnomalyRow, VarianceStatus};

/// Rows whose standard score magnitude exceeds this are anomalies.
pub const Z_SCORE_THRESHOLD: f64 = 3.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|value| (value - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Tag every row with its standard score and collect the outliers in row order.
pub fn detect(values: &[Option<f64>]) -> AnomalyReport {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    // Rounding in the mean leaves a tiny nonzero sigma for constant fractional columns.
    let distinct = present.iter().any(|value| *value != present[0]);

    let (mu, sigma) = match (mean(&present), population_std_dev(&present)) {
        (Some(mu), Some(sigma)) if distinct && sigma.is_finite() && sigma > 0.0 => (mu, sigma),
        _ => {
            debug!(values = present.len(), "insufficient variance for anomaly detection");
            return AnomalyReport {
                status: VarianceStatus::Insufficient,
                z_scores: vec![None; values.len()],
                anomalies: Vec::new(),
            };
        }
    };

    let z_scores: Vec<Option<f64>> = values
        .iter()
        .map(|value| value.map(|value| (value - mu) / sigma))
        .collect();

    let anomalies = values
        .iter()
        .zip(&z_scores)
        .enumerate()
        .filter_map(|(index, (value, z))| match (value, z) {
            (Some(value), Some(z)) if z.abs() > Z_SCORE_THRESHOLD => Some(AnomalyRow {
                index,
                value: *value,
                z_score: *z,
            }),
            _ => None,
        })
        .collect();

    AnomalyReport {
        status: VarianceStatus::Sufficient {
            mean: mu,
            std_dev: sigma,
        },
        z_scores,
        anomalies,
    }
}
