//! Correlation and linear regression between the tide sensors
//!
//! Fits `vega = slope * keller + intercept` by ordinary least squares over
//! paired rows. Standard errors follow the usual `n - 2` degrees of freedom;
//! with exactly two points the fit is exact and both errors are zero.

use super::stats::{paired_moments, pearson};
use crate::constants::MIN_REGRESSION_POINTS;
use crate::error::{Result, TideError};
use crate::models::{Channel, CorrelationMatrix, CorrelationResult, SensorTable};
use tracing::debug;

const OPERATION: &str = "keller/vega regression";

/// Correlate vega against keller
///
/// # Errors
///
/// * `InsufficientData` with fewer than two paired points
/// * `DegenerateSeries` when either sensor is constant over the pairs
pub fn correlate_sensors(table: &SensorTable) -> Result<CorrelationResult> {
    let pairs: Vec<(f64, f64)> = table
        .paired(Channel::Keller, Channel::Vega)
        .into_iter()
        .map(|(_, keller, vega)| (keller, vega))
        .collect();

    if pairs.len() < MIN_REGRESSION_POINTS {
        return Err(TideError::InsufficientData {
            operation: OPERATION.to_string(),
            required: MIN_REGRESSION_POINTS,
            found: pairs.len(),
        });
    }

    let n = pairs.len();
    let Some((mean_x, mean_y, var_x, var_y, cov)) = paired_moments(&pairs) else {
        return Err(TideError::InsufficientData {
            operation: OPERATION.to_string(),
            required: MIN_REGRESSION_POINTS,
            found: 0,
        });
    };

    if var_x == 0.0 || var_y == 0.0 {
        let constant = if var_x == 0.0 { "keller" } else { "vega" };
        return Err(TideError::DegenerateSeries {
            operation: OPERATION.to_string(),
            reason: format!("{} is constant over {} paired points", constant, n),
        });
    }

    let r = (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0);
    let r_squared = r * r;
    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;

    let (std_err, intercept_std_err) = if n == 2 {
        (0.0, 0.0)
    } else {
        let df = (n - 2) as f64;
        let slope_err = ((1.0 - r_squared).max(0.0) * var_y / var_x / df).sqrt();
        (slope_err, slope_err * (var_x + mean_x * mean_x).sqrt())
    };

    debug!(
        "Regression over {} pairs: r={:.4}, slope={:.4}, intercept={:.4}",
        n, r, slope, intercept
    );

    Ok(CorrelationResult {
        paired_count: n,
        r,
        r_squared,
        slope,
        intercept,
        std_err,
        intercept_std_err,
    })
}

/// Pairwise-complete Pearson correlation between every pair of channels
pub fn correlation_matrix(table: &SensorTable) -> CorrelationMatrix {
    let channels = Channel::ALL.to_vec();

    let values = channels
        .iter()
        .map(|a| {
            channels
                .iter()
                .map(|b| {
                    let pairs: Vec<(f64, f64)> = table
                        .paired(*a, *b)
                        .into_iter()
                        .map(|(_, x, y)| (x, y))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix { channels, values }
}
