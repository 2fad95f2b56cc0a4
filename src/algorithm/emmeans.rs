//! Estimated marginal means per condition
//!
//! Each present level is predicted at the mean age of the fitted samples.

use serde::Serialize;
use statrs::distribution::ContinuousCDF;

use crate::algorithm::linear_model::LinearModel;
use crate::error::Result;
use crate::models::PatientCondition;
use crate::utils::logging::console::truncate_string;

/// Confidence level of the reported intervals
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Model prediction for one condition at the mean age
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginalMean {
    pub condition: PatientCondition,
    pub emmean: f64,
    pub std_error: f64,
    pub df: usize,
    pub lower_cl: f64,
    pub upper_cl: f64,
}

/// Marginal means for every level present in the model, in level order
///
/// # Errors
/// Propagates [`crate::error::AnalysisError::Numerical`] from the t
/// distribution.
pub fn estimated_marginal_means(model: &LinearModel) -> Result<Vec<MarginalMean>> {
    let t_dist = model.residual_t()?;
    let t_crit = t_dist.inverse_cdf(1.0 - (1.0 - CONFIDENCE_LEVEL) / 2.0);

    model
        .levels
        .iter()
        .map(|&condition| -> Result<MarginalMean> {
            let l = model.design_row(condition, model.mean_age)?;
            let (emmean, std_error) = model.linear_functional(&l);
            Ok(MarginalMean {
                condition,
                emmean,
                std_error,
                df: model.df_residual,
                lower_cl: t_crit.mul_add(-std_error, emmean),
                upper_cl: t_crit.mul_add(std_error, emmean),
            })
        })
        .collect()
}

/// Render marginal means as plain text
#[must_use]
pub fn format_marginal_means(means: &[MarginalMean], mean_age: f64) -> String {
    let mut output = format!("Estimated marginal means at age = {mean_age:.2}\n\n");
    output.push_str(
        "Condition                  |   emmean |       SE |  df | lower.CL | upper.CL\n\
         ---------------------------|----------|----------|-----|----------|---------\n",
    );
    for m in means {
        output.push_str(&format!(
            "{:<26} | {:>8.4} | {:>8.4} | {:>3} | {:>8.4} | {:>8.4}\n",
            truncate_string(m.condition.label(), 26),
            m.emmean,
            m.std_error,
            m.df,
            m.lower_cl,
            m.upper_cl
        ));
    }
    output
}
