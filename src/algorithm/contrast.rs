//! Linear contrasts between condition levels
//!
//! A contrast is a weight per level. It is evaluated as a linear functional of
//! the model coefficients, `L = Σ wₖ·xₖ` where `xₖ` is the design row of level
//! `k` at the mean age, giving estimate `L·β` and standard error
//! `sqrt(L V Lᵀ)`. Raw p-values within a family are Šidák-adjusted.

use nalgebra::DVector;
use serde::Serialize;
use statrs::distribution::ContinuousCDF;

use crate::algorithm::linear_model::LinearModel;
use crate::config::ContrastConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{CONDITION_LEVELS, PatientCondition};

/// Named weight vector over the condition levels
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastSpec {
    pub name: String,
    /// Weight per level, indexed by [`PatientCondition::index`]
    pub weights: [f64; CONDITION_LEVELS],
}

impl ContrastSpec {
    #[must_use]
    pub const fn new(name: String, weights: [f64; CONDITION_LEVELS]) -> Self {
        Self { name, weights }
    }

    /// `minuend - subtrahend`
    #[must_use]
    pub fn difference(minuend: PatientCondition, subtrahend: PatientCondition) -> Self {
        let mut weights = [0.0; CONDITION_LEVELS];
        weights[minuend.index()] += 1.0;
        weights[subtrahend.index()] -= 1.0;
        Self::new(format!("{minuend} - {subtrahend}"), weights)
    }

    /// Build a contrast from a label -> weight map
    ///
    /// # Errors
    /// Returns [`AnalysisError::Config`] for an unknown label, a non-finite
    /// weight or an all-zero weight vector.
    pub fn from_config(config: &ContrastConfig) -> Result<Self> {
        let mut weights = [0.0; CONDITION_LEVELS];
        for (label, &weight) in &config.weights {
            let level: PatientCondition = label.parse().map_err(|_| {
                AnalysisError::Config(format!(
                    "contrast '{}' names unknown condition '{label}'",
                    config.name
                ))
            })?;
            if !weight.is_finite() {
                return Err(AnalysisError::Config(format!(
                    "contrast '{}' has a non-finite weight for '{label}'",
                    config.name
                )));
            }
            weights[level.index()] = weight;
        }
        if weights.iter().all(|&w| w == 0.0) {
            return Err(AnalysisError::Config(format!(
                "contrast '{}' has no non-zero weights",
                config.name
            )));
        }
        Ok(Self::new(config.name.clone(), weights))
    }

    /// Levels with a non-zero weight, in level order
    pub fn weighted_levels(&self) -> impl Iterator<Item = (PatientCondition, f64)> + '_ {
        PatientCondition::LEVELS
            .into_iter()
            .map(|level| (level, self.weights[level.index()]))
            .filter(|&(_, w)| w != 0.0)
    }
}

/// Evaluated contrast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastResult {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub df: usize,
    pub t_value: f64,
    /// Unadjusted two-sided p-value
    pub p_value: f64,
    /// Šidák-adjusted p-value over the family
    pub p_adjusted: f64,
}

/// Šidák adjustment `1 - (1 - p)^m`
#[must_use]
pub fn sidak_adjust(p: f64, m: usize) -> f64 {
    if m <= 1 {
        return p;
    }
    let adjusted = -(m as f64 * (-p).ln_1p()).exp_m1();
    adjusted.clamp(p, 1.0)
}

/// Evaluate a family of contrasts against a fitted model
///
/// # Errors
/// Returns [`AnalysisError::InsufficientData`] when a contrast puts weight on
/// a level without observations.
pub fn evaluate_contrasts(
    model: &LinearModel,
    specs: &[ContrastSpec],
) -> Result<Vec<ContrastResult>> {
    let t_dist = model.residual_t()?;
    let m = specs.len();

    specs
        .iter()
        .map(|spec| -> Result<ContrastResult> {
            let mut l = DVector::zeros(model.coefficients().len());
            for (level, weight) in spec.weighted_levels() {
                let row = model.design_row(level, model.mean_age).map_err(|_| {
                    AnalysisError::InsufficientData(format!(
                        "contrast '{}' weights level '{level}', which has no observations",
                        spec.name
                    ))
                })?;
                l += row * weight;
            }

            let (estimate, std_error) = model.linear_functional(&l);
            let t_value = estimate / std_error;
            let p_value = 2.0 * t_dist.sf(t_value.abs());

            Ok(ContrastResult {
                name: spec.name.clone(),
                estimate,
                std_error,
                df: model.df_residual,
                t_value,
                p_value,
                p_adjusted: sidak_adjust(p_value, m),
            })
        })
        .collect()
}

/// Render contrasts as plain text
#[must_use]
pub fn format_contrasts(results: &[ContrastResult]) -> String {
    let mut output = format!(
        "Contrasts (P value adjustment: sidak method for {} tests)\n\n",
        results.len()
    );
    output.push_str(
        "Contrast                             | Estimate |       SE |  df |  t ratio |  p.value |    p.adj\n\
         -------------------------------------|----------|----------|-----|----------|----------|---------\n",
    );
    for r in results {
        output.push_str(&format!(
            "{:<36} | {:>8.4} | {:>8.4} | {:>3} | {:>8.3} | {:>8.4} | {:>8.4}\n",
            r.name, r.estimate, r.std_error, r.df, r.t_value, r.p_value, r.p_adjusted
        ));
    }
    output
}
