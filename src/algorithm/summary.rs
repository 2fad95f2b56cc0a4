//! Per-condition descriptive statistics

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::models::{PatientCondition, SampleTable};
use crate::utils::logging::console::truncate_string;
use crate::utils::{mean, sample_std};

/// Descriptive statistics of one condition group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Condition of the group
    pub condition: PatientCondition,
    /// Number of samples
    pub n: usize,
    /// Mean age in years
    pub mean_age: f64,
    /// Mean of `log10_CRTAC1_nm`
    pub mean_log10_crtac1: f64,
    /// Sample standard deviation of `log10_CRTAC1_nm`
    pub sd_log10_crtac1: f64,
}

/// Summarize every condition present in the table
///
/// Groups are sorted by descending mean biomarker; ties keep level order.
///
/// # Arguments
/// * `table` - Unified sample table
/// * `min_group_size` - Smallest group size that may be summarized
///
/// # Errors
/// Returns [`AnalysisError::InsufficientData`] when the table is empty or a
/// present group has fewer than `min_group_size` samples (or fewer than two,
/// which the standard deviation needs).
pub fn summarize_groups(table: &SampleTable, min_group_size: usize) -> Result<Vec<GroupSummary>> {
    if table.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "cannot summarize an empty sample table".to_string(),
        ));
    }

    let required = min_group_size.max(2);
    let mut summaries = Vec::new();
    for (condition, records) in table.grouped() {
        if records.len() < required {
            return Err(AnalysisError::InsufficientData(format!(
                "group '{condition}' has {} sample(s), at least {required} required",
                records.len()
            )));
        }

        let ages: Vec<f64> = records.iter().map(|r| r.age).collect();
        let values: Vec<f64> = records.iter().map(|r| r.log10_crtac1_nm).collect();

        // Non-empty groups always have a mean and, past the size check, an sd
        let (Some(mean_age), Some(mean_value), Some(sd)) =
            (mean(&ages), mean(&values), sample_std(&values))
        else {
            continue;
        };

        summaries.push(GroupSummary {
            condition,
            n: records.len(),
            mean_age,
            mean_log10_crtac1: mean_value,
            sd_log10_crtac1: sd,
        });
    }

    // Stable sort over level-ordered input keeps ties in level order
    summaries.sort_by(|a, b| b.mean_log10_crtac1.total_cmp(&a.mean_log10_crtac1));
    Ok(summaries)
}

/// Render group summaries as a plain-text table
#[must_use]
pub fn format_group_summaries(summaries: &[GroupSummary]) -> String {
    let mut output = String::from(
        "Condition                  |   n | Mean age | Mean log10 CRTAC1 | SD log10 CRTAC1\n\
         ---------------------------|-----|----------|-------------------|----------------\n",
    );
    for s in summaries {
        output.push_str(&format!(
            "{:<26} | {:>3} | {:>8.2} | {:>17.4} | {:>15.4}\n",
            truncate_string(s.condition.label(), 26),
            s.n,
            s.mean_age,
            s.mean_log10_crtac1,
            s.sd_log10_crtac1
        ));
    }
    output
}
