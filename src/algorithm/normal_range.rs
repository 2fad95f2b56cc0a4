//! Reference interval of the healthy group
//!
//! The normal range is `mean ± k·sd` of `log10_CRTAC1_nm` over healthy samples
//! (sample sd, `k = 3` by default). It is a reference only and never enters
//! the model.

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::models::{PatientCondition, SampleTable};
use crate::utils::logging::console::truncate_string;
use crate::utils::{mean, sample_std};

/// Healthy-group reference interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalRange {
    /// Number of healthy samples used
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    /// Multiple of `sd` on each side of the mean
    pub multiplier: f64,
    pub low: f64,
    pub high: f64,
}

/// Position of a value relative to the normal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePosition {
    Below,
    Within,
    Above,
}

/// Counts of samples below, within and above the range for one condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeCounts {
    pub condition: PatientCondition,
    pub below: usize,
    pub within: usize,
    pub above: usize,
}

impl NormalRange {
    /// Compute the range from raw healthy values
    ///
    /// # Arguments
    /// * `values` - Healthy `log10_CRTAC1_nm` values
    /// * `multiplier` - Number of standard deviations on each side
    /// * `min_group_size` - Smallest acceptable number of values
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] below `min_group_size`
    /// values (or below two, which the sd needs).
    pub fn from_values(values: &[f64], multiplier: f64, min_group_size: usize) -> Result<Self> {
        let required = min_group_size.max(2);
        if values.len() < required {
            return Err(AnalysisError::InsufficientData(format!(
                "normal range needs at least {required} healthy samples, found {}",
                values.len()
            )));
        }

        let (Some(mean), Some(sd)) = (mean(values), sample_std(values)) else {
            return Err(AnalysisError::InsufficientData(
                "normal range needs at least two healthy samples".to_string(),
            ));
        };

        Ok(Self {
            n: values.len(),
            mean,
            sd,
            multiplier,
            low: multiplier.mul_add(-sd, mean),
            high: multiplier.mul_add(sd, mean),
        })
    }

    /// Compute the range from the healthy rows of a unified table
    ///
    /// # Errors
    /// See [`NormalRange::from_values`].
    pub fn from_table(table: &SampleTable, multiplier: f64, min_group_size: usize) -> Result<Self> {
        let values = table.biomarker_values(PatientCondition::Healthy);
        let range = Self::from_values(&values, multiplier, min_group_size)?;
        log::info!(
            "Normal range from {} healthy samples: [{:.4}, {:.4}]",
            range.n,
            range.low,
            range.high
        );
        Ok(range)
    }

    /// Classify a value against the range; the bounds belong to the range
    #[must_use]
    pub fn classify(&self, value: f64) -> RangePosition {
        if value < self.low {
            RangePosition::Below
        } else if value > self.high {
            RangePosition::Above
        } else {
            RangePosition::Within
        }
    }

    /// Per-condition counts of samples against the range, in level order
    #[must_use]
    pub fn range_counts(&self, table: &SampleTable) -> Vec<RangeCounts> {
        table
            .grouped()
            .into_iter()
            .map(|(condition, records)| {
                let mut counts = RangeCounts {
                    condition,
                    below: 0,
                    within: 0,
                    above: 0,
                };
                for record in records {
                    match self.classify(record.log10_crtac1_nm) {
                        RangePosition::Below => counts.below += 1,
                        RangePosition::Within => counts.within += 1,
                        RangePosition::Above => counts.above += 1,
                    }
                }
                counts
            })
            .collect()
    }
}

/// Render the range and per-condition counts as plain text
#[must_use]
pub fn format_normal_range(range: &NormalRange, counts: &[RangeCounts]) -> String {
    let mut output = format!(
        "Normal range (healthy, n = {}): mean {:.4}, sd {:.4}, mean ± {} sd = [{:.4}, {:.4}]\n\n",
        range.n, range.mean, range.sd, range.multiplier, range.low, range.high
    );
    output.push_str(
        "Condition                  | Below | Within | Above\n\
         ---------------------------|-------|--------|------\n",
    );
    for c in counts {
        output.push_str(&format!(
            "{:<26} | {:>5} | {:>6} | {:>5}\n",
            truncate_string(c.condition.label(), 26),
            c.below,
            c.within,
            c.above
        ));
    }
    output
}
