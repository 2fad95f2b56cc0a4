//! Analysis report
//!
//! Collects every analysis result of a run into one serializable structure,
//! renders it as plain-text tables and writes it as JSON.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::algorithm::contrast::format_contrasts;
use crate::algorithm::emmeans::format_marginal_means;
use crate::algorithm::normal_range::format_normal_range;
use crate::algorithm::normality::format_normality;
use crate::algorithm::summary::format_group_summaries;
use crate::algorithm::{
    ContrastResult, GroupSummary, LinearModel, MarginalMean, NormalRange, NormalityResult,
    RangeCounts,
};
use crate::error::util::safe_create_file;
use crate::error::{AnalysisError, Result};
use crate::sources::HarmonizedTable;

/// Row count and join losses of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub rows: usize,
    /// Measurement keys dropped by inner joins
    pub dropped_keys: Vec<String>,
}

impl From<&HarmonizedTable> for SourceSummary {
    fn from(table: &HarmonizedTable) -> Self {
        Self {
            source: table.source.to_string(),
            rows: table.len(),
            dropped_keys: table.dropped_keys.clone(),
        }
    }
}

/// All results of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub total_samples: usize,
    /// Per-source counts; empty when a unified table was analyzed directly
    pub sources: Vec<SourceSummary>,
    pub group_summaries: Vec<GroupSummary>,
    pub normal_range: NormalRange,
    pub range_counts: Vec<RangeCounts>,
    pub model: LinearModel,
    pub marginal_means: Vec<MarginalMean>,
    pub contrasts: Vec<ContrastResult>,
    pub normality: Vec<NormalityResult>,
}

impl AnalysisReport {
    /// Every dropped join key, prefixed by its source
    #[must_use]
    pub fn dropped_keys(&self) -> Vec<String> {
        self.sources
            .iter()
            .flat_map(|s| s.dropped_keys.iter().map(move |k| format!("{}: {k}", s.source)))
            .collect()
    }

    /// Render the report as plain-text tables
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut output = format!(
            "CRTAC1 analysis report ({})\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        if !self.sources.is_empty() {
            output.push_str(
                "Source          | Rows | Dropped keys\n\
                 ----------------|------|-------------\n",
            );
            for s in &self.sources {
                output.push_str(&format!(
                    "{:<15} | {:>4} | {}\n",
                    s.source,
                    s.rows,
                    if s.dropped_keys.is_empty() {
                        "-".to_string()
                    } else {
                        s.dropped_keys.join(", ")
                    }
                ));
            }
        }
        output.push_str(&format!("Total samples: {}\n\n", self.total_samples));

        output.push_str(&format_group_summaries(&self.group_summaries));
        output.push('\n');
        output.push_str(&format_normal_range(&self.normal_range, &self.range_counts));
        output.push('\n');
        output.push_str("Linear model: log10_CRTAC1_nm ~ patient_condition + age\n\n");
        output.push_str(&self.model.format_table());
        output.push('\n');
        output.push_str(&format_marginal_means(
            &self.marginal_means,
            self.model.mean_age,
        ));
        output.push('\n');
        output.push_str(&format_contrasts(&self.contrasts));
        output.push('\n');
        output.push_str(&format_normality(&self.normality));
        output
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut file = safe_create_file(path, "writing the JSON report")?;
        serde_json::to_writer_pretty(&mut file, self).map_err(|e| {
            AnalysisError::io_error(format!("Failed to serialize report: {e}")).with_path(path)
        })?;
        writeln!(file).map_err(|e| {
            AnalysisError::io_error_with_source("Failed to write report", e).with_path(path)
        })?;
        log::info!("Wrote JSON report to {}", path.display());
        Ok(())
    }
}
