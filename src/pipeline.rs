//! End-to-end analysis pipeline
//!
//! Load -> harmonize -> unify -> analyze. Each stage is exposed separately so
//! callers (the binary's progress display, tests) can drive them one by one;
//! [`run`] chains them.

use std::path::Path;

use chrono::Utc;

use crate::algorithm::{
    ContrastSpec, LinearModel, NormalRange, estimated_marginal_means, evaluate_contrasts,
    normality_by_condition, summarize_groups,
};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::loader::{RawSources, load_sources, read_csv};
use crate::models::SampleTable;
use crate::report::{AnalysisReport, SourceSummary};
use crate::sources::{
    CopdHarmonizer, HarmonizedTable, HospitalHarmonizer, LongCovidHarmonizer, SourceHarmonizer,
    unify,
};

/// Harmonize every raw source, in unification order
pub fn harmonize_all(raw: &RawSources, config: &AnalysisConfig) -> Result<Vec<HarmonizedTable>> {
    let columns = &config.columns;
    let harmonizers: [Box<dyn SourceHarmonizer + '_>; 3] = [
        Box::new(HospitalHarmonizer::new(&raw.hospital, &columns.hospital)),
        Box::new(
            LongCovidHarmonizer::new(
                &raw.long_covid_measurements,
                &raw.long_covid_metadata_copd,
                &raw.long_covid_metadata,
                &columns.long_covid,
            )
            .with_strict_joins(config.strict_joins),
        ),
        Box::new(
            CopdHarmonizer::new(&raw.copd_measurements, &raw.copd_ages, &columns.copd)
                .with_strict_joins(config.strict_joins),
        ),
    ];

    harmonizers.iter().map(|h| h.harmonize()).collect()
}

/// Run every analysis on a unified table
///
/// # Arguments
/// * `table` - Unified sample table
/// * `config` - Analysis settings (group size, range multiplier, contrasts)
/// * `sources` - Per-source counts for the report; empty for a pre-unified
///   table
pub fn analyze(
    table: &SampleTable,
    config: &AnalysisConfig,
    sources: Vec<SourceSummary>,
) -> Result<AnalysisReport> {
    let group_summaries = summarize_groups(table, config.min_group_size)?;

    let normal_range =
        NormalRange::from_table(table, config.normal_range_multiplier, config.min_group_size)?;
    let range_counts = normal_range.range_counts(table);

    let model = LinearModel::fit(table)?;
    let marginal_means = estimated_marginal_means(&model)?;

    let specs = config
        .contrasts
        .iter()
        .map(ContrastSpec::from_config)
        .collect::<Result<Vec<_>>>()?;
    let contrasts = evaluate_contrasts(&model, &specs)?;

    let normality = normality_by_condition(table, config.min_group_size)?;

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        total_samples: table.len(),
        sources,
        group_summaries,
        normal_range,
        range_counts,
        model,
        marginal_means,
        contrasts,
        normality,
    })
}

/// Load and harmonize the configured sources into the unified table
pub fn build_unified_table(config: &AnalysisConfig) -> Result<(SampleTable, Vec<SourceSummary>)> {
    let raw = load_sources(&config.sources)?;
    let harmonized = harmonize_all(&raw, config)?;
    let table = unify(&harmonized)?;
    let sources = harmonized.iter().map(SourceSummary::from).collect();
    Ok((table, sources))
}

/// Read a previously exported unified table
///
/// Condition labels outside the closed domain are a schema error.
pub fn load_unified_table(path: &Path) -> Result<SampleTable> {
    let batch = read_csv(path)?;
    let table = SampleTable::from_record_batch(&batch)?;
    log::info!("Loaded unified table with {} samples", table.len());
    Ok(table)
}

/// Run the whole pipeline from raw sources to report
pub fn run(config: &AnalysisConfig) -> Result<(SampleTable, AnalysisReport)> {
    let (table, sources) = build_unified_table(config)?;
    let report = analyze(&table, config, sources)?;
    Ok((table, report))
}
