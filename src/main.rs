use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crtac1_analysis::config::{AnalysisConfig, SourcePaths};
use crtac1_analysis::report::SourceSummary;
use crtac1_analysis::utils::logging::console::print_sample_preview;
use crtac1_analysis::utils::logging::{
    create_spinner, create_stage_progress_bar, finish_progress_bar,
};
use crtac1_analysis::{analyze, harmonize_all, load_sources, load_unified_table, unify};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

/// Harmonize hospital, long COVID and COPD CRTAC1 measurements and model them
/// by condition and age
#[derive(Parser, Debug)]
#[command(name = "crtac1-analysis", version, about)]
struct Args {
    /// JSON analysis configuration; defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the six source CSVs under their default names
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Analyze a previously exported unified table instead of raw sources
    #[arg(long, conflicts_with = "data_dir")]
    unified: Option<PathBuf>,

    /// Write the unified sample table to this CSV file
    #[arg(long)]
    export_unified: Option<PathBuf>,

    /// Write the full report as JSON to this file
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Print a random preview of this many sample rows
    #[arg(long)]
    preview: Option<usize>,

    /// Seed of the random preview
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Treat measurement rows dropped by joins as errors
    #[arg(long)]
    strict_joins: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.sources = SourcePaths::from_data_dir(dir);
    }
    if args.strict_joins {
        config.strict_joins = true;
    }
    config.validate().context("Invalid configuration")?;
    info!("Configuration:\n{config}");

    let (table, report) = if let Some(path) = &args.unified {
        let spinner = create_spinner(Some("Analyzing unified table"));
        let table = load_unified_table(path)
            .with_context(|| format!("Failed to read unified table {}", path.display()))?;
        let report = analyze(&table, &config, Vec::new()).context("Analysis failed")?;
        finish_progress_bar(&spinner, Some("Analysis complete"));
        (table, report)
    } else {
        let pb = create_stage_progress_bar(4, Some("Loading sources"));

        let raw = load_sources(&config.sources).context("Failed to load source files")?;
        pb.inc(1);

        pb.set_message("Harmonizing sources");
        let harmonized = harmonize_all(&raw, &config).context("Harmonization failed")?;
        pb.inc(1);

        pb.set_message("Unifying samples");
        let table = unify(&harmonized).context("Unification failed")?;
        pb.inc(1);

        pb.set_message("Running analyses");
        let sources = harmonized.iter().map(SourceSummary::from).collect();
        let report = analyze(&table, &config, sources).context("Analysis failed")?;
        pb.inc(1);

        finish_progress_bar(&pb, Some("Analysis complete"));
        (table, report)
    };

    if let Some(path) = &args.export_unified {
        table
            .write_csv(path)
            .with_context(|| format!("Failed to export unified table to {}", path.display()))?;
    }

    if let Some(n) = args.preview {
        print_sample_preview(&table, n, args.seed);
        println!();
    }

    println!("{}", report.render_text());

    if let Some(path) = &args.report_json {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(())
}
