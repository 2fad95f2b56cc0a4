//! Harmonization and analysis of CRTAC1 biomarker measurements.
//!
//! Three clinical cohorts (hospital COVID patients, long-COVID patients, COPD
//! patients) are loaded from CSV, projected into one sample table and
//! analyzed: group summaries, a healthy normal range, an additive linear model
//! of `log10_CRTAC1_nm` on condition and age, estimated marginal means,
//! Šidák-adjusted contrasts and per-group Shapiro-Wilk tests.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod sources;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{AnalysisConfig, ContrastConfig, SourcePaths};
pub use error::{AnalysisError, Result};
pub use models::{PatientCondition, SampleRecord, SampleTable};
pub use report::AnalysisReport;

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Pipeline stages
pub use loader::{RawSources, load_sources, read_csv};
pub use pipeline::{analyze, build_unified_table, harmonize_all, load_unified_table, run};
pub use sources::{HarmonizedTable, SourceHarmonizer, unify};
