//! Source harmonizers
//!
//! Each raw cohort is projected into the common sample schema
//! `{sample_id, patient_condition, age, log10_CRTAC1_nm}` by its own
//! harmonizer:
//! - Hospital: COVID/ICU indicator pair decides the condition
//! - Long COVID: measurements joined to two metadata tables, condition from
//!   the sample id and COPD flag
//! - COPD: measurements joined to an ages table, constant condition
//!
//! Harmonizers do no cross-source validation; that is the job of
//! [`unify::unify`].

pub mod copd;
pub mod hospital;
pub mod join;
pub mod long_covid;
pub mod unify;

use crate::error::{AnalysisError, Result};
use crate::models::SampleRecord;
use crate::utils::logging::{dropped_keys_message, log_dropped_keys};

pub use copd::CopdHarmonizer;
pub use hospital::HospitalHarmonizer;
pub use long_covid::LongCovidHarmonizer;
pub use unify::unify;

/// Output of one harmonizer
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonizedTable {
    /// Name of the source cohort
    pub source: &'static str,
    /// Harmonized rows in source order
    pub records: Vec<SampleRecord>,
    /// Measurement keys dropped by inner joins, in source order
    pub dropped_keys: Vec<String>,
}

impl HarmonizedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Base trait for source harmonizers
pub trait SourceHarmonizer {
    /// Name of the source cohort
    fn source_name(&self) -> &'static str;

    /// Project the raw tables into harmonized sample records
    fn harmonize(&self) -> Result<HarmonizedTable>;
}

/// Base-10 log of a raw CRTAC1 concentration
///
/// # Errors
/// Returns [`AnalysisError::Domain`] for zero, negative or non-finite values.
pub fn log10_concentration(value: f64, sample_id: &str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AnalysisError::Domain(format!(
            "CRTAC1 concentration for sample '{sample_id}' must be a positive number, got {value}"
        )));
    }
    Ok(value.log10())
}

/// Unwrap a required cell or fail with a schema error naming the row
pub(crate) fn required<T>(value: Option<T>, column: &str, table: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        AnalysisError::Schema(format!("missing value in column '{column}' of {table}, row {row}"))
    })
}

/// Surface keys dropped by an inner join
///
/// Drops are logged as a warning; with `strict` they become a schema error.
pub(crate) fn report_dropped_keys(source: &str, dropped: &[String], strict: bool) -> Result<()> {
    if dropped.is_empty() {
        return Ok(());
    }

    if strict {
        return Err(AnalysisError::Schema(dropped_keys_message(source, dropped)));
    }
    log_dropped_keys(source, dropped);
    Ok(())
}
