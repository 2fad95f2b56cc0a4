//! Long-COVID cohort harmonizer
//!
//! Measurements are joined by subject id to two metadata tables. Table A
//! carries a COPD flag; table B does not and counts as COPD-negative. Both
//! joined subsets are stacked, A first. Measurements found in neither table
//! are dropped and reported.

use arrow::record_batch::RecordBatch;

use crate::config::LongCovidColumns;
use crate::error::{AnalysisError, Result};
use crate::models::{PatientCondition, SampleRecord};
use crate::schema::require_columns;
use crate::sources::join::{inner_join, key_label};
use crate::sources::{
    HarmonizedTable, SourceHarmonizer, log10_concentration, report_dropped_keys, required,
};
use crate::utils::arrow::{float_column, string_column};

const MEASUREMENTS: &str = "long COVID measurement table";
const METADATA_COPD: &str = "long COVID metadata table (with COPD flag)";
const METADATA: &str = "long COVID metadata table";

/// Id marker of healthy controls
const HEALTHY_MARKER: &str = "H";
/// Id marker of long-COVID patients
const LONG_COVID_MARKER: &str = "LC";

/// Condition of a long-COVID cohort sample from its id and COPD status
///
/// The checks run in order and later matches override earlier ones: an id
/// containing `LC` is long COVID even if it also contains `H`, and long COVID
/// with COPD overrides plain long COVID.
#[must_use]
pub fn condition_from_sample_id(sample_id: &str, has_copd: bool) -> Option<PatientCondition> {
    let mut condition = None;
    if sample_id.contains(HEALTHY_MARKER) {
        condition = Some(PatientCondition::Healthy);
    }
    if sample_id.contains(LONG_COVID_MARKER) {
        condition = Some(PatientCondition::LongCovid);
    }
    if sample_id.contains(LONG_COVID_MARKER) && has_copd {
        condition = Some(PatientCondition::LongCovidCopd);
    }
    condition
}

/// Harmonizer for the long-COVID cohort
pub struct LongCovidHarmonizer<'a> {
    measurements: &'a RecordBatch,
    metadata_copd: &'a RecordBatch,
    metadata: &'a RecordBatch,
    columns: &'a LongCovidColumns,
    strict_joins: bool,
}

impl<'a> LongCovidHarmonizer<'a> {
    #[must_use]
    pub const fn new(
        measurements: &'a RecordBatch,
        metadata_copd: &'a RecordBatch,
        metadata: &'a RecordBatch,
        columns: &'a LongCovidColumns,
    ) -> Self {
        Self {
            measurements,
            metadata_copd,
            metadata,
            columns,
            strict_joins: false,
        }
    }

    /// Fail instead of warning when measurements have no metadata
    #[must_use]
    pub const fn with_strict_joins(mut self, strict: bool) -> Self {
        self.strict_joins = strict;
        self
    }
}

impl SourceHarmonizer for LongCovidHarmonizer<'_> {
    fn source_name(&self) -> &'static str {
        "long COVID"
    }

    fn harmonize(&self) -> Result<HarmonizedTable> {
        let c = self.columns;
        require_columns(
            self.measurements,
            MEASUREMENTS,
            &[c.measurement_id.as_str(), c.crtac1.as_str()],
        )?;
        require_columns(
            self.metadata_copd,
            METADATA_COPD,
            &[c.metadata_id.as_str(), c.age.as_str(), c.copd_flag.as_str()],
        )?;
        require_columns(
            self.metadata,
            METADATA,
            &[c.metadata_id.as_str(), c.age.as_str()],
        )?;

        let ids = string_column(self.measurements, &c.measurement_id, MEASUREMENTS)?;
        let concentrations = float_column(self.measurements, &c.crtac1, MEASUREMENTS)?;

        let copd_ids = string_column(self.metadata_copd, &c.metadata_id, METADATA_COPD)?;
        let copd_ages = float_column(self.metadata_copd, &c.age, METADATA_COPD)?;
        let copd_flags = string_column(self.metadata_copd, &c.copd_flag, METADATA_COPD)?;

        let plain_ids = string_column(self.metadata, &c.metadata_id, METADATA)?;
        let plain_ages = float_column(self.metadata, &c.age, METADATA)?;

        let with_flag = inner_join(&ids, &copd_ids);
        let without_flag = inner_join(&ids, &plain_ids);

        let mut records = Vec::with_capacity(with_flag.pairs.len() + without_flag.pairs.len());

        for &(m_row, meta_row) in &with_flag.pairs {
            let has_copd = copd_flags[meta_row].as_deref() == Some(c.copd_positive.as_str());
            let age = required(copd_ages[meta_row], &c.age, METADATA_COPD, meta_row)?;
            records.push(self.record(&ids, &concentrations, m_row, age, has_copd)?);
        }

        for &(m_row, meta_row) in &without_flag.pairs {
            let age = required(plain_ages[meta_row], &c.age, METADATA, meta_row)?;
            records.push(self.record(&ids, &concentrations, m_row, age, false)?);
        }

        let dropped_keys: Vec<String> = with_flag
            .unmatched_left
            .iter()
            .filter(|row| without_flag.unmatched_left.contains(*row))
            .map(|&row| key_label(&ids, row))
            .collect();
        report_dropped_keys(self.source_name(), &dropped_keys, self.strict_joins)?;

        log::info!(
            "Harmonized {} long COVID samples ({} with COPD metadata, {} without)",
            records.len(),
            with_flag.pairs.len(),
            without_flag.pairs.len()
        );

        Ok(HarmonizedTable {
            source: self.source_name(),
            records,
            dropped_keys,
        })
    }
}

impl LongCovidHarmonizer<'_> {
    fn record(
        &self,
        ids: &[Option<String>],
        concentrations: &[Option<f64>],
        row: usize,
        age: f64,
        has_copd: bool,
    ) -> Result<SampleRecord> {
        let c = self.columns;
        // Joined rows always have a key
        let sample_id = required(ids[row].clone(), &c.measurement_id, MEASUREMENTS, row)?;

        let condition = condition_from_sample_id(&sample_id, has_copd).ok_or_else(|| {
            AnalysisError::Schema(format!(
                "{MEASUREMENTS} row {row}: sample id '{sample_id}' contains neither \
                 '{HEALTHY_MARKER}' nor '{LONG_COVID_MARKER}'"
            ))
        })?;

        let concentration = required(concentrations[row], &c.crtac1, MEASUREMENTS, row)?;
        let log10_crtac1_nm = log10_concentration(concentration, &sample_id)?;

        Ok(SampleRecord::new(sample_id, condition, age, log10_crtac1_nm))
    }
}
