//! Hospital cohort harmonizer
//!
//! Rows carry a sample id, an age capped below 90 upstream, the raw CRTAC1
//! concentration and two 0/1 indicators (`COVID`, `ICU_1`) that select one of
//! the four hospital conditions.

use arrow::record_batch::RecordBatch;

use crate::config::HospitalColumns;
use crate::error::{AnalysisError, Result};
use crate::models::{PatientCondition, SampleRecord};
use crate::schema::require_columns;
use crate::sources::{HarmonizedTable, SourceHarmonizer, log10_concentration, required};
use crate::utils::arrow::{flag_column, float_column, string_column};

const TABLE: &str = "hospital table";

/// Prefix applied to hospital sample ids
pub const SAMPLE_ID_PREFIX: &str = "hospital_";

/// Harmonizer for the hospital cohort
pub struct HospitalHarmonizer<'a> {
    raw: &'a RecordBatch,
    columns: &'a HospitalColumns,
}

impl<'a> HospitalHarmonizer<'a> {
    #[must_use]
    pub const fn new(raw: &'a RecordBatch, columns: &'a HospitalColumns) -> Self {
        Self { raw, columns }
    }
}

impl SourceHarmonizer for HospitalHarmonizer<'_> {
    fn source_name(&self) -> &'static str {
        "hospital"
    }

    fn harmonize(&self) -> Result<HarmonizedTable> {
        let c = self.columns;
        require_columns(
            self.raw,
            TABLE,
            &[
                c.sample_id.as_str(),
                c.age.as_str(),
                c.crtac1.as_str(),
                c.covid.as_str(),
                c.icu.as_str(),
            ],
        )?;

        let ids = string_column(self.raw, &c.sample_id, TABLE)?;
        let ages = float_column(self.raw, &c.age, TABLE)?;
        let concentrations = float_column(self.raw, &c.crtac1, TABLE)?;
        let covid = flag_column(self.raw, &c.covid, TABLE)?;
        let icu = flag_column(self.raw, &c.icu, TABLE)?;

        let mut records = Vec::with_capacity(self.raw.num_rows());
        for row in 0..self.raw.num_rows() {
            let raw_id = required(ids[row].as_deref(), &c.sample_id, TABLE, row)?;
            let sample_id = format!("{SAMPLE_ID_PREFIX}{raw_id}");

            let condition = covid[row]
                .zip(icu[row])
                .and_then(|(covid, icu)| PatientCondition::from_hospital_flags(covid, icu))
                .ok_or_else(|| {
                    AnalysisError::Schema(format!(
                        "{TABLE} row {row} (sample '{sample_id}'): {}={} and {}={} do not select a hospital condition",
                        c.covid,
                        display_flag(covid[row]),
                        c.icu,
                        display_flag(icu[row]),
                    ))
                })?;

            let age = required(ages[row], &c.age, TABLE, row)?;
            let concentration = required(concentrations[row], &c.crtac1, TABLE, row)?;
            let log10_crtac1_nm = log10_concentration(concentration, &sample_id)?;

            records.push(SampleRecord::new(sample_id, condition, age, log10_crtac1_nm));
        }

        log::info!("Harmonized {} hospital samples", records.len());
        Ok(HarmonizedTable {
            source: self.source_name(),
            records,
            dropped_keys: Vec::new(),
        })
    }
}

fn display_flag(flag: Option<i64>) -> String {
    flag.map_or_else(|| "missing".to_string(), |v| v.to_string())
}
