//! COPD cohort harmonizer
//!
//! CRTAC1 measurements keyed by patient number are joined to a separate ages
//! table. Every row is a COPD sample.

use arrow::record_batch::RecordBatch;

use crate::config::CopdColumns;
use crate::error::Result;
use crate::models::{PatientCondition, SampleRecord};
use crate::schema::require_columns;
use crate::sources::join::inner_join;
use crate::sources::{
    HarmonizedTable, SourceHarmonizer, log10_concentration, report_dropped_keys, required,
};
use crate::utils::arrow::{float_column, string_column};

const MEASUREMENTS: &str = "COPD measurement table";
const AGES: &str = "COPD ages table";

/// Prefix applied to COPD sample ids
pub const SAMPLE_ID_PREFIX: &str = "copd_";

/// Harmonizer for the COPD cohort
pub struct CopdHarmonizer<'a> {
    measurements: &'a RecordBatch,
    ages: &'a RecordBatch,
    columns: &'a CopdColumns,
    strict_joins: bool,
}

impl<'a> CopdHarmonizer<'a> {
    #[must_use]
    pub const fn new(
        measurements: &'a RecordBatch,
        ages: &'a RecordBatch,
        columns: &'a CopdColumns,
    ) -> Self {
        Self {
            measurements,
            ages,
            columns,
            strict_joins: false,
        }
    }

    /// Fail instead of warning when measurements have no age
    #[must_use]
    pub const fn with_strict_joins(mut self, strict: bool) -> Self {
        self.strict_joins = strict;
        self
    }
}

impl SourceHarmonizer for CopdHarmonizer<'_> {
    fn source_name(&self) -> &'static str {
        "COPD"
    }

    fn harmonize(&self) -> Result<HarmonizedTable> {
        let c = self.columns;
        require_columns(
            self.measurements,
            MEASUREMENTS,
            &[c.patient_no.as_str(), c.crtac1.as_str()],
        )?;
        require_columns(self.ages, AGES, &[c.ages_id.as_str(), c.age.as_str()])?;

        let patient_nos = string_column(self.measurements, &c.patient_no, MEASUREMENTS)?;
        let concentrations = float_column(self.measurements, &c.crtac1, MEASUREMENTS)?;
        let age_ids = string_column(self.ages, &c.ages_id, AGES)?;
        let ages = float_column(self.ages, &c.age, AGES)?;

        let joined = inner_join(&patient_nos, &age_ids);

        let mut records = Vec::with_capacity(joined.pairs.len());
        for &(m_row, age_row) in &joined.pairs {
            let patient_no = required(patient_nos[m_row].as_deref(), &c.patient_no, MEASUREMENTS, m_row)?;
            let sample_id = format!("{SAMPLE_ID_PREFIX}{patient_no}");
            let age = required(ages[age_row], &c.age, AGES, age_row)?;
            let concentration = required(concentrations[m_row], &c.crtac1, MEASUREMENTS, m_row)?;
            let log10_crtac1_nm = log10_concentration(concentration, &sample_id)?;

            records.push(SampleRecord::new(
                sample_id,
                PatientCondition::Copd,
                age,
                log10_crtac1_nm,
            ));
        }

        let dropped_keys = joined.dropped_keys(&patient_nos);
        report_dropped_keys(self.source_name(), &dropped_keys, self.strict_joins)?;

        log::info!("Harmonized {} COPD samples", records.len());
        Ok(HarmonizedTable {
            source: self.source_name(),
            records,
            dropped_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use arrow::array::{ArrayRef, Float64Array, Int64Array};
    use std::sync::Arc;

    fn measurements(patients: Vec<i64>, values: Vec<f64>) -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            ("Patient_No", Arc::new(Int64Array::from(patients)) as ArrayRef),
            ("CRTAC1_ELISA_nM", Arc::new(Float64Array::from(values)) as ArrayRef),
        ])
        .unwrap()
    }

    fn ages(ids: Vec<i64>, ages: Vec<i64>) -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            ("COPD_ID", Arc::new(Int64Array::from(ids)) as ArrayRef),
            ("Age", Arc::new(Int64Array::from(ages)) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_join_prefixes_ids_and_sets_condition() {
        let m = measurements(vec![3, 1, 4], vec![10.0, 1.0, 5.0]);
        let a = ages(vec![1, 3], vec![71, 64]);
        let columns = CopdColumns::default();
        let table = CopdHarmonizer::new(&m, &a, &columns).harmonize().unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].sample_id, "copd_3");
        assert_eq!(table.records[0].age, 64.0);
        assert!((table.records[0].log10_crtac1_nm - 1.0).abs() < 1e-12);
        assert_eq!(table.records[1].sample_id, "copd_1");
        assert!(
            table
                .records
                .iter()
                .all(|r| r.patient_condition == PatientCondition::Copd)
        );
        assert_eq!(table.dropped_keys, vec!["4".to_string()]);
    }

    #[test]
    fn test_missing_age_column_is_schema_error() {
        let m = measurements(vec![1], vec![1.0]);
        let a = RecordBatch::try_from_iter(vec![(
            "COPD_ID",
            Arc::new(Int64Array::from(vec![1])) as ArrayRef,
        )])
        .unwrap();
        let columns = CopdColumns::default();
        let err = CopdHarmonizer::new(&m, &a, &columns).harmonize().unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
        assert!(err.to_string().contains("'Age'"));
    }
}
