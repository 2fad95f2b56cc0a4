//! Harmonized sample records and the unified sample table

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::util::safe_create_file;
use crate::error::{AnalysisError, Result};
use crate::models::types::PatientCondition;
use crate::utils::arrow::extractors::{float_column, string_column};

/// Column holding the sample identifier
pub const SAMPLE_ID: &str = "sample_id";
/// Column holding the patient condition label
pub const PATIENT_CONDITION: &str = "patient_condition";
/// Column holding the age in years
pub const AGE: &str = "age";
/// Column holding the log10 CRTAC1 concentration
pub const LOG10_CRTAC1_NM: &str = "log10_CRTAC1_nm";

/// One harmonized biomarker measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Source-prefixed sample identifier, unique within a unified table
    pub sample_id: String,
    /// Condition of the patient the sample was drawn from
    pub patient_condition: PatientCondition,
    /// Age in years at sample collection
    pub age: f64,
    /// Base-10 logarithm of the ELISA CRTAC1 concentration in nM
    #[serde(rename = "log10_CRTAC1_nm")]
    pub log10_crtac1_nm: f64,
}

impl SampleRecord {
    #[must_use]
    pub fn new(
        sample_id: impl Into<String>,
        patient_condition: PatientCondition,
        age: f64,
        log10_crtac1_nm: f64,
    ) -> Self {
        Self {
            sample_id: sample_id.into(),
            patient_condition,
            age,
            log10_crtac1_nm,
        }
    }
}

/// Row layout used when converting to Arrow
#[derive(Serialize)]
struct SampleRow<'a> {
    sample_id: &'a str,
    patient_condition: &'static str,
    age: f64,
    #[serde(rename = "log10_CRTAC1_nm")]
    log10_crtac1_nm: f64,
}

/// The unified sample table
///
/// Row order is the concatenation order of the harmonized sources and is
/// preserved by every operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    records: Vec<SampleRecord>,
}

impl SampleTable {
    #[must_use]
    pub const fn new(records: Vec<SampleRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records.iter()
    }

    /// Arrow schema of the unified table
    #[must_use]
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new(SAMPLE_ID, DataType::Utf8, false),
            Field::new(PATIENT_CONDITION, DataType::Utf8, false),
            Field::new(AGE, DataType::Float64, false),
            Field::new(LOG10_CRTAC1_NM, DataType::Float64, false),
        ]))
    }

    /// Conditions with at least one sample, in level order
    #[must_use]
    pub fn conditions_present(&self) -> Vec<PatientCondition> {
        self.records
            .iter()
            .map(|r| r.patient_condition)
            .unique()
            .sorted()
            .collect()
    }

    /// Samples grouped by condition, groups in level order and rows in table order
    #[must_use]
    pub fn grouped(&self) -> BTreeMap<PatientCondition, Vec<&SampleRecord>> {
        self.records
            .iter()
            .into_group_map_by(|r| r.patient_condition)
            .into_iter()
            .collect()
    }

    /// `log10_CRTAC1_nm` values of one condition, in table order
    #[must_use]
    pub fn biomarker_values(&self, condition: PatientCondition) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.patient_condition == condition)
            .map(|r| r.log10_crtac1_nm)
            .collect()
    }

    /// Mean age across all samples, `None` for an empty table
    #[must_use]
    pub fn mean_age(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.records.iter().map(|r| r.age).sum::<f64>() / self.records.len() as f64)
    }

    /// Convert the table to an Arrow record batch with the 4-column schema
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let rows: Vec<SampleRow<'_>> = self
            .records
            .iter()
            .map(|r| SampleRow {
                sample_id: &r.sample_id,
                patient_condition: r.patient_condition.label(),
                age: r.age,
                log10_crtac1_nm: r.log10_crtac1_nm,
            })
            .collect();

        serde_arrow::to_record_batch(Self::schema().fields(), &rows).map_err(|e| {
            AnalysisError::Schema(format!("failed to build unified record batch: {e}"))
        })
    }

    /// Rebuild a table from a record batch with the 4-column schema
    ///
    /// Numeric columns are cast to `Float64`; condition labels outside the
    /// closed domain and repeated sample ids are schema errors.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let table = "unified table";
        let ids = string_column(batch, SAMPLE_ID, table)?;
        let conditions = string_column(batch, PATIENT_CONDITION, table)?;
        let ages = float_column(batch, AGE, table)?;
        let values = float_column(batch, LOG10_CRTAC1_NM, table)?;

        let mut seen = FxHashSet::default();
        let mut records = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let missing =
                |column: &str| AnalysisError::Schema(format!("missing {column} in {table} row {row}"));
            let sample_id = ids[row].clone().ok_or_else(|| missing(SAMPLE_ID))?;
            if !seen.insert(sample_id.clone()) {
                return Err(AnalysisError::Schema(format!(
                    "duplicate sample_id '{sample_id}' in {table} row {row}"
                )));
            }
            let condition = conditions[row]
                .as_deref()
                .ok_or_else(|| missing(PATIENT_CONDITION))?
                .parse::<PatientCondition>()?;
            let age = ages[row].ok_or_else(|| missing(AGE))?;
            let value = values[row].ok_or_else(|| missing(LOG10_CRTAC1_NM))?;
            records.push(SampleRecord::new(sample_id, condition, age, value));
        }

        Ok(Self::new(records))
    }

    /// Write the table as a header-bearing CSV file
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let batch = self.to_record_batch()?;
        let file = safe_create_file(path, "exporting the unified sample table")?;
        let mut writer = arrow::csv::WriterBuilder::new()
            .with_header(true)
            .build(file);
        writer.write(&batch)?;
        log::info!("Exported {} samples to {}", self.len(), path.display());
        Ok(())
    }
}

impl FromIterator<SampleRecord> for SampleTable {
    fn from_iter<I: IntoIterator<Item = SampleRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
