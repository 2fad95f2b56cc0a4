//! CSV source loading
//!
//! Reads the raw delimited sources into Arrow record batches. Column types are
//! inferred from every row, so integer ids, numeric measurements and text
//! flags arrive with their natural Arrow types.

use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::config::SourcePaths;
use crate::error::util::safe_open_file;
use crate::error::{AnalysisError, Result};
use crate::utils::logging::{log_read_complete, log_read_start};

/// Rows per batch while parsing; batches are concatenated afterwards
const CSV_BATCH_SIZE: usize = 1024;

/// The six raw tables, unmodified apart from CSV parsing
#[derive(Debug, Clone)]
pub struct RawSources {
    pub hospital: RecordBatch,
    pub long_covid_measurements: RecordBatch,
    pub long_covid_metadata_copd: RecordBatch,
    pub long_covid_metadata: RecordBatch,
    pub copd_measurements: RecordBatch,
    pub copd_ages: RecordBatch,
}

/// Read a header-bearing, comma-separated file into a single record batch
///
/// # Errors
/// Returns [`AnalysisError::Io`] carrying the path when the file is missing or
/// unreadable, has rows with an inconsistent number of fields, or contains
/// invalid UTF-8.
pub fn read_csv(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();
    log_read_start("CSV source", path);

    let malformed =
        |e: ArrowError| AnalysisError::io_error(format!("Malformed CSV: {e}")).with_path(path);

    let mut file = safe_open_file(path, "reading a CSV source")?;
    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(&mut file, None).map_err(malformed)?;
    file.rewind().map_err(|e| {
        AnalysisError::io_error_with_source("Failed to rewind after schema inference", e)
            .with_path(path)
    })?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(CSV_BATCH_SIZE)
        .build(file)
        .map_err(malformed)?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(malformed)?;
    let batch = concat_batches(&schema, &batches)?;

    log_read_complete("CSV source", path, batch.num_rows(), start.elapsed());
    Ok(batch)
}

/// Read all six raw sources
pub fn load_sources(paths: &SourcePaths) -> Result<RawSources> {
    Ok(RawSources {
        hospital: read_csv(&paths.hospital)?,
        long_covid_measurements: read_csv(&paths.long_covid_measurements)?,
        long_covid_metadata_copd: read_csv(&paths.long_covid_metadata_copd)?,
        long_covid_metadata: read_csv(&paths.long_covid_metadata)?,
        copd_measurements: read_csv(&paths.copd_measurements)?,
        copd_ages: read_csv(&paths.copd_ages)?,
    })
}
