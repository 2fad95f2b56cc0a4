//! Concatenation of harmonized tables into the unified sample table

use rustc_hash::FxHashSet;

use crate::error::{AnalysisError, Result};
use crate::models::SampleTable;
use crate::sources::HarmonizedTable;

/// Concatenate harmonized tables in the given order
///
/// The unified table keeps every input row and its order, so the row count is
/// the sum of the inputs and the result is deterministic.
///
/// # Errors
/// Returns [`AnalysisError::Schema`] when a `sample_id` occurs more than once.
pub fn unify(tables: &[HarmonizedTable]) -> Result<SampleTable> {
    let total: usize = tables.iter().map(HarmonizedTable::len).sum();
    let mut seen = FxHashSet::default();
    seen.reserve(total);

    let mut records = Vec::with_capacity(total);
    for table in tables {
        for record in &table.records {
            if !seen.insert(record.sample_id.as_str()) {
                return Err(AnalysisError::Schema(format!(
                    "duplicate sample_id '{}' (from {} source)",
                    record.sample_id, table.source
                )));
            }
            records.push(record.clone());
        }
        log::debug!("Unified {} rows from {} source", table.len(), table.source);
    }

    log::info!(
        "Unified sample table: {} rows from {} sources",
        records.len(),
        tables.len()
    );
    Ok(SampleTable::new(records))
}
