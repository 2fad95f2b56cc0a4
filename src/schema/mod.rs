//! Column presence checks for raw source tables.
//!
//! Raw files have documented but uncontrolled schemas. Each harmonizer states
//! the columns it reads and checks them before transmuting, so a missing
//! column fails loudly with every absent name listed at once.

use arrow::record_batch::RecordBatch;

use crate::error::{AnalysisError, Result};

/// A required column that is absent from a raw table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Table the column was expected in
    pub table: String,
    /// The missing column
    pub column: String,
}

/// Result of checking a raw table against its required columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCompatibilityReport {
    /// Whether every required column is present
    pub compatible: bool,
    /// Missing columns, in the order they were required
    pub issues: Vec<SchemaIssue>,
}

impl SchemaCompatibilityReport {
    /// Turn an incompatible report into a schema error
    pub fn into_result(self) -> Result<()> {
        if self.compatible {
            return Ok(());
        }
        let table = self
            .issues
            .first()
            .map(|i| i.table.clone())
            .unwrap_or_default();
        let columns = self
            .issues
            .iter()
            .map(|i| format!("'{}'", i.column))
            .collect::<Vec<_>>()
            .join(", ");
        Err(AnalysisError::Schema(format!(
            "{table} is missing required column(s): {columns}"
        )))
    }
}

/// Check that `batch` carries every column in `required`
#[must_use]
pub fn check_required_columns(
    batch: &RecordBatch,
    table: &str,
    required: &[&str],
) -> SchemaCompatibilityReport {
    let schema = batch.schema();
    let issues: Vec<SchemaIssue> = required
        .iter()
        .filter(|column| schema.index_of(column).is_err())
        .map(|column| SchemaIssue {
            table: table.to_string(),
            column: (*column).to_string(),
        })
        .collect();

    SchemaCompatibilityReport {
        compatible: issues.is_empty(),
        issues,
    }
}

/// Fail with a schema error unless `batch` carries every column in `required`
pub fn require_columns(batch: &RecordBatch, table: &str, required: &[&str]) -> Result<()> {
    check_required_columns(batch, table, required).into_result()
}
