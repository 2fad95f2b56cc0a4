//! Utilities for working with Arrow arrays.
//!
//! Column lookup, casting and downcasting with errors that name the table and
//! column involved.

use arrow::array::{Array, ArrayRef};
use arrow::compute::kernels::cast::{can_cast_types, cast};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{AnalysisError, Result};

/// Get a required column from a record batch
///
/// # Arguments
/// * `batch` - The record batch containing the column
/// * `column_name` - The name of the column to extract
/// * `table` - Name of the table, used in error messages
pub fn get_column<'a>(batch: &'a RecordBatch, column_name: &str, table: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(column_name)
        .ok_or_else(|| AnalysisError::missing_column(table, column_name))
}

/// Get a required column cast to `target`
///
/// Values that cannot be represented in the target type become nulls, so a
/// text column holding `NA` markers casts to a numeric column with gaps.
/// Type pairs Arrow cannot cast at all are a schema error.
pub fn cast_column(
    batch: &RecordBatch,
    column_name: &str,
    table: &str,
    target: &DataType,
) -> Result<ArrayRef> {
    let column = get_column(batch, column_name, table)?;
    let actual = column.data_type();

    if actual == target {
        return Ok(column.clone());
    }

    if !can_cast_types(actual, target) {
        return Err(AnalysisError::Schema(format!(
            "column '{column_name}' in {table} has type {actual}, which cannot be read as {target}"
        )));
    }

    debug!("Casting column '{column_name}' in {table} from {actual} to {target}");
    Ok(cast(column, target)?)
}

/// Downcast a column to a specific array type with clear error messages
///
/// # Type Parameters
/// * `A` - The target array type to downcast to
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        AnalysisError::Schema(format!(
            "column '{column_name}' is not a {expected_type_name} array (found {})",
            array.data_type()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, StringArray};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        RecordBatch::try_from_iter(vec![(
            "value",
            Arc::new(StringArray::from(vec![Some("1.5"), Some("NA"), None])) as ArrayRef,
        )])
        .unwrap()
    }

    #[test]
    fn test_missing_column_names_table() {
        let err = get_column(&batch(), "other", "hospital table").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'other'"));
        assert!(message.contains("hospital table"));
    }

    #[test]
    fn test_text_cast_to_float_nulls_unparseable_values() {
        let array = cast_column(&batch(), "value", "t", &DataType::Float64).unwrap();
        let floats = downcast_array::<Float64Array>(&array, "value", "Float64").unwrap();
        assert_eq!(floats.value(0), 1.5);
        assert!(floats.is_null(1));
        assert!(floats.is_null(2));
    }

    #[test]
    fn test_downcast_to_wrong_type_fails() {
        let batch = batch();
        let column = get_column(&batch, "value", "t").unwrap();
        assert!(downcast_array::<Float64Array>(column, "value", "Float64").is_err());
    }
}
