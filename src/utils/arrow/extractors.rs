//! Field extraction utilities for Arrow record batches
//!
//! Each extractor returns one `Option` per row, so callers decide whether a
//! null is a missing value, an unmatched key or a domain error.

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::arrow::array_utils::{cast_column, downcast_array, get_column};

/// Extract a column as strings
///
/// Numeric columns (e.g. integer patient numbers) are rendered as text. Empty
/// strings are treated as missing.
pub fn string_column(
    batch: &RecordBatch,
    column_name: &str,
    table: &str,
) -> Result<Vec<Option<String>>> {
    let array = cast_column(batch, column_name, table, &DataType::Utf8)?;
    let strings = downcast_array::<StringArray>(&array, column_name, "String")?;

    Ok(strings
        .iter()
        .map(|value| value.filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

/// Extract a column as `f64`
///
/// Text that does not parse as a number becomes `None`.
pub fn float_column(
    batch: &RecordBatch,
    column_name: &str,
    table: &str,
) -> Result<Vec<Option<f64>>> {
    let array = cast_column(batch, column_name, table, &DataType::Float64)?;
    let floats = downcast_array::<Float64Array>(&array, column_name, "Float64")?;
    Ok(floats.iter().collect())
}

/// Extract an indicator column as integers
///
/// Booleans map to 0/1, integral floats to their value and text is parsed as
/// an integer or `true`/`false`. Anything else (fractional values, other text)
/// becomes `None`, leaving domain checks to the caller.
pub fn flag_column(
    batch: &RecordBatch,
    column_name: &str,
    table: &str,
) -> Result<Vec<Option<i64>>> {
    let column = get_column(batch, column_name, table)?;

    match column.data_type() {
        DataType::Boolean => {
            let flags = downcast_array::<BooleanArray>(column, column_name, "Boolean")?;
            Ok(flags.iter().map(|v| v.map(i64::from)).collect())
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            Ok(float_column(batch, column_name, table)?
                .into_iter()
                .map(|v| v.filter(|x| x.fract() == 0.0).map(|x| x as i64))
                .collect())
        }
        DataType::Utf8 | DataType::LargeUtf8 => Ok(string_column(batch, column_name, table)?
            .into_iter()
            .map(|v| v.and_then(|s| parse_flag(&s)))
            .collect()),
        _ => {
            let array = cast_column(batch, column_name, table, &DataType::Int64)?;
            let ints = downcast_array::<Int64Array>(&array, column_name, "Int64")?;
            Ok(ints.iter().collect())
        }
    }
}

fn parse_flag(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(1),
        "false" => Some(0),
        _ => None,
    }
}
