//! Utility functions for error handling
//!
//! File access helpers that turn `std::io` failures into [`AnalysisError::Io`]
//! values carrying the offending path.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(
            AnalysisError::io_error(format!("File not found, needed for {purpose}")).with_path(path),
        );
    }

    if !path.is_file() {
        return Err(
            AnalysisError::io_error(format!("Path is not a file, expected one for {purpose}"))
                .with_path(path),
        );
    }

    fs::File::open(path).map_err(|e| {
        let message = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "Permission denied - check file permissions".to_string()
            }
            _ => format!("Failed to open file for {purpose}"),
        };
        AnalysisError::io_error_with_source(message, e).with_path(path)
    })
}

/// Read a whole file to a string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|e| {
        let message = match e.kind() {
            io::ErrorKind::InvalidData => {
                "File contains invalid UTF-8 data - cannot read as text".to_string()
            }
            _ => format!("Failed to read file content for {purpose}"),
        };
        AnalysisError::io_error_with_source(message, e).with_path(path)
    })?;

    Ok(content)
}

/// Create (or truncate) an output file with rich error information
pub fn safe_create_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(AnalysisError::io_error(format!(
                "Parent directory does not exist, needed for {purpose}"
            ))
            .with_path(path));
        }
    }

    fs::File::create(path).map_err(|e| {
        AnalysisError::io_error_with_source(format!("Failed to create file for {purpose}"), e)
            .with_path(path)
    })
}
