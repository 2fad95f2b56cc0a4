//! Log lines for source reads and join losses

use std::path::Path;
use std::time::Duration;

/// Log the start of a source file read
pub fn log_read_start(source: &str, path: &Path) {
    log::info!("Reading {source} from {}", path.display());
}

/// Log a finished source file read with its row count and duration
pub fn log_read_complete(source: &str, path: &Path, rows: usize, elapsed: Duration) {
    log::info!(
        "Read {rows} rows of {source} from {} in {elapsed:?}",
        path.display()
    );
}

/// Message describing measurement keys a join dropped from `source`
#[must_use]
pub fn dropped_keys_message(source: &str, dropped: &[String]) -> String {
    format!(
        "{source}: {} measurement row(s) had no matching metadata and were dropped: {}",
        dropped.len(),
        dropped.join(", ")
    )
}

/// Warn about measurement keys a join dropped from `source`
pub fn log_dropped_keys(source: &str, dropped: &[String]) {
    log::warn!("{}", dropped_keys_message(source, dropped));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_keys_message_names_source_count_and_keys() {
        let dropped = vec!["LC99".to_string(), "LC98".to_string()];
        assert_eq!(
            dropped_keys_message("long COVID", &dropped),
            "long COVID: 2 measurement row(s) had no matching metadata and were dropped: LC99, LC98"
        );
    }
}
