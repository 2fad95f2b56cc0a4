use std::path::{Path, PathBuf};

use crtac1_analysis::config::{AnalysisConfig, SourcePaths};
use crtac1_analysis::models::{PatientCondition, SampleTable};

/// Directory of the CSV fixtures
#[must_use]
pub fn test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

/// Path of a single fixture file
#[must_use]
pub fn fixture(filename: &str) -> PathBuf {
    test_data_dir().join(filename)
}

/// Default configuration reading every source from the fixtures
#[must_use]
pub fn fixture_config() -> AnalysisConfig {
    AnalysisConfig {
        sources: SourcePaths::from_data_dir(&test_data_dir()),
        ..AnalysisConfig::default()
    }
}

/// Number of samples of one condition
#[must_use]
pub fn count_condition(table: &SampleTable, condition: PatientCondition) -> usize {
    table
        .iter()
        .filter(|r| r.patient_condition == condition)
        .count()
}

/// Write `content` to `name` inside `dir` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write test file");
    path
}
