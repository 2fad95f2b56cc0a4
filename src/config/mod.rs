//! Configuration for the analysis pipeline.
//!
//! Every field has a default matching the reference analysis, so an empty JSON
//! object (or no config file at all) runs the standard pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::util::safe_read_to_string;
use crate::error::{AnalysisError, Result};
use crate::models::PatientCondition;

/// Smallest group the analysis will summarize or test
pub const MIN_GROUP_SIZE: usize = 3;

/// Default half-width of the normal range in standard deviations
pub const DEFAULT_NORMAL_RANGE_MULTIPLIER: f64 = 3.0;

/// Paths of the six raw source files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    /// Hospital cohort measurements with COVID/ICU indicators
    pub hospital: PathBuf,
    /// Long-COVID CRTAC1 measurements
    pub long_covid_measurements: PathBuf,
    /// Long-COVID metadata carrying a COPD flag
    pub long_covid_metadata_copd: PathBuf,
    /// Long-COVID metadata without a COPD flag
    pub long_covid_metadata: PathBuf,
    /// COPD cohort CRTAC1 measurements
    pub copd_measurements: PathBuf,
    /// COPD cohort ages
    pub copd_ages: PathBuf,
}

impl SourcePaths {
    /// Resolve the default file names inside `dir`
    #[must_use]
    pub fn from_data_dir(dir: &Path) -> Self {
        Self {
            hospital: dir.join("hospital.csv"),
            long_covid_measurements: dir.join("long_covid_crtac1.csv"),
            long_covid_metadata_copd: dir.join("long_covid_metadata_copd.csv"),
            long_covid_metadata: dir.join("long_covid_metadata.csv"),
            copd_measurements: dir.join("copd_crtac1.csv"),
            copd_ages: dir.join("copd_ages.csv"),
        }
    }

    /// All paths with a short label, in load order
    #[must_use]
    pub fn labelled(&self) -> [(&'static str, &Path); 6] {
        [
            ("hospital", self.hospital.as_path()),
            ("long COVID measurements", self.long_covid_measurements.as_path()),
            ("long COVID metadata (COPD)", self.long_covid_metadata_copd.as_path()),
            ("long COVID metadata", self.long_covid_metadata.as_path()),
            ("COPD measurements", self.copd_measurements.as_path()),
            ("COPD ages", self.copd_ages.as_path()),
        ]
    }
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self::from_data_dir(Path::new("data"))
    }
}

/// Raw column names of the hospital source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalColumns {
    pub sample_id: String,
    /// Age, already capped below 90 by the data provider
    pub age: String,
    pub crtac1: String,
    pub covid: String,
    pub icu: String,
}

impl Default for HospitalColumns {
    fn default() -> Self {
        Self {
            sample_id: "sample_id".to_string(),
            age: "Age_less_than_90".to_string(),
            crtac1: "CRTAC1_ELISA_nM".to_string(),
            covid: "COVID".to_string(),
            icu: "ICU_1".to_string(),
        }
    }
}

/// Raw column names of the long-COVID measurement and metadata tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongCovidColumns {
    pub measurement_id: String,
    pub crtac1: String,
    pub metadata_id: String,
    pub age: String,
    pub copd_flag: String,
    /// Flag value marking a COPD diagnosis
    pub copd_positive: String,
}

impl Default for LongCovidColumns {
    fn default() -> Self {
        Self {
            measurement_id: "sample_id".to_string(),
            crtac1: "CRTAC1_ELISA_nM".to_string(),
            metadata_id: "sample_id".to_string(),
            age: "age".to_string(),
            copd_flag: "COPD".to_string(),
            copd_positive: "Y".to_string(),
        }
    }
}

/// Raw column names of the COPD measurement and ages tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopdColumns {
    pub patient_no: String,
    pub crtac1: String,
    pub ages_id: String,
    pub age: String,
}

impl Default for CopdColumns {
    fn default() -> Self {
        Self {
            patient_no: "Patient_No".to_string(),
            crtac1: "CRTAC1_ELISA_nM".to_string(),
            ages_id: "COPD_ID".to_string(),
            age: "Age".to_string(),
        }
    }
}

/// Column maps for all sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub hospital: HospitalColumns,
    pub long_covid: LongCovidColumns,
    pub copd: CopdColumns,
}

/// A named contrast given as condition label -> weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastConfig {
    pub name: String,
    pub weights: BTreeMap<String, f64>,
}

impl ContrastConfig {
    /// `minuend - subtrahend`
    #[must_use]
    pub fn difference(minuend: PatientCondition, subtrahend: PatientCondition) -> Self {
        Self {
            name: format!("{} - {}", minuend.label(), subtrahend.label()),
            weights: BTreeMap::from([
                (minuend.label().to_string(), 1.0),
                (subtrahend.label().to_string(), -1.0),
            ]),
        }
    }
}

/// The contrast family of the reference analysis
#[must_use]
pub fn reference_contrasts() -> Vec<ContrastConfig> {
    [
        PatientCondition::Copd,
        PatientCondition::LongCovid,
        PatientCondition::LongCovidCopd,
    ]
    .into_iter()
    .map(|level| ContrastConfig::difference(level, PatientCondition::Healthy))
    .collect()
}

/// Configuration for a full analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Raw source files
    pub sources: SourcePaths,
    /// Raw column names per source
    pub columns: ColumnConfig,
    /// Groups smaller than this fail summaries and normality tests
    pub min_group_size: usize,
    /// Normal range half-width in healthy-group standard deviations
    pub normal_range_multiplier: f64,
    /// Fail instead of warning when a join drops measurement rows
    pub strict_joins: bool,
    /// Contrast family evaluated against the fitted model
    pub contrasts: Vec<ContrastConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sources: SourcePaths::default(),
            columns: ColumnConfig::default(),
            min_group_size: MIN_GROUP_SIZE,
            normal_range_multiplier: DEFAULT_NORMAL_RANGE_MULTIPLIER,
            strict_joins: false,
            contrasts: reference_contrasts(),
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "reading the analysis configuration")?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::Config(format!("invalid configuration in {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and contrast definitions
    pub fn validate(&self) -> Result<()> {
        if self.min_group_size < MIN_GROUP_SIZE {
            return Err(AnalysisError::Config(format!(
                "min_group_size must be at least {MIN_GROUP_SIZE}, got {}",
                self.min_group_size
            )));
        }

        if !self.normal_range_multiplier.is_finite() || self.normal_range_multiplier <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "normal_range_multiplier must be a positive number, got {}",
                self.normal_range_multiplier
            )));
        }

        let mut names = FxHashSet::default();
        for contrast in &self.contrasts {
            if !names.insert(contrast.name.as_str()) {
                return Err(AnalysisError::Config(format!(
                    "contrast '{}' is defined more than once",
                    contrast.name
                )));
            }
            if contrast.weights.is_empty() {
                return Err(AnalysisError::Config(format!(
                    "contrast '{}' has no weights",
                    contrast.name
                )));
            }
            for (label, weight) in &contrast.weights {
                label.parse::<PatientCondition>().map_err(|e| {
                    AnalysisError::Config(format!("contrast '{}': {e}", contrast.name))
                })?;
                if !weight.is_finite() {
                    return Err(AnalysisError::Config(format!(
                        "contrast '{}' has a non-finite weight for '{label}'",
                        contrast.name
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Configuration:")?;
        for (label, path) in self.sources.labelled() {
            writeln!(f, "  {label}: {}", path.display())?;
        }
        writeln!(f, "  Minimum group size: {}", self.min_group_size)?;
        writeln!(
            f,
            "  Normal range: mean +/- {} SD",
            self.normal_range_multiplier
        )?;
        writeln!(f, "  Strict joins: {}", self.strict_joins)?;
        writeln!(f, "  Contrasts: {}", self.contrasts.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.contrasts.len(), 3);
        assert_eq!(config.contrasts[0].name, "COPD - healthy");
        assert_eq!(config.columns.hospital.icu, "ICU_1");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "strict_joins": true, "columns": { "copd": { "age": "age_years" } } }"#)
                .unwrap();
        assert!(config.strict_joins);
        assert_eq!(config.columns.copd.age, "age_years");
        assert_eq!(config.columns.copd.patient_no, "Patient_No");
        assert_eq!(config.min_group_size, MIN_GROUP_SIZE);
    }

    #[test]
    fn test_validate_rejects_unknown_contrast_label() {
        let mut config = AnalysisConfig::default();
        config.contrasts.push(ContrastConfig {
            name: "bad".to_string(),
            weights: BTreeMap::from([("asthma".to_string(), 1.0)]),
        });
        assert!(matches!(config.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_contrast_names() {
        let mut config = AnalysisConfig::default();
        config.contrasts.push(reference_contrasts()[0].clone());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
        assert!(err.to_string().contains("COPD - healthy"));
    }

    #[test]
    fn test_validate_rejects_small_groups_and_bad_multiplier() {
        let config = AnalysisConfig {
            min_group_size: 2,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            normal_range_multiplier: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_paths_from_data_dir() {
        let paths = SourcePaths::from_data_dir(Path::new("/data/crtac1"));
        assert_eq!(paths.copd_ages, Path::new("/data/crtac1/copd_ages.csv"));
        assert_eq!(paths.labelled().len(), 6);
    }
}
