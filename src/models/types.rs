//! Common domain type definitions
//!
//! The patient condition is an ordered categorical with a fixed, closed set of
//! levels. Declaration order is the level order: it fixes the reference level
//! of the linear model and the ordering of every report table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Number of patient condition levels
pub const CONDITION_LEVELS: usize = 8;

/// Clinical condition of the patient a sample was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatientCondition {
    /// Healthy control (model reference level)
    #[serde(rename = "healthy")]
    Healthy,
    /// Chronic obstructive pulmonary disease
    #[serde(rename = "COPD")]
    Copd,
    /// Long COVID without COPD
    #[serde(rename = "long COVID")]
    LongCovid,
    /// Long COVID with COPD
    #[serde(rename = "long COVID + COPD")]
    LongCovidCopd,
    #[serde(rename = "hospital, no COVID, no ICU")]
    HospitalNoCovidNoIcu,
    #[serde(rename = "hospital, no COVID, ICU")]
    HospitalNoCovidIcu,
    #[serde(rename = "hospital, COVID, no ICU")]
    HospitalCovidNoIcu,
    #[serde(rename = "hospital, COVID, ICU")]
    HospitalCovidIcu,
}

impl PatientCondition {
    /// All levels in model order
    pub const LEVELS: [Self; CONDITION_LEVELS] = [
        Self::Healthy,
        Self::Copd,
        Self::LongCovid,
        Self::LongCovidCopd,
        Self::HospitalNoCovidNoIcu,
        Self::HospitalNoCovidIcu,
        Self::HospitalCovidNoIcu,
        Self::HospitalCovidIcu,
    ];

    /// Baseline level for treatment coding
    pub const REFERENCE: Self = Self::Healthy;

    /// Human-readable label, identical to the serialized form
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Copd => "COPD",
            Self::LongCovid => "long COVID",
            Self::LongCovidCopd => "long COVID + COPD",
            Self::HospitalNoCovidNoIcu => "hospital, no COVID, no ICU",
            Self::HospitalNoCovidIcu => "hospital, no COVID, ICU",
            Self::HospitalCovidNoIcu => "hospital, COVID, no ICU",
            Self::HospitalCovidIcu => "hospital, COVID, ICU",
        }
    }

    /// Position of this level in [`Self::LEVELS`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Condition for a hospital patient from the `(COVID, ICU)` indicator pair
    ///
    /// Returns `None` when either indicator is outside `{0, 1}`.
    #[must_use]
    pub const fn from_hospital_flags(covid: i64, icu: i64) -> Option<Self> {
        match (covid, icu) {
            (0, 0) => Some(Self::HospitalNoCovidNoIcu),
            (0, 1) => Some(Self::HospitalNoCovidIcu),
            (1, 0) => Some(Self::HospitalCovidNoIcu),
            (1, 1) => Some(Self::HospitalCovidIcu),
            _ => None,
        }
    }
}

impl fmt::Display for PatientCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for PatientCondition {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LEVELS
            .into_iter()
            .find(|level| level.label() == s)
            .ok_or_else(|| {
                AnalysisError::Schema(format!(
                    "patient_condition '{s}' is not one of the {CONDITION_LEVELS} known levels"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_follow_declaration_order() {
        for (i, level) in PatientCondition::LEVELS.iter().enumerate() {
            assert_eq!(level.index(), i);
        }
        assert!(PatientCondition::Healthy < PatientCondition::Copd);
        assert!(PatientCondition::LongCovidCopd < PatientCondition::HospitalNoCovidNoIcu);
        assert_eq!(PatientCondition::LEVELS[0], PatientCondition::REFERENCE);
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for level in PatientCondition::LEVELS {
            assert_eq!(level.label().parse::<PatientCondition>().unwrap(), level);
        }
    }

    #[test]
    fn test_unknown_label_is_schema_error() {
        let err = "asthma".parse::<PatientCondition>().unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
        // Labels are case sensitive
        assert!("Healthy".parse::<PatientCondition>().is_err());
    }

    #[test]
    fn test_hospital_flags() {
        assert_eq!(
            PatientCondition::from_hospital_flags(1, 1),
            Some(PatientCondition::HospitalCovidIcu)
        );
        assert_eq!(
            PatientCondition::from_hospital_flags(0, 0),
            Some(PatientCondition::HospitalNoCovidNoIcu)
        );
        assert_eq!(
            PatientCondition::from_hospital_flags(0, 1),
            Some(PatientCondition::HospitalNoCovidIcu)
        );
        assert_eq!(
            PatientCondition::from_hospital_flags(1, 0),
            Some(PatientCondition::HospitalCovidNoIcu)
        );
        assert_eq!(PatientCondition::from_hospital_flags(2, 0), None);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&PatientCondition::LongCovidCopd).unwrap();
        assert_eq!(json, "\"long COVID + COPD\"");
        let parsed: PatientCondition = serde_json::from_str("\"hospital, COVID, ICU\"").unwrap();
        assert_eq!(parsed, PatientCondition::HospitalCovidIcu);
    }
}
