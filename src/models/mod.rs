//! Domain models for the CRTAC1 analysis
//!
//! The unit entity is a [`SampleRecord`]: one harmonized biomarker measurement
//! with its patient condition and age. A [`SampleTable`] is the unified table
//! every analysis step reads from.

pub mod sample;
pub mod types;

pub use sample::{SampleRecord, SampleTable};
pub use types::{CONDITION_LEVELS, PatientCondition};
