//! Statistical analyses of the unified sample table
//!
//! This module contains the descriptive and inferential steps of the
//! analysis: group summaries, the healthy normal range, the additive linear
//! model with its estimated marginal means and contrasts, and per-group
//! normality tests.

pub mod contrast;
pub mod emmeans;
pub mod linear_model;
pub mod normal_range;
pub mod normality;
pub mod summary;

pub use contrast::{ContrastResult, ContrastSpec, evaluate_contrasts, sidak_adjust};
pub use emmeans::{MarginalMean, estimated_marginal_means};
pub use linear_model::{LinearModel, ModelTerm};
pub use normal_range::{NormalRange, RangeCounts, RangePosition};
pub use normality::{NormalityResult, ShapiroWilk, normality_by_condition, shapiro_wilk};
pub use summary::{GroupSummary, summarize_groups};
