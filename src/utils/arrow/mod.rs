//! Arrow data handling utilities
//!
//! Helpers for pulling typed, row-aligned columns out of raw record batches.
//! Raw CSV columns arrive with inferred types, so every accessor casts to the
//! type the harmonizers need.

pub mod array_utils;
pub mod extractors;

pub use array_utils::{cast_column, downcast_array, get_column};
pub use extractors::{flag_column, float_column, string_column};
