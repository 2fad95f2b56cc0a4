//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging, console output, and progress tracking.

pub mod console;
pub mod log;
pub mod progress;

pub use log::{dropped_keys_message, log_dropped_keys, log_read_complete, log_read_start};
pub use progress::{create_spinner, create_stage_progress_bar, finish_progress_bar};
