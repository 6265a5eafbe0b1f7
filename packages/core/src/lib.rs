// ABOUTME: Core constants and utilities for Cadence
// ABOUTME: Foundational package shared across all Cadence packages

pub mod constants;
pub mod utils;

// Re-export constants
pub use constants::{cadence_dir, EASY_POINTS, HARD_POINTS, MEDIUM_POINTS};

// Re-export utilities
pub use utils::{generate_id, iso_week, seconds_between};
