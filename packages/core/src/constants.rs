use std::env;
use std::path::PathBuf;

/// Points awarded for an Easy task
pub const EASY_POINTS: i64 = 1;
/// Points awarded for a Medium task
pub const MEDIUM_POINTS: i64 = 3;
/// Points awarded for a Hard task
pub const HARD_POINTS: i64 = 5;

/// Get the path to the Cadence directory (~/.cadence)
pub fn cadence_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".cadence")
    } else {
        // Fall back to dirs crate for normal usage
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".cadence")
    }
}
