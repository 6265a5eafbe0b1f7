// ABOUTME: Efficiency scoring engine
// ABOUTME: Computes the signed bonus from estimated vs actual effort at
// ABOUTME: review submission; informational only, never fed into rankings

use crate::timeclock::SECONDS_PER_HOUR;

/// Reward rate: 10 points per hour under estimate.
const UNDER_RATE: f64 = 10.0;
/// Penalty rate: 5 points per hour over estimate.
const OVER_RATE: f64 = 5.0;

/// Signed efficiency bonus for a review submission.
///
/// Under-running the estimate earns 10 points per saved hour; over-running
/// costs 5 points per excess hour; matching it exactly scores zero. Rounded
/// to the nearest integer.
pub fn efficiency_bonus(estimated_hours: f64, actual_seconds: i64) -> i64 {
    let estimated_seconds = estimated_hours * SECONDS_PER_HOUR;
    let actual_seconds = actual_seconds as f64;

    if actual_seconds < estimated_seconds {
        ((estimated_seconds - actual_seconds) / SECONDS_PER_HOUR * UNDER_RATE).round() as i64
    } else if actual_seconds > estimated_seconds {
        -(((actual_seconds - estimated_seconds) / SECONDS_PER_HOUR * OVER_RATE).round() as i64)
    } else {
        0
    }
}
