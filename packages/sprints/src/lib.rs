// ABOUTME: Sprint domain for Cadence: sprint lifecycle with transactional
// ABOUTME: task detach, plus read-side metrics (stats, burndown, leaderboard)

pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod types;

#[cfg(test)]
mod service_test;

pub use error::{SprintError, SprintResult};
pub use metrics::{BurndownPoint, LeaderboardEntry, MemberStats, TaskStats};
pub use service::SprintService;
pub use storage::SprintStorage;
pub use types::{Sprint, SprintCreateInput, SprintStatus, SprintUpdateInput};
