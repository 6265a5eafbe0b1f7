// ABOUTME: Task domain for Cadence: lifecycle state machine, dual-clock time
// ABOUTME: accounting, efficiency scoring, QA review and SQLite-backed storage

pub mod error;
pub mod lifecycle;
pub mod qa;
pub mod scoring;
pub mod service;
pub mod storage;
pub mod timeclock;
pub mod types;


pub use error::{TaskError, TaskResult};
pub use service::TaskService;
pub use storage::TaskStorage;
pub use types::{
    Actor, Comment, Complexity, Priority, QaReviewStatus, ReviewDecision, Role, Task,
    TaskCreateInput, TaskStatus, TaskUpdateInput,
};
