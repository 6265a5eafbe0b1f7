// ABOUTME: Task type definitions
// ABOUTME: Structures for tasks, actors, review verdicts and mutation inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_core::{EASY_POINTS, HARD_POINTS, MEDIUM_POINTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    PendingReview,
    Completed,
    ChangesRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

impl Complexity {
    /// Fixed point value for the complexity tier.
    pub fn points(&self) -> i64 {
        match self {
            Complexity::Easy => EASY_POINTS,
            Complexity::Medium => MEDIUM_POINTS,
            Complexity::Hard => HARD_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QaReviewStatus {
    Pending,
    Approved,
    Failed,
}

/// Caller-supplied role. Authentication happens upstream; handlers pass the
/// verified identity and role through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Manager,
    Qa,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn is_qa(&self) -> bool {
        self.role == Role::Qa
    }
}

/// Manager verdict on a task sitting in Pending Review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewDecision {
    Completed,
    ChangesRequested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub sprint_id: Option<String>,

    // Classification
    pub complexity: Complexity,
    pub story_points: Option<i64>,
    pub priority: Priority,

    // Ownership
    pub assigned_to: String,
    pub created_by: String,

    pub status: TaskStatus,

    // Effort. `actual_hours` is fed by the gross clock (wall-clock while the
    // task is In Progress); `total_seconds_spent` by the focus stopwatch.
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub total_seconds_spent: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub is_timer_running: bool,
    pub timer_start_time: Option<DateTime<Utc>>,

    // Outcome
    pub efficiency_bonus: Option<i64>,
    pub proof_url: Option<String>,
    pub comments: Vec<Comment>,
    pub completed_at: Option<DateTime<Utc>>,

    // Blocking
    pub is_blocked: bool,
    pub blocker_note: String,

    // QA overlay
    pub qa_review_status: Option<QaReviewStatus>,
    pub qa_review_notes: Option<String>,
    pub bugs_found: i64,
    pub qa_time_spent: i64,
    pub is_qa_timer_running: bool,
    pub qa_timer_start_time: Option<DateTime<Utc>>,

    // Scheduling
    pub week_number: i64,
    pub position: i64,
    pub scheduled_start_date: Option<DateTime<Utc>>,
    pub scheduled_end_date: Option<DateTime<Utc>>,

    // Optimistic concurrency
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Story points override the complexity tier when set.
    pub fn points(&self) -> i64 {
        self.story_points.unwrap_or_else(|| self.complexity.points())
    }

    pub fn is_assignee(&self, actor: &Actor) -> bool {
        self.assigned_to == actor.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreateInput {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub sprint_id: Option<String>,
    pub complexity: Option<Complexity>,
    pub story_points: Option<i64>,
    pub priority: Option<Priority>,
    pub assigned_to: String,
    pub estimated_hours: Option<f64>,
    pub position: Option<i64>,
    pub scheduled_start_date: Option<DateTime<Utc>>,
    pub scheduled_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sprint_id: Option<Option<String>>,
    pub complexity: Option<Complexity>,
    pub story_points: Option<i64>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<String>,
    pub estimated_hours: Option<f64>,
    pub position: Option<i64>,
    pub scheduled_start_date: Option<DateTime<Utc>>,
    pub scheduled_end_date: Option<DateTime<Utc>>,
}
