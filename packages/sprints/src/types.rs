// ABOUTME: Sprint type definitions
// ABOUTME: Structures for sprints and their mutation inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub goal: String,
    /// Planned point budget.
    pub capacity: i64,
    pub status: SprintStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Sum of completed task points, written exactly once at completion.
    pub velocity: i64,
    /// Sequence number within the project.
    pub position: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Tasks may attach or detach only while the sprint is open.
    pub fn accepts_tasks(&self) -> bool {
        matches!(self.status, SprintStatus::Planning | SprintStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintCreateInput {
    pub project_id: String,
    pub name: String,
    pub goal: Option<String>,
    pub capacity: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SprintUpdateInput {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub capacity: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}
