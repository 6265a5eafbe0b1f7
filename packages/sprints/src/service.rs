// ABOUTME: Sprint service orchestrating sprint lifecycle and read-side views
// ABOUTME: Role guards and validation here, transactional writes in storage

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use cadence_core::iso_week;
use cadence_storage::StorageError;
use cadence_tasks::{Actor, TaskStorage, TaskUpdateInput};

use crate::error::{SprintError, SprintResult};
use crate::metrics::{
    burndown, task_stats, team_stats, velocity, weekly_leaderboard, BurndownPoint,
    LeaderboardEntry, MemberStats, TaskStats,
};
use crate::storage::{ActivationOutcome, SprintStorage};
use crate::types::{Sprint, SprintCreateInput, SprintStatus, SprintUpdateInput};

pub struct SprintService {
    sprints: SprintStorage,
    tasks: TaskStorage,
}

fn require_manager(actor: &Actor) -> SprintResult<()> {
    if !actor.is_manager() {
        return Err(SprintError::Unauthorized(format!(
            "actor {} lacks the manager role",
            actor.id
        )));
    }
    Ok(())
}

impl SprintService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            sprints: SprintStorage::new(pool.clone()),
            tasks: TaskStorage::new(pool),
        }
    }

    async fn fetch(&self, sprint_id: &str) -> SprintResult<Sprint> {
        match self.sprints.get_sprint(sprint_id).await {
            Ok(sprint) => Ok(sprint),
            Err(StorageError::NotFound) => Err(SprintError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create_sprint(
        &self,
        actor: &Actor,
        input: SprintCreateInput,
    ) -> SprintResult<Sprint> {
        require_manager(actor)?;

        if input.name.trim().is_empty() {
            return Err(SprintError::Validation("sprint name is required".into()));
        }
        if input.end_date < input.start_date {
            return Err(SprintError::Validation(
                "sprint end date must not precede its start date".into(),
            ));
        }
        if input.capacity.is_some_and(|c| c < 0) {
            return Err(SprintError::Validation(
                "sprint capacity cannot be negative".into(),
            ));
        }

        info!(
            "Creating sprint '{}' for project {}",
            input.name, input.project_id
        );
        Ok(self.sprints.create_sprint(input).await?)
    }

    pub async fn get_sprint(&self, sprint_id: &str) -> SprintResult<Sprint> {
        self.fetch(sprint_id).await
    }

    pub async fn list_sprints(&self) -> SprintResult<Vec<Sprint>> {
        Ok(self.sprints.list_sprints().await?)
    }

    pub async fn list_by_project(&self, project_id: &str) -> SprintResult<Vec<Sprint>> {
        Ok(self.sprints.list_by_project(project_id).await?)
    }

    pub async fn update_sprint(
        &self,
        actor: &Actor,
        sprint_id: &str,
        input: SprintUpdateInput,
    ) -> SprintResult<Sprint> {
        require_manager(actor)?;

        let sprint = self.fetch(sprint_id).await?;
        if !sprint.accepts_tasks() {
            return Err(SprintError::InvalidState(format!(
                "cannot edit a {:?} sprint",
                sprint.status
            )));
        }

        let start = input.start_date.unwrap_or(sprint.start_date);
        let end = input.end_date.unwrap_or(sprint.end_date);
        if end < start {
            return Err(SprintError::Validation(
                "sprint end date must not precede its start date".into(),
            ));
        }
        if input.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(SprintError::Validation("sprint name is required".into()));
        }

        Ok(self.sprints.update_sprint(sprint_id, input).await?)
    }

    /// Planning -> Active, rejected while another sprint of the project is
    /// already running.
    pub async fn start_sprint(&self, sprint_id: &str, actor: &Actor) -> SprintResult<Sprint> {
        require_manager(actor)?;

        let sprint = self.fetch(sprint_id).await?;
        if sprint.status != SprintStatus::Planning {
            return Err(SprintError::InvalidState(format!(
                "cannot start a sprint from {:?}",
                sprint.status
            )));
        }

        match self.sprints.activate_guarded(&sprint).await? {
            ActivationOutcome::Activated => {
                info!("Sprint {} started", sprint_id);
                self.fetch(sprint_id).await
            }
            ActivationOutcome::OtherSprintActive => Err(SprintError::InvalidState(format!(
                "project {} already has an active sprint",
                sprint.project_id
            ))),
            ActivationOutcome::Stale => Err(SprintError::Conflict),
        }
    }

    /// Active -> Completed: freezes velocity and detaches every
    /// non-completed task back to the backlog, all-or-nothing.
    pub async fn complete_sprint(&self, sprint_id: &str, actor: &Actor) -> SprintResult<Sprint> {
        require_manager(actor)?;

        let sprint = self.fetch(sprint_id).await?;
        if sprint.status != SprintStatus::Active {
            return Err(SprintError::InvalidState(format!(
                "cannot complete a sprint from {:?}",
                sprint.status
            )));
        }

        match self.sprints.complete_guarded(&sprint, velocity).await? {
            Some(frozen) => {
                info!("Sprint {} completed with velocity {}", sprint_id, frozen);
                self.fetch(sprint_id).await
            }
            None => Err(SprintError::Conflict),
        }
    }

    /// Any non-Completed state -> Cancelled, detaching all tasks.
    pub async fn cancel_sprint(&self, sprint_id: &str, actor: &Actor) -> SprintResult<Sprint> {
        require_manager(actor)?;

        let sprint = self.fetch(sprint_id).await?;
        if sprint.status == SprintStatus::Completed {
            return Err(SprintError::InvalidState(
                "a completed sprint cannot be cancelled".into(),
            ));
        }

        if self.sprints.cancel_guarded(&sprint).await? {
            info!("Sprint {} cancelled", sprint_id);
            self.fetch(sprint_id).await
        } else {
            Err(SprintError::Conflict)
        }
    }

    pub async fn delete_sprint(&self, sprint_id: &str, actor: &Actor) -> SprintResult<()> {
        require_manager(actor)?;

        match self.sprints.delete_sprint(sprint_id).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(SprintError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Attach a task to an open sprint.
    pub async fn attach_task(
        &self,
        sprint_id: &str,
        task_id: &str,
        actor: &Actor,
    ) -> SprintResult<()> {
        require_manager(actor)?;

        let sprint = self.fetch(sprint_id).await?;
        if !sprint.accepts_tasks() {
            return Err(SprintError::InvalidState(format!(
                "cannot attach tasks to a {:?} sprint",
                sprint.status
            )));
        }

        let input = TaskUpdateInput {
            sprint_id: Some(Some(sprint_id.to_string())),
            ..TaskUpdateInput::default()
        };
        match self.tasks.update_task(task_id, input).await {
            Ok(_) => Ok(()),
            Err(StorageError::NotFound) => Err(SprintError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Detach a task back to the backlog.
    pub async fn detach_task(&self, task_id: &str, actor: &Actor) -> SprintResult<()> {
        require_manager(actor)?;

        let input = TaskUpdateInput {
            sprint_id: Some(None),
            ..TaskUpdateInput::default()
        };
        match self.tasks.update_task(task_id, input).await {
            Ok(_) => Ok(()),
            Err(StorageError::NotFound) => Err(SprintError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Per-sprint status/point statistics, recomputed per request.
    pub async fn sprint_stats(&self, sprint_id: &str) -> SprintResult<TaskStats> {
        self.fetch(sprint_id).await?;
        let tasks = self.tasks.list_by_sprint(sprint_id).await?;
        Ok(task_stats(&tasks))
    }

    /// Burndown curve for the sprint, evaluated at `today`.
    pub async fn sprint_burndown(
        &self,
        sprint_id: &str,
        today: DateTime<Utc>,
    ) -> SprintResult<Vec<BurndownPoint>> {
        let sprint = self.fetch(sprint_id).await?;
        let tasks = self.tasks.list_by_sprint(sprint_id).await?;
        Ok(burndown(sprint.start_date, sprint.end_date, &tasks, today))
    }

    /// Weekly leaderboard; callers default the week to the current ISO week.
    pub async fn weekly_leaderboard(
        &self,
        week_number: Option<u32>,
    ) -> SprintResult<Vec<LeaderboardEntry>> {
        let week = week_number.unwrap_or_else(|| iso_week(Utc::now()));
        let tasks = self.tasks.list_completed_in_week(week).await?;
        Ok(weekly_leaderboard(&tasks, week))
    }

    /// All-time per-member breakdown over every task.
    pub async fn team_stats(&self) -> SprintResult<Vec<MemberStats>> {
        let tasks = self.tasks.list_tasks().await?;
        Ok(team_stats(&tasks))
    }
}
