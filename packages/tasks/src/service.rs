// ABOUTME: Task service orchestrating lifecycle operations
// ABOUTME: Fetch, plan through the pure transition table, persist with an
// ABOUTME: optimistic version check; conflicts surface to the caller

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use cadence_storage::StorageError;

use crate::error::{TaskError, TaskResult};
use crate::lifecycle::{
    apply_plan, plan_review_decision, plan_set_status, plan_start_work, plan_submit_for_review,
    toggle_blocker, unblock,
};
use crate::qa;
use crate::storage::TaskStorage;
use crate::timeclock::{start_focus_clock, stop_focus_clock};
use crate::types::{
    Actor, Comment, ReviewDecision, Task, TaskCreateInput, TaskStatus, TaskUpdateInput,
};

pub struct TaskService {
    storage: TaskStorage,
}

impl TaskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            storage: TaskStorage::new(pool),
        }
    }

    async fn fetch(&self, task_id: &str) -> TaskResult<Task> {
        match self.storage.get_task(task_id).await {
            Ok(task) => Ok(task),
            Err(StorageError::NotFound) => Err(TaskError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Write back a mutated task. A failed version check on a still-present
    /// row means somebody else got there first.
    async fn save(&self, task: &Task) -> TaskResult<Task> {
        if self.storage.persist_guarded(task).await? {
            return self.fetch(&task.id).await;
        }
        match self.storage.get_task(&task.id).await {
            Ok(_) => Err(TaskError::Conflict),
            Err(StorageError::NotFound) => Err(TaskError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create_task(&self, actor: &Actor, input: TaskCreateInput) -> TaskResult<Task> {
        if input.title.trim().is_empty() {
            return Err(TaskError::Validation("task title is required".into()));
        }
        if input.assigned_to.trim().is_empty() {
            return Err(TaskError::Validation("task needs an assignee".into()));
        }
        if input.estimated_hours.is_some_and(|h| h < 0.0) {
            return Err(TaskError::Validation(
                "estimated hours cannot be negative".into(),
            ));
        }
        if input.story_points.is_some_and(|p| p < 0) {
            return Err(TaskError::Validation(
                "story points cannot be negative".into(),
            ));
        }

        info!("Creating task '{}' for {}", input.title, input.assigned_to);
        Ok(self.storage.create_task(&actor.id, input).await?)
    }

    pub async fn get_task(&self, task_id: &str) -> TaskResult<Task> {
        self.fetch(task_id).await
    }

    pub async fn list_tasks(&self) -> TaskResult<Vec<Task>> {
        Ok(self.storage.list_tasks().await?)
    }

    pub async fn list_by_sprint(&self, sprint_id: &str) -> TaskResult<Vec<Task>> {
        Ok(self.storage.list_by_sprint(sprint_id).await?)
    }

    pub async fn update_task(
        &self,
        actor: &Actor,
        task_id: &str,
        input: TaskUpdateInput,
    ) -> TaskResult<Task> {
        let task = self.fetch(task_id).await?;
        if !task.is_assignee(actor) && !actor.is_manager() {
            return Err(TaskError::Unauthorized(format!(
                "actor {} may not edit task {}",
                actor.id, task_id
            )));
        }
        if input.estimated_hours.is_some_and(|h| h < 0.0) {
            return Err(TaskError::Validation(
                "estimated hours cannot be negative".into(),
            ));
        }
        if input.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(TaskError::Validation("task title is required".into()));
        }

        Ok(self.storage.update_task(task_id, input).await?)
    }

    pub async fn delete_task(&self, actor: &Actor, task_id: &str) -> TaskResult<()> {
        if !actor.is_manager() {
            return Err(TaskError::Unauthorized(format!(
                "actor {} lacks the manager role",
                actor.id
            )));
        }
        match self.storage.delete_task(task_id).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(TaskError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Assignee picks the task up, starting both work clocks.
    pub async fn start_work(&self, task_id: &str, actor: &Actor) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        let plan = plan_start_work(&task, actor)?;
        apply_plan(&mut task, &plan, Utc::now());

        info!("Task {} started by {}", task_id, actor.id);
        self.save(&task).await
    }

    /// Assignee submits for review with a proof reference. Folds elapsed
    /// time and runs the scoring engine exactly once.
    pub async fn submit_for_review(
        &self,
        task_id: &str,
        actor: &Actor,
        proof_url: &str,
    ) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        let plan = plan_submit_for_review(&task, actor, proof_url)?;
        apply_plan(&mut task, &plan, Utc::now());

        info!(
            "Task {} submitted for review (bonus: {:?})",
            task_id, task.efficiency_bonus
        );
        self.save(&task).await
    }

    /// Manager approves or sends the task back.
    pub async fn review_decision(
        &self,
        task_id: &str,
        actor: &Actor,
        decision: ReviewDecision,
    ) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        let plan = plan_review_decision(&task, actor, decision)?;
        apply_plan(&mut task, &plan, Utc::now());

        info!("Task {} reviewed: {:?}", task_id, decision);
        self.save(&task).await
    }

    /// Direct status change with symmetric clock side effects, no scoring.
    pub async fn set_status(
        &self,
        task_id: &str,
        actor: &Actor,
        status: TaskStatus,
    ) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        let plan = plan_set_status(&task, actor, status)?;
        apply_plan(&mut task, &plan, Utc::now());

        self.save(&task).await
    }

    /// Explicit stopwatch start. From Todo this also advances the task to
    /// In Progress, but without the full start-work side effects: the gross
    /// clock stays closed until the task is properly started.
    pub async fn start_timer(&self, task_id: &str, actor: &Actor) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        if !task.is_assignee(actor) {
            return Err(TaskError::Unauthorized(format!(
                "actor {} is not the assignee of task {}",
                actor.id, task_id
            )));
        }
        if task.status == TaskStatus::Completed {
            return Err(TaskError::InvalidState(
                "cannot start the timer on a completed task".into(),
            ));
        }

        start_focus_clock(&mut task, Utc::now())?;
        if task.status == TaskStatus::Todo {
            task.status = TaskStatus::InProgress;
        }

        self.save(&task).await
    }

    /// Explicit stopwatch stop; folds the span and republishes hours.
    pub async fn stop_timer(&self, task_id: &str, actor: &Actor) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        if !task.is_assignee(actor) {
            return Err(TaskError::Unauthorized(format!(
                "actor {} is not the assignee of task {}",
                actor.id, task_id
            )));
        }

        stop_focus_clock(&mut task, Utc::now())?;
        self.save(&task).await
    }

    pub async fn toggle_blocker(
        &self,
        task_id: &str,
        actor: &Actor,
        note: Option<String>,
    ) -> TaskResult<bool> {
        let mut task = self.fetch(task_id).await?;
        let blocked = toggle_blocker(&mut task, actor, note)?;
        self.save(&task).await?;
        Ok(blocked)
    }

    pub async fn unblock(&self, task_id: &str, actor: &Actor) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        unblock(&mut task, actor)?;
        self.save(&task).await
    }

    pub async fn add_comment(&self, task_id: &str, actor: &Actor, text: &str) -> TaskResult<Task> {
        if text.trim().is_empty() {
            return Err(TaskError::Validation("comment text is required".into()));
        }

        let mut task = self.fetch(task_id).await?;
        task.comments.push(Comment {
            author: actor.id.clone(),
            text: text.trim().to_string(),
            timestamp: Utc::now(),
        });
        self.save(&task).await
    }

    pub async fn qa_start_timer(&self, task_id: &str, actor: &Actor) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        qa::start_review_timer(&mut task, actor, Utc::now())?;
        self.save(&task).await
    }

    pub async fn qa_stop_timer(&self, task_id: &str, actor: &Actor) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        qa::stop_review_timer(&mut task, actor, Utc::now())?;
        self.save(&task).await
    }

    pub async fn qa_approve(
        &self,
        task_id: &str,
        actor: &Actor,
        notes: Option<String>,
    ) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        qa::approve(&mut task, actor, notes, Utc::now())?;

        info!("Task {} QA-approved by {}", task_id, actor.id);
        self.save(&task).await
    }

    pub async fn qa_fail(
        &self,
        task_id: &str,
        actor: &Actor,
        notes: &str,
        bugs_found: i64,
    ) -> TaskResult<Task> {
        let mut task = self.fetch(task_id).await?;
        qa::fail(&mut task, actor, notes, bugs_found, Utc::now())?;

        info!(
            "Task {} QA-failed by {} ({} bugs)",
            task_id, actor.id, bugs_found
        );
        self.save(&task).await
    }
}
