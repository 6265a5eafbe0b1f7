// ABOUTME: Sprint storage layer using SQLite
// ABOUTME: CRUD plus the transactional status changes that bulk-detach tasks

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use cadence_core::generate_id;
use cadence_storage::{StorageError, StorageResult};
use cadence_tasks::storage::row_to_task;
use cadence_tasks::Task;

use crate::types::{Sprint, SprintCreateInput, SprintStatus, SprintUpdateInput};

pub struct SprintStorage {
    pool: SqlitePool,
}

impl SprintStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_sprint(&self, input: SprintCreateInput) -> StorageResult<Sprint> {
        let sprint_id = generate_id();
        let now = Utc::now();

        debug!(
            "Creating sprint: {} for project: {}",
            sprint_id, input.project_id
        );

        sqlx::query(
            r#"
            INSERT INTO sprints (
                id, project_id, name, goal, capacity, status,
                start_date, end_date, velocity, position,
                version, created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?,
                ?, ?, 0,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM sprints WHERE project_id = ?),
                0, ?, ?
            )
            "#,
        )
        .bind(&sprint_id)
        .bind(&input.project_id)
        .bind(&input.name)
        .bind(input.goal.as_deref().unwrap_or(""))
        .bind(input.capacity.unwrap_or(0))
        .bind(SprintStatus::Planning)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.project_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_sprint(&sprint_id).await
    }

    pub async fn get_sprint(&self, sprint_id: &str) -> StorageResult<Sprint> {
        debug!("Fetching sprint: {}", sprint_id);

        let row = sqlx::query("SELECT * FROM sprints WHERE id = ?")
            .bind(sprint_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_sprint(&row)
    }

    pub async fn list_sprints(&self) -> StorageResult<Vec<Sprint>> {
        let rows = sqlx::query("SELECT * FROM sprints ORDER BY project_id, position")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_sprint).collect()
    }

    pub async fn list_by_project(&self, project_id: &str) -> StorageResult<Vec<Sprint>> {
        let rows = sqlx::query("SELECT * FROM sprints WHERE project_id = ? ORDER BY position")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_sprint).collect()
    }

    pub async fn update_sprint(
        &self,
        sprint_id: &str,
        input: SprintUpdateInput,
    ) -> StorageResult<Sprint> {
        debug!("Updating sprint: {}", sprint_id);

        let mut query = String::from("UPDATE sprints SET updated_at = ?, version = version + 1");
        let mut has_updates = false;

        if input.name.is_some() {
            query.push_str(", name = ?");
            has_updates = true;
        }
        if input.goal.is_some() {
            query.push_str(", goal = ?");
            has_updates = true;
        }
        if input.capacity.is_some() {
            query.push_str(", capacity = ?");
            has_updates = true;
        }
        if input.start_date.is_some() {
            query.push_str(", start_date = ?");
            has_updates = true;
        }
        if input.end_date.is_some() {
            query.push_str(", end_date = ?");
            has_updates = true;
        }

        query.push_str(" WHERE id = ?");

        if !has_updates {
            return self.get_sprint(sprint_id).await;
        }

        let now = Utc::now();
        let mut q = sqlx::query(&query).bind(now);

        if let Some(name) = &input.name {
            q = q.bind(name);
        }
        if let Some(goal) = &input.goal {
            q = q.bind(goal);
        }
        if let Some(capacity) = input.capacity {
            q = q.bind(capacity);
        }
        if let Some(start) = &input.start_date {
            q = q.bind(start);
        }
        if let Some(end) = &input.end_date {
            q = q.bind(end);
        }

        q = q.bind(sprint_id);

        let result = q.execute(&self.pool).await.map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_sprint(sprint_id).await
    }

    /// Activate a Planning sprint. The one-active-per-project invariant is
    /// checked inside the same transaction as the status write.
    /// Returns false when the version check loses.
    pub async fn activate_guarded(&self, sprint: &Sprint) -> StorageResult<ActivationOutcome> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let active_others: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sprints WHERE project_id = ? AND status = ? AND id != ?",
        )
        .bind(&sprint.project_id)
        .bind(SprintStatus::Active)
        .bind(&sprint.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if active_others > 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            return Ok(ActivationOutcome::OtherSprintActive);
        }

        let result = sqlx::query(
            "UPDATE sprints SET status = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND status = ?",
        )
        .bind(SprintStatus::Active)
        .bind(Utc::now())
        .bind(&sprint.id)
        .bind(sprint.version)
        .bind(SprintStatus::Planning)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            return Ok(ActivationOutcome::Stale);
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(ActivationOutcome::Activated)
    }

    /// Complete an Active sprint: freeze velocity from the completed tasks
    /// and detach everything else back to the backlog. One transaction; a
    /// partial detach never commits.
    pub async fn complete_guarded(
        &self,
        sprint: &Sprint,
        velocity: impl Fn(&[Task]) -> i64,
    ) -> StorageResult<Option<i64>> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let now = Utc::now();

        let rows = sqlx::query("SELECT * FROM tasks WHERE sprint_id = ?")
            .bind(&sprint.id)
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;
        let tasks: Vec<Task> = rows
            .iter()
            .map(row_to_task)
            .collect::<StorageResult<_>>()?;
        let frozen = velocity(&tasks);

        sqlx::query(
            "UPDATE tasks SET sprint_id = NULL, version = version + 1, updated_at = ?
             WHERE sprint_id = ? AND status != 'completed'",
        )
        .bind(now)
        .bind(&sprint.id)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            "UPDATE sprints SET status = ?, velocity = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND status = ?",
        )
        .bind(SprintStatus::Completed)
        .bind(frozen)
        .bind(now)
        .bind(&sprint.id)
        .bind(sprint.version)
        .bind(SprintStatus::Active)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            return Ok(None);
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(Some(frozen))
    }

    /// Cancel a sprint, detaching all of its tasks. One transaction.
    pub async fn cancel_guarded(&self, sprint: &Sprint) -> StorageResult<bool> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let now = Utc::now();

        sqlx::query(
            "UPDATE tasks SET sprint_id = NULL, version = version + 1, updated_at = ?
             WHERE sprint_id = ?",
        )
        .bind(now)
        .bind(&sprint.id)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            "UPDATE sprints SET status = ?, version = version + 1, updated_at = ?
             WHERE id = ? AND version = ? AND status != ?",
        )
        .bind(SprintStatus::Cancelled)
        .bind(now)
        .bind(&sprint.id)
        .bind(sprint.version)
        .bind(SprintStatus::Completed)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            return Ok(false);
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(true)
    }

    /// Delete a sprint after detaching its tasks. One transaction.
    pub async fn delete_sprint(&self, sprint_id: &str) -> StorageResult<()> {
        debug!("Deleting sprint: {}", sprint_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query(
            "UPDATE tasks SET sprint_id = NULL, version = version + 1, updated_at = ?
             WHERE sprint_id = ?",
        )
        .bind(Utc::now())
        .bind(sprint_id)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        let result = sqlx::query("DELETE FROM sprints WHERE id = ?")
            .bind(sprint_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(StorageError::Sqlx)?;
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(())
    }
}

/// Outcome of an activation attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated,
    OtherSprintActive,
    Stale,
}

fn row_to_sprint(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Sprint> {
    Ok(Sprint {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        name: row.try_get("name")?,
        goal: row.try_get("goal")?,
        capacity: row.try_get("capacity")?,
        status: row.try_get("status")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        velocity: row.try_get("velocity")?,
        position: row.try_get("position")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
