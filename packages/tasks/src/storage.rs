// ABOUTME: Task storage layer using SQLite
// ABOUTME: CRUD plus guarded full-row persistence with optimistic versioning

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use cadence_core::{generate_id, iso_week};
use cadence_storage::{StorageError, StorageResult};

use crate::types::{Comment, Complexity, Priority, Task, TaskCreateInput, TaskStatus, TaskUpdateInput};

pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_task(&self, created_by: &str, input: TaskCreateInput) -> StorageResult<Task> {
        let task_id = generate_id();
        let now = Utc::now();
        let complexity = input.complexity.unwrap_or(Complexity::Easy);
        let priority = input.priority.unwrap_or(Priority::Medium);

        debug!("Creating task: {} assigned to {}", task_id, input.assigned_to);

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, title, description, project_id, sprint_id,
                complexity, story_points, priority,
                assigned_to, created_by, status,
                estimated_hours, actual_hours, total_seconds_spent,
                is_timer_running, blocker_note, bugs_found, qa_time_spent,
                is_qa_timer_running, week_number, position,
                scheduled_start_date, scheduled_end_date,
                version, created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?,
                ?, ?, ?,
                ?, ?, ?,
                ?, 0, 0,
                0, '', 0, 0,
                0, ?, ?,
                ?, ?,
                0, ?, ?
            )
            "#,
        )
        .bind(&task_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.project_id)
        .bind(&input.sprint_id)
        .bind(complexity)
        .bind(input.story_points)
        .bind(priority)
        .bind(&input.assigned_to)
        .bind(created_by)
        .bind(TaskStatus::Todo)
        .bind(input.estimated_hours.unwrap_or(0.0))
        .bind(iso_week(now) as i64)
        .bind(input.position.unwrap_or(0))
        .bind(input.scheduled_start_date)
        .bind(input.scheduled_end_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_task(&task_id).await
    }

    pub async fn get_task(&self, task_id: &str) -> StorageResult<Task> {
        debug!("Fetching task: {}", task_id);

        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_task(&row)
    }

    pub async fn list_tasks(&self) -> StorageResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM tasks ORDER BY position, created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task).collect()
    }

    pub async fn list_by_sprint(&self, sprint_id: &str) -> StorageResult<Vec<Task>> {
        debug!("Fetching tasks for sprint: {}", sprint_id);

        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE sprint_id = ? ORDER BY position, created_at",
        )
        .bind(sprint_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task).collect()
    }

    pub async fn list_completed_in_week(&self, week_number: u32) -> StorageResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE status = ? AND week_number = ? ORDER BY assigned_to",
        )
        .bind(TaskStatus::Completed)
        .bind(week_number as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task).collect()
    }

    /// Metadata edit through the generic update path. Lifecycle fields
    /// (status, clocks, scores) go through `persist_guarded` instead.
    pub async fn update_task(&self, task_id: &str, input: TaskUpdateInput) -> StorageResult<Task> {
        debug!("Updating task: {}", task_id);

        // Build dynamic UPDATE query based on provided fields
        let mut query = String::from("UPDATE tasks SET updated_at = ?, version = version + 1");
        let mut has_updates = false;

        if input.title.is_some() {
            query.push_str(", title = ?");
            has_updates = true;
        }
        if input.description.is_some() {
            query.push_str(", description = ?");
            has_updates = true;
        }
        if input.sprint_id.is_some() {
            query.push_str(", sprint_id = ?");
            has_updates = true;
        }
        if input.complexity.is_some() {
            query.push_str(", complexity = ?");
            has_updates = true;
        }
        if input.story_points.is_some() {
            query.push_str(", story_points = ?");
            has_updates = true;
        }
        if input.priority.is_some() {
            query.push_str(", priority = ?");
            has_updates = true;
        }
        if input.assigned_to.is_some() {
            query.push_str(", assigned_to = ?");
            has_updates = true;
        }
        if input.estimated_hours.is_some() {
            query.push_str(", estimated_hours = ?");
            has_updates = true;
        }
        if input.position.is_some() {
            query.push_str(", position = ?");
            has_updates = true;
        }
        if input.scheduled_start_date.is_some() {
            query.push_str(", scheduled_start_date = ?");
            has_updates = true;
        }
        if input.scheduled_end_date.is_some() {
            query.push_str(", scheduled_end_date = ?");
            has_updates = true;
        }

        query.push_str(" WHERE id = ?");

        if !has_updates {
            return self.get_task(task_id).await;
        }

        let now = Utc::now();
        let mut q = sqlx::query(&query).bind(now);

        if let Some(title) = &input.title {
            q = q.bind(title);
        }
        if let Some(description) = &input.description {
            q = q.bind(description);
        }
        if let Some(sprint_id) = &input.sprint_id {
            q = q.bind(sprint_id);
        }
        if let Some(complexity) = input.complexity {
            q = q.bind(complexity);
        }
        if let Some(points) = input.story_points {
            q = q.bind(points);
        }
        if let Some(priority) = input.priority {
            q = q.bind(priority);
        }
        if let Some(assigned_to) = &input.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(hours) = input.estimated_hours {
            q = q.bind(hours);
        }
        if let Some(position) = input.position {
            q = q.bind(position);
        }
        if let Some(start) = &input.scheduled_start_date {
            q = q.bind(start);
        }
        if let Some(end) = &input.scheduled_end_date {
            q = q.bind(end);
        }

        q = q.bind(task_id);

        let result = q.execute(&self.pool).await.map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_task(task_id).await
    }

    /// Write back a mutated task row, guarded by the version read at fetch
    /// time. Returns false when the row changed underneath the caller.
    pub async fn persist_guarded(&self, task: &Task) -> StorageResult<bool> {
        debug!("Persisting task: {} (version {})", task.id, task.version);

        let now = Utc::now();
        let comments = serde_json::to_string(&task.comments).map_err(StorageError::Json)?;

        let result = sqlx::query(
            r#"
            UPDATE tasks SET
                title = ?, description = ?, project_id = ?, sprint_id = ?,
                complexity = ?, story_points = ?, priority = ?,
                assigned_to = ?, status = ?,
                estimated_hours = ?, actual_hours = ?, total_seconds_spent = ?,
                started_at = ?, is_timer_running = ?, timer_start_time = ?,
                efficiency_bonus = ?, proof_url = ?, comments = ?, completed_at = ?,
                is_blocked = ?, blocker_note = ?,
                qa_review_status = ?, qa_review_notes = ?, bugs_found = ?,
                qa_time_spent = ?, is_qa_timer_running = ?, qa_timer_start_time = ?,
                week_number = ?, position = ?,
                scheduled_start_date = ?, scheduled_end_date = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.project_id)
        .bind(&task.sprint_id)
        .bind(task.complexity)
        .bind(task.story_points)
        .bind(task.priority)
        .bind(&task.assigned_to)
        .bind(task.status)
        .bind(task.estimated_hours)
        .bind(task.actual_hours)
        .bind(task.total_seconds_spent)
        .bind(task.started_at)
        .bind(task.is_timer_running)
        .bind(task.timer_start_time)
        .bind(task.efficiency_bonus)
        .bind(&task.proof_url)
        .bind(comments)
        .bind(task.completed_at)
        .bind(task.is_blocked)
        .bind(&task.blocker_note)
        .bind(task.qa_review_status)
        .bind(&task.qa_review_notes)
        .bind(task.bugs_found)
        .bind(task.qa_time_spent)
        .bind(task.is_qa_timer_running)
        .bind(task.qa_timer_start_time)
        .bind(task.week_number)
        .bind(task.position)
        .bind(task.scheduled_start_date)
        .bind(task.scheduled_end_date)
        .bind(now)
        .bind(&task.id)
        .bind(task.version)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_task(&self, task_id: &str) -> StorageResult<()> {
        debug!("Deleting task: {}", task_id);

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

pub fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Task> {
    let comments: Vec<Comment> = row
        .try_get::<Option<String>, _>("comments")?
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();

    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        project_id: row.try_get("project_id")?,
        sprint_id: row.try_get("sprint_id")?,
        complexity: row.try_get("complexity")?,
        story_points: row.try_get("story_points")?,
        priority: row.try_get("priority")?,
        assigned_to: row.try_get("assigned_to")?,
        created_by: row.try_get("created_by")?,
        status: row.try_get("status")?,
        estimated_hours: row.try_get("estimated_hours")?,
        actual_hours: row.try_get("actual_hours")?,
        total_seconds_spent: row.try_get("total_seconds_spent")?,
        started_at: row.try_get("started_at")?,
        is_timer_running: row.try_get("is_timer_running")?,
        timer_start_time: row.try_get("timer_start_time")?,
        efficiency_bonus: row.try_get("efficiency_bonus")?,
        proof_url: row.try_get("proof_url")?,
        comments,
        completed_at: row.try_get("completed_at")?,
        is_blocked: row.try_get("is_blocked")?,
        blocker_note: row.try_get("blocker_note")?,
        qa_review_status: row.try_get("qa_review_status")?,
        qa_review_notes: row.try_get("qa_review_notes")?,
        bugs_found: row.try_get("bugs_found")?,
        qa_time_spent: row.try_get("qa_time_spent")?,
        is_qa_timer_running: row.try_get("is_qa_timer_running")?,
        qa_timer_start_time: row.try_get("qa_timer_start_time")?,
        week_number: row.try_get("week_number")?,
        position: row.try_get("position")?,
        scheduled_start_date: row.try_get("scheduled_start_date")?,
        scheduled_end_date: row.try_get("scheduled_end_date")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
