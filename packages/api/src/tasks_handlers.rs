// ABOUTME: HTTP request handlers for task operations
// ABOUTME: Task CRUD, lifecycle transitions, timers, blockers and QA review

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use cadence_tasks::{
    Actor, Complexity, Priority, ReviewDecision, Role, TaskCreateInput, TaskStatus,
    TaskUpdateInput,
};

use crate::db::DbState;
use crate::response::{ApiResponse, ErrorResponse};

/// Caller identity, verified upstream and passed through in request bodies.
#[derive(Deserialize)]
pub struct ActorPayload {
    #[serde(rename = "actorId")]
    pub actor_id: String,
    #[serde(rename = "actorRole")]
    pub actor_role: Role,
}

impl ActorPayload {
    pub fn into_actor(self) -> Actor {
        Actor {
            id: self.actor_id,
            role: self.actor_role,
        }
    }
}

/// Request body for creating a task
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(rename = "sprintId")]
    pub sprint_id: Option<String>,
    pub complexity: Option<Complexity>,
    #[serde(rename = "storyPoints")]
    pub story_points: Option<i64>,
    pub priority: Option<Priority>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: String,
    #[serde(rename = "estimatedHours")]
    pub estimated_hours: Option<f64>,
    pub position: Option<i64>,
    #[serde(rename = "scheduledStartDate")]
    pub scheduled_start_date: Option<DateTime<Utc>>,
    #[serde(rename = "scheduledEndDate")]
    pub scheduled_end_date: Option<DateTime<Utc>>,
}

/// Create a new task
pub async fn create_task(
    State(db): State<DbState>,
    Json(request): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    info!("Creating task '{}'", request.title);

    let input = TaskCreateInput {
        title: request.title,
        description: request.description,
        project_id: request.project_id,
        sprint_id: request.sprint_id,
        complexity: request.complexity,
        story_points: request.story_points,
        priority: request.priority,
        assigned_to: request.assigned_to,
        estimated_hours: request.estimated_hours,
        position: request.position,
        scheduled_start_date: request.scheduled_start_date,
        scheduled_end_date: request.scheduled_end_date,
    };
    let actor = request.actor.into_actor();

    match db.task_service.create_task(&actor, input).await {
        Ok(task) => (
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(task)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a single task by ID
pub async fn get_task(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    match db.task_service.get_task(&task_id).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List all tasks
pub async fn list_tasks(State(db): State<DbState>) -> impl IntoResponse {
    match db.task_service.list_tasks().await {
        Ok(tasks) => (StatusCode::OK, ResponseJson(ApiResponse::success(tasks))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Request body for updating task metadata
#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub title: Option<String>,
    pub description: Option<String>,
    pub complexity: Option<Complexity>,
    #[serde(rename = "storyPoints")]
    pub story_points: Option<i64>,
    pub priority: Option<Priority>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(rename = "estimatedHours")]
    pub estimated_hours: Option<f64>,
    pub position: Option<i64>,
    #[serde(rename = "scheduledStartDate")]
    pub scheduled_start_date: Option<DateTime<Utc>>,
    #[serde(rename = "scheduledEndDate")]
    pub scheduled_end_date: Option<DateTime<Utc>>,
}

/// Update task metadata
pub async fn update_task(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> impl IntoResponse {
    info!("Updating task: {}", task_id);

    let input = TaskUpdateInput {
        title: request.title,
        description: request.description,
        sprint_id: None,
        complexity: request.complexity,
        story_points: request.story_points,
        priority: request.priority,
        assigned_to: request.assigned_to,
        estimated_hours: request.estimated_hours,
        position: request.position,
        scheduled_start_date: request.scheduled_start_date,
        scheduled_end_date: request.scheduled_end_date,
    };
    let actor = request.actor.into_actor();

    match db.task_service.update_task(&actor, &task_id, input).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a task
pub async fn delete_task(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    info!("Deleting task: {}", task_id);

    let actor = request.into_actor();
    match db.task_service.delete_task(&actor, &task_id).await {
        Ok(()) => (
            StatusCode::OK,
            ResponseJson(ApiResponse::success(serde_json::json!({
                "message": format!("Task {} deleted", task_id)
            }))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Assignee picks up a task
pub async fn start_work(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.task_service.start_work(&task_id, &actor).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    #[serde(rename = "proofUrl")]
    pub proof_url: String,
}

/// Submit a task for review with a proof reference
pub async fn submit_for_review(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<SubmitReviewRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .submit_for_review(&task_id, &actor, &request.proof_url)
        .await
    {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct ReviewDecisionRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub decision: ReviewDecision,
}

/// Manager approves or requests changes
pub async fn review_decision(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ReviewDecisionRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .review_decision(&task_id, &actor, request.decision)
        .await
    {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub status: TaskStatus,
}

/// Direct status change by the assignee
pub async fn set_status(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .set_status(&task_id, &actor, request.status)
        .await
    {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Start the focus stopwatch
pub async fn start_timer(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.task_service.start_timer(&task_id, &actor).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Stop the focus stopwatch
pub async fn stop_timer(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.task_service.stop_timer(&task_id, &actor).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct ToggleBlockerRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub note: Option<String>,
}

/// Flip the blocker flag on a task
pub async fn toggle_blocker(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ToggleBlockerRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .toggle_blocker(&task_id, &actor, request.note)
        .await
    {
        Ok(is_blocked) => (
            StatusCode::OK,
            ResponseJson(ApiResponse::success(
                serde_json::json!({ "isBlocked": is_blocked }),
            )),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Manager clears a blocker
pub async fn unblock(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.task_service.unblock(&task_id, &actor).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub text: String,
}

/// Append a comment to a task
pub async fn add_comment(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<AddCommentRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .add_comment(&task_id, &actor, &request.text)
        .await
    {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Start the QA review clock
pub async fn qa_start_timer(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.task_service.qa_start_timer(&task_id, &actor).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Stop the QA review clock
pub async fn qa_stop_timer(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.task_service.qa_stop_timer(&task_id, &actor).await {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct QaApproveRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub notes: Option<String>,
}

/// QA approves the submission
pub async fn qa_approve(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<QaApproveRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .qa_approve(&task_id, &actor, request.notes)
        .await
    {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct QaFailRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub notes: String,
    #[serde(rename = "bugsFound")]
    pub bugs_found: i64,
}

/// QA fails the submission, returning the task to the developer
pub async fn qa_fail(
    State(db): State<DbState>,
    Path(task_id): Path<String>,
    Json(request): Json<QaFailRequest>,
) -> impl IntoResponse {
    let actor = request.actor.into_actor();
    match db
        .task_service
        .qa_fail(&task_id, &actor, &request.notes, request.bugs_found)
        .await
    {
        Ok(task) => (StatusCode::OK, ResponseJson(ApiResponse::success(task))).into_response(),
        Err(e) => e.into_response(),
    }
}
