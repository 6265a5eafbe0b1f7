// ABOUTME: HTTP request handlers for sprint operations
// ABOUTME: Sprint CRUD, lifecycle, task attachment and per-sprint metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use cadence_sprints::{SprintCreateInput, SprintUpdateInput};

use crate::db::DbState;
use crate::response::{ApiResponse, ErrorResponse};
use crate::tasks_handlers::ActorPayload;

/// Request body for creating a sprint
#[derive(Deserialize)]
pub struct CreateSprintRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub name: String,
    pub goal: Option<String>,
    pub capacity: Option<i64>,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
}

/// Create a new sprint in planning state
pub async fn create_sprint(
    State(db): State<DbState>,
    Json(request): Json<CreateSprintRequest>,
) -> impl IntoResponse {
    info!("Creating sprint '{}'", request.name);

    let input = SprintCreateInput {
        project_id: request.project_id,
        name: request.name,
        goal: request.goal,
        capacity: request.capacity,
        start_date: request.start_date,
        end_date: request.end_date,
    };
    let actor = request.actor.into_actor();

    match db.sprint_service.create_sprint(&actor, input).await {
        Ok(sprint) => (
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(sprint)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a single sprint by ID
pub async fn get_sprint(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
) -> impl IntoResponse {
    match db.sprint_service.get_sprint(&sprint_id).await {
        Ok(sprint) => (StatusCode::OK, ResponseJson(ApiResponse::success(sprint))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Deserialize)]
pub struct ListSprintsQuery {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

/// List sprints, optionally scoped to a project
pub async fn list_sprints(
    State(db): State<DbState>,
    Query(query): Query<ListSprintsQuery>,
) -> impl IntoResponse {
    let result = match query.project_id {
        Some(project_id) => db.sprint_service.list_by_project(&project_id).await,
        None => db.sprint_service.list_sprints().await,
    };
    match result {
        Ok(sprints) => (StatusCode::OK, ResponseJson(ApiResponse::success(sprints))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Request body for updating sprint metadata
#[derive(Deserialize)]
pub struct UpdateSprintRequest {
    #[serde(flatten)]
    pub actor: ActorPayload,
    pub name: Option<String>,
    pub goal: Option<String>,
    pub capacity: Option<i64>,
    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Update an open sprint's metadata
pub async fn update_sprint(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
    Json(request): Json<UpdateSprintRequest>,
) -> impl IntoResponse {
    info!("Updating sprint: {}", sprint_id);

    let input = SprintUpdateInput {
        name: request.name,
        goal: request.goal,
        capacity: request.capacity,
        start_date: request.start_date,
        end_date: request.end_date,
    };
    let actor = request.actor.into_actor();

    match db
        .sprint_service
        .update_sprint(&actor, &sprint_id, input)
        .await
    {
        Ok(sprint) => (StatusCode::OK, ResponseJson(ApiResponse::success(sprint))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a sprint, returning its tasks to the backlog
pub async fn delete_sprint(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    info!("Deleting sprint: {}", sprint_id);

    let actor = request.into_actor();
    match db.sprint_service.delete_sprint(&sprint_id, &actor).await {
        Ok(()) => (
            StatusCode::OK,
            ResponseJson(ApiResponse::success(serde_json::json!({
                "message": format!("Sprint {} deleted", sprint_id)
            }))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Activate a sprint from planning
pub async fn start_sprint(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.sprint_service.start_sprint(&sprint_id, &actor).await {
        Ok(sprint) => (StatusCode::OK, ResponseJson(ApiResponse::success(sprint))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Complete an active sprint, freezing its velocity
pub async fn complete_sprint(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.sprint_service.complete_sprint(&sprint_id, &actor).await {
        Ok(sprint) => (StatusCode::OK, ResponseJson(ApiResponse::success(sprint))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Cancel a sprint that has not completed
pub async fn cancel_sprint(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.sprint_service.cancel_sprint(&sprint_id, &actor).await {
        Ok(sprint) => (StatusCode::OK, ResponseJson(ApiResponse::success(sprint))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Attach a task to a sprint
pub async fn attach_task(
    State(db): State<DbState>,
    Path((sprint_id, task_id)): Path<(String, String)>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db
        .sprint_service
        .attach_task(&sprint_id, &task_id, &actor)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            ResponseJson(ApiResponse::success(serde_json::json!({
                "message": format!("Task {} attached to sprint {}", task_id, sprint_id)
            }))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Detach a task from its sprint
pub async fn detach_task(
    State(db): State<DbState>,
    Path((_sprint_id, task_id)): Path<(String, String)>,
    Json(request): Json<ActorPayload>,
) -> impl IntoResponse {
    let actor = request.into_actor();
    match db.sprint_service.detach_task(&task_id, &actor).await {
        Ok(()) => (
            StatusCode::OK,
            ResponseJson(ApiResponse::success(serde_json::json!({
                "message": format!("Task {} returned to the backlog", task_id)
            }))),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Status/point statistics for a sprint's tasks
pub async fn sprint_stats(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
) -> impl IntoResponse {
    match db.sprint_service.sprint_stats(&sprint_id).await {
        Ok(stats) => (StatusCode::OK, ResponseJson(ApiResponse::success(stats))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Ideal-vs-actual burndown curve for a sprint
pub async fn sprint_burndown(
    State(db): State<DbState>,
    Path(sprint_id): Path<String>,
) -> impl IntoResponse {
    match db
        .sprint_service
        .sprint_burndown(&sprint_id, Utc::now())
        .await
    {
        Ok(points) => (StatusCode::OK, ResponseJson(ApiResponse::success(points))).into_response(),
        Err(e) => e.into_response(),
    }
}
