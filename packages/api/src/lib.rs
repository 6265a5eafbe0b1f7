// ABOUTME: HTTP API surface for Cadence
// ABOUTME: Routers, handlers and response types over the task/sprint services

use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod db;
pub mod metrics_handlers;
pub mod response;
pub mod sprints_handlers;
pub mod tasks_handlers;


pub use db::DbState;

/// Creates the full Cadence API router
pub fn create_router(state: DbState) -> Router {
    Router::new()
        // Task CRUD
        .route("/tasks", get(tasks_handlers::list_tasks))
        .route("/tasks", post(tasks_handlers::create_task))
        .route("/tasks/{task_id}", get(tasks_handlers::get_task))
        .route("/tasks/{task_id}", put(tasks_handlers::update_task))
        .route("/tasks/{task_id}", delete(tasks_handlers::delete_task))
        // Task lifecycle
        .route("/tasks/{task_id}/start", post(tasks_handlers::start_work))
        .route(
            "/tasks/{task_id}/submit-review",
            post(tasks_handlers::submit_for_review),
        )
        .route("/tasks/{task_id}/review", post(tasks_handlers::review_decision))
        .route("/tasks/{task_id}/status", post(tasks_handlers::set_status))
        .route("/tasks/{task_id}/timer/start", post(tasks_handlers::start_timer))
        .route("/tasks/{task_id}/timer/stop", post(tasks_handlers::stop_timer))
        .route("/tasks/{task_id}/blocker", post(tasks_handlers::toggle_blocker))
        .route("/tasks/{task_id}/unblock", post(tasks_handlers::unblock))
        .route("/tasks/{task_id}/comments", post(tasks_handlers::add_comment))
        // QA sub-workflow
        .route(
            "/tasks/{task_id}/qa/timer/start",
            post(tasks_handlers::qa_start_timer),
        )
        .route(
            "/tasks/{task_id}/qa/timer/stop",
            post(tasks_handlers::qa_stop_timer),
        )
        .route("/tasks/{task_id}/qa/approve", post(tasks_handlers::qa_approve))
        .route("/tasks/{task_id}/qa/fail", post(tasks_handlers::qa_fail))
        // Sprints
        .route("/sprints", get(sprints_handlers::list_sprints))
        .route("/sprints", post(sprints_handlers::create_sprint))
        .route("/sprints/{sprint_id}", get(sprints_handlers::get_sprint))
        .route("/sprints/{sprint_id}", put(sprints_handlers::update_sprint))
        .route("/sprints/{sprint_id}", delete(sprints_handlers::delete_sprint))
        .route("/sprints/{sprint_id}/start", post(sprints_handlers::start_sprint))
        .route(
            "/sprints/{sprint_id}/complete",
            post(sprints_handlers::complete_sprint),
        )
        .route("/sprints/{sprint_id}/cancel", post(sprints_handlers::cancel_sprint))
        .route(
            "/sprints/{sprint_id}/tasks/{task_id}",
            post(sprints_handlers::attach_task),
        )
        .route(
            "/sprints/{sprint_id}/tasks/{task_id}",
            delete(sprints_handlers::detach_task),
        )
        .route("/sprints/{sprint_id}/stats", get(sprints_handlers::sprint_stats))
        .route(
            "/sprints/{sprint_id}/burndown",
            get(sprints_handlers::sprint_burndown),
        )
        // Aggregations
        .route("/leaderboard", get(metrics_handlers::weekly_leaderboard))
        .route("/team/stats", get(metrics_handlers::team_stats))
        .with_state(state)
}
