// ABOUTME: HTTP request handlers for cross-sprint aggregations
// ABOUTME: Weekly leaderboard and all-time team statistics

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
};
use serde::Deserialize;

use crate::db::DbState;
use crate::response::{ApiResponse, ErrorResponse};

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub week: Option<u32>,
}

/// Efficiency leaderboard for a given ISO week, defaulting to the current one
pub async fn weekly_leaderboard(
    State(db): State<DbState>,
    Query(query): Query<LeaderboardQuery>,
) -> impl IntoResponse {
    match db.sprint_service.weekly_leaderboard(query.week).await {
        Ok(entries) => (StatusCode::OK, ResponseJson(ApiResponse::success(entries))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Per-member breakdown across all recorded tasks
pub async fn team_stats(State(db): State<DbState>) -> impl IntoResponse {
    match db.sprint_service.team_stats().await {
        Ok(stats) => (StatusCode::OK, ResponseJson(ApiResponse::success(stats))).into_response(),
        Err(e) => e.into_response(),
    }
}
