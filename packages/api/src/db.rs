// ABOUTME: Database connection management and shared service state
// ABOUTME: Provides the SQLite pool and service layers to API handlers

use std::sync::Arc;

use sqlx::SqlitePool;

use cadence_sprints::SprintService;
use cadence_storage::StorageError;
use cadence_tasks::TaskService;

/// Shared state for API handlers
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub task_service: Arc<TaskService>,
    pub sprint_service: Arc<SprintService>,
}

impl DbState {
    /// Create service state from an existing SQLite pool
    pub fn new(pool: SqlitePool) -> Self {
        let task_service = Arc::new(TaskService::new(pool.clone()));
        let sprint_service = Arc::new(SprintService::new(pool.clone()));

        Self {
            pool,
            task_service,
            sprint_service,
        }
    }

    /// Initialize state with default configuration (~/.cadence/cadence.db)
    pub async fn init() -> Result<Self, StorageError> {
        Self::init_with_path(None).await
    }

    /// Initialize state with an optional custom database path
    pub async fn init_with_path(
        database_path: Option<std::path::PathBuf>,
    ) -> Result<Self, StorageError> {
        let database_path =
            database_path.unwrap_or_else(|| cadence_core::cadence_dir().join("cadence.db"));

        let pool = cadence_storage::connect(&database_path).await?;
        Ok(Self::new(pool))
    }
}
