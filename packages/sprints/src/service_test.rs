// ABOUTME: Integration tests for the sprint service
// ABOUTME: Sprint lifecycle, bulk detach and metrics against in-memory SQLite

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

use cadence_core::iso_week;
use cadence_tasks::{
    Actor, Complexity, Role, TaskCreateInput, TaskService, TaskStatus,
};

use crate::service::SprintService;
use crate::types::{SprintCreateInput, SprintStatus};
use crate::SprintError;

async fn setup() -> (SqlitePool, SprintService, TaskService) {
    let pool = cadence_storage::connect_memory().await.unwrap();
    let sprints = SprintService::new(pool.clone());
    let tasks = TaskService::new(pool.clone());
    (pool, sprints, tasks)
}

fn manager() -> Actor {
    Actor {
        id: "mgr-1".into(),
        role: Role::Manager,
    }
}

fn dev() -> Actor {
    Actor {
        id: "dev-1".into(),
        role: Role::Developer,
    }
}

fn sprint_input(project: &str, name: &str) -> SprintCreateInput {
    let start = Utc::now();
    SprintCreateInput {
        project_id: project.into(),
        name: name.into(),
        goal: Some("ship it".into()),
        capacity: Some(30),
        start_date: start,
        end_date: start + Duration::days(10),
    }
}

fn task_input(title: &str, sprint_id: Option<String>, complexity: Complexity) -> TaskCreateInput {
    TaskCreateInput {
        title: title.into(),
        description: None,
        project_id: Some("proj-1".into()),
        sprint_id,
        complexity: Some(complexity),
        story_points: None,
        priority: None,
        assigned_to: "dev-1".into(),
        estimated_hours: Some(2.0),
        position: None,
        scheduled_start_date: None,
        scheduled_end_date: None,
    }
}

#[tokio::test]
async fn test_create_sprint_defaults_and_sequence() {
    let (_pool, sprints, _tasks) = setup().await;

    let first = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Sprint 1"))
        .await
        .unwrap();
    let second = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Sprint 2"))
        .await
        .unwrap();

    assert_eq!(first.status, SprintStatus::Planning);
    assert_eq!(first.velocity, 0);
    assert_eq!(first.position, 1);
    assert_eq!(second.position, 2);
}

#[tokio::test]
async fn test_create_sprint_validation() {
    let (_pool, sprints, _tasks) = setup().await;

    let mut bad = sprint_input("proj-1", "Backwards");
    bad.end_date = bad.start_date - Duration::days(1);
    assert!(matches!(
        sprints.create_sprint(&manager(), bad).await,
        Err(SprintError::Validation(_))
    ));

    assert!(matches!(
        sprints.create_sprint(&dev(), sprint_input("proj-1", "Nope")).await,
        Err(SprintError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_only_one_active_sprint_per_project() {
    let (_pool, sprints, _tasks) = setup().await;

    let first = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Sprint 1"))
        .await
        .unwrap();
    let second = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Sprint 2"))
        .await
        .unwrap();
    // A different project is unaffected by proj-1's active sprint
    let other = sprints
        .create_sprint(&manager(), sprint_input("proj-2", "Elsewhere"))
        .await
        .unwrap();

    let first = sprints.start_sprint(&first.id, &manager()).await.unwrap();
    assert_eq!(first.status, SprintStatus::Active);

    assert!(matches!(
        sprints.start_sprint(&second.id, &manager()).await,
        Err(SprintError::InvalidState(_))
    ));
    assert!(sprints.start_sprint(&other.id, &manager()).await.is_ok());
}

#[tokio::test]
async fn test_start_requires_planning_status() {
    let (_pool, sprints, _tasks) = setup().await;
    let sprint = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Sprint 1"))
        .await
        .unwrap();
    sprints.start_sprint(&sprint.id, &manager()).await.unwrap();

    assert!(matches!(
        sprints.start_sprint(&sprint.id, &manager()).await,
        Err(SprintError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_complete_freezes_velocity_and_detaches_backlog() {
    let (_pool, sprints, tasks) = setup().await;
    let sprint = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Sprint 1"))
        .await
        .unwrap();
    sprints.start_sprint(&sprint.id, &manager()).await.unwrap();

    let done_a = tasks
        .create_task(&manager(), task_input("Done A", Some(sprint.id.clone()), Complexity::Hard))
        .await
        .unwrap();
    let done_b = tasks
        .create_task(&manager(), task_input("Done B", Some(sprint.id.clone()), Complexity::Medium))
        .await
        .unwrap();
    let unfinished = tasks
        .create_task(&manager(), task_input("Leftover", Some(sprint.id.clone()), Complexity::Easy))
        .await
        .unwrap();

    tasks
        .set_status(&done_a.id, &dev(), TaskStatus::Completed)
        .await
        .unwrap();
    tasks
        .set_status(&done_b.id, &dev(), TaskStatus::Completed)
        .await
        .unwrap();

    let sprint = sprints.complete_sprint(&sprint.id, &manager()).await.unwrap();
    assert_eq!(sprint.status, SprintStatus::Completed);
    // Hard (5) + Medium (3)
    assert_eq!(sprint.velocity, 8);

    // Completed tasks keep their sprint reference, the rest go to backlog
    let leftover = tasks.get_task(&unfinished.id).await.unwrap();
    assert_eq!(leftover.sprint_id, None);
    let kept = tasks.get_task(&done_a.id).await.unwrap();
    assert_eq!(kept.sprint_id, Some(sprint.id.clone()));

    assert!(matches!(
        sprints.complete_sprint(&sprint.id, &manager()).await,
        Err(SprintError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_cancel_detaches_all_tasks() {
    let (_pool, sprints, tasks) = setup().await;
    let sprint = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Doomed"))
        .await
        .unwrap();
    let task = tasks
        .create_task(&manager(), task_input("Orphan", Some(sprint.id.clone()), Complexity::Easy))
        .await
        .unwrap();

    let sprint = sprints.cancel_sprint(&sprint.id, &manager()).await.unwrap();
    assert_eq!(sprint.status, SprintStatus::Cancelled);

    let task = tasks.get_task(&task.id).await.unwrap();
    assert_eq!(task.sprint_id, None);
}

#[tokio::test]
async fn test_delete_detaches_then_removes() {
    let (_pool, sprints, tasks) = setup().await;
    let sprint = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Gone"))
        .await
        .unwrap();
    let task = tasks
        .create_task(&manager(), task_input("Survivor", Some(sprint.id.clone()), Complexity::Easy))
        .await
        .unwrap();

    sprints.delete_sprint(&sprint.id, &manager()).await.unwrap();

    assert!(matches!(
        sprints.get_sprint(&sprint.id).await,
        Err(SprintError::NotFound)
    ));
    let task = tasks.get_task(&task.id).await.unwrap();
    assert_eq!(task.sprint_id, None);
}

#[tokio::test]
async fn test_attach_rejected_on_closed_sprint() {
    let (_pool, sprints, tasks) = setup().await;
    let sprint = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Closed"))
        .await
        .unwrap();
    let task = tasks
        .create_task(&manager(), task_input("Late", None, Complexity::Easy))
        .await
        .unwrap();

    sprints.start_sprint(&sprint.id, &manager()).await.unwrap();
    sprints.complete_sprint(&sprint.id, &manager()).await.unwrap();

    assert!(matches!(
        sprints.attach_task(&sprint.id, &task.id, &manager()).await,
        Err(SprintError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_sprint_stats_and_burndown() {
    let (_pool, sprints, tasks) = setup().await;
    let sprint = sprints
        .create_sprint(&manager(), sprint_input("proj-1", "Measured"))
        .await
        .unwrap();

    let done = tasks
        .create_task(&manager(), task_input("Done", Some(sprint.id.clone()), Complexity::Hard))
        .await
        .unwrap();
    tasks
        .create_task(&manager(), task_input("Open", Some(sprint.id.clone()), Complexity::Medium))
        .await
        .unwrap();
    tasks
        .set_status(&done.id, &dev(), TaskStatus::Completed)
        .await
        .unwrap();

    let stats = sprints.sprint_stats(&sprint.id).await.unwrap();
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total_points, 8);
    assert_eq!(stats.completed_points, 5);

    let curve = sprints.sprint_burndown(&sprint.id, Utc::now()).await.unwrap();
    // 10-day sprint: day 0 through day 10
    assert_eq!(curve.len(), 11);
    assert_eq!(curve[0].ideal, 8.0);
    // Today is day 0: the completed Hard task already burned down
    assert_eq!(curve[0].actual, Some(3));
    assert_eq!(curve[10].actual, None);
}

#[tokio::test]
async fn test_weekly_leaderboard_via_service() {
    let (_pool, sprints, tasks) = setup().await;

    let a = tasks
        .create_task(&manager(), task_input("A", None, Complexity::Hard))
        .await
        .unwrap();
    let b = tasks
        .create_task(&manager(), task_input("B", None, Complexity::Easy))
        .await
        .unwrap();
    tasks.set_status(&a.id, &dev(), TaskStatus::Completed).await.unwrap();
    tasks.set_status(&b.id, &dev(), TaskStatus::Completed).await.unwrap();

    let this_week = iso_week(Utc::now());
    let board = sprints.weekly_leaderboard(Some(this_week)).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].person_id, "dev-1");
    assert_eq!(board[0].total_points, 6);
    assert_eq!(board[0].completed_tasks, 2);

    // A week with no completions yields an empty board
    let board = sprints.weekly_leaderboard(Some(this_week + 1)).await.unwrap();
    assert!(board.is_empty());
}
