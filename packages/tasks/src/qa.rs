// ABOUTME: QA review sub-workflow
// ABOUTME: Optional second review layered on Pending Review tasks, gating
// ABOUTME: manager approval with an approve/fail verdict and its own clock

use chrono::{DateTime, Utc};

use crate::error::{TaskError, TaskResult};
use crate::timeclock::{start_qa_clock, stop_qa_clock};
use crate::types::{Actor, QaReviewStatus, Task, TaskStatus};

fn require_qa(actor: &Actor) -> TaskResult<()> {
    if !actor.is_qa() {
        return Err(TaskError::Unauthorized(format!(
            "actor {} lacks the QA role",
            actor.id
        )));
    }
    Ok(())
}

fn require_pending_review(task: &Task) -> TaskResult<()> {
    if task.status != TaskStatus::PendingReview {
        return Err(TaskError::InvalidState(format!(
            "QA review applies to tasks in PendingReview, not {:?}",
            task.status
        )));
    }
    Ok(())
}

pub fn start_review_timer(task: &mut Task, actor: &Actor, now: DateTime<Utc>) -> TaskResult<()> {
    require_qa(actor)?;
    require_pending_review(task)?;
    start_qa_clock(task, now)
}

pub fn stop_review_timer(task: &mut Task, actor: &Actor, now: DateTime<Utc>) -> TaskResult<()> {
    require_qa(actor)?;
    stop_qa_clock(task, now)
}

/// QA approval: records the verdict and notes. Not a status transition; the
/// task stays in Pending Review awaiting the manager's decision.
pub fn approve(
    task: &mut Task,
    actor: &Actor,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> TaskResult<()> {
    require_qa(actor)?;
    require_pending_review(task)?;

    if task.is_qa_timer_running {
        stop_qa_clock(task, now)?;
    }

    task.qa_review_status = Some(QaReviewStatus::Approved);
    task.qa_review_notes = notes;
    Ok(())
}

/// QA failure: requires feedback notes and a positive bug count, then sends
/// the task back to the developer as Changes Requested.
pub fn fail(
    task: &mut Task,
    actor: &Actor,
    notes: &str,
    bugs_found: i64,
    now: DateTime<Utc>,
) -> TaskResult<()> {
    require_qa(actor)?;
    require_pending_review(task)?;

    if notes.trim().is_empty() {
        return Err(TaskError::Validation(
            "failure feedback notes are required".into(),
        ));
    }
    if bugs_found < 1 {
        return Err(TaskError::Validation(
            "a failed review must report at least one bug".into(),
        ));
    }

    if task.is_qa_timer_running {
        stop_qa_clock(task, now)?;
    }

    task.qa_review_status = Some(QaReviewStatus::Failed);
    task.qa_review_notes = Some(notes.trim().to_string());
    task.bugs_found = bugs_found;
    task.status = TaskStatus::ChangesRequested;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Complexity, Priority, Role};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 4, h, m, 0).unwrap()
    }

    fn qa() -> Actor {
        Actor {
            id: "qa-1".into(),
            role: Role::Qa,
        }
    }

    fn pending_task() -> Task {
        Task {
            id: "t-9".into(),
            title: "Pagination fixes".into(),
            description: None,
            project_id: None,
            sprint_id: None,
            complexity: Complexity::Easy,
            story_points: None,
            priority: Priority::High,
            assigned_to: "dev-1".into(),
            created_by: "mgr-1".into(),
            status: TaskStatus::PendingReview,
            estimated_hours: 2.0,
            actual_hours: 1.5,
            total_seconds_spent: 5400,
            started_at: None,
            is_timer_running: false,
            timer_start_time: None,
            efficiency_bonus: Some(5),
            proof_url: Some("https://pr/7".into()),
            comments: Vec::new(),
            completed_at: None,
            is_blocked: false,
            blocker_note: String::new(),
            qa_review_status: None,
            qa_review_notes: None,
            bugs_found: 0,
            qa_time_spent: 0,
            is_qa_timer_running: false,
            qa_timer_start_time: None,
            week_number: 23,
            position: 0,
            scheduled_start_date: None,
            scheduled_end_date: None,
            version: 2,
            created_at: at(8, 0),
            updated_at: at(8, 0),
        }
    }

    #[test]
    fn test_review_timer_accumulates_qa_time() {
        let mut t = pending_task();

        start_review_timer(&mut t, &qa(), at(10, 0)).unwrap();
        assert!(t.is_qa_timer_running);

        stop_review_timer(&mut t, &qa(), at(10, 45)).unwrap();
        assert!(!t.is_qa_timer_running);
        assert_eq!(t.qa_time_spent, 2700);
    }

    #[test]
    fn test_review_timer_double_start_rejected() {
        let mut t = pending_task();
        start_review_timer(&mut t, &qa(), at(10, 0)).unwrap();

        assert!(matches!(
            start_review_timer(&mut t, &qa(), at(10, 5)),
            Err(TaskError::InvalidState(_))
        ));
    }

    #[test]
    fn test_review_timer_requires_qa_role() {
        let mut t = pending_task();
        let dev = Actor {
            id: "dev-1".into(),
            role: Role::Developer,
        };
        assert!(matches!(
            start_review_timer(&mut t, &dev, at(10, 0)),
            Err(TaskError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_approve_keeps_task_in_pending_review() {
        let mut t = pending_task();

        approve(&mut t, &qa(), Some("looks solid".into()), at(11, 0)).unwrap();

        assert_eq!(t.qa_review_status, Some(QaReviewStatus::Approved));
        assert_eq!(t.qa_review_notes.as_deref(), Some("looks solid"));
        // QA approval is a precondition signal, not a status transition
        assert_eq!(t.status, TaskStatus::PendingReview);
    }

    #[test]
    fn test_fail_requires_notes_and_bugs() {
        let mut t = pending_task();

        assert!(matches!(
            fail(&mut t, &qa(), "  ", 2, at(11, 0)),
            Err(TaskError::Validation(_))
        ));
        assert!(matches!(
            fail(&mut t, &qa(), "crashes on empty list", 0, at(11, 0)),
            Err(TaskError::Validation(_))
        ));
    }

    #[test]
    fn test_fail_returns_task_to_developer() {
        let mut t = pending_task();
        start_review_timer(&mut t, &qa(), at(11, 0)).unwrap();

        fail(&mut t, &qa(), "crashes on empty list", 2, at(11, 30)).unwrap();

        assert_eq!(t.qa_review_status, Some(QaReviewStatus::Failed));
        assert_eq!(t.bugs_found, 2);
        assert_eq!(t.status, TaskStatus::ChangesRequested);
        // The open review span folds before the verdict lands
        assert!(!t.is_qa_timer_running);
        assert_eq!(t.qa_time_spent, 1800);
    }

    #[test]
    fn test_verdict_rejected_outside_pending_review() {
        let mut t = pending_task();
        t.status = TaskStatus::InProgress;

        assert!(matches!(
            approve(&mut t, &qa(), None, at(11, 0)),
            Err(TaskError::InvalidState(_))
        ));
    }
}
