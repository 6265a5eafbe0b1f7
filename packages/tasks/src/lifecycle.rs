// ABOUTME: Task lifecycle state machine
// ABOUTME: A single transition table keyed on (current status, requested
// ABOUTME: status, actor) producing an effect plan or a typed rejection

use chrono::{DateTime, Utc};

use crate::error::{TaskError, TaskResult};
use crate::scoring::efficiency_bonus;
use crate::timeclock::{open_work_clocks, settle_qa_clock, settle_work_clocks};
use crate::types::{Actor, ReviewDecision, Task, TaskStatus};

/// Side-effect bundle for one status transition. Planned by the pure guard
/// functions below, applied in one place by [`apply_plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub to: TaskStatus,
    /// Settle gross + focus clocks, folding elapsed time.
    pub stop_work_clocks: bool,
    /// Open gross + focus clocks.
    pub start_work_clocks: bool,
    /// Run the scoring engine. Exclusive to the review-submission path: a
    /// task moved around with `plan_set_status` never earns a bonus.
    pub run_scoring: bool,
    pub proof_url: Option<String>,
    /// Clear the QA verdict so a resubmission gets a fresh review cycle.
    pub reset_qa_cycle: bool,
}

impl TransitionPlan {
    fn status_only(to: TaskStatus) -> Self {
        Self {
            to,
            stop_work_clocks: false,
            start_work_clocks: false,
            run_scoring: false,
            proof_url: None,
            reset_qa_cycle: false,
        }
    }
}

fn require_assignee(task: &Task, actor: &Actor) -> TaskResult<()> {
    if !task.is_assignee(actor) {
        return Err(TaskError::Unauthorized(format!(
            "actor {} is not the assignee of task {}",
            actor.id, task.id
        )));
    }
    Ok(())
}

fn require_manager(actor: &Actor) -> TaskResult<()> {
    if !actor.is_manager() {
        return Err(TaskError::Unauthorized(format!(
            "actor {} lacks the manager role",
            actor.id
        )));
    }
    Ok(())
}

/// Assignee picks up a task: Todo or Changes Requested -> In Progress,
/// starting both work clocks.
pub fn plan_start_work(task: &Task, actor: &Actor) -> TaskResult<TransitionPlan> {
    require_assignee(task, actor)?;

    match task.status {
        TaskStatus::Todo | TaskStatus::ChangesRequested => Ok(TransitionPlan {
            start_work_clocks: true,
            ..TransitionPlan::status_only(TaskStatus::InProgress)
        }),
        other => Err(TaskError::InvalidState(format!(
            "cannot start work from {:?}",
            other
        ))),
    }
}

/// Assignee submits for review: In Progress -> Pending Review. Requires a
/// proof reference, stops the clocks, and is the only path that scores.
pub fn plan_submit_for_review(
    task: &Task,
    actor: &Actor,
    proof_url: &str,
) -> TaskResult<TransitionPlan> {
    require_assignee(task, actor)?;

    if task.status != TaskStatus::InProgress {
        return Err(TaskError::InvalidState(format!(
            "cannot submit for review from {:?}",
            task.status
        )));
    }
    if proof_url.trim().is_empty() {
        return Err(TaskError::Validation("proof reference is required".into()));
    }

    Ok(TransitionPlan {
        stop_work_clocks: true,
        run_scoring: true,
        proof_url: Some(proof_url.trim().to_string()),
        reset_qa_cycle: true,
        ..TransitionPlan::status_only(TaskStatus::PendingReview)
    })
}

/// Manager verdict on a Pending Review task.
pub fn plan_review_decision(
    task: &Task,
    actor: &Actor,
    decision: ReviewDecision,
) -> TaskResult<TransitionPlan> {
    require_manager(actor)?;

    if task.status != TaskStatus::PendingReview {
        return Err(TaskError::InvalidState(format!(
            "cannot review a task in {:?}",
            task.status
        )));
    }

    let to = match decision {
        ReviewDecision::Completed => TaskStatus::Completed,
        ReviewDecision::ChangesRequested => TaskStatus::ChangesRequested,
    };

    Ok(TransitionPlan {
        // Completed implies all clocks stopped; settling is a no-op when the
        // submission already closed them.
        stop_work_clocks: to == TaskStatus::Completed,
        ..TransitionPlan::status_only(to)
    })
}

/// Direct status change by the assignee between any two different statuses.
/// Clock side effects apply symmetrically; scoring never runs here.
pub fn plan_set_status(
    task: &Task,
    actor: &Actor,
    status: TaskStatus,
) -> TaskResult<TransitionPlan> {
    require_assignee(task, actor)?;

    if status == task.status {
        return Err(TaskError::InvalidState(format!(
            "task is already in {:?}",
            status
        )));
    }

    Ok(TransitionPlan {
        stop_work_clocks: task.status == TaskStatus::InProgress || status == TaskStatus::Completed,
        start_work_clocks: status == TaskStatus::InProgress,
        ..TransitionPlan::status_only(status)
    })
}

/// Apply a planned transition to the task record.
pub fn apply_plan(task: &mut Task, plan: &TransitionPlan, now: DateTime<Utc>) {
    if plan.stop_work_clocks {
        settle_work_clocks(task, now);
    }
    if plan.run_scoring {
        // Score after the fold so the focus total includes the final span.
        task.efficiency_bonus = Some(efficiency_bonus(
            task.estimated_hours,
            task.total_seconds_spent,
        ));
    }
    if let Some(proof) = &plan.proof_url {
        task.proof_url = Some(proof.clone());
    }
    if plan.reset_qa_cycle {
        task.qa_review_status = None;
        task.qa_review_notes = None;
        task.bugs_found = 0;
    }

    task.status = plan.to;
    task.completed_at = match plan.to {
        TaskStatus::Completed => Some(now),
        _ => None,
    };
    // A completed task leaves no clock running, the reviewer's included.
    if plan.to == TaskStatus::Completed {
        settle_qa_clock(task, now);
    }

    if plan.start_work_clocks {
        open_work_clocks(task, now);
    }
}

/// Assignee flips the blocker flag on their own task. Setting it stores the
/// note; clearing it empties the note. Independent of status. Returns the
/// new blocked state.
pub fn toggle_blocker(task: &mut Task, actor: &Actor, note: Option<String>) -> TaskResult<bool> {
    require_assignee(task, actor)?;

    if task.is_blocked {
        task.is_blocked = false;
        task.blocker_note = String::new();
    } else {
        task.is_blocked = true;
        task.blocker_note = note.unwrap_or_default();
    }
    Ok(task.is_blocked)
}

/// Manager clears a blocker from any status.
pub fn unblock(task: &mut Task, actor: &Actor) -> TaskResult<()> {
    require_manager(actor)?;

    task.is_blocked = false;
    task.blocker_note = String::new();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Complexity, Priority, Role};
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, h, 0, 0).unwrap()
    }

    fn dev() -> Actor {
        Actor {
            id: "dev-1".into(),
            role: Role::Developer,
        }
    }

    fn manager() -> Actor {
        Actor {
            id: "mgr-1".into(),
            role: Role::Manager,
        }
    }

    fn task(status: TaskStatus) -> Task {
        Task {
            id: "t-1".into(),
            title: "Wire up exports".into(),
            description: None,
            project_id: None,
            sprint_id: None,
            complexity: Complexity::Medium,
            story_points: None,
            priority: Priority::Medium,
            assigned_to: "dev-1".into(),
            created_by: "mgr-1".into(),
            status,
            estimated_hours: 10.0,
            actual_hours: 0.0,
            total_seconds_spent: 0,
            started_at: None,
            is_timer_running: false,
            timer_start_time: None,
            efficiency_bonus: None,
            proof_url: None,
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
            version: 0,
            created_at: at(8),
            updated_at: at(8),
        }
    }

    #[test]
    fn test_start_work_opens_both_clocks() {
        let mut t = task(TaskStatus::Todo);
        let plan = plan_start_work(&t, &dev()).unwrap();
        apply_plan(&mut t, &plan, at(9));

        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.started_at, Some(at(9)));
        assert!(t.is_timer_running);
        assert_eq!(t.timer_start_time, Some(at(9)));
    }

    #[test]
    fn test_start_work_allowed_after_changes_requested() {
        let t = task(TaskStatus::ChangesRequested);
        assert!(plan_start_work(&t, &dev()).is_ok());
    }

    #[test]
    fn test_start_work_rejects_non_assignee() {
        let t = task(TaskStatus::Todo);
        let stranger = Actor {
            id: "dev-2".into(),
            role: Role::Developer,
        };
        assert!(matches!(
            plan_start_work(&t, &stranger),
            Err(TaskError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_start_work_rejects_wrong_status() {
        let t = task(TaskStatus::PendingReview);
        assert!(matches!(
            plan_start_work(&t, &dev()),
            Err(TaskError::InvalidState(_))
        ));
    }

    #[test]
    fn test_submit_requires_proof() {
        let t = task(TaskStatus::InProgress);
        assert!(matches!(
            plan_submit_for_review(&t, &dev(), "   "),
            Err(TaskError::Validation(_))
        ));
    }

    #[test]
    fn test_submit_folds_time_and_scores() {
        let mut t = task(TaskStatus::InProgress);
        t.started_at = Some(at(9));
        t.is_timer_running = true;
        t.timer_start_time = Some(at(9));

        let plan = plan_submit_for_review(&t, &dev(), "https://pr/42").unwrap();
        apply_plan(&mut t, &plan, at(17));

        assert_eq!(t.status, TaskStatus::PendingReview);
        assert_eq!(t.proof_url.as_deref(), Some("https://pr/42"));
        assert_eq!(t.total_seconds_spent, 8 * 3600);
        assert!((t.actual_hours - 8.0).abs() < 1e-9);
        assert!(t.started_at.is_none());
        assert!(!t.is_timer_running);
        // 2h under a 10h estimate at 10 points/h
        assert_eq!(t.efficiency_bonus, Some(20));
    }

    #[test]
    fn test_resubmission_resets_qa_verdict() {
        let mut t = task(TaskStatus::InProgress);
        t.qa_review_status = Some(crate::types::QaReviewStatus::Failed);
        t.qa_review_notes = Some("broken".into());
        t.bugs_found = 3;

        let plan = plan_submit_for_review(&t, &dev(), "https://pr/43").unwrap();
        apply_plan(&mut t, &plan, at(10));

        assert!(t.qa_review_status.is_none());
        assert!(t.qa_review_notes.is_none());
        assert_eq!(t.bugs_found, 0);
    }

    #[test]
    fn test_review_decision_requires_manager() {
        let t = task(TaskStatus::PendingReview);
        assert!(matches!(
            plan_review_decision(&t, &dev(), ReviewDecision::Completed),
            Err(TaskError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_review_decision_requires_pending_review() {
        let t = task(TaskStatus::InProgress);
        assert!(matches!(
            plan_review_decision(&t, &manager(), ReviewDecision::Completed),
            Err(TaskError::InvalidState(_))
        ));
    }

    #[test]
    fn test_approval_sets_completed_at_and_stops_clocks() {
        let mut t = task(TaskStatus::PendingReview);
        let plan = plan_review_decision(&t, &manager(), ReviewDecision::Completed).unwrap();
        apply_plan(&mut t, &plan, at(15));

        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completed_at, Some(at(15)));
        assert!(t.started_at.is_none());
        assert!(!t.is_timer_running);
    }

    #[test]
    fn test_approval_folds_open_qa_clock() {
        let mut t = task(TaskStatus::PendingReview);
        t.is_qa_timer_running = true;
        t.qa_timer_start_time = Some(at(14));

        let plan = plan_review_decision(&t, &manager(), ReviewDecision::Completed).unwrap();
        apply_plan(&mut t, &plan, at(15));

        assert_eq!(t.status, TaskStatus::Completed);
        assert!(!t.is_qa_timer_running);
        assert!(t.qa_timer_start_time.is_none());
        assert_eq!(t.qa_time_spent, 3600);
    }

    #[test]
    fn test_set_status_never_scores() {
        let mut t = task(TaskStatus::InProgress);
        t.started_at = Some(at(9));
        t.is_timer_running = true;
        t.timer_start_time = Some(at(9));

        let plan = plan_set_status(&t, &dev(), TaskStatus::PendingReview).unwrap();
        apply_plan(&mut t, &plan, at(12));

        // Time folds but no bonus: scoring belongs to the submission path only
        assert_eq!(t.total_seconds_spent, 3 * 3600);
        assert_eq!(t.efficiency_bonus, None);
        assert!(t.proof_url.is_none());
    }

    #[test]
    fn test_set_status_same_status_rejected() {
        let t = task(TaskStatus::Todo);
        assert!(matches!(
            plan_set_status(&t, &dev(), TaskStatus::Todo),
            Err(TaskError::InvalidState(_))
        ));
    }

    #[test]
    fn test_set_status_into_in_progress_restarts_clocks() {
        let mut t = task(TaskStatus::PendingReview);
        let plan = plan_set_status(&t, &dev(), TaskStatus::InProgress).unwrap();
        apply_plan(&mut t, &plan, at(13));

        assert_eq!(t.started_at, Some(at(13)));
        assert!(t.is_timer_running);
    }

    #[test]
    fn test_toggle_blocker_round_trip_clears_note() {
        let mut t = task(TaskStatus::InProgress);

        let blocked = toggle_blocker(&mut t, &dev(), Some("waiting on API keys".into())).unwrap();
        assert!(blocked);
        assert_eq!(t.blocker_note, "waiting on API keys");

        let blocked = toggle_blocker(&mut t, &dev(), None).unwrap();
        assert!(!blocked);
        assert_eq!(t.blocker_note, "");
    }

    #[test]
    fn test_unblock_is_manager_only() {
        let mut t = task(TaskStatus::InProgress);
        t.is_blocked = true;
        t.blocker_note = "stuck".into();

        assert!(matches!(
            unblock(&mut t, &dev()),
            Err(TaskError::Unauthorized(_))
        ));

        unblock(&mut t, &manager()).unwrap();
        assert!(!t.is_blocked);
        assert_eq!(t.blocker_note, "");
    }
}
