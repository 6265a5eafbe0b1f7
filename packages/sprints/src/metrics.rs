// ABOUTME: Read-side sprint metrics
// ABOUTME: Pure projections over task slices: status stats, burndown curve,
// ABOUTME: velocity, weekly leaderboard and all-time team stats

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use cadence_tasks::{Task, TaskStatus};

/// Per-sprint task statistics, recomputed per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub pending_review: usize,
    pub completed: usize,
    pub changes_requested: usize,
    pub blocked: usize,
    pub total_points: i64,
    pub completed_points: i64,
}

pub fn task_stats(tasks: &[Task]) -> TaskStats {
    let mut stats = TaskStats::default();
    for task in tasks {
        stats.total_tasks += 1;
        match task.status {
            TaskStatus::Todo => stats.todo += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::PendingReview => stats.pending_review += 1,
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::ChangesRequested => stats.changes_requested += 1,
        }
        if task.is_blocked {
            stats.blocked += 1;
        }
        stats.total_points += task.points();
        if task.status == TaskStatus::Completed {
            stats.completed_points += task.points();
        }
    }
    stats
}

/// One day on the burndown chart. `actual` is None for future dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurndownPoint {
    pub date: NaiveDate,
    pub ideal: f64,
    pub actual: Option<i64>,
}

/// Day-by-day ideal vs actual remaining points for a sprint date range.
///
/// The actual line consumes the explicit `completed_at` stamp written at the
/// Completed transition, and `today` is passed in by the caller so the curve
/// is a pure function of its inputs.
pub fn burndown(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    tasks: &[Task],
    today: DateTime<Utc>,
) -> Vec<BurndownPoint> {
    let total_points: i64 = tasks.iter().map(Task::points).sum();

    let span_secs = (end_date - start_date).num_seconds().max(0);
    let duration_days = ((span_secs as f64 / 86_400.0).ceil() as i64).max(1);
    let daily_burn = total_points as f64 / duration_days as f64;

    let mut points = Vec::with_capacity(duration_days as usize + 1);
    for i in 0..=duration_days {
        let date = start_date + Duration::days(i);
        let ideal = (total_points as f64 - daily_burn * i as f64).max(0.0);
        let ideal = (ideal * 10.0).round() / 10.0;

        let actual = if date.date_naive() <= today.date_naive() {
            let completed_points: i64 = tasks
                .iter()
                .filter(|t| {
                    t.status == TaskStatus::Completed
                        && t.completed_at
                            .is_some_and(|done| done.date_naive() <= date.date_naive())
                })
                .map(|t| t.points())
                .sum();
            Some(total_points - completed_points)
        } else {
            None
        };

        points.push(BurndownPoint {
            date: date.date_naive(),
            ideal,
            actual,
        });
    }
    points
}

/// Sum of completed task points; frozen onto the sprint at completion.
pub fn velocity(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| t.points())
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub person_id: String,
    pub total_points: i64,
    pub completed_tasks: usize,
}

/// Completed-task points per assignee for one explicit ISO week number.
/// The efficiency bonus deliberately does not feed into these totals.
pub fn weekly_leaderboard(tasks: &[Task], week_number: u32) -> Vec<LeaderboardEntry> {
    let mut by_person: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for task in tasks {
        if task.status != TaskStatus::Completed || task.week_number != week_number as i64 {
            continue;
        }
        let entry = by_person.entry(task.assigned_to.as_str()).or_default();
        entry.0 += task.points();
        entry.1 += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = by_person
        .into_iter()
        .map(|(person_id, (total_points, completed_tasks))| LeaderboardEntry {
            person_id: person_id.to_string(),
            total_points,
            completed_tasks,
        })
        .collect();
    entries.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    entries
}

/// All-time per-member breakdown, independent of week.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberStats {
    pub person_id: String,
    pub total_tasks: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub pending_review: usize,
    pub completed: usize,
    pub changes_requested: usize,
    pub blocked: usize,
    pub total_points: i64,
}

pub fn team_stats(tasks: &[Task]) -> Vec<MemberStats> {
    let mut by_person: BTreeMap<&str, MemberStats> = BTreeMap::new();
    for task in tasks {
        let entry = by_person
            .entry(task.assigned_to.as_str())
            .or_insert_with(|| MemberStats {
                person_id: task.assigned_to.clone(),
                ..MemberStats::default()
            });
        entry.total_tasks += 1;
        match task.status {
            TaskStatus::Todo => entry.todo += 1,
            TaskStatus::InProgress => entry.in_progress += 1,
            TaskStatus::PendingReview => entry.pending_review += 1,
            TaskStatus::Completed => entry.completed += 1,
            TaskStatus::ChangesRequested => entry.changes_requested += 1,
        }
        if task.is_blocked {
            entry.blocked += 1;
        }
        entry.total_points += task.points();
    }
    by_person.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_tasks::{Complexity, Priority, Task};
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()
    }

    fn task(id: &str, assignee: &str, status: TaskStatus, points: i64) -> Task {
        Task {
            id: id.into(),
            title: format!("task {}", id),
            description: None,
            project_id: Some("proj-1".into()),
            sprint_id: Some("sprint-1".into()),
            complexity: Complexity::Easy,
            story_points: Some(points),
            priority: Priority::Medium,
            assigned_to: assignee.into(),
            created_by: "mgr-1".into(),
            status,
            estimated_hours: 0.0,
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
            created_at: day(1),
            updated_at: day(1),
        }
    }

    #[test]
    fn test_task_stats_counts_and_points() {
        let mut blocked = task("t3", "dev-2", TaskStatus::InProgress, 3);
        blocked.is_blocked = true;

        let tasks = vec![
            task("t1", "dev-1", TaskStatus::Completed, 5),
            task("t2", "dev-1", TaskStatus::Todo, 2),
            blocked,
        ];

        let stats = task_stats(&tasks);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.total_points, 10);
        assert_eq!(stats.completed_points, 5);
    }

    #[test]
    fn test_points_fall_back_to_complexity() {
        let mut t = task("t1", "dev-1", TaskStatus::Todo, 0);
        t.story_points = None;
        t.complexity = Complexity::Hard;
        assert_eq!(t.points(), 5);
    }

    #[test]
    fn test_burndown_ideal_line() {
        // 20 points over a 10-day sprint: dailyBurn = 2
        let tasks = vec![
            task("t1", "dev-1", TaskStatus::Todo, 12),
            task("t2", "dev-2", TaskStatus::Todo, 8),
        ];

        let points = burndown(day(1), day(11), &tasks, day(1));
        assert_eq!(points.len(), 11);
        assert_eq!(points[0].ideal, 20.0);
        assert_eq!(points[5].ideal, 10.0);
        assert_eq!(points[10].ideal, 0.0);
    }

    #[test]
    fn test_burndown_actual_uses_completion_date() {
        let mut done = task("t1", "dev-1", TaskStatus::Completed, 8);
        done.completed_at = Some(day(3));
        let tasks = vec![done, task("t2", "dev-2", TaskStatus::Todo, 12)];

        // Viewed on day 5 of a 10-day sprint
        let points = burndown(day(1), day(11), &tasks, day(5));

        assert_eq!(points[0].actual, Some(20));
        assert_eq!(points[2].actual, Some(12));
        assert_eq!(points[4].actual, Some(12));
        // Future dates have no actual data
        assert_eq!(points[5].actual, None);
        assert_eq!(points[10].actual, None);
    }

    #[test]
    fn test_burndown_single_day_range() {
        let tasks = vec![task("t1", "dev-1", TaskStatus::Todo, 4)];
        let points = burndown(day(1), day(1), &tasks, day(1));

        // Degenerate range still produces a start and end point
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].ideal, 4.0);
        assert_eq!(points[1].ideal, 0.0);
    }

    #[test]
    fn test_velocity_sums_completed_only() {
        let tasks = vec![
            task("t1", "dev-1", TaskStatus::Completed, 5),
            task("t2", "dev-1", TaskStatus::Completed, 3),
            task("t3", "dev-2", TaskStatus::PendingReview, 8),
        ];
        assert_eq!(velocity(&tasks), 8);
    }

    #[test]
    fn test_weekly_leaderboard_filters_and_ranks() {
        let mut other_week = task("t4", "dev-2", TaskStatus::Completed, 13);
        other_week.week_number = 22;

        let tasks = vec![
            task("t1", "dev-1", TaskStatus::Completed, 5),
            task("t2", "dev-2", TaskStatus::Completed, 8),
            task("t3", "dev-1", TaskStatus::InProgress, 5), // not completed
            other_week,                                     // wrong week
        ];

        let board = weekly_leaderboard(&tasks, 23);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].person_id, "dev-2");
        assert_eq!(board[0].total_points, 8);
        assert_eq!(board[0].completed_tasks, 1);
        assert_eq!(board[1].person_id, "dev-1");
        assert_eq!(board[1].total_points, 5);
    }

    #[test]
    fn test_team_stats_groups_all_statuses() {
        let mut blocked = task("t2", "dev-1", TaskStatus::ChangesRequested, 2);
        blocked.is_blocked = true;

        let tasks = vec![
            task("t1", "dev-1", TaskStatus::Completed, 5),
            blocked,
            task("t3", "dev-2", TaskStatus::Todo, 1),
        ];

        let stats = team_stats(&tasks);
        assert_eq!(stats.len(), 2);

        let dev1 = stats.iter().find(|s| s.person_id == "dev-1").unwrap();
        assert_eq!(dev1.total_tasks, 2);
        assert_eq!(dev1.completed, 1);
        assert_eq!(dev1.changes_requested, 1);
        assert_eq!(dev1.blocked, 1);
        assert_eq!(dev1.total_points, 7);
    }
}
