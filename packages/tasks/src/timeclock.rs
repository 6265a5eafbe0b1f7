// ABOUTME: Duration tracking for tasks
// ABOUTME: One TimeClock tracker driven by explicit start/stop events, used
// ABOUTME: for the gross, focus and QA clocks so elapsed time is folded once

use chrono::{DateTime, Utc};

use cadence_core::seconds_between;

use crate::error::{TaskError, TaskResult};
use crate::types::Task;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// A single accumulating clock: a running total plus at most one open span.
///
/// Every stop folds exactly the span opened by the matching start, so a
/// value can never be added twice no matter how callers interleave status
/// changes and explicit timer events.
///
/// Three instances live on each task:
/// - gross: wall-clock while the task is In Progress, feeds `actual_hours`
/// - focus: the explicit stopwatch, feeds `total_seconds_spent`
/// - qa: the reviewer's clock, feeds `qa_time_spent`
#[derive(Debug, Clone, PartialEq)]
pub struct TimeClock {
    pub accumulated_secs: i64,
    pub running_since: Option<DateTime<Utc>>,
}

impl TimeClock {
    pub fn new(accumulated_secs: i64, running_since: Option<DateTime<Utc>>) -> Self {
        Self {
            accumulated_secs,
            running_since,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Open a span. Rejected if one is already open.
    pub fn start(&mut self, now: DateTime<Utc>) -> TaskResult<()> {
        if self.running_since.is_some() {
            return Err(TaskError::InvalidState("timer is already running".into()));
        }
        self.running_since = Some(now);
        Ok(())
    }

    /// Close the open span, folding it into the total. Rejected if none is
    /// open. Returns the folded span in seconds.
    pub fn stop(&mut self, now: DateTime<Utc>) -> TaskResult<i64> {
        let since = self
            .running_since
            .take()
            .ok_or_else(|| TaskError::InvalidState("timer is not running".into()))?;
        let span = seconds_between(since, now);
        self.accumulated_secs += span;
        Ok(span)
    }

    /// Close the open span if there is one; no-op otherwise. Used by status
    /// transitions, where "stopped" is the postcondition rather than a guard.
    pub fn settle(&mut self, now: DateTime<Utc>) -> i64 {
        match self.stop(now) {
            Ok(span) => span,
            Err(_) => 0,
        }
    }
}

/// Open both work clocks (gross + focus) on entry to In Progress.
pub fn open_work_clocks(task: &mut Task, now: DateTime<Utc>) {
    if task.started_at.is_none() {
        task.started_at = Some(now);
    }
    if !task.is_timer_running {
        task.is_timer_running = true;
        task.timer_start_time = Some(now);
    }
}

/// Close both work clocks, folding elapsed time into the task's accumulators.
/// Safe to call when either clock is already stopped.
pub fn settle_work_clocks(task: &mut Task, now: DateTime<Utc>) {
    let mut gross = TimeClock::new(0, task.started_at);
    let gross_secs = gross.settle(now);
    task.actual_hours += gross_secs as f64 / SECONDS_PER_HOUR;
    task.started_at = None;

    let mut focus = TimeClock::new(task.total_seconds_spent, task.timer_start_time);
    focus.settle(now);
    task.total_seconds_spent = focus.accumulated_secs;
    task.is_timer_running = false;
    task.timer_start_time = None;
}

/// Explicit stopwatch start. Rejected when already running.
pub fn start_focus_clock(task: &mut Task, now: DateTime<Utc>) -> TaskResult<()> {
    let mut focus = TimeClock::new(task.total_seconds_spent, task.timer_start_time);
    focus.start(now)?;
    task.is_timer_running = true;
    task.timer_start_time = focus.running_since;
    Ok(())
}

/// Explicit stopwatch stop. Rejected when not running. Republishes
/// `actual_hours` from focus seconds so both readings agree on screen.
pub fn stop_focus_clock(task: &mut Task, now: DateTime<Utc>) -> TaskResult<()> {
    let mut focus = TimeClock::new(task.total_seconds_spent, task.timer_start_time);
    focus.stop(now)?;
    task.total_seconds_spent = focus.accumulated_secs;
    task.is_timer_running = false;
    task.timer_start_time = None;
    task.actual_hours = task.total_seconds_spent as f64 / SECONDS_PER_HOUR;
    Ok(())
}

/// QA reviewer clock start, same exclusivity as the focus clock.
pub fn start_qa_clock(task: &mut Task, now: DateTime<Utc>) -> TaskResult<()> {
    let mut qa = TimeClock::new(task.qa_time_spent, task.qa_timer_start_time);
    qa.start(now)?;
    task.is_qa_timer_running = true;
    task.qa_timer_start_time = qa.running_since;
    Ok(())
}

/// Close the QA clock if it is open, folding into `qa_time_spent`. Used by
/// status transitions that must leave no clock running.
pub fn settle_qa_clock(task: &mut Task, now: DateTime<Utc>) {
    let mut qa = TimeClock::new(task.qa_time_spent, task.qa_timer_start_time);
    qa.settle(now);
    task.qa_time_spent = qa.accumulated_secs;
    task.is_qa_timer_running = false;
    task.qa_timer_start_time = None;
}

/// QA reviewer clock stop, folding into `qa_time_spent`.
pub fn stop_qa_clock(task: &mut Task, now: DateTime<Utc>) -> TaskResult<()> {
    let mut qa = TimeClock::new(task.qa_time_spent, task.qa_timer_start_time);
    qa.stop(now)?;
    task.qa_time_spent = qa.accumulated_secs;
    task.is_qa_timer_running = false;
    task.qa_timer_start_time = None;
    Ok(())
}
