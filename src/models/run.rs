//! State of one orchestration run: the day tasks and their outcomes.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::request::GenerationRequest;
use super::workout::BackendWorkout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
  Pending,
  Succeeded,
  Failed,
}

impl std::fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Pending => write!(f, "pending"),
      Self::Succeeded => write!(f, "succeeded"),
      Self::Failed => write!(f, "failed"),
    }
  }
}

/// Payload and failure reason folded into the status so that each is
/// present exactly when its status says so.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOutcome {
  Pending,
  Succeeded { workout: BackendWorkout },
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Day {index} ({date}) already settled as {status}")]
pub struct AlreadySettled {
  pub index: usize,
  pub date: NaiveDate,
  pub status: TaskStatus,
}

/// ---------------------------------------------------------------------------
/// Day Task
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTask {
  pub sequence_index: usize,
  pub scheduled_date: NaiveDate,
  outcome: TaskOutcome,
}

impl DayTask {
  pub fn new(sequence_index: usize, scheduled_date: NaiveDate) -> Self {
    Self {
      sequence_index,
      scheduled_date,
      outcome: TaskOutcome::Pending,
    }
  }

  pub fn status(&self) -> TaskStatus {
    match self.outcome {
      TaskOutcome::Pending => TaskStatus::Pending,
      TaskOutcome::Succeeded { .. } => TaskStatus::Succeeded,
      TaskOutcome::Failed { .. } => TaskStatus::Failed,
    }
  }

  pub fn outcome(&self) -> &TaskOutcome {
    &self.outcome
  }

  pub fn result_payload(&self) -> Option<&BackendWorkout> {
    match &self.outcome {
      TaskOutcome::Succeeded { workout } => Some(workout),
      _ => None,
    }
  }

  pub fn failure_reason(&self) -> Option<&str> {
    match &self.outcome {
      TaskOutcome::Failed { reason } => Some(reason),
      _ => None,
    }
  }

  pub fn is_pending(&self) -> bool {
    self.status() == TaskStatus::Pending
  }

  pub fn succeed(&mut self, workout: BackendWorkout) -> Result<(), AlreadySettled> {
    self.settle(TaskOutcome::Succeeded { workout })
  }

  pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), AlreadySettled> {
    self.settle(TaskOutcome::Failed {
      reason: reason.into(),
    })
  }

  fn settle(&mut self, outcome: TaskOutcome) -> Result<(), AlreadySettled> {
    if !self.is_pending() {
      return Err(AlreadySettled {
        index: self.sequence_index,
        date: self.scheduled_date,
        status: self.status(),
      });
    }
    self.outcome = outcome;
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Generation Run
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
  NotStarted,
  Running,
  Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRun {
  pub user_id: String,
  pub request: GenerationRequest,
  pub anchor: NaiveDate,
  pub requested_days: usize,
  pub tasks: Vec<DayTask>,
  pub phase: RunPhase,
}

impl GenerationRun {
  /// Consecutive days starting at `anchor`
  pub fn consecutive(user_id: &str, request: GenerationRequest, anchor: NaiveDate) -> Self {
    let dates = (0..request.days as i64)
      .map(|offset| anchor + Duration::days(offset))
      .collect();
    Self::for_dates(user_id, request, anchor, dates)
  }

  /// Arbitrary dates of a plan starting at `anchor`, in the given order
  /// (used for retries)
  pub fn for_dates(
    user_id: &str,
    request: GenerationRequest,
    anchor: NaiveDate,
    dates: Vec<NaiveDate>,
  ) -> Self {
    let tasks: Vec<DayTask> = dates
      .into_iter()
      .enumerate()
      .map(|(i, date)| DayTask::new(i, date))
      .collect();

    Self {
      user_id: user_id.to_string(),
      request,
      anchor,
      requested_days: tasks.len(),
      tasks,
      phase: RunPhase::NotStarted,
    }
  }

  pub fn completed_count(&self) -> usize {
    self
      .tasks
      .iter()
      .filter(|t| t.status() == TaskStatus::Succeeded)
      .count()
  }

  pub fn failed_count(&self) -> usize {
    self
      .tasks
      .iter()
      .filter(|t| t.status() == TaskStatus::Failed)
      .count()
  }

  pub fn is_terminal(&self) -> bool {
    self.tasks.iter().all(|t| !t.is_pending())
  }

  pub fn is_partial_success(&self) -> bool {
    self.is_terminal() && self.completed_count() > 0 && self.failed_count() > 0
  }

  pub fn failed_dates(&self) -> Vec<NaiveDate> {
    self
      .tasks
      .iter()
      .filter(|t| t.status() == TaskStatus::Failed)
      .map(|t| t.scheduled_date)
      .collect()
  }

  pub fn task_for(&self, date: NaiveDate) -> Option<&DayTask> {
    self.tasks.iter().find(|t| t.scheduled_date == date)
  }

  /// 1-based position of `date` in the plan, counted from the anchor
  pub fn plan_day(&self, date: NaiveDate) -> usize {
    (date - self.anchor).num_days().max(0) as usize + 1
  }

  /// Length of the plan the run belongs to; retries keep the original length
  pub fn plan_length(&self) -> usize {
    (self.request.days as usize).max(self.requested_days)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::SportType;
  use crate::test_utils::{date, mock_backend_workout};

  #[test]
  fn test_consecutive_run_dates() {
    let req = GenerationRequest::new(7, SportType::Hiit, 45);
    let run = GenerationRun::consecutive("u1", req, date(2026, 10, 18));

    assert_eq!(run.requested_days, 7);
    assert_eq!(run.tasks.len(), 7);
    for (i, task) in run.tasks.iter().enumerate() {
      assert_eq!(task.sequence_index, i);
      assert_eq!(task.scheduled_date, date(2026, 10, 18) + Duration::days(i as i64));
      assert_eq!(task.status(), TaskStatus::Pending);
    }
    assert_eq!(run.phase, RunPhase::NotStarted);
    assert!(!run.is_terminal());
  }

  #[test]
  fn test_task_settles_exactly_once() {
    let mut task = DayTask::new(0, date(2026, 10, 18));
    task.succeed(mock_backend_workout("w1", "# Day")).unwrap();
    assert_eq!(task.status(), TaskStatus::Succeeded);
    assert!(task.result_payload().is_some());
    assert!(task.failure_reason().is_none());

    let err = task.fail("late failure").unwrap_err();
    assert_eq!(err.status, TaskStatus::Succeeded);
    assert_eq!(task.status(), TaskStatus::Succeeded);
  }

  #[test]
  fn test_counts_and_terminal_state() {
    let req = GenerationRequest::new(3, SportType::Strength, 45);
    let mut run = GenerationRun::consecutive("u1", req, date(2026, 10, 18));

    run.tasks[0].succeed(mock_backend_workout("w1", "# A")).unwrap();
    run.tasks[1].fail("HTTP 500").unwrap();
    assert!(!run.is_terminal());

    run.tasks[2].succeed(mock_backend_workout("w3", "# C")).unwrap();
    assert!(run.is_terminal());
    assert_eq!(run.completed_count(), 2);
    assert_eq!(run.failed_count(), 1);
    assert!(run.is_partial_success());
    assert_eq!(run.failed_dates(), vec![date(2026, 10, 19)]);
    assert_eq!(run.task_for(date(2026, 10, 19)).unwrap().failure_reason(), Some("HTTP 500"));
  }

  #[test]
  fn test_for_dates_keeps_given_order() {
    let req = GenerationRequest::new(7, SportType::Strength, 45);
    let run = GenerationRun::for_dates(
      "u1",
      req,
      date(2026, 10, 18),
      vec![date(2026, 10, 21), date(2026, 10, 23)],
    );
    assert_eq!(run.anchor, date(2026, 10, 18));
    assert_eq!(run.requested_days, 2);
    assert_eq!(run.tasks[1].scheduled_date, date(2026, 10, 23));
    assert_eq!(run.tasks[1].sequence_index, 1);

    // Positions stay relative to the whole plan
    assert_eq!(run.plan_length(), 7);
    assert_eq!(run.plan_day(date(2026, 10, 21)), 4);
    assert_eq!(run.plan_day(date(2026, 10, 23)), 6);
  }
}
