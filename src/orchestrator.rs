//! Sequential multi-day generation
//!
//! Drives the generation client once per day, strictly one call at a time:
//! the service behind it is a rate-limited LLM worker, and later days build
//! on the exercises of the day before. A failed day is recorded and the run
//! moves on; only a run where nothing succeeded is an error.
//!
//! Progress goes out as `ProgressEvent`s on an unbounded channel: one when a
//! day starts and one when it settles.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{AiPreference, DayGenerationRequest, GenerationClient, GenerationError};
use crate::models::request::MAX_TEXT_PROMPT_CHARS;
use crate::models::workout::truncate_chars;
use crate::models::{BackendWorkout, GenerationRequest, GenerationRun, RunPhase};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const DEFAULT_PACING: Duration = Duration::from_millis(500);
pub const MAX_ATTEMPTS_PER_DAY: u32 = 5;
const EXCERPT_CHARS: usize = 120;
const USER_TEXT_CHARS: usize = 300;
const CANCELLED_REASON: &str = "cancelled before generation";

#[derive(Debug, Clone)]
pub struct RunOptions {
  /// Pause between consecutive days (and between attempts of one day)
  pub pacing: Duration,
  pub ai_preference: AiPreference,
  /// Calls per day including the first; 1 disables retries
  pub max_attempts: u32,
  /// Explicit first day; otherwise see `anchor_date`
  pub start_date: Option<NaiveDate>,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      pacing: DEFAULT_PACING,
      ai_preference: AiPreference::Cloud,
      max_attempts: 1,
      start_date: None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Progress Events
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
  DayStarted {
    index: usize,
    total: usize,
    date: NaiveDate,
  },
  DaySucceeded {
    index: usize,
    total: usize,
    date: NaiveDate,
    excerpt: String,
  },
  DayFailed {
    index: usize,
    total: usize,
    date: NaiveDate,
    reason: String,
  },
}

impl ProgressEvent {
  pub fn index(&self) -> usize {
    match self {
      Self::DayStarted { index, .. }
      | Self::DaySucceeded { index, .. }
      | Self::DayFailed { index, .. } => *index,
    }
  }

  /// Short chat-log line
  pub fn message(&self) -> String {
    match self {
      Self::DayStarted { index, total, date } => format!(
        "Generating day {}/{} ({})...",
        index + 1,
        total,
        date.format("%a %Y-%m-%d")
      ),
      Self::DaySucceeded {
        index,
        total,
        date,
        excerpt,
      } => format!("Day {}/{} ({}) ready: {}", index + 1, total, date, excerpt),
      Self::DayFailed {
        index,
        total,
        date,
        reason,
      } => format!("Day {}/{} ({}) failed: {}", index + 1, total, date, reason),
    }
  }
}

impl std::fmt::Display for ProgressEvent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.message())
  }
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum RunError {
  #[error("Not authenticated: sign in before generating workouts")]
  NotAuthenticated,

  #[error("No workouts could be generated: all {} day(s) failed", .run.requested_days)]
  NothingGenerated { run: Box<GenerationRun> },

  #[error("Nothing to retry: every day of the previous run succeeded")]
  NothingToRetry,
}

/// ---------------------------------------------------------------------------
/// Anchor Dates
/// ---------------------------------------------------------------------------

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
  date - ChronoDuration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Today for a single day; the current week's Sunday for multi-day runs so
/// they line up with the calendar grid
pub fn anchor_date(today: NaiveDate, days: u32) -> NaiveDate {
  if days <= 1 {
    today
  } else {
    week_start(today)
  }
}

/// ---------------------------------------------------------------------------
/// Orchestrator
/// ---------------------------------------------------------------------------

pub struct SequentialOrchestrator<C> {
  client: C,
  options: RunOptions,
  cancel: CancellationToken,
}

impl<C: GenerationClient> SequentialOrchestrator<C> {
  pub fn new(client: C, options: RunOptions) -> Self {
    Self {
      client,
      options: RunOptions {
        max_attempts: options.max_attempts.clamp(1, MAX_ATTEMPTS_PER_DAY),
        ..options
      },
      cancel: CancellationToken::new(),
    }
  }

  /// Stop after the in-flight day when `token` is cancelled
  pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
    self.cancel = token;
    self
  }

  pub fn client(&self) -> &C {
    &self.client
  }

  pub fn options(&self) -> &RunOptions {
    &self.options
  }

  /// Generate every day of `request` for `user_id`, one after another.
  ///
  /// Returns the terminal run when at least one day succeeded (partial
  /// success included). An empty user id is rejected before any task exists.
  pub async fn run_sequential_generation(
    &self,
    request: &GenerationRequest,
    user_id: &str,
    today: NaiveDate,
    progress: &ProgressSender,
  ) -> Result<GenerationRun, RunError> {
    if user_id.trim().is_empty() {
      return Err(RunError::NotAuthenticated);
    }

    let request = request.clamped();
    let anchor = self
      .options
      .start_date
      .unwrap_or_else(|| anchor_date(today, request.days));

    let mut run = GenerationRun::consecutive(user_id, request, anchor);
    info!(
      user_id,
      days = run.requested_days,
      %anchor,
      sport = %run.request.sport_type,
      "run_sequential_generation: starting"
    );

    self.drive(&mut run, None, progress).await;
    finish(run)
  }

  /// Re-run only the failed days of a finished run, as a new run
  pub async fn retry_failed(
    &self,
    previous: &GenerationRun,
    progress: &ProgressSender,
  ) -> Result<GenerationRun, RunError> {
    if previous.user_id.trim().is_empty() {
      return Err(RunError::NotAuthenticated);
    }

    let dates = previous.failed_dates();
    if dates.is_empty() {
      return Err(RunError::NothingToRetry);
    }

    let mut run = GenerationRun::for_dates(
      &previous.user_id,
      previous.request.clamped(),
      previous.anchor,
      dates,
    );
    info!(
      user_id = %run.user_id,
      days = run.requested_days,
      "retry_failed: retrying failed days"
    );

    self.drive(&mut run, Some(previous), progress).await;
    finish(run)
  }

  /// `prior` is the run being retried, consulted for the day before a task
  async fn drive(
    &self,
    run: &mut GenerationRun,
    prior: Option<&GenerationRun>,
    progress: &ProgressSender,
  ) {
    run.phase = RunPhase::Running;
    let total = run.tasks.len();

    for index in 0..total {
      if self.cancel.is_cancelled() {
        cancel_remaining(run, index, progress);
        break;
      }

      let date = run.tasks[index].scheduled_date;
      emit(progress, ProgressEvent::DayStarted { index, total, date });

      let day_request = self.day_request(run, index, prior);
      match self.attempt_day(&day_request).await {
        Ok(workout) => {
          let excerpt = workout.excerpt(EXCERPT_CHARS);
          if let Err(e) = run.tasks[index].succeed(workout) {
            warn!(error = %e, "drive: task settled twice");
          }
          debug!(index, %date, "drive: day succeeded");
          emit(
            progress,
            ProgressEvent::DaySucceeded {
              index,
              total,
              date,
              excerpt,
            },
          );
        }
        Err(err) => {
          let reason = err.to_string();
          warn!(index, %date, error = %reason, "drive: day failed");
          if let Err(e) = run.tasks[index].fail(reason.clone()) {
            warn!(error = %e, "drive: task settled twice");
          }
          emit(
            progress,
            ProgressEvent::DayFailed {
              index,
              total,
              date,
              reason,
            },
          );
        }
      }

      let is_last = index + 1 == total;
      if !is_last && !self.pause().await {
        cancel_remaining(run, index + 1, progress);
        break;
      }
    }

    run.phase = RunPhase::Complete;
    info!(
      completed = run.completed_count(),
      failed = run.failed_count(),
      requested = run.requested_days,
      "drive: run complete"
    );
  }

  async fn attempt_day(
    &self,
    request: &DayGenerationRequest,
  ) -> Result<BackendWorkout, GenerationError> {
    let mut attempt = 1;
    loop {
      match self.client.request_one_day(request).await {
        Ok(workout) => return Ok(workout),
        Err(err) if attempt < self.options.max_attempts && err.is_retryable() => {
          warn!(
            date = %request.day_date,
            attempt,
            error = %err,
            "attempt_day: retrying"
          );
          if !self.pause().await {
            return Err(err);
          }
          attempt += 1;
        }
        Err(err) => return Err(err),
      }
    }
  }

  /// Sleep for the pacing interval; false when cancelled meanwhile
  async fn pause(&self) -> bool {
    tokio::select! {
      _ = tokio::time::sleep(self.options.pacing) => true,
      _ = self.cancel.cancelled() => false,
    }
  }

  fn day_request(
    &self,
    run: &GenerationRun,
    index: usize,
    prior: Option<&GenerationRun>,
  ) -> DayGenerationRequest {
    let task = &run.tasks[index];
    let day_before = task.scheduled_date - ChronoDuration::days(1);
    let previous = run
      .task_for(day_before)
      .and_then(|t| t.result_payload())
      .or_else(|| {
        prior
          .and_then(|p| p.task_for(day_before))
          .and_then(|t| t.result_payload())
      });

    DayGenerationRequest {
      user_id: run.user_id.clone(),
      day_date: task.scheduled_date,
      focus_sport_type: run.request.sport_type,
      target_duration_minutes: run.request.duration_minutes,
      text_prompt: day_prompt(
        &run.request,
        run.plan_day(task.scheduled_date),
        run.plan_length(),
        previous,
      ),
      ai_preference: self.options.ai_preference,
    }
  }
}

/// Context for one day: the user's words, advisory hints, the day's place
/// in the plan (`day_number` is 1-based) and yesterday's exercises to steer
/// away from.
pub fn day_prompt(
  request: &GenerationRequest,
  day_number: usize,
  total: usize,
  previous: Option<&BackendWorkout>,
) -> Option<String> {
  let mut parts: Vec<String> = Vec::new();

  if let Some(text) = &request.text_prompt {
    parts.push(truncate_chars(text, USER_TEXT_CHARS));
  }
  if total > 1 {
    parts.push(format!("Day {} of {}", day_number, total));
  }
  if let Some(level) = request.experience_level {
    parts.push(format!("Experience level: {}", level.label()));
  }
  if let Some(equipment) = request.equipment {
    parts.push(format!("Available equipment: {}", equipment.label()));
  }
  if let Some(workout) = previous {
    let names = workout.exercise_names();
    if !names.is_empty() {
      parts.push(format!(
        "Avoid repeating the previous day's exercises: {}",
        names.join(", ")
      ));
    }
  }

  if parts.is_empty() {
    None
  } else {
    Some(truncate_chars(&parts.join(". "), MAX_TEXT_PROMPT_CHARS))
  }
}

fn finish(run: GenerationRun) -> Result<GenerationRun, RunError> {
  if run.completed_count() == 0 {
    warn!(requested = run.requested_days, "finish: nothing generated");
    return Err(RunError::NothingGenerated { run: Box::new(run) });
  }
  Ok(run)
}

fn cancel_remaining(run: &mut GenerationRun, from: usize, progress: &ProgressSender) {
  let total = run.tasks.len();
  info!(from, total, "cancel_remaining: run cancelled");
  for index in from..total {
    let date = run.tasks[index].scheduled_date;
    if run.tasks[index].fail(CANCELLED_REASON).is_ok() {
      emit(
        progress,
        ProgressEvent::DayFailed {
          index,
          total,
          date,
          reason: CANCELLED_REASON.to_string(),
        },
      );
    }
  }
}

fn emit(progress: &ProgressSender, event: ProgressEvent) {
  debug!(event = %event, "emit");
  if progress.send(event).is_err() {
    debug!("emit: progress receiver dropped, run continues");
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
