//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Mock data factories for service payloads
//! - A scripted in-memory generation client
//! - Progress channel helpers

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::{DayGenerationRequest, GenerationClient, GenerationError};
use crate::models::{BackendWorkout, CompletionStatus, ScheduledExercise};
use crate::orchestrator::ProgressEvent;

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Create a mock exercise slot
pub fn mock_exercise(order: i32, name: &str) -> ScheduledExercise {
  ScheduledExercise {
    id: Some(format!("ex-{}", order)),
    sequence_order: order,
    exercise_name: name.to_string(),
    description: format!("{} description", name),
    applicable_sport_types: vec![],
    muscle_groups_primary: vec!["Full body".to_string()],
    muscle_groups_secondary: vec![],
    equipment_needed: vec![],
    difficulty: Some("INTERMEDIATE".to_string()),
    prescribed_sets_reps_duration: "3 x 10".to_string(),
    voice_script_cue_text: None,
    video_url: None,
    rpe_feedback: None,
    completion_status: CompletionStatus::Pending,
  }
}

/// Create a mock generated workout with two exercises
pub fn mock_backend_workout(id: &str, markdown: &str) -> BackendWorkout {
  BackendWorkout {
    id: id.to_string(),
    user_id: Some("user-1".to_string()),
    day_date: None,
    focus_sport_type_for_the_day: None,
    completion_status: CompletionStatus::Pending,
    rpe_overall_feedback: None,
    completion_notes: None,
    markdown_content: markdown.to_string(),
    scheduled_exercises: vec![mock_exercise(1, "Goblet Squat"), mock_exercise(2, "Push-up")],
  }
}

/// Service response body for one generated day, as raw JSON
pub fn mock_workout_json(id: &str, day_date: &str, markdown: &str) -> String {
  serde_json::json!({
    "id": id,
    "userId": "user-1",
    "dayDate": day_date,
    "focusSportTypeForTheDay": "STRENGTH",
    "completionStatus": "PENDING",
    "markdownContent": markdown,
    "scheduledExercises": [
      {
        "id": "ex-1",
        "sequenceOrder": 1,
        "exerciseName": "Goblet Squat",
        "description": "Hold the bell at the chest",
        "muscleGroupsPrimary": ["Quadriceps"],
        "equipmentNeeded": ["KETTLEBELL"],
        "prescribedSetsRepsDuration": "3 x 12"
      },
      {
        "id": "ex-2",
        "sequenceOrder": 2,
        "exerciseName": "Push-up",
        "prescribedSetsRepsDuration": "3 x 15"
      }
    ]
  })
  .to_string()
}

/// Everything currently buffered on a progress channel
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

/// ---------------------------------------------------------------------------
/// Fake Generation Client
/// ---------------------------------------------------------------------------

const ALWAYS: u32 = u32::MAX;

/// Scripted client: succeeds by default, records every request and how many
/// calls were ever in flight at once.
#[derive(Default)]
pub struct FakeClient {
  calls: Mutex<Vec<DayGenerationRequest>>,
  failures: Mutex<HashMap<NaiveDate, (u32, GenerationError)>>,
  fail_all: Option<GenerationError>,
  workouts: HashMap<NaiveDate, BackendWorkout>,
  cancel_after: Option<(usize, CancellationToken)>,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl FakeClient {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_on(self, day: NaiveDate, error: GenerationError) -> Self {
    self.failing_times(day, ALWAYS, error)
  }

  /// Fail the first `times` calls for `day`, then succeed
  pub fn failing_times(self, day: NaiveDate, times: u32, error: GenerationError) -> Self {
    if let Ok(mut failures) = self.failures.lock() {
      failures.insert(day, (times, error));
    }
    self
  }

  pub fn failing_always(mut self, error: GenerationError) -> Self {
    self.fail_all = Some(error);
    self
  }

  pub fn returning_on(mut self, day: NaiveDate, workout: BackendWorkout) -> Self {
    self.workouts.insert(day, workout);
    self
  }

  /// Cancel `token` from inside the `n`th call
  pub fn cancel_after_calls(mut self, n: usize, token: CancellationToken) -> Self {
    self.cancel_after = Some((n, token));
    self
  }

  pub fn calls(&self) -> Vec<DayGenerationRequest> {
    self.calls.lock().map(|c| c.clone()).unwrap_or_default()
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }

  fn scripted_failure(&self, day: NaiveDate) -> Option<GenerationError> {
    if let Some(err) = &self.fail_all {
      return Some(err.clone());
    }
    let mut failures = self.failures.lock().ok()?;
    let (remaining, err) = failures.get_mut(&day)?;
    if *remaining == 0 {
      return None;
    }
    if *remaining != ALWAYS {
      *remaining -= 1;
    }
    Some(err.clone())
  }
}

#[async_trait]
impl GenerationClient for FakeClient {
  async fn request_one_day(
    &self,
    request: &DayGenerationRequest,
  ) -> Result<BackendWorkout, GenerationError> {
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let call_number = {
      let mut calls = self.calls.lock().expect("calls lock");
      calls.push(request.clone());
      calls.len()
    };

    // Give any overlapping caller a chance to show up in `in_flight`
    tokio::task::yield_now().await;

    if let Some((n, token)) = &self.cancel_after {
      if call_number >= *n {
        token.cancel();
      }
    }

    let result = match self.scripted_failure(request.day_date) {
      Some(err) => Err(err),
      None => {
        let mut workout = self.workouts.get(&request.day_date).cloned().unwrap_or_else(|| {
          mock_backend_workout(
            &format!("w-{}", request.day_date),
            &format!("# {} session for {}", request.focus_sport_type.label(), request.day_date),
          )
        });
        workout.day_date = Some(request.day_date);
        workout.focus_sport_type_for_the_day = Some(request.focus_sport_type);
        Ok(workout)
      }
    };

    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    result
  }
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::client::AiPreference;
  use crate::models::SportType;

  fn day_request(day: NaiveDate) -> DayGenerationRequest {
    DayGenerationRequest {
      user_id: "user-1".into(),
      day_date: day,
      focus_sport_type: SportType::Strength,
      target_duration_minutes: 45,
      text_prompt: None,
      ai_preference: AiPreference::Cloud,
    }
  }

  #[test]
  fn test_mock_workout_json_parses() {
    let json = mock_workout_json("w1", "2026-10-18", "# Legs");
    let workout: BackendWorkout = serde_json::from_str(&json).unwrap();
    assert_eq!(workout.id, "w1");
    assert_eq!(workout.day_date, Some(date(2026, 10, 18)));
    assert_eq!(workout.scheduled_exercises.len(), 2);
    assert_eq!(workout.markdown_content, "# Legs");
  }

  #[tokio::test]
  async fn test_fake_client_scripted_failures() {
    let day = date(2026, 10, 18);
    let client = FakeClient::new().failing_times(day, 1, GenerationError::Request("reset".into()));

    assert!(client.request_one_day(&day_request(day)).await.is_err());
    let workout = client.request_one_day(&day_request(day)).await.unwrap();
    assert_eq!(workout.day_date, Some(day));
    assert_eq!(client.calls().len(), 2);
    assert_eq!(client.max_in_flight(), 1);
  }
}
