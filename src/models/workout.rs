use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::request::SportType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
  #[default]
  Pending,
  InProgress,
  Completed,
  Skipped,
}

/// One exercise slot inside a generated workout, as returned by the
/// workout-plan service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledExercise {
  #[serde(default)]
  pub id: Option<String>,
  pub sequence_order: i32,
  pub exercise_name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub applicable_sport_types: Vec<SportType>,
  #[serde(default)]
  pub muscle_groups_primary: Vec<String>,
  #[serde(default)]
  pub muscle_groups_secondary: Vec<String>,
  /// Kept as raw strings: the service's equipment catalogue is larger than
  /// the hints the interpreter understands.
  #[serde(default)]
  pub equipment_needed: Vec<String>,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default)]
  pub prescribed_sets_reps_duration: String,
  #[serde(default)]
  pub voice_script_cue_text: Option<String>,
  #[serde(default)]
  pub video_url: Option<String>,
  #[serde(default)]
  pub rpe_feedback: Option<i32>,
  #[serde(default)]
  pub completion_status: CompletionStatus,
}

/// A generated daily workout (`DailyWorkoutResponse` on the wire)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendWorkout {
  pub id: String,
  #[serde(default)]
  pub user_id: Option<String>,
  #[serde(default)]
  pub day_date: Option<NaiveDate>,
  #[serde(default)]
  pub focus_sport_type_for_the_day: Option<SportType>,
  #[serde(default)]
  pub completion_status: CompletionStatus,
  #[serde(default)]
  pub rpe_overall_feedback: Option<i32>,
  #[serde(default)]
  pub completion_notes: Option<String>,
  #[serde(default)]
  pub markdown_content: String,
  #[serde(default)]
  pub scheduled_exercises: Vec<ScheduledExercise>,
}

impl BackendWorkout {
  /// Exercises sorted by their prescribed order
  pub fn ordered_exercises(&self) -> Vec<&ScheduledExercise> {
    let mut exercises: Vec<&ScheduledExercise> = self.scheduled_exercises.iter().collect();
    exercises.sort_by_key(|e| e.sequence_order);
    exercises
  }

  pub fn exercise_names(&self) -> Vec<String> {
    self
      .ordered_exercises()
      .into_iter()
      .map(|e| e.exercise_name.clone())
      .collect()
  }

  /// Short plain-text excerpt used in progress events and single-day summaries.
  ///
  /// Prefers the first markdown heading; falls back to the first non-empty
  /// line, then to the exercise list.
  pub fn excerpt(&self, max_chars: usize) -> String {
    let lines = self
      .markdown_content
      .lines()
      .map(str::trim)
      .filter(|l| !l.is_empty());

    let mut heading = None;
    let mut first_line = None;
    for line in lines {
      if line.starts_with('#') {
        heading = Some(line.trim_start_matches('#').trim());
        break;
      }
      if first_line.is_none() {
        first_line = Some(line);
      }
    }

    let text = match heading.or(first_line) {
      Some(t) if !t.is_empty() => t.to_string(),
      _ => self.exercise_names().join(", "),
    };

    truncate_chars(&text, max_chars)
  }
}

/// Truncate on a char boundary, appending "..." when shortened
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    return text.to_string();
  }
  let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
  format!("{}...", kept.trim_end())
}
