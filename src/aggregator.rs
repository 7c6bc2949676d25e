//! Run summaries
//!
//! Folds a finished `GenerationRun` into the chat narrative and the calendar
//! entries to merge. Reads the run only; summarizing twice gives the same
//! output.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{GenerationRequest, GenerationRun, SportType, TaskOutcome};

const EXCERPT_CHARS: usize = 80;

/// A generated day as it lands on the calendar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSession {
  pub date: NaiveDate,
  pub workout_id: String,
  pub sport_type: SportType,
  pub duration_minutes: u32,
  pub title: String,
  pub exercise_names: Vec<String>,
  pub markdown_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
  pub narrative: String,
  pub completed: usize,
  pub failed: usize,
  pub requested: usize,
  /// SUCCEEDED days only; failed days stay open for a retry
  pub calendar_entries: BTreeMap<NaiveDate, CalendarSession>,
}

pub fn summarize(run: &GenerationRun) -> RunSummary {
  let calendar_entries = run
    .tasks
    .iter()
    .filter_map(|task| {
      let workout = task.result_payload()?;
      let session = CalendarSession {
        date: task.scheduled_date,
        workout_id: workout.id.clone(),
        sport_type: workout
          .focus_sport_type_for_the_day
          .unwrap_or(run.request.sport_type),
        duration_minutes: run.request.duration_minutes,
        title: workout.excerpt(EXCERPT_CHARS),
        exercise_names: workout.exercise_names(),
        markdown_content: workout.markdown_content.clone(),
      };
      Some((task.scheduled_date, session))
    })
    .collect();

  let narrative = if run.requested_days == 1 && run.tasks.len() == 1 {
    single_day_narrative(run)
  } else {
    multi_day_narrative(run)
  };

  RunSummary {
    narrative,
    completed: run.completed_count(),
    failed: run.failed_count(),
    requested: run.requested_days,
    calendar_entries,
  }
}

fn single_day_narrative(run: &GenerationRun) -> String {
  let task = &run.tasks[0];
  let day = task.scheduled_date.format("%A, %b %-d");
  match task.outcome() {
    TaskOutcome::Succeeded { workout } => format!(
      "Here's your {} for {}: {}",
      describe(&run.request),
      day,
      workout.excerpt(EXCERPT_CHARS)
    ),
    TaskOutcome::Failed { reason } => format!(
      "I couldn't generate your {} for {} ({}). You can retry it.",
      describe(&run.request),
      day,
      reason
    ),
    TaskOutcome::Pending => format!("Your {} for {} is still being generated.", describe(&run.request), day),
  }
}

fn multi_day_narrative(run: &GenerationRun) -> String {
  let completed = run.completed_count();
  let failed = run.failed_count();

  let mut lines = Vec::with_capacity(run.tasks.len() + 2);
  lines.push(if failed > 0 {
    format!(
      "{}/{} workouts generated, {} failed. You can retry them individually.",
      completed, run.requested_days, failed
    )
  } else {
    format!("{}/{} workouts generated.", completed, run.requested_days)
  });
  lines.push(format!("Your {} plan:", describe(&run.request)));

  for task in &run.tasks {
    let day = task.scheduled_date.format("%a %b %-d");
    let detail = match task.outcome() {
      TaskOutcome::Succeeded { workout } => workout.excerpt(EXCERPT_CHARS),
      TaskOutcome::Failed { reason } => format!("failed ({})", reason),
      TaskOutcome::Pending => "pending".to_string(),
    };
    lines.push(format!("- {}: {}", day, detail));
  }

  lines.join("\n")
}

/// "quick, high-intensity 20-minute HIIT workout"
fn describe(request: &GenerationRequest) -> String {
  let tone = match (request.is_quick, request.is_intense) {
    (true, true) => "quick, high-intensity ",
    (true, false) => "quick ",
    (false, true) => "high-intensity ",
    (false, false) => "",
  };
  format!(
    "{}{}-minute {} workout",
    tone,
    request.duration_minutes,
    request.sport_type.label()
  )
}
