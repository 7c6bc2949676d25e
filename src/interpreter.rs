//! Free-text request interpreter
//!
//! Turns "create me a 1 week crossfit training" into a `GenerationRequest`.
//! Every axis is read on its own against the pattern library and every axis
//! has a safe fallback, so interpretation never fails.

use regex::Captures;
use tracing::debug;

use crate::models::request::{clamp_days, clamp_duration, MAX_TEXT_PROMPT_CHARS};
use crate::models::workout::truncate_chars;
use crate::models::{Equipment, ExperienceLevel, GenerationRequest, InterpreterDefaults, SportType};
use crate::patterns::{
  DayRule, DurationRule, DAY_PATTERNS, DURATION_PATTERNS, EQUIPMENT_PATTERNS,
  EXPERIENCE_PATTERNS, INTENSE_TONE, NUMBER_WORDS, QUICK_TONE, SPORT_PATTERNS,
};

/// Interpret a free-text request against the caller's defaults.
///
/// Pure: the same text and defaults always give the same request.
pub fn interpret(raw_text: &str, defaults: &InterpreterDefaults) -> GenerationRequest {
  let text = raw_text.to_lowercase();

  let request = GenerationRequest {
    days: parse_days(&text),
    sport_type: parse_sport(&text).unwrap_or(defaults.sport_type),
    duration_minutes: parse_duration(&text).unwrap_or_else(|| clamp_duration(defaults.duration_minutes)),
    equipment: parse_equipment(&text),
    experience_level: parse_experience(&text),
    is_quick: QUICK_TONE.is_match(&text),
    is_intense: INTENSE_TONE.is_match(&text),
    text_prompt: prompt_from(raw_text),
  };

  debug!(
    days = request.days,
    sport = %request.sport_type,
    duration = request.duration_minutes,
    equipment = ?request.equipment,
    experience = ?request.experience_level,
    "interpret: parsed request"
  );

  request
}

/// Number of days, 1 when nothing matches, always clamped
pub fn parse_days(text: &str) -> u32 {
  let days = match DAY_PATTERNS.first_match(text) {
    Some((DayRule::Fixed(n), _)) => *n,
    Some((DayRule::PerUnit(multiplier), caps)) => {
      captured_count(&caps).map_or(1, |count| count.saturating_mul(*multiplier))
    }
    None => 1,
  };
  clamp_days(days)
}

pub fn parse_sport(text: &str) -> Option<SportType> {
  SPORT_PATTERNS.first_value(text).copied()
}

/// Duration in minutes, clamped; `None` leaves the caller's default in place
pub fn parse_duration(text: &str) -> Option<u32> {
  let (rule, caps) = DURATION_PATTERNS.first_match(text)?;
  let minutes = match rule {
    DurationRule::Fixed(n) => *n,
    DurationRule::CapturedMinutes => captured_count(&caps)?,
    DurationRule::CapturedHours => captured_hours(&caps)?,
    DurationRule::CapturedHoursAndMinutes => {
      let minutes: u32 = caps.get(2)?.as_str().parse().unwrap_or(u32::MAX);
      captured_hours(&caps)?.saturating_add(minutes)
    }
  };
  Some(clamp_duration(minutes))
}

pub fn parse_equipment(text: &str) -> Option<Equipment> {
  EQUIPMENT_PATTERNS.first_value(text).copied()
}

pub fn parse_experience(text: &str) -> Option<ExperienceLevel> {
  EXPERIENCE_PATTERNS.first_value(text).copied()
}

/// First capture group as a count: digits or a spelled-out number.
/// Digit strings too large for u32 saturate so the clamp still applies.
fn captured_count(caps: &Captures<'_>) -> Option<u32> {
  let raw = caps.get(1)?.as_str();
  if raw.chars().all(|c| c.is_ascii_digit()) {
    return Some(raw.parse::<u32>().unwrap_or(u32::MAX));
  }
  NUMBER_WORDS
    .iter()
    .find(|(word, _)| *word == raw)
    .map(|(_, n)| *n)
}

/// First capture group as hours, in whole minutes
fn captured_hours(caps: &Captures<'_>) -> Option<u32> {
  let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
  Some((hours * 60.0).round().min(u32::MAX as f64) as u32)
}

fn prompt_from(raw_text: &str) -> Option<String> {
  let trimmed = raw_text.trim();
  if trimmed.is_empty() {
    return None;
  }
  Some(truncate_chars(trimmed, MAX_TEXT_PROMPT_CHARS))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
