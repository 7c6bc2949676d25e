use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Bounds
/// ---------------------------------------------------------------------------

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 30;
pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 120;
pub const DEFAULT_DURATION_MINUTES: u32 = 45;

/// The workout-plan service rejects prompts longer than this
pub const MAX_TEXT_PROMPT_CHARS: usize = 500;

pub fn clamp_days(days: u32) -> u32 {
  days.clamp(MIN_DAYS, MAX_DAYS)
}

pub fn clamp_duration(minutes: u32) -> u32 {
  minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)
}

/// ---------------------------------------------------------------------------
/// Sport Type
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportType {
  #[default]
  Strength,
  Hiit,
  YogaMobility,
  RunningIntervals,
}

impl SportType {
  pub fn as_str(&self) -> &'static str {
    match self {
      SportType::Strength => "STRENGTH",
      SportType::Hiit => "HIIT",
      SportType::YogaMobility => "YOGA_MOBILITY",
      SportType::RunningIntervals => "RUNNING_INTERVALS",
    }
  }

  /// Human-facing label for narratives
  pub fn label(&self) -> &'static str {
    match self {
      SportType::Strength => "strength",
      SportType::Hiit => "HIIT",
      SportType::YogaMobility => "yoga & mobility",
      SportType::RunningIntervals => "running intervals",
    }
  }
}

impl std::fmt::Display for SportType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for SportType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
      "STRENGTH" => Ok(Self::Strength),
      "HIIT" => Ok(Self::Hiit),
      "YOGA_MOBILITY" | "YOGA" => Ok(Self::YogaMobility),
      "RUNNING_INTERVALS" | "RUNNING" => Ok(Self::RunningIntervals),
      _ => Err(format!("Unknown sport type: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Advisory hints
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Equipment {
  NoEquipment,
  Dumbbells,
  Kettlebell,
  BarbellWithPlates,
  ResistanceBands,
  PullUpBar,
  JumpRope,
  YogaMat,
  Treadmill,
  StationaryBike,
  RowingMachine,
  FullGym,
}

impl Equipment {
  pub fn label(&self) -> &'static str {
    match self {
      Equipment::NoEquipment => "no equipment",
      Equipment::Dumbbells => "dumbbells",
      Equipment::Kettlebell => "kettlebell",
      Equipment::BarbellWithPlates => "barbell with plates",
      Equipment::ResistanceBands => "resistance bands",
      Equipment::PullUpBar => "pull-up bar",
      Equipment::JumpRope => "jump rope",
      Equipment::YogaMat => "yoga mat",
      Equipment::Treadmill => "treadmill",
      Equipment::StationaryBike => "stationary bike",
      Equipment::RowingMachine => "rowing machine",
      Equipment::FullGym => "full gym",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceLevel {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

impl ExperienceLevel {
  pub fn label(&self) -> &'static str {
    match self {
      ExperienceLevel::Beginner => "beginner",
      ExperienceLevel::Intermediate => "intermediate",
      ExperienceLevel::Advanced => "advanced",
      ExperienceLevel::Expert => "expert",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Generation Request
/// ---------------------------------------------------------------------------

/// Caller-supplied fallbacks for axes the text does not mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterDefaults {
  pub duration_minutes: u32,
  pub sport_type: SportType,
}

impl Default for InterpreterDefaults {
  fn default() -> Self {
    Self {
      duration_minutes: DEFAULT_DURATION_MINUTES,
      sport_type: SportType::Strength,
    }
  }
}

/// Structured intent derived from free text or UI defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
  pub days: u32,
  pub sport_type: SportType,
  pub duration_minutes: u32,
  pub equipment: Option<Equipment>,
  pub experience_level: Option<ExperienceLevel>,
  pub is_quick: bool,
  pub is_intense: bool,
  /// The user's own words, forwarded to the service as extra context
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub text_prompt: Option<String>,
}

impl GenerationRequest {
  /// Plain request with no hints, already clamped
  pub fn new(days: u32, sport_type: SportType, duration_minutes: u32) -> Self {
    Self {
      days: clamp_days(days),
      sport_type,
      duration_minutes: clamp_duration(duration_minutes),
      equipment: None,
      experience_level: None,
      is_quick: false,
      is_intense: false,
      text_prompt: None,
    }
  }

  /// Copy with `days` and `duration_minutes` forced into range
  pub fn clamped(&self) -> Self {
    Self {
      days: clamp_days(self.days),
      duration_minutes: clamp_duration(self.duration_minutes),
      ..self.clone()
    }
  }

  pub fn is_multi_day(&self) -> bool {
    self.days > 1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clamps() {
    assert_eq!(clamp_days(0), 1);
    assert_eq!(clamp_days(31), 30);
    assert_eq!(clamp_days(14), 14);
    assert_eq!(clamp_duration(5), 15);
    assert_eq!(clamp_duration(240), 120);
    assert_eq!(clamp_duration(45), 45);
  }

  #[test]
  fn test_new_clamps_out_of_range_values() {
    let req = GenerationRequest::new(90, SportType::Hiit, 300);
    assert_eq!(req.days, 30);
    assert_eq!(req.duration_minutes, 120);
  }

  #[test]
  fn test_clamped_repairs_hand_built_request() {
    let mut req = GenerationRequest::new(7, SportType::Strength, 45);
    req.days = 0;
    req.duration_minutes = 1;
    let fixed = req.clamped();
    assert_eq!(fixed.days, 1);
    assert_eq!(fixed.duration_minutes, 15);
  }

  #[test]
  fn test_sport_type_parse_and_wire_format() {
    assert_eq!("yoga-mobility".parse::<SportType>(), Ok(SportType::YogaMobility));
    assert_eq!("hiit".parse::<SportType>(), Ok(SportType::Hiit));
    assert!("curling".parse::<SportType>().is_err());

    let json = serde_json::to_string(&SportType::RunningIntervals).unwrap();
    assert_eq!(json, "\"RUNNING_INTERVALS\"");
  }
}
