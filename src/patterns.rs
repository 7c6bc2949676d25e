//! Pattern library for request interpretation
//!
//! One ordered table per axis. Each row pairs a trigger regex with the value it
//! stands for, and the first matching row wins. Rows are listed from the most
//! specific phrase to the most general one: "two weeks" must sit above the
//! numeric `(\d+) week` row, which must sit above the bare "week" row.
//!
//! All triggers are written against lower-cased input.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::models::{Equipment, ExperienceLevel, SportType};

/// ---------------------------------------------------------------------------
/// Table Types
/// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Pattern<V> {
  pub trigger: Regex,
  pub value: V,
}

#[derive(Debug)]
pub struct PatternTable<V> {
  name: &'static str,
  entries: Vec<Pattern<V>>,
}

impl<V> PatternTable<V> {
  /// Build a table from constant rows. Panics on an invalid regex, which is
  /// a programming error in the rows below.
  fn build(name: &'static str, rows: Vec<(&str, V)>) -> Self {
    let entries = rows
      .into_iter()
      .map(|(source, value)| Pattern {
        trigger: Regex::new(source)
          .unwrap_or_else(|e| panic!("invalid {} pattern {:?}: {}", name, source, e)),
        value,
      })
      .collect();
    Self { name, entries }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn entries(&self) -> &[Pattern<V>] {
    &self.entries
  }

  /// First row whose trigger matches, with its captures
  pub fn first_match<'t>(&self, text: &'t str) -> Option<(&V, Captures<'t>)> {
    self
      .entries
      .iter()
      .find_map(|p| p.trigger.captures(text).map(|caps| (&p.value, caps)))
  }

  pub fn first_value(&self, text: &str) -> Option<&V> {
    self
      .entries
      .iter()
      .find(|p| p.trigger.is_match(text))
      .map(|p| &p.value)
  }

  /// Index of the first matching row (for priority assertions)
  pub fn first_index(&self, text: &str) -> Option<usize> {
    self.entries.iter().position(|p| p.trigger.is_match(text))
  }
}

/// ---------------------------------------------------------------------------
/// Rule Values
/// ---------------------------------------------------------------------------

/// How a day-count row turns into a number of days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRule {
  /// A fixed count ("a week" = 7)
  Fixed(u32),
  /// Captured count times a multiplier ("3 weeks" = 3 x 7)
  PerUnit(u32),
}

/// How a duration row turns into minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationRule {
  Fixed(u32),
  CapturedMinutes,
  CapturedHours,
  /// "1 hour 30 minutes": hours in group 1, minutes in group 2
  CapturedHoursAndMinutes,
}

/// Spelled-out counts accepted wherever a captured number is
pub const NUMBER_WORDS: &[(&str, u32)] = &[
  ("one", 1),
  ("two", 2),
  ("three", 3),
  ("four", 4),
  ("five", 5),
  ("six", 6),
  ("seven", 7),
  ("eight", 8),
  ("nine", 9),
  ("ten", 10),
];

/// ---------------------------------------------------------------------------
/// Day Count
/// ---------------------------------------------------------------------------

pub static DAY_PATTERNS: LazyLock<PatternTable<DayRule>> = LazyLock::new(|| {
  PatternTable::build(
    "day-count",
    vec![
      (
        r"\b(one|two|three|four|five|six|seven|eight|nine|ten)[\s-]+months?\b",
        DayRule::PerUnit(30),
      ),
      (
        r"\b(one|two|three|four|five|six|seven|eight|nine|ten)[\s-]+weeks?\b",
        DayRule::PerUnit(7),
      ),
      (r"\bfortnight\b", DayRule::Fixed(14)),
      (r"\bcouple\s+(?:of\s+)?weeks\b", DayRule::Fixed(14)),
      (r"\bfew\s+weeks\b", DayRule::Fixed(21)),
      (r"(\d+)\s*-?\s*months?\b", DayRule::PerUnit(30)),
      (r"(\d+)\s*-?\s*weeks?\b", DayRule::PerUnit(7)),
      (r"(\d+)\s*-?\s*days?\b", DayRule::PerUnit(1)),
      (
        r"\b(one|two|three|four|five|six|seven|eight|nine|ten)[\s-]+days?\b",
        DayRule::PerUnit(1),
      ),
      (r"\bmonth", DayRule::Fixed(30)),
      (r"\b(?:a|one|this|next|full|whole|entire)\s+week\b", DayRule::Fixed(7)),
      (r"\bweek(?:ly)?\b", DayRule::Fixed(7)),
    ],
  )
});

/// ---------------------------------------------------------------------------
/// Sport Type
/// ---------------------------------------------------------------------------

/// Keyword groups in tie-break order: HIIT, strength, yoga, running.
/// Keywords match at a word start so that "crunches" is not a run.
pub static SPORT_PATTERNS: LazyLock<PatternTable<SportType>> = LazyLock::new(|| {
  PatternTable::build(
    "sport",
    vec![
      (
        r"\b(?:hiit|cross[\s-]?fit|cardio|tabata|circuits?|metcon|burpees?|high[\s-]intensity|fat[\s-]?burn|conditioning|boot[\s-]?camp)",
        SportType::Hiit,
      ),
      (
        r"\b(?:strength|weights?|weight[\s-]?lifting|lift|muscle|hypertrophy|bodybuilding|power[\s-]?lifting|resistance|dumbbells?|barbells?|gym|toning|bulk)",
        SportType::Strength,
      ),
      (
        r"\b(?:yoga|mobility|stretch|flexib|pilates|recovery|meditat|vinyasa|foam[\s-]?roll)",
        SportType::YogaMobility,
      ),
      (
        r"\b(?:run|jog|sprint|marathon|5k|10k|track|intervals?|treadmill)",
        SportType::RunningIntervals,
      ),
    ],
  )
});

/// ---------------------------------------------------------------------------
/// Duration
/// ---------------------------------------------------------------------------

pub static DURATION_PATTERNS: LazyLock<PatternTable<DurationRule>> = LazyLock::new(|| {
  PatternTable::build(
    "duration",
    vec![
      (
        r"(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)\s*(?:and\s+)?(\d+)\s*(?:minutes?|mins?)\b",
        DurationRule::CapturedHoursAndMinutes,
      ),
      (r"(\d+)\s*-?\s*(?:minutes?|mins?)\b", DurationRule::CapturedMinutes),
      (r"\bhalf[\s-]+(?:an[\s-]+)?hour\b", DurationRule::Fixed(30)),
      (r"(\d+(?:\.\d+)?)\s*-?\s*(?:hours?|hrs?)\b", DurationRule::CapturedHours),
      (r"\b(?:an|one)\s+hour\b", DurationRule::Fixed(60)),
      (r"\b(?:quick|short|brief)\b", DurationRule::Fixed(20)),
      // Not "week-long": the word must stand on its own
      (r"(?:^|[\s,.;:!?(])long\b", DurationRule::Fixed(60)),
      (r"\b(?:full|complete)\b", DurationRule::Fixed(45)),
    ],
  )
});

/// ---------------------------------------------------------------------------
/// Equipment & Experience (advisory, no default)
/// ---------------------------------------------------------------------------

pub static EQUIPMENT_PATTERNS: LazyLock<PatternTable<Equipment>> = LazyLock::new(|| {
  PatternTable::build(
    "equipment",
    vec![
      (
        r"\b(?:no|without|zero)\s+(?:equipment|gear|weights)\b|\bbody[\s-]?weight\b|\bequipment[\s-]free\b",
        Equipment::NoEquipment,
      ),
      (r"\bkettle[\s-]?bells?\b", Equipment::Kettlebell),
      (r"\bdumb[\s-]?bells?\b", Equipment::Dumbbells),
      (r"\bbarbells?\b", Equipment::BarbellWithPlates),
      (r"\b(?:resistance\s+)?bands?\b", Equipment::ResistanceBands),
      (r"\bpull[\s-]?up\s+bar\b", Equipment::PullUpBar),
      (r"\bjump(?:ing)?[\s-]?ropes?\b|\bskipping\s+rope\b", Equipment::JumpRope),
      (r"\btreadmill\b", Equipment::Treadmill),
      (r"\b(?:stationary|exercise|spin)\s+bike\b|\bpeloton\b", Equipment::StationaryBike),
      (r"\brow(?:ing)?\s+machine\b|\brower\b", Equipment::RowingMachine),
      (r"\byoga\s+mat\b|\bmat\b", Equipment::YogaMat),
      (r"\bgym\b", Equipment::FullGym),
    ],
  )
});

pub static EXPERIENCE_PATTERNS: LazyLock<PatternTable<ExperienceLevel>> = LazyLock::new(|| {
  PatternTable::build(
    "experience",
    vec![
      (
        r"\b(?:beginners?|novice|newbie|new to|just start|first time|never (?:worked out|trained))",
        ExperienceLevel::Beginner,
      ),
      (r"\bintermediate\b", ExperienceLevel::Intermediate),
      (
        r"\b(?:expert|elite|professional|pro athlete|competitive)\b",
        ExperienceLevel::Expert,
      ),
      (r"\b(?:advanced|experienced|seasoned)\b", ExperienceLevel::Advanced),
    ],
  )
});

/// ---------------------------------------------------------------------------
/// Tone Flags
/// ---------------------------------------------------------------------------

pub static QUICK_TONE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(?:quick|quickly|fast|short|brief|express)\b").expect("valid quick-tone regex")
});

pub static INTENSE_TONE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"\b(?:intense|intensity|hard|hardcore|tough|challenging|brutal|beast|killer|extreme)\b",
  )
  .expect("valid intense-tone regex")
});
