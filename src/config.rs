use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::client::{AiPreference, DEFAULT_TIMEOUT_SECS};
use crate::models::request::{clamp_duration, DEFAULT_DURATION_MINUTES};
use crate::models::{InterpreterDefaults, SportType};
use crate::orchestrator::{RunOptions, DEFAULT_PACING, MAX_ATTEMPTS_PER_DAY};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const API_URL_KEY: &str = "FLEXFIT_API_URL";
const LOCAL_API_URL_KEY: &str = "FLEXFIT_LOCAL_API_URL";
const AI_PREFERENCE_KEY: &str = "FLEXFIT_AI_PREFERENCE";
const PACING_KEY: &str = "FLEXFIT_PACING_MS";
const TIMEOUT_KEY: &str = "FLEXFIT_REQUEST_TIMEOUT_SECS";
const MAX_ATTEMPTS_KEY: &str = "FLEXFIT_MAX_ATTEMPTS";
const DEFAULT_DURATION_KEY: &str = "FLEXFIT_DEFAULT_DURATION";
const DEFAULT_SPORT_KEY: &str = "FLEXFIT_DEFAULT_SPORT";
const TOKEN_KEY: &str = "FLEXFIT_TOKEN";
const USER_ID_KEY: &str = "FLEXFIT_USER_ID";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value:?}")]
  Invalid { key: String, value: String },
}

impl serde::Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Planner Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
  pub api_url: Url,
  /// Used for the `local` preference; falls back to `api_url`
  pub local_api_url: Option<Url>,
  pub ai_preference: AiPreference,
  pub pacing: Duration,
  pub request_timeout: Duration,
  pub max_attempts: u32,
  pub defaults: InterpreterDefaults,
}

impl Default for PlannerConfig {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      local_api_url: None,
      ai_preference: AiPreference::Cloud,
      pacing: DEFAULT_PACING,
      request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
      max_attempts: 1,
      defaults: InterpreterDefaults::default(),
    }
  }
}

impl PlannerConfig {
  /// Every key is optional; unset keys keep their default
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let api_url = match var(API_URL_KEY) {
      Some(raw) => parse_url(API_URL_KEY, &raw)?,
      None => defaults.api_url,
    };
    let local_api_url = var(LOCAL_API_URL_KEY)
      .map(|raw| parse_url(LOCAL_API_URL_KEY, &raw))
      .transpose()?;

    let max_attempts: u32 = parse_or(MAX_ATTEMPTS_KEY, 1)?;
    if !(1..=MAX_ATTEMPTS_PER_DAY).contains(&max_attempts) {
      return Err(invalid(MAX_ATTEMPTS_KEY, &max_attempts.to_string()));
    }

    let sport_type = match var(DEFAULT_SPORT_KEY) {
      Some(raw) => SportType::from_str(&raw).map_err(|_| invalid(DEFAULT_SPORT_KEY, &raw))?,
      None => defaults.defaults.sport_type,
    };

    Ok(Self {
      api_url,
      local_api_url,
      ai_preference: var(AI_PREFERENCE_KEY)
        .map(|raw| AiPreference::from_preference(&raw))
        .unwrap_or(defaults.ai_preference),
      pacing: Duration::from_millis(parse_or(PACING_KEY, DEFAULT_PACING.as_millis() as u64)?),
      request_timeout: Duration::from_secs(parse_or(TIMEOUT_KEY, DEFAULT_TIMEOUT_SECS)?),
      max_attempts,
      defaults: InterpreterDefaults {
        duration_minutes: clamp_duration(parse_or(DEFAULT_DURATION_KEY, DEFAULT_DURATION_MINUTES)?),
        sport_type,
      },
    })
  }

  pub fn run_options(&self) -> RunOptions {
    RunOptions {
      pacing: self.pacing,
      ai_preference: self.ai_preference,
      max_attempts: self.max_attempts,
      start_date: None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// User Session
/// ---------------------------------------------------------------------------

/// Who is generating: the signed-in user and their bearer token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSession {
  pub user_id: Option<String>,
  pub token: Option<String>,
}

impl UserSession {
  pub fn from_env() -> Self {
    Self {
      user_id: var(USER_ID_KEY),
      token: var(TOKEN_KEY),
    }
  }

  pub fn new(user_id: impl Into<String>, token: Option<String>) -> Self {
    Self {
      user_id: Some(user_id.into()),
      token,
    }
  }

  /// The user id when signed in
  pub fn authenticated_user(&self) -> Option<&str> {
    self.user_id.as_deref().filter(|id| !id.trim().is_empty())
  }
}

/// ---------------------------------------------------------------------------
/// Helpers
/// ---------------------------------------------------------------------------

fn default_api_url() -> Url {
  Url::parse(DEFAULT_API_URL).expect("valid default API url")
}

/// Set and non-blank
fn var(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
  match var(key) {
    Some(raw) => raw.parse().map_err(|_| invalid(key, &raw)),
    None => Ok(default),
  }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
  Url::parse(raw).map_err(|_| invalid(key, raw))
}

fn invalid(key: &str, value: &str) -> ConfigError {
  ConfigError::Invalid {
    key: key.to_string(),
    value: value.to_string(),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
