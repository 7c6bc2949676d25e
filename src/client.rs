//! Generation client for the workout-plan service
//!
//! One call generates one day. The client does not retry and does not
//! interpret failures: status codes and bodies are handed back verbatim.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::workout::truncate_chars;
use crate::models::{BackendWorkout, SportType};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const GENERATE_PATH: &str = "workout-plan-service/api/v1/plans/generate";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// ---------------------------------------------------------------------------
/// AI Backend Preference
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiPreference {
  #[default]
  Cloud,
  Local,
}

impl AiPreference {
  /// Anything other than "local" falls back to cloud
  pub fn from_preference(value: &str) -> Self {
    if value.trim().eq_ignore_ascii_case("local") {
      Self::Local
    } else {
      Self::Cloud
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Cloud => "cloud",
      Self::Local => "local",
    }
  }
}

impl std::fmt::Display for AiPreference {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for AiPreference {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::from_preference(s))
  }
}

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },

  #[error("Request failed: {0}")]
  Request(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Invalid endpoint: {0}")]
  InvalidEndpoint(String),
}

impl GenerationError {
  /// Worth another attempt at the day level: transport errors, throttling
  /// and server-side failures
  pub fn is_retryable(&self) -> bool {
    match self {
      GenerationError::Request(_) => true,
      GenerationError::Http { status, .. } => *status == 429 || *status >= 500,
      GenerationError::Parse(_) | GenerationError::InvalidEndpoint(_) => false,
    }
  }
}

impl Serialize for GenerationError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl From<reqwest::Error> for GenerationError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      GenerationError::Request(format!("timed out: {}", e))
    } else {
      GenerationError::Request(e.to_string())
    }
  }
}

/// ---------------------------------------------------------------------------
/// Wire Types
/// ---------------------------------------------------------------------------

/// Body of one generate call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGenerationRequest {
  pub user_id: String,
  pub day_date: NaiveDate,
  pub focus_sport_type: SportType,
  pub target_duration_minutes: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text_prompt: Option<String>,
  pub ai_preference: AiPreference,
}

/// ---------------------------------------------------------------------------
/// Client Trait
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait GenerationClient: Send + Sync {
  /// Generate exactly one day. One call, one outcome.
  async fn request_one_day(
    &self,
    request: &DayGenerationRequest,
  ) -> Result<BackendWorkout, GenerationError>;
}

/// ---------------------------------------------------------------------------
/// HTTP Client
/// ---------------------------------------------------------------------------

pub struct HttpGenerationClient {
  client: Client,
  cloud_endpoint: Url,
  local_endpoint: Option<Url>,
  token: Option<String>,
}

impl HttpGenerationClient {
  /// `cloud_base` / `local_base` are gateway roots such as
  /// `http://localhost:8080`; the generate path is appended to each.
  /// Without a local base, local requests go through the cloud gateway,
  /// which routes on the `aiPreference` field.
  pub fn new(
    cloud_base: &Url,
    local_base: Option<&Url>,
    token: Option<String>,
    timeout: Duration,
  ) -> Result<Self, GenerationError> {
    let client = Client::builder().timeout(timeout).build()?;

    Ok(Self {
      client,
      cloud_endpoint: generate_endpoint(cloud_base)?,
      local_endpoint: local_base.map(generate_endpoint).transpose()?,
      token,
    })
  }

  pub fn endpoint_for(&self, preference: AiPreference) -> &Url {
    match (preference, &self.local_endpoint) {
      (AiPreference::Local, Some(local)) => local,
      _ => &self.cloud_endpoint,
    }
  }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
  async fn request_one_day(
    &self,
    request: &DayGenerationRequest,
  ) -> Result<BackendWorkout, GenerationError> {
    let endpoint = self.endpoint_for(request.ai_preference);
    debug!(
      %endpoint,
      date = %request.day_date,
      sport = %request.focus_sport_type,
      preference = %request.ai_preference,
      "request_one_day: sending"
    );

    let mut builder = self.client.post(endpoint.clone()).json(request);
    if let Some(token) = &self.token {
      builder = builder.bearer_auth(token);
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      warn!(status = status.as_u16(), date = %request.day_date, "request_one_day: service error");
      return Err(GenerationError::Http {
        status: status.as_u16(),
        body,
      });
    }

    serde_json::from_str(&body)
      .map_err(|e| GenerationError::Parse(format!("{}: {}", e, truncate_chars(&body, 200))))
  }
}

/// Append the generate path to a gateway root, keeping any path prefix
fn generate_endpoint(base: &Url) -> Result<Url, GenerationError> {
  let mut base = base.clone();
  if !base.path().ends_with('/') {
    let path = format!("{}/", base.path());
    base.set_path(&path);
  }
  base
    .join(GENERATE_PATH)
    .map_err(|e| GenerationError::InvalidEndpoint(format!("{}: {}", base, e)))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{date, mock_workout_json};
  use mockito::Matcher;
  use serde_json::json;

  fn day_request(preference: AiPreference) -> DayGenerationRequest {
    DayGenerationRequest {
      user_id: "user-1".to_string(),
      day_date: date(2026, 10, 18),
      focus_sport_type: SportType::Hiit,
      target_duration_minutes: 45,
      text_prompt: Some("crossfit please".to_string()),
      ai_preference: preference,
    }
  }

  fn client_for(server: &mockito::Server, local: Option<&str>, token: Option<&str>) -> HttpGenerationClient {
    let cloud = Url::parse(&server.url()).unwrap();
    let local = local.map(|l| Url::parse(l).unwrap());
    HttpGenerationClient::new(
      &cloud,
      local.as_ref(),
      token.map(String::from),
      Duration::from_secs(5),
    )
    .unwrap()
  }

  #[test]
  fn test_ai_preference_fallback() {
    assert_eq!(AiPreference::from_preference("local"), AiPreference::Local);
    assert_eq!(AiPreference::from_preference(" LOCAL "), AiPreference::Local);
    assert_eq!(AiPreference::from_preference("cloud"), AiPreference::Cloud);
    assert_eq!(AiPreference::from_preference("invalid"), AiPreference::Cloud);
    assert_eq!(AiPreference::from_preference(""), AiPreference::Cloud);
  }

  #[test]
  fn test_wire_body_is_camel_case() {
    let body = serde_json::to_value(day_request(AiPreference::Local)).unwrap();
    assert_eq!(
      body,
      json!({
        "userId": "user-1",
        "dayDate": "2026-10-18",
        "focusSportType": "HIIT",
        "targetDurationMinutes": 45,
        "textPrompt": "crossfit please",
        "aiPreference": "local"
      })
    );
  }

  #[test]
  fn test_generate_endpoint_keeps_prefix() {
    let root = Url::parse("http://localhost:8080").unwrap();
    assert_eq!(
      generate_endpoint(&root).unwrap().as_str(),
      "http://localhost:8080/workout-plan-service/api/v1/plans/generate"
    );

    let prefixed = Url::parse("https://gateway.example.com/api").unwrap();
    assert_eq!(
      generate_endpoint(&prefixed).unwrap().as_str(),
      "https://gateway.example.com/api/workout-plan-service/api/v1/plans/generate"
    );
  }

  #[test]
  fn test_retryable_classification() {
    assert!(GenerationError::Request("reset".into()).is_retryable());
    assert!(GenerationError::Http { status: 503, body: String::new() }.is_retryable());
    assert!(GenerationError::Http { status: 429, body: String::new() }.is_retryable());
    assert!(!GenerationError::Http { status: 400, body: String::new() }.is_retryable());
    assert!(!GenerationError::Parse("bad".into()).is_retryable());
  }

  #[tokio::test]
  async fn test_request_one_day_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/workout-plan-service/api/v1/plans/generate")
      .match_header("authorization", "Bearer secret-token")
      .match_body(Matcher::PartialJson(json!({
        "userId": "user-1",
        "dayDate": "2026-10-18",
        "focusSportType": "HIIT",
        "aiPreference": "cloud"
      })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(mock_workout_json("w-1", "2026-10-18", "# Metcon"))
      .create_async()
      .await;

    let client = client_for(&server, None, Some("secret-token"));
    let workout = client
      .request_one_day(&day_request(AiPreference::Cloud))
      .await
      .expect("should generate");

    assert_eq!(workout.id, "w-1");
    assert_eq!(workout.markdown_content, "# Metcon");
    assert_eq!(workout.scheduled_exercises.len(), 2);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_request_one_day_http_error_is_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/workout-plan-service/api/v1/plans/generate")
      .with_status(502)
      .with_body("upstream worker unavailable")
      .create_async()
      .await;

    let client = client_for(&server, None, None);
    let err = client
      .request_one_day(&day_request(AiPreference::Cloud))
      .await
      .unwrap_err();

    assert_eq!(
      err,
      GenerationError::Http {
        status: 502,
        body: "upstream worker unavailable".to_string()
      }
    );
    assert_eq!(err.to_string(), "HTTP 502: upstream worker unavailable");
  }

  #[tokio::test]
  async fn test_request_one_day_malformed_payload() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/workout-plan-service/api/v1/plans/generate")
      .with_status(200)
      .with_body("{\"unexpected\": true}")
      .create_async()
      .await;

    let client = client_for(&server, None, None);
    let err = client
      .request_one_day(&day_request(AiPreference::Cloud))
      .await
      .unwrap_err();

    assert!(matches!(err, GenerationError::Parse(_)), "got {:?}", err);
  }

  #[tokio::test]
  async fn test_local_preference_uses_local_endpoint() {
    let mut cloud = mockito::Server::new_async().await;
    let mut local = mockito::Server::new_async().await;

    let cloud_mock = cloud
      .mock("POST", "/workout-plan-service/api/v1/plans/generate")
      .expect(0)
      .create_async()
      .await;
    let local_mock = local
      .mock("POST", "/workout-plan-service/api/v1/plans/generate")
      .match_body(Matcher::PartialJson(json!({ "aiPreference": "local" })))
      .with_status(200)
      .with_body(mock_workout_json("w-local", "2026-10-18", "# Local plan"))
      .create_async()
      .await;

    let client = client_for(&cloud, Some(&local.url()), None);
    let workout = client
      .request_one_day(&day_request(AiPreference::Local))
      .await
      .expect("local should answer");

    assert_eq!(workout.id, "w-local");
    local_mock.assert_async().await;
    cloud_mock.assert_async().await;
  }

  #[test]
  fn test_endpoint_for_without_local_base_uses_cloud() {
    let cloud = Url::parse("http://localhost:8080").unwrap();
    let client = HttpGenerationClient::new(&cloud, None, None, Duration::from_secs(1)).unwrap();
    assert_eq!(
      client.endpoint_for(AiPreference::Local),
      client.endpoint_for(AiPreference::Cloud)
    );
  }
}
