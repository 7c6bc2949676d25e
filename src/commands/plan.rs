use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregator::{summarize, RunSummary};
use crate::client::{AiPreference, GenerationClient, GenerationError, HttpGenerationClient};
use crate::config::{ConfigError, PlannerConfig, UserSession};
use crate::interpreter::interpret;
use crate::models::{GenerationRequest, GenerationRun, InterpreterDefaults, SportType};
use crate::orchestrator::{ProgressSender, RunError, SequentialOrchestrator};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
  #[error("Not authenticated: sign in before generating workouts")]
  NotAuthenticated,

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("Could not set up the generation client: {0}")]
  Client(#[from] GenerationError),

  #[error(transparent)]
  Run(#[from] RunError),
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Arguments & Response
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanArgs {
  pub text: String,
  #[serde(default)]
  pub ai_preference: Option<AiPreference>,
  #[serde(default)]
  pub start_date: Option<NaiveDate>,
  /// Overrides the configured interpreter defaults
  #[serde(default)]
  pub duration_minutes: Option<u32>,
  #[serde(default)]
  pub sport_type: Option<SportType>,
}

impl GeneratePlanArgs {
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      ..Self::default()
    }
  }

  fn defaults(&self, config: &PlannerConfig) -> InterpreterDefaults {
    InterpreterDefaults {
      duration_minutes: self.duration_minutes.unwrap_or(config.defaults.duration_minutes),
      sport_type: self.sport_type.unwrap_or(config.defaults.sport_type),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
  pub request: GenerationRequest,
  pub run: GenerationRun,
  pub summary: RunSummary,
}

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

/// Load the planner configuration from the environment
pub fn load_config() -> Result<PlannerConfig, CommandError> {
  let config = PlannerConfig::from_env()?;
  info!(
    api_url = %config.api_url,
    preference = %config.ai_preference,
    max_attempts = config.max_attempts,
    "load_config: loaded"
  );
  Ok(config)
}

/// ---------------------------------------------------------------------------
/// Generate
/// ---------------------------------------------------------------------------

/// Interpret `args.text` and generate every day it asks for.
///
/// The session is checked before anything else; a signed-out user never
/// reaches the service.
pub async fn generate_plan(
  args: &GeneratePlanArgs,
  session: &UserSession,
  config: &PlannerConfig,
  progress: &ProgressSender,
  cancel: CancellationToken,
) -> Result<PlanResponse, CommandError> {
  let user_id = session
    .authenticated_user()
    .ok_or(CommandError::NotAuthenticated)?;
  let client = http_client(config, session)?;
  let today = Local::now().date_naive();

  plan_with_client(client, args, user_id, config, today, progress, cancel).await
}

async fn plan_with_client<C: GenerationClient>(
  client: C,
  args: &GeneratePlanArgs,
  user_id: &str,
  config: &PlannerConfig,
  today: NaiveDate,
  progress: &ProgressSender,
  cancel: CancellationToken,
) -> Result<PlanResponse, CommandError> {
  let request = interpret(&args.text, &args.defaults(config));
  info!(
    user_id,
    days = request.days,
    sport = %request.sport_type,
    duration = request.duration_minutes,
    "generate_plan: interpreted request"
  );

  let mut options = config.run_options();
  options.start_date = args.start_date;
  if let Some(preference) = args.ai_preference {
    options.ai_preference = preference;
  }

  let orchestrator = SequentialOrchestrator::new(client, options).with_cancellation(cancel);
  let run = orchestrator
    .run_sequential_generation(&request, user_id, today, progress)
    .await?;

  let summary = summarize(&run);
  Ok(PlanResponse {
    request,
    run,
    summary,
  })
}

/// ---------------------------------------------------------------------------
/// Retry
/// ---------------------------------------------------------------------------

/// Regenerate the failed days of a finished run
pub async fn retry_failed_days(
  previous: &GenerationRun,
  session: &UserSession,
  config: &PlannerConfig,
  progress: &ProgressSender,
  cancel: CancellationToken,
) -> Result<PlanResponse, CommandError> {
  if session.authenticated_user().is_none() {
    return Err(CommandError::NotAuthenticated);
  }
  let client = http_client(config, session)?;

  retry_with_client(client, previous, config, progress, cancel).await
}

async fn retry_with_client<C: GenerationClient>(
  client: C,
  previous: &GenerationRun,
  config: &PlannerConfig,
  progress: &ProgressSender,
  cancel: CancellationToken,
) -> Result<PlanResponse, CommandError> {
  info!(
    user_id = %previous.user_id,
    failed = previous.failed_count(),
    "retry_failed_days: starting"
  );

  let orchestrator =
    SequentialOrchestrator::new(client, config.run_options()).with_cancellation(cancel);
  let run = orchestrator.retry_failed(previous, progress).await?;

  let summary = summarize(&run);
  Ok(PlanResponse {
    request: run.request.clone(),
    run,
    summary,
  })
}

fn http_client(
  config: &PlannerConfig,
  session: &UserSession,
) -> Result<HttpGenerationClient, CommandError> {
  Ok(HttpGenerationClient::new(
    &config.api_url,
    config.local_api_url.as_ref(),
    session.token.clone(),
    config.request_timeout,
  )?)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
