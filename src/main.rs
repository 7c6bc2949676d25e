use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use flexfit_plan::aggregator::{summarize, RunSummary};
use flexfit_plan::client::AiPreference;
use flexfit_plan::commands::{
  generate_plan, interpret_request, load_config, retry_failed_days, CommandError,
  GeneratePlanArgs,
};
use flexfit_plan::config::{PlannerConfig, UserSession};
use flexfit_plan::models::{InterpreterDefaults, SportType};
use flexfit_plan::orchestrator::{ProgressEvent, RunError};

#[derive(Parser)]
#[command(name = "flexfit-plan", about = "Turn a workout request into a generated training plan")]
struct Cli {
  /// Log filter (overrides RUST_LOG), e.g. "info" or "flexfit_plan=debug"
  #[arg(long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show how a request would be interpreted, without generating anything
  Interpret {
    /// Free-text request, e.g. "create me a 1 week crossfit training"
    text: String,
    /// Fallback session length in minutes
    #[arg(long)]
    duration: Option<u32>,
    /// Fallback sport type (strength, hiit, yoga-mobility, running-intervals)
    #[arg(long)]
    sport: Option<SportType>,
  },
  /// Generate the workouts a request asks for
  Generate {
    /// Free-text request
    text: String,
    /// User id (overrides FLEXFIT_USER_ID)
    #[arg(long)]
    user: Option<String>,
    /// AI backend: cloud or local
    #[arg(long)]
    ai: Option<AiPreference>,
    /// First day of the plan (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    duration: Option<u32>,
    #[arg(long)]
    sport: Option<SportType>,
    /// Retry failed days once after the run
    #[arg(long)]
    retry_failed: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  let cli = Cli::parse();
  init_tracing(cli.log_level.as_deref())?;

  let config = load_config().context("Failed to load configuration")?;

  match cli.command {
    Commands::Interpret {
      text,
      duration,
      sport,
    } => {
      let defaults = InterpreterDefaults {
        duration_minutes: duration.unwrap_or(config.defaults.duration_minutes),
        sport_type: sport.unwrap_or(config.defaults.sport_type),
      };
      let request = interpret_request(&text, &defaults);
      println!("{}", serde_json::to_string_pretty(&request)?);
      Ok(())
    }
    Commands::Generate {
      text,
      user,
      ai,
      start,
      duration,
      sport,
      retry_failed,
    } => {
      let mut session = UserSession::from_env();
      if let Some(user) = user {
        session.user_id = Some(user);
      }
      let args = GeneratePlanArgs {
        text,
        ai_preference: ai,
        start_date: start,
        duration_minutes: duration,
        sport_type: sport,
      };
      generate(&args, &session, &config, retry_failed).await
    }
  }
}

async fn generate(
  args: &GeneratePlanArgs,
  session: &UserSession,
  config: &PlannerConfig,
  retry_failed: bool,
) -> anyhow::Result<()> {
  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("Interrupted: finishing the current day, skipping the rest");
      on_interrupt.cancel();
    }
  });

  let (tx, rx) = mpsc::unbounded_channel();
  let printer = tokio::spawn(print_progress(rx));

  let result = generate_plan(args, session, config, &tx, cancel.clone()).await;

  let retried = match &result {
    Ok(response) if retry_failed && response.run.failed_count() > 0 && !cancel.is_cancelled() => {
      Some(retry_failed_days(&response.run, session, config, &tx, cancel.clone()).await)
    }
    _ => None,
  };

  drop(tx);
  printer.await.ok();

  match result {
    Ok(response) => print_summary(&response.summary)?,
    Err(CommandError::Run(RunError::NothingGenerated { run })) => {
      print_summary(&summarize(&run))?;
      anyhow::bail!("No workouts were generated: all {} day(s) failed", run.requested_days);
    }
    Err(e) => return Err(e).context("Plan generation failed"),
  }

  match retried {
    Some(Ok(second)) => print_summary(&second.summary)?,
    Some(Err(e)) => warn!(error = %e, "Retry of failed days did not succeed"),
    None => {}
  }
  Ok(())
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) {
  while let Some(event) = rx.recv().await {
    println!("{}", event.message());
  }
}

fn print_summary(summary: &RunSummary) -> anyhow::Result<()> {
  println!();
  println!("{}", summary.narrative);
  if !summary.calendar_entries.is_empty() {
    println!();
    println!("{}", serde_json::to_string_pretty(&summary.calendar_entries)?);
  }
  Ok(())
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
  let filter = match level {
    Some(directive) => EnvFilter::try_new(directive)
      .with_context(|| format!("Invalid log level: {}", directive))?,
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
  };

  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(filter)
    .init();
  Ok(())
}
