pub mod plan;

pub use plan::{
  generate_plan, load_config, retry_failed_days, CommandError, GeneratePlanArgs, PlanResponse,
};

use crate::interpreter::interpret;
use crate::models::{GenerationRequest, InterpreterDefaults};

/// Preview what a message would generate, without calling the service
pub fn interpret_request(text: &str, defaults: &InterpreterDefaults) -> GenerationRequest {
  interpret(text, defaults)
}
