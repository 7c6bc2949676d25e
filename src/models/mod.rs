pub mod request;
pub mod run;
pub mod workout;

pub use request::{
  Equipment, ExperienceLevel, GenerationRequest, InterpreterDefaults, SportType,
};
pub use run::{DayTask, GenerationRun, RunPhase, TaskOutcome, TaskStatus};
pub use workout::{BackendWorkout, CompletionStatus, ScheduledExercise};
