//! The generate pipeline: resolve a template, ask the model, insert the answer.

pub mod error;
pub mod notify;
pub mod orchestrator;

pub use error::PipelineError;
pub use notify::Notifier;
pub use orchestrator::{GenerationMode, Invocation, Orchestrator, RunReport, RunState};
