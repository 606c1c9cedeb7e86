pub mod ai;
pub mod cli;
pub mod config;
pub mod document;
pub mod pipeline;
pub mod prompts;

pub use cli::{Cli, CommandHandler, Commands};
pub use config::Settings;
pub use document::{DocumentContext, Note, Position, TextBuffer, TextSink};
pub use pipeline::{GenerationMode, Invocation, Orchestrator, PipelineError, RunReport, RunState};
