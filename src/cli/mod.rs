pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Commands, ConfigAction, GenerateArgs};
pub use commands::CommandHandler;
pub use output::{ConsoleNotifier, OutputFormatter, Spinner, StdoutSink};
