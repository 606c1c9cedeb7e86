use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SettingKey;
use crate::document::Position;

#[derive(Parser)]
#[command(name = "notewright")]
#[command(about = "Fill prompt templates from your notes and stream LLM output back into them")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory holding the prompt folder
    #[arg(long, global = true, default_value = ".")]
    pub vault: PathBuf,

    /// Config file to use instead of ~/.notewright/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate text from a prompt template into a note
    Generate {
        #[command(flatten)]
        target: GenerateArgs,

        /// Wait for the complete answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },
    /// Generate text from a template plus the file linked in the note's `url` front-matter
    GenerateWithFile {
        #[command(flatten)]
        target: GenerateArgs,
    },
    /// List available prompt templates
    List,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Create the config file and prompt folder
    Init,
    /// Run diagnostics
    Doctor,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Template name; pick interactively when omitted
    pub template: Option<String>,

    /// The active note: supplies {title} and receives the output
    #[arg(short, long, value_name = "PATH")]
    pub note: Option<PathBuf>,

    /// Zero-based cursor position to insert at [default: end of note]
    #[arg(long, value_name = "LINE:COL")]
    pub at: Option<Position>,

    /// Write the output to stdout instead of the note
    #[arg(long)]
    pub print: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current settings
    Show,
    /// Change a setting
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        value: String,
    },
    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "notewright",
            "generate",
            "summarize",
            "--note",
            "Notes.md",
            "--at",
            "2:5",
            "--no-stream",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate { target, no_stream } => {
                assert_eq!(target.template.as_deref(), Some("summarize"));
                assert_eq!(target.note, Some(PathBuf::from("Notes.md")));
                assert_eq!(target.at, Some(Position::new(2, 5)));
                assert!(no_stream);
                assert!(!target.print);
            }
            _ => panic!("expected generate"),
        }
        assert_eq!(cli.vault, PathBuf::from("."));
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["notewright", "config", "set", "model-name", "gpt-4.1-mini"])
                .unwrap();
        match cli.command {
            Commands::Config {
                action: Some(ConfigAction::Set { key, value }),
            } => {
                assert_eq!(key, SettingKey::ModelName);
                assert_eq!(value, "gpt-4.1-mini");
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn test_prompt_folder_is_not_settable() {
        assert!(
            Cli::try_parse_from(["notewright", "config", "set", "prompt-folder", "x"]).is_err()
        );
    }

    #[test]
    fn test_bad_position_is_rejected() {
        assert!(Cli::try_parse_from(["notewright", "generate", "x", "--at", "five"]).is_err());
    }
}
