use anyhow::Result;
use clap::Parser;
use log::error;

use notewright::cli::OutputFormatter;
use notewright::{Cli, CommandHandler, PipelineError, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only errors unless --verbose; RUST_LOG still wins
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Error
        })
        .parse_default_env()
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Settings::default_config_path()?,
    };

    let mut handler = match CommandHandler::new(config_path, cli.vault) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to initialize notewright: {e:#}");
            eprintln!(
                "{}",
                OutputFormatter::default()
                    .format_error(&format!("Failed to initialize notewright: {e:#}"))
            );
            std::process::exit(1);
        }
    };

    match handler.handle_command(cli.command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            // Pipeline failures were already shown as a notice
            if e.downcast_ref::<PipelineError>().is_none() {
                error!("Command failed: {e:#}");
                eprintln!("{}", handler.format_error(&format!("{e:#}")));
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
