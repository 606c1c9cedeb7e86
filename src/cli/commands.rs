use anyhow::{bail, Result};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::ai::{openai_client::API_KEY_ENV, ModelError, OpenAiClient};
use crate::cli::{
    Commands, ConfigAction, ConsoleNotifier, GenerateArgs, OutputFormatter, Spinner, StdoutSink,
};
use crate::config::{DefaultConfig, Settings};
use crate::document::Note;
use crate::pipeline::{GenerationMode, Invocation, Orchestrator};
use crate::prompts::{FsTemplateStore, TemplateStore};

pub struct CommandHandler {
    settings: Settings,
    config_path: PathBuf,
    store: Arc<FsTemplateStore>,
    ai_client: Arc<OpenAiClient>,
    orchestrator: Orchestrator,
    formatter: OutputFormatter,
}

impl CommandHandler {
    pub fn new(config_path: PathBuf, vault: PathBuf) -> Result<Self> {
        let settings = Settings::load(&config_path)?;
        let store = Arc::new(FsTemplateStore::new(vault));
        let ai_client = Arc::new(OpenAiClient::new(&settings)?);
        let notifier = Arc::new(ConsoleNotifier::new(settings.use_colors));
        let orchestrator = Orchestrator::new(store.clone(), ai_client.clone(), notifier);
        let formatter = OutputFormatter::new(settings.use_colors);

        Ok(Self {
            settings,
            config_path,
            store,
            ai_client,
            orchestrator,
            formatter,
        })
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<String> {
        match command {
            Commands::Generate { target, no_stream } => {
                let stream = self.settings.stream && !no_stream;
                self.handle_generate(target, GenerationMode::Text { stream })
                    .await
            }
            Commands::GenerateWithFile { target } => {
                self.handle_generate(target, GenerationMode::WithFile).await
            }
            Commands::List => self.handle_list(),
            Commands::Config { action } => self.handle_config(action.unwrap_or(ConfigAction::Show)),
            Commands::Init => self.handle_init(),
            Commands::Doctor => self.handle_doctor().await,
        }
    }

    async fn handle_generate(&self, args: GenerateArgs, mode: GenerationMode) -> Result<String> {
        let template = match args.template {
            Some(template) => template,
            None => {
                if !OutputFormatter::is_interactive() {
                    bail!("No template given. Pass a template name (see `notewright list`).");
                }
                let names = self.orchestrator.list_templates(&self.settings);
                match self.formatter.pick_template(&names)? {
                    Some(name) => name,
                    None if names.is_empty() => {
                        return Ok(self.formatter.format_info("No prompt templates available"))
                    }
                    None => return Ok(self.formatter.format_info("No template selected")),
                }
            }
        };

        let invocation = Invocation::new(template, mode);
        debug!("Generating with {invocation:?}");

        let mut note = args.note.as_deref().map(Note::open).transpose()?;
        if let Some(note) = note.as_mut() {
            debug!("Generating into '{}'", note.title());
            if let Some(at) = args.at {
                note.buffer_mut().set_cursor(at)?;
            }
        }

        let result = if args.print {
            let mut sink = StdoutSink::new();
            self.orchestrator
                .run(
                    &self.settings,
                    &invocation,
                    note.as_ref().map(Note::context),
                    Some(&mut sink),
                )
                .await
        } else {
            match note.as_mut() {
                Some(note) => {
                    let (context, buffer) = note.parts_mut();
                    self.orchestrator
                        .run(&self.settings, &invocation, Some(context), Some(buffer))
                        .await
                }
                None => {
                    self.orchestrator
                        .run(&self.settings, &invocation, None, None)
                        .await
                }
            }
        };

        // Whatever made it into the buffer stays, even when the run aborted.
        if let Some(note) = note.as_ref() {
            if !args.print && note.buffer().is_dirty() {
                note.save()?;
            }
        }

        let report = result?;
        info!("Run {} finished", report.run_id);

        match note.as_ref() {
            Some(note) if !args.print => Ok(self.formatter.format_report(&report, note.path())),
            _ => Ok(String::new()),
        }
    }

    fn handle_list(&self) -> Result<String> {
        let names = self.orchestrator.list_templates(&self.settings);
        Ok(self.formatter.format_templates(&names))
    }

    fn handle_config(&mut self, action: ConfigAction) -> Result<String> {
        match action {
            ConfigAction::Show => Ok(format!(
                "notewright configuration:\n\
                - Config file: {}\n\
                - Vault: {}\n\
                - Prompt folder: {} ({})\n\
                - Model: {}\n\
                - API key: {}\n\
                - Base URL: {}\n\
                - Streaming: {}\n\
                - Use colors: {}",
                self.config_path.display(),
                self.store.root().display(),
                self.settings.prompt_folder,
                self.store.folder_path(&self.settings.prompt_folder).display(),
                self.settings.model_name,
                self.settings.masked_api_key(),
                self.settings.base_url,
                self.settings.stream,
                self.settings.use_colors
            )),
            ConfigAction::Set { key, value } => {
                self.settings.set(key, &value);
                self.settings.save(&self.config_path)?;
                Ok(self
                    .formatter
                    .format_success(&format!("Updated {}", key.name())))
            }
            ConfigAction::Path => Ok(self.config_path.display().to_string()),
        }
    }

    fn handle_init(&self) -> Result<String> {
        info!("Initializing notewright");
        let mut messages = Vec::new();

        if self.config_path.exists() {
            messages.push(self.formatter.format_info(&format!(
                "Config already exists at {}",
                self.config_path.display()
            )));
        } else {
            if let Some(parent) = self.config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.config_path, DefaultConfig::create_default_config_file())?;
            messages.push(self.formatter.format_success(&format!(
                "Created config at {}",
                self.config_path.display()
            )));
        }

        let folder = &self.settings.prompt_folder;
        fs::create_dir_all(self.store.folder_path(folder))?;

        if self.store.list(folder).unwrap_or_default().is_empty() {
            let sample = self
                .store
                .template_path(folder, DefaultConfig::SAMPLE_TEMPLATE_NAME);
            fs::write(&sample, DefaultConfig::sample_template())?;
            messages.push(
                self.formatter
                    .format_success(&format!("Created sample template {}", sample.display())),
            );
        } else {
            messages.push(self.formatter.format_info(&format!(
                "Prompt folder {} already has templates",
                self.store.folder_path(folder).display()
            )));
        }

        Ok(messages.join("\n"))
    }

    async fn handle_doctor(&self) -> Result<String> {
        let spinner = Spinner::new("Running diagnostics...");
        let mut diagnostics = Vec::new();

        if self.config_path.exists() {
            diagnostics.push(format!("✓ Config file {}", self.config_path.display()));
        } else {
            diagnostics.push("✗ Config file missing (run: notewright init)".to_string());
        }

        let env_key = std::env::var(API_KEY_ENV).is_ok_and(|k| !k.is_empty());
        if !self.settings.api_key.is_empty() {
            diagnostics.push("✓ API key configured".to_string());
        } else if env_key {
            diagnostics.push("✓ API key taken from OPENAI_API_KEY".to_string());
        } else {
            diagnostics.push(
                "✗ API key missing (run: notewright config set api-key <KEY>)".to_string(),
            );
        }

        let folder = &self.settings.prompt_folder;
        match self.store.list(folder) {
            Some(names) => diagnostics.push(format!(
                "✓ Prompt folder {} ({} templates)",
                self.store.folder_path(folder).display(),
                names.len()
            )),
            None => diagnostics.push(format!(
                "✗ Prompt folder {} missing (run: notewright init)",
                self.store.folder_path(folder).display()
            )),
        }

        match self.ai_client.verify_connection().await {
            Ok(_) => diagnostics.push(format!(
                "✓ Model API reachable ({})",
                self.settings.base_url
            )),
            Err(e) => {
                diagnostics.push(format!("✗ Model API: {e}"));
                match e.downcast_ref::<ModelError>() {
                    Some(e) if e.is_auth() => diagnostics.push(
                        "  The API key was rejected (run: notewright config set api-key <KEY>)"
                            .to_string(),
                    ),
                    Some(e) if e.is_rate_limit() => {
                        diagnostics.push("  Rate limited; try again later".to_string())
                    }
                    _ => {}
                }
            }
        }

        spinner.stop();
        Ok(format!("notewright health check:\n{}", diagnostics.join("\n")))
    }

    pub fn format_error(&self, message: &str) -> String {
        self.formatter.format_error(message)
    }
}
