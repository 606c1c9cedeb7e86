use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DefaultConfig;

/// Persisted configuration record.
///
/// Missing fields are filled from [`Default`] once, when the file is parsed.
/// `save` writes the values as they are, so a field explicitly set to an empty
/// string stays empty on the next load.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub prompt_folder: String,
    pub model_name: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub stream: bool,
    pub use_colors: bool,
}

/// Fields editable through `config set`.
///
/// `prompt_folder` is deliberately absent: it can only be changed by editing
/// the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SettingKey {
    ApiKey,
    ModelName,
}

impl SettingKey {
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "api-key",
            SettingKey::ModelName => "model-name",
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            debug!("Loaded settings from {}", path.display());
            Ok(settings)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn set(&mut self, key: SettingKey, value: &str) {
        match key {
            SettingKey::ApiKey => self.api_key = value.to_string(),
            SettingKey::ModelName => self.model_name = value.to_string(),
        }
    }

    /// The API key with all but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count == 0 {
            return "(not set)".to_string();
        }
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("{}{tail}", "*".repeat(count - 4))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

        Ok(home_dir.join(".notewright").join("config.toml"))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            prompt_folder: DefaultConfig::PROMPT_FOLDER.to_string(),
            model_name: DefaultConfig::MODEL_NAME.to_string(),
            base_url: DefaultConfig::BASE_URL.to_string(),
            timeout_secs: DefaultConfig::TIMEOUT_SECS,
            stream: true,
            use_colors: true,
        }
    }
}
