pub struct DefaultConfig;

impl DefaultConfig {
    pub const PROMPT_FOLDER: &'static str = "_prompt";
    pub const MODEL_NAME: &'static str = "gpt-5-nano";
    pub const BASE_URL: &'static str = "https://api.openai.com/v1/";
    pub const TIMEOUT_SECS: u64 = 60;

    /// Written by `notewright init` so a fresh vault has one template to pick.
    pub const SAMPLE_TEMPLATE_NAME: &'static str = "summarize";

    pub fn sample_template() -> String {
        "Summarize the note titled \"{title}\" in three sentences.\n".to_string()
    }

    pub fn create_default_config_file() -> String {
        format!(
            r#"# API key for the Responses API. Falls back to $OPENAI_API_KEY when empty.
api_key = ""
# Folder inside the vault holding prompt templates (*.md)
prompt_folder = "{}"
model_name = "{}"
base_url = "{}"
timeout_secs = {}
stream = true
use_colors = true
"#,
            Self::PROMPT_FOLDER,
            Self::MODEL_NAME,
            Self::BASE_URL,
            Self::TIMEOUT_SECS
        )
    }
}
