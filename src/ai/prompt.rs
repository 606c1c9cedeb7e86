use url::Url;

/// What gets sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// A single user message.
    Text(String),
    /// A user message made of an attached file reference followed by text.
    WithAttachment { url: Url, text: String },
}

impl Prompt {
    pub fn text(&self) -> &str {
        match self {
            Prompt::Text(text) => text,
            Prompt::WithAttachment { text, .. } => text,
        }
    }

    pub fn attachment(&self) -> Option<&Url> {
        match self {
            Prompt::Text(_) => None,
            Prompt::WithAttachment { url, .. } => Some(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: Prompt,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, prompt: Prompt) -> Self {
        Self {
            model: model.into(),
            prompt,
        }
    }
}
