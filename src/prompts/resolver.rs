use log::debug;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::document::DocumentContext;
use crate::pipeline::{Notifier, PipelineError};
use crate::prompts::TemplateStore;

/// Name of the `{title}` token, replaced by the active note's title.
pub const TITLE_TOKEN: &str = "title";

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("token pattern is valid")
    })
}

/// Fills the placeholder tokens of `template` from `document`.
///
/// One left-to-right pass: substituted text is never scanned again, and
/// tokens with no known value are kept verbatim.
pub fn substitute(template: &str, document: &DocumentContext) -> String {
    let values: HashMap<&str, &str> = HashMap::from([(TITLE_TOKEN, document.title.as_str())]);

    let mut unresolved = Vec::new();
    let resolved = token_pattern().replace_all(template, |caps: &Captures| {
        match values.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => {
                unresolved.push(caps[0].to_string());
                caps[0].to_string()
            }
        }
    });

    if !unresolved.is_empty() {
        debug!(
            "Leaving unknown template tokens as-is: {}",
            unresolved.join(", ")
        );
    }

    resolved.into_owned()
}

/// Loads templates from a [`TemplateStore`] and resolves them for a document.
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn TemplateStore>,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    pub fn list(&self, folder: &str) -> Result<Vec<String>, PipelineError> {
        self.store
            .list(folder)
            .ok_or_else(|| PipelineError::PromptFolderNotFound(folder.to_string()))
    }

    /// Like [`list`](Self::list), but a missing folder becomes a notice and
    /// an empty list so a picker can still be shown.
    pub fn list_or_notify(&self, folder: &str, notifier: &dyn Notifier) -> Vec<String> {
        match self.list(folder) {
            Ok(names) => names,
            Err(e) => {
                notifier.notice(&e.to_string());
                Vec::new()
            }
        }
    }

    /// Reads the raw template text; re-read on every call.
    pub fn load(&self, folder: &str, name: &str) -> Result<String, PipelineError> {
        if !self.store.folder_exists(folder) {
            return Err(PipelineError::PromptFolderNotFound(folder.to_string()));
        }

        self.store
            .read(folder, name)
            .map_err(|source| PipelineError::TemplateUnreadable {
                name: name.to_string(),
                source,
            })?
            .ok_or_else(|| PipelineError::TemplateNotFound(name.to_string()))
    }

    pub fn resolve(
        &self,
        folder: &str,
        name: &str,
        document: Option<&DocumentContext>,
    ) -> Result<String, PipelineError> {
        let template = self.load(folder, name)?;
        let document = document.ok_or(PipelineError::NoActiveDocument)?;
        let prompt = substitute(&template, document);

        debug!("Resolved template '{name}' ({} chars)", prompt.chars().count());
        Ok(prompt)
    }
}
