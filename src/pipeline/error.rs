use thiserror::Error;

use crate::ai::ModelError;

/// Reasons a generation run stops early.
///
/// Each one is shown to the user once as a notice; nothing is retried and
/// text already inserted stays where it is.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Prompt folder not found: {0}")]
    PromptFolderNotFound(String),

    #[error("Prompt file not found: {0}")]
    TemplateNotFound(String),

    #[error("Failed to read prompt file {name}: {source}")]
    TemplateUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No active document")]
    NoActiveDocument,

    #[error("No active editor to insert into")]
    NoActiveView,

    #[error("Attachment unavailable: {0}")]
    AttachmentUnavailable(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocationFailed(#[from] ModelError),
}
