use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{FrontMatter, TextBuffer};

/// What a generation run needs to know about the active note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentContext {
    /// File name without extension.
    pub title: String,
    pub front_matter: FrontMatter,
}

impl DocumentContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            front_matter: FrontMatter::default(),
        }
    }

    pub fn with_front_matter(mut self, front_matter: FrontMatter) -> Self {
        self.front_matter = front_matter;
        self
    }
}

/// A note file opened for editing.
pub struct Note {
    path: PathBuf,
    context: DocumentContext,
    buffer: TextBuffer,
}

impl Note {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read note {}", path.display()))?;

        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let front_matter = FrontMatter::parse(&content);

        debug!(
            "Opened note '{title}' ({} bytes, front-matter: {})",
            content.len(),
            !front_matter.is_empty()
        );

        Ok(Self {
            path: path.to_path_buf(),
            context: DocumentContext::new(title).with_front_matter(front_matter),
            buffer: TextBuffer::new(content),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.context.title
    }

    pub fn context(&self) -> &DocumentContext {
        &self.context
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut TextBuffer {
        &mut self.buffer
    }

    /// Splits the note into its read-only context and its editable buffer.
    pub fn parts_mut(&mut self) -> (&DocumentContext, &mut TextBuffer) {
        (&self.context, &mut self.buffer)
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.buffer.text())
            .with_context(|| format!("Failed to write note {}", self.path.display()))?;
        debug!("Saved note {}", self.path.display());
        Ok(())
    }
}
