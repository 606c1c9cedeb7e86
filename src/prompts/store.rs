use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// File extension of prompt templates, without the dot.
pub const TEMPLATE_EXTENSION: &str = "md";

/// Where prompt templates live.
pub trait TemplateStore: Send + Sync {
    fn folder_exists(&self, folder: &str) -> bool;

    /// Names of all templates under `folder`, recursively, sorted.
    ///
    /// A template's name is its path relative to `folder` without the
    /// extension, with `/` as separator. `None` when the folder is missing.
    fn list(&self, folder: &str) -> Option<Vec<String>>;

    /// Raw text of `<folder>/<name>.md`, or `None` when there is no such file.
    fn read(&self, folder: &str, name: &str) -> io::Result<Option<String>>;
}

/// Templates stored as files inside a vault directory.
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder_path(&self, folder: &str) -> PathBuf {
        self.root.join(folder)
    }

    pub fn template_path(&self, folder: &str, name: &str) -> PathBuf {
        self.folder_path(folder)
            .join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    /// Template names may only descend into the prompt folder.
    fn is_contained(name: &str) -> bool {
        !name.is_empty()
            && Path::new(name)
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
    }

    fn template_name(folder: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(folder).ok()?.with_extension("");
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

impl TemplateStore for FsTemplateStore {
    fn folder_exists(&self, folder: &str) -> bool {
        self.folder_path(folder).is_dir()
    }

    fn list(&self, folder: &str) -> Option<Vec<String>> {
        let folder_path = self.folder_path(folder);
        if !folder_path.is_dir() {
            debug!("Prompt folder {} does not exist", folder_path.display());
            return None;
        }

        let mut names: Vec<String> = WalkDir::new(&folder_path)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable prompt entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == TEMPLATE_EXTENSION)
            })
            .filter_map(|entry| Self::template_name(&folder_path, entry.path()))
            .collect();

        names.sort();
        debug!("Found {} prompt templates in {}", names.len(), folder_path.display());
        Some(names)
    }

    fn read(&self, folder: &str, name: &str) -> io::Result<Option<String>> {
        if !Self::is_contained(name) {
            warn!("Rejecting prompt template name '{name}' outside the prompt folder");
            return Ok(None);
        }

        let path = self.template_path(folder, name);
        if !path.is_file() {
            debug!("Prompt template {} not found", path.display());
            return Ok(None);
        }

        fs::read_to_string(&path).map(Some)
    }
}
