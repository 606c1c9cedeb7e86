use log::warn;
use serde_yaml::{Mapping, Value};

/// YAML metadata block at the top of a note, delimited by `---` lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Mapping,
}

impl FrontMatter {
    /// Extracts the front-matter of `content`.
    ///
    /// A note without a block, or with a block that is not a YAML mapping,
    /// yields empty front-matter.
    pub fn parse(content: &str) -> Self {
        let Some(yaml) = Self::block(content) else {
            return Self::default();
        };

        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(fields)) => Self { fields },
            Ok(Value::Null) => Self::default(),
            Ok(_) => {
                warn!("Front-matter is not a mapping, ignoring it");
                Self::default()
            }
            Err(e) => {
                warn!("Failed to parse front-matter: {e}");
                Self::default()
            }
        }
    }

    fn block(content: &str) -> Option<&str> {
        let mut lines = content.split_inclusive('\n');
        let first = lines.next()?;
        if first.trim_end() != "---" {
            return None;
        }

        let start = first.len();
        let mut end = start;
        for line in lines {
            if line.trim_end() == "---" {
                return Some(&content[start..end]);
            }
            end += line.len();
        }

        None
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The attachment reference used by file-augmented generation.
    pub fn url(&self) -> Option<&str> {
        self.get_str("url")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
