use crate::error::BuildonomyError;
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

/// Output layout settings shared by every [`Environment`](crate::environment::Environment) of a
/// build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix of the output tree, used by `generate_url`.
    pub target_directory: String,
    /// Extension appended to document urls in the output tree.
    pub output_extension: String,
    /// Rewrite rooted urls relative to the referencing document.
    pub use_relative_urls: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            target_directory: String::new(),
            output_extension: "html".to_string(),
            use_relative_urls: true,
        }
    }
}

impl OutputConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, BuildonomyError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BuildonomyError> {
        tracing::debug!("Reading output config from {:?}", path.as_ref());
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, BuildonomyError> {
        Ok(toml::to_string(self)?)
    }

    /// Output url of a document url, i.e. `guide/intro` -> `guide/intro.html`.
    pub fn document_url(&self, url: &str) -> String {
        if self.output_extension.is_empty() {
            url.to_string()
        } else {
            format!("{}.{}", url, self.output_extension)
        }
    }
}
