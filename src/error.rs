use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum BuildonomyError {
    #[error("Unable to compute a canonical url for '{0}'")]
    CanonicalUrl(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Unknown reference section '{0}'. Register a resolver for it before compiling.")]
    UnknownSection(String),
}

impl BuildonomyError {
    /// Structural errors describe a misconfigured build rather than broken document content.
    pub fn is_structural(&self) -> bool {
        matches!(self, BuildonomyError::UnknownSection(_))
    }
}

impl From<toml::de::Error> for BuildonomyError {
    fn from(src: toml::de::Error) -> BuildonomyError {
        BuildonomyError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for BuildonomyError {
    fn from(src: toml::ser::Error) -> BuildonomyError {
        BuildonomyError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for BuildonomyError {
    fn from(src: JsonError) -> BuildonomyError {
        BuildonomyError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for BuildonomyError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => BuildonomyError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => BuildonomyError::PermissionDenied,
            _ => BuildonomyError::Io(format!("IOError: {}", x.kind())),
        }
    }
}
