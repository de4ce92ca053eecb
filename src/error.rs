use thiserror::Error;

/// Fatal errors that abort compiling a template.
///
/// Everything else the compiler runs into is recorded as a [`crate::signal::Signal`]
/// and never interrupts the current shot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Failed to parse JSON: {0}")]
    JsonParse(String),

    #[error("Workflow template has an unrecognized shape: {0}")]
    UnshapedTemplate(String),

    #[error("Editor node at position {index} could not be decoded: {message}")]
    MalformedNode { index: usize, message: String },

    #[error("Could not read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Shot {shot} has invalid parameters: {message}")]
    InvalidShot { shot: String, message: String },
}

impl ConfigurationError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}
