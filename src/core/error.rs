use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeaveError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Class '{0}' not found")]
    ClassNotFound(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Capability composition failed: {0}")]
    CompositionError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, WeaveError>;

impl From<std::io::Error> for WeaveError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<regex::Error> for WeaveError {
    fn from(err: regex::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
