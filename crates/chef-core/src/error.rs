use thiserror::Error;

/// Top-level error type for the chef workspace.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for ChefError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ChefError {
    fn from(err: toml::de::Error) -> Self {
        ChefError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ChefError {
    fn from(err: toml::ser::Error) -> Self {
        ChefError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ChefError {
    fn from(err: serde_json::Error) -> Self {
        ChefError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for chef operations.
pub type Result<T> = std::result::Result<T, ChefError>;
