//! Error types for the dialog engine.

use chef_core::error::ChefError;
use uuid::Uuid;

/// Errors raised while running a conversational turn or touching the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DialogError {
    #[error("city not found: {0}")]
    CityNotFound(String),
    #[error("weather service unavailable: {0}")]
    WeatherServiceUnavailable(String),
    #[error("unexpected slot reply: no city is being awaited")]
    UnexpectedSlotReply,
    #[error("generative service error: {0}")]
    GenerativeServiceError(String),
    #[error("offline: no network connectivity")]
    Offline,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),
    #[error("title cannot be blank")]
    InvalidTitle,
    #[error("storage error: {0}")]
    StorageError(String),
}

impl DialogError {
    /// Whether the turn must be abandoned without touching slot state or
    /// history.
    pub fn is_fatal_to_turn(&self) -> bool {
        matches!(
            self,
            DialogError::UnexpectedSlotReply
                | DialogError::Offline
                | DialogError::EmptyMessage
                | DialogError::MessageTooLong(_)
        )
    }

    /// Whether the error came from the geocoding/weather lookup.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            DialogError::CityNotFound(_) | DialogError::WeatherServiceUnavailable(_)
        )
    }
}

impl From<DialogError> for ChefError {
    fn from(err: DialogError) -> Self {
        match err {
            DialogError::StorageError(msg) => ChefError::Storage(msg),
            DialogError::ConversationNotFound(id) => {
                ChefError::Storage(format!("conversation not found: {}", id))
            }
            DialogError::CityNotFound(_)
            | DialogError::WeatherServiceUnavailable(_)
            | DialogError::GenerativeServiceError(_) => ChefError::Provider(err.to_string()),
            other => ChefError::Dialog(other.to_string()),
        }
    }
}
