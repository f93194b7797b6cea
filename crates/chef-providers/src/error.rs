//! Provider-level errors and their mapping onto dialog errors.

use chef_dialog::DialogError;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("missing API key for {0}")]
    MissingApiKey(&'static str),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("no results for '{0}'")]
    NotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Request(format!("timeout: {}", err))
        } else if err.is_connect() {
            ProviderError::Request(format!("connection failed: {}", err))
        } else {
            ProviderError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

impl ProviderError {
    /// Map onto the weather lookup's error kinds.
    pub fn into_weather_error(self) -> DialogError {
        match self {
            ProviderError::NotFound(city) => DialogError::CityNotFound(city),
            other => DialogError::WeatherServiceUnavailable(other.to_string()),
        }
    }

    pub fn into_generative_error(self) -> DialogError {
        DialogError::GenerativeServiceError(self.to_string())
    }
}
