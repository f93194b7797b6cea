//! HTTP-backed collaborators for the dialog engine.

pub mod connectivity;
pub mod error;
pub mod gemini;
pub mod openweather;

pub use connectivity::AlwaysOnline;
pub use error::ProviderError;
pub use gemini::GeminiClient;
pub use openweather::OpenWeatherClient;
