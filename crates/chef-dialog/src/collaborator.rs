//! External services a turn depends on.
//!
//! Implementations live in `chef-providers`; tests use in-process fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DialogError;

/// Resolved place returned by geocoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
}

/// Current conditions at a coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub description: String,
    pub humidity: u8,
    /// Offset of local time from UTC, in seconds.
    pub timezone_offset_secs: i32,
}

/// Single prompt in, generated text out.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, DialogError>;
}

/// Geocoding plus current weather.
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Resolve a city name. `CityNotFound` when nothing matches.
    async fn geocode(&self, city: &str) -> Result<GeoLocation, DialogError>;

    async fn current_conditions(&self, lat: f64, lon: f64) -> Result<WeatherReport, DialogError>;
}

/// Checked before any external call.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}
