//! OpenWeatherMap geocoding and current-weather client.

use async_trait::async_trait;
use chef_core::config::WeatherConfig;
use chef_dialog::{DialogError, GeoLocation, WeatherReport, WeatherService};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("OpenWeatherMap"));
        }

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_location(&self, city: &str) -> Result<GeoLocation, ProviderError> {
        let entries: Vec<GeocodeEntry> = self
            .get_json(
                "/geo/1.0/direct",
                &[("q", city.to_string()), ("limit", "1".to_string())],
            )
            .await?;
        first_location(entries, city)
    }

    async fn fetch_conditions(&self, lat: f64, lon: f64) -> Result<WeatherReport, ProviderError> {
        let current: CurrentWeather = self
            .get_json(
                "/data/2.5/weather",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("units", "metric".to_string()),
                    ("lang", "pt_br".to_string()),
                ],
            )
            .await?;
        Ok(current.into_report())
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn geocode(&self, city: &str) -> Result<GeoLocation, DialogError> {
        let location = self
            .fetch_location(city)
            .await
            .map_err(ProviderError::into_weather_error)?;
        debug!(query = %city, name = %location.name, country = %location.country, "City geocoded");
        Ok(location)
    }

    async fn current_conditions(&self, lat: f64, lon: f64) -> Result<WeatherReport, DialogError> {
        self.fetch_conditions(lat, lon)
            .await
            .map_err(ProviderError::into_weather_error)
    }
}

// OpenWeatherMap API types

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    lat: f64,
    lon: f64,
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

impl CurrentWeather {
    fn into_report(self) -> WeatherReport {
        WeatherReport {
            temperature_c: self.main.temp,
            description: self
                .weather
                .into_iter()
                .next()
                .map(|c| c.description)
                .unwrap_or_default(),
            humidity: self.main.humidity,
            timezone_offset_secs: self.timezone,
        }
    }
}

fn first_location(entries: Vec<GeocodeEntry>, city: &str) -> Result<GeoLocation, ProviderError> {
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(city.to_string()))?;
    Ok(GeoLocation {
        lat: entry.lat,
        lon: entry.lon,
        name: entry.name,
        country: entry.country,
    })
}
