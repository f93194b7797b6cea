//! CLI argument definitions for the chef assistant.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Mega Chef, a culinary assistant for the terminal.
#[derive(Parser, Debug)]
#[command(name = "chef", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// City used for weather and time questions without asking first.
    #[arg(long = "city")]
    pub city: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CHEF_CONFIG env var > ~/.chef/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CHEF_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Priority: OPENWEATHER_API_KEY env var > config file value.
    pub fn resolve_weather_key(&self, config_key: &str) -> String {
        env_or("OPENWEATHER_API_KEY", config_key)
    }

    /// Priority: GEMINI_API_KEY env var > config file value.
    pub fn resolve_generative_key(&self, config_key: &str) -> String {
        env_or("GEMINI_API_KEY", config_key)
    }
}

fn env_or(var: &str, fallback: &str) -> String {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".chef").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".chef").join("config.toml");
    }
    PathBuf::from("config.toml")
}
