//! Configuration management for the Recosanté adapter
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::RecosanteError;
use crate::models::Location;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the Recosanté adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecosanteConfig {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Configured municipality, if setup already happened
    #[serde(default)]
    pub location: LocationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Recosanté data API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Base URL of the geo.api.gouv.fr API used to resolve postal codes
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Persisted result of the setup step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    /// INSEE code of the municipality
    pub insee: Option<String>,
    /// Display name of the municipality
    pub city: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.recosante.beta.gouv.fr".to_string()
}

fn default_geo_base_url() -> String {
    "https://geo.api.gouv.fr".to_string()
}

fn default_timeout() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            geo_base_url: default_geo_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl LocationConfig {
    /// The configured location, when both the code and the name are set
    #[must_use]
    pub fn to_location(&self) -> Option<Location> {
        match (&self.insee, &self.city) {
            (Some(insee), Some(city)) => Some(Location::new(insee.clone(), city.clone())),
            _ => None,
        }
    }
}

// RECOSANTE_API__BASE_URL, RECOSANTE_LOCATION__INSEE, ...
// Values stay strings: INSEE codes such as 01001 must keep their leading zero.
fn environment() -> Environment {
    Environment::with_prefix("RECOSANTE")
        .prefix_separator("_")
        .separator("__")
}

impl RecosanteConfig {
    /// Load configuration from the given file (or the default path) and
    /// `RECOSANTE_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_layered(config_path, environment())
    }

    fn load_layered(config_path: Option<PathBuf>, environment: Environment) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(environment);

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: RecosanteConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("recosante").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.base_url.is_empty() {
            self.api.base_url = default_base_url();
        }
        if self.api.geo_base_url.is_empty() {
            self.api.geo_base_url = default_geo_base_url();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_location()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(RecosanteError::config("API timeout cannot exceed 300 seconds").into());
        }
        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RecosanteError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RecosanteError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("API base URL", &self.api.base_url),
            ("Geo API base URL", &self.api.geo_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RecosanteError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        if let Some(insee) = &self.location.insee {
            Location::validate_insee(insee)?;
        }
        Ok(())
    }
}
