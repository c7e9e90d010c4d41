//! Configuration management for the `NomadAI` planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::NomadError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `NomadAI` planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NomadConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Itinerary planner settings
    #[serde(default)]
    pub planner: PlannerConfig,
    /// OpenAI chat completions settings
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Amadeus flight and hotel API settings
    #[serde(default)]
    pub amadeus: AmadeusConfig,
    /// Google Places settings
    #[serde(default)]
    pub google_places: GooglePlacesConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Trace export configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory holding the built dashboard assets
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Allowed CORS origins, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

/// Itinerary planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Currency literal used in prompts, fallback text and cost extraction
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Sampling temperature for the model call
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Number of runner-up hotels listed as alternatives
    #[serde(default = "default_alternative_hotels")]
    pub alternative_hotels: usize,
}

/// OpenAI chat completions settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key; without it every generation falls back to the template
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_timeout")]
    pub timeout_seconds: u32,
}

/// Amadeus self-service API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmadeusConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Test or production host
    #[serde(default = "default_amadeus_base_url")]
    pub base_url: String,
    #[serde(default = "default_amadeus_max_flight_offers")]
    pub max_flight_offers: u32,
    #[serde(default = "default_amadeus_max_hotels")]
    pub max_hotels: u32,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
}

/// Google Places settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GooglePlacesConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_places_base_url")]
    pub base_url: String,
    /// Maximum points of interest returned per search
    #[serde(default = "default_places_max_results")]
    pub max_results: u32,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Interval between background sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_flight_ttl")]
    pub flight_ttl_seconds: u64,
    #[serde(default = "default_hotel_ttl")]
    pub hotel_ttl_seconds: u64,
    #[serde(default = "default_poi_ttl")]
    pub poi_ttl_seconds: u64,
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

/// OTLP trace export, disabled unless an endpoint is given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_static_dir() -> String {
    "frontend/dist".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:8501".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

fn default_request_timeout() -> u32 {
    120
}

fn default_currency() -> String {
    "SGD".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_alternative_hotels() -> usize {
    3
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_timeout() -> u32 {
    90
}

fn default_amadeus_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_amadeus_max_flight_offers() -> u32 {
    5
}

fn default_amadeus_max_hotels() -> u32 {
    10
}

fn default_places_base_url() -> String {
    "https://maps.googleapis.com/maps/api/place".to_string()
}

fn default_places_max_results() -> u32 {
    20
}

fn default_http_timeout() -> u32 {
    30
}

fn default_http_max_retries() -> u32 {
    3
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_flight_ttl() -> u64 {
    3600
}

fn default_hotel_ttl() -> u64 {
    3600
}

fn default_poi_ttl() -> u64 {
    24 * 3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_service_name() -> String {
    "nomadai".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: default_static_dir(),
            cors_origins: default_cors_origins(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            temperature: default_temperature(),
            alternative_hotels: default_alternative_hotels(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            timeout_seconds: default_openai_timeout(),
        }
    }
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            base_url: default_amadeus_base_url(),
            max_flight_offers: default_amadeus_max_flight_offers(),
            max_hotels: default_amadeus_max_hotels(),
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
        }
    }
}

impl Default for GooglePlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_places_base_url(),
            max_results: default_places_max_results(),
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval(),
            flight_ttl_seconds: default_flight_ttl(),
            hotel_ttl_seconds: default_hotel_ttl(),
            poi_ttl_seconds: default_poi_ttl(),
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

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    #[must_use]
    pub fn flight_ttl(&self) -> Duration {
        Duration::from_secs(self.flight_ttl_seconds)
    }

    #[must_use]
    pub fn hotel_ttl(&self) -> Duration {
        Duration::from_secs(self.hotel_ttl_seconds)
    }

    #[must_use]
    pub fn poi_ttl(&self) -> Duration {
        Duration::from_secs(self.poi_ttl_seconds)
    }
}

impl NomadConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("NOMADAI_CONFIG").map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // NOMADAI_OPENAI__API_KEY -> openai.api_key
        builder = builder.add_source(
            Environment::with_prefix("NOMADAI")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: NomadConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nomadai").join("config.toml"))
    }

    /// Apply default values to empty or zeroed fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.planner.currency.is_empty() {
            self.planner.currency = default_currency();
        }
        if self.openai.model.is_empty() {
            self.openai.model = default_openai_model();
        }
        if self.openai.base_url.is_empty() {
            self.openai.base_url = default_openai_base_url();
        }
        if self.openai.timeout_seconds == 0 {
            self.openai.timeout_seconds = default_openai_timeout();
        }
        if self.amadeus.base_url.is_empty() {
            self.amadeus.base_url = default_amadeus_base_url();
        }
        if self.amadeus.timeout_seconds == 0 {
            self.amadeus.timeout_seconds = default_http_timeout();
        }
        if self.google_places.base_url.is_empty() {
            self.google_places.base_url = default_places_base_url();
        }
        if self.google_places.timeout_seconds == 0 {
            self.google_places.timeout_seconds = default_http_timeout();
        }
        if self.cache.sweep_interval_seconds == 0 {
            self.cache.sweep_interval_seconds = default_sweep_interval();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.telemetry.service_name.is_empty() {
            self.telemetry.service_name = default_service_name();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("OpenAI API key", &self.openai.api_key),
            ("Amadeus API key", &self.amadeus.api_key),
            ("Amadeus API secret", &self.amadeus.api_secret),
            ("Google Places API key", &self.google_places.api_key),
        ];

        for (name, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(NomadError::config(format!(
                        "{name} cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
            }
        }

        if self.amadeus.api_key.is_some() != self.amadeus.api_secret.is_some() {
            return Err(NomadError::config(
                "Amadeus API key and secret must be configured together",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.planner.temperature) {
            return Err(NomadError::config("Planner temperature must be between 0.0 and 2.0").into());
        }

        if self.openai.timeout_seconds > 600 {
            return Err(NomadError::config("OpenAI timeout cannot exceed 600 seconds").into());
        }

        if self.amadeus.timeout_seconds > 300 || self.google_places.timeout_seconds > 300 {
            return Err(NomadError::config("Provider timeout cannot exceed 300 seconds").into());
        }

        if self.amadeus.max_retries > 10 || self.google_places.max_retries > 10 {
            return Err(NomadError::config("Provider max retries cannot exceed 10").into());
        }

        if self.amadeus.max_flight_offers == 0 || self.amadeus.max_flight_offers > 250 {
            return Err(NomadError::config("Amadeus max flight offers must be between 1 and 250").into());
        }

        if self.cache.sweep_interval_seconds > 3600 {
            return Err(NomadError::config("Cache sweep interval cannot exceed 3600 seconds").into());
        }

        if self.cache.poi_ttl_seconds > 7 * 24 * 3600 {
            return Err(NomadError::config("Cache TTL cannot exceed 168 hours (1 week)").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(NomadError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(NomadError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("OpenAI", &self.openai.base_url),
            ("Amadeus", &self.amadeus.base_url),
            ("Google Places", &self.google_places.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(NomadError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.planner.currency.trim().is_empty() {
            return Err(NomadError::config("Planner currency cannot be blank").into());
        }

        Ok(())
    }
}
