use std::env;
use std::fmt;
use std::time::Duration;

use crate::analysis::{AnalysisMode, EndpointMap};

const LOCAL_BACKEND_URL: &str = "http://127.0.0.1:8000";
const REMOTE_BACKEND_URL: &str = "https://readability-backend-production.up.railway.app";
pub const DEFAULT_UNIFIED_ENDPOINT: &str = "/analyze";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Distinguishes runtime behavior for different stages of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Local runs talk to a backend on the loopback interface.
    pub const fn default_backend_url(self) -> &'static str {
        match self {
            Self::Development | Self::Test => LOCAL_BACKEND_URL,
            Self::Production => REMOTE_BACKEND_URL,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub backend: BackendConfig,
    pub analysis: AnalysisProfile,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url = env::var("APP_BACKEND_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| environment.default_backend_url().to_string());
        let base_url = validate_backend_url(base_url)?;

        let timeout_secs = env::var("APP_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let scheme = env::var("APP_ENDPOINT_SCHEME").unwrap_or_else(|_| "per_mode".to_string());
        let unified_endpoint = env::var("APP_UNIFIED_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_UNIFIED_ENDPOINT.to_string());
        let endpoints = EndpointScheme::parse(&scheme)?.endpoints(&unified_endpoint);

        let modes = match env::var("APP_MODES") {
            Ok(raw) => parse_modes(&raw)?,
            Err(_) => AnalysisMode::ordered().to_vec(),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            analysis: AnalysisProfile {
                modes,
                endpoints,
                unified_endpoint,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }

    /// Apply command-line overrides on top of the loaded values. A backend URL
    /// goes through the same check as `APP_BACKEND_URL`, and a scheme override
    /// keeps the configured unified path.
    pub fn override_with(
        &mut self,
        backend_url: Option<String>,
        scheme: Option<EndpointScheme>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = backend_url {
            self.backend.base_url = validate_backend_url(url.trim().to_string())?;
        }
        if let Some(scheme) = scheme {
            self.analysis.endpoints = scheme.endpoints(&self.analysis.unified_endpoint);
        }
        Ok(())
    }
}

fn validate_backend_url(base_url: String) -> Result<String, ConfigError> {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        Ok(base_url)
    } else {
        Err(ConfigError::InvalidBackendUrl(base_url))
    }
}

/// Where the analysis service lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// The parameters that distinguish one client deployment from another: which
/// modes it offers and where each mode is routed. `unified_endpoint` is the
/// shared path used whenever the unified scheme is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisProfile {
    pub modes: Vec<AnalysisMode>,
    pub endpoints: EndpointMap,
    pub unified_endpoint: String,
}

impl Default for AnalysisProfile {
    fn default() -> Self {
        Self {
            modes: AnalysisMode::ordered().to_vec(),
            endpoints: EndpointMap::per_mode(),
            unified_endpoint: DEFAULT_UNIFIED_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointScheme {
    PerMode,
    Unified,
}

impl EndpointScheme {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per_mode" | "per-mode" => Ok(Self::PerMode),
            "unified" => Ok(Self::Unified),
            _ => Err(ConfigError::InvalidEndpointScheme(value.to_string())),
        }
    }

    pub fn endpoints(self, unified_path: &str) -> EndpointMap {
        match self {
            Self::PerMode => EndpointMap::per_mode(),
            Self::Unified => EndpointMap::unified(unified_path),
        }
    }
}

fn parse_modes(raw: &str) -> Result<Vec<AnalysisMode>, ConfigError> {
    let mut modes = Vec::new();
    for slug in raw.split(',').map(str::trim).filter(|slug| !slug.is_empty()) {
        let mode = slug
            .parse::<AnalysisMode>()
            .map_err(|_| ConfigError::InvalidMode(slug.to_string()))?;
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }

    if modes.is_empty() {
        return Err(ConfigError::NoModes);
    }
    Ok(modes)
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBackendUrl(String),
    InvalidTimeout,
    InvalidEndpointScheme(String),
    InvalidMode(String),
    NoModes,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBackendUrl(value) => {
                write!(f, "APP_BACKEND_URL must be an http(s) URL, got '{value}'")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "APP_REQUEST_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidEndpointScheme(value) => write!(
                f,
                "APP_ENDPOINT_SCHEME must be 'per_mode' or 'unified', got '{value}'"
            ),
            ConfigError::InvalidMode(value) => write!(
                f,
                "APP_MODES contains unknown mode '{value}' (expected readability, tone or plagiarism)"
            ),
            ConfigError::NoModes => write!(f, "APP_MODES must list at least one mode"),
        }
    }
}

impl std::error::Error for ConfigError {}
