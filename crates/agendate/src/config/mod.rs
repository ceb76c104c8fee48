use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::links::DEFAULT_CONTACT_PHONE;
use crate::listings::NumericPolicy;

/// Distinguishes runtime behavior for different stages of the service.
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
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub search: SearchConfig,
    pub listings: ListingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let debounce_ms = env::var("SEARCH_DEBOUNCE_MS")
            .unwrap_or_else(|_| DEFAULT_DEBOUNCE_MS.to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidDebounce)?;
        let geocoder_base_url = env::var("GEOCODER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string());
        let geocoder_user_agent = env::var("GEOCODER_USER_AGENT")
            .unwrap_or_else(|_| format!("agendate/{}", env!("CARGO_PKG_VERSION")));

        let numeric_policy = match env::var("LISTING_NUMERIC_POLICY") {
            Ok(raw) => parse_numeric_policy(&raw)?,
            Err(_) => NumericPolicy::default(),
        };
        let contact_phone =
            env::var("CONTACT_PHONE").unwrap_or_else(|_| DEFAULT_CONTACT_PHONE.to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            search: SearchConfig {
                debounce: Duration::from_millis(debounce_ms),
                geocoder_base_url,
                geocoder_user_agent,
            },
            listings: ListingConfig {
                numeric_policy,
                contact_phone,
            },
        })
    }
}

const DEFAULT_DEBOUNCE_MS: u64 = 800;
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

fn parse_numeric_policy(raw: &str) -> Result<NumericPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "reject" | "strict" => Ok(NumericPolicy::RejectAtSubmit),
        "tolerate" | "lenient" => Ok(NumericPolicy::Tolerate),
        _ => Err(ConfigError::InvalidNumericPolicy {
            value: raw.to_string(),
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Place search quiet period and geocoder endpoint.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
}

#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub numeric_policy: NumericPolicy,
    /// Number used for the messaging deep link on listing details.
    pub contact_phone: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDebounce,
    InvalidNumericPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDebounce => {
                write!(f, "SEARCH_DEBOUNCE_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidNumericPolicy { value } => write!(
                f,
                "LISTING_NUMERIC_POLICY must be 'reject' or 'tolerate' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDebounce
            | ConfigError::InvalidNumericPolicy { .. } => None,
        }
    }
}
