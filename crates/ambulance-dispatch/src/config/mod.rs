use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;

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
    pub dispatch: DispatchConfig,
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

        let defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            default_eta_minutes: numeric_var(
                "DISPATCH_DEFAULT_ETA_MINUTES",
                defaults.default_eta_minutes,
            )?,
            page_limit: numeric_var("DISPATCH_PAGE_LIMIT", defaults.page_limit)?,
            max_page_limit: numeric_var("DISPATCH_MAX_PAGE_LIMIT", defaults.max_page_limit)?,
            alert_ttl_hours: numeric_var("TRAFFIC_ALERT_TTL_HOURS", defaults.alert_ttl_hours)?,
            roster_csv: env::var("DISPATCH_ROSTER_CSV")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };

        if dispatch.page_limit == 0 || dispatch.page_limit > dispatch.max_page_limit {
            return Err(ConfigError::InvalidNumber {
                variable: "DISPATCH_PAGE_LIMIT",
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            dispatch,
        })
    }
}

/// Reads a positive integer; zero is rejected like any other unparseable value.
fn numeric_var(variable: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the dispatch and routing workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// ETA applied when a dispatch request carries none.
    pub default_eta_minutes: u32,
    pub page_limit: u32,
    pub max_page_limit: u32,
    pub alert_ttl_hours: u32,
    pub roster_csv: Option<PathBuf>,
}

impl DispatchConfig {
    pub fn default_eta(&self) -> Duration {
        Duration::minutes(i64::from(self.default_eta_minutes))
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::hours(i64::from(self.alert_ttl_hours))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_eta_minutes: 15,
            page_limit: 20,
            max_page_limit: 100,
            alert_ttl_hours: 24,
            roster_csv: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a positive integer within range")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
