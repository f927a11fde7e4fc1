mod engine;

pub use engine::EngineConfig;

use crate::workflows::scoring::ProfileError;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub portfolio: PortfolioConfig,
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

        let cache_ttl_secs = parse_number("ZEROCHURN_CACHE_TTL_SECS", 3_600)?;
        let task_dedupe_days = parse_number("ZEROCHURN_TASK_DEDUPE_DAYS", 7)?;
        let engine_config_path = env::var_os("ZEROCHURN_ENGINE_CONFIG").map(PathBuf::from);
        let accounts_path = env::var_os("ZEROCHURN_ACCOUNTS_PATH").map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portfolio: PortfolioConfig {
                cache_ttl_secs,
                task_dedupe_days,
                engine_config_path,
                accounts_path,
            },
        })
    }
}

fn parse_number<T>(variable: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable, value: raw }),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Caller-layer settings: caching, sweep de-duplication, and data locations.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub cache_ttl_secs: u64,
    pub task_dedupe_days: u32,
    pub engine_config_path: Option<PathBuf>,
    pub accounts_path: Option<PathBuf>,
}

impl PortfolioConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        let seconds = i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX);
        chrono::Duration::seconds(seconds.min(i64::MAX / 1_000))
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3_600,
            task_dedupe_days: 7,
            engine_config_path: None,
            accounts_path: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    EngineFile {
        path: PathBuf,
        source: std::io::Error,
    },
    EngineFormat {
        source: serde_json::Error,
    },
    Profile(ProfileError),
    EmptyTierCatalog,
    DuplicateTrigger(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative integer (found '{value}')")
            }
            ConfigError::EngineFile { path, .. } => {
                write!(f, "unable to read engine config {}", path.display())
            }
            ConfigError::EngineFormat { .. } => write!(f, "engine config is not valid JSON"),
            ConfigError::Profile(err) => write!(f, "invalid score profile: {err}"),
            ConfigError::EmptyTierCatalog => write!(f, "tier catalog must list at least one tier"),
            ConfigError::DuplicateTrigger(id) => {
                write!(f, "trigger catalog defines '{id}' more than once")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::EngineFile { source, .. } => Some(source),
            ConfigError::EngineFormat { source } => Some(source),
            ConfigError::Profile(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::EmptyTierCatalog
            | ConfigError::DuplicateTrigger(_) => None,
        }
    }
}

impl From<ProfileError> for ConfigError {
    fn from(value: ProfileError) -> Self {
        Self::Profile(value)
    }
}
