use std::{env, fmt, net::SocketAddr, time::Duration};

use url::Url;

use super::server_bind_address;

pub const DEFAULT_BACKEND_BASE_URL: &str = "http://127.0.0.1:5000/api/";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://placement-console.db?mode=rwc";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SESSION_TTL_HOURS: u64 = 12;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub backend_base_url: Url,
    pub backend_timeout: Duration,
    pub database_url: String,
    pub session_ttl: Duration,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;

        let base_value = env::var("BACKEND_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_BASE_URL.to_string());
        let backend_base_url = Url::parse(&base_value).map_err(ConfigError::BackendBaseUrl)?;
        if backend_base_url.cannot_be_a_base() {
            return Err(ConfigError::BackendBaseUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let backend_timeout = Duration::from_secs(positive_u64(
            "BACKEND_TIMEOUT_SECS",
            DEFAULT_BACKEND_TIMEOUT_SECS,
        )?);
        let session_ttl = Duration::from_secs(
            positive_u64("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)? * 3600,
        );
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        Ok(Self {
            bind_addr,
            environment,
            backend_base_url,
            backend_timeout,
            database_url,
            session_ttl,
        })
    }
}

fn positive_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    BackendBaseUrl(url::ParseError),
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::BackendBaseUrl(err) => write!(f, "invalid BACKEND_BASE_URL value: {err}"),
            Self::InvalidNumber { name, value } => {
                write!(f, "{name} must be a positive integer (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
