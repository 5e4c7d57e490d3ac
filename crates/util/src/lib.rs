//! Process-level configuration for the placement console.
//!
//! Variables read at startup:
//!
//! - `APP_ENV`: `development` (default), `production` or `test`
//! - `APP_BIND_ADDR`: listen address, [`DEFAULT_BIND_ADDR`] when unset
//! - `BACKEND_BASE_URL`: root of the placement REST backend
//! - `BACKEND_TIMEOUT_SECS`: per-request timeout towards the backend
//! - `DATABASE_URL`: SQLite url of the session store
//! - `SESSION_TTL_HOURS`: idle time after which a session expires

pub mod config;

use std::{env, net::SocketAddr, path::PathBuf};

pub use config::{AppConfig, ConfigError, Environment};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Loads `.env` when present and returns the file that was read.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Listen address from `APP_BIND_ADDR`, or [`DEFAULT_BIND_ADDR`].
pub fn server_bind_address() -> Result<SocketAddr, std::net::AddrParseError> {
    env::var("APP_BIND_ADDR")
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
}

#[cfg(test)]
pub(crate) static ENV_GUARD: std::sync::LazyLock<std::sync::Mutex<()>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_defaults_to_loopback() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("APP_BIND_ADDR");
        let addr = server_bind_address().expect("default address is valid");
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn bind_address_is_trimmed_and_validated() {
        let _lock = ENV_GUARD.lock().expect("env guard poisoned");
        env::set_var("APP_BIND_ADDR", " 0.0.0.0:9000 ");
        assert_eq!(
            server_bind_address().expect("custom address").to_string(),
            "0.0.0.0:9000"
        );

        env::set_var("APP_BIND_ADDR", "console.local");
        assert!(server_bind_address().is_err());
        env::remove_var("APP_BIND_ADDR");
    }
}
