use std::net::SocketAddr;

use finder_common::config::FinderConfig;

use crate::error::AppError;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub finder: FinderConfig,
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Reads [`FinderConfig::from_env`] plus:
    /// - `FINDER_WEB_LISTEN_ADDR` (default: "127.0.0.1:8080")
    pub fn from_env() -> Result<Self, AppError> {
        let raw = std::env::var("FINDER_WEB_LISTEN_ADDR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = raw.trim().parse().map_err(|_| {
            AppError::Config(format!("FINDER_WEB_LISTEN_ADDR is not a socket address: {raw}"))
        })?;

        Ok(Self {
            finder: FinderConfig::from_env(),
            listen_addr,
        })
    }
}
