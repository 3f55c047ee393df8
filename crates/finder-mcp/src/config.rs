use std::net::SocketAddr;

use finder_common::config::FinderConfig;

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub finder: FinderConfig,
    /// When set, serve MCP over TCP on this address instead of stdio.
    pub tcp_listen_addr: Option<SocketAddr>,
}

impl Config {
    /// Reads [`FinderConfig::from_env`] plus:
    /// - `MCP_TCP_LISTEN_ADDR` (optional, e.g. "127.0.0.1:7410")
    pub fn from_env() -> Result<Self, AppError> {
        let tcp_listen_addr = match std::env::var("MCP_TCP_LISTEN_ADDR") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse().map_err(|_| {
                AppError::Config(format!("MCP_TCP_LISTEN_ADDR is not a socket address: {raw}"))
            })?),
            _ => None,
        };

        Ok(Self {
            finder: FinderConfig::from_env(),
            tcp_listen_addr,
        })
    }
}
