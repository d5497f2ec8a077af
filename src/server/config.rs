//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::server::error::Error;

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8000;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The read buffer size, which is also the largest accepted request head.
    pub read_buffer_size: usize,
    /// The largest accepted request body.
    pub max_body_size: usize,
    /// Directory holding the static assets.
    pub static_dir: PathBuf,
    /// How long a kept-alive connection may sit idle before it is closed.
    pub keep_alive_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_connections: 1024,
            read_buffer_size: 8192,
            max_body_size: 16 * 1024 * 1024,
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")),
            keep_alive_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from the process environment.
    ///
    /// Only the port is configurable, through `PORT`. The server always binds
    /// to all interfaces.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_port_var(std::env::var("PORT").ok().as_deref())
    }

    fn from_port_var(port: Option<&str>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(raw) = port.map(str::trim).filter(|s| !s.is_empty()) {
            let port: u16 = raw
                .parse()
                .map_err(|e| Error::InvalidConfig(format!("PORT='{raw}': {e}")))?;
            config.addr.set_port(port);
        }

        Ok(config)
    }
}
