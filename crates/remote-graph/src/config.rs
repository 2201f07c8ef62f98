//! Centralized configuration for remote-graph.
//!
//! Wire limits and timeouts live in [`IpcConfig`]; where a host listens and
//! which file guards the machine-wide claim live in [`Endpoint`].

use crate::{RemoteError, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// IPC limits and timing.
pub struct IpcConfig;

impl IpcConfig {
    /// Well-known name of the channel.
    pub const ENDPOINT_NAME: &'static str = "remote-graph";
    pub const DEFAULT_PORT: u16 = 47_615;
    pub const LOCK_FILE_NAME: &'static str = "remote-graph.lock";

    pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    // WAITFOR polling
    pub const WAIT_POLL_INITIAL: Duration = Duration::from_millis(25);
    pub const WAIT_POLL_MAX: Duration = Duration::from_millis(500);

    // Environment overrides
    pub const ADDR_ENV: &'static str = "REMOTE_GRAPH_ADDR";
    pub const LOCK_ENV: &'static str = "REMOTE_GRAPH_LOCK";
}

/// Where a host listens and where its machine-wide lock lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub addr: SocketAddr,
    pub lock_path: PathBuf,
}

impl Endpoint {
    pub fn new(addr: SocketAddr, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            name: IpcConfig::ENDPOINT_NAME.to_string(),
            addr,
            lock_path: lock_path.into(),
        }
    }

    /// The fixed endpoint every host and client agree on by default.
    pub fn well_known() -> Self {
        let lock_dir = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(
            SocketAddr::from((Ipv4Addr::LOCALHOST, IpcConfig::DEFAULT_PORT)),
            lock_dir.join(IpcConfig::LOCK_FILE_NAME),
        )
    }

    /// The well-known endpoint with `REMOTE_GRAPH_ADDR` / `REMOTE_GRAPH_LOCK`
    /// applied on top.
    pub fn from_env() -> Result<Self> {
        let mut endpoint = Self::well_known();

        if let Ok(addr) = std::env::var(IpcConfig::ADDR_ENV) {
            endpoint.addr = addr.parse().map_err(|e| RemoteError::Config {
                message: format!("Invalid {} '{}': {}", IpcConfig::ADDR_ENV, addr, e),
            })?;
        }

        if let Ok(lock) = std::env::var(IpcConfig::LOCK_ENV) {
            if lock.trim().is_empty() {
                return Err(RemoteError::Config {
                    message: format!("{} is set but empty", IpcConfig::LOCK_ENV),
                });
            }
            endpoint.lock_path = PathBuf::from(lock);
        }

        Ok(endpoint)
    }

    /// Same lock, different address. Used when a host bound port 0 and
    /// clients need the real port.
    pub fn with_addr(&self, addr: SocketAddr) -> Self {
        Self {
            addr,
            ..self.clone()
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::well_known()
    }
}
