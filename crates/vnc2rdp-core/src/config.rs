//! TOML configuration for the VNC side of a gateway.
//!
//! The embedding application points this at its config file; fields absent
//! from the file fall back to serde defaults, and a missing file yields the
//! default configuration so first runs work without any setup.
//!
//! ```toml
//! [gateway]
//! log_level = "info"
//!
//! [vnc]
//! host = "192.168.1.20"
//! port = 5900
//! password = "secret"
//! recv_timeout_ms = 30000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::VncOptions;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────

/// Top-level gateway configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProxyConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub vnc: VncSettings,
}

/// General gateway behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewaySettings {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The VNC server this gateway proxies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VncSettings {
    /// Hostname or IP address of the VNC server.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port of the VNC server.
    #[serde(default = "default_vnc_port")]
    pub port: u16,
    /// Password for VNC authentication; omit when the server uses security
    /// type None.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Shared-session flag passed in ClientInit.
    #[serde(default = "default_true")]
    pub shared: bool,
    /// Receive timeout in milliseconds; omit to block indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recv_timeout_ms: Option<u64>,
}

impl VncSettings {
    /// `host:port` form suitable for `VncConnection::connect`.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection options derived from this configuration.
    pub fn options(&self) -> VncOptions {
        VncOptions {
            password: self.password.clone(),
            shared: self.shared,
            recv_timeout: self.recv_timeout_ms.map(Duration::from_millis),
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_vnc_port() -> u16 {
    5900
}
fn default_true() -> bool {
    true
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for VncSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_vnc_port(),
            password: None,
            shared: default_true(),
            recv_timeout_ms: None,
        }
    }
}

// ── Load / save ───────────────────────────────────────────────────────────

/// Loads a [`ProxyConfig`] from `path`, returning `ProxyConfig::default()`
/// if the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than
/// "not found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: ProxyConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProxyConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ProxyConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
