//! Configuration schema definitions.
//!
//! Line parameters and the device identity are fixed by the firmware and are
//! intentionally not configurable.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values that serde alone cannot reject.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.listen_addr()?;
        if self.server.object_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.object_name",
                "must not be empty",
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::validation("logging.level", "must not be empty"));
        }
        Ok(())
    }
}

/// Server configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Front end to serve: "stdio" or "tcp"
    pub mode: ServerMode,
    /// Bind address for tcp mode
    pub host: String,
    /// Bind port for tcp mode
    pub port: u16,
    /// Namespace accepted in qualified method names, e.g. `espcommd.get`
    pub object_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: ServerMode::Stdio,
            host: "127.0.0.1".to_string(),
            port: 7070,
            object_name: "espcommd".to_string(),
        }
    }
}

impl ServerConfig {
    /// Socket address for tcp mode.
    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::validation("server.host", format!("'{}' is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn set_listen_addr(&mut self, addr: SocketAddr) {
        self.host = addr.ip().to_string();
        self.port = addr.port();
    }
}

/// Front end served by the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    /// Requests on stdin, responses on stdout
    #[default]
    Stdio,
    /// Line-delimited requests over TCP
    Tcp,
}

impl FromStr for ServerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "tcp" => Ok(Self::Tcp),
            other => Err(format!("unknown server mode '{other}' (expected stdio or tcp)")),
        }
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdio => "stdio",
            Self::Tcp => "tcp",
        })
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "espcommd=debug". `RUST_LOG` wins.
    pub level: String,
    /// Log format: "pretty", "compact", "json"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}
