//! Port-specific error types.
//!
//! These are the raw failures reported by a [`SerialPortAdapter`] or a
//! [`SerialBackend`]. The session layer folds them into the coarser
//! [`TransportError`](crate::error::TransportError) taxonomy that callers see.
//!
//! [`SerialPortAdapter`]: super::SerialPortAdapter
//! [`SerialBackend`]: super::SerialBackend

use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    /// No such port on the host.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The driver rejected a line setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No progress within the port timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// The port timeout elapsed without the operation making progress.
    ///
    /// `serialport` reports this as an I/O error of kind `TimedOut`
    /// (or `WouldBlock` on some platforms).
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock),
            _ => false,
        }
    }
}
