//! The structured result handed back to RPC callers.
//!
//! Transport failures and device outcomes both end up as a [`Reply`]:
//! `{"result": "ok"|"err", "message": ..., "data": ...}`.

use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome flag of a [`Reply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Err,
}

/// Uniform caller-facing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "result")]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Caller-facing text for each transport failure, in taxonomy order.
const TRANSPORT_MESSAGES: [(TransportError, &str); 6] = [
    (TransportError::PortOpenFailed, "Failed to open port."),
    (TransportError::PortReadFailed, "Failed to read from port."),
    (TransportError::PortWriteFailed, "Failed to write to port."),
    (TransportError::PortNotFound, "Port does not exist."),
    (TransportError::PortInvalid, "Port is not connected to an ESP."),
    (TransportError::Unknown, "Unknown failure."),
];

/// Fixed message for a transport failure.
pub fn transport_message(kind: TransportError) -> &'static str {
    TRANSPORT_MESSAGES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, message)| *message)
        .unwrap_or("Unknown failure.")
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
            data: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            status: Status::Err,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Render a transport failure. Never carries data.
    pub fn from_transport(kind: TransportError) -> Self {
        Self::err(transport_message(kind))
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl From<TransportError> for Reply {
    fn from(kind: TransportError) -> Self {
        Self::from_transport(kind)
    }
}
