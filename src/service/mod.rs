//! Service layer between the RPC front end and the device core.
//!
//! ```text
//! stdio ─┐
//!        ├──> Dispatcher ──> DeviceService ──> PortLocator / ActionProtocol
//! tcp   ─┘
//! ```
//!
//! Every call is independent: nothing is cached between invocations apart
//! from the backend handle.

use crate::port::{PortLocator, SerialBackend, SystemBackend};
use crate::protocol::{Action, ActionProtocol};
use crate::reply::Reply;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// One device port in a `devices` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub port: String,
    /// Lowercase hex without prefix, e.g. `10c4`.
    pub vid: String,
    pub pid: String,
}

/// Answer to a `devices` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DevicesReply {
    Listed { devices: Vec<DeviceInfo> },
    Failed(Reply),
}

/// Entry point for all device operations.
#[derive(Debug, Clone)]
pub struct DeviceService {
    locator: PortLocator,
    protocol: ActionProtocol,
}

impl DeviceService {
    pub fn new(backend: Arc<dyn SerialBackend>) -> Self {
        let locator = PortLocator::new(backend);
        Self {
            protocol: ActionProtocol::new(locator.clone()),
            locator,
        }
    }

    /// Service talking to the host's real serial ports.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemBackend))
    }

    /// List every attached device port.
    pub fn devices(&self) -> DevicesReply {
        match self.locator.enumerate() {
            Ok(ports) => {
                let devices: Vec<_> = ports
                    .into_iter()
                    .filter_map(|port| {
                        let usb = port.usb?;
                        Some(DeviceInfo {
                            port: port.name,
                            vid: format!("{:x}", usb.vid),
                            pid: format!("{:x}", usb.pid),
                        })
                    })
                    .collect();
                debug!(count = devices.len(), "devices listed");
                DevicesReply::Listed { devices }
            }
            Err(kind) => DevicesReply::Failed(Reply::from_transport(kind)),
        }
    }

    /// Perform one action against the device.
    pub fn perform(&self, action: &Action) -> Reply {
        let reply = self.protocol.run(action);
        info!(
            port = %action.port_name(),
            action = action.verb(),
            pin = action.pin(),
            ok = reply.is_ok(),
            "action finished"
        );
        reply
    }
}
