//! Device command protocol.
//!
//! An [`Action`] is encoded into a one-line JSON command, exchanged over a
//! fresh [`PortSession`], and the reply envelope is decoded and translated
//! into a [`Reply`].

pub mod action;
pub mod envelope;

pub use action::{Action, ActionError, SensorQuery};
pub use envelope::{decode, DecodeError, DeviceResponse};

use crate::error::TransportResult;
use crate::port::{PortLocator, PortSession};
use crate::reply::{Reply, Status};
use tracing::{debug, warn};

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse ESP response JSON.";
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Unknown ESP failure.";

/// Drives actions against the device.
#[derive(Debug, Clone)]
pub struct ActionProtocol {
    locator: PortLocator,
}

impl ActionProtocol {
    pub fn new(locator: PortLocator) -> Self {
        Self { locator }
    }

    /// Resolve, open, configure and exchange. Returns the raw reply bytes.
    ///
    /// Transport failures are returned untranslated.
    pub fn execute(&self, action: &Action) -> TransportResult<Vec<u8>> {
        let descriptor = self.locator.by_name(action.port_name())?;
        let mut session = PortSession::open(self.locator.backend().as_ref(), &descriptor)?;
        session.configure()?;

        let command = action.encode();
        debug!(port = %descriptor.name, command = %command, "sending command");
        session.exchange(command.as_bytes())
    }

    /// Execute `action` and turn whatever happened into a [`Reply`].
    pub fn run(&self, action: &Action) -> Reply {
        match self.execute(action) {
            Ok(raw) => translate(action, decode(&raw)),
            Err(kind) => {
                warn!(port = %action.port_name(), action = action.verb(), error = %kind, "transport failure");
                Reply::from_transport(kind)
            }
        }
    }
}

/// Render a decoded device reply for the caller.
///
/// `data` is only passed through for sensor reads, and never on a failure
/// that came without a message.
pub fn translate(action: &Action, decoded: Result<DeviceResponse, DecodeError>) -> Reply {
    let response = match decoded {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "undecodable device response");
            return Reply::err(PARSE_FAILURE_MESSAGE);
        }
    };

    if !response.success && response.message.is_none() {
        return Reply::err(UNKNOWN_FAILURE_MESSAGE);
    }

    let mut reply = Reply {
        status: if response.success { Status::Ok } else { Status::Err },
        message: response.message,
        data: None,
    };

    if let (Action::GetSensor(_), Some(data)) = (action, response.data) {
        reply = reply.with_data(data);
    }
    reply
}
