//! Port abstraction layer for serial communication.
//!
//! Locating the device port, opening it, and running one bounded exchange,
//! behind traits that allow the host to be replaced by mocks.

pub mod error;
pub mod locator;
pub mod mock;
pub mod session;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use locator::{
    PortDescriptor, PortList, PortLocator, TransportKind, UsbIdentity, DEVICE_IDENTITY,
};
pub use mock::{MockBackend, MockSerialPort};
pub use session::PortSession;
pub use sync_port::{SyncSerialPort, SystemBackend};
pub use traits::*;
