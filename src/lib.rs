//! espcommd library
//!
//! Drives an ESP microcontroller attached over a USB-serial bridge
//! (VID `0x10c4`, PID `0xea60`): each call locates the port, opens it for a
//! single bounded JSON exchange and translates the outcome into a structured
//! reply.
//!
//! # Modules
//!
//! - `port`: port discovery, validation and the per-call session
//! - `protocol`: command encoding, reply decoding and translation
//! - `reply`: the caller-facing structured result
//! - `error`: transport failure taxonomy
//! - `service`: device operations used by the front ends
//! - `rpc`: line-delimited JSON front end (stdio and tcp)
//! - `config`: TOML configuration with environment overrides
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod protocol;
pub mod reply;
pub mod rpc;
pub mod service;

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{TransportError, TransportResult};
pub use port::{
    MockBackend, MockSerialPort, PortDescriptor, PortError, PortLocator, PortSession,
    SerialBackend, SerialPortAdapter, SystemBackend,
};
pub use protocol::{Action, ActionProtocol, DeviceResponse};
pub use reply::{Reply, Status};
pub use rpc::Dispatcher;
pub use service::DeviceService;
