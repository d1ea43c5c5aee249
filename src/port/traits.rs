//! Core traits and fixed parameters for serial port access.
//!
//! `SerialBackend` is the seam to the host: it enumerates ports and opens
//! them. `SerialPortAdapter` is one opened port. Both are implemented over the
//! `serialport` crate in [`sync_port`](super::sync_port) and in memory in
//! [`mock`](super::mock).

use super::error::PortError;
use super::locator::PortDescriptor;
use std::time::Duration;

pub use serialport::{DataBits, FlowControl, Parity};

/// Line parameters applied to every device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfiguration {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

/// The device always talks 9600-8-N with no flow control.
pub const LINE_CONFIG: LineConfiguration = LineConfiguration {
    baud_rate: 9600,
    data_bits: DataBits::Eight,
    parity: Parity::None,
    flow_control: FlowControl::None,
};

/// Upper bound for pushing a whole command to the port.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Length of the response read window.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1500);

/// Capacity of the response buffer. Replies longer than this are truncated.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Trait for one opened serial port.
///
/// Dropping the adapter closes the underlying OS handle.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Apply baud rate, data bits, parity and flow control.
    fn apply_line_config(&mut self, config: &LineConfiguration) -> Result<(), PortError>;

    /// Set the timeout used by the next reads and writes.
    ///
    /// A read or write that sees no progress within it fails with a timeout
    /// (see [`PortError::is_timeout`]).
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written, which may be short.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns as soon as some bytes are available, so a single call may
    /// deliver only part of a reply.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;
}

/// Host access: port enumeration and opening.
pub trait SerialBackend: Send + Sync + std::fmt::Debug {
    /// List every serial port the host knows about, in OS order.
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, PortError>;

    /// Open the named port for exclusive read+write access.
    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
