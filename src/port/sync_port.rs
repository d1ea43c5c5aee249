//! Host serial access through the `serialport` crate.
//!
//! [`SystemBackend`] enumerates and opens real ports; [`SyncSerialPort`] wraps
//! one opened `serialport::SerialPort` behind [`SerialPortAdapter`].

use super::error::PortError;
use super::locator::{PortDescriptor, TransportKind, UsbIdentity};
use super::traits::{LineConfiguration, SerialBackend, SerialPortAdapter, LINE_CONFIG, WRITE_TIMEOUT};
use serialport::SerialPortType;
use std::io::{Read, Write};
use std::time::Duration;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port for exclusive read+write access.
    ///
    /// The port comes up at the device baud rate but line settings are only
    /// guaranteed after [`SerialPortAdapter::apply_line_config`].
    ///
    /// # Example
    /// ```no_run
    /// use espcommd::port::SyncSerialPort;
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str) -> Result<Self, PortError> {
        let port = serialport::new(port_name, LINE_CONFIG.baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_line_config(&mut self, config: &LineConfiguration) -> Result<(), PortError> {
        self.port.set_baud_rate(config.baud_rate)?;
        self.port.set_data_bits(config.data_bits)?;
        self.port.set_parity(config.parity)?;
        self.port.set_flow_control(config.flow_control)?;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

/// [`SerialBackend`] backed by the host operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl SerialBackend for SystemBackend {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, PortError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(describe).collect())
    }

    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(SyncSerialPort::open(port_name)?))
    }
}

fn describe(info: serialport::SerialPortInfo) -> PortDescriptor {
    let (transport, usb) = match info.port_type {
        SerialPortType::UsbPort(usb) => (
            TransportKind::Usb,
            Some(UsbIdentity {
                vid: usb.vid,
                pid: usb.pid,
            }),
        ),
        SerialPortType::BluetoothPort => (TransportKind::Bluetooth, None),
        SerialPortType::PciPort => (TransportKind::Pci, None),
        SerialPortType::Unknown => (TransportKind::Unknown, None),
    };

    PortDescriptor {
        name: info.port_name,
        transport,
        usb,
    }
}
