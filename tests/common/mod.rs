//! Shared test utilities: mock hosts with pre-programmed device ports.

#![allow(dead_code)]

use espcommd::port::{MockBackend, MockSerialPort, PortDescriptor, TransportKind};
use espcommd::{DeviceService, Dispatcher};
use serde_json::Value;
use std::sync::Arc;

pub const DEVICE_PORT: &str = "/dev/ttyUSB0";
pub const ESP_VID: u16 = 0x10c4;
pub const ESP_PID: u16 = 0xea60;

/// Builder for a mock host.
pub struct MockHost {
    backend: MockBackend,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            backend: MockBackend::new(),
        }
    }

    /// Attach an ESP at `name` that answers every read with `response`.
    pub fn with_device(self, name: &str, response: &[u8]) -> (Self, MockSerialPort) {
        let port = MockSerialPort::responding(name, response);
        self.backend
            .add_port(PortDescriptor::usb(name, ESP_VID, ESP_PID));
        self.backend.attach(name, port.clone());
        (self, port)
    }

    /// Attach a prepared mock port as an ESP at `name`.
    pub fn with_port(self, name: &str, port: MockSerialPort) -> Self {
        self.backend
            .add_port(PortDescriptor::usb(name, ESP_VID, ESP_PID));
        self.backend.attach(name, port);
        self
    }

    /// Attach some other USB serial adapter.
    pub fn with_foreign_usb(self, name: &str, vid: u16, pid: u16) -> Self {
        self.backend.add_port(PortDescriptor::usb(name, vid, pid));
        self.backend.attach(name, MockSerialPort::new(name));
        self
    }

    /// Attach a non-USB port (on-board UART and the like).
    pub fn with_builtin(self, name: &str) -> Self {
        self.backend
            .add_port(PortDescriptor::other(name, TransportKind::Pci));
        self
    }

    pub fn backend(&self) -> MockBackend {
        self.backend.clone()
    }

    pub fn service(&self) -> DeviceService {
        DeviceService::new(Arc::new(self.backend.clone()))
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.service())
    }
}

/// Send one request line and parse the response line.
pub fn call(dispatcher: &Dispatcher, line: &str) -> Value {
    serde_json::from_str(&dispatcher.handle_line(line)).expect("response is JSON")
}
