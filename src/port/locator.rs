//! Finding the device among the host's serial ports.
//!
//! Only USB ports whose vendor and product ids both match [`DEVICE_IDENTITY`]
//! are eligible targets.

use super::traits::SerialBackend;
use crate::error::{TransportError, TransportResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// USB vendor/product id pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbIdentity {
    pub vid: u16,
    pub pid: u16,
}

/// Silicon Labs CP210x bridge found on the ESP boards this daemon drives.
pub const DEVICE_IDENTITY: UsbIdentity = UsbIdentity {
    vid: 0x10c4,
    pid: 0xea60,
};

/// How a port is attached to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Usb,
    Bluetooth,
    Pci,
    Unknown,
}

/// One serial port as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    pub name: String,
    pub transport: TransportKind,
    /// `None` on a USB port means its descriptor could not be read.
    pub usb: Option<UsbIdentity>,
}

impl PortDescriptor {
    pub fn usb(name: impl Into<String>, vid: u16, pid: u16) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Usb,
            usb: Some(UsbIdentity { vid, pid }),
        }
    }

    pub fn other(name: impl Into<String>, transport: TransportKind) -> Self {
        Self {
            name: name.into(),
            transport,
            usb: None,
        }
    }
}

/// Result of checking one port against the identity filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eligibility {
    Device,
    NotDevice,
    DescriptorUnavailable,
}

fn check_port(port: &PortDescriptor) -> Eligibility {
    if port.transport != TransportKind::Usb {
        return Eligibility::NotDevice;
    }
    match port.usb {
        None => Eligibility::DescriptorUnavailable,
        Some(identity) if identity == DEVICE_IDENTITY => Eligibility::Device,
        Some(_) => Eligibility::NotDevice,
    }
}

/// Owned list of matching ports, in host enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortList {
    ports: Vec<PortDescriptor>,
}

impl PortList {
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PortDescriptor> {
        self.ports.iter()
    }
}

impl IntoIterator for PortList {
    type Item = PortDescriptor;
    type IntoIter = std::vec::IntoIter<PortDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.into_iter()
    }
}

impl<'a> IntoIterator for &'a PortList {
    type Item = &'a PortDescriptor;
    type IntoIter = std::slice::Iter<'a, PortDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter()
    }
}

/// Resolves device ports through a [`SerialBackend`].
#[derive(Debug, Clone)]
pub struct PortLocator {
    backend: Arc<dyn SerialBackend>,
}

impl PortLocator {
    pub fn new(backend: Arc<dyn SerialBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn SerialBackend> {
        &self.backend
    }

    /// List every port that carries the device identity.
    ///
    /// No match is an empty list, not an error. Failing host enumeration or an
    /// unreadable USB descriptor yields [`TransportError::Unknown`] and no
    /// partial list.
    pub fn enumerate(&self) -> TransportResult<PortList> {
        let all = self.backend.list_ports().map_err(|e| {
            warn!(error = %e, "host port enumeration failed");
            TransportError::Unknown
        })?;

        let mut ports = Vec::new();
        for port in all {
            match check_port(&port) {
                Eligibility::Device => ports.push(port),
                Eligibility::NotDevice => continue,
                Eligibility::DescriptorUnavailable => {
                    warn!(port = %port.name, "USB descriptor query failed");
                    return Err(TransportError::Unknown);
                }
            }
        }

        debug!(count = ports.len(), "enumerated device ports");
        Ok(PortList { ports })
    }

    /// Look up one port by name and check it against the device identity.
    pub fn by_name(&self, port_name: &str) -> TransportResult<PortDescriptor> {
        // Any lookup failure is reported as not found.
        let port = self
            .backend
            .list_ports()
            .ok()
            .and_then(|ports| ports.into_iter().find(|p| p.name == port_name))
            .ok_or(TransportError::PortNotFound)?;

        match check_port(&port) {
            Eligibility::Device => Ok(port),
            Eligibility::NotDevice | Eligibility::DescriptorUnavailable => {
                debug!(port = %port_name, transport = ?port.transport, "port rejected by identity filter");
                Err(TransportError::PortInvalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockBackend;
    use pretty_assertions::assert_eq;

    fn locator(ports: Vec<PortDescriptor>) -> PortLocator {
        PortLocator::new(Arc::new(MockBackend::with_ports(ports)))
    }

    #[test]
    fn test_enumerate_filters_and_keeps_order() {
        let locator = locator(vec![
            PortDescriptor::usb("/dev/ttyUSB1", 0x10c4, 0xea60),
            PortDescriptor::other("/dev/ttyS0", TransportKind::Pci),
            PortDescriptor::usb("/dev/ttyACM0", 0x2e8a, 0x000a),
            PortDescriptor::usb("/dev/ttyUSB0", 0x10c4, 0xea60),
            PortDescriptor::usb("/dev/ttyUSB2", 0x10c4, 0x0001),
        ]);

        let names: Vec<_> = locator
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["/dev/ttyUSB1", "/dev/ttyUSB0"]);
    }

    #[test]
    fn test_enumerate_only_returns_matching_identity() {
        let locator = locator(vec![
            PortDescriptor::usb("a", 0x10c4, 0xea60),
            PortDescriptor::usb("b", 0x0403, 0xea60),
            PortDescriptor::usb("c", 0x10c4, 0xea61),
        ]);

        let list = locator.enumerate().unwrap();
        assert!(list.iter().all(|p| p.usb == Some(DEVICE_IDENTITY)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_enumerate_empty_is_not_an_error() {
        let locator = locator(vec![PortDescriptor::other(
            "/dev/ttyS0",
            TransportKind::Unknown,
        )]);
        let list = locator.enumerate().unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_enumerate_descriptor_failure_is_unknown() {
        let mut broken = PortDescriptor::usb("/dev/ttyUSB9", 0, 0);
        broken.usb = None;
        let locator = locator(vec![
            PortDescriptor::usb("/dev/ttyUSB0", 0x10c4, 0xea60),
            broken,
        ]);

        assert_eq!(locator.enumerate(), Err(TransportError::Unknown));
    }

    #[test]
    fn test_enumerate_host_failure_is_unknown() {
        let backend = MockBackend::new();
        backend.fail_enumeration(true);
        let locator = PortLocator::new(Arc::new(backend));

        assert_eq!(locator.enumerate(), Err(TransportError::Unknown));
    }

    #[test]
    fn test_by_name_missing_is_not_found() {
        let locator = locator(vec![PortDescriptor::usb("/dev/ttyUSB0", 0x10c4, 0xea60)]);
        assert_eq!(
            locator.by_name("/dev/ttyUSB7"),
            Err(TransportError::PortNotFound)
        );
    }

    #[test]
    fn test_by_name_lookup_failure_is_not_found() {
        let backend = MockBackend::with_ports(vec![PortDescriptor::usb(
            "/dev/ttyUSB0",
            0x10c4,
            0xea60,
        )]);
        backend.fail_enumeration(true);
        let locator = PortLocator::new(Arc::new(backend));

        assert_eq!(
            locator.by_name("/dev/ttyUSB0"),
            Err(TransportError::PortNotFound)
        );
    }

    #[test]
    fn test_by_name_mismatch_is_invalid() {
        let mut unreadable = PortDescriptor::usb("/dev/ttyUSB3", 0, 0);
        unreadable.usb = None;
        let locator = locator(vec![
            PortDescriptor::usb("/dev/ttyACM0", 0x2e8a, 0x000a),
            PortDescriptor::other("/dev/rfcomm0", TransportKind::Bluetooth),
            unreadable,
        ]);

        for name in ["/dev/ttyACM0", "/dev/rfcomm0", "/dev/ttyUSB3"] {
            assert_eq!(locator.by_name(name), Err(TransportError::PortInvalid));
        }
    }

    #[test]
    fn test_by_name_match() {
        let locator = locator(vec![PortDescriptor::usb("/dev/ttyUSB0", 0x10c4, 0xea60)]);
        let port = locator.by_name("/dev/ttyUSB0").unwrap();
        assert_eq!(port.name, "/dev/ttyUSB0");
        assert_eq!(port.usb, Some(DEVICE_IDENTITY));
    }
}
