//! End-to-end device calls against a mock host: lookup, one exchange, reply.

mod common;

use common::{MockHost, DEVICE_PORT, ESP_PID, ESP_VID};
use espcommd::port::{
    DataBits, FlowControl, MockSerialPort, Parity, PortDescriptor, PortLocator, TransportKind,
    READ_TIMEOUT, WRITE_TIMEOUT,
};
use espcommd::{Action, Reply, Status, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn sensor_read() -> Action {
    Action::get_sensor(DEVICE_PORT, 4, "dht22", "dht22").unwrap()
}

#[test]
fn sensor_read_returns_device_data() {
    let (host, port) =
        MockHost::new().with_device(DEVICE_PORT, br#"{"rc":0,"msg":"ok","data":{"humidity":55}}"#);

    let reply = host.service().perform(&sensor_read());

    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.message.as_deref(), Some("ok"));
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({"result": "ok", "message": "ok", "data": {"humidity": 55}})
    );
    assert_eq!(
        port.written(),
        br#"{"action": "get", "sensor": "dht22", "pin": 4, "model": "dht22"}"#
    );
}

#[test]
fn each_call_opens_configures_and_closes_once() {
    let (host, port) = MockHost::new().with_device(DEVICE_PORT, br#"{"rc":0}"#);
    let backend = host.backend();

    let reply = host.service().perform(&Action::pin_on(DEVICE_PORT, 5));

    assert_eq!(reply, Reply::ok());
    assert_eq!(backend.open_count(), 1);
    assert_eq!(port.close_count(), 1);

    let line = port.line_config().expect("line configuration applied");
    assert_eq!(line.baud_rate, 9600);
    assert_eq!(line.data_bits, DataBits::Eight);
    assert_eq!(line.parity, Parity::None);
    assert_eq!(line.flow_control, FlowControl::None);
    let timeouts = port.timeouts();
    assert!(timeouts[0] <= WRITE_TIMEOUT);
    assert!(timeouts[1..].iter().all(|t| *t <= READ_TIMEOUT));
}

#[test]
fn pin_commands_are_encoded_exactly() {
    let mut port = MockSerialPort::responding(DEVICE_PORT, br#"{"rc":0,"msg":"on"}"#);
    port.enqueue_read(br#"{"rc":1,"msg":"stale"}"#);
    let host = MockHost::new().with_port(DEVICE_PORT, port.clone());
    let service = host.service();

    // Both replies land in the first read window; only the first one counts.
    assert_eq!(
        service.perform(&Action::pin_on(DEVICE_PORT, 5)),
        Reply::ok().with_message("on")
    );
    assert_eq!(port.available_bytes(), 0);

    port.enqueue_read(br#"{"rc":0}"#);
    assert_eq!(service.perform(&Action::pin_off(DEVICE_PORT, -1)), Reply::ok());

    assert_eq!(
        port.get_write_log().concat(),
        [
            br#"{"action": "on", "pin": 5}"#.as_slice(),
            br#"{"action": "off", "pin": -1}"#.as_slice(),
        ]
        .concat()
    );
}

#[test]
fn sensor_reply_trickling_in_is_reassembled() {
    let mut port =
        MockSerialPort::responding(DEVICE_PORT, br#"{"rc":0,"msg":"ok","data":{"humidity":55}}"#);
    port.deliver_reads_in_chunks(8);
    let host = MockHost::new().with_port(DEVICE_PORT, port);

    let reply = host.service().perform(&sensor_read());
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({"result": "ok", "message": "ok", "data": {"humidity": 55}})
    );
}

#[test]
fn device_failure_messages() {
    let (host, _) = MockHost::new().with_device(DEVICE_PORT, br#"{"rc":3,"msg":"no such pin"}"#);
    assert_eq!(
        host.service().perform(&Action::pin_on(DEVICE_PORT, 99)),
        Reply::err("no such pin")
    );

    let (host, _) = MockHost::new().with_device(DEVICE_PORT, br#"{"rc":1,"data":{"t":1}}"#);
    assert_eq!(
        host.service().perform(&sensor_read()),
        Reply::err("Unknown ESP failure.")
    );

    let (host, _) = MockHost::new().with_device(DEVICE_PORT, b"{}");
    assert_eq!(
        host.service().perform(&sensor_read()),
        Reply::err("Failed to parse ESP response JSON.")
    );
}

#[test]
fn unknown_port_is_reported_as_missing() {
    let host = MockHost::new().with_builtin("/dev/ttyS0");
    assert_eq!(
        host.service().perform(&Action::pin_on(DEVICE_PORT, 1)),
        Reply::err("Port does not exist.")
    );
}

#[test]
fn foreign_adapter_is_not_an_esp() {
    let host = MockHost::new().with_foreign_usb("/dev/ttyUSB1", 0x0403, 0x6001);
    let service = host.service();

    assert_eq!(
        service.perform(&Action::pin_on("/dev/ttyUSB1", 1)),
        Reply::err("Port is not connected to an ESP.")
    );
}

#[test]
fn rejected_line_settings_surface_as_write_failure() {
    let mut port = MockSerialPort::responding(DEVICE_PORT, br#"{"rc":0}"#);
    port.reject_config(true);
    let host = MockHost::new().with_port(DEVICE_PORT, port.clone());

    assert_eq!(
        host.service().perform(&Action::pin_on(DEVICE_PORT, 1)),
        Reply::err("Failed to write to port.")
    );
    assert!(port.get_write_log().is_empty());
    assert_eq!(port.close_count(), 1);
}

#[test]
fn stalled_write_fails_without_reading() {
    let mut port = MockSerialPort::responding(DEVICE_PORT, br#"{"rc":0}"#);
    port.stall_writes_after(4);
    let host = MockHost::new().with_port(DEVICE_PORT, port.clone());

    assert_eq!(
        host.service().perform(&Action::pin_on(DEVICE_PORT, 1)),
        Reply::err("Failed to write to port.")
    );
    assert_eq!(port.written(), b"{\"ac");
    assert_eq!(port.available_bytes(), br#"{"rc":0}"#.len());
    assert_eq!(port.close_count(), 1);
}

#[test]
fn silent_device_is_a_read_failure() {
    let host = MockHost::new().with_port(DEVICE_PORT, MockSerialPort::new(DEVICE_PORT));
    assert_eq!(
        host.service().perform(&Action::pin_off(DEVICE_PORT, 2)),
        Reply::err("Failed to read from port.")
    );

    let mut port = MockSerialPort::new(DEVICE_PORT);
    port.set_read_eof(true);
    let host = MockHost::new().with_port(DEVICE_PORT, port);
    assert_eq!(
        host.service().perform(&Action::pin_off(DEVICE_PORT, 2)),
        Reply::err("Failed to read from port.")
    );
}

#[test]
fn listed_port_that_cannot_be_opened() {
    let host = MockHost::new().with_port(DEVICE_PORT, MockSerialPort::new(DEVICE_PORT));
    host.backend().detach(DEVICE_PORT);

    assert_eq!(
        host.service().perform(&Action::pin_on(DEVICE_PORT, 1)),
        Reply::err("Failed to open port.")
    );
}

#[test]
fn enumeration_only_yields_device_ports() {
    let (host, _) = MockHost::new()
        .with_builtin("/dev/ttyS0")
        .with_foreign_usb("/dev/ttyUSB1", 0x0403, 0x6001)
        .with_device(DEVICE_PORT, b"");
    let locator = PortLocator::new(Arc::new(host.backend()));

    let ports = locator.enumerate().unwrap();
    assert_eq!(ports.len(), 1);
    for port in &ports {
        assert_eq!(port.transport, TransportKind::Usb);
        let usb = port.usb.expect("usb identity");
        assert_eq!((usb.vid, usb.pid), (ESP_VID, ESP_PID));
    }

    assert_eq!(
        locator.by_name("/dev/ttyUSB9").unwrap_err(),
        TransportError::PortNotFound
    );
    assert_eq!(
        locator.by_name("/dev/ttyUSB1").unwrap_err(),
        TransportError::PortInvalid
    );
    assert_eq!(
        locator.by_name(DEVICE_PORT).unwrap(),
        PortDescriptor::usb(DEVICE_PORT, ESP_VID, ESP_PID)
    );
}
