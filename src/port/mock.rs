//! In-memory serial host for testing.
//!
//! [`MockBackend`] stands in for the host: it reports a scripted port list and
//! hands out [`MockSerialPort`]s for the ports that have a device attached.
//! Ports are cheap clones over shared state, so a test can keep one copy and
//! inspect what the code under test did with the other.

use super::error::PortError;
use super::locator::PortDescriptor;
use super::traits::{LineConfiguration, SerialBackend, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Inner state of the mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Total bytes the port accepts before writes start timing out.
    write_capacity: Option<usize>,
    written_total: usize,
    /// Whether the next operation should time out.
    should_timeout: bool,
    /// Reads report end-of-stream instead of data.
    read_eof: bool,
    /// Most bytes handed out by one read.
    read_chunk: Option<usize>,
    /// Reads with nothing queued wait out the port timeout first.
    block_on_silence: bool,
    /// Most bytes accepted by one write.
    write_chunk: Option<usize>,
    /// Time each write call takes, capped by the port timeout.
    write_latency: Option<Duration>,
    reject_config: bool,
    line_config: Option<LineConfiguration>,
    timeouts: Vec<Duration>,
    closes: usize,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use espcommd::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(br#"{"rc":0}"#);
///
/// port.write_bytes(b"{\"action\": \"on\", \"pin\": 5}").unwrap();
///
/// let mut buffer = [0u8; 64];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], br#"{"rc":0}"#);
/// assert_eq!(port.get_write_log().len(), 1);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Create a mock port that answers the next read with `response`.
    pub fn responding(name: impl Into<String>, response: &[u8]) -> Self {
        let mut port = Self::new(name);
        port.enqueue_read(response);
        port
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Set whether the next read/write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state.lock().should_timeout = should_timeout;
    }

    /// Accept only `bytes` in total; later writes time out.
    pub fn stall_writes_after(&mut self, bytes: usize) {
        self.state.lock().write_capacity = Some(bytes);
    }

    /// Make reads return zero bytes.
    pub fn set_read_eof(&mut self, eof: bool) {
        self.state.lock().read_eof = eof;
    }

    /// Hand out at most `bytes` per read, like a slow line does.
    pub fn deliver_reads_in_chunks(&mut self, bytes: usize) {
        self.state.lock().read_chunk = Some(bytes);
    }

    /// Make reads on an empty queue block for the port timeout before
    /// timing out, instead of failing at once.
    pub fn block_on_silence(&mut self, block: bool) {
        self.state.lock().block_on_silence = block;
    }

    /// Accept at most `bytes` per write.
    pub fn accept_writes_in_chunks(&mut self, bytes: usize) {
        self.state.lock().write_chunk = Some(bytes);
    }

    /// Make every write take `latency`. A write whose latency exceeds the
    /// port timeout blocks for the timeout and then fails.
    pub fn set_write_latency(&mut self, latency: Duration) {
        self.state.lock().write_latency = Some(latency);
    }

    /// Make the driver refuse line settings.
    pub fn reject_config(&mut self, reject: bool) {
        self.state.lock().reject_config = reject;
    }

    /// The line settings last applied, if any.
    pub fn line_config(&self) -> Option<LineConfiguration> {
        self.state.lock().line_config
    }

    /// Every timeout set on the port, in order.
    pub fn timeouts(&self) -> Vec<Duration> {
        self.state.lock().timeouts.clone()
    }

    /// How many opened handles to this port have been closed.
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    fn current_timeout(state: &MockPortState) -> Duration {
        state.timeouts.last().copied().unwrap_or_default()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_line_config(&mut self, config: &LineConfiguration) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.reject_config {
            return Err(PortError::config("settings rejected by driver"));
        }
        state.line_config = Some(*config);
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeouts.push(timeout);
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(Self::current_timeout(&state)));
        }

        if let Some(latency) = state.write_latency {
            let timeout = Self::current_timeout(&state);
            drop(state);
            thread::sleep(latency.min(timeout));
            if latency > timeout {
                return Err(PortError::timeout(timeout));
            }
            state = self.state.lock();
        }

        let mut accepted = match state.write_capacity {
            Some(capacity) => data.len().min(capacity.saturating_sub(state.written_total)),
            None => data.len(),
        };
        if let Some(chunk) = state.write_chunk {
            accepted = accepted.min(chunk);
        }
        if accepted == 0 && !data.is_empty() {
            return Err(PortError::timeout(Self::current_timeout(&state)));
        }

        state.write_log.push(data[..accepted].to_vec());
        state.written_total += accepted;
        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(Self::current_timeout(&state)));
        }
        if state.read_eof {
            return Ok(0);
        }

        let limit = state.read_chunk.unwrap_or(buffer.len()).min(buffer.len());
        let mut bytes_read = 0;
        for byte in buffer[..limit].iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Nothing arrived before the timeout.
            if state.block_on_silence {
                let timeout = Self::current_timeout(&state);
                drop(state);
                thread::sleep(timeout);
            }
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Operation timed out",
            )))
        } else {
            Ok(bytes_read)
        }
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// An opened mock port; counts a close when dropped.
#[derive(Debug)]
struct MockHandle(MockSerialPort);

impl SerialPortAdapter for MockHandle {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn apply_line_config(&mut self, config: &LineConfiguration) -> Result<(), PortError> {
        self.0.apply_line_config(config)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.0.set_timeout(timeout)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.0.write_bytes(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.0.read_bytes(buffer)
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.0.state.lock().closes += 1;
    }
}

#[derive(Debug, Default)]
struct MockHost {
    ports: Vec<PortDescriptor>,
    devices: HashMap<String, MockSerialPort>,
    fail_enumeration: bool,
    opens: usize,
}

/// Scripted [`SerialBackend`].
///
/// Ports listed with [`add_port`](Self::add_port) are visible to enumeration;
/// only those with a device [`attach`](Self::attach)ed can be opened.
#[derive(Debug, Default, Clone)]
pub struct MockBackend {
    host: Arc<Mutex<MockHost>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ports(ports: Vec<PortDescriptor>) -> Self {
        let backend = Self::new();
        backend.host.lock().ports = ports;
        backend
    }

    pub fn add_port(&self, port: PortDescriptor) {
        self.host.lock().ports.push(port);
    }

    /// Make `port` openable under `port_name`.
    pub fn attach(&self, port_name: impl Into<String>, port: MockSerialPort) {
        self.host.lock().devices.insert(port_name.into(), port);
    }

    /// Unplug the device so opening fails.
    pub fn detach(&self, port_name: &str) {
        self.host.lock().devices.remove(port_name);
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.host.lock().fail_enumeration = fail;
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        self.host.lock().opens
    }
}

impl SerialBackend for MockBackend {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, PortError> {
        let host = self.host.lock();
        if host.fail_enumeration {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "enumeration denied",
            )));
        }
        Ok(host.ports.clone())
    }

    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut host = self.host.lock();
        let port = host
            .devices
            .get(port_name)
            .cloned()
            .ok_or_else(|| PortError::not_found(port_name))?;
        host.opens += 1;
        Ok(Box::new(MockHandle(port)))
    }
}
