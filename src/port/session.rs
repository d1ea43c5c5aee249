//! One open→configure→exchange cycle against a device port.

use super::locator::PortDescriptor;
use super::traits::{
    SerialBackend, SerialPortAdapter, LINE_CONFIG, READ_BUFFER_SIZE, READ_TIMEOUT, WRITE_TIMEOUT,
};
use crate::error::{TransportError, TransportResult};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// An exclusively opened device port.
///
/// The port is closed when the session is dropped, on success and error paths
/// alike.
#[derive(Debug)]
pub struct PortSession {
    port: Box<dyn SerialPortAdapter>,
}

impl PortSession {
    /// Open `descriptor` for exclusive read+write access.
    pub fn open(backend: &dyn SerialBackend, descriptor: &PortDescriptor) -> TransportResult<Self> {
        let port = backend.open(&descriptor.name).map_err(|e| {
            warn!(port = %descriptor.name, error = %e, "failed to open port");
            TransportError::PortOpenFailed
        })?;
        trace!(port = %descriptor.name, "port opened");
        Ok(Self { port })
    }

    /// Apply the fixed 9600-8-N line configuration.
    ///
    /// A rejected setting is reported as [`TransportError::PortWriteFailed`].
    pub fn configure(&mut self) -> TransportResult<()> {
        self.port.apply_line_config(&LINE_CONFIG).map_err(|e| {
            warn!(port = %self.port.name(), error = %e, "line configuration rejected");
            TransportError::PortWriteFailed
        })
    }

    /// Write `payload` in full, then collect the reply.
    ///
    /// The whole write must finish within [`WRITE_TIMEOUT`]. The reply is
    /// gathered over one [`READ_TIMEOUT`] window until the window closes or
    /// [`READ_BUFFER_SIZE`] bytes have arrived. Nothing is retried.
    pub fn exchange(&mut self, payload: &[u8]) -> TransportResult<Vec<u8>> {
        self.write_all(payload)?;

        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let read = self.read_window(&mut buffer)?;
        buffer.truncate(read);

        debug!(port = %self.port.name(), sent = payload.len(), received = read, "exchange complete");
        Ok(buffer)
    }

    fn write_all(&mut self, payload: &[u8]) -> TransportResult<()> {
        let deadline = Instant::now() + WRITE_TIMEOUT;
        let mut written = 0;
        while written < payload.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(port = %self.port.name(), written, total = payload.len(), "write deadline passed");
                return Err(TransportError::PortWriteFailed);
            }
            self.port
                .set_timeout(remaining)
                .map_err(|_| TransportError::PortWriteFailed)?;

            match self.port.write_bytes(&payload[written..]) {
                Ok(0) => return Err(TransportError::PortWriteFailed),
                Ok(n) => written += n,
                Err(e) => {
                    warn!(port = %self.port.name(), written, error = %e, "write to port failed");
                    return Err(TransportError::PortWriteFailed);
                }
            }
        }
        Ok(())
    }

    /// Fill `buffer` until it is full or the read window closes.
    ///
    /// Running out of time after at least one byte is a complete reply;
    /// an empty window is a read failure.
    fn read_window(&mut self, buffer: &mut [u8]) -> TransportResult<usize> {
        let deadline = Instant::now() + READ_TIMEOUT;
        let mut read = 0;
        while read < buffer.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port
                .set_timeout(remaining)
                .map_err(|_| TransportError::PortReadFailed)?;

            match self.port.read_bytes(&mut buffer[read..]) {
                Ok(0) => break,
                Ok(n) => {
                    read += n;
                    trace!(port = %self.port.name(), read, "reply bytes arrived");
                }
                Err(e) if e.is_timeout() => break,
                Err(e) => {
                    warn!(port = %self.port.name(), read, error = %e, "read from port failed");
                    return Err(TransportError::PortReadFailed);
                }
            }
        }

        if read == 0 {
            warn!(port = %self.port.name(), "device sent no response");
            return Err(TransportError::PortReadFailed);
        }
        Ok(read)
    }
}

impl Drop for PortSession {
    fn drop(&mut self) {
        trace!(port = %self.port.name(), "closing port");
    }
}
