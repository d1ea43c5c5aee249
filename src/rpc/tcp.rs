//! TCP transport: newline-delimited requests over any number of connections.
//!
//! Calls run on tokio's blocking pool; the [`Dispatcher`] lock keeps them
//! strictly one at a time.

use super::Dispatcher;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Accept connections until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, dispatcher: Dispatcher, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    info!(addr = ?listener.local_addr().ok(), "listening for RPC connections");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, dispatcher).await {
                            warn!(%peer, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
            _ = &mut shutdown => {
                info!("shutdown requested, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, dispatcher: Dispatcher) -> io::Result<()> {
    debug!(%peer, "client connected");
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let dispatcher = dispatcher.clone();
        let response = tokio::task::spawn_blocking(move || dispatcher.handle_line(&line))
            .await
            .map_err(io::Error::other)?;
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    debug!(%peer, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockBackend, MockSerialPort, PortDescriptor};
    use crate::service::DeviceService;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_tcp_round_trip_and_shutdown() {
        let backend = MockBackend::with_ports(vec![PortDescriptor::usb(
            "/dev/ttyUSB0",
            0x10c4,
            0xea60,
        )]);
        backend.attach(
            "/dev/ttyUSB0",
            MockSerialPort::responding(
                "/dev/ttyUSB0",
                br#"{"rc":0,"msg":"ok","data":{"humidity":55}}"#,
            ),
        );
        let dispatcher = Dispatcher::new(DeviceService::new(Arc::new(backend)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, dispatcher, async move {
            let _ = stop_rx.await;
        }));

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(
                concat!(
                    r#"{"id": 7, "method": "get", "params": {"port": "/dev/ttyUSB0", "pin": 4, "sensor": "dht22", "model": "dht22"}}"#,
                    "\n"
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        let mut lines = BufReader::new(reader).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(
            response,
            json!({"id": 7, "reply": {"result": "ok", "message": "ok", "data": {"humidity": 55}}})
        );

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
