use clap::Parser;
use espcommd::config::{ConfigLoader, ServerMode};
use espcommd::rpc::{stdio, tcp};
use espcommd::{logging, DeviceService, Dispatcher};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive an ESP microcontroller over USB-serial through line-delimited JSON calls.",
    long_about = "Serves the devices/on/off/get methods either on stdin/stdout or on a TCP listener. \
                  Every call opens the device port, performs one bounded exchange and closes it again."
)]
struct Args {
    /// Configuration file (overrides ESPCOMMD_CONFIG and the default locations).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Front end to serve: stdio or tcp.
    #[arg(short, long)]
    mode: Option<ServerMode>,

    /// Listen address for tcp mode, e.g. 127.0.0.1:7070.
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Log filter, e.g. info or espcommd=debug. RUST_LOG still wins.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config_path = loader.config_path.clone();
    let mut config = loader.into_config();

    if let Some(mode) = args.mode {
        config.server.mode = mode;
    }
    if let Some(addr) = args.listen {
        config.server.set_listen_addr(addr);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    logging::init(&config.logging)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        mode = %config.server.mode,
        object = %config.server.object_name,
        "espcommd starting"
    );

    let dispatcher =
        Dispatcher::with_object_name(DeviceService::system(), config.server.object_name.clone());

    match config.server.mode {
        ServerMode::Stdio => {
            tokio::task::spawn_blocking(move || stdio::run(&dispatcher)).await??;
        }
        ServerMode::Tcp => {
            let addr = config.server.listen_addr()?;
            let listener = TcpListener::bind(addr).await?;
            tcp::serve(listener, dispatcher, shutdown_signal()).await?;
        }
    }

    info!("espcommd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, shutting down");
}
