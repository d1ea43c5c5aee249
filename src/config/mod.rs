//! TOML configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `ESPCOMMD_CONFIG` environment variable (explicit path)
//! 2. `./espcommd.toml`
//! 3. `espcommd.toml` in the platform config directory
//!    (`~/.config/espcommd` on Linux)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `ESPCOMMD_SERVER_MODE`, `ESPCOMMD_SERVER_HOST`, `ESPCOMMD_SERVER_PORT`
//! - `ESPCOMMD_LOG_LEVEL`, `ESPCOMMD_LOG_FORMAT`
//!
//! Command-line flags are applied by the binary after all of the above.
//!
//! # Example
//!
//! ```toml
//! [server]
//! mode = "tcp"
//! host = "127.0.0.1"
//! port = 7070
//!
//! [logging]
//! level = "espcommd=debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, ServerConfig, ServerMode};
