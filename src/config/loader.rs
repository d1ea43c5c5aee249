//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "ESPCOMMD";

const CONFIG_FILE_NAME: &str = "espcommd.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "ESPCOMMD_CONFIG";

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using the standard resolution order.
    ///
    /// 1. `ESPCOMMD_CONFIG` (explicit path, must exist)
    /// 2. `./espcommd.toml`
    /// 3. `espcommd.toml` in the platform config directory
    /// 4. Built-in defaults
    ///
    /// `ESPCOMMD_*` variables are applied on top of whichever source won.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path()?;

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Defaults plus environment overrides. If any override is malformed
    /// the overrides are dropped with a warning and plain defaults are used.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if let Err(e) = apply_env_overrides(&mut config) {
            warn!(error = %e, "ignoring malformed environment overrides");
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using the standard locations.
///
/// Returns `Ok(None)` when no file exists and defaults should be used.
pub fn resolve_config_path() -> ConfigResult<Option<PathBuf>> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::NotFound(path))
        };
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Ok(Some(cwd_config));
    }

    Ok(get_default_config_path().filter(|path| path.exists()))
}

/// Platform config directory for espcommd, e.g. `~/.config/espcommd`.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "espcommd").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{ENV_PREFIX}_{key}");
    std::env::var(&name).ok().map(|val| (name, val))
}

/// Apply `ESPCOMMD_<SECTION>_<KEY>` overrides.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((var, val)) = env_var("SERVER_MODE") {
        config.server.mode = val.parse().map_err(|e: String| ConfigError::env_parse(var, e))?;
    }
    if let Some((_, val)) = env_var("SERVER_HOST") {
        config.server.host = val;
    }
    if let Some((var, val)) = env_var("SERVER_PORT") {
        config.server.port = val
            .parse()
            .map_err(|_| ConfigError::env_parse(var, "Invalid port number"))?;
    }

    if let Some((_, val)) = env_var("LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_var("LOG_FORMAT") {
        config.logging.format = val.parse().map_err(|e: String| ConfigError::env_parse(var, e))?;
    }

    Ok(())
}
