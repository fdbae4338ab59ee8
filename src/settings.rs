use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::paths;
use crate::registry::{CommandTable, TableError};
use crate::remote::tcp::DEFAULT_PORT;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ── Connection settings ─────────────────────────────────────────

/// How commands reach the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Socket protocol of the editor plugin.
    #[default]
    Tcp,
    /// `POST /api/send-command` on a bridge server.
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    /// HTTP transport only. Defaults to `http://{host}:{port}`.
    pub base_url: Option<String>,
    /// Connect/read/write timeout for one command.
    pub timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            transport: Transport::Tcp,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            base_url: None,
            timeout_secs: 10,
        }
    }
}

impl ConnectionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

// ── Pilot settings ──────────────────────────────────────────────

/// Settings stored in `<config dir>/unreal-pilot/settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotSettings {
    pub version: u32,
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// Replaces the built-in command table when set.
    #[serde(default)]
    pub command_table: Option<PathBuf>,
}

const SETTINGS_VERSION: u32 = 1;

impl Default for PilotSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            connection: ConnectionSettings::default(),
            command_table: None,
        }
    }
}

impl PilotSettings {
    /// The configured command table, or the built-in one.
    pub fn command_table(&self) -> Result<CommandTable, TableError> {
        match &self.command_table {
            Some(path) => {
                info!(path = %path.display(), "loading command table");
                CommandTable::load(path)
            }
            None => Ok(CommandTable::builtin()),
        }
    }
}

/// Load settings from the config directory. `Ok(None)` if there is no settings file.
pub fn load_settings(config_dir: &Path) -> Result<Option<PilotSettings>, SettingsError> {
    let path = paths::settings_path(config_dir);
    if !path.exists() {
        debug!(path = %path.display(), "no settings file");
        return Ok(None);
    }
    load_settings_file(&path).map(Some)
}

pub fn load_settings_file(path: &Path) -> Result<PilotSettings, SettingsError> {
    let data = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Save settings to the config directory, replacing the file atomically.
pub fn save_settings(config_dir: &Path, settings: &PilotSettings) -> Result<PathBuf, SettingsError> {
    std::fs::create_dir_all(config_dir).map_err(io_err(config_dir))?;
    let path = paths::settings_path(config_dir);
    save_settings_file(&path, settings)?;
    Ok(path)
}

/// Save settings to an explicit file, replacing it atomically.
pub fn save_settings_file(path: &Path, settings: &PilotSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp_name = OsString::from(path.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json.as_bytes()).map_err(io_err(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(io_err(path))?;
    Ok(())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SettingsError {
    let path = path.to_path_buf();
    move |source| SettingsError::Io { path, source }
}
