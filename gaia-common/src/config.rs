//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "GAIA_ROOT_FOLDER";

/// Bootstrap configuration read from `config.toml`
///
/// Everything else lives in the database `settings` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

/// Load the platform config file, or defaults if none exists
///
/// A file that exists but does not parse is an error rather than silently
/// ignored.
pub fn load_toml_config() -> Result<TomlConfig> {
    match find_config_file() {
        Some(path) => TomlConfig::from_file(&path),
        None => Ok(TomlConfig::default()),
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Path of the database file inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(crate::db::DATABASE_FILE_NAME)
}

/// Locate the configuration file for the platform
///
/// On Linux the user file (`~/.config/gaia/config.toml`) wins over the
/// system file (`/etc/gaia/config.toml`).
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("gaia").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/gaia/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/gaia (or /var/lib/gaia for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("gaia"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/gaia"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/gaia
        dirs::data_dir()
            .map(|d| d.join("gaia"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/gaia"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\gaia
        dirs::data_local_dir()
            .map(|d| d.join("gaia"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\gaia"))
    } else {
        PathBuf::from("./gaia_data")
    }
}
