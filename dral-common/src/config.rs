//! Configuration loading and settings resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed TOML file never stops the tools; the defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the database location
pub const DATABASE_ENV_VAR: &str = "DRAL_DATABASE";

/// Environment variable overriding the reference text code
pub const REFERENCE_TEXT_ENV_VAR: &str = "DRAL_REFERENCE_TEXT";

/// Code of the reference (original language) text when nothing else is configured
pub const DEFAULT_REFERENCE_TEXT: &str = "EN";

/// Log level when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`
///
/// All keys are optional:
///
/// ```toml
/// database = "/srv/dral/dral.db"
/// reference_text = "EN"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub database: Option<PathBuf>,
    pub reference_text: Option<String>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the platform config file, falling back to an empty config
    pub fn load_or_default() -> Self {
        let Some(path) = locate_config_file() else {
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                Self::default()
            }
        }
    }
}

/// Resolved settings for one run of the tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Code of the reference text (the language lemmas are written in)
    pub reference_text: String,
    /// Default tracing filter directive
    pub log_level: String,
}

impl Settings {
    /// Resolve settings from CLI arguments, environment and the platform config file
    pub fn resolve(cli_database: Option<&Path>, cli_reference_text: Option<&str>) -> Self {
        Self::resolve_with(cli_database, cli_reference_text, &TomlConfig::load_or_default())
    }

    /// Resolve settings against an already loaded TOML config
    pub fn resolve_with(
        cli_database: Option<&Path>,
        cli_reference_text: Option<&str>,
        toml: &TomlConfig,
    ) -> Self {
        let database_path = cli_database
            .map(Path::to_path_buf)
            .or_else(|| env_value(DATABASE_ENV_VAR).map(PathBuf::from))
            .or_else(|| toml.database.clone())
            .unwrap_or_else(default_database_path);

        let reference_text = cli_reference_text
            .map(str::to_string)
            .or_else(|| env_value(REFERENCE_TEXT_ENV_VAR))
            .or_else(|| toml.reference_text.clone())
            .unwrap_or_else(|| DEFAULT_REFERENCE_TEXT.to_string())
            .trim()
            .to_uppercase();

        let log_level = toml
            .log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self {
            database_path,
            reference_text,
            log_level,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Find the config file for the platform, if one exists
fn locate_config_file() -> Option<PathBuf> {
    // ~/.config/dral/config.toml first, then /etc/dral/config.toml
    let user_config = dirs::config_dir().map(|d| d.join("dral").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/dral/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dral"))
        .unwrap_or_else(|| PathBuf::from("./dral_data"))
        .join("dral.db")
}
