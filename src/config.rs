//! Configuration loading for viewerq.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::chat::CommandTemplates;
use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the viewerq home directory (~/.viewerq).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".viewerq"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Get the queue database path, honoring the settings override.
pub fn get_database_path(settings: &Settings) -> Result<PathBuf> {
    match &settings.database.path {
        Some(path) => Ok(path.clone()),
        None => Ok(get_home_dir()?.join("queues.json")),
    }
}

/// Load settings from ~/.viewerq/settings.json
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    let prefix = &settings.chat.command_prefix;
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(Error::Config(
            "chat.command_prefix must be non-empty and contain no whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

/// Database configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Chat configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatConfig {
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
        }
    }
}

/// Web server configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

fn default_web_port() -> u16 {
    3380
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

/// viewerq settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub templates: CommandTemplates,
}
