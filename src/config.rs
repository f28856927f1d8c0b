//! Application configuration management.
//!
//! Stores the service base URLs and the last used email at
//! `~/.config/eventdeck/config.json`. Environment variables
//! (`EVENTDECK_BACKEND_URL`, `EVENTDECK_AUTH_URL`) override the file, so a
//! `.env` alongside the binary is enough to point at another deployment.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/session/log directory paths
pub const APP_NAME: &str = "eventdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default event backend for a local deployment.
const DEFAULT_BACKEND_URL: &str = "http://localhost:8082";

/// Default auth service.
const DEFAULT_AUTH_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub auth_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Backend base URL; env var beats config file beats default.
    pub fn backend_url(&self) -> String {
        std::env::var("EVENTDECK_BACKEND_URL")
            .ok()
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    /// Auth service base URL; env var beats config file beats default.
    pub fn auth_url(&self) -> String {
        std::env::var("EVENTDECK_AUTH_URL")
            .ok()
            .or_else(|| self.auth_url.clone())
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the durable session keys.
    pub fn session_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join("session"))
    }

    /// Directory for the log file.
    pub fn log_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join("logs"))
    }
}
