use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NappError, Result};

const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_KYTOS_API: &str = "http://localhost:8181/";
pub const DEFAULT_NAPPS_API: &str = "https://napps.kytos.io/";
pub const DEFAULT_NAPPS_REPO: &str = "https://napps.kytos.io/repo/";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# napp configuration file
# Location: ~/.napp/config.toml

[kytos]
# Kytos controller REST API, used for root discovery and enable/disable/reload
api = "http://localhost:8181/"

[napps]
# NApps Server API and package repository
api = "https://napps.kytos.io/"
repo = "https://napps.kytos.io/repo/"

# When both paths are set, the controller is not asked for them
# installed_path = "/var/lib/kytos/napps/.installed"
# enabled_path = "/var/lib/kytos/napps"

# Credentials for upload/delete. The token is stored after a successful login.
# user = "alice"
# token = ""
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub kytos: KytosConfig,

    #[serde(default)]
    pub napps: NappsConfig,
}

/// Controller connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KytosConfig {
    #[serde(default = "default_kytos_api")]
    pub api: String,
}

/// NApps Server connection, local roots and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NappsConfig {
    #[serde(default = "default_napps_api")]
    pub api: String,

    #[serde(default = "default_napps_repo")]
    pub repo: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_kytos_api() -> String {
    DEFAULT_KYTOS_API.to_string()
}

fn default_napps_api() -> String {
    DEFAULT_NAPPS_API.to_string()
}

fn default_napps_repo() -> String {
    DEFAULT_NAPPS_REPO.to_string()
}

impl Default for KytosConfig {
    fn default() -> Self {
        Self {
            api: default_kytos_api(),
        }
    }
}

impl Default for NappsConfig {
    fn default() -> Self {
        Self {
            api: default_napps_api(),
            repo: default_napps_repo(),
            installed_path: None,
            enabled_path: None,
            user: None,
            token: None,
        }
    }
}

const KEYS: &[&str] = &[
    "kytos.api",
    "napps.api",
    "napps.repo",
    "napps.installed_path",
    "napps.enabled_path",
    "napps.user",
    "napps.token",
];

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| NappError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| NappError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Both roots, when both are configured
    pub fn roots(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.napps.installed_path, &self.napps.enabled_path) {
            (Some(installed), Some(enabled)) => Some((installed.clone(), enabled.clone())),
            _ => None,
        }
    }

    /// Get a config value by dot-notation key. Unset optional keys yield `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "kytos.api" => Some(self.kytos.api.clone()),
            "napps.api" => Some(self.napps.api.clone()),
            "napps.repo" => Some(self.napps.repo.clone()),
            "napps.installed_path" => self
                .napps
                .installed_path
                .as_ref()
                .map(|p| p.display().to_string()),
            "napps.enabled_path" => self
                .napps
                .enabled_path
                .as_ref()
                .map(|p| p.display().to_string()),
            "napps.user" => self.napps.user.clone(),
            "napps.token" => self.napps.token.clone(),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key. An empty value clears an
    /// optional key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());

        match key {
            "kytos.api" => self.kytos.api = value.to_string(),
            "napps.api" => self.napps.api = value.to_string(),
            "napps.repo" => self.napps.repo = value.to_string(),
            "napps.installed_path" => self.napps.installed_path = optional().map(PathBuf::from),
            "napps.enabled_path" => self.napps.enabled_path = optional().map(PathBuf::from),
            "napps.user" => self.napps.user = optional(),
            "napps.token" => self.napps.token = optional(),
            _ => {
                return Err(NappError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        KEYS.iter()
            .map(|key| (key.to_string(), self.get(key).unwrap_or_default()))
            .collect()
    }
}
