use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NappError {
    #[error("NApp not found: {id}")]
    NappNotFound { id: String },

    #[error("NApp is not installed: {id}")]
    NappNotInstalled { id: String },

    #[error("NApp is not enabled: {id}")]
    NappNotEnabled { id: String },

    #[error("NApp already installed: {id}")]
    NappAlreadyInstalled { id: String },

    #[error("Path already exists: {path}")]
    NappAlreadyExists { path: PathBuf },

    #[error("Invalid NApp identifier: '{value}' - expected <owner>/<name>[:<version>]")]
    InvalidNappId { value: String },

    #[error("Invalid name: '{name}' - must start with a letter and contain at least three letters, numbers or underscores")]
    InvalidNappName { name: String },

    #[error("Could not access kytos.json file: {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("Invalid OpenAPI spec in {path}: {message}")]
    OpenApi { path: PathBuf, message: String },

    #[error("Kytos is not running ({url}): {reason}")]
    HostUnavailable { url: String, reason: String },

    #[error("Kytos request failed: {status}: {url}")]
    HostRequest { url: String, status: u16 },

    #[error("Authentication failed: {status}: {reason}")]
    AuthFailed { status: u16, reason: String },

    #[error("NApps server rejected request: {status}: {reason}")]
    RegistryRejected { status: u16, reason: String },

    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NappError>;

impl NappError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NappNotFound { .. } | Self::NappNotInstalled { .. } => 2,
            Self::NappNotEnabled { .. } => 3,
            Self::NappAlreadyInstalled { .. } | Self::NappAlreadyExists { .. } => 4,
            Self::InvalidNappId { .. } | Self::InvalidNappName { .. } => 5,
            Self::ManifestNotFound { .. } => 6,
            Self::HostUnavailable { .. } => 7,
            Self::AuthFailed { .. } => 8,
            Self::RegistryRejected { .. } | Self::Download { .. } => 9,
            _ => 1,
        }
    }
}
