//! NApp type definitions
//!
//! Identifiers, manifests (`kytos.json`) and install provenance.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NappError, Result};

/// Manifest file that marks a directory as a NApp
pub const MANIFEST_FILE: &str = "kytos.json";

/// Version used when none is requested
pub const DEFAULT_VERSION: &str = "latest";

/// NApp identifier: `(owner, name)`, ordered by owner then name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NappId {
    pub owner: String,
    pub name: String,
}

impl NappId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Relative path `<owner>/<name>` under a NApps root
    pub fn rel_path(&self) -> PathBuf {
        Path::new(&self.owner).join(&self.name)
    }
}

impl fmt::Display for NappId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for NappId {
    type Err = NappError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NappError::InvalidNappId {
            value: s.to_string(),
        };

        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }
}

/// A NApp identifier paired with the requested version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NappRef {
    pub id: NappId,
    pub version: String,
}

impl NappRef {
    pub fn new(id: NappId, version: Option<&str>) -> Self {
        Self {
            id,
            version: version.unwrap_or(DEFAULT_VERSION).to_string(),
        }
    }

    /// Archive file name on the registry: `<name>-<version>.napp`
    pub fn package_file_name(&self) -> String {
        format!("{}-{}.napp", self.id.name, self.version)
    }
}

impl fmt::Display for NappRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.version)
    }
}

/// Parses `<owner>/<name>[:<version>]`
impl FromStr for NappRef {
    type Err = NappError;

    fn from_str(s: &str) -> Result<Self> {
        let (id, version) = match s.split_once(':') {
            Some((id, version)) if !version.trim().is_empty() => (id, Some(version.trim())),
            Some(_) => {
                return Err(NappError::InvalidNappId {
                    value: s.to_string(),
                })
            }
            None => (s, None),
        };

        Ok(Self::new(id.parse()?, version))
    }
}

/// NApp manifest (`kytos.json`), also the shape of registry listing entries.
///
/// Every field defaults, so partial manifests still load. Unknown keys are
/// kept in `extra` and written back on upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NappManifest {
    /// Registry username of the owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Deprecated spelling of `username`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// `"owner/name"` strings
    #[serde(default)]
    pub napp_dependencies: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NappManifest {
    /// Owner of the NApp; `username` takes precedence over `author`
    pub fn owner(&self) -> Option<&str> {
        self.username.as_deref().or(self.author.as_deref())
    }

    /// Identifier declared by the manifest, if it names an owner
    pub fn id(&self) -> Option<NappId> {
        self.owner().map(|owner| NappId::new(owner, &self.name))
    }

    /// Whether the manifest declares the given identifier
    pub fn declares(&self, id: &NappId) -> bool {
        self.owner() == Some(id.owner.as_str()) && self.name == id.name
    }

    /// Parse a manifest from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a manifest file. Fails on missing or malformed files.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a manifest for advisory use: missing or malformed yields `None`
    pub fn load(path: &Path) -> Option<Self> {
        match Self::read(path) {
            Ok(manifest) => Some(manifest),
            Err(NappError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed manifest");
                None
            }
        }
    }

    /// Declared dependencies; malformed entries are skipped
    pub fn dependencies(&self) -> Vec<NappId> {
        self.napp_dependencies
            .iter()
            .filter_map(|dep| match dep.parse::<NappId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(dependency = %dep, napp = %self.name, "skipping malformed dependency");
                    None
                }
            })
            .collect()
    }
}

/// How an installed NApp got into the installed root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Symlink into a local working tree
    Local { source: PathBuf },
    /// Real directory owned by the installed root
    Remote { path: PathBuf },
}

impl Provenance {
    /// Inspect an installed entry. Returns `None` when nothing is there.
    pub fn detect(installed: &Path) -> Result<Option<Self>> {
        let meta = match fs::symlink_metadata(installed) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if meta.file_type().is_symlink() {
            let source = fs::read_link(installed)?;
            Ok(Some(Self::Local { source }))
        } else {
            Ok(Some(Self::Remote {
                path: installed.to_path_buf(),
            }))
        }
    }
}
