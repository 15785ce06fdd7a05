//! NApp state queries
//!
//! Installed, enabled and disabled sets are derived from the filesystem on
//! every call. Nothing is cached.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::napp::host::HostControl;
use crate::napp::types::{NappId, NappManifest, DEFAULT_VERSION, MANIFEST_FILE};

/// The two directory roots a NApps installation is made of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NappRoots {
    /// Where installed NApps live (real dirs or symlinks)
    pub installed: PathBuf,
    /// Where enabled NApps are referenced
    pub enabled: PathBuf,
}

impl NappRoots {
    pub fn new(installed: impl Into<PathBuf>, enabled: impl Into<PathBuf>) -> Self {
        Self {
            installed: installed.into(),
            enabled: enabled.into(),
        }
    }

    /// Ask a running host for its configured roots. Fails once, never retries.
    pub fn discover(host: &dyn HostControl) -> Result<Self> {
        host.roots()
    }

    /// `<installed>/<owner>/<name>`
    pub fn installed_dir(&self, id: &NappId) -> PathBuf {
        self.installed.join(id.rel_path())
    }

    /// `<enabled>/<owner>/<name>`
    pub fn enabled_dir(&self, id: &NappId) -> PathBuf {
        self.enabled.join(id.rel_path())
    }

    /// Sorted installed NApps
    pub fn get_installed(&self) -> Vec<NappId> {
        scan_napps(&self.installed)
    }

    /// Sorted enabled NApps
    pub fn get_enabled(&self) -> Vec<NappId> {
        scan_napps(&self.enabled)
    }

    /// Sorted installed NApps that are not enabled
    pub fn get_disabled(&self) -> Vec<NappId> {
        let enabled: BTreeSet<NappId> = self.get_enabled().into_iter().collect();
        self.get_installed()
            .into_iter()
            .filter(|id| !enabled.contains(id))
            .collect()
    }

    pub fn is_installed(&self, id: &NappId) -> bool {
        self.get_installed().contains(id)
    }

    pub fn is_enabled(&self, id: &NappId) -> bool {
        self.get_enabled().contains(id)
    }

    // ========== Metadata (advisory) ==========

    /// Manifest of an installed NApp, if readable
    pub fn manifest(&self, id: &NappId) -> Option<NappManifest> {
        NappManifest::load(&self.installed_dir(id).join(MANIFEST_FILE))
    }

    /// Description from the installed manifest, or empty
    pub fn description(&self, id: &NappId) -> String {
        self.manifest(id)
            .map(|m| m.description)
            .unwrap_or_default()
    }

    /// Version from the installed manifest, or `latest`
    pub fn version(&self, id: &NappId) -> String {
        self.manifest(id)
            .map(|m| m.version)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string())
    }

    /// Dependencies declared by the installed manifest, or none
    pub fn dependencies(&self, id: &NappId) -> Vec<NappId> {
        self.manifest(id)
            .map(|m| m.dependencies())
            .unwrap_or_default()
    }
}

/// List `(owner, name)` pairs with a manifest at `<root>/*/*/kytos.json`
pub fn scan_napps(root: &Path) -> Vec<NappId> {
    let Some(root_str) = root.to_str() else {
        tracing::warn!(root = %root.display(), "NApps root is not valid UTF-8");
        return Vec::new();
    };
    let pattern = Path::new(&glob::Pattern::escape(root_str))
        .join("*")
        .join("*")
        .join(MANIFEST_FILE);
    let pattern = pattern.to_string_lossy();

    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "invalid NApps scan pattern");
            return Vec::new();
        }
    };

    let mut napps: Vec<NappId> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|manifest| {
            let napp_dir = manifest.parent()?;
            let name = napp_dir.file_name()?.to_str()?;
            let owner = napp_dir.parent()?.file_name()?.to_str()?;
            Some(NappId::new(owner, name))
        })
        .collect();

    napps.sort();
    napps.dedup();
    tracing::debug!(root = %root.display(), count = napps.len(), "scanned NApps");
    napps
}
