//! Host (Kytos core) capability
//!
//! Enabling, disabling and reloading NApps belongs to the host. The manager
//! only delegates through [`HostControl`].

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{NappError, Result};
use crate::napp::registry::endpoint;
use crate::napp::state::NappRoots;
use crate::napp::types::NappId;

/// Marker file created in new owner directories
pub const MODULE_MARKER: &str = "__init__.py";

/// Verbs exposed by the host process
pub trait HostControl {
    /// Installed and enabled roots configured on the host
    fn roots(&self) -> Result<NappRoots>;

    /// Enable an installed NApp
    fn enable(&self, id: &NappId) -> Result<()>;

    /// Disable an enabled NApp
    fn disable(&self, id: &NappId) -> Result<()>;

    /// Reload the given NApps, or all of them when `ids` is `None`
    fn reload(&self, ids: Option<&[NappId]>) -> Result<()>;
}

/// Create an owner module directory with an empty marker if it is missing.
/// Returns whether the directory was created.
pub fn ensure_module(folder: &Path) -> Result<bool> {
    if folder.exists() {
        return Ok(false);
    }

    fs::create_dir_all(folder)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(folder, fs::Permissions::from_mode(0o755))?;
    }
    fs::write(folder.join(MODULE_MARKER), "")?;
    Ok(true)
}

// ========== Offline host ==========

/// Filesystem-only host used when no controller is running.
///
/// Enabling links `<enabled>/<owner>/<name>` to the installed directory.
/// There is no runtime to notify, so `reload` is unavailable.
#[derive(Debug, Clone)]
pub struct LinkingHost {
    roots: NappRoots,
}

impl LinkingHost {
    pub fn new(roots: NappRoots) -> Self {
        Self { roots }
    }
}

impl HostControl for LinkingHost {
    fn roots(&self) -> Result<NappRoots> {
        Ok(self.roots.clone())
    }

    fn enable(&self, id: &NappId) -> Result<()> {
        if !self.roots.is_installed(id) {
            return Err(NappError::NappNotInstalled { id: id.to_string() });
        }

        let enabled = self.roots.enabled_dir(id);
        if fs::symlink_metadata(&enabled).is_ok() {
            tracing::debug!(napp = %id, "already enabled");
            return Ok(());
        }

        if let Some(parent) = enabled.parent() {
            ensure_module(parent)?;
        }
        let installed = self.roots.installed_dir(id);
        let target = installed.canonicalize().unwrap_or(installed);
        symlink_dir(&target, &enabled)?;

        tracing::info!(napp = %id, path = %enabled.display(), "enabled");
        Ok(())
    }

    fn disable(&self, id: &NappId) -> Result<()> {
        let enabled = self.roots.enabled_dir(id);
        let meta = fs::symlink_metadata(&enabled)
            .map_err(|_| NappError::NappNotEnabled { id: id.to_string() })?;

        if meta.file_type().is_symlink() {
            remove_symlink(&enabled)?;
        } else {
            fs::remove_dir_all(&enabled)?;
        }

        tracing::info!(napp = %id, "disabled");
        Ok(())
    }

    fn reload(&self, _ids: Option<&[NappId]>) -> Result<()> {
        Err(NappError::HostUnavailable {
            url: self.roots.enabled.display().to_string(),
            reason: "reload requires a running controller".to_string(),
        })
    }
}

#[cfg(unix)]
pub(crate) fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub(crate) fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Remove a symlink without touching what it points at
pub fn remove_symlink(link: &Path) -> std::io::Result<()> {
    #[cfg(windows)]
    {
        fs::remove_dir(link).or_else(|_| fs::remove_file(link))
    }
    #[cfg(not(windows))]
    {
        fs::remove_file(link)
    }
}

// ========== Running controller ==========

#[derive(Debug, Deserialize)]
struct CoreConfig {
    napps: PathBuf,
    installed_napps: PathBuf,
}

/// HTTP client for a running Kytos controller
#[derive(Clone)]
pub struct KytosApi {
    api_uri: String,
    http: Client,
}

impl std::fmt::Debug for KytosApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KytosApi")
            .field("api_uri", &self.api_uri)
            .finish()
    }
}

impl KytosApi {
    /// Create a client for the controller API at `api_uri`
    pub fn new(api_uri: impl Into<String>) -> Result<Self> {
        let http = Client::builder().user_agent("napp-cli").build()?;
        Ok(Self {
            api_uri: api_uri.into(),
            http,
        })
    }

    pub fn api_uri(&self) -> &str {
        &self.api_uri
    }

    fn get(&self, path: &str) -> Result<(String, reqwest::blocking::Response)> {
        let url = endpoint(&self.api_uri, path);
        tracing::debug!(url = %url, "kytos request");
        let response = self.http.get(&url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                NappError::HostUnavailable {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            } else {
                NappError::Http(e)
            }
        })?;
        Ok((url, response))
    }

    fn napp_verb(&self, id: &NappId, verb: &str) -> Result<()> {
        let path = format!("api/core/napps/{}/{}/{}", id.owner, id.name, verb);
        let (url, response) = self.get(&path)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(match verb {
                "disable" => NappError::NappNotEnabled { id: id.to_string() },
                _ => NappError::NappNotInstalled { id: id.to_string() },
            });
        }
        if !status.is_success() {
            return Err(NappError::HostRequest {
                url,
                status: status.as_u16(),
            });
        }

        tracing::info!(napp = %id, verb, "controller accepted request");
        Ok(())
    }
}

impl HostControl for KytosApi {
    fn roots(&self) -> Result<NappRoots> {
        let (url, response) = self.get("api/core/config/")?;
        if !response.status().is_success() {
            return Err(NappError::HostUnavailable {
                url,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let config: CoreConfig = response.json()?;
        Ok(NappRoots::new(config.installed_napps, config.napps))
    }

    fn enable(&self, id: &NappId) -> Result<()> {
        self.napp_verb(id, "enable")
    }

    fn disable(&self, id: &NappId) -> Result<()> {
        self.napp_verb(id, "disable")
    }

    fn reload(&self, ids: Option<&[NappId]>) -> Result<()> {
        let paths: Vec<String> = match ids {
            Some(ids) if !ids.is_empty() => ids
                .iter()
                .map(|id| format!("api/core/reload/{}/{}", id.owner, id.name))
                .collect(),
            _ => vec!["api/core/reload/all".to_string()],
        };

        for path in paths {
            let (url, response) = self.get(&path)?;
            if !response.status().is_success() {
                return Err(NappError::HostRequest {
                    url,
                    status: response.status().as_u16(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::napp::types::MANIFEST_FILE;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_host() -> (LinkingHost, NappRoots, TempDir) {
        let temp = TempDir::new().unwrap();
        let roots = NappRoots::new(temp.path().join("installed"), temp.path().join("enabled"));
        fs::create_dir_all(&roots.installed).unwrap();
        fs::create_dir_all(&roots.enabled).unwrap();
        (LinkingHost::new(roots.clone()), roots, temp)
    }

    fn install(roots: &NappRoots, id: &NappId) {
        let dir = roots.installed_dir(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "{}").unwrap();
    }

    #[test]
    fn test_ensure_module_creates_marker() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("alice");
        assert!(ensure_module(&folder).unwrap());
        assert!(folder.join(MODULE_MARKER).exists());

        // Existing folders are left alone
        fs::remove_file(folder.join(MODULE_MARKER)).unwrap();
        assert!(!ensure_module(&folder).unwrap());
        assert!(!folder.join(MODULE_MARKER).exists());
    }

    #[test]
    fn test_enable_requires_installed() {
        let (host, _roots, _temp) = create_test_host();
        let result = host.enable(&NappId::new("alice", "fw"));
        assert!(matches!(result, Err(NappError::NappNotInstalled { .. })));
    }

    #[test]
    fn test_enable_and_disable() {
        let (host, roots, _temp) = create_test_host();
        let id = NappId::new("alice", "fw");
        install(&roots, &id);

        host.enable(&id).unwrap();
        assert!(roots.is_enabled(&id));
        assert!(roots.enabled.join("alice").join(MODULE_MARKER).exists());

        // Enabling twice is harmless
        host.enable(&id).unwrap();

        host.disable(&id).unwrap();
        assert!(!roots.is_enabled(&id));
        assert!(roots.is_installed(&id));
    }

    #[test]
    fn test_disable_requires_enabled() {
        let (host, roots, _temp) = create_test_host();
        let id = NappId::new("bob", "qos");
        install(&roots, &id);

        let result = host.disable(&id);
        assert!(matches!(result, Err(NappError::NappNotEnabled { .. })));
    }

    #[test]
    fn test_linking_host_cannot_reload() {
        let (host, _roots, _temp) = create_test_host();
        assert!(matches!(
            host.reload(None),
            Err(NappError::HostUnavailable { .. })
        ));
    }

    #[test]
    fn test_discover_roots() {
        let server = MockServer::start();
        let config = server.mock(|when, then| {
            when.method(GET).path("/api/core/config/");
            then.status(200).json_body(json!({
                "napps": "/var/lib/kytos/napps",
                "installed_napps": "/var/lib/kytos/napps/.installed"
            }));
        });

        let api = KytosApi::new(server.base_url()).unwrap();
        let roots = NappRoots::discover(&api).unwrap();

        config.assert();
        assert_eq!(roots.enabled, PathBuf::from("/var/lib/kytos/napps"));
        assert_eq!(
            roots.installed,
            PathBuf::from("/var/lib/kytos/napps/.installed")
        );
    }

    #[test]
    fn test_discover_unreachable_host() {
        // Nothing listens on port 9 of localhost in a test sandbox.
        let api = KytosApi::new("http://127.0.0.1:9/").unwrap();
        let result = NappRoots::discover(&api);
        assert!(matches!(result, Err(NappError::HostUnavailable { .. })));
    }

    #[test]
    fn test_api_enable_not_installed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/core/napps/alice/fw/enable");
            then.status(404);
        });

        let api = KytosApi::new(server.base_url()).unwrap();
        let result = api.enable(&NappId::new("alice", "fw"));
        assert!(matches!(result, Err(NappError::NappNotInstalled { .. })));
    }

    #[test]
    fn test_api_disable_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/core/napps/alice/fw/disable");
            then.status(500);
        });

        let api = KytosApi::new(server.base_url()).unwrap();
        let result = api.disable(&NappId::new("alice", "fw"));
        assert!(matches!(
            result,
            Err(NappError::HostRequest { status: 500, .. })
        ));
    }

    #[test]
    fn test_api_reload_all_and_some() {
        let server = MockServer::start();
        let all = server.mock(|when, then| {
            when.method(GET).path("/api/core/reload/all");
            then.status(200);
        });
        let one = server.mock(|when, then| {
            when.method(GET).path("/api/core/reload/bob/qos");
            then.status(200);
        });

        let api = KytosApi::new(server.base_url()).unwrap();
        api.reload(None).unwrap();
        api.reload(Some(&[NappId::new("bob", "qos")])).unwrap();

        all.assert();
        one.assert();
    }
}
