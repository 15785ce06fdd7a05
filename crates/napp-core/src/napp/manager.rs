//! NApps Manager
//!
//! High-level API for installing, removing, enabling and searching NApps.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{NappError, Result};
use crate::napp::archive;
use crate::napp::host::{ensure_module, remove_symlink, symlink_dir, HostControl, MODULE_MARKER};
use crate::napp::publisher::{self, MetadataOptions};
use crate::napp::registry::RegistryClient;
use crate::napp::state::NappRoots;
use crate::napp::types::{NappId, NappManifest, NappRef, Provenance, MANIFEST_FILE};

/// NApps Manager - filesystem state plus registry and host delegation
pub struct NappsManager {
    roots: NappRoots,
    registry: RegistryClient,
    host: Box<dyn HostControl>,
    /// Where local NApp sources are looked up
    work_dir: PathBuf,
    /// Parent of temporary downloads and extraction dirs
    temp_dir: PathBuf,
    /// Owner modules created by installs, the only ones uninstall may prune
    created_modules: RefCell<BTreeSet<PathBuf>>,
}

impl NappsManager {
    /// Create a manager bound to explicit roots
    pub fn new(roots: NappRoots, registry: RegistryClient, host: Box<dyn HostControl>) -> Self {
        let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            roots,
            registry,
            host,
            work_dir,
            temp_dir: std::env::temp_dir(),
            created_modules: RefCell::new(BTreeSet::new()),
        }
    }

    /// Use a different directory for local NApp lookup
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Use a different parent directory for temporary artifacts
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn roots(&self) -> &NappRoots {
        &self.roots
    }

    // ========== State ==========

    pub fn get_installed(&self) -> Vec<NappId> {
        self.roots.get_installed()
    }

    pub fn get_enabled(&self) -> Vec<NappId> {
        self.roots.get_enabled()
    }

    pub fn get_disabled(&self) -> Vec<NappId> {
        self.roots.get_disabled()
    }

    pub fn is_installed(&self, id: &NappId) -> bool {
        self.roots.is_installed(id)
    }

    pub fn is_enabled(&self, id: &NappId) -> bool {
        self.roots.is_enabled(id)
    }

    // ========== Install / Uninstall ==========

    /// Link a NApp from the working tree into the installed root
    pub fn install_local(&self, id: &NappId) -> Result<Provenance> {
        let folder = find_local_folder(&self.work_dir, id)?;
        let dst = self.roots.installed_dir(id);
        self.ensure_not_installed(id, &dst)?;

        let source = folder.canonicalize()?;
        let created = self.prepare_module(&dst)?;
        if let Err(e) = symlink_dir(&source, &dst) {
            self.release_module(created);
            return Err(e.into());
        }

        tracing::info!(napp = %id, source = %source.display(), "installed local NApp");
        Ok(Provenance::Local { source })
    }

    /// Download, extract and move a NApp into the installed root.
    ///
    /// The downloaded archive and the extraction dir are removed on every
    /// exit path. Download, extraction and move errors propagate unchanged.
    pub fn install_remote(&self, napp: &NappRef) -> Result<Provenance> {
        let id = &napp.id;
        let dst = self.roots.installed_dir(id);
        self.ensure_not_installed(id, &dst)?;

        fs::create_dir_all(&self.temp_dir)?;
        let mut package = tempfile::Builder::new()
            .prefix("napp-")
            .suffix(".napp")
            .tempfile_in(&self.temp_dir)?;
        self.registry.download(napp, package.as_file_mut())?;

        let extracted = tempfile::Builder::new()
            .prefix(&format!("napp-{}-{}-", id.owner, id.name))
            .tempdir_in(&self.temp_dir)?;
        archive::extract_package(package.path(), extracted.path())?;

        let folder = find_local_folder(extracted.path(), id)?;
        let created = self.prepare_module(&dst)?;
        if let Err(e) = move_dir(&folder, &dst) {
            self.release_module(created);
            return Err(e);
        }

        tracing::info!(napp = %napp, path = %dst.display(), "installed remote NApp");
        Ok(Provenance::Remote { path: dst })
    }

    fn ensure_not_installed(&self, id: &NappId, dst: &Path) -> Result<()> {
        if fs::symlink_metadata(dst).is_ok() {
            return Err(NappError::NappAlreadyInstalled { id: id.to_string() });
        }
        Ok(())
    }

    /// Create the owner module of `dst` if missing and remember that we did
    fn prepare_module(&self, dst: &Path) -> Result<Option<PathBuf>> {
        let Some(parent) = dst.parent() else {
            return Ok(None);
        };
        if !ensure_module(parent)? {
            return Ok(None);
        }

        self.created_modules
            .borrow_mut()
            .insert(parent.to_path_buf());
        Ok(Some(parent.to_path_buf()))
    }

    /// Drop an owner module created for an install that then failed
    fn release_module(&self, created: Option<PathBuf>) {
        let Some(folder) = created else {
            return;
        };
        match prune_module(&folder) {
            Ok(true) => {
                self.created_modules.borrow_mut().remove(&folder);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %folder.display(), error = %e, "could not remove owner module");
            }
        }
    }

    /// Remove an installed NApp. Not installed is a no-op.
    ///
    /// Local installs only lose their link; the source tree is untouched. A
    /// link whose target is gone is removed too. The owner module is pruned
    /// only when this manager created it and it is left empty.
    pub fn uninstall(&self, id: &NappId) -> Result<()> {
        let installed = self.roots.installed_dir(id);

        match Provenance::detect(&installed)? {
            None => {
                tracing::debug!(napp = %id, "not installed, nothing to uninstall");
                return Ok(());
            }
            Some(Provenance::Local { source }) => {
                remove_symlink(&installed)?;
                tracing::info!(napp = %id, source = %source.display(), "unlinked local NApp");
            }
            Some(Provenance::Remote { path }) => {
                if !self.is_installed(id) {
                    tracing::debug!(napp = %id, "directory without manifest, leaving it");
                    return Ok(());
                }
                fs::remove_dir_all(&path)?;
                tracing::info!(napp = %id, "removed NApp");
            }
        }

        if let Some(owner_dir) = installed.parent() {
            let created = self.created_modules.borrow().contains(owner_dir);
            if created && prune_module(owner_dir)? {
                self.created_modules.borrow_mut().remove(owner_dir);
            }
        }
        Ok(())
    }

    // ========== Enable / Disable / Reload ==========

    pub fn enable(&self, id: &NappId) -> Result<()> {
        self.host.enable(id)
    }

    pub fn disable(&self, id: &NappId) -> Result<()> {
        self.host.disable(id)
    }

    /// Reload the given NApps, or all when `ids` is `None`
    pub fn reload(&self, ids: Option<&[NappId]>) -> Result<()> {
        self.host.reload(ids)
    }

    // ========== Registry ==========

    /// Registry NApps whose `owner/name`, description or any tag matches
    /// `pattern` from its start
    pub fn search(&self, pattern: &str) -> Result<Vec<NappManifest>> {
        let regex = Regex::new(&format!("^(?:{})", pattern))?;
        let napps = self.registry.get_napps()?;
        Ok(search_napps(napps, &regex))
    }

    /// Build and upload the NApp in the working directory
    pub fn upload(&self, options: &MetadataOptions) -> Result<String> {
        publisher::upload(&self.registry, &self.work_dir, options)
    }

    /// Delete a NApp from the registry
    pub fn delete(&self, id: &NappId) -> Result<()> {
        self.registry.delete(id)
    }
}

/// Remove an owner module dir left holding only its empty marker. Returns
/// whether it was removed.
fn prune_module(folder: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(folder)?;
    let only_marker = match (entries.next(), entries.next()) {
        (Some(Ok(entry)), None) => {
            entry.file_name() == MODULE_MARKER && entry.metadata()?.len() == 0
        }
        _ => false,
    };

    if only_marker {
        fs::remove_dir_all(folder)?;
    }
    Ok(only_marker)
}

/// Keep NApps matching `regex`, in their original order
pub fn search_napps(napps: Vec<NappManifest>, regex: &Regex) -> Vec<NappManifest> {
    napps
        .into_iter()
        .filter(|napp| matches_napp(napp, regex))
        .collect()
}

fn matches_napp(napp: &NappManifest, regex: &Regex) -> bool {
    let full_name = format!("{}/{}", napp.owner().unwrap_or_default(), napp.name);
    if regex.is_match(&full_name) || regex.is_match(&napp.description) {
        return true;
    }

    napp.tags.iter().any(|tag| regex.is_match(tag))
}

/// Find the root folder of `id` under `root`: `root` itself, then
/// `root/<owner>/<name>`. A folder matches when its manifest declares `id`.
pub fn find_local_folder(root: &Path, id: &NappId) -> Result<PathBuf> {
    for candidate in [root.to_path_buf(), root.join(id.rel_path())] {
        let manifest = candidate.join(MANIFEST_FILE);
        if !manifest.exists() {
            continue;
        }
        match NappManifest::read(&manifest) {
            Ok(meta) if meta.declares(id) => return Ok(candidate),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %manifest.display(), error = %e, "unreadable manifest")
            }
        }
    }

    Err(NappError::NappNotFound { id: id.to_string() })
}

/// Move a directory, copying only when the rename crosses filesystems.
/// Other rename errors are returned as-is. A failed copy leaves nothing at
/// `dst`.
fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            tracing::debug!(src = %src.display(), dst = %dst.display(), "rename crosses devices, copying");
        }
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = copy_dir_recursive(src, dst) {
        if dst.exists() {
            if let Err(cleanup) = fs::remove_dir_all(dst) {
                tracing::warn!(path = %dst.display(), error = %cleanup, "could not remove partial copy");
            }
        }
        return Err(e);
    }
    fs::remove_dir_all(src)?;
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(&src_path)?;
            symlink_dir(&target, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::napp::host::LinkingHost;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        roots: NappRoots,
        work: PathBuf,
        scratch: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let roots = NappRoots::new(temp.path().join("installed"), temp.path().join("enabled"));
            fs::create_dir_all(&roots.installed).unwrap();
            fs::create_dir_all(&roots.enabled).unwrap();
            let work = temp.path().join("work");
            let scratch = temp.path().join("scratch");
            fs::create_dir_all(&work).unwrap();
            fs::create_dir_all(&scratch).unwrap();
            Self {
                temp,
                roots,
                work,
                scratch,
            }
        }

        fn manager(&self, registry: RegistryClient) -> NappsManager {
            NappsManager::new(
                self.roots.clone(),
                registry,
                Box::new(LinkingHost::new(self.roots.clone())),
            )
            .with_work_dir(&self.work)
            .with_temp_dir(&self.scratch)
        }

        fn offline_manager(&self) -> NappsManager {
            self.manager(RegistryClient::new("http://127.0.0.1:9/", "http://127.0.0.1:9/").unwrap())
        }

        fn scratch_is_empty(&self) -> bool {
            fs::read_dir(&self.scratch).unwrap().next().is_none()
        }

        fn snapshot(&self, root: &Path) -> Vec<PathBuf> {
            let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .map(|e| e.unwrap().path().to_path_buf())
                .collect();
            entries.sort();
            entries
        }
    }

    fn write_napp(dir: &Path, owner: &str, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            json!({ "username": owner, "name": name, "description": "test" }).to_string(),
        )
        .unwrap();
        fs::write(dir.join("main.py"), "class Main: pass").unwrap();
    }

    fn package_bytes(temp: &Path, owner: &str, name: &str) -> Vec<u8> {
        let src = temp.join("package-src");
        write_napp(&src.join(owner).join(name), owner, name);
        archive::build_napp_package(&src, name).unwrap()
    }

    #[test]
    fn test_install_local_from_work_dir_root() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "fw");
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");

        let provenance = manager.install_local(&id).unwrap();

        assert!(matches!(provenance, Provenance::Local { .. }));
        assert!(manager.is_installed(&id));
        assert!(fx.roots.installed.join("alice").join("__init__.py").exists());
        assert!(fx.roots.installed_dir(&id).is_symlink());
    }

    #[test]
    fn test_install_local_from_owner_subdir() {
        let fx = Fixture::new();
        write_napp(&fx.work.join("bob").join("qos"), "bob", "qos");
        let manager = fx.offline_manager();

        manager.install_local(&NappId::new("bob", "qos")).unwrap();
        assert_eq!(manager.get_installed(), vec![NappId::new("bob", "qos")]);
    }

    #[test]
    fn test_install_local_not_found() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "other");
        let manager = fx.offline_manager();

        let result = manager.install_local(&NappId::new("alice", "fw"));
        assert!(matches!(result, Err(NappError::NappNotFound { .. })));
    }

    #[test]
    fn test_install_local_refuses_overwrite() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "fw");
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");

        manager.install_local(&id).unwrap();
        let result = manager.install_local(&id);
        assert!(matches!(result, Err(NappError::NappAlreadyInstalled { .. })));
    }

    #[test]
    fn test_install_local_then_uninstall_round_trip() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "fw");
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");

        let before = fx.snapshot(&fx.roots.installed);
        let source_before = fx.snapshot(&fx.work);

        manager.install_local(&id).unwrap();
        manager.uninstall(&id).unwrap();

        assert_eq!(fx.snapshot(&fx.roots.installed), before);
        assert_eq!(fx.snapshot(&fx.work), source_before);
        assert!(fx.work.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_uninstall_keeps_shared_owner_module() {
        let fx = Fixture::new();
        write_napp(&fx.work.join("alice").join("fw"), "alice", "fw");
        write_napp(&fx.work.join("alice").join("acl"), "alice", "acl");
        let manager = fx.offline_manager();

        manager.install_local(&NappId::new("alice", "fw")).unwrap();
        manager.install_local(&NappId::new("alice", "acl")).unwrap();
        manager.uninstall(&NappId::new("alice", "fw")).unwrap();

        assert_eq!(manager.get_installed(), vec![NappId::new("alice", "acl")]);
        assert!(fx.roots.installed.join("alice").join(MODULE_MARKER).exists());
    }

    #[test]
    fn test_uninstall_keeps_preexisting_owner_module() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "fw");
        let owner = fx.roots.installed.join("alice");
        fs::create_dir_all(&owner).unwrap();
        fs::write(owner.join(MODULE_MARKER), "").unwrap();
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");

        let before = fx.snapshot(&fx.roots.installed);
        manager.install_local(&id).unwrap();
        manager.uninstall(&id).unwrap();

        assert_eq!(fx.snapshot(&fx.roots.installed), before);
        assert!(owner.join(MODULE_MARKER).exists());
    }

    #[test]
    fn test_uninstall_removes_dangling_link() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "fw");
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");

        let link = fx.roots.installed_dir(&id);
        fs::create_dir_all(link.parent().unwrap()).unwrap();
        symlink_dir(&fx.temp.path().join("gone"), &link).unwrap();
        assert!(!manager.is_installed(&id));

        manager.uninstall(&id).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());

        manager.install_local(&id).unwrap();
        assert!(manager.is_installed(&id));
    }

    #[test]
    fn test_uninstall_keeps_directory_without_manifest() {
        let fx = Fixture::new();
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");
        let dir = fx.roots.installed_dir(&id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "keep").unwrap();

        manager.uninstall(&id).unwrap();
        assert!(dir.join("notes.txt").exists());
    }

    #[test]
    fn test_uninstall_not_installed_is_noop() {
        let fx = Fixture::new();
        let manager = fx.offline_manager();
        manager.uninstall(&NappId::new("nobody", "none")).unwrap();
    }

    #[test]
    fn test_install_remote_and_uninstall() {
        let fx = Fixture::new();
        let server = MockServer::start();
        let bytes = package_bytes(fx.temp.path(), "bob", "qos");
        let download = server.mock(|when, then| {
            when.method(GET).path("/repo/bob/qos-latest.napp");
            then.status(200).body(bytes.clone());
        });

        let registry = RegistryClient::new(server.base_url(), server.url("/repo/")).unwrap();
        let manager = fx.manager(registry);
        let napp: NappRef = "bob/qos".parse().unwrap();

        let provenance = manager.install_remote(&napp).unwrap();

        download.assert();
        assert_eq!(
            provenance,
            Provenance::Remote {
                path: fx.roots.installed_dir(&napp.id)
            }
        );
        assert!(manager.is_installed(&napp.id));
        assert!(fx.roots.installed_dir(&napp.id).join("main.py").exists());
        assert!(fx.scratch_is_empty());

        manager.uninstall(&napp.id).unwrap();
        assert!(!fx.roots.installed_dir(&napp.id).exists());
    }

    #[test]
    fn test_install_remote_failed_extraction_cleans_up() {
        let fx = Fixture::new();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repo/bob/qos-1.0.napp");
            then.status(200).body("definitely not an xz archive");
        });

        let registry = RegistryClient::new(server.base_url(), server.url("/repo/")).unwrap();
        let manager = fx.manager(registry);
        let before = fx.snapshot(&fx.roots.installed);

        let result = manager.install_remote(&"bob/qos:1.0".parse().unwrap());

        assert!(matches!(result, Err(NappError::Io(_))));
        assert!(fx.scratch_is_empty());
        assert_eq!(fx.snapshot(&fx.roots.installed), before);
    }

    #[test]
    fn test_install_remote_download_failure_cleans_up() {
        let fx = Fixture::new();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repo/bob/qos-latest.napp");
            then.status(404);
        });

        let registry = RegistryClient::new(server.base_url(), server.url("/repo/")).unwrap();
        let manager = fx.manager(registry);

        let result = manager.install_remote(&"bob/qos".parse().unwrap());

        assert!(matches!(result, Err(NappError::Download { .. })));
        assert!(fx.scratch_is_empty());
    }

    #[test]
    fn test_install_remote_wrong_package_cleans_up() {
        let fx = Fixture::new();
        let server = MockServer::start();
        let bytes = package_bytes(fx.temp.path(), "alice", "fw");
        server.mock(|when, then| {
            when.method(GET).path("/repo/bob/qos-latest.napp");
            then.status(200).body(bytes.clone());
        });

        let registry = RegistryClient::new(server.base_url(), server.url("/repo/")).unwrap();
        let manager = fx.manager(registry);

        let result = manager.install_remote(&"bob/qos".parse().unwrap());

        assert!(matches!(result, Err(NappError::NappNotFound { .. })));
        assert!(fx.scratch_is_empty());
        assert!(manager.get_installed().is_empty());
    }

    #[test]
    fn test_install_remote_move_failure_propagates_and_cleans_up() {
        let fx = Fixture::new();
        let server = MockServer::start();
        let bytes = package_bytes(fx.temp.path(), "bob", "qos");
        server.mock(|when, then| {
            when.method(GET).path("/repo/bob/qos-latest.napp");
            then.status(200).body(bytes.clone());
        });
        // The owner path is a plain file, so the move cannot create bob/qos
        fs::write(fx.roots.installed.join("bob"), "not a module").unwrap();

        let registry = RegistryClient::new(server.base_url(), server.url("/repo/")).unwrap();
        let manager = fx.manager(registry);
        let before = fx.snapshot(&fx.roots.installed);

        let result = manager.install_remote(&"bob/qos".parse().unwrap());

        assert!(matches!(result, Err(NappError::Io(_))));
        assert!(fx.scratch_is_empty());
        assert_eq!(fx.snapshot(&fx.roots.installed), before);
        assert_eq!(
            fs::read_to_string(fx.roots.installed.join("bob")).unwrap(),
            "not a module"
        );
    }

    #[test]
    fn test_move_dir_renames() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("main.py"), "pass").unwrap();

        let dst = temp.path().join("dst");
        move_dir(&src, &dst).unwrap();

        assert!(!src.exists());
        assert!(dst.join("main.py").exists());
    }

    #[test]
    fn test_move_dir_returns_rename_error() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("main.py"), "pass").unwrap();
        fs::write(temp.path().join("file"), "").unwrap();

        let result = move_dir(&src, &temp.path().join("file").join("dst"));

        assert!(matches!(result, Err(NappError::Io(_))));
        assert!(src.join("main.py").exists());
    }

    #[test]
    fn test_enable_disable_delegate_to_host() {
        let fx = Fixture::new();
        write_napp(&fx.work, "alice", "fw");
        let manager = fx.offline_manager();
        let id = NappId::new("alice", "fw");

        assert!(matches!(
            manager.enable(&id),
            Err(NappError::NappNotInstalled { .. })
        ));

        manager.install_local(&id).unwrap();
        manager.enable(&id).unwrap();
        assert_eq!(manager.get_enabled(), vec![id.clone()]);
        assert!(manager.get_disabled().is_empty());

        manager.disable(&id).unwrap();
        assert_eq!(manager.get_disabled(), vec![id]);
    }

    fn registry_listing() -> Vec<NappManifest> {
        serde_json::from_value(json!([
            { "username": "bob", "name": "qos-shaper", "description": "traffic shaping",
              "tags": ["qos", "net"] },
            { "username": "alice", "name": "fw", "description": "firewall",
              "tags": ["security"] }
        ]))
        .unwrap()
    }

    #[test]
    fn test_search_napps_by_tag() {
        let regex = Regex::new("^(?:qos)").unwrap();
        let found = search_napps(registry_listing(), &regex);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "qos-shaper");
    }

    #[test]
    fn test_search_napps_by_full_name_and_description() {
        let by_name = search_napps(registry_listing(), &Regex::new("^(?:alice/)").unwrap());
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "fw");

        let by_desc = search_napps(registry_listing(), &Regex::new("^(?:fire)").unwrap());
        assert_eq!(by_desc.len(), 1);
    }

    #[test]
    fn test_search_against_registry() {
        let fx = Fixture::new();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/napps/");
            then.status(200).json_body(json!([
                { "username": "bob", "name": "qos-shaper", "description": "traffic shaping",
                  "tags": ["qos", "net"] },
                { "author": "alice", "name": "fw", "description": "firewall",
                  "tags": ["security"] }
            ]));
        });

        let registry = RegistryClient::new(server.base_url(), server.url("/repo/")).unwrap();
        let manager = fx.manager(registry);

        let found = manager.search("qos").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owner(), Some("bob"));

        assert!(matches!(
            manager.search("("),
            Err(NappError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_find_local_folder_prefers_root() {
        let temp = TempDir::new().unwrap();
        write_napp(temp.path(), "alice", "fw");
        write_napp(&temp.path().join("alice").join("fw"), "alice", "fw");

        let found = find_local_folder(temp.path(), &NappId::new("alice", "fw")).unwrap();
        assert_eq!(found, temp.path());
    }

    #[test]
    fn test_copy_dir_recursive() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("subdir")).unwrap();
        fs::write(src.join("file1.txt"), "content1").unwrap();
        fs::write(src.join("subdir/file2.txt"), "content2").unwrap();

        let dst = temp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(
            fs::read_to_string(dst.join("file1.txt")).unwrap(),
            "content1"
        );
        assert!(dst.join("subdir/file2.txt").exists());
    }
}
