//! NApp package archives (`.napp`, tar + xz)

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use crate::error::{NappError, Result};

/// Package file extension
pub const PACKAGE_EXTENSION: &str = "napp";

/// File extensions never packaged
pub const IGNORED_EXTENSIONS: &[&str] = &["swp", "pyc", PACKAGE_EXTENSION];

/// Directory names never packaged
pub const IGNORED_DIRS: &[&str] = &["__pycache__"];

const XZ_LEVEL: u32 = 6;

/// Whether an entry is left out of packages
pub fn is_excluded(path: &Path, is_dir: bool) -> bool {
    if is_dir {
        return path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| IGNORED_DIRS.contains(&n));
    }

    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IGNORED_EXTENSIONS.contains(&e))
}

/// Top-level entries of `dir` that go into a package, sorted.
///
/// Built as a new filtered list, so adjacent excluded entries are all dropped.
pub fn package_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        let path = entry.path();
        if !is_excluded(&path, is_dir) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Write a package of `dir` to `dest`. Refuses to overwrite an existing file.
pub fn write_package(dir: &Path, dest: &Path) -> Result<()> {
    let entries = package_entries(dir)?;

    let file = OpenOptions::new().write(true).create_new(true).open(dest)?;
    let mut builder = tar::Builder::new(XzEncoder::new(file, XZ_LEVEL));
    builder.follow_symlinks(false);

    for top in entries {
        let walker = WalkDir::new(&top)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e.path(), e.file_type().is_dir()));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if path == dest {
                continue;
            }
            let Ok(rel) = path.strip_prefix(dir) else {
                continue;
            };

            if entry.file_type().is_dir() {
                builder.append_dir(rel, path)?;
            } else {
                builder.append_path_with_name(path, rel)?;
            }
        }
    }

    builder.into_inner()?.finish()?;
    tracing::debug!(dir = %dir.display(), package = %dest.display(), "wrote package");
    Ok(())
}

/// Build `<dir>/<name>.napp`, read it back and delete it from disk.
///
/// The archive only exists on disk while it is being built.
pub fn build_napp_package(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(format!("{}.{}", name, PACKAGE_EXTENSION));
    if path.exists() {
        return Err(NappError::NappAlreadyExists { path });
    }

    let bytes = write_package(dir, &path).and_then(|()| fs::read(&path).map_err(NappError::from));
    if path.exists() {
        fs::remove_file(&path)?;
    }

    bytes
}

/// Unpack a package stream into `dest`
pub fn unpack_package(reader: impl Read, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(XzDecoder::new(reader));
    archive.unpack(dest)?;
    Ok(())
}

/// Unpack a package file into `dest`
pub fn extract_package(package: &Path, dest: &Path) -> Result<()> {
    let file = File::open(package)?;
    unpack_package(BufReader::new(file), dest)?;
    tracing::debug!(package = %package.display(), dest = %dest.display(), "extracted package");
    Ok(())
}
