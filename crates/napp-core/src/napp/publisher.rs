//! NApp Publisher
//!
//! Assembles upload metadata from a NApp working tree and sends the package
//! to the registry.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{NappError, Result};
use crate::napp::archive::{self, PACKAGE_EXTENSION};
use crate::napp::registry::RegistryClient;
use crate::napp::types::MANIFEST_FILE;

const README_FILE: &str = "README.rst";
const OPENAPI_FILE: &str = "openapi.yml";

/// Inputs for [`create_metadata`]
#[derive(Debug, Clone)]
pub struct MetadataOptions {
    pub json_filename: String,
    pub readme_filename: String,
    /// Skip the manifest and send only readme / OpenAPI fields
    pub ignore_json: bool,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            json_filename: MANIFEST_FILE.to_string(),
            readme_filename: README_FILE.to_string(),
            ignore_json: false,
        }
    }
}

/// Read a file, mapping "not found" to `None`
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Build upload metadata: the manifest plus `readme` and `OpenAPI_Spec`.
///
/// A missing manifest is an error. A missing README or OpenAPI file yields an
/// empty string.
pub fn create_metadata(dir: &Path, options: &MetadataOptions) -> Result<Map<String, Value>> {
    let mut metadata = Map::new();

    if !options.ignore_json {
        let path = dir.join(&options.json_filename);
        let content =
            read_optional(&path)?.ok_or_else(|| NappError::ManifestNotFound { path: path.clone() })?;
        metadata = serde_json::from_str(&content)?;
    }

    let readme = read_optional(&dir.join(&options.readme_filename))?.unwrap_or_default();
    metadata.insert("readme".to_string(), Value::String(readme));

    let openapi_path = dir.join(OPENAPI_FILE);
    let openapi = match read_optional(&openapi_path)? {
        Some(content) => openapi_to_json(&openapi_path, &content)?,
        None => String::new(),
    };
    metadata.insert("OpenAPI_Spec".to_string(), Value::String(openapi));

    Ok(metadata)
}

/// Re-encode an OpenAPI YAML document as a JSON string
fn openapi_to_json(path: &Path, content: &str) -> Result<String> {
    let spec: Value = serde_saphyr::from_str(content).map_err(|e| NappError::OpenApi {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(serde_json::to_string(&spec)?)
}

/// Package the NApp in `dir` and upload it. Returns the NApp name.
pub fn upload(registry: &RegistryClient, dir: &Path, options: &MetadataOptions) -> Result<String> {
    let metadata = create_metadata(dir, options)?;
    publish(registry, dir, metadata)
}

/// Package the NApp in `dir` and upload it with metadata already built by
/// [`create_metadata`]. Returns the NApp name.
pub fn publish(registry: &RegistryClient, dir: &Path, metadata: Map<String, Value>) -> Result<String> {
    let name = metadata
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| NappError::InvalidNappName {
            name: String::new(),
        })?
        .to_string();

    let package = archive::build_napp_package(dir, &name)?;
    tracing::debug!(napp = %name, bytes = package.len(), "built package");

    let file_name = format!("{}.{}", name, PACKAGE_EXTENSION);
    registry.upload_napp(&Value::Object(metadata), package, &file_name)?;
    Ok(name)
}
