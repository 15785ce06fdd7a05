//! NApp Module
//!
//! Package state, archives, registry and host access for Kytos NApps.
//!
//! - `types`: identifiers, manifests and install provenance
//! - `state`: installed / enabled / disabled queries over the two roots
//! - `archive`: `.napp` package build and extraction
//! - `registry`: NApps Server client
//! - `host`: enable / disable / reload through the Kytos core
//! - `manager`: install, uninstall and search
//! - `publisher`: upload metadata and packaging

pub mod archive;
pub mod host;
pub mod manager;
pub mod publisher;
pub mod registry;
pub mod state;
pub mod types;

pub use archive::{build_napp_package, extract_package, is_excluded, IGNORED_DIRS, IGNORED_EXTENSIONS};
pub use host::{HostControl, KytosApi, LinkingHost};
pub use manager::{find_local_folder, search_napps, NappsManager};
pub use publisher::{create_metadata, MetadataOptions};
pub use registry::RegistryClient;
pub use state::{scan_napps, NappRoots};
pub use types::{NappId, NappManifest, NappRef, Provenance, DEFAULT_VERSION, MANIFEST_FILE};
