pub mod config;
pub mod error;
pub mod napp;
pub mod scaffold;

pub use config::Config;
pub use error::{NappError, Result};
pub use napp::{
    HostControl, KytosApi, LinkingHost, MetadataOptions, NappId, NappManifest, NappRef,
    NappRoots, NappsManager, Provenance, RegistryClient,
};
pub use scaffold::{create_napp, ScaffoldOptions, ScaffoldResult};
