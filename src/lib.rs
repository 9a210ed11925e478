// src/lib.rs

//! WPSyde component registry
//!
//! Versioned, integrity-checked distribution of WordPress theme components.
//!
//! # Architecture
//!
//! - Manifests: typed records listing every file with a `sha256-<base64>` digest
//! - Archives: deterministic zips, so republishing identical content is a no-op
//! - Registry store: static file tree whose published versions are immutable
//! - Registry sources: HTTP or local directory behind one trait
//! - Installer: resolve, download, verify, extract, record; nothing touches
//!   the theme before every digest has been checked

pub mod archive;
pub mod component;
mod error;
pub mod hash;
pub mod install;
pub mod manifest;
pub mod packager;
pub mod progress;
pub mod registry;

#[cfg(feature = "server")]
pub mod server;

pub use archive::{build_archive, ComponentArchive};
pub use component::{ComponentSource, LogicalFile, VersionRequest};
pub use error::{Error, Result};
pub use hash::{HashAlgorithm, Hasher, Integrity};
pub use install::{Installer, Reporter, StateFile};
pub use manifest::{Manifest, ManifestBuilder};
pub use progress::{CallbackProgress, LogProgress, ProgressEvent, ProgressTracker, SilentProgress};
pub use registry::{open_registry, RegistrySource, RegistryStore};
