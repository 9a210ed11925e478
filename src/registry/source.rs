// src/registry/source.rs

//! Where components are fetched from
//!
//! [`RegistrySource`] is the seam between the installer and the registry.
//! [`HttpRegistry`](super::client::HttpRegistry) talks to a hosted registry;
//! [`LocalRegistry`] reads a registry directory produced by the packager.

use crate::error::{Error, Result};
use crate::hash::verify_bytes;
use crate::manifest::Manifest;
use crate::progress::ProgressTracker;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

use super::client::HttpRegistry;
use super::index::RegistryIndex;
use super::store::{Health, RegistryStore};

/// Read access to a component registry
pub trait RegistrySource {
    /// Human-readable location (URL or path)
    fn location(&self) -> String;

    /// Fetch and parse `index.json`
    fn fetch_index(&self) -> Result<RegistryIndex>;

    /// Fetch, parse and validate a version's manifest
    fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest>;

    /// Fetch a version's archive bytes, reporting progress
    fn fetch_archive(
        &self,
        name: &str,
        version: &str,
        progress: &dyn ProgressTracker,
    ) -> Result<Vec<u8>>;

    /// Fetch `health.json`
    fn fetch_health(&self) -> Result<Health>;
}

/// Check downloaded archive bytes against the manifest's archive digest
pub fn verify_archive(manifest: &Manifest, bytes: &[u8]) -> Result<()> {
    let expected = manifest.archive_integrity()?;
    verify_bytes(bytes, expected).map_err(|e| Error::IntegrityMismatch {
        subject: format!("{}@{} archive", manifest.name, manifest.version),
        expected: e.expected,
        actual: e.actual,
    })?;
    debug!("Archive digest verified for {}@{}", manifest.name, manifest.version);
    Ok(())
}

/// Open a registry from a configured location
///
/// `http://` and `https://` URLs use the HTTP client; `file://` URLs and
/// plain paths read a local registry directory.
pub fn open_registry(location: &str) -> Result<Box<dyn RegistrySource>> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::ConfigError("Registry location is empty".to_string()));
    }

    if location.starts_with("http://") || location.starts_with("https://") {
        return Ok(Box::new(HttpRegistry::new(location)?));
    }

    if location.starts_with("file://") {
        let url = Url::parse(location)
            .map_err(|e| Error::ConfigError(format!("Invalid registry URL {}: {}", location, e)))?;
        let path = url
            .to_file_path()
            .map_err(|_| {
                Error::ConfigError(format!("Registry URL is not a local path: {}", location))
            })?;
        return Ok(Box::new(LocalRegistry::new(path)));
    }

    if location.contains("://") {
        return Err(Error::ConfigError(format!(
            "Unsupported registry scheme: {}",
            location
        )));
    }

    Ok(Box::new(LocalRegistry::new(location)))
}

/// A registry directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    store: RegistryStore,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: RegistryStore::new(root),
        }
    }
}

impl RegistrySource for LocalRegistry {
    fn location(&self) -> String {
        self.store.root().display().to_string()
    }

    fn fetch_index(&self) -> Result<RegistryIndex> {
        if !self.store.index_path().is_file() {
            return Err(Error::RegistryUnavailable(format!(
                "{} not found",
                self.store.index_path().display()
            )));
        }
        self.store
            .load_index()
            .map_err(|e| Error::RegistryUnavailable(e.to_string()))
    }

    fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest> {
        match self.store.read_manifest(name, version) {
            Err(Error::IoError(msg)) => Err(Error::RegistryUnavailable(msg)),
            other => other,
        }
    }

    fn fetch_archive(
        &self,
        name: &str,
        version: &str,
        progress: &dyn ProgressTracker,
    ) -> Result<Vec<u8>> {
        match self.store.read_archive(name, version) {
            Ok(bytes) => {
                progress.set_length(bytes.len() as u64);
                progress.set_position(bytes.len() as u64);
                progress.finish_with_message("done");
                Ok(bytes)
            }
            Err(e) => {
                progress.finish_with_error(&e.to_string());
                Err(match e {
                    Error::IoError(msg) => Error::DownloadFailed(msg),
                    other => other,
                })
            }
        }
    }

    fn fetch_health(&self) -> Result<Health> {
        self.store
            .read_health()
            .map_err(|e| Error::RegistryUnavailable(e.to_string()))
    }
}
