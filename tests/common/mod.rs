// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use wpsyde::install::StateFile;
use wpsyde::manifest::Manifest;
use wpsyde::progress::ProgressTracker;
use wpsyde::registry::{Health, RegistryIndex, RegistrySource, RegistryStore};
use wpsyde::{build_archive, ComponentSource, ManifestBuilder};

/// File set of a simple component
pub fn component_files(name: &str) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        (
            "component.php",
            format!(
                "<?php /* {} */ ?>\n<div class=\"wps-{}\"></div>\n",
                name,
                name.to_lowercase()
            )
            .into_bytes(),
        ),
        (
            "styles.css",
            format!(".wps-{} {{ display: block; }}\n", name.to_lowercase()).into_bytes(),
        ),
        ("README.md", format!("# {}\n\nUsage notes.\n", name).into_bytes()),
    ]
}

/// Publish `name@version` into the registry at `root`
pub fn publish(root: &Path, name: &str, version: &str, files: Vec<(&str, Vec<u8>)>) -> Manifest {
    let source = ComponentSource::from_files(name, files).unwrap();
    let manifest = ManifestBuilder::new(&source, version).build().unwrap();
    let archive = build_archive(&manifest, &source).unwrap();
    RegistryStore::new(root).publish(&manifest, &archive).unwrap();
    RegistryStore::new(root).read_manifest(name, version).unwrap()
}

/// Registry with Button@1.0.0 and Card@1.0.0
///
/// Returns (TempDir, registry root) - keep the TempDir alive to prevent cleanup.
pub fn setup_registry() -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("registry");
    publish(&root, "Button", "1.0.0", component_files("Button"));
    publish(&root, "Card", "1.0.0", component_files("Card"));
    (temp, root)
}

/// Fresh project with a default wpsyde.json
pub fn setup_project(temp: &TempDir) -> StateFile {
    let dir = temp.path().join("project");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("wpsyde.json");
    StateFile::init(&path).unwrap();
    StateFile::load(&path).unwrap()
}

/// Registry source that counts calls before delegating
pub struct CountingSource<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S: RegistrySource> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl<S: RegistrySource> RegistrySource for CountingSource<S> {
    fn location(&self) -> String {
        self.inner.location()
    }

    fn fetch_index(&self) -> wpsyde::Result<RegistryIndex> {
        self.hit();
        self.inner.fetch_index()
    }

    fn fetch_manifest(&self, name: &str, version: &str) -> wpsyde::Result<Manifest> {
        self.hit();
        self.inner.fetch_manifest(name, version)
    }

    fn fetch_archive(
        &self,
        name: &str,
        version: &str,
        progress: &dyn ProgressTracker,
    ) -> wpsyde::Result<Vec<u8>> {
        self.hit();
        self.inner.fetch_archive(name, version, progress)
    }

    fn fetch_health(&self) -> wpsyde::Result<Health> {
        self.hit();
        self.inner.fetch_health()
    }
}
