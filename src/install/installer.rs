// src/install/installer.rs

//! Install / remove state machine
//!
//! One install walks `Resolving -> Downloading -> Verifying -> Extracting ->
//! Recorded`, or stops in `Failed` from any phase. Nothing is written to the
//! theme before both the archive digest and every per-file digest have been
//! checked, and extraction goes through a staging directory that replaces
//! the component directory only once every file is written.

use crate::archive::{extract_component, read_entries, verify_entries, ArchiveEntry};
use crate::component::{validate_name, validate_version, VersionRequest};
use crate::error::{Error, Result};
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};
use crate::registry::{verify_archive, RegistrySource};
use chrono::Utc;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::reporter::{Confirm, Reporter};
use super::state::StateFile;

/// Phases of a single install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPhase {
    Resolving,
    Downloading,
    Verifying,
    Extracting,
    Recorded,
    Failed(String),
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolving => write!(f, "resolving"),
            Self::Downloading => write!(f, "downloading"),
            Self::Verifying => write!(f, "verifying"),
            Self::Extracting => write!(f, "extracting"),
            Self::Recorded => write!(f, "installed"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// A successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub name: String,
    pub version: String,
    /// Component directory inside the theme
    pub path: PathBuf,
    pub files: usize,
}

/// Per-component result of a batch install
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub result: Result<InstallOutcome>,
}

/// Results of a batch install, in request order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &InstallOutcome> {
        self.items.iter().filter_map(|item| item.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().err().map(|e| (item.name.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Result of a remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Entry dropped; `dir_removed` tells whether files were on disk
    Removed { version: String, dir_removed: bool },
    /// Component was not in the state file; nothing changed
    NotInstalled,
}

/// Installs components from a registry into a project
pub struct Installer<'a> {
    source: &'a dyn RegistrySource,
    reporter: &'a dyn Reporter,
}

impl<'a> Installer<'a> {
    pub fn new(source: &'a dyn RegistrySource, reporter: &'a dyn Reporter) -> Self {
        Self { source, reporter }
    }

    fn enter(&self, name: &str, phase: InstallPhase) {
        debug!("{} -> {}", name, phase);
        self.reporter.phase(name, &phase);
    }

    /// Install one component
    ///
    /// On success the state file has been updated and saved.
    pub fn install(
        &self,
        state: &mut StateFile,
        name: &str,
        request: &VersionRequest,
    ) -> Result<InstallOutcome> {
        let result = self.run(state, name, request);
        if let Err(e) = &result {
            self.enter(name, InstallPhase::Failed(e.to_string()));
        }
        result
    }

    fn run(
        &self,
        state: &mut StateFile,
        name: &str,
        request: &VersionRequest,
    ) -> Result<InstallOutcome> {
        self.enter(name, InstallPhase::Resolving);
        validate_name(name)?;
        let version = self.resolve(name, request)?;

        self.enter(name, InstallPhase::Downloading);
        let manifest = self.source.fetch_manifest(name, &version)?;
        if manifest.name != name || manifest.version != version {
            return Err(Error::InvalidManifest(format!(
                "requested {}@{} but the registry served a manifest for {}@{}",
                name, version, manifest.name, manifest.version
            )));
        }
        let progress = self.reporter.download_progress(name);
        let bytes = self.source.fetch_archive(name, &version, progress.as_ref())?;

        self.enter(name, InstallPhase::Verifying);
        verify_archive(&manifest, &bytes)?;
        let entries = read_entries(&bytes)?;
        verify_entries(&manifest, &entries)?;

        self.enter(name, InstallPhase::Extracting);
        let components_dir = state.components_dir();
        let files = install_files(&components_dir, &manifest, &entries)?;

        state.record_install(name, &version, Utc::now());
        state.save()?;
        self.enter(name, InstallPhase::Recorded);

        info!("Installed {}@{} ({} files)", name, version, files);
        Ok(InstallOutcome {
            name: name.to_string(),
            version,
            path: components_dir.join(name),
            files,
        })
    }

    /// Pick the version to install from the index
    fn resolve(&self, name: &str, request: &VersionRequest) -> Result<String> {
        let index = self.source.fetch_index()?;
        let entry = index
            .get(name)
            .ok_or_else(|| Error::ComponentNotFound(name.to_string()))?;

        let version = match request {
            VersionRequest::Latest => entry.latest.clone(),
            VersionRequest::Exact(v) => v.clone(),
        };
        if !entry.has_version(&version) {
            return Err(Error::VersionNotFound {
                name: name.to_string(),
                version,
                available: entry.versions.clone(),
            });
        }
        validate_version(&version)?;
        Ok(version)
    }

    /// Install several components one after another
    ///
    /// A failure never stops the batch; every component gets an outcome.
    pub fn install_many<S: AsRef<str>>(
        &self,
        state: &mut StateFile,
        names: &[S],
        request: &VersionRequest,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for name in names {
            let name = name.as_ref();
            let result = self.install(state, name, request);
            report.items.push(BatchItem {
                name: name.to_string(),
                result,
            });
        }
        report
    }

    /// Install every indexed component at its latest version
    ///
    /// Returns `None` when the confirmation is declined.
    pub fn install_all(
        &self,
        state: &mut StateFile,
        confirm: &dyn Confirm,
    ) -> Result<Option<BatchReport>> {
        let index = self.source.fetch_index()?;
        if index.is_empty() {
            return Err(Error::RegistryUnavailable(format!(
                "no components found in {}",
                self.source.location()
            )));
        }

        let names: Vec<String> = index.components.keys().cloned().collect();
        self.reporter
            .info(&format!("Found {} components to install", names.len()));

        let prompt = format!("This will install ALL {} components. Continue?", names.len());
        if !confirm.confirm(&prompt) {
            self.reporter.info("Installation cancelled");
            return Ok(None);
        }

        Ok(Some(self.install_many(state, &names, &VersionRequest::Latest)))
    }
}

/// Write a verified component into `<components_dir>/<name>`
///
/// Files land in a staging directory first. A previous install is moved
/// aside, the staging directory is renamed into place, and only then is the
/// old copy deleted. Returns the number of files written.
fn install_files(
    components_dir: &Path,
    manifest: &Manifest,
    entries: &[ArchiveEntry],
) -> Result<usize> {
    fs::create_dir_all(components_dir).map_err(|e| {
        Error::ExtractionFailed(format!("Failed to create {}: {}", components_dir.display(), e))
    })?;

    let staging = tempfile::Builder::new()
        .prefix(".wpsyde-staging-")
        .tempdir_in(components_dir)
        .map_err(|e| {
            Error::ExtractionFailed(format!("Failed to create staging directory: {}", e))
        })?;

    let written = extract_component(&manifest.name, entries, staging.path())?;
    fs::write(
        staging.path().join(MANIFEST_FILE_NAME),
        manifest.to_json_pretty()?,
    )
    .map_err(|e| Error::ExtractionFailed(format!("Failed to write manifest: {}", e)))?;

    let target = components_dir.join(&manifest.name);
    if !target.exists() {
        fs::rename(staging.path(), &target).map_err(|e| {
            Error::ExtractionFailed(format!(
                "Failed to move files into {}: {}",
                target.display(),
                e
            ))
        })?;
        return Ok(written.len());
    }

    // Old install moves aside until the new one is in place
    debug!("Replacing existing {}", target.display());
    let previous = tempfile::Builder::new()
        .prefix(".wpsyde-previous-")
        .tempdir_in(components_dir)
        .map_err(|e| Error::ExtractionFailed(format!("Failed to create backup directory: {}", e)))?;
    let backup = previous.path().join(&manifest.name);
    fs::rename(&target, &backup).map_err(|e| {
        Error::ExtractionFailed(format!("Failed to move aside {}: {}", target.display(), e))
    })?;

    if let Err(e) = fs::rename(staging.path(), &target) {
        if let Err(restore) = fs::rename(&backup, &target) {
            warn!("Failed to restore {}: {}", target.display(), restore);
        }
        return Err(Error::ExtractionFailed(format!(
            "Failed to move files into {}: {}",
            target.display(),
            e
        )));
    }

    if let Err(e) = previous.close() {
        warn!("Failed to clean up previous install of {}: {}", manifest.name, e);
    }
    Ok(written.len())
}

/// Remove an installed component
///
/// A component missing from the state file is a warning, not an error, and
/// leaves the state file untouched.
pub fn remove(state: &mut StateFile, name: &str, reporter: &dyn Reporter) -> Result<RemoveOutcome> {
    validate_name(name)?;

    let Some(installed) = state.installed(name).cloned() else {
        reporter.warn(&format!("Component \"{}\" is not installed", name));
        return Ok(RemoveOutcome::NotInstalled);
    };

    let dir = state.component_dir(name);
    let dir_removed = dir.exists();
    if dir_removed {
        fs::remove_dir_all(&dir)
            .map_err(|e| Error::IoError(format!("Failed to remove {}: {}", dir.display(), e)))?;
        reporter.info(&format!("Removed component directory: {}", dir.display()));
    } else {
        reporter.warn(&format!("{} was already gone", dir.display()));
    }

    state.forget(name);
    state.save()?;
    info!("Removed {}@{}", name, installed.version);

    Ok(RemoveOutcome::Removed {
        version: installed.version,
        dir_removed,
    })
}
