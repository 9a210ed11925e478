// src/registry/store.rs

//! On-disk registry store
//!
//! Layout (static-file servable):
//!
//! ```text
//! <root>/index.json
//! <root>/health.json
//! <root>/_headers
//! <root>/public-key.pem                       (optional, reserved)
//! <root>/components/<name>/<version>/manifest.json
//! <root>/components/<name>/<version>/component.zip
//! ```
//!
//! Publishing enforces immutability: the content-bearing fields of a
//! published manifest never change. Metadata may be edited.

use crate::archive::{read_entries, verify_entries, ComponentArchive};
use crate::component::{validate_name, validate_version};
use crate::error::{Error, Result};
use crate::hash::verify_bytes;
use crate::manifest::{Manifest, ARCHIVE_FILE_NAME, MANIFEST_FILE_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::index::{RegistryIndex, INDEX_FILE_NAME};

/// Health file name at the registry root
pub const HEALTH_FILE_NAME: &str = "health.json";

/// Static host header rules file
pub const HEADERS_FILE_NAME: &str = "_headers";

/// Reserved signing key file
pub const PUBLIC_KEY_FILE_NAME: &str = "public-key.pem";

/// Cache policy for the index
pub const INDEX_CACHE_CONTROL: &str = "public, max-age=60";

/// Cache policy for versioned component assets and the public key
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Directory holding all components
const COMPONENTS_DIR: &str = "components";

/// Contents of health.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<serde_json::Value>,
}

impl Health {
    /// A healthy status stamped with `now`
    pub fn ok(now: DateTime<Utc>) -> Self {
        Self {
            status: "ok".to_string(),
            ts: Some(serde_json::Value::String(now.to_rfc3339())),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok" && self.ts.as_ref().is_some_and(|ts| !ts.is_null())
    }
}

/// What `publish` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// First publish of this version
    Created,
    /// Version existed; immutable fields equal, metadata rewritten
    Republished,
}

/// Write a file via a temporary sibling and rename
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::IoError(format!("No parent directory for {}", path.display())))?;
    fs::create_dir_all(parent)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {}", parent.display(), e)))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| {
            Error::IoError(format!("Failed to create temp file in {}: {}", parent.display(), e))
        })?;
    temp.write_all(content)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
    temp.persist(path)
        .map_err(|e| Error::IoError(format!("Failed to replace {}: {}", path.display(), e.error)))?;
    Ok(())
}

/// A registry directory
#[derive(Debug, Clone)]
pub struct RegistryStore {
    root: PathBuf,
}

impl RegistryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    pub fn health_path(&self) -> PathBuf {
        self.root.join(HEALTH_FILE_NAME)
    }

    /// `components/<name>/<version>`, after validating both segments
    pub fn version_dir(&self, name: &str, version: &str) -> Result<PathBuf> {
        validate_name(name)?;
        validate_version(version)?;
        Ok(self.root.join(COMPONENTS_DIR).join(name).join(version))
    }

    /// Load the index; a missing index is empty
    pub fn load_index(&self) -> Result<RegistryIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(RegistryIndex::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        RegistryIndex::from_json(&content)
    }

    /// Read a published manifest
    pub fn read_manifest(&self, name: &str, version: &str) -> Result<Manifest> {
        let path = self.version_dir(name, version)?.join(MANIFEST_FILE_NAME);
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        Manifest::from_json(&content)
    }

    /// Read a published archive
    pub fn read_archive(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        let path = self.version_dir(name, version)?.join(ARCHIVE_FILE_NAME);
        fs::read(&path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))
    }

    /// Read health.json
    pub fn read_health(&self) -> Result<Health> {
        let path = self.health_path();
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Publish a component version
    ///
    /// The archive digest is attached to the manifest before it is written.
    /// If the version already exists, its immutable fields must be equal to
    /// the new ones; otherwise nothing is written.
    pub fn publish(
        &self,
        manifest: &Manifest,
        archive: &ComponentArchive,
    ) -> Result<PublishOutcome> {
        let mut manifest = manifest.clone();
        manifest.attach_archive(&archive.integrity);
        manifest.validate()?;

        let dir = self.version_dir(&manifest.name, &manifest.version)?;
        let manifest_path = dir.join(MANIFEST_FILE_NAME);

        let outcome = if manifest_path.exists() {
            let existing = self.read_manifest(&manifest.name, &manifest.version)?;
            if let Some(field) = existing
                .immutable_fields()
                .first_difference(&manifest.immutable_fields())
            {
                return Err(Error::ImmutableContentChanged {
                    name: manifest.name.clone(),
                    version: manifest.version.clone(),
                    field,
                });
            }
            if existing.created_at.is_some() {
                manifest.created_at = existing.created_at;
            }
            PublishOutcome::Republished
        } else {
            PublishOutcome::Created
        };

        write_atomic(&dir.join(ARCHIVE_FILE_NAME), &archive.bytes)?;
        write_atomic(&manifest_path, manifest.to_json_pretty()?.as_bytes())?;

        let mut index = self.load_index()?;
        index.record(&manifest, Utc::now());
        write_atomic(&self.index_path(), index.to_json_pretty()?.as_bytes())?;

        match outcome {
            PublishOutcome::Created => info!("Published {}@{}", manifest.name, manifest.version),
            PublishOutcome::Republished => debug!(
                "Republished {}@{} (metadata only)",
                manifest.name, manifest.version
            ),
        }
        Ok(outcome)
    }

    /// Write health.json
    pub fn write_health(&self, now: DateTime<Utc>) -> Result<()> {
        let content = serde_json::to_string_pretty(&Health::ok(now))?;
        write_atomic(&self.health_path(), content.as_bytes())
    }

    /// Write the `_headers` rules for static hosting
    pub fn write_headers(&self) -> Result<()> {
        let content = format!(
            "/{index}\n  Cache-Control: {short}\n\n\
             /{components}/*\n  Cache-Control: {long}\n\n\
             /{key}\n  Cache-Control: {long}\n",
            index = INDEX_FILE_NAME,
            components = COMPONENTS_DIR,
            key = PUBLIC_KEY_FILE_NAME,
            short = INDEX_CACHE_CONTROL,
            long = IMMUTABLE_CACHE_CONTROL,
        );
        write_atomic(&self.root.join(HEADERS_FILE_NAME), content.as_bytes())
    }

    /// Check the registry tree for consistency
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();

        let index = match self.load_index() {
            Ok(index) if self.index_path().exists() => index,
            Ok(_) => {
                report.error(INDEX_FILE_NAME, "missing");
                return Ok(report);
            }
            Err(e) => {
                report.error(INDEX_FILE_NAME, e.to_string());
                return Ok(report);
            }
        };
        if index.is_empty() {
            report.warning(INDEX_FILE_NAME, "no components listed");
        }

        for (name, entry) in &index.components {
            if !entry.has_version(&entry.latest) {
                report.error(
                    name,
                    format!("latest {} is not listed in versions", entry.latest),
                );
            }
            for version in &entry.versions {
                report.checked += 1;
                self.verify_version(name, version, &mut report);
            }
        }

        match self.read_health() {
            Ok(health) if health.is_ok() => {}
            Ok(_) => report.warning(HEALTH_FILE_NAME, "expected status \"ok\" and a ts field"),
            Err(e) => report.error(HEALTH_FILE_NAME, e.to_string()),
        }

        match fs::read_to_string(self.root.join(HEADERS_FILE_NAME)) {
            Ok(headers) => {
                if !headers.contains(INDEX_CACHE_CONTROL)
                    || !headers.contains(IMMUTABLE_CACHE_CONTROL)
                {
                    report.warning(HEADERS_FILE_NAME, "cache directives may need adjustment");
                }
            }
            Err(_) => report.warning(HEADERS_FILE_NAME, "missing"),
        }

        let key_path = self.root.join(PUBLIC_KEY_FILE_NAME);
        if key_path.exists() {
            match fs::read_to_string(&key_path) {
                Ok(key) if key.contains("-----BEGIN PUBLIC KEY-----") => {}
                Ok(_) => report.error(PUBLIC_KEY_FILE_NAME, "not in PEM format"),
                Err(e) => report.error(PUBLIC_KEY_FILE_NAME, e.to_string()),
            }
        }

        Ok(report)
    }

    fn verify_version(&self, name: &str, version: &str, report: &mut VerifyReport) {
        let subject = format!("{}@{}", name, version);

        let manifest = match self.read_manifest(name, version) {
            Ok(m) => m,
            Err(e) => {
                report.error(&subject, e.to_string());
                return;
            }
        };
        if manifest.name != name || manifest.version != version {
            report.error(
                &subject,
                format!(
                    "manifest names {}@{}, expected its path",
                    manifest.name, manifest.version
                ),
            );
        }

        let archive = match self.read_archive(name, version) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.error(&subject, e.to_string());
                return;
            }
        };
        let expected = match manifest.archive_integrity() {
            Ok(tag) => tag,
            Err(e) => {
                report.error(&subject, e.to_string());
                return;
            }
        };
        if let Err(e) = verify_bytes(&archive, expected) {
            report.error(&subject, e.to_string());
            return;
        }
        if manifest.checksum.as_deref() != Some(expected) {
            report.warning(&subject, "checksum does not mirror archives.integrity");
        }

        if let Err(e) =
            read_entries(&archive).and_then(|entries| verify_entries(&manifest, &entries))
        {
            report.error(&subject, e.to_string());
        }
    }
}

/// Severity of a verification finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One verification finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub subject: String,
    pub message: String,
}

/// Result of [`RegistryStore::verify`]
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub findings: Vec<Finding>,
    /// Number of component versions checked
    pub checked: usize,
}

impl VerifyReport {
    fn error(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, subject.into(), message.into());
    }

    fn warning(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, subject.into(), message.into());
    }

    fn push(&mut self, severity: Severity, subject: String, message: String) {
        if severity == Severity::Error {
            warn!("{}: {}", subject, message);
        }
        self.findings.push(Finding {
            severity,
            subject,
            message,
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// A published manifest whose immutable fields differ between two trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableChange {
    pub name: String,
    pub version: String,
    pub field: &'static str,
}

/// Compare every versioned manifest present in both registry trees
///
/// Manifests only present in `current` are new and never reported.
pub fn diff_immutable(base: &Path, current: &Path) -> Result<Vec<ImmutableChange>> {
    let base = RegistryStore::new(base);
    let current_root = current.join(COMPONENTS_DIR);
    let mut changes = Vec::new();

    if !current_root.is_dir() {
        return Ok(changes);
    }

    for entry in WalkDir::new(&current_root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            Error::IoError(format!("Failed to walk {}: {}", current_root.display(), e))
        })?;
        if entry.file_name() != MANIFEST_FILE_NAME {
            continue;
        }

        let Some(version_dir) = entry.path().parent() else { continue };
        let Some(name_dir) = version_dir.parent() else { continue };
        let (Some(version), Some(name)) = (
            version_dir.file_name().and_then(|v| v.to_str()),
            name_dir.file_name().and_then(|n| n.to_str()),
        ) else {
            continue;
        };
        if semver::Version::parse(version).is_err() {
            debug!("Skipping non-version directory {}", version_dir.display());
            continue;
        }

        let base_path = base.version_dir(name, version)?.join(MANIFEST_FILE_NAME);
        if !base_path.exists() {
            continue;
        }

        let before = Manifest::from_json(&fs::read_to_string(&base_path)?)?;
        let after = Manifest::from_json(&fs::read_to_string(entry.path())?)?;
        if let Some(field) = before
            .immutable_fields()
            .first_difference(&after.immutable_fields())
        {
            changes.push(ImmutableChange {
                name: name.to_string(),
                version: version.to_string(),
                field,
            });
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::build_archive;
    use crate::component::ComponentSource;
    use crate::manifest::ManifestBuilder;
    use tempfile::TempDir;

    fn source(name: &str, body: &str) -> ComponentSource {
        ComponentSource::from_files(
            name,
            vec![
                ("component.php", body.as_bytes().to_vec()),
                ("styles.css", b".x {}".to_vec()),
            ],
        )
        .unwrap()
    }

    fn publish(
        store: &RegistryStore,
        name: &str,
        version: &str,
        body: &str,
    ) -> Result<PublishOutcome> {
        let source = source(name, body);
        let manifest = ManifestBuilder::new(&source, version).build()?;
        let archive = build_archive(&manifest, &source)?;
        store.publish(&manifest, &archive)
    }

    #[test]
    fn test_publish_writes_layout_and_index() {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path());

        assert_eq!(publish(&store, "Button", "1.0.0", "<?php").unwrap(), PublishOutcome::Created);

        let dir = temp.path().join("components/Button/1.0.0");
        assert!(dir.join("manifest.json").is_file());
        assert!(dir.join("component.zip").is_file());

        let manifest = store.read_manifest("Button", "1.0.0").unwrap();
        let archive = store.read_archive("Button", "1.0.0").unwrap();
        assert!(verify_bytes(&archive, manifest.archive_integrity().unwrap()).is_ok());
        assert_eq!(manifest.checksum.as_deref(), manifest.archive_integrity().ok());

        let index = store.load_index().unwrap();
        let entry = index.get("Button").unwrap();
        assert_eq!(entry.latest, "1.0.0");
        assert_eq!(entry.versions, vec!["1.0.0"]);
    }

    #[test]
    fn test_republish_same_content_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path());

        publish(&store, "Button", "1.0.0", "<?php").unwrap();
        let first = store.read_manifest("Button", "1.0.0").unwrap();

        assert_eq!(
            publish(&store, "Button", "1.0.0", "<?php").unwrap(),
            PublishOutcome::Republished
        );
        let second = store.read_manifest("Button", "1.0.0").unwrap();

        assert_eq!(first.immutable_fields(), second.immutable_fields());
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.load_index().unwrap().get("Button").unwrap().versions.len(), 1);
    }

    #[test]
    fn test_changed_content_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path());

        publish(&store, "Button", "1.0.0", "<?php").unwrap();
        let before = store.read_archive("Button", "1.0.0").unwrap();

        let err = publish(&store, "Button", "1.0.0", "<?php echo 'changed';").unwrap_err();
        assert!(matches!(
            err,
            Error::ImmutableContentChanged { ref name, ref version, field: "files" }
                if name == "Button" && version == "1.0.0"
        ));

        // Nothing was rewritten
        assert_eq!(store.read_archive("Button", "1.0.0").unwrap(), before);
    }

    #[test]
    fn test_new_version_extends_index() {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path());

        publish(&store, "Button", "1.0.0", "<?php").unwrap();
        publish(&store, "Button", "1.1.0", "<?php echo 1;").unwrap();
        publish(&store, "Card", "1.0.0", "<?php").unwrap();

        let index = store.load_index().unwrap();
        assert_eq!(index.len(), 2);
        let button = index.get("Button").unwrap();
        assert_eq!(button.versions, vec!["1.0.0", "1.1.0"]);
        assert_eq!(button.latest, "1.1.0");
    }

    #[test]
    fn test_verify_clean_registry() {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path());
        publish(&store, "Button", "1.0.0", "<?php").unwrap();
        store.write_health(Utc::now()).unwrap();
        store.write_headers().unwrap();

        let report = store.verify().unwrap();
        assert!(report.is_ok(), "{:?}", report.findings);
        assert_eq!(report.checked, 1);
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn test_verify_detects_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let store = RegistryStore::new(temp.path());
        publish(&store, "Button", "1.0.0", "<?php").unwrap();
        store.write_health(Utc::now()).unwrap();

        fs::write(temp.path().join("components/Button/1.0.0/component.zip"), b"junk").unwrap();
        fs::write(temp.path().join(PUBLIC_KEY_FILE_NAME), b"not a key").unwrap();

        let report = store.verify().unwrap();
        let subjects: Vec<&str> = report.errors().map(|f| f.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Button@1.0.0", PUBLIC_KEY_FILE_NAME]);
        // _headers was never written
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_verify_missing_index() {
        let temp = TempDir::new().unwrap();
        let report = RegistryStore::new(temp.path()).verify().unwrap();
        assert!(!report.is_ok());
    }

    #[test]
    fn test_diff_immutable_reports_changes() {
        let base = TempDir::new().unwrap();
        let current = TempDir::new().unwrap();

        publish(&RegistryStore::new(base.path()), "Button", "1.0.0", "<?php").unwrap();
        publish(&RegistryStore::new(base.path()), "Card", "1.0.0", "<?php").unwrap();

        publish(&RegistryStore::new(current.path()), "Button", "1.0.0", "<?php echo 2;").unwrap();
        publish(&RegistryStore::new(current.path()), "Card", "1.0.0", "<?php").unwrap();
        publish(&RegistryStore::new(current.path()), "Badge", "1.0.0", "<?php").unwrap();

        let changes = diff_immutable(base.path(), current.path()).unwrap();
        assert_eq!(
            changes,
            vec![ImmutableChange {
                name: "Button".to_string(),
                version: "1.0.0".to_string(),
                field: "files",
            }]
        );
    }
}
