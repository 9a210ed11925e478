// src/manifest.rs

//! Component manifests (manifest.json)
//!
//! One manifest describes one published component version: its files with
//! per-file integrity, the archive locator and digest, and free-form metadata.
//!
//! The content-bearing fields (`version`, `files`, `archives`, `checksum`,
//! `signature`) are immutable once a version is published; see
//! [`Manifest::immutable_fields`].

use crate::component::{archive_prefix, validate_name, validate_version, ComponentSource};
use crate::error::{Error, Result};
use crate::hash::Integrity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the archive inside a version directory
pub const ARCHIVE_FILE_NAME: &str = "component.zip";

/// File name of the manifest inside a version directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// A file entry of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Path inside the archive
    #[serde(rename = "path", alias = "sourcePath")]
    pub source_path: String,
    /// Destination-facing path (after renaming)
    #[serde(rename = "dest", alias = "destPath")]
    pub dest_path: String,
    /// Integrity tag of the file content
    pub integrity: String,
}

/// Archive locator and digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    /// Archive locator, relative to the version directory
    pub zip: String,
    /// Integrity tag of the archive bytes
    pub integrity: String,
}

/// Component manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub files: Vec<ManifestFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archives: Option<ArchiveRef>,

    /// Top-level digest, mirrors `archives.integrity`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// Reserved for future signing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pro: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The content-bearing subset of a manifest
///
/// Two manifests for the same (name, version) must have equal immutable
/// fields; everything else is metadata.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ImmutableFields<'a> {
    pub version: &'a str,
    pub files: &'a [ManifestFile],
    pub archives: Option<&'a ArchiveRef>,
    pub checksum: Option<&'a str>,
    pub signature: Option<&'a str>,
}

impl<'a> ImmutableFields<'a> {
    /// Name of the first field that differs, if any
    pub fn first_difference(&self, other: &ImmutableFields<'_>) -> Option<&'static str> {
        if self.version != other.version {
            Some("version")
        } else if self.files != other.files {
            Some("files")
        } else if self.archives != other.archives {
            Some("archives")
        } else if self.checksum != other.checksum {
            Some("checksum")
        } else if self.signature != other.signature {
            Some("signature")
        } else {
            None
        }
    }
}

impl Manifest {
    /// Parse and validate a manifest from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)
            .map_err(|e| Error::InvalidManifest(format!("Failed to parse manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize to pretty JSON (two-space indent)
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate names, versions, paths and integrity tags
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
            .map_err(|e| Error::InvalidManifest(format!("name: {}", e)))?;
        validate_version(&self.version)
            .map_err(|e| Error::InvalidManifest(format!("{}: version: {}", self.name, e)))?;

        if self.files.is_empty() {
            return Err(Error::InvalidManifest(format!(
                "{}@{}: manifest lists no files",
                self.name, self.version
            )));
        }

        let prefix = archive_prefix(&self.name);
        for file in &self.files {
            for (field, path) in [("path", &file.source_path), ("dest", &file.dest_path)] {
                let relative = path.strip_prefix(&prefix).ok_or_else(|| {
                    Error::InvalidManifest(format!(
                        "{}@{}: files[].{} '{}' is outside {}",
                        self.name, self.version, field, path, prefix
                    ))
                })?;
                if relative.is_empty()
                    || relative.starts_with('/')
                    || relative.split('/').any(|seg| seg == ".." || seg.is_empty())
                {
                    return Err(Error::InvalidManifest(format!(
                        "{}@{}: files[].{} '{}' is not a clean relative path",
                        self.name, self.version, field, path
                    )));
                }
            }
            Integrity::parse(&file.integrity).map_err(|e| {
                Error::InvalidManifest(format!(
                    "{}@{}: integrity of {}: {}",
                    self.name, self.version, file.source_path, e
                ))
            })?;
        }

        if let Some(archives) = &self.archives {
            Integrity::parse(&archives.integrity).map_err(|e| {
                Error::InvalidManifest(format!(
                    "{}@{}: archives.integrity: {}",
                    self.name, self.version, e
                ))
            })?;
        }
        if let Some(checksum) = &self.checksum {
            Integrity::parse(checksum).map_err(|e| {
                Error::InvalidManifest(format!("{}@{}: checksum: {}", self.name, self.version, e))
            })?;
        }

        for dep in &self.dependencies {
            validate_name(dep).map_err(|e| {
                Error::InvalidManifest(format!("{}@{}: dependency: {}", self.name, self.version, e))
            })?;
        }

        Ok(())
    }

    /// The immutable subset of this manifest
    pub fn immutable_fields(&self) -> ImmutableFields<'_> {
        ImmutableFields {
            version: &self.version,
            files: &self.files,
            archives: self.archives.as_ref(),
            checksum: self.checksum.as_deref(),
            signature: self.signature.as_deref(),
        }
    }

    /// Record the archive digest (also mirrored into `checksum`)
    pub fn attach_archive(&mut self, integrity: &Integrity) {
        let tag = integrity.to_string();
        self.archives = Some(ArchiveRef {
            zip: ARCHIVE_FILE_NAME.to_string(),
            integrity: tag.clone(),
        });
        self.checksum = Some(tag);
    }

    /// The archive digest, required before a manifest can be installed
    pub fn archive_integrity(&self) -> Result<&str> {
        self.archives
            .as_ref()
            .map(|a| a.integrity.as_str())
            .ok_or_else(|| {
                Error::InvalidManifest(format!(
                    "{}@{}: manifest has no archive digest",
                    self.name, self.version
                ))
            })
    }

    /// Find the file entry for an archive path
    pub fn file(&self, source_path: &str) -> Option<&ManifestFile> {
        self.files.iter().find(|f| f.source_path == source_path)
    }
}

/// Builds a manifest from a component's file set
///
/// Pure: hashes the in-memory file contents and applies the rename table.
pub struct ManifestBuilder<'a> {
    source: &'a ComponentSource,
    version: String,
    description: Option<String>,
}

impl<'a> ManifestBuilder<'a> {
    /// Create a builder for `source` at `version`
    pub fn new(source: &'a ComponentSource, version: impl Into<String>) -> Self {
        Self {
            source,
            version: version.into(),
            description: None,
        }
    }

    /// Override the description (defaults to the README heading)
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the manifest
    pub fn build(self) -> Result<Manifest> {
        validate_version(&self.version)?;

        let name = &self.source.name;
        let prefix = archive_prefix(name);

        let files = self
            .source
            .files
            .iter()
            .map(|file| ManifestFile {
                source_path: format!("{}{}", prefix, file.logical.file_name()),
                dest_path: format!("{}{}", prefix, file.logical.dest_name(name)),
                integrity: Integrity::sha256(&file.content).to_string(),
            })
            .collect();

        let now = Utc::now();
        Ok(Manifest {
            name: name.clone(),
            version: self.version,
            description: self.description.unwrap_or_else(|| self.source.description()),
            files,
            archives: None,
            checksum: None,
            signature: None,
            dependencies: Vec::new(),
            pro: false,
            author: None,
            license: None,
            repository: None,
            keywords: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        })
    }
}
