// src/registry/index.rs

//! Registry index (index.json)

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index file name at the registry root
pub const INDEX_FILE_NAME: &str = "index.json";

/// Per-component index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub latest: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IndexEntry {
    /// Whether `version` was ever published
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

/// The registry index: component name to entry, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryIndex {
    #[serde(default)]
    pub components: BTreeMap<String, IndexEntry>,
}

impl RegistryIndex {
    /// Parse an index from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| {
                Error::InvalidManifest(format!("Failed to parse {}: {}", INDEX_FILE_NAME, e))
            })
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.components.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Record a published manifest
    ///
    /// `latest` moves to the published version, the version is appended if
    /// absent, the description is overwritten. Versions are never dropped.
    pub fn record(&mut self, manifest: &Manifest, now: DateTime<Utc>) {
        let entry = self
            .components
            .entry(manifest.name.clone())
            .or_insert_with(|| IndexEntry {
                latest: manifest.version.clone(),
                versions: Vec::new(),
                description: String::new(),
                updated_at: None,
            });

        entry.latest = manifest.version.clone();
        if !entry.has_version(&manifest.version) {
            entry.versions.push(manifest.version.clone());
        }
        entry.description = manifest.description.clone();
        entry.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentSource;
    use crate::manifest::ManifestBuilder;

    fn manifest(name: &str, version: &str, description: &str) -> Manifest {
        let source =
            ComponentSource::from_files(name, vec![("component.php", b"<?php".to_vec())]).unwrap();
        ManifestBuilder::new(&source, version)
            .description(description)
            .build()
            .unwrap()
    }

    #[test]
    fn test_record_appends_versions() {
        let mut index = RegistryIndex::default();
        index.record(&manifest("Button", "1.0.0", "Buttons"), Utc::now());
        index.record(&manifest("Button", "1.1.0", "Buttons, now with icons"), Utc::now());
        index.record(&manifest("Button", "1.0.0", "Buttons again"), Utc::now());

        let entry = index.get("Button").unwrap();
        assert_eq!(entry.versions, vec!["1.0.0", "1.1.0"]);
        assert_eq!(entry.latest, "1.0.0");
        assert_eq!(entry.description, "Buttons again");
        assert!(entry.updated_at.is_some());
    }

    #[test]
    fn test_parse_published_index() {
        let json = r#"{
            "components": {
                "Card": {
                    "latest": "1.0.0",
                    "versions": ["1.0.0"],
                    "description": "Card component for WordPress",
                    "updatedAt": "2025-01-15T10:00:00.000Z"
                },
                "Button": { "latest": "2.0.0", "versions": ["1.0.0", "2.0.0"] }
            }
        }"#;
        let index = RegistryIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 2);
        // BTreeMap keeps names sorted
        let names: Vec<&String> = index.components.keys().collect();
        assert_eq!(names, vec!["Button", "Card"]);
        assert!(index.get("Button").unwrap().has_version("1.0.0"));
        assert_eq!(index.get("Button").unwrap().description, "");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RegistryIndex::from_json("<!doctype html>").is_err());
    }
}
