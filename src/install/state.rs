// src/install/state.rs

//! Project state file (wpsyde.json)
//!
//! Holds the registry location, the theme directories and the set of
//! installed components. Created by `init`, mutated by `add`/`remove`.
//! Relative directories are resolved against the directory holding the file.

use crate::error::{Error, Result};
use crate::registry::store::write_atomic;
use crate::registry::DEFAULT_REGISTRY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default state file name
pub const STATE_FILE_NAME: &str = "wpsyde.json";

/// One installed component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledComponent {
    pub version: String,
    pub installed_at: DateTime<Utc>,
}

fn default_registry() -> String {
    DEFAULT_REGISTRY.to_string()
}

fn default_theme_path() -> String {
    "theme".to_string()
}

fn default_components_dir() -> String {
    "theme/template-parts/components".to_string()
}

fn default_blocks_dir() -> String {
    "theme/template-parts/blocks".to_string()
}

fn default_acf_json_dir() -> String {
    "acf-json".to_string()
}

fn default_channels() -> Vec<String> {
    vec!["stable".to_string()]
}

/// Contents of wpsyde.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default = "default_registry")]
    pub registry: String,
    #[serde(default = "default_theme_path")]
    pub theme_path: String,
    #[serde(default = "default_components_dir")]
    pub components_dir: String,
    #[serde(default = "default_blocks_dir")]
    pub blocks_dir: String,
    #[serde(default = "default_acf_json_dir")]
    pub acf_json_dir: String,
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub installed: BTreeMap<String, InstalledComponent>,
    /// Keys this version does not know about, kept on save
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            theme_path: default_theme_path(),
            components_dir: default_components_dir(),
            blocks_dir: default_blocks_dir(),
            acf_json_dir: default_acf_json_dir(),
            channels: default_channels(),
            installed: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// What `init` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyExists,
}

/// A loaded state file and where it lives
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
    pub config: ProjectConfig,
}

impl StateFile {
    /// Write a default state file unless one exists
    pub fn init(path: &Path) -> Result<InitOutcome> {
        if path.exists() {
            return Ok(InitOutcome::AlreadyExists);
        }
        let state = Self {
            path: path.to_path_buf(),
            config: ProjectConfig::default(),
        };
        state.save()?;
        Ok(InitOutcome::Created)
    }

    /// Load an existing state file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigError(format!(
                "{} not found. Run `wpsyde init` first",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: ProjectConfig = serde_json::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))?;
        debug!(
            "Loaded {} ({} installed components)",
            path.display(),
            config.installed.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// Persist to disk (two-space indented JSON)
    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.config)?;
        content.push('\n');
        write_atomic(&self.path, content.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the state file lives in
    fn base_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn resolve(&self, dir: &str) -> PathBuf {
        let dir = Path::new(dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.base_dir().join(dir)
        }
    }

    /// Resolved components directory
    pub fn components_dir(&self) -> PathBuf {
        self.resolve(&self.config.components_dir)
    }

    /// Resolved install directory of one component
    pub fn component_dir(&self, name: &str) -> PathBuf {
        self.components_dir().join(name)
    }

    /// Registry location, resolved like the directories when it is a path
    pub fn registry_location(&self) -> String {
        let registry = self.config.registry.trim();
        if registry.contains("://") || Path::new(registry).is_absolute() {
            registry.to_string()
        } else {
            self.resolve(registry).display().to_string()
        }
    }

    pub fn installed(&self, name: &str) -> Option<&InstalledComponent> {
        self.config.installed.get(name)
    }

    pub(crate) fn record_install(&mut self, name: &str, version: &str, now: DateTime<Utc>) {
        self.config.installed.insert(
            name.to_string(),
            InstalledComponent {
                version: version.to_string(),
                installed_at: now,
            },
        );
    }

    pub(crate) fn forget(&mut self, name: &str) -> Option<InstalledComponent> {
        self.config.installed.remove(name)
    }
}
