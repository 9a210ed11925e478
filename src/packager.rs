// src/packager.rs

//! Building a registry from a components source tree
//!
//! Scans `<components_dir>/<Name>/`, builds a manifest and a deterministic
//! archive for every component, and publishes them into a registry store.
//! The first failing component aborts the run.

use crate::archive::build_archive;
use crate::component::{validate_version, ComponentSource, LogicalFile};
use crate::error::{Error, Result};
use crate::manifest::ManifestBuilder;
use crate::registry::{PublishOutcome, RegistryStore};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options for a packaging run
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Source tree holding one directory per component
    pub components_dir: PathBuf,
    /// Registry directory to publish into
    pub registry_dir: PathBuf,
    /// Version stamped on every packaged component
    pub version: String,
    /// Restrict to these component names
    pub only: Option<Vec<String>>,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            components_dir: PathBuf::from("components"),
            registry_dir: PathBuf::from("registry"),
            version: "1.0.0".to_string(),
            only: None,
        }
    }
}

/// One published component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedComponent {
    pub name: String,
    pub version: String,
    pub outcome: PublishOutcome,
}

/// Result of a packaging run
#[derive(Debug, Clone, Default)]
pub struct PackageReport {
    pub packaged: Vec<PackagedComponent>,
    /// Directories skipped for lacking a primary template
    pub skipped: Vec<String>,
}

/// Component directories under `components_dir`, sorted by name
fn component_dirs(components_dir: &Path) -> Result<Vec<PathBuf>> {
    if !components_dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Components directory not found: {}",
            components_dir.display()
        )));
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(components_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Package components and publish them into the registry
pub fn package_components(options: &PackageOptions) -> Result<PackageReport> {
    validate_version(&options.version)?;

    let mut dirs = component_dirs(&options.components_dir)?;
    if let Some(only) = &options.only {
        dirs.retain(|dir| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| only.iter().any(|o| o == n))
        });
        if dirs.is_empty() {
            return Err(Error::InvalidInput(format!(
                "No components found matching: {}",
                only.join(", ")
            )));
        }
    }

    let store = RegistryStore::new(&options.registry_dir);
    let mut report = PackageReport::default();

    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !dir.join(LogicalFile::Component.file_name()).is_file() {
            warn!("Skipping {}: no {}", dir.display(), LogicalFile::Component.file_name());
            report.skipped.push(name);
            continue;
        }

        info!("Packaging {}@{}", name, options.version);
        let source = ComponentSource::load(&dir)?;
        let manifest = ManifestBuilder::new(&source, options.version.clone()).build()?;
        let archive = build_archive(&manifest, &source)?;
        let outcome = store.publish(&manifest, &archive)?;

        report.packaged.push(PackagedComponent {
            name,
            version: options.version.clone(),
            outcome,
        });
    }

    if report.packaged.is_empty() {
        return Err(Error::InvalidInput(format!(
            "No components found in {}",
            options.components_dir.display()
        )));
    }

    store.write_health(Utc::now())?;
    store.write_headers()?;
    info!(
        "Packaged {} components into {}",
        report.packaged.len(),
        options.registry_dir.display()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_component(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    fn options(temp: &TempDir) -> PackageOptions {
        PackageOptions {
            components_dir: temp.path().join("components"),
            registry_dir: temp.path().join("registry"),
            ..PackageOptions::default()
        }
    }

    #[test]
    fn test_package_all_components() {
        let temp = TempDir::new().unwrap();
        let components = temp.path().join("components");
        write_component(
            &components,
            "Button",
            &[("component.php", "<?php"), ("README.md", "# Button\n")],
        );
        write_component(
            &components,
            "Card",
            &[("component.php", "<?php"), ("styles.css", ".card{}")],
        );
        write_component(&components, "Layout", &[("Container.php", "<?php")]);

        let report = package_components(&options(&temp)).unwrap();
        let names: Vec<&str> = report.packaged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Button", "Card"]);
        assert_eq!(report.skipped, vec!["Layout"]);

        let store = RegistryStore::new(temp.path().join("registry"));
        let index = store.load_index().unwrap();
        assert_eq!(index.get("Button").unwrap().description, "Button");
        assert_eq!(index.get("Card").unwrap().description, "Card component for WordPress");
        assert!(store.read_health().unwrap().is_ok());
        assert!(store.verify().unwrap().is_ok());
    }

    #[test]
    fn test_package_only_filter() {
        let temp = TempDir::new().unwrap();
        let components = temp.path().join("components");
        write_component(&components, "Button", &[("component.php", "<?php")]);
        write_component(&components, "Card", &[("component.php", "<?php")]);

        let mut opts = options(&temp);
        opts.only = Some(vec!["Card".to_string()]);
        let report = package_components(&opts).unwrap();
        assert_eq!(report.packaged.len(), 1);
        assert_eq!(report.packaged[0].name, "Card");

        opts.only = Some(vec!["Nope".to_string()]);
        assert!(matches!(package_components(&opts), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_repackage_is_idempotent_and_guarded() {
        let temp = TempDir::new().unwrap();
        let components = temp.path().join("components");
        write_component(&components, "Button", &[("component.php", "<?php")]);

        package_components(&options(&temp)).unwrap();
        let again = package_components(&options(&temp)).unwrap();
        assert_eq!(again.packaged[0].outcome, PublishOutcome::Republished);

        fs::write(components.join("Button/component.php"), "<?php echo 'edited';").unwrap();
        let err = package_components(&options(&temp)).unwrap_err();
        assert!(matches!(err, Error::ImmutableContentChanged { field: "files", .. }));

        let mut bumped = options(&temp);
        bumped.version = "1.0.1".to_string();
        package_components(&bumped).unwrap();
    }

    #[test]
    fn test_empty_tree_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("components")).unwrap();
        assert!(package_components(&options(&temp)).is_err());
        assert!(package_components(&PackageOptions {
            components_dir: temp.path().join("missing"),
            ..options(&temp)
        })
        .is_err());
    }
}
