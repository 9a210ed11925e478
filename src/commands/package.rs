// src/commands/package.rs
//! `package` command

use anyhow::{Context, Result};
use std::path::PathBuf;
use wpsyde::packager::{package_components, PackageOptions};
use wpsyde::registry::PublishOutcome;

pub fn cmd_package(
    components_dir: PathBuf,
    registry_dir: PathBuf,
    version: String,
    only: Option<Vec<String>>,
) -> Result<()> {
    let options = PackageOptions {
        components_dir,
        registry_dir,
        version,
        only,
    };
    let report = package_components(&options).context("Packaging failed")?;

    for item in &report.packaged {
        let note = match item.outcome {
            PublishOutcome::Created => "",
            PublishOutcome::Republished => " (unchanged)",
        };
        println!("  {}@{}{}", item.name, item.version, note);
    }
    for name in &report.skipped {
        eprintln!("Warning: skipped {} (no component.php)", name);
    }
    println!(
        "Packaged {} component(s) into {}",
        report.packaged.len(),
        options.registry_dir.display()
    );
    Ok(())
}
