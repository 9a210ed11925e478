// src/commands/verify.rs
//! `verify` and `check-immutable` commands

use anyhow::{bail, Result};
use std::path::Path;
use wpsyde::registry::{diff_immutable, RegistryStore, Severity};

pub fn cmd_verify(dir: &Path) -> Result<()> {
    let report = RegistryStore::new(dir).verify()?;

    for finding in &report.findings {
        match finding.severity {
            Severity::Error => eprintln!("  error: {}: {}", finding.subject, finding.message),
            Severity::Warning => eprintln!("  warning: {}: {}", finding.subject, finding.message),
        }
    }

    let errors = report.errors().count();
    if errors > 0 {
        bail!("Registry verification failed with {} error(s)", errors);
    }
    println!(
        "Registry OK: {} version(s) checked, {} warning(s)",
        report.checked,
        report.warnings().count()
    );
    Ok(())
}

pub fn cmd_check_immutable(base: &Path, current: &Path) -> Result<()> {
    let changes = diff_immutable(base, current)?;
    if changes.is_empty() {
        println!("No published versions changed");
        return Ok(());
    }

    for change in &changes {
        eprintln!(
            "  {}@{}: {} changed",
            change.name, change.version, change.field
        );
    }
    bail!(
        "{} published version(s) changed; bump the version instead",
        changes.len()
    );
}
