// src/commands/add.rs
//! `add` command

use anyhow::{bail, Result};
use std::path::Path;
use wpsyde::component::VersionRequest;
use wpsyde::install::{BatchReport, Confirm, Installer, StateFile};
use wpsyde::registry::open_registry;

use super::progress::{ConsoleConfirm, ConsoleReporter};

/// Split `add` arguments into names and a version
///
/// A trailing `X.Y.Z` or `latest` applies to every name.
fn split_version(args: &[String]) -> Result<(&[String], VersionRequest)> {
    match args.split_last() {
        Some((last, names))
            if !names.is_empty()
                && (VersionRequest::looks_like_version(last) || last == "latest") =>
        {
            Ok((names, VersionRequest::parse(last)?))
        }
        _ => Ok((args, VersionRequest::Latest)),
    }
}

/// Usage hint printed after successful installs
fn usage_hint(name: &str) -> String {
    format!(
        "get_template_part('template-parts/components/{}/{}');",
        name,
        name.to_lowercase()
    )
}

pub fn cmd_add(
    config: &Path,
    registry: Option<&str>,
    names: &[String],
    all: bool,
    yes: bool,
) -> Result<()> {
    if !all && names.is_empty() {
        bail!("Specify at least one component name, or --all");
    }

    let mut state = StateFile::load(config)?;
    let location = registry
        .map(str::to_string)
        .unwrap_or_else(|| state.registry_location());
    let source = open_registry(&location)?;
    let reporter = ConsoleReporter;
    let installer = Installer::new(source.as_ref(), &reporter);

    let report = if all {
        let confirm: Box<dyn Confirm> = if yes {
            Box::new(|_: &str| true)
        } else {
            Box::new(ConsoleConfirm)
        };
        match installer.install_all(&mut state, confirm.as_ref())? {
            Some(report) => report,
            None => return Ok(()),
        }
    } else {
        let (names, request) = split_version(names)?;
        installer.install_many(&mut state, names, &request)
    };

    print_summary(&report);
    if !report.is_success() {
        bail!("{} component(s) failed to install", report.failed().count());
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let installed: Vec<_> = report.succeeded().collect();
    if !installed.is_empty() {
        println!();
        println!("Installed {} component(s):", installed.len());
        for outcome in &installed {
            println!("  {}@{} -> {}", outcome.name, outcome.version, outcome.path.display());
        }
        println!();
        println!("Next steps:");
        for outcome in &installed {
            println!("  {}", usage_hint(&outcome.name));
        }
    }

    let failed: Vec<_> = report.failed().collect();
    if !failed.is_empty() {
        eprintln!();
        eprintln!("Failed {} component(s):", failed.len());
        for (name, error) in failed {
            eprintln!("  {} [{}]: {}", name, error.kind(), error);
        }
    }
}
