// src/commands/health.rs
//! `health` command

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::registry_for;

pub fn cmd_health(config: &Path, registry: Option<&str>) -> Result<()> {
    let source = registry_for(config, registry)?;
    println!("Checking {}", source.location());

    let index = source.fetch_index().context("Registry index check failed")?;
    println!("  index.json: ok ({} components)", index.len());

    let Some((name, entry)) = index.components.iter().next() else {
        bail!("Registry index at {} lists no components", source.location());
    };

    source
        .fetch_manifest(name, &entry.latest)
        .with_context(|| format!("Manifest check failed for {}@{}", name, entry.latest))?;
    println!("  components/{}/{}/manifest.json: ok", name, entry.latest);

    match source.fetch_health() {
        Ok(health) if health.is_ok() => println!("  health.json: ok"),
        Ok(health) => eprintln!("Warning: health.json reports status \"{}\"", health.status),
        Err(e) => eprintln!("Warning: health.json unavailable: {}", e),
    }

    println!("Registry is healthy");
    Ok(())
}
