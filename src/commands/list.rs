// src/commands/list.rs
//! `list` command

use anyhow::{Context, Result};
use std::path::Path;

use super::registry_for;

pub fn cmd_list(config: &Path, registry: Option<&str>) -> Result<()> {
    let source = registry_for(config, registry)?;
    let index = source
        .fetch_index()
        .with_context(|| format!("Failed to list components from {}", source.location()))?;

    if index.is_empty() {
        println!("No components available in {}", source.location());
        return Ok(());
    }

    println!("Available components ({}):", index.len());
    for (name, entry) in &index.components {
        println!("  {} {}", name, entry.latest);
        if !entry.description.is_empty() {
            println!("    {}", entry.description);
        }
        if entry.versions.len() > 1 {
            println!("    versions: {}", entry.versions.join(", "));
        }
    }
    Ok(())
}
