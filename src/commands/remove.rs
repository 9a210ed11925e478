// src/commands/remove.rs
//! `remove` command

use anyhow::Result;
use std::path::Path;
use wpsyde::install::{remove, RemoveOutcome, StateFile};

use super::progress::ConsoleReporter;

pub fn cmd_remove(config: &Path, name: &str) -> Result<()> {
    let mut state = StateFile::load(config)?;
    match remove(&mut state, name, &ConsoleReporter)? {
        RemoveOutcome::Removed { version, .. } => println!("Removed {}@{}", name, version),
        RemoveOutcome::NotInstalled => {}
    }
    Ok(())
}
