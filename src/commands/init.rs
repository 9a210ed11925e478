// src/commands/init.rs
//! `init` command

use anyhow::Result;
use std::path::Path;
use wpsyde::install::{InitOutcome, StateFile};

pub fn cmd_init(config: &Path) -> Result<()> {
    match StateFile::init(config)? {
        InitOutcome::Created => {
            let state = StateFile::load(config)?;
            println!("Created {}", config.display());
            println!("  Registry:   {}", state.config.registry);
            println!("  Components: {}", state.config.components_dir);
        }
        InitOutcome::AlreadyExists => {
            eprintln!("Warning: {} already exists, leaving it unchanged", config.display());
        }
    }
    Ok(())
}
