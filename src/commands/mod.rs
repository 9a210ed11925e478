// src/commands/mod.rs
//! Command handlers for the wpsyde CLI

mod add;
mod completions;
mod health;
mod init;
mod list;
mod package;
pub mod progress;
mod remove;
#[cfg(feature = "server")]
mod serve;
mod verify;

pub use add::cmd_add;
pub use completions::cmd_completions;
pub use health::cmd_health;
pub use init::cmd_init;
pub use list::cmd_list;
pub use package::cmd_package;
pub use remove::cmd_remove;
#[cfg(feature = "server")]
pub use serve::cmd_serve;
pub use verify::{cmd_check_immutable, cmd_verify};

use anyhow::Result;
use std::path::Path;
use wpsyde::install::StateFile;
use wpsyde::registry::{open_registry, RegistrySource, DEFAULT_REGISTRY};

/// Open the registry for a command
///
/// `--registry` wins, then the state file, then the default registry.
pub(crate) fn registry_for(
    config: &Path,
    registry: Option<&str>,
) -> Result<Box<dyn RegistrySource>> {
    let location = match registry {
        Some(location) => location.to_string(),
        None if config.exists() => StateFile::load(config)?.registry_location(),
        None => DEFAULT_REGISTRY.to_string(),
    };
    tracing::debug!("Using registry {}", location);
    Ok(open_registry(&location)?)
}
