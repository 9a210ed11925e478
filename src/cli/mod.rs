// src/cli/mod.rs
//! CLI definitions for wpsyde
//!
//! Project commands work against the `wpsyde.json` in the current directory:
//! - `init` - Create the state file
//! - `list` - List registry components
//! - `add` - Install one or more components (or `--all`)
//! - `remove` - Remove an installed component
//! - `health` - Check the registry
//!
//! Registry maintenance:
//! - `package` - Build a registry from a components tree
//! - `verify` - Check a registry directory
//! - `check-immutable` - Compare two registry trees
//! - `serve` - Serve a registry directory locally

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wpsyde")]
#[command(author = "WPSyde Contributors")]
#[command(version)]
#[command(
    about = "Versioned, integrity-checked component registry and installer for WordPress themes",
    long_about = None
)]
pub struct Cli {
    /// Project state file
    #[arg(short, long, global = true, default_value = "wpsyde.json")]
    pub config: PathBuf,

    /// Registry URL or directory, overriding the state file
    #[arg(long, global = true)]
    pub registry: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create wpsyde.json in the current directory
    Init,

    /// List components available in the registry
    List,

    /// Install components into the theme
    Add {
        /// Component names; a trailing X.Y.Z pins the version
        names: Vec<String>,

        /// Install every component in the registry
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Skip the confirmation prompt for --all
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove an installed component
    Remove {
        /// Component name
        name: String,
    },

    /// Check that the registry is reachable and serving JSON
    Health,

    /// Package a components tree into a registry
    Package {
        /// Directory holding one folder per component
        #[arg(long, default_value = "components")]
        components_dir: PathBuf,

        /// Registry directory to publish into
        #[arg(long, default_value = "registry")]
        registry_dir: PathBuf,

        /// Version to publish
        #[arg(long = "version", default_value = "1.0.0")]
        pkg_version: String,

        /// Only package these components (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<String>>,
    },

    /// Verify the structure and integrity of a registry directory
    Verify {
        /// Registry directory
        #[arg(default_value = "registry")]
        dir: PathBuf,
    },

    /// Fail if any published version changed between two registry trees
    CheckImmutable {
        /// Registry tree before the change
        base: PathBuf,

        /// Registry tree after the change
        #[arg(default_value = "registry")]
        current: PathBuf,
    },

    /// Serve a registry directory over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:3001")]
        bind: String,

        /// Registry directory
        #[arg(long, default_value = "registry")]
        dir: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
