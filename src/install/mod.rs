// src/install/mod.rs

//! Installing components into a project
//!
//! - [`state`]: the project's `wpsyde.json`
//! - [`reporter`]: injected output and confirmation
//! - [`installer`]: the install / remove state machine

pub mod installer;
pub mod reporter;
pub mod state;

pub use installer::{
    remove, BatchItem, BatchReport, InstallOutcome, InstallPhase, Installer, RemoveOutcome,
};
pub use reporter::{Confirm, LogReporter, RecordingReporter, ReportEvent, Reporter};
pub use state::{InitOutcome, InstalledComponent, ProjectConfig, StateFile, STATE_FILE_NAME};
