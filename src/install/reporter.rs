// src/install/reporter.rs

//! Injected output and confirmation
//!
//! The installer never prints. It reports phase transitions and messages to
//! a [`Reporter`], asks a [`Confirm`] before bulk installs, and obtains
//! download progress trackers from the reporter.

use crate::progress::{CallbackProgress, LogProgress, ProgressEvent, ProgressTracker};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::installer::InstallPhase;

/// Receiver of installer events
pub trait Reporter {
    /// A component entered a new phase
    fn phase(&self, name: &str, phase: &InstallPhase);

    /// Informational message
    fn info(&self, message: &str);

    /// Non-fatal problem
    fn warn(&self, message: &str);

    /// Progress tracker for downloading `name`
    fn download_progress(&self, name: &str) -> Box<dyn ProgressTracker>;
}

/// Approves or declines an operation
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Reporter that forwards everything to tracing
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn phase(&self, name: &str, phase: &InstallPhase) {
        match phase {
            InstallPhase::Failed(reason) => warn!("{}: failed: {}", name, reason),
            other => info!("{}: {}", name, other),
        }
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn download_progress(&self, name: &str) -> Box<dyn ProgressTracker> {
        Box::new(LogProgress::new(name))
    }
}

/// An event captured by [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Phase { name: String, phase: InstallPhase },
    Info(String),
    Warn(String),
    Download { name: String, event: ProgressEvent },
}

/// Reporter that records events, for tests and embedding
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Phases recorded for one component, in order
    pub fn phases(&self, name: &str) -> Vec<InstallPhase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Phase { name: n, phase } if n == name => Some(phase),
                _ => None,
            })
            .collect()
    }

    /// Recorded warnings
    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Warn(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Download progress recorded for one component, in order
    pub fn downloads(&self, name: &str) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Download { name: n, event } if n == name => Some(event),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        push_event(&self.events, event);
    }
}

impl Reporter for RecordingReporter {
    fn phase(&self, name: &str, phase: &InstallPhase) {
        self.push(ReportEvent::Phase {
            name: name.to_string(),
            phase: phase.clone(),
        });
    }

    fn info(&self, message: &str) {
        self.push(ReportEvent::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.push(ReportEvent::Warn(message.to_string()));
    }

    fn download_progress(&self, name: &str) -> Box<dyn ProgressTracker> {
        let events = Arc::clone(&self.events);
        let name = name.to_string();
        Box::new(CallbackProgress::new(move |event| {
            push_event(
                &events,
                ReportEvent::Download {
                    name: name.clone(),
                    event,
                },
            );
        }))
    }
}

fn push_event(events: &Mutex<Vec<ReportEvent>>, event: ReportEvent) {
    if let Ok(mut events) = events.lock() {
        events.push(event);
    }
}
