// src/progress.rs

//! Download progress tracking
//!
//! The `ProgressTracker` trait is what the registry client reports archive
//! download progress to (bytes received against `Content-Length`).
//! Implementations:
//! - `SilentProgress`: No-op for scripted/quiet modes and tests
//! - `LogProgress`: Logs progress to tracing
//! - `CallbackProgress`: Forwards events to a closure
//!
//! The CLI wraps an indicatif bar in its own implementation
//! (see `commands::progress`).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Core trait for progress tracking
///
/// Implementations should be thread-safe (Send + Sync).
pub trait ProgressTracker: Send + Sync {
    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Increment progress by the given amount
    fn increment(&self, amount: u64);

    /// Set progress to a specific position
    fn set_position(&self, position: u64);

    /// Set the total (length) of the progress, 0 when unknown
    fn set_length(&self, length: u64);

    /// Get current position
    fn position(&self) -> u64;

    /// Get total length
    fn length(&self) -> u64;

    /// Finish progress successfully with a message
    fn finish_with_message(&self, message: &str);

    /// Finish progress with an error/abandonment message
    fn finish_with_error(&self, message: &str);

    /// Check if progress is finished
    fn is_finished(&self) -> bool;
}

/// Silent progress tracker (no-op)
#[derive(Debug, Default)]
pub struct SilentProgress {
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl SilentProgress {
    /// Create a new silent progress tracker
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}

    fn increment(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
    }

    fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
    }

    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn finish_with_error(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Logging progress tracker
///
/// Logs roughly every tenth of the total at info level.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl LogProgress {
    /// Create a new logging progress tracker
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: AtomicU64::new(0),
            length: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    fn log_step(&self, old_pos: u64, new_pos: u64) {
        let length = self.length.load(Ordering::Relaxed);
        if length == 0 {
            return;
        }
        let interval = std::cmp::max(1, length / 10);
        if new_pos / interval > old_pos / interval {
            let percent = (new_pos.min(length) * 100) / length;
            info!("{}: {}% ({}/{} bytes)", self.name, percent, new_pos, length);
        }
    }
}

impl ProgressTracker for LogProgress {
    fn set_message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }

    fn increment(&self, amount: u64) {
        let old_pos = self.position.fetch_add(amount, Ordering::Relaxed);
        self.log_step(old_pos, old_pos + amount);
    }

    fn set_position(&self, position: u64) {
        let old_pos = self.position.swap(position, Ordering::Relaxed);
        self.log_step(old_pos, position);
    }

    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        info!("{}: {}", self.name, message);
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        info!("{}: ERROR - {}", self.name, message);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Events emitted by [`CallbackProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Message updated
    Message(String),
    /// Total size became known
    Length(u64),
    /// Position changed
    Position { current: u64, total: u64 },
    /// Progress finished successfully
    Finished(String),
    /// Progress finished with error
    Error(String),
}

/// Progress tracker forwarding every change to a callback
///
/// Used where progress has to cross into other code, such as recording
/// download events for an embedding application.
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    /// Create a new callback progress tracker
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            position: AtomicU64::new(0),
            length: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl<F> ProgressTracker for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn set_message(&self, message: &str) {
        (self.callback)(ProgressEvent::Message(message.to_string()));
    }

    fn increment(&self, amount: u64) {
        let new_pos = self.position.fetch_add(amount, Ordering::Relaxed) + amount;
        (self.callback)(ProgressEvent::Position {
            current: new_pos,
            total: self.length.load(Ordering::Relaxed),
        });
    }

    fn set_position(&self, position: u64) {
        self.position.store(position, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Position {
            current: position,
            total: self.length.load(Ordering::Relaxed),
        });
    }

    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
        if length > 0 {
            (self.callback)(ProgressEvent::Length(length));
        }
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Finished(message.to_string()));
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Error(message.to_string()));
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_silent_progress() {
        let progress = SilentProgress::new();
        progress.set_length(100);

        progress.set_message("test");
        progress.increment(10);
        assert_eq!(progress.position(), 10);

        progress.set_position(50);
        assert_eq!(progress.position(), 50);
        assert_eq!(progress.length(), 100);

        assert!(!progress.is_finished());
        progress.finish_with_message("done");
        assert!(progress.is_finished());
    }

    #[test]
    fn test_log_progress() {
        let progress = LogProgress::new("Button");
        progress.set_length(100);

        progress.increment(25);
        progress.set_position(50);
        assert_eq!(progress.position(), 50);

        progress.finish_with_error("connection reset");
        assert!(progress.is_finished());
    }

    #[test]
    fn test_callback_progress() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        let progress = CallbackProgress::new(move |event| {
            events_clone.lock().unwrap().push(event);
        });
        progress.set_length(100);

        progress.set_message("starting");
        progress.set_position(50);
        progress.finish_with_message("done");

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 4);
        assert_eq!(captured[0], ProgressEvent::Length(100));
        assert_eq!(captured[1], ProgressEvent::Message("starting".to_string()));
        assert_eq!(
            captured[2],
            ProgressEvent::Position {
                current: 50,
                total: 100
            }
        );
        assert_eq!(captured[3], ProgressEvent::Finished("done".to_string()));
    }
}
