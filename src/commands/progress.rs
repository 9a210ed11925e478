// src/commands/progress.rs
//! Console output for installs
//!
//! [`ConsoleReporter`] prints phase changes and messages, and hands the
//! installer an indicatif bar for each download. [`ConsoleConfirm`] asks on
//! stdin.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use wpsyde::install::{Confirm, InstallPhase, Reporter};
use wpsyde::progress::ProgressTracker;

/// Reporter that writes to the terminal
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn phase(&self, name: &str, phase: &InstallPhase) {
        match phase {
            InstallPhase::Resolving => println!("Resolving {}...", name),
            InstallPhase::Recorded => println!("  {} [done]", name),
            InstallPhase::Failed(reason) => eprintln!("  {} [FAILED: {}]", name, reason),
            InstallPhase::Downloading | InstallPhase::Verifying | InstallPhase::Extracting => {
                tracing::info!("{}: {}", name, phase)
            }
        }
    }

    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn warn(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    fn download_progress(&self, name: &str) -> Box<dyn ProgressTracker> {
        Box::new(DownloadBar::new(name))
    }
}

/// Download progress bar
///
/// Shows a spinner until the response length is known, then a byte bar.
pub struct DownloadBar {
    bar: ProgressBar,
    finished: AtomicBool,
}

impl DownloadBar {
    pub fn new(name: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg} {bytes}")
                .expect("Invalid spinner template"),
        );
        bar.set_message(format!("Downloading {}", name));
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            finished: AtomicBool::new(false),
        }
    }
}

impl ProgressTracker for DownloadBar {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn set_position(&self, position: u64) {
        self.bar.set_position(position);
    }

    fn set_length(&self, length: u64) {
        if length == 0 {
            return;
        }
        self.bar.set_length(length);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("    {msg} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec})")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish_with_message(&self, _message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        self.bar.finish_and_clear();
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        self.bar.abandon_with_message(message.to_string());
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Asks `<prompt> [y/N]` on stdin
#[derive(Debug, Default)]
pub struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        io::stdout().flush().ok();

        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_download_bar_tracks_bytes() {
        let bar = DownloadBar::new("Button");
        bar.set_length(100);
        bar.increment(40);
        assert_eq!(bar.position(), 40);
        assert_eq!(bar.length(), 100);
        bar.finish_with_message("done");
        assert!(bar.is_finished());
    }
}
