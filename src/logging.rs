//! Error channel
//!
//! Components report recoverable problems as `(message, severity)` pairs.
//! Severities are ordinal: a channel configured at `Warn` passes `Error` and
//! `Warn` and drops `Debug`; a channel at `Off` drops everything.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off = 0,
    Error = 1,
    Warn = 2,
    Debug = 3,
}

impl Severity {
    /// Equivalent filter for the `log` facade
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Severity::Off => log::LevelFilter::Off,
            Severity::Error => log::LevelFilter::Error,
            Severity::Warn => log::LevelFilter::Warn,
            Severity::Debug => log::LevelFilter::Debug,
        }
    }

    /// Whether a channel at this threshold passes a report of `severity`
    pub fn admits(self, severity: Severity) -> bool {
        severity != Severity::Off && severity <= self
    }
}

/// Sink for scheduler diagnostics
pub trait ErrorChannel: Send + Sync {
    fn report(&self, message: &str, severity: Severity);
}

/// Forwards reports to the `log` facade
#[derive(Debug, Clone, Copy)]
pub struct LogChannel {
    threshold: Severity,
}

impl LogChannel {
    pub fn new(threshold: Severity) -> Self {
        Self { threshold }
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        self.threshold.admits(severity)
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new(Severity::Warn)
    }
}

impl ErrorChannel for LogChannel {
    fn report(&self, message: &str, severity: Severity) {
        if !self.accepts(severity) {
            return;
        }
        match severity {
            Severity::Error => log::error!("{}", message),
            Severity::Warn => log::warn!("{}", message),
            Severity::Debug => log::debug!("{}", message),
            Severity::Off => {}
        }
    }
}

/// Keeps reports in memory, for hosts that surface them in a UI
#[derive(Debug)]
pub struct RecordingChannel {
    threshold: Severity,
    entries: Mutex<Vec<(String, Severity)>>,
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self::with_threshold(Severity::Debug)
    }
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: Severity) -> Self {
        Self {
            threshold,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(String, Severity)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn count_at(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|(_, s)| *s == severity)
            .count()
    }
}

impl ErrorChannel for RecordingChannel {
    fn report(&self, message: &str, severity: Severity) {
        if !self.threshold.admits(severity) {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((message.to_string(), severity));
        }
    }
}
