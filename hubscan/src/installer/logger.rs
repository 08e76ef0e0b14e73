//! Logger sink for installer progress and diagnostics.
//!
//! Installer output is part of a contract: tooling around the installer
//! greps for fixed substrings (see [`super::inspector`]). Callers choose where
//! the lines go by passing an [`InstallLogger`].

use std::sync::Mutex;

/// Append-only sink for installer messages.
pub trait InstallLogger {
    /// Record an informational line.
    fn info(&self, message: &str);

    /// Record a warning.
    fn warn(&self, message: &str);

    /// Record an error.
    fn error(&self, message: &str);
}

/// Forwards installer messages to `tracing` under the `hubscan::installer` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl InstallLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "hubscan::installer", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "hubscan::installer", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "hubscan::installer", "{}", message);
    }
}

/// Records every message in memory.
///
/// Useful for callers that surface installer output in their own UI.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// All recorded lines joined with newlines.
    pub fn output(&self) -> String {
        self.lines().join("\n")
    }

    /// Whether any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    fn push(&self, level: &str, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(format!("{} {}", level, message));
        }
    }
}

impl InstallLogger for MemoryLogger {
    fn info(&self, message: &str) {
        self.push("INFO", message);
    }

    fn warn(&self, message: &str) {
        self.push("WARN", message);
    }

    fn error(&self, message: &str) {
        self.push("ERROR", message);
    }
}

impl<L: InstallLogger + ?Sized> InstallLogger for &L {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}
