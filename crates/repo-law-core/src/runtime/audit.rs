// crates/repo-law-core/src/runtime/audit.rs
// ============================================================================
// Module: Run Audit Sinks
// Description: JSON-lines audit sinks for run lifecycle and validation events.
// Purpose: Route operator-visible events without a logging framework dependency.
// Dependencies: crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! Sinks implement [`AuditSink`]. The stderr and file sinks write one JSON
//! object per line; the memory sink keeps events for assertions in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::core::Phase;
use crate::core::RepoRef;
use crate::interfaces::AuditOutcome;
use crate::interfaces::AuditSink;
use crate::interfaces::RunAuditEvent;
use crate::interfaces::ValidationAuditEvent;

// ============================================================================
// SECTION: Event Builders
// ============================================================================

/// Returns the current time in milliseconds since the unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_millis()).unwrap_or(0)
}

impl RunAuditEvent {
    /// Builds a lifecycle event stamped with the current time.
    #[must_use]
    pub fn phase(repo: &RepoRef, phase: Phase, outcome: AuditOutcome) -> Self {
        Self {
            event: "run_phase",
            timestamp_ms: now_ms(),
            repository: repo.full_name(),
            phase,
            rule: None,
            outcome,
            detail: None,
        }
    }

    /// Attaches the rule involved.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.event = "rule_phase";
        self.rule = Some(rule.into());
        self
    }

    /// Attaches a detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl ValidationAuditEvent {
    /// Builds a validation error event stamped with the current time.
    #[must_use]
    pub fn error(repo: &RepoRef, rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            event: "validation_error",
            timestamp_ms: now_ms(),
            repository: repo.full_name(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_validation(&self, event: &ValidationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes a serialized payload as one line.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_validation(&self, event: &ValidationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RunAuditEvent) {}
}

/// Audit sink that retains events in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded lifecycle events.
    runs: Mutex<Vec<RunAuditEvent>>,
    /// Recorded validation events.
    validations: Mutex<Vec<ValidationAuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of lifecycle events.
    #[must_use]
    pub fn run_events(&self) -> Vec<RunAuditEvent> {
        self.runs.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns a snapshot of validation events.
    #[must_use]
    pub fn validation_events(&self) -> Vec<ValidationAuditEvent> {
        self.validations.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(mut events) = self.runs.lock() {
            events.push(event.clone());
        }
    }

    fn record_validation(&self, event: &ValidationAuditEvent) {
        if let Ok(mut events) = self.validations.lock() {
            events.push(event.clone());
        }
    }
}
