// crates/repo-law-core/src/core/validation.rs
// ============================================================================
// Module: Validation Messages
// Description: Typed diagnostics produced by rule validation.
// Purpose: Carry kind, origin, reason, and source trail for compliance reporting.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ValidationMessage`] is one diagnostic attributed to a rule. Rules emit
//! [`Finding`] values (no rule name); the run stamps the originating rule when
//! the finding is recorded. Only [`MessageKind::Error`] affects compliance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RuleName;

// ============================================================================
// SECTION: Message Kind
// ============================================================================

/// Diagnostic severity and intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Policy violation; makes the run non-compliant.
    Error,
    /// Non-blocking concern.
    Warning,
    /// Informational note.
    Info,
    /// Suggested improvement.
    Suggestion,
    /// Positive confirmation recorded by a rule.
    Approval,
}

impl MessageKind {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Suggestion => "suggestion",
            Self::Approval => "approval",
        }
    }
}

// ============================================================================
// SECTION: Source Trail
// ============================================================================

/// Line/column position inside a repository file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
}

/// One step of a source-location trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEntry {
    /// Repository-relative file path.
    pub path: String,
    /// Start of the highlighted range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    /// End of the highlighted range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

impl TrailEntry {
    /// Creates a trail entry pointing at a whole file.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            start: None,
            end: None,
        }
    }
}

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Diagnostic reported by a rule before attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Message kind.
    pub kind: MessageKind,
    /// Human-readable reason.
    pub reason: String,
    /// Ordered source-location trail (may be empty).
    pub trail: Vec<TrailEntry>,
}

impl Finding {
    /// Creates a finding without a source trail.
    #[must_use]
    pub fn new(kind: MessageKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            trail: Vec::new(),
        }
    }

    /// Shorthand for an error finding.
    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, reason)
    }

    /// Shorthand for a warning finding.
    #[must_use]
    pub fn warning(reason: impl Into<String>) -> Self {
        Self::new(MessageKind::Warning, reason)
    }

    /// Appends a trail entry.
    #[must_use]
    pub fn at(mut self, entry: TrailEntry) -> Self {
        self.trail.push(entry);
        self
    }

    /// Attributes the finding to a rule.
    #[must_use]
    pub fn into_message(self, rule: RuleName) -> ValidationMessage {
        ValidationMessage {
            kind: self.kind,
            rule,
            reason: self.reason,
            trail: self.trail,
        }
    }
}

/// Diagnostic attributed to the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Message kind.
    pub kind: MessageKind,
    /// Originating rule name.
    pub rule: RuleName,
    /// Human-readable reason.
    pub reason: String,
    /// Ordered source-location trail.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trail: Vec<TrailEntry>,
}

impl ValidationMessage {
    /// Returns true when the message marks a compliance failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}
