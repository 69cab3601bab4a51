// crates/repo-law-core/src/core/record.rs
// ============================================================================
// Module: Compliance Records
// Description: Terminal outcomes of runs and fleet-level report inputs.
// Purpose: Provide immutable value types consumed by report rendering.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`ComplianceRecord`] is produced once per run and never mutated after the
//! run completes. A [`FleetReport`] groups the records of one invocation with
//! its start time and any runs that aborted with an error.
//!
//! Invariants:
//! - `enrolled` and `unrolled` are mutually exclusive.
//! - `enrolled`, `unrolled`, and `is_valid` are false unless `applied` is true.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::document::ParseFailure;
use crate::core::identifiers::RepoRef;
use crate::core::validation::ValidationMessage;

// ============================================================================
// SECTION: Compliance Record
// ============================================================================

/// Outcome of one repository run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// A policy document exists in the repository.
    pub configured: bool,
    /// Decoding failure detail when the document is malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<ParseFailure>,
    /// The apply phase completed.
    pub applied: bool,
    /// Validation produced no error messages (meaningful only when applied).
    pub is_valid: bool,
    /// Validation messages in emission order.
    pub validations: Vec<ValidationMessage>,
    /// The enroll phase completed.
    pub enrolled: bool,
    /// The unroll phase completed.
    pub unrolled: bool,
}

impl ComplianceRecord {
    /// Creates a record with every flag cleared.
    #[must_use]
    pub fn pending(repo: &RepoRef) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            configured: false,
            parse_error: None,
            applied: false,
            is_valid: false,
            validations: Vec::new(),
            enrolled: false,
            unrolled: false,
        }
    }

    /// Returns the report status of the record.
    #[must_use]
    pub const fn status(&self) -> ComplianceStatus {
        if !self.configured {
            ComplianceStatus::Warn
        } else if self.applied && self.is_valid {
            ComplianceStatus::Pass
        } else {
            ComplianceStatus::Fail
        }
    }
}

/// Summary status shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// Configured, applied, and valid.
    Pass,
    /// No policy document present.
    Warn,
    /// Malformed document or failed validation.
    Fail,
}

impl ComplianceStatus {
    /// Returns the display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Warn => "Warn",
            Self::Fail => "Fail",
        }
    }
}

// ============================================================================
// SECTION: Fleet Report
// ============================================================================

/// Run that aborted with an error before producing a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Error description.
    pub error: String,
}

/// Inputs handed to report rendering for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    /// Invocation start time (RFC 3339).
    pub started_at: String,
    /// Completed records in input order.
    pub records: Vec<ComplianceRecord>,
    /// Runs that aborted, in input order.
    pub failures: Vec<RunFailure>,
}

impl FleetReport {
    /// Creates an empty report stamped with the given start time.
    #[must_use]
    pub fn new(started_at: OffsetDateTime) -> Self {
        Self {
            started_at: format_timestamp(started_at),
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Returns true when every run produced a record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Formats a timestamp as RFC 3339, falling back to unix seconds.
fn format_timestamp(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.unix_timestamp().to_string())
}
