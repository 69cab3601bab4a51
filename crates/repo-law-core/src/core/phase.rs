// crates/repo-law-core/src/core/phase.rs
// ============================================================================
// Module: Lifecycle Phases
// Description: Names of the per-repository lifecycle phases.
// Purpose: Label audit events and rule failures with the phase they occurred in.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Phases run in a fixed order: load, apply, enforce (optional), validate,
//! then exactly one of enroll or unroll.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Policy document fetch and decode.
    Load,
    /// Reconcile live repository state toward the document.
    Apply,
    /// Stricter reconciliation, only when enforcement is requested.
    Enforce,
    /// Inspect live state and collect diagnostics.
    Validate,
    /// Privileged provisioning after a passing validation.
    Enroll,
    /// Removal of privileged state after a failing validation.
    Unroll,
}

impl Phase {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Apply => "apply",
            Self::Enforce => "enforce",
            Self::Validate => "validate",
            Self::Enroll => "enroll",
            Self::Unroll => "unroll",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
