// crates/repo-law-core/src/core/identifiers.rs
// ============================================================================
// Module: Repo Law Identifiers
// Description: Repository and rule identifiers used across runs.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque wrappers with stable string forms. A repository is
//! addressed by `owner/name`; a rule by the key it was registered under.
//! Validation of identifier contents happens at the platform boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Repository Reference
// ============================================================================

/// Repository identity on the remote platform.
///
/// # Invariants
/// - `owner` and `name` are used verbatim; no case folding is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owning user or organization login.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Creates a new repository reference.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Returns the `owner/name` form used for pattern matching and reports.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ============================================================================
// SECTION: Rule Name
// ============================================================================

/// Unique key of a rule within a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleName(String);

impl RuleName {
    /// Creates a new rule name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RuleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RuleName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::RepoRef;

    #[test]
    fn full_name_joins_owner_and_name() {
        let repo = RepoRef::new("org", "service");
        assert_eq!(repo.full_name(), "org/service");
        assert_eq!(repo.to_string(), "org/service");
    }
}
