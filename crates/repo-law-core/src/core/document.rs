// crates/repo-law-core/src/core/document.rs
// ============================================================================
// Module: Policy Document
// Description: Decoded policy document and configuration load outcomes.
// Purpose: Represent the three mutually exclusive configuration states of a run.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The policy document is a YAML file committed in the target repository.
//! Loading it yields exactly one [`ConfigResult`]: the file is absent, it is
//! present but malformed, or it decoded into a [`PolicyDocument`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Policy Document
// ============================================================================

/// Policy document decoded against the composite schema.
///
/// # Invariants
/// - `rules` only holds keys of registered rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Repository-level enrollment request, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enroll: Option<bool>,
    /// Per-rule configuration fragments keyed by rule name.
    #[serde(default)]
    pub rules: Map<String, Value>,
}

impl PolicyDocument {
    /// Returns the configuration fragment for a rule, if declared.
    #[must_use]
    pub fn rule_config(&self, rule: &str) -> Option<&Value> {
        self.rules.get(rule)
    }
}

// ============================================================================
// SECTION: Parse Failures
// ============================================================================

/// Stage at which document decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStage {
    /// The text is not valid YAML.
    Syntax,
    /// The structure violates the composite schema.
    Schema,
}

/// Single decoding problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// JSON pointer of the offending value (empty for the document root).
    pub path: String,
    /// Error detail.
    pub message: String,
}

/// Raw error detail carried by a malformed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// Failing stage.
    pub stage: ParseStage,
    /// Individual problems, in validator order.
    pub issues: Vec<ParseIssue>,
}

impl ParseFailure {
    /// Creates a syntax failure with a single issue.
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self {
            stage: ParseStage::Syntax,
            issues: vec![ParseIssue {
                path: String::new(),
                message: message.into(),
            }],
        }
    }
}

// ============================================================================
// SECTION: Configuration Result
// ============================================================================

/// Outcome of loading a repository's policy document.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// The document does not exist in the repository.
    NoDocument,
    /// The document exists but failed parsing or schema validation.
    ParseError(ParseFailure),
    /// The document decoded successfully.
    Parsed(PolicyDocument),
}

impl ConfigResult {
    /// Returns true when a document exists (parsed or not).
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self, Self::NoDocument)
    }

    /// Returns the decoded document when parsing succeeded.
    #[must_use]
    pub const fn document(&self) -> Option<&PolicyDocument> {
        match self {
            Self::Parsed(document) => Some(document),
            _ => None,
        }
    }

    /// Returns the parse failure, if any.
    #[must_use]
    pub const fn parse_failure(&self) -> Option<&ParseFailure> {
        match self {
            Self::ParseError(failure) => Some(failure),
            _ => None,
        }
    }
}
