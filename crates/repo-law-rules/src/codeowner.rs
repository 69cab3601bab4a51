// crates/repo-law-rules/src/codeowner.rs
// ============================================================================
// Module: Code Owner Rule
// Description: Presence check for the code owners file.
// Purpose: Flag repositories without declared code ownership.
// Dependencies: repo-law-core
// ============================================================================

//! ## Overview
//! The `codeowner` rule only validates. It takes no fragment options; the
//! checked path is operator configuration.

use std::sync::Arc;

use async_trait::async_trait;
use repo_law_core::Finding;
use repo_law_core::Findings;
use repo_law_core::Rule;
use repo_law_core::RuleContext;
use repo_law_core::RuleError;
use repo_law_core::TrailEntry;
use repo_law_core::Validate;
use serde_json::Value;
use serde_json::json;

/// Default registration name.
pub const CODEOWNER_RULE: &str = "codeowner";
/// Default code owners location.
pub const DEFAULT_CODEOWNERS_PATH: &str = ".github/CODEOWNERS";

/// Validate capability of the `codeowner` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeownerRule {
    /// Repository path of the code owners file.
    path: String,
}

impl CodeownerRule {
    /// Creates the rule checking `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
        }
    }
}

impl Default for CodeownerRule {
    fn default() -> Self {
        Self::new(DEFAULT_CODEOWNERS_PATH)
    }
}

#[async_trait]
impl Validate for CodeownerRule {
    async fn validate(
        &self,
        ctx: &RuleContext<'_>,
        findings: &mut Findings<'_>,
    ) -> Result<(), RuleError> {
        if ctx.files.read(&self.path).await?.is_none() {
            findings.add(
                Finding::error("CODEOWNERS file is missing").at(TrailEntry::file(&self.path)),
            );
        }
        Ok(())
    }
}

/// Returns the JSON Schema of the `codeowner` fragment.
#[must_use]
pub fn codeowner_schema() -> Value {
    json!({ "type": "object" })
}

/// Builds the `codeowner` rule under `name`.
#[must_use]
pub fn codeowner_rule(name: &str, rule: CodeownerRule) -> Rule {
    Rule::new(name, codeowner_schema()).with_validate(Arc::new(rule))
}
