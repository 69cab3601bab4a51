// crates/repo-law-core/src/runtime/loader.rs
// ============================================================================
// Module: Configuration Loader
// Description: Composite policy schema and single-flight document loading.
// Purpose: Produce one memoized configuration result per run.
// Dependencies: crate::{core, interfaces, runtime}, jsonschema, serde_yaml, tokio
// ============================================================================

//! ## Overview
//! [`PolicySchema`] compiles the composite document schema once for a rule
//! set and decodes document text into a [`ConfigResult`]. [`ConfigLoader`]
//! binds a schema to one repository and memoizes the first successful load.
//!
//! Loading is single-flight: concurrent callers during the first fetch await
//! the same in-flight read. A platform failure is returned to the caller and
//! is not cached, so a later call fetches again.
//!
//! Decoding never fails past this boundary: malformed YAML and schema
//! violations both become [`ConfigResult::ParseError`]. Unknown top-level keys
//! and unregistered rule names are dropped from the decoded document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::core::ConfigResult;
use crate::core::ParseFailure;
use crate::core::ParseIssue;
use crate::core::ParseStage;
use crate::core::PolicyDocument;
use crate::interfaces::PlatformError;
use crate::runtime::files::RepoFiles;
use crate::runtime::rule::RuleSet;
use crate::runtime::rule::RuleSetError;

// ============================================================================
// SECTION: Policy Schema
// ============================================================================

/// Compiled composite schema for a rule set.
pub struct PolicySchema {
    /// Uncompiled composite schema.
    schema: Value,
    /// Compiled validator.
    validator: Validator,
    /// Registered rule names in registration order.
    rule_names: Vec<String>,
}

impl PolicySchema {
    /// Compiles the composite schema of a rule set.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::InvalidSchema`] when the composite schema does
    /// not compile.
    pub fn compile(rules: &RuleSet) -> Result<Self, RuleSetError> {
        let schema = rules.composite_schema();
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|err| RuleSetError::InvalidSchema {
                rule: "rules".to_string(),
                message: err.to_string(),
            })?;
        Ok(Self {
            schema,
            validator,
            rule_names: rules.iter().map(|rule| rule.name().to_string()).collect(),
        })
    }

    /// Returns the composite schema document.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Decodes policy-document text.
    #[must_use]
    pub fn decode(&self, text: &str) -> ConfigResult {
        let value: Value = match serde_yaml::from_str(text) {
            Ok(value) => value,
            Err(err) => return ConfigResult::ParseError(ParseFailure::syntax(err.to_string())),
        };
        let issues: Vec<ParseIssue> = self
            .validator
            .iter_errors(&value)
            .map(|err| ParseIssue {
                path: err.instance_path().to_string(),
                message: err.to_string(),
            })
            .collect();
        if !issues.is_empty() {
            return ConfigResult::ParseError(ParseFailure {
                stage: ParseStage::Schema,
                issues,
            });
        }
        ConfigResult::Parsed(self.project(&value))
    }

    /// Keeps the recognized parts of a schema-valid document.
    fn project(&self, value: &Value) -> PolicyDocument {
        let enroll = value.get("enroll").and_then(Value::as_bool);
        let mut rules = Map::new();
        if let Some(declared) = value.get("rules").and_then(Value::as_object) {
            for name in &self.rule_names {
                if let Some(fragment) = declared.get(name) {
                    rules.insert(name.clone(), fragment.clone());
                }
            }
        }
        PolicyDocument {
            enroll,
            rules,
        }
    }
}

// ============================================================================
// SECTION: Configuration Loader
// ============================================================================

/// Memoized policy-document loader for one repository.
pub struct ConfigLoader {
    /// Repository file reader.
    files: RepoFiles,
    /// Document path inside the repository.
    location: String,
    /// Shared compiled schema.
    schema: Arc<PolicySchema>,
    /// First successful result.
    cell: OnceCell<ConfigResult>,
}

impl ConfigLoader {
    /// Creates a loader that has not fetched yet.
    #[must_use]
    pub fn new(files: RepoFiles, location: impl Into<String>, schema: Arc<PolicySchema>) -> Self {
        Self {
            files,
            location: location.into(),
            schema,
            cell: OnceCell::new(),
        }
    }

    /// Returns the document path.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns true once a result has been memoized.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Loads the configuration result, fetching at most once on success.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the document read fails for a reason
    /// other than "not found".
    pub async fn load(&self) -> Result<&ConfigResult, PlatformError> {
        self.cell
            .get_or_try_init(|| async {
                let text = self.files.read(&self.location).await?;
                Ok(text.map_or(ConfigResult::NoDocument, |text| self.schema.decode(&text)))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::PolicySchema;
    use crate::core::ConfigResult;
    use crate::core::ParseStage;
    use crate::runtime::rule::Apply;
    use crate::runtime::rule::Rule;
    use crate::runtime::rule::RuleContext;
    use crate::runtime::rule::RuleError;
    use crate::runtime::rule::RuleSet;

    struct Inert;

    #[async_trait]
    impl Apply for Inert {
        async fn apply(&self, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
            Ok(())
        }
    }

    fn schema() -> PolicySchema {
        let basic = Rule::new(
            "basic",
            json!({
                "type": "object",
                "properties": { "defaultBranch": { "type": "string" } },
            }),
        )
        .with_apply(Arc::new(Inert));
        PolicySchema::compile(&RuleSet::from_rules([basic]).unwrap()).unwrap()
    }

    #[test]
    fn decode_drops_unknown_keys() {
        let result = schema().decode("extra: 1\nrules:\n  basic:\n    defaultBranch: main\n  other: {}\n");
        let document = result.document().unwrap();
        assert_eq!(document.rules.len(), 1);
        assert_eq!(document.rule_config("basic"), Some(&json!({"defaultBranch": "main"})));
        assert_eq!(document.enroll, None);
    }

    #[test]
    fn decode_reports_yaml_syntax_errors() {
        let result = schema().decode("rules: [unclosed");
        let failure = result.parse_failure().unwrap();
        assert_eq!(failure.stage, ParseStage::Syntax);
        assert_eq!(failure.issues.len(), 1);
    }

    #[test]
    fn decode_rejects_wrong_types_with_paths() {
        let result = schema().decode("enroll: true\nrules:\n  basic:\n    defaultBranch: 42\n");
        let ConfigResult::ParseError(failure) = result else {
            panic!("expected parse error");
        };
        assert_eq!(failure.stage, ParseStage::Schema);
        assert_eq!(failure.issues[0].path, "/rules/basic/defaultBranch");
    }

    #[test]
    fn empty_document_is_a_parse_error() {
        assert!(schema().decode("").parse_failure().is_some());
        assert!(schema().decode("[]").parse_failure().is_some());
    }
}
