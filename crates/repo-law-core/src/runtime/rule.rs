// crates/repo-law-core/src/runtime/rule.rs
// ============================================================================
// Module: Rule Contract
// Description: Capability traits, rule records, and the ordered rule set.
// Purpose: Model policy modules as named schemas with optional phase slots.
// Dependencies: crate::{core, interfaces}, async-trait, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! A [`Rule`] is a fixed record of five optional capability slots plus a
//! JSON Schema describing its configuration fragment. The run checks slot
//! presence before invoking a phase; nothing is discovered by introspection.
//!
//! Every capability receives a [`RuleContext`]. The configuration fragment is
//! optional: a registered rule without a fragment is still invoked and must
//! treat the absence as inert.
//!
//! [`RuleSet`] preserves registration order, which is the visiting order of
//! every phase, and composes the policy-document schema from its rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::Draft;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::core::RepoRef;
use crate::core::RuleName;
use crate::interfaces::Platform;
use crate::interfaces::PlatformError;
use crate::interfaces::SecretError;
use crate::runtime::files::RepoFiles;
use crate::runtime::validation::Findings;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure raised by a rule capability.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
    /// The configuration fragment could not be decoded.
    #[error("rule configuration error: {0}")]
    Config(String),
    /// A managed secret value could not be fetched.
    #[error(transparent)]
    Secret(#[from] SecretError),
    /// A secret value could not be sealed.
    #[error("secret sealing failed: {0}")]
    Seal(String),
}

/// Rule registration failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleSetError {
    /// A rule with the same name is already registered.
    #[error("rule already registered: {0}")]
    Duplicate(String),
    /// The rule defines none of the lifecycle capabilities.
    #[error("rule {0} defines no lifecycle capability")]
    NoCapabilities(String),
    /// The rule schema does not compile.
    #[error("rule {rule} has an invalid schema: {message}")]
    InvalidSchema {
        /// Rule name.
        rule: String,
        /// Compilation error.
        message: String,
    },
}

// ============================================================================
// SECTION: Rule Context
// ============================================================================

/// Base context shared by every capability invocation.
pub struct RuleContext<'a> {
    /// Platform client.
    pub platform: &'a dyn Platform,
    /// Target repository.
    pub repo: &'a RepoRef,
    /// Repository path of the policy document.
    pub config_location: &'a str,
    /// This rule's validated configuration fragment, when declared.
    pub config: Option<&'a Value>,
    /// Repository-scoped file reader.
    pub files: &'a RepoFiles,
}

impl RuleContext<'_> {
    /// Decodes the configuration fragment into the rule's typed form.
    ///
    /// Returns `Ok(None)` when the fragment is absent.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Config`] when the fragment does not match `T`.
    pub fn decode_config<T: DeserializeOwned>(&self) -> Result<Option<T>, RuleError> {
        self.config
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|err| RuleError::Config(err.to_string()))
            })
            .transpose()
    }
}

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Reconciles live repository state toward the declared configuration.
#[async_trait]
pub trait Apply: Send + Sync {
    /// Runs the apply phase.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when reconciliation fails.
    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError>;
}

/// Inspects repository state and reports findings.
#[async_trait]
pub trait Validate: Send + Sync {
    /// Runs the validate phase.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when inspection itself fails.
    async fn validate(
        &self,
        ctx: &RuleContext<'_>,
        findings: &mut Findings<'_>,
    ) -> Result<(), RuleError>;
}

/// Provisions privileged state after a passing validation.
#[async_trait]
pub trait Enroll: Send + Sync {
    /// Runs the enroll phase.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when provisioning fails.
    async fn enroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError>;
}

/// Removes privileged state after a failing validation.
#[async_trait]
pub trait Unroll: Send + Sync {
    /// Runs the unroll phase.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when teardown fails.
    async fn unroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError>;
}

/// Stricter reconciliation run only when enforcement is requested.
#[async_trait]
pub trait Enforce: Send + Sync {
    /// Runs the enforce phase.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when enforcement fails.
    async fn enforce(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError>;
}

// ============================================================================
// SECTION: Rule
// ============================================================================

/// Named policy module with a configuration schema and capability slots.
#[derive(Clone)]
pub struct Rule {
    /// Unique rule name (key under `rules` in the policy document).
    name: RuleName,
    /// JSON Schema of the configuration fragment.
    schema: Value,
    /// Apply slot.
    apply: Option<Arc<dyn Apply>>,
    /// Validate slot.
    validate: Option<Arc<dyn Validate>>,
    /// Enroll slot.
    enroll: Option<Arc<dyn Enroll>>,
    /// Unroll slot.
    unroll: Option<Arc<dyn Unroll>>,
    /// Enforce slot.
    enforce: Option<Arc<dyn Enforce>>,
}

impl Rule {
    /// Creates a rule with empty capability slots.
    #[must_use]
    pub fn new(name: impl Into<RuleName>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            apply: None,
            validate: None,
            enroll: None,
            unroll: None,
            enforce: None,
        }
    }

    /// Fills the apply slot.
    #[must_use]
    pub fn with_apply(mut self, capability: Arc<dyn Apply>) -> Self {
        self.apply = Some(capability);
        self
    }

    /// Fills the validate slot.
    #[must_use]
    pub fn with_validate(mut self, capability: Arc<dyn Validate>) -> Self {
        self.validate = Some(capability);
        self
    }

    /// Fills the enroll slot.
    #[must_use]
    pub fn with_enroll(mut self, capability: Arc<dyn Enroll>) -> Self {
        self.enroll = Some(capability);
        self
    }

    /// Fills the unroll slot.
    #[must_use]
    pub fn with_unroll(mut self, capability: Arc<dyn Unroll>) -> Self {
        self.unroll = Some(capability);
        self
    }

    /// Fills the enforce slot.
    #[must_use]
    pub fn with_enforce(mut self, capability: Arc<dyn Enforce>) -> Self {
        self.enforce = Some(capability);
        self
    }

    /// Returns the rule name.
    #[must_use]
    pub const fn name(&self) -> &RuleName {
        &self.name
    }

    /// Returns the configuration schema.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns the apply slot.
    #[must_use]
    pub fn apply(&self) -> Option<&dyn Apply> {
        self.apply.as_deref()
    }

    /// Returns the validate slot.
    #[must_use]
    pub fn validate(&self) -> Option<&dyn Validate> {
        self.validate.as_deref()
    }

    /// Returns the enroll slot.
    #[must_use]
    pub fn enroll(&self) -> Option<&dyn Enroll> {
        self.enroll.as_deref()
    }

    /// Returns the unroll slot.
    #[must_use]
    pub fn unroll(&self) -> Option<&dyn Unroll> {
        self.unroll.as_deref()
    }

    /// Returns the enforce slot.
    #[must_use]
    pub fn enforce(&self) -> Option<&dyn Enforce> {
        self.enforce.as_deref()
    }

    /// Returns true when at least one slot is filled.
    #[must_use]
    pub const fn has_capability(&self) -> bool {
        self.apply.is_some()
            || self.validate.is_some()
            || self.enroll.is_some()
            || self.unroll.is_some()
            || self.enforce.is_some()
    }
}

// ============================================================================
// SECTION: Rule Set
// ============================================================================

/// Insertion-ordered registry of rules.
#[derive(Clone, Default)]
pub struct RuleSet {
    /// Rules in registration order.
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule at the end of the visiting order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] when the name is taken, the rule has no
    /// capability, or its schema does not compile.
    pub fn register(&mut self, rule: Rule) -> Result<(), RuleSetError> {
        if self.get(rule.name().as_str()).is_some() {
            return Err(RuleSetError::Duplicate(rule.name().to_string()));
        }
        if !rule.has_capability() {
            return Err(RuleSetError::NoCapabilities(rule.name().to_string()));
        }
        jsonschema::options().with_draft(Draft::Draft202012).build(rule.schema()).map_err(
            |err| RuleSetError::InvalidSchema {
                rule: rule.name().to_string(),
                message: err.to_string(),
            },
        )?;
        self.rules.push(rule);
        Ok(())
    }

    /// Builds a rule set from rules in order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] on the first rejected rule.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RuleSetError> {
        let mut set = Self::new();
        for rule in rules {
            set.register(rule)?;
        }
        Ok(set)
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name().as_str() == name)
    }

    /// Iterates rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Builds the policy-document schema.
    ///
    /// The document is an object with an optional boolean `enroll` and an
    /// optional `rules` object whose optional properties are exactly the
    /// registered rule names, each typed by that rule's schema.
    #[must_use]
    pub fn composite_schema(&self) -> Value {
        let mut properties = Map::new();
        for rule in &self.rules {
            properties.insert(rule.name().to_string(), rule.schema().clone());
        }
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "Repository policy document",
            "type": "object",
            "properties": {
                "enroll": { "type": "boolean" },
                "rules": {
                    "type": "object",
                    "properties": Value::Object(properties),
                },
            },
        })
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

    use super::Apply;
    use super::Rule;
    use super::RuleContext;
    use super::RuleError;
    use super::RuleSet;
    use super::RuleSetError;

    struct Inert;

    #[async_trait]
    impl Apply for Inert {
        async fn apply(&self, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
            Ok(())
        }
    }

    fn rule(name: &str) -> Rule {
        Rule::new(name, json!({"type": "object"})).with_apply(Arc::new(Inert))
    }

    #[test]
    fn register_preserves_order_and_rejects_duplicates() {
        let mut set = RuleSet::new();
        set.register(rule("zeta")).unwrap();
        set.register(rule("alpha")).unwrap();
        let names: Vec<&str> = set.iter().map(|rule| rule.name().as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(
            set.register(rule("zeta")).unwrap_err(),
            RuleSetError::Duplicate("zeta".to_string())
        );
    }

    #[test]
    fn register_rejects_rules_without_capabilities() {
        let mut set = RuleSet::new();
        let err = set.register(Rule::new("empty", json!({}))).unwrap_err();
        assert_eq!(err, RuleSetError::NoCapabilities("empty".to_string()));
    }

    #[test]
    fn register_rejects_uncompilable_schema() {
        let mut set = RuleSet::new();
        let bad = Rule::new("bad", json!({"type": 12})).with_apply(Arc::new(Inert));
        assert!(matches!(set.register(bad), Err(RuleSetError::InvalidSchema { .. })));
    }

    #[test]
    fn composite_schema_lists_every_rule() {
        let set = RuleSet::from_rules([rule("basic"), rule("codeowner")]).unwrap();
        let schema = set.composite_schema();
        let rules = &schema["properties"]["rules"]["properties"];
        assert_eq!(rules["basic"], json!({"type": "object"}));
        assert_eq!(rules["codeowner"], json!({"type": "object"}));
        assert_eq!(schema["properties"]["enroll"]["type"], "boolean");
        assert!(schema.get("required").is_none());
    }
}
