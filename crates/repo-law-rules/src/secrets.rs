// crates/repo-law-rules/src/secrets.rs
// ============================================================================
// Module: Repository Secrets Rule
// Description: Operator-managed repository secrets opted into per repository.
// Purpose: Provision managed secrets for compliant repositories only.
// Dependencies: repo-law-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The operator declares which secret names are managed and where their
//! values come from. A repository opts into a subset through `include`.
//!
//! - `enroll` seals and writes every included managed secret that has a
//!   non-empty value.
//! - `unroll` deletes every managed secret present on the repository,
//!   whatever the fragment says.
//! - `enforce` deletes managed secrets the fragment no longer includes.
//!
//! Secrets the operator does not manage are never touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use repo_law_core::Enforce;
use repo_law_core::Enroll;
use repo_law_core::Rule;
use repo_law_core::RuleContext;
use repo_law_core::RuleError;
use repo_law_core::SecretProvider;
use repo_law_core::Unroll;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::removal::removal_set;
use crate::seal::seal_secret;

/// Default registration name.
pub const SECRETS_RULE: &str = "secrets";

/// Decoded `secrets` fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SecretsConfig {
    /// Managed secret names the repository opts into.
    #[serde(default)]
    pub include: Option<Vec<String>>,
}

/// Returns the JSON Schema of the `secrets` fragment.
#[must_use]
pub fn secrets_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "include": { "type": "array", "items": { "type": "string" } }
        }
    })
}

// ============================================================================
// SECTION: Rule
// ============================================================================

/// Capabilities of the `secrets` rule.
pub struct SecretsRule {
    /// Managed secret names.
    managed: BTreeSet<String>,
    /// Source of managed values.
    provider: Arc<dyn SecretProvider>,
}

impl SecretsRule {
    /// Creates the rule for the managed names and their value provider.
    #[must_use]
    pub fn new(managed: impl IntoIterator<Item = String>, provider: Arc<dyn SecretProvider>) -> Self {
        Self {
            managed: managed.into_iter().collect(),
            provider,
        }
    }

    /// Returns true when the operator manages `name`.
    #[must_use]
    pub fn manages(&self, name: &str) -> bool {
        self.managed.contains(name)
    }

    /// Lists remote repository secrets the operator manages.
    async fn remote_managed(&self, ctx: &RuleContext<'_>) -> Result<Vec<String>, RuleError> {
        let remote = ctx.platform.list_repository_secrets(ctx.repo).await?;
        Ok(remote.into_iter().filter(|name| self.manages(name)).collect())
    }

    /// Deletes the named repository secrets.
    async fn delete_all(&self, ctx: &RuleContext<'_>, names: &[String]) -> Result<(), RuleError> {
        for name in names {
            ctx.platform.delete_repository_secret(ctx.repo, name).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Enroll for SecretsRule {
    async fn enroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let Some(include) = ctx.decode_config::<SecretsConfig>()?.and_then(|config| config.include)
        else {
            return Ok(());
        };
        let wanted: Vec<&String> = include.iter().filter(|name| self.manages(name)).collect();
        if wanted.is_empty() {
            return Ok(());
        }
        let key = ctx.platform.repository_public_key(ctx.repo).await?;
        for name in wanted {
            let Some(value) = self.provider.fetch(name).await? else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let sealed = seal_secret(&key, &value)?;
            ctx.platform.put_repository_secret(ctx.repo, name, &sealed).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Unroll for SecretsRule {
    async fn unroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let managed = self.remote_managed(ctx).await?;
        self.delete_all(ctx, &managed).await
    }
}

#[async_trait]
impl Enforce for SecretsRule {
    async fn enforce(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let Some(config) = ctx.decode_config::<SecretsConfig>()? else {
            return Ok(());
        };
        let include = config.include.unwrap_or_default();
        let managed = self.remote_managed(ctx).await?;
        let stale = removal_set(managed.iter().map(String::as_str), include.iter().map(String::as_str));
        self.delete_all(ctx, &stale).await
    }
}

/// Builds the `secrets` rule under `name`.
#[must_use]
pub fn secrets_rule(name: &str, rule: SecretsRule) -> Rule {
    let rule = Arc::new(rule);
    Rule::new(name, secrets_schema())
        .with_enroll(Arc::clone(&rule) as Arc<dyn Enroll>)
        .with_unroll(Arc::clone(&rule) as Arc<dyn Unroll>)
        .with_enforce(rule)
}
