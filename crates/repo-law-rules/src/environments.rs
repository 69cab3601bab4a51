// crates/repo-law-rules/src/environments.rs
// ============================================================================
// Module: Deployment Environments Rule
// Description: Declared deployment environments and their managed secrets.
// Purpose: Reconcile environments, report drift, and provision secrets.
// Dependencies: repo-law-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The fragment maps environment names to protection settings. The operator
//! separately declares *known* environments: which secret names are managed
//! there and which provider supplies their values.
//!
//! - `apply` deletes remote environments the fragment does not declare, then
//!   creates or updates every declared one.
//! - `validate` reports declared environments that are missing remotely and
//!   wait timers that drifted.
//! - `enroll` writes declared managed secrets and prunes managed secrets the
//!   fragment dropped.
//! - `unroll` deletes managed secrets from every known environment.
//!
//! `variables` are accepted by the schema but not reconciled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use repo_law_core::Apply;
use repo_law_core::DeploymentBranchPolicy;
use repo_law_core::EnvironmentSettings;
use repo_law_core::Enroll;
use repo_law_core::Finding;
use repo_law_core::Findings;
use repo_law_core::Reviewer;
use repo_law_core::ReviewerKind;
use repo_law_core::Rule;
use repo_law_core::RuleContext;
use repo_law_core::RuleError;
use repo_law_core::SecretProvider;
use repo_law_core::TrailEntry;
use repo_law_core::Unroll;
use repo_law_core::Validate;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::removal::removal_set;
use crate::seal::seal_secret;

/// Default registration name.
pub const ENVIRONMENTS_RULE: &str = "environments";

/// Longest wait timer the platform accepts (30 days).
pub const MAX_WAIT_MINUTES: u32 = 43_200;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Decoded `environments` fragment keyed by environment name.
pub type EnvironmentsConfig = BTreeMap<String, EnvironmentConfig>;

/// Declared settings of one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Required reviewers.
    pub required_reviewers: Option<RequiredReviewers>,
    /// Wait timer in minutes, or `false` to disable.
    pub wait_time: Option<WaitTime>,
    /// Allow administrators to bypass protection rules.
    pub allow_bypass: Option<bool>,
    /// Environment variables (accepted, not reconciled).
    pub variables: Option<BTreeMap<String, String>>,
    /// Managed secret names wanted in this environment.
    pub secrets: Option<Vec<String>>,
    /// Deployment branch restriction.
    pub branches: Option<Branches>,
}

/// Required reviewer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredReviewers {
    /// Reviewer principals.
    pub users: Option<Vec<ReviewerEntry>>,
    /// Block self-review.
    pub prevent_self_review: Option<bool>,
}

/// Reviewer principal as written in the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewerEntry {
    /// Principal type; users when omitted.
    #[serde(rename = "type")]
    pub kind: Option<ReviewerKind>,
    /// Platform identifier.
    pub id: Option<u64>,
}

/// Wait timer setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WaitTime {
    /// Wait the given number of minutes.
    Minutes(u32),
    /// `false`: no wait timer.
    Disabled(bool),
}

impl WaitTime {
    /// Returns the timer in minutes; disabled is zero.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::Minutes(minutes) => minutes,
            Self::Disabled(_) => 0,
        }
    }
}

/// Deployment branch restriction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Branches {
    /// `false`: any branch may deploy.
    Unrestricted(bool),
    /// `"protected"`: only protected branches.
    Protected(String),
    /// Custom branch and tag patterns.
    Custom(BranchPatterns),
}

/// Custom deployment patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BranchPatterns {
    /// Branch name patterns.
    #[serde(default)]
    pub branches: Vec<String>,
    /// Tag name patterns.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Returns the JSON Schema of the `environments` fragment.
#[must_use]
pub fn environments_schema() -> Value {
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "additionalProperties": {
            "type": "object",
            "properties": {
                "requiredReviewers": {
                    "type": "object",
                    "properties": {
                        "users": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "type": { "enum": ["User", "Team"] },
                                    "id": { "type": "integer", "minimum": 0 }
                                }
                            }
                        },
                        "preventSelfReview": { "type": "boolean" }
                    }
                },
                "waitTime": {
                    "oneOf": [
                        { "type": "integer", "minimum": 0, "maximum": MAX_WAIT_MINUTES },
                        { "const": false }
                    ]
                },
                "allowBypass": { "type": "boolean" },
                "variables": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                },
                "secrets": strings,
                "branches": {
                    "oneOf": [
                        { "const": false },
                        { "const": "protected" },
                        {
                            "type": "object",
                            "properties": { "branches": strings, "tags": strings }
                        }
                    ]
                }
            }
        }
    })
}

/// Translates a declared environment into platform settings.
#[must_use]
pub fn environment_settings(config: &EnvironmentConfig) -> EnvironmentSettings {
    let reviewers = config.required_reviewers.as_ref();
    EnvironmentSettings {
        wait_timer: config.wait_time.map(WaitTime::minutes),
        prevent_self_review: reviewers.and_then(|reviewers| reviewers.prevent_self_review),
        reviewers: reviewers.and_then(|reviewers| reviewers.users.as_ref()).map(|users| {
            users
                .iter()
                .filter_map(|user| {
                    user.id.map(|id| Reviewer {
                        kind: user.kind.unwrap_or(ReviewerKind::User),
                        id,
                    })
                })
                .collect()
        }),
        can_admins_bypass: config.allow_bypass,
        deployment_branch_policy: match &config.branches {
            None | Some(Branches::Unrestricted(_)) => None,
            Some(Branches::Protected(_)) => Some(DeploymentBranchPolicy {
                protected_branches: true,
                custom_branch_policies: false,
            }),
            Some(Branches::Custom(_)) => Some(DeploymentBranchPolicy {
                protected_branches: false,
                custom_branch_policies: true,
            }),
        },
    }
}

// ============================================================================
// SECTION: Known Environments
// ============================================================================

/// Operator declaration of an environment whose secrets are managed.
pub struct KnownEnvironment {
    /// Managed secret names.
    secrets: BTreeSet<String>,
    /// Source of managed values.
    provider: Arc<dyn SecretProvider>,
}

impl KnownEnvironment {
    /// Creates a known environment.
    #[must_use]
    pub fn new(secrets: impl IntoIterator<Item = String>, provider: Arc<dyn SecretProvider>) -> Self {
        Self {
            secrets: secrets.into_iter().collect(),
            provider,
        }
    }

    /// Returns true when `name` is managed here.
    #[must_use]
    pub fn manages(&self, name: &str) -> bool {
        self.secrets.contains(name)
    }
}

// ============================================================================
// SECTION: Rule
// ============================================================================

/// Capabilities of the `environments` rule.
#[derive(Default)]
pub struct EnvironmentsRule {
    /// Known environments by name.
    known: BTreeMap<String, KnownEnvironment>,
}

impl EnvironmentsRule {
    /// Creates the rule with no known environments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a known environment.
    #[must_use]
    pub fn with_known(mut self, name: impl Into<String>, known: KnownEnvironment) -> Self {
        self.known.insert(name.into(), known);
        self
    }

    /// Remote secrets of `environment` managed by `known`.
    async fn remote_managed(
        ctx: &RuleContext<'_>,
        environment: &str,
        known: &KnownEnvironment,
    ) -> Result<Vec<String>, RuleError> {
        let remote = ctx.platform.list_environment_secrets(ctx.repo, environment).await?;
        Ok(remote.into_iter().filter(|name| known.manages(name)).collect())
    }

    /// Deletes the named secrets from `environment`.
    async fn delete_secrets(
        ctx: &RuleContext<'_>,
        environment: &str,
        names: &[String],
    ) -> Result<(), RuleError> {
        for name in names {
            ctx.platform.delete_environment_secret(ctx.repo, environment, name).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Apply for EnvironmentsRule {
    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let Some(config) = ctx.decode_config::<EnvironmentsConfig>()? else {
            return Ok(());
        };
        let remote = ctx.platform.list_environments(ctx.repo).await?;
        let stale = removal_set(
            remote.iter().map(|environment| environment.name.as_str()),
            config.keys().map(String::as_str),
        );
        for name in &stale {
            ctx.platform.delete_environment(ctx.repo, name).await?;
        }
        for (name, declared) in &config {
            ctx.platform.upsert_environment(ctx.repo, name, &environment_settings(declared)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Validate for EnvironmentsRule {
    async fn validate(
        &self,
        ctx: &RuleContext<'_>,
        findings: &mut Findings<'_>,
    ) -> Result<(), RuleError> {
        let Some(config) = ctx.decode_config::<EnvironmentsConfig>()? else {
            return Ok(());
        };
        let remote = ctx.platform.list_environments(ctx.repo).await?;
        for (name, declared) in &config {
            let trail = TrailEntry::file(ctx.config_location);
            let Some(live) = remote.iter().find(|environment| &environment.name == name) else {
                findings.add(
                    Finding::error(format!("environment {name} is missing")).at(trail),
                );
                continue;
            };
            let Some(expected) = declared.wait_time.map(WaitTime::minutes) else {
                continue;
            };
            let actual = live.wait_timer.unwrap_or(0);
            if actual != expected {
                findings.add(
                    Finding::warning(format!(
                        "environment {name} waits {actual} minutes, expected {expected}"
                    ))
                    .at(trail),
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Enroll for EnvironmentsRule {
    async fn enroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let Some(config) = ctx.decode_config::<EnvironmentsConfig>()? else {
            return Ok(());
        };
        for (name, declared) in &config {
            let Some(known) = self.known.get(name) else {
                continue;
            };
            let wanted: Vec<&String> = declared
                .secrets
                .iter()
                .flatten()
                .filter(|secret| known.manages(secret))
                .collect();
            if !wanted.is_empty() {
                let Some(key) = ctx.platform.environment_public_key(ctx.repo, name).await? else {
                    continue;
                };
                for secret in wanted {
                    let Some(value) = known.provider.fetch(secret).await? else {
                        continue;
                    };
                    if value.is_empty() {
                        continue;
                    }
                    let sealed = seal_secret(&key, &value)?;
                    ctx.platform.put_environment_secret(ctx.repo, name, secret, &sealed).await?;
                }
            }
            let managed = Self::remote_managed(ctx, name, known).await?;
            let stale = removal_set(
                managed.iter().map(String::as_str),
                declared.secrets.iter().flatten().map(String::as_str),
            );
            Self::delete_secrets(ctx, name, &stale).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Unroll for EnvironmentsRule {
    async fn unroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let remote = ctx.platform.list_environments(ctx.repo).await?;
        for environment in &remote {
            let Some(known) = self.known.get(&environment.name) else {
                continue;
            };
            let managed = Self::remote_managed(ctx, &environment.name, known).await?;
            Self::delete_secrets(ctx, &environment.name, &managed).await?;
        }
        Ok(())
    }
}

/// Builds the `environments` rule under `name`.
#[must_use]
pub fn environments_rule(name: &str, rule: EnvironmentsRule) -> Rule {
    let rule = Arc::new(rule);
    Rule::new(name, environments_schema())
        .with_apply(Arc::clone(&rule) as Arc<dyn Apply>)
        .with_validate(Arc::clone(&rule) as Arc<dyn Validate>)
        .with_enroll(Arc::clone(&rule) as Arc<dyn Enroll>)
        .with_unroll(rule)
}
