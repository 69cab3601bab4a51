// crates/repo-law-rules/src/basic.rs
// ============================================================================
// Module: Basic Repository Rule
// Description: Repository metadata, feature toggles, and merge settings.
// Purpose: Reconcile general repository settings toward the policy document.
// Dependencies: repo-law-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The `basic` rule maps its fragment onto the repository update endpoint.
//! Only fields present in the fragment are sent; absent fields leave the
//! remote value untouched. Without a fragment the rule does nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use repo_law_core::Apply;
use repo_law_core::RepositorySettings;
use repo_law_core::Rule;
use repo_law_core::RuleContext;
use repo_law_core::RuleError;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

/// Default registration name.
pub const BASIC_RULE: &str = "basic";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Decoded `basic` fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicConfig {
    /// Repository description.
    pub description: Option<String>,
    /// Template repository flag.
    pub is_template: Option<bool>,
    /// Default branch name.
    pub default_branch: Option<String>,
    /// `public` or `private`.
    pub visibility: Option<String>,
    /// Feature toggles.
    pub features: Option<Features>,
    /// Pull request merge settings.
    pub pull_requests: Option<PullRequests>,
    /// Suggest updating pull request branches.
    pub suggest_updating_pull_request_branches: Option<bool>,
    /// Allow auto-merge.
    pub allow_auto_merge: Option<bool>,
    /// Delete head branches after merge.
    pub delete_branch_on_merge: Option<bool>,
    /// Archive flag.
    pub archived: Option<bool>,
    /// Allow forking.
    pub allow_forking: Option<bool>,
    /// Require sign-off on web commits.
    pub web_commit_require_sign_off: Option<bool>,
}

/// Single enabled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Toggle {
    /// Whether the feature is on.
    pub enabled: bool,
}

/// Feature toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Features {
    /// Projects board.
    pub projects: Option<Toggle>,
    /// Issue tracker.
    pub issues: Option<Toggle>,
    /// Wiki.
    pub wiki: Option<Toggle>,
}

/// Default commit title and body for a merge method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitFormat {
    /// Commit title source.
    pub title: String,
    /// Commit body source.
    pub body: String,
}

/// Merge method settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeMethod {
    /// Whether the method is allowed.
    pub enabled: bool,
    /// Default commit format.
    pub commit: Option<CommitFormat>,
}

/// Pull request merge settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequests {
    /// Merge commits.
    pub merge_commits: Option<MergeMethod>,
    /// Rebase merging.
    pub rebase_merge: Option<Toggle>,
    /// Squash merging.
    pub squash_merge: Option<MergeMethod>,
}

/// Returns the JSON Schema of the `basic` fragment.
#[must_use]
pub fn basic_schema() -> Value {
    let toggle = json!({
        "type": "object",
        "properties": { "enabled": { "type": "boolean" } },
        "required": ["enabled"]
    });
    json!({
        "type": "object",
        "properties": {
            "description": { "type": "string" },
            "isTemplate": { "type": "boolean" },
            "defaultBranch": { "type": "string" },
            "visibility": { "enum": ["public", "private"] },
            "features": {
                "type": "object",
                "properties": {
                    "projects": toggle,
                    "issues": toggle,
                    "wiki": toggle
                }
            },
            "pullRequests": {
                "type": "object",
                "properties": {
                    "mergeCommits": merge_method_schema(
                        &["PR_TITLE", "MERGE_MESSAGE"],
                        &["PR_TITLE", "PR_BODY", "BLANK"],
                    ),
                    "rebaseMerge": toggle,
                    "squashMerge": merge_method_schema(
                        &["PR_TITLE", "COMMIT_OR_PR_TITLE"],
                        &["PR_BODY", "COMMIT_MESSAGES", "BLANK"],
                    )
                }
            },
            "suggestUpdatingPullRequestBranches": { "type": "boolean" },
            "allowAutoMerge": { "type": "boolean" },
            "deleteBranchOnMerge": { "type": "boolean" },
            "archived": { "type": "boolean" },
            "allowForking": { "type": "boolean" },
            "webCommitRequireSignOff": { "type": "boolean" }
        }
    })
}

/// Schema of a merge method with its allowed commit title/body sources.
fn merge_method_schema(titles: &[&str], bodies: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": {
            "enabled": { "type": "boolean" },
            "commit": {
                "type": "object",
                "properties": {
                    "title": { "enum": titles },
                    "body": { "enum": bodies }
                },
                "required": ["title", "body"]
            }
        },
        "required": ["enabled"]
    })
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates the fragment into platform repository fields.
#[must_use]
pub fn repository_settings(config: &BasicConfig) -> RepositorySettings {
    let mut settings = RepositorySettings::new();
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            settings.insert(key.to_string(), value);
        }
    };
    let features = config.features.as_ref();
    let pull_requests = config.pull_requests.as_ref();
    let squash = pull_requests.and_then(|prs| prs.squash_merge.as_ref());
    let merge = pull_requests.and_then(|prs| prs.merge_commits.as_ref());
    let squash_commit = squash.and_then(|method| method.commit.as_ref());
    let merge_commit = merge.and_then(|method| method.commit.as_ref());

    put("description", config.description.clone().map(Value::from));
    put("visibility", config.visibility.clone().map(Value::from));
    put("has_wiki", toggle(features.and_then(|f| f.wiki)));
    put("has_issues", toggle(features.and_then(|f| f.issues)));
    put("has_projects", toggle(features.and_then(|f| f.projects)));
    put("is_template", config.is_template.map(Value::from));
    put("default_branch", config.default_branch.clone().map(Value::from));
    put("allow_squash_merge", squash.map(|method| Value::from(method.enabled)));
    put("allow_merge_commit", merge.map(|method| Value::from(method.enabled)));
    put(
        "allow_rebase_merge",
        toggle(pull_requests.and_then(|prs| prs.rebase_merge)),
    );
    put("allow_auto_merge", config.allow_auto_merge.map(Value::from));
    put("delete_branch_on_merge", config.delete_branch_on_merge.map(Value::from));
    put(
        "allow_update_branch",
        config.suggest_updating_pull_request_branches.map(Value::from),
    );
    put("use_squash_pr_title_as_default", squash_commit.map(|_| Value::Bool(true)));
    put("squash_merge_commit_title", squash_commit.map(|c| Value::from(c.title.clone())));
    put("squash_merge_commit_message", squash_commit.map(|c| Value::from(c.body.clone())));
    put("merge_commit_title", merge_commit.map(|c| Value::from(c.title.clone())));
    put("merge_commit_message", merge_commit.map(|c| Value::from(c.body.clone())));
    put("archived", config.archived.map(Value::from));
    put("allow_forking", config.allow_forking.map(Value::from));
    put("web_commit_signoff_required", config.web_commit_require_sign_off.map(Value::from));
    settings
}

/// Converts an optional toggle into its boolean field value.
fn toggle(value: Option<Toggle>) -> Option<Value> {
    value.map(|toggle| Value::from(toggle.enabled))
}

// ============================================================================
// SECTION: Rule
// ============================================================================

/// Apply capability of the `basic` rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRule;

#[async_trait]
impl Apply for BasicRule {
    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let Some(config) = ctx.decode_config::<BasicConfig>()? else {
            return Ok(());
        };
        let settings = repository_settings(&config);
        if settings.is_empty() {
            return Ok(());
        }
        ctx.platform.update_repository(ctx.repo, &settings).await?;
        Ok(())
    }
}

/// Builds the `basic` rule under `name`.
#[must_use]
pub fn basic_rule(name: &str) -> Rule {
    Rule::new(name, basic_schema()).with_apply(Arc::new(BasicRule))
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use serde_json::json;

    use super::BasicConfig;
    use super::repository_settings;

    #[test]
    fn only_present_fields_are_translated() {
        let config: BasicConfig = serde_json::from_value(json!({
            "defaultBranch": "main",
            "features": { "wiki": { "enabled": false } },
            "pullRequests": {
                "squashMerge": {
                    "enabled": true,
                    "commit": { "title": "PR_TITLE", "body": "PR_BODY" }
                }
            },
            "deleteBranchOnMerge": true
        }))
        .unwrap();

        let settings = repository_settings(&config);

        assert_eq!(
            serde_json::Value::Object(settings),
            json!({
                "default_branch": "main",
                "has_wiki": false,
                "allow_squash_merge": true,
                "use_squash_pr_title_as_default": true,
                "squash_merge_commit_title": "PR_TITLE",
                "squash_merge_commit_message": "PR_BODY",
                "delete_branch_on_merge": true
            })
        );
    }

    #[test]
    fn squash_without_commit_leaves_title_default_alone() {
        let config: BasicConfig = serde_json::from_value(json!({
            "pullRequests": { "squashMerge": { "enabled": false } }
        }))
        .unwrap();
        assert_eq!(
            serde_json::Value::Object(repository_settings(&config)),
            json!({ "allow_squash_merge": false })
        );
    }

    #[test]
    fn empty_fragment_translates_to_nothing() {
        let config: BasicConfig = serde_json::from_value(json!({})).unwrap();
        assert!(repository_settings(&config).is_empty());
    }
}
