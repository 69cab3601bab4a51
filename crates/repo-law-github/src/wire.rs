// crates/repo-law-github/src/wire.rs
// ============================================================================
// Module: GitHub Wire Payloads
// Description: Response and request bodies of the GitHub REST API.
// Purpose: Keep serde shapes of the remote API out of the client logic.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Only the fields the client reads are modeled; unknown fields are ignored.

use serde::Deserialize;
use serde::Serialize;

/// `GET /repos/{owner}/{repo}/contents/{path}` entry.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentEntry {
    /// Entry type (`file`, `dir`, `symlink`, `submodule`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Transfer encoding of `content`.
    #[serde(default)]
    pub encoding: Option<String>,
    /// Encoded file content.
    #[serde(default)]
    pub content: Option<String>,
}

/// Repository owner.
#[derive(Debug, Deserialize)]
pub(crate) struct OwnerEntry {
    /// Owner login.
    pub login: String,
}

/// `GET /user/repos` entry.
#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryEntry {
    /// Repository name.
    pub name: String,
    /// Repository owner.
    pub owner: OwnerEntry,
}

/// Environment protection rule.
#[derive(Debug, Deserialize)]
pub(crate) struct ProtectionRule {
    /// Rule type (`wait_timer`, `required_reviewers`, `branch_policy`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Wait timer in minutes for `wait_timer` rules.
    #[serde(default)]
    pub wait_timer: Option<u32>,
}

/// `GET /repos/{owner}/{repo}/environments` entry.
#[derive(Debug, Deserialize)]
pub(crate) struct EnvironmentEntry {
    /// Environment name.
    pub name: String,
    /// Whether administrators may bypass protection rules.
    #[serde(default)]
    pub can_admins_bypass: Option<bool>,
    /// Configured protection rules.
    #[serde(default)]
    pub protection_rules: Vec<ProtectionRule>,
}

/// `GET /repos/{owner}/{repo}/environments` body.
#[derive(Debug, Deserialize)]
pub(crate) struct EnvironmentList {
    /// Environments on this page.
    #[serde(default)]
    pub environments: Vec<EnvironmentEntry>,
}

/// Secret listing entry.
#[derive(Debug, Deserialize)]
pub(crate) struct SecretEntry {
    /// Secret name.
    pub name: String,
}

/// Secret listing body.
#[derive(Debug, Deserialize)]
pub(crate) struct SecretList {
    /// Secrets on this page.
    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
}

/// Pull request review request body.
#[derive(Debug, Serialize)]
pub(crate) struct ReviewRequest {
    /// Review event.
    pub event: &'static str,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    /// Error message.
    pub message: String,
}
