// crates/repo-law-core/src/interfaces/mod.rs
// ============================================================================
// Module: Repo Law Interfaces
// Description: Backend-agnostic interfaces for the platform, audit, and secrets.
// Purpose: Define the contract surfaces consumed by the rule execution engine.
// Dependencies: crate::core, async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine reaches the hosting platform, where
//! operator-visible events go, and how managed secret values are obtained.
//! Implementations live outside the core (HTTP client, sinks, providers) or
//! in [`crate::runtime`] for tests and offline use.
//!
//! Every platform call is an await point; the engine never issues two calls
//! concurrently within one run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::Phase;
use crate::core::RepoRef;

// ============================================================================
// SECTION: Platform Errors
// ============================================================================

/// Remote platform failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `NotFound` is only produced by lookups that have no "absent" return.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The platform answered with a non-success status.
    #[error("platform returned status {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response detail.
        message: String,
    },
    /// The request did not complete.
    #[error("platform transport error: {0}")]
    Transport(String),
    /// The response could not be decoded.
    #[error("platform response decode error: {0}")]
    Decode(String),
}

// ============================================================================
// SECTION: Platform Data
// ============================================================================

/// One page of repositories visible to the authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryPage {
    /// Repositories on this page, in platform order.
    pub repositories: Vec<RepoRef>,
    /// Page number to request next, if any.
    pub next_page: Option<u32>,
}

/// Deployment environment as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSummary {
    /// Environment name.
    pub name: String,
    /// Wait timer in minutes, when configured.
    #[serde(default)]
    pub wait_timer: Option<u32>,
    /// Whether administrators may bypass protection rules.
    #[serde(default)]
    pub can_admins_bypass: Option<bool>,
}

/// Reviewer principal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewerKind {
    /// Individual user.
    User,
    /// Organization team.
    Team,
}

/// Required reviewer for an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    /// Principal type.
    #[serde(rename = "type")]
    pub kind: ReviewerKind,
    /// Platform identifier of the principal.
    pub id: u64,
}

/// Deployment branch restriction for an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentBranchPolicy {
    /// Only protected branches may deploy.
    pub protected_branches: bool,
    /// Custom branch/tag patterns decide who may deploy.
    pub custom_branch_policies: bool,
}

/// Desired environment settings sent on create or update.
///
/// # Invariants
/// - `None` fields are omitted and leave the platform default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSettings {
    /// Wait timer in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_timer: Option<u32>,
    /// Prevent the deployer from approving their own deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevent_self_review: Option<bool>,
    /// Required reviewers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewers: Option<Vec<Reviewer>>,
    /// Allow administrators to bypass protection rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_admins_bypass: Option<bool>,
    /// Deployment branch restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_branch_policy: Option<DeploymentBranchPolicy>,
}

/// Public key published by the platform for secret encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// Key identifier echoed back when storing secrets.
    pub key_id: String,
    /// Base64-encoded X25519 public key.
    pub key: String,
}

/// Secret value sealed for the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// Identifier of the key used to seal.
    pub key_id: String,
    /// Base64-encoded sealed box.
    pub encrypted_value: String,
}

/// Repository settings patch (platform field names).
pub type RepositorySettings = Map<String, Value>;

// ============================================================================
// SECTION: Platform Client
// ============================================================================

/// Remote repository platform client.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Reads a file from a repository.
    ///
    /// Returns `Ok(None)` when the path does not exist or is not a file.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] for every failure other than "not found".
    async fn read_file(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>, PlatformError>;

    /// Lists one page of repositories accessible to the authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the listing fails.
    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<RepositoryPage, PlatformError>;

    /// Applies a settings patch to a repository.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the update is rejected.
    async fn update_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), PlatformError>;

    /// Lists deployment environments of a repository.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the listing fails.
    async fn list_environments(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<EnvironmentSummary>, PlatformError>;

    /// Creates or updates a deployment environment.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the update is rejected.
    async fn upsert_environment(
        &self,
        repo: &RepoRef,
        name: &str,
        settings: &EnvironmentSettings,
    ) -> Result<(), PlatformError>;

    /// Deletes a deployment environment.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the deletion fails.
    async fn delete_environment(&self, repo: &RepoRef, name: &str) -> Result<(), PlatformError>;

    /// Fetches the secret-encryption key of an environment, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the lookup fails.
    async fn environment_public_key(
        &self,
        repo: &RepoRef,
        environment: &str,
    ) -> Result<Option<PublicKey>, PlatformError>;

    /// Lists secret names stored in an environment.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the listing fails.
    async fn list_environment_secrets(
        &self,
        repo: &RepoRef,
        environment: &str,
    ) -> Result<Vec<String>, PlatformError>;

    /// Creates or updates an environment secret.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the write is rejected.
    async fn put_environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<(), PlatformError>;

    /// Deletes an environment secret.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the deletion fails.
    async fn delete_environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
    ) -> Result<(), PlatformError>;

    /// Fetches the repository secret-encryption key.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the lookup fails.
    async fn repository_public_key(&self, repo: &RepoRef) -> Result<PublicKey, PlatformError>;

    /// Lists repository-level secret names.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the listing fails.
    async fn list_repository_secrets(&self, repo: &RepoRef) -> Result<Vec<String>, PlatformError>;

    /// Creates or updates a repository-level secret.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the write is rejected.
    async fn put_repository_secret(
        &self,
        repo: &RepoRef,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<(), PlatformError>;

    /// Deletes a repository-level secret.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the deletion fails.
    async fn delete_repository_secret(&self, repo: &RepoRef, name: &str)
    -> Result<(), PlatformError>;

    /// Records an approving review on a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the review is rejected.
    async fn approve_pull_request(&self, repo: &RepoRef, number: u64)
    -> Result<(), PlatformError>;
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Outcome label attached to run audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The phase began.
    Started,
    /// The phase finished without error.
    Completed,
    /// The phase was not entered.
    Skipped,
    /// The phase aborted with an error.
    Failed,
}

/// Lifecycle event emitted by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Repository `owner/name`.
    pub repository: String,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Rule involved, when the event is rule-scoped.
    pub rule: Option<String>,
    /// Phase outcome.
    pub outcome: AuditOutcome,
    /// Optional detail (error text, skip reason).
    pub detail: Option<String>,
}

/// Error-kind validation message surfaced at the moment it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Repository `owner/name`.
    pub repository: String,
    /// Originating rule.
    pub rule: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Operator-visible sink for run events.
pub trait AuditSink: Send + Sync {
    /// Records a lifecycle event.
    fn record(&self, event: &RunAuditEvent);

    /// Records an error-kind validation message.
    fn record_validation(&self, _event: &ValidationAuditEvent) {}
}

// ============================================================================
// SECTION: Secret Provider
// ============================================================================

/// Secret value lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    /// The provider could not produce a value.
    #[error("secret provider error: {0}")]
    Provider(String),
}

/// Deferred source of a managed secret value.
///
/// Values are fetched at enrollment time, never at configuration time.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetches the current value of the named secret.
    ///
    /// Returns `Ok(None)` when the provider has no value for the name.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError`] when the lookup fails.
    async fn fetch(&self, name: &str) -> Result<Option<String>, SecretError>;
}
