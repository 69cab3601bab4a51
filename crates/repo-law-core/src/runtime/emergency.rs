// crates/repo-law-core/src/runtime/emergency.rs
// ============================================================================
// Module: Emergency Approval
// Description: Out-of-band pull-request approval gated by a validator.
// Purpose: Record an approving review only when the validator allows it.
// Dependencies: crate::{core, interfaces, runtime}, async-trait, globset
// ============================================================================

//! ## Overview
//! Emergency approval is independent of the run lifecycle. The configured
//! [`ApprovalValidator`] decides first; a deny aborts with its reason and the
//! platform is never asked to approve.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::RepoRef;
use crate::interfaces::Platform;
use crate::interfaces::PlatformError;
use crate::runtime::scanner::RepoPatterns;
use crate::runtime::scanner::ScanError;
use crate::runtime::scanner::compile_patterns;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pull request targeted by an emergency approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    /// Repository holding the pull request.
    pub repo: RepoRef,
    /// Pull request number.
    pub number: u64,
}

/// Validator verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Approval may be recorded.
    Allow,
    /// Approval must not be recorded.
    Deny {
        /// Optional explanation.
        reason: Option<String>,
    },
}

/// Emergency approval failures.
#[derive(Debug, Error)]
pub enum EmergencyError {
    /// The validator denied the approval.
    #[error("could not approve, reason: {reason}")]
    Denied {
        /// Denial reason.
        reason: String,
    },
    /// The validator itself failed.
    #[error("approval validator failed: {0}")]
    Validator(String),
    /// Recording the review failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Decides whether an emergency approval may proceed.
#[async_trait]
pub trait ApprovalValidator: Send + Sync {
    /// Returns the verdict for a request.
    ///
    /// # Errors
    ///
    /// Returns [`EmergencyError::Validator`] when a verdict cannot be reached.
    async fn decide(&self, request: &ApprovalRequest) -> Result<ApprovalDecision, EmergencyError>;
}

// ============================================================================
// SECTION: Approval
// ============================================================================

/// Records an approving review when the validator allows it.
///
/// # Errors
///
/// Returns [`EmergencyError::Denied`] on a deny verdict, or the validator or
/// platform failure otherwise.
pub async fn emergency_approve(
    platform: &dyn Platform,
    validator: &dyn ApprovalValidator,
    request: &ApprovalRequest,
) -> Result<(), EmergencyError> {
    match validator.decide(request).await? {
        ApprovalDecision::Allow => {
            platform.approve_pull_request(&request.repo, request.number).await?;
            Ok(())
        }
        ApprovalDecision::Deny {
            reason,
        } => Err(EmergencyError::Denied {
            reason: reason.unwrap_or_else(|| "no reason given".to_string()),
        }),
    }
}

// ============================================================================
// SECTION: Built-in Validators
// ============================================================================

/// Allows every request.
pub struct AllowAll;

#[async_trait]
impl ApprovalValidator for AllowAll {
    async fn decide(&self, _request: &ApprovalRequest) -> Result<ApprovalDecision, EmergencyError> {
        Ok(ApprovalDecision::Allow)
    }
}

/// Denies every request with a fixed reason.
pub struct DenyAll {
    /// Reason reported on denial.
    pub reason: Option<String>,
}

#[async_trait]
impl ApprovalValidator for DenyAll {
    async fn decide(&self, _request: &ApprovalRequest) -> Result<ApprovalDecision, EmergencyError> {
        Ok(ApprovalDecision::Deny {
            reason: self.reason.clone(),
        })
    }
}

/// Allows requests whose repository matches an `owner/name` glob.
pub struct AllowListed {
    /// Compiled allow list; `None` allows nothing.
    filter: Option<RepoPatterns>,
}

impl AllowListed {
    /// Compiles the allow list.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pattern`] for an invalid pattern.
    pub fn new(patterns: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            filter: compile_patterns(patterns)?,
        })
    }
}

#[async_trait]
impl ApprovalValidator for AllowListed {
    async fn decide(&self, request: &ApprovalRequest) -> Result<ApprovalDecision, EmergencyError> {
        let name = request.repo.full_name();
        if self.filter.as_ref().is_some_and(|filter| filter.is_match(&name)) {
            Ok(ApprovalDecision::Allow)
        } else {
            Ok(ApprovalDecision::Deny {
                reason: Some(format!("{name} is not on the emergency allow list")),
            })
        }
    }
}
