// crates/repo-law-core/src/lib.rs
// ============================================================================
// Module: Repo Law Core Library
// Description: Public API surface for the repository policy engine.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Repo Law reads a policy document committed in each repository, reconciles
//! the repository toward it through a set of rules, judges compliance, and
//! enrolls or unrolls privileged state accordingly. The core is
//! platform-agnostic and reaches the hosting service only through
//! [`interfaces::Platform`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuditOutcome;
pub use interfaces::AuditSink;
pub use interfaces::DeploymentBranchPolicy;
pub use interfaces::EnvironmentSettings;
pub use interfaces::EnvironmentSummary;
pub use interfaces::Platform;
pub use interfaces::PlatformError;
pub use interfaces::PublicKey;
pub use interfaces::RepositoryPage;
pub use interfaces::RepositorySettings;
pub use interfaces::Reviewer;
pub use interfaces::ReviewerKind;
pub use interfaces::RunAuditEvent;
pub use interfaces::SealedSecret;
pub use interfaces::SecretError;
pub use interfaces::SecretProvider;
pub use interfaces::ValidationAuditEvent;
pub use runtime::AllowAll;
pub use runtime::AllowListed;
pub use runtime::Apply;
pub use runtime::ApprovalDecision;
pub use runtime::ApprovalRequest;
pub use runtime::ApprovalValidator;
pub use runtime::ConfigLoader;
pub use runtime::DEFAULT_CONFIG_LOCATION;
pub use runtime::DenyAll;
pub use runtime::Discovery;
pub use runtime::EmergencyError;
pub use runtime::Enforce;
pub use runtime::Engine;
pub use runtime::Enroll;
pub use runtime::FileAuditSink;
pub use runtime::Findings;
pub use runtime::InMemoryPlatform;
pub use runtime::MemoryAuditSink;
pub use runtime::NoopAuditSink;
pub use runtime::PlatformCall;
pub use runtime::PolicySchema;
pub use runtime::RepoFiles;
pub use runtime::RepoPatterns;
pub use runtime::Rule;
pub use runtime::RuleContext;
pub use runtime::RuleError;
pub use runtime::RuleSet;
pub use runtime::RuleSetError;
pub use runtime::Run;
pub use runtime::RunError;
pub use runtime::RunOptions;
pub use runtime::ScanError;
pub use runtime::Scanner;
pub use runtime::StderrAuditSink;
pub use runtime::Unroll;
pub use runtime::Validate;
pub use runtime::ValidationContext;
pub use runtime::emergency_approve;
pub use runtime::run_fleet;
