// crates/repo-law-core/src/runtime/mod.rs
// ============================================================================
// Module: Repo Law Runtime
// Description: Rule contract, configuration loading, and run execution.
// Purpose: Drive policy rules against repositories and collect compliance.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the rule contract, the memoized configuration
//! loader, the per-repository run state machine, repository discovery, fleet
//! execution, and emergency approval. The in-memory platform and memory audit
//! sink support tests and offline evaluation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod emergency;
pub mod files;
pub mod fleet;
pub mod loader;
pub mod memory;
pub mod rule;
pub mod run;
pub mod scanner;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use emergency::AllowAll;
pub use emergency::AllowListed;
pub use emergency::ApprovalDecision;
pub use emergency::ApprovalRequest;
pub use emergency::ApprovalValidator;
pub use emergency::DenyAll;
pub use emergency::EmergencyError;
pub use emergency::emergency_approve;
pub use files::RepoFiles;
pub use fleet::run_fleet;
pub use loader::ConfigLoader;
pub use loader::PolicySchema;
pub use memory::InMemoryPlatform;
pub use memory::PlatformCall;
pub use rule::Apply;
pub use rule::Enforce;
pub use rule::Enroll;
pub use rule::Rule;
pub use rule::RuleContext;
pub use rule::RuleError;
pub use rule::RuleSet;
pub use rule::RuleSetError;
pub use rule::Unroll;
pub use rule::Validate;
pub use run::DEFAULT_CONFIG_LOCATION;
pub use run::Engine;
pub use run::Run;
pub use run::RunError;
pub use run::RunOptions;
pub use scanner::Discovery;
pub use scanner::RepoPatterns;
pub use scanner::ScanError;
pub use scanner::Scanner;
pub use validation::Findings;
pub use validation::ValidationContext;
