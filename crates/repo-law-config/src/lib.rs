// crates/repo-law-config/src/lib.rs
// ============================================================================
// Module: Repo Law Config
// Description: Operator configuration model, validation, and assembly.
// Purpose: Single source of truth for `repo-law.toml` semantics.
// Dependencies: repo-law-core, repo-law-github, repo-law-rules, serde, toml
// ============================================================================

//! ## Overview
//! This crate owns the operator configuration: the TOML model with its
//! defaults, fail-closed validation, and assembly of the runtime pieces
//! (rule set, run options, API client settings, audit sink, emergency
//! approval validator).

// ============================================================================
// SECTION: Modules
// ============================================================================

mod assembly;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditSection;
pub use config::AuditSinkKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::EmergencyMode;
pub use config::EmergencySection;
pub use config::GitHubSection;
pub use config::KnownEnvironmentConfig;
pub use config::ManagedSecret;
pub use config::RepoLawConfig;
pub use config::RuleConfig;
pub use config::RunSection;
pub use config::SecretSource;
