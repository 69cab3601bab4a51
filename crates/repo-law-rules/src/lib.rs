// crates/repo-law-rules/src/lib.rs
// ============================================================================
// Module: Repo Law Rules
// Description: Built-in policy rules, secret sealing, and secret providers.
// Purpose: Ship the rules a typical organization registers.
// Dependencies: repo-law-core, crypto_box, base64, serde
// ============================================================================

//! ## Overview
//! Built-in rules are plain capability implementations wrapped into
//! [`repo_law_core::Rule`] records by the `*_rule` constructors. Each
//! constructor takes the registration name so operators can register a rule
//! under a different key.
//! Invariants:
//! - Rules without a configuration fragment leave the repository untouched,
//!   except `unroll`, which always removes managed secrets.
//! - Secret values are fetched from a provider at enrollment time and sealed
//!   before they leave the process.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod basic;
pub mod codeowner;
pub mod environments;
pub mod providers;
pub mod removal;
pub mod seal;
pub mod secrets;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use basic::BASIC_RULE;
pub use basic::BasicRule;
pub use basic::basic_rule;
pub use codeowner::CODEOWNER_RULE;
pub use codeowner::CodeownerRule;
pub use codeowner::DEFAULT_CODEOWNERS_PATH;
pub use codeowner::codeowner_rule;
pub use environments::ENVIRONMENTS_RULE;
pub use environments::EnvironmentsRule;
pub use environments::KnownEnvironment;
pub use environments::environments_rule;
pub use providers::EnvSecretProvider;
pub use providers::StaticSecretProvider;
pub use removal::removal_set;
pub use seal::seal_secret;
pub use secrets::SECRETS_RULE;
pub use secrets::SecretsRule;
pub use secrets::secrets_rule;
