// crates/repo-law-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for repo-law-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use repo_law_config::ConfigError;
use repo_law_config::RepoLawConfig;

pub type TestResult = Result<(), String>;

/// Parses and validates a TOML string.
pub fn config_from_toml(toml_str: &str) -> Result<RepoLawConfig, String> {
    RepoLawConfig::parse(toml_str).map_err(|err| err.to_string())
}

/// Asserts that parsing fails with a message containing `needle`.
pub fn assert_rejected(toml_str: &str, needle: &str) -> TestResult {
    match RepoLawConfig::parse(toml_str) {
        Err(error) => assert_message(&error, needle),
        Ok(_) => Err(format!("expected config to be rejected: {toml_str}")),
    }
}

/// Checks that an error message contains `needle`.
pub fn assert_message(error: &ConfigError, needle: &str) -> TestResult {
    let message = error.to_string();
    if message.contains(needle) {
        Ok(())
    } else {
        Err(format!("error {message} did not contain {needle}"))
    }
}
