// crates/repo-law-rules/src/providers.rs
// ============================================================================
// Module: Secret Providers
// Description: Environment-backed and fixed-value secret providers.
// Purpose: Supply managed secret values at enrollment time.
// Dependencies: repo-law-core, async-trait
// ============================================================================

//! ## Overview
//! Providers map a managed secret name to its value. The environment
//! provider reads the process environment at fetch time, never at
//! construction time, so values are not held longer than a single upsert.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;

use async_trait::async_trait;
use repo_law_core::SecretError;
use repo_law_core::SecretProvider;

/// Default upper bound for a single secret value.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 48 * 1024;

// ============================================================================
// SECTION: Environment Provider
// ============================================================================

/// Provider resolving secret names through environment variables.
///
/// # Invariants
/// - Only names present in `variables` are resolved.
/// - Values larger than `max_value_bytes` fail instead of being truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSecretProvider {
    /// Secret name to environment variable name.
    variables: BTreeMap<String, String>,
    /// Maximum accepted value size.
    max_value_bytes: usize,
}

impl EnvSecretProvider {
    /// Creates a provider from a secret-name to variable-name map.
    #[must_use]
    pub const fn new(variables: BTreeMap<String, String>) -> Self {
        Self {
            variables,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
        }
    }

    /// Overrides the value size limit.
    #[must_use]
    pub const fn with_max_value_bytes(mut self, max_value_bytes: usize) -> Self {
        self.max_value_bytes = max_value_bytes;
        self
    }

    /// Returns the variable backing a secret name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn fetch(&self, name: &str) -> Result<Option<String>, SecretError> {
        let Some(variable) = self.variables.get(name) else {
            return Ok(None);
        };
        match env::var(variable) {
            Ok(value) if value.len() > self.max_value_bytes => Err(SecretError::Provider(
                format!("value of {variable} exceeds {} bytes", self.max_value_bytes),
            )),
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(SecretError::Provider(format!("value of {variable} is not unicode")))
            }
        }
    }
}

// ============================================================================
// SECTION: Static Provider
// ============================================================================

/// Provider returning fixed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSecretProvider {
    /// Secret name to value.
    values: BTreeMap<String, String>,
}

impl StaticSecretProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn fetch(&self, name: &str) -> Result<Option<String>, SecretError> {
        Ok(self.values.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::collections::BTreeMap;

    use repo_law_core::SecretError;
    use repo_law_core::SecretProvider;

    use super::EnvSecretProvider;
    use super::StaticSecretProvider;

    fn provider(name: &str, variable: &str) -> EnvSecretProvider {
        EnvSecretProvider::new(BTreeMap::from([(name.to_string(), variable.to_string())]))
    }

    #[tokio::test]
    async fn unmapped_names_resolve_to_none() {
        let provider = provider("NPM_TOKEN", "REPO_LAW_TEST_UNMAPPED");
        assert_eq!(provider.fetch("OTHER").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_variables_resolve_to_none() {
        let provider = provider("NPM_TOKEN", "REPO_LAW_TEST_SURELY_UNSET_VARIABLE");
        assert_eq!(provider.fetch("NPM_TOKEN").await.unwrap(), None);
    }

    #[tokio::test]
    async fn present_variables_are_read_at_fetch_time() {
        // PATH is set in every test environment.
        let provider = provider("TOOLS", "PATH");
        assert!(provider.fetch("TOOLS").await.unwrap().is_some());
        let limited = provider.with_max_value_bytes(0);
        assert!(matches!(limited.fetch("TOOLS").await, Err(SecretError::Provider(_))));
    }

    #[tokio::test]
    async fn static_provider_returns_fixed_values() {
        let provider = StaticSecretProvider::new().with("A", "1");
        assert_eq!(provider.fetch("A").await.unwrap().as_deref(), Some("1"));
        assert_eq!(provider.fetch("B").await.unwrap(), None);
    }
}
