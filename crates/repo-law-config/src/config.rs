// crates/repo-law-config/src/config.rs
// ============================================================================
// Module: Repo Law Configuration
// Description: Operator configuration loading and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: repo-law-core, serde, toml
// ============================================================================

//! ## Overview
//! Operator configuration is loaded from a TOML file with strict size and
//! path limits, then validated as a whole before anything is assembled from
//! it. Secret values never appear in the file; only the names of the
//! environment variables that hold them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use repo_law_core::DEFAULT_CONFIG_LOCATION;
use repo_law_core::runtime::fleet::MAX_CONCURRENCY;
use repo_law_core::runtime::scanner::compile_patterns;
use repo_law_github::DEFAULT_API_URL;
use repo_law_rules::BASIC_RULE;
use repo_law_rules::CODEOWNER_RULE;
use repo_law_rules::ENVIRONMENTS_RULE;
use repo_law_rules::SECRETS_RULE;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "repo-law.toml";
/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "REPO_LAW_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Lower bound for the API timeout.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Upper bound for the API timeout.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Upper bound for the repository listing page size.
pub(crate) const MAX_PAGE_SIZE: u32 = 100;
/// Maximum number of registered rules.
pub(crate) const MAX_RULES: usize = 64;
/// Default environment variable holding the API token.
const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

// ============================================================================
// SECTION: Top-Level Configuration
// ============================================================================

/// Operator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoLawConfig {
    /// Repository path of the policy document.
    #[serde(default = "default_config_location")]
    pub config_location: String,
    /// Platform connection settings.
    #[serde(default)]
    pub github: GitHubSection,
    /// Run behavior.
    #[serde(default)]
    pub run: RunSection,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditSection,
    /// Registered rules in registration order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    /// Emergency approval policy.
    #[serde(default)]
    pub emergency: Option<EmergencySection>,
}

impl Default for RepoLawConfig {
    fn default() -> Self {
        Self {
            config_location: default_config_location(),
            github: GitHubSection::default(),
            run: RunSection::default(),
            audit: AuditSection::default(),
            rules: Vec::new(),
            emergency: None,
        }
    }
}

impl RepoLawConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `REPO_LAW_CONFIG`, then
    /// `repo-law.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("config_location", &self.config_location)?;
        self.github.validate()?;
        self.run.validate()?;
        self.audit.validate()?;
        validate_rules(&self.rules)?;
        if let Some(emergency) = &self.emergency {
            emergency.validate()?;
        }
        Ok(())
    }
}

/// Default policy-document location.
fn default_config_location() -> String {
    DEFAULT_CONFIG_LOCATION.to_string()
}

// ============================================================================
// SECTION: GitHub
// ============================================================================

/// Platform connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubSection {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Optional user agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Repository listing page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
            timeout_ms: default_timeout_ms(),
            user_agent: None,
            page_size: default_page_size(),
        }
    }
}

impl GitHubSection {
    /// Validates connection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("github.api_url must be non-empty".to_string()));
        }
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::Invalid("github.token_env must be non-empty".to_string()));
        }
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "github.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid(format!(
                "github.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.user_agent.as_ref().is_some_and(|agent| agent.trim().is_empty()) {
            return Err(ConfigError::Invalid("github.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Default API base URL.
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Default token variable.
fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

/// Default API timeout.
const fn default_timeout_ms() -> u64 {
    10_000
}

/// Default listing page size.
const fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Run behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Run the enforce phase.
    #[serde(default)]
    pub enforce: bool,
    /// Number of repositories processed at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            enforce: false,
            concurrency: default_concurrency(),
        }
    }
}

impl RunSection {
    /// Validates run settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::Invalid(format!(
                "run.concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }
        Ok(())
    }
}

/// Sequential by default.
const fn default_concurrency() -> usize {
    1
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    #[serde(rename = "none")]
    Disabled,
}

/// Audit sink selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file for the `file` sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditSection {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("audit.path", path),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Registered rule, tagged by type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Repository settings rule.
    Basic {
        /// Registration name override.
        #[serde(default)]
        name: Option<String>,
    },
    /// Code owners presence rule.
    Codeowner {
        /// Registration name override.
        #[serde(default)]
        name: Option<String>,
        /// Code owners file path.
        #[serde(default)]
        path: Option<String>,
    },
    /// Managed repository secrets rule.
    Secrets {
        /// Registration name override.
        #[serde(default)]
        name: Option<String>,
        /// Managed secrets.
        #[serde(default)]
        managed: Vec<ManagedSecret>,
    },
    /// Deployment environments rule.
    Environments {
        /// Registration name override.
        #[serde(default)]
        name: Option<String>,
        /// Known environments by name.
        #[serde(default)]
        known: BTreeMap<String, KnownEnvironmentConfig>,
    },
}

impl RuleConfig {
    /// Returns the registration name (the type label unless overridden).
    #[must_use]
    pub fn name(&self) -> &str {
        let (name, label) = match self {
            Self::Basic {
                name,
            } => (name, BASIC_RULE),
            Self::Codeowner {
                name, ..
            } => (name, CODEOWNER_RULE),
            Self::Secrets {
                name, ..
            } => (name, SECRETS_RULE),
            Self::Environments {
                name, ..
            } => (name, ENVIRONMENTS_RULE),
        };
        name.as_deref().unwrap_or(label)
    }
}

/// Managed repository secret and its value source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagedSecret {
    /// Secret name on the platform.
    pub name: String,
    /// Environment variable supplying the value.
    pub env: String,
}

/// Known environment declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnownEnvironmentConfig {
    /// Managed secrets by name.
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretSource>,
}

/// Value source of a managed secret.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretSource {
    /// Environment variable supplying the value.
    pub env: String,
}

/// Validates the rule list.
fn validate_rules(rules: &[RuleConfig]) -> Result<(), ConfigError> {
    if rules.len() > MAX_RULES {
        return Err(ConfigError::Invalid(format!("rules exceeds max entries ({MAX_RULES})")));
    }
    let mut names = BTreeSet::new();
    for rule in rules {
        let name = rule.name();
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("rules.name must be non-empty".to_string()));
        }
        if !names.insert(name) {
            return Err(ConfigError::Invalid(format!("duplicate rule name: {name}")));
        }
        match rule {
            RuleConfig::Basic {
                ..
            } => {}
            RuleConfig::Codeowner {
                path, ..
            } => {
                if let Some(path) = path {
                    validate_path_string(&format!("rules.{name}.path"), path)?;
                }
            }
            RuleConfig::Secrets {
                managed, ..
            } => {
                let mut seen = BTreeSet::new();
                for secret in managed {
                    validate_secret_name(name, &secret.name)?;
                    validate_env_name(name, &secret.name, &secret.env)?;
                    if !seen.insert(secret.name.as_str()) {
                        return Err(ConfigError::Invalid(format!(
                            "rules.{name}.managed lists {} twice",
                            secret.name
                        )));
                    }
                }
            }
            RuleConfig::Environments {
                known, ..
            } => {
                for (environment, declaration) in known {
                    if environment.trim().is_empty() {
                        return Err(ConfigError::Invalid(format!(
                            "rules.{name}.known has an empty environment name"
                        )));
                    }
                    for (secret, source) in &declaration.secrets {
                        validate_secret_name(name, secret)?;
                        validate_env_name(name, secret, &source.env)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Validates a managed secret name.
fn validate_secret_name(rule: &str, secret: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("rules.{rule} has an empty secret name")));
    }
    Ok(())
}

/// Validates the variable name supplying a secret.
fn validate_env_name(rule: &str, secret: &str, variable: &str) -> Result<(), ConfigError> {
    if variable.trim().is_empty() || variable.contains('=') || variable.contains('\0') {
        return Err(ConfigError::Invalid(format!(
            "rules.{rule} secret {secret} has an invalid env variable name"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Emergency
// ============================================================================

/// Emergency approval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyMode {
    /// Approve every request.
    Allow,
    /// Refuse every request.
    Deny,
    /// Approve requests on matching repositories.
    AllowListed,
}

/// Emergency approval policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmergencySection {
    /// Decision mode.
    pub mode: EmergencyMode,
    /// Repository glob patterns for `allow_listed`.
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Refusal text for `deny`.
    #[serde(default)]
    pub reason: Option<String>,
}

impl EmergencySection {
    /// Validates the emergency policy.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == EmergencyMode::AllowListed {
            if self.repositories.is_empty() {
                return Err(ConfigError::Invalid(
                    "emergency.repositories is required for allow_listed".to_string(),
                ));
            }
            compile_patterns(&self.repositories)
                .map_err(|err| ConfigError::Invalid(format!("emergency.repositories: {err}")))?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::MAX_PATH_COMPONENT_LENGTH;
    use super::validate_path_string;

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        let result = validate_path_string("config_location", "   ");
        assert!(result.unwrap_err().to_string().contains("config_location must be non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let path = format!(".github/{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        let result = validate_path_string("config_location", &path);
        assert!(result.unwrap_err().to_string().contains("component too long"));
    }

    #[test]
    fn validate_path_string_accepts_nested_paths() {
        assert!(validate_path_string("config_location", ".github/law.yml").is_ok());
    }
}
