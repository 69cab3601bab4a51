// crates/repo-law-config/src/assembly.rs
// ============================================================================
// Module: Runtime Assembly
// Description: Builds runtime components from validated configuration.
// Purpose: Turn operator settings into rule sets, sinks, and clients.
// Dependencies: repo-law-core, repo-law-github, repo-law-rules
// ============================================================================

//! ## Overview
//! Assembly assumes [`RepoLawConfig::validate`] already passed; remaining
//! failures come from resources that only exist at runtime, such as the
//! audit log file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use repo_law_core::AllowAll;
use repo_law_core::AllowListed;
use repo_law_core::ApprovalValidator;
use repo_law_core::AuditSink;
use repo_law_core::DenyAll;
use repo_law_core::FileAuditSink;
use repo_law_core::NoopAuditSink;
use repo_law_core::Rule;
use repo_law_core::RuleSet;
use repo_law_core::RunOptions;
use repo_law_core::StderrAuditSink;
use repo_law_github::GitHubClientConfig;
use repo_law_rules::CodeownerRule;
use repo_law_rules::EnvSecretProvider;
use repo_law_rules::EnvironmentsRule;
use repo_law_rules::KnownEnvironment;
use repo_law_rules::SecretsRule;
use repo_law_rules::basic_rule;
use repo_law_rules::codeowner_rule;
use repo_law_rules::environments_rule;
use repo_law_rules::secrets_rule;

use crate::config::AuditSinkKind;
use crate::config::ConfigError;
use crate::config::EmergencyMode;
use crate::config::RepoLawConfig;
use crate::config::RuleConfig;

// ============================================================================
// SECTION: Assembly
// ============================================================================

impl RepoLawConfig {
    /// Builds the rule set in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a rule cannot be registered.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::from_rules(self.rules.iter().map(build_rule))
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Builds run options; `enforce` forces the enforce phase on.
    #[must_use]
    pub fn run_options(&self, enforce: bool) -> RunOptions {
        RunOptions {
            config_location: self.config_location.clone(),
            enforce: enforce || self.run.enforce,
            git_ref: None,
        }
    }

    /// Builds the API client settings, reading the token variable now.
    #[must_use]
    pub fn github_client_config(&self) -> GitHubClientConfig {
        let defaults = GitHubClientConfig::default();
        GitHubClientConfig {
            api_url: self.github.api_url.clone(),
            token: env::var(&self.github.token_env).ok().filter(|token| !token.is_empty()),
            timeout: Duration::from_millis(self.github.timeout_ms),
            user_agent: self.github.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        match self.audit.sink {
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::Disabled => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::File => {
                let path = self.audit.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for the file sink".to_string())
                })?;
                let sink = FileAuditSink::new(Path::new(path))
                    .map_err(|err| ConfigError::Io(format!("{path}: {err}")))?;
                Ok(Arc::new(sink))
            }
        }
    }

    /// Builds the emergency approval validator, when configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when allow-list patterns do not compile.
    pub fn approval_validator(&self) -> Result<Option<Arc<dyn ApprovalValidator>>, ConfigError> {
        let Some(emergency) = &self.emergency else {
            return Ok(None);
        };
        let validator: Arc<dyn ApprovalValidator> = match emergency.mode {
            EmergencyMode::Allow => Arc::new(AllowAll),
            EmergencyMode::Deny => Arc::new(DenyAll {
                reason: emergency.reason.clone(),
            }),
            EmergencyMode::AllowListed => Arc::new(
                AllowListed::new(&emergency.repositories)
                    .map_err(|err| ConfigError::Invalid(format!("emergency.repositories: {err}")))?,
            ),
        };
        Ok(Some(validator))
    }
}

/// Builds one rule from its declaration.
fn build_rule(config: &RuleConfig) -> Rule {
    let name = config.name();
    match config {
        RuleConfig::Basic {
            ..
        } => basic_rule(name),
        RuleConfig::Codeowner {
            path, ..
        } => {
            let rule = path.as_deref().map_or_else(CodeownerRule::default, CodeownerRule::new);
            codeowner_rule(name, rule)
        }
        RuleConfig::Secrets {
            managed, ..
        } => {
            let variables: BTreeMap<String, String> = managed
                .iter()
                .map(|secret| (secret.name.clone(), secret.env.clone()))
                .collect();
            let names = variables.keys().cloned().collect::<Vec<_>>();
            secrets_rule(name, SecretsRule::new(names, Arc::new(EnvSecretProvider::new(variables))))
        }
        RuleConfig::Environments {
            known, ..
        } => {
            let rule = known.iter().fold(EnvironmentsRule::new(), |rule, (environment, declared)| {
                let variables: BTreeMap<String, String> = declared
                    .secrets
                    .iter()
                    .map(|(secret, source)| (secret.clone(), source.env.clone()))
                    .collect();
                let names = variables.keys().cloned().collect::<Vec<_>>();
                rule.with_known(
                    environment.clone(),
                    KnownEnvironment::new(names, Arc::new(EnvSecretProvider::new(variables))),
                )
            });
            environments_rule(name, rule)
        }
    }
}
