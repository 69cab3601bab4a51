// crates/repo-law-core/src/runtime/run.rs
// ============================================================================
// Module: Run Lifecycle
// Description: Per-repository state machine driving rule capabilities.
// Purpose: Sequence load, apply, enforce, validate, and enroll or unroll.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! An [`Engine`] bundles the state shared by every run of one invocation:
//! platform client, rule set, compiled policy schema, audit sink, and run
//! options. [`Run`] binds it to one repository.
//!
//! Phase order is fixed: load, apply, optional enforce, validate, then enroll
//! when valid or unroll otherwise. Within a phase, rules are visited in
//! registration order and each call is awaited before the next. The first rule
//! failure aborts the phase and the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::ComplianceRecord;
use crate::core::ConfigResult;
use crate::core::Phase;
use crate::core::PolicyDocument;
use crate::core::RepoRef;
use crate::core::RuleName;
use crate::interfaces::AuditOutcome;
use crate::interfaces::AuditSink;
use crate::interfaces::Platform;
use crate::interfaces::PlatformError;
use crate::interfaces::RunAuditEvent;
use crate::runtime::files::RepoFiles;
use crate::runtime::loader::ConfigLoader;
use crate::runtime::loader::PolicySchema;
use crate::runtime::rule::Rule;
use crate::runtime::rule::RuleContext;
use crate::runtime::rule::RuleError;
use crate::runtime::rule::RuleSet;
use crate::runtime::rule::RuleSetError;
use crate::runtime::validation::Findings;
use crate::runtime::validation::ValidationContext;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Default repository path of the policy document.
pub const DEFAULT_CONFIG_LOCATION: &str = ".github/law.yml";

/// Options applied to every run of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Repository path of the policy document.
    pub config_location: String,
    /// Run the enforce phase between apply and validate.
    pub enforce: bool,
    /// Revision to read repository files from (default branch when absent).
    pub git_ref: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_location: DEFAULT_CONFIG_LOCATION.to_string(),
            enforce: false,
            git_ref: None,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure that aborts a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The policy document could not be read.
    #[error("failed to read policy document {location}: {source}")]
    Read {
        /// Document path.
        location: String,
        /// Platform failure.
        source: PlatformError,
    },
    /// A rule capability failed.
    #[error("rule {rule} failed during {phase}: {source}")]
    Rule {
        /// Failing rule.
        rule: RuleName,
        /// Phase being executed.
        phase: Phase,
        /// Rule failure.
        source: RuleError,
    },
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Shared, read-only state for all runs of one invocation.
#[derive(Clone)]
pub struct Engine {
    /// Platform client.
    platform: Arc<dyn Platform>,
    /// Registered rules.
    rules: Arc<RuleSet>,
    /// Compiled composite schema.
    schema: Arc<PolicySchema>,
    /// Operator-visible event sink.
    audit: Arc<dyn AuditSink>,
    /// Run options.
    options: RunOptions,
}

impl Engine {
    /// Creates an engine, compiling the composite schema once.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] when the composite schema does not compile.
    pub fn new(
        platform: Arc<dyn Platform>,
        rules: RuleSet,
        audit: Arc<dyn AuditSink>,
        options: RunOptions,
    ) -> Result<Self, RuleSetError> {
        let schema = PolicySchema::compile(&rules)?;
        Ok(Self {
            platform,
            rules: Arc::new(rules),
            schema: Arc::new(schema),
            audit,
            options,
        })
    }

    /// Returns the platform client.
    #[must_use]
    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Returns the rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the compiled composite schema.
    #[must_use]
    pub fn schema(&self) -> &PolicySchema {
        &self.schema
    }

    /// Returns the run options.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Creates a run for one repository. No platform call is made.
    #[must_use]
    pub fn run(&self, repo: RepoRef) -> Run {
        Run::new(self.clone(), repo)
    }
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Mutating phases that visit one capability slot per rule.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    /// Apply slot.
    Apply,
    /// Enforce slot.
    Enforce,
    /// Enroll slot.
    Enroll,
    /// Unroll slot.
    Unroll,
}

impl Mutation {
    /// Returns the lifecycle phase.
    const fn phase(self) -> Phase {
        match self {
            Self::Apply => Phase::Apply,
            Self::Enforce => Phase::Enforce,
            Self::Enroll => Phase::Enroll,
            Self::Unroll => Phase::Unroll,
        }
    }
}

/// Lifecycle instance for one repository.
pub struct Run {
    /// Shared engine state.
    engine: Engine,
    /// Target repository.
    repo: RepoRef,
    /// Repository-scoped file reader.
    files: RepoFiles,
    /// Memoized configuration loader.
    loader: ConfigLoader,
}

impl Run {
    /// Binds an engine to a repository.
    #[must_use]
    pub fn new(engine: Engine, repo: RepoRef) -> Self {
        let files =
            RepoFiles::new(engine.platform.clone(), repo.clone(), engine.options.git_ref.clone());
        let loader = ConfigLoader::new(
            files.clone(),
            engine.options.config_location.clone(),
            engine.schema.clone(),
        );
        Self {
            engine,
            repo,
            files,
            loader,
        }
    }

    /// Returns the target repository.
    #[must_use]
    pub const fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Loads the configuration result (memoized).
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Read`] when the document read fails.
    pub async fn config(&self) -> Result<&ConfigResult, RunError> {
        let first = !self.loader.is_loaded();
        if first {
            self.emit(RunAuditEvent::phase(&self.repo, Phase::Load, AuditOutcome::Started));
        }
        let result = match self.loader.load().await {
            Ok(result) => result,
            Err(source) => {
                self.emit(
                    RunAuditEvent::phase(&self.repo, Phase::Load, AuditOutcome::Failed)
                        .with_detail(source.to_string()),
                );
                return Err(RunError::Read {
                    location: self.loader.location().to_string(),
                    source,
                });
            }
        };
        if first {
            let detail = match result {
                ConfigResult::NoDocument => "no_document",
                ConfigResult::ParseError(_) => "parse_error",
                ConfigResult::Parsed(_) => "parsed",
            };
            self.emit(
                RunAuditEvent::phase(&self.repo, Phase::Load, AuditOutcome::Completed)
                    .with_detail(detail),
            );
        }
        Ok(result)
    }

    /// Invokes every defined apply capability.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on the first failure.
    pub async fn apply(&self) -> Result<(), RunError> {
        self.mutate(Mutation::Apply).await
    }

    /// Invokes every defined enforce capability.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on the first failure.
    pub async fn enforce(&self) -> Result<(), RunError> {
        self.mutate(Mutation::Enforce).await
    }

    /// Invokes every defined enroll capability.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on the first failure.
    pub async fn enroll(&self) -> Result<(), RunError> {
        self.mutate(Mutation::Enroll).await
    }

    /// Invokes every defined unroll capability.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on the first failure.
    pub async fn unroll(&self) -> Result<(), RunError> {
        self.mutate(Mutation::Unroll).await
    }

    /// Invokes every defined validate capability against one fresh context.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on the first failure.
    pub async fn validate(&self) -> Result<ValidationContext, RunError> {
        let document = self.document().await?;
        self.emit(RunAuditEvent::phase(&self.repo, Phase::Validate, AuditOutcome::Started));
        let mut context = ValidationContext::new(self.repo.clone(), self.engine.audit.clone());
        for rule in self.engine.rules.iter() {
            let Some(capability) = rule.validate() else {
                continue;
            };
            let ctx = self.context(rule, document);
            let mut findings = Findings::new(rule.name(), &mut context);
            capability
                .validate(&ctx, &mut findings)
                .await
                .map_err(|source| self.rule_failed(rule, Phase::Validate, source))?;
        }
        self.emit(
            RunAuditEvent::phase(&self.repo, Phase::Validate, AuditOutcome::Completed)
                .with_detail(if context.is_valid() { "valid" } else { "invalid" }),
        );
        Ok(context)
    }

    /// Executes the full lifecycle and returns the compliance record.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when the document read or any rule fails.
    pub async fn full(&self) -> Result<ComplianceRecord, RunError> {
        let mut record = ComplianceRecord::pending(&self.repo);
        let config = self.config().await?;
        record.configured = config.is_configured();
        match config {
            ConfigResult::NoDocument => {
                self.skip(Phase::Apply, "no_document");
                return Ok(record);
            }
            ConfigResult::ParseError(failure) => {
                record.parse_error = Some(failure.clone());
                self.skip(Phase::Apply, "parse_error");
                return Ok(record);
            }
            ConfigResult::Parsed(_) => {}
        }

        self.apply().await?;
        record.applied = true;

        if self.engine.options.enforce {
            self.enforce().await?;
        } else {
            self.skip(Phase::Enforce, "not_requested");
        }

        let context = self.validate().await?;
        record.is_valid = context.is_valid();
        record.validations = context.into_messages();

        if record.is_valid {
            self.enroll().await?;
            record.enrolled = true;
        } else {
            self.unroll().await?;
            record.unrolled = true;
        }
        Ok(record)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Returns the decoded document, if the configuration parsed.
    async fn document(&self) -> Result<Option<&PolicyDocument>, RunError> {
        Ok(self.config().await?.document())
    }

    /// Visits one capability slot of every rule in registration order.
    async fn mutate(&self, mutation: Mutation) -> Result<(), RunError> {
        let document = self.document().await?;
        let phase = mutation.phase();
        self.emit(RunAuditEvent::phase(&self.repo, phase, AuditOutcome::Started));
        for rule in self.engine.rules.iter() {
            let ctx = self.context(rule, document);
            let outcome = match mutation {
                Mutation::Apply => match rule.apply() {
                    Some(capability) => capability.apply(&ctx).await,
                    None => continue,
                },
                Mutation::Enforce => match rule.enforce() {
                    Some(capability) => capability.enforce(&ctx).await,
                    None => continue,
                },
                Mutation::Enroll => match rule.enroll() {
                    Some(capability) => capability.enroll(&ctx).await,
                    None => continue,
                },
                Mutation::Unroll => match rule.unroll() {
                    Some(capability) => capability.unroll(&ctx).await,
                    None => continue,
                },
            };
            outcome.map_err(|source| self.rule_failed(rule, phase, source))?;
        }
        self.emit(RunAuditEvent::phase(&self.repo, phase, AuditOutcome::Completed));
        Ok(())
    }

    /// Builds the capability context for a rule.
    fn context<'a>(
        &'a self,
        rule: &Rule,
        document: Option<&'a PolicyDocument>,
    ) -> RuleContext<'a> {
        RuleContext {
            platform: self.engine.platform.as_ref(),
            repo: &self.repo,
            config_location: self.loader.location(),
            config: document.and_then(|document| document.rule_config(rule.name().as_str())),
            files: &self.files,
        }
    }

    /// Records a rule failure and wraps it.
    fn rule_failed(&self, rule: &Rule, phase: Phase, source: RuleError) -> RunError {
        self.emit(
            RunAuditEvent::phase(&self.repo, phase, AuditOutcome::Failed)
                .with_rule(rule.name().as_str())
                .with_detail(source.to_string()),
        );
        RunError::Rule {
            rule: rule.name().clone(),
            phase,
            source,
        }
    }

    /// Records a skipped phase.
    fn skip(&self, phase: Phase, reason: &str) {
        self.emit(
            RunAuditEvent::phase(&self.repo, phase, AuditOutcome::Skipped).with_detail(reason),
        );
    }

    /// Forwards an event to the audit sink.
    fn emit(&self, event: RunAuditEvent) {
        self.engine.audit.record(&event);
    }
}
