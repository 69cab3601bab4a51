// crates/repo-law-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Scripted rules and engine builders shared by integration tests.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use repo_law_core::Apply;
use repo_law_core::Engine;
use repo_law_core::Enforce;
use repo_law_core::Enroll;
use repo_law_core::Finding;
use repo_law_core::Findings;
use repo_law_core::InMemoryPlatform;
use repo_law_core::MemoryAuditSink;
use repo_law_core::PlatformError;
use repo_law_core::RepoRef;
use repo_law_core::Rule;
use repo_law_core::RuleContext;
use repo_law_core::RuleError;
use repo_law_core::RuleSet;
use repo_law_core::RunOptions;
use repo_law_core::Unroll;
use repo_law_core::Validate;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Call Log
// ============================================================================

/// Shared log of `<rule>.<phase>[:configured]` entries.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ============================================================================
// SECTION: Scripted Rule
// ============================================================================

/// Rule whose behavior is fixed at construction time.
pub struct Scripted {
    pub name: String,
    pub log: CallLog,
    pub findings: Vec<Finding>,
    pub fail_in: Option<&'static str>,
}

impl Scripted {
    fn record(&self, phase: &'static str, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let suffix = if ctx.config.is_some() { ":configured" } else { "" };
        self.log.push(format!("{}.{phase}{suffix}", self.name));
        if self.fail_in == Some(phase) {
            return Err(RuleError::Platform(PlatformError::Http {
                status: 500,
                message: format!("{} exploded", self.name),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl Apply for Scripted {
    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        self.record("apply", ctx)
    }
}

#[async_trait]
impl Validate for Scripted {
    async fn validate(
        &self,
        ctx: &RuleContext<'_>,
        findings: &mut Findings<'_>,
    ) -> Result<(), RuleError> {
        self.record("validate", ctx)?;
        for finding in &self.findings {
            findings.add(finding.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl Enroll for Scripted {
    async fn enroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        self.record("enroll", ctx)
    }
}

#[async_trait]
impl Unroll for Scripted {
    async fn unroll(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        self.record("unroll", ctx)
    }
}

#[async_trait]
impl Enforce for Scripted {
    async fn enforce(&self, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        self.record("enforce", ctx)
    }
}

/// Builds a rule filling every slot with a scripted implementation.
pub fn scripted_rule(
    name: &str,
    log: &CallLog,
    findings: Vec<Finding>,
    fail_in: Option<&'static str>,
) -> Rule {
    let script = Arc::new(Scripted {
        name: name.to_string(),
        log: log.clone(),
        findings,
        fail_in,
    });
    Rule::new(name, object_schema())
        .with_apply(script.clone())
        .with_validate(script.clone())
        .with_enroll(script.clone())
        .with_unroll(script.clone())
        .with_enforce(script)
}

/// Permissive object schema.
pub fn object_schema() -> Value {
    json!({ "type": "object" })
}

// ============================================================================
// SECTION: Engine Builders
// ============================================================================

pub const LOCATION: &str = ".github/law.yml";

pub fn repo() -> RepoRef {
    RepoRef::new("org", "service")
}

/// Builds an engine over an in-memory platform with a memory audit sink.
pub fn engine(
    platform: &Arc<InMemoryPlatform>,
    rules: Vec<Rule>,
    enforce: bool,
) -> (Engine, Arc<MemoryAuditSink>) {
    let audit = Arc::new(MemoryAuditSink::new());
    let options = RunOptions {
        config_location: LOCATION.to_string(),
        enforce,
        git_ref: None,
    };
    let engine =
        Engine::new(platform.clone(), RuleSet::from_rules(rules).unwrap(), audit.clone(), options)
            .unwrap();
    (engine, audit)
}
