// crates/repo-law-rules/tests/environments_rule.rs
// ============================================================================
// Module: Environments Rule Tests
// Description: Environment reconciliation, drift reporting, and secrets.
// Purpose: Verify removal sets, findings, and managed secret handling.
// ============================================================================

//! ## Overview
//! Drives the `environments` rule through individual phases and full runs
//! on the in-memory platform.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;

use repo_law_core::EnvironmentSummary;
use repo_law_core::MessageKind;
use repo_law_core::PlatformCall;
use repo_law_core::Rule;
use repo_law_rules::ENVIRONMENTS_RULE;
use repo_law_rules::EnvironmentsRule;
use repo_law_rules::KnownEnvironment;
use repo_law_rules::StaticSecretProvider;
use repo_law_rules::environments_rule;

use crate::common::engine;
use crate::common::keypair;
use crate::common::open;
use crate::common::platform_with;
use crate::common::repo;

fn summary(name: &str, wait_timer: Option<u32>) -> EnvironmentSummary {
    EnvironmentSummary {
        name: name.to_string(),
        wait_timer,
        can_admins_bypass: None,
    }
}

fn rule_with_known_prod() -> Rule {
    let provider = StaticSecretProvider::new().with("NPM_TOKEN", "s3cr3t");
    let known = KnownEnvironment::new(
        ["NPM_TOKEN".to_string(), "OLD_TOKEN".to_string()],
        Arc::new(provider),
    );
    environments_rule(ENVIRONMENTS_RULE, EnvironmentsRule::new().with_known("prod", known))
}

#[tokio::test]
async fn apply_deletes_undeclared_and_upserts_declared() {
    let platform = platform_with(
        "rules:\n  environments:\n    prod:\n      waitTime: 10\n    stage: {}\n",
    );
    platform.add_environment(&repo(), summary("legacy", None));
    platform.add_environment(&repo(), summary("prod", Some(3)));
    let engine = engine(&platform, vec![rule_with_known_prod()], false);

    engine.run(repo()).apply().await.unwrap();

    assert_eq!(platform.environment_names(&repo()), vec!["prod", "stage"]);
    let calls = platform.calls();
    let deleted: Vec<&str> = calls
        .iter()
        .filter_map(|call| match call {
            PlatformCall::DeleteEnvironment { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec!["legacy"]);
    let prod = calls
        .iter()
        .find_map(|call| match call {
            PlatformCall::UpsertEnvironment { name, settings, .. } if name == "prod" => {
                Some(settings.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(prod.wait_timer, Some(10));
}

#[tokio::test]
async fn apply_without_fragment_keeps_remote_environments() {
    let platform = platform_with("rules: {}\n");
    platform.add_environment(&repo(), summary("legacy", None));
    let engine = engine(&platform, vec![rule_with_known_prod()], false);

    engine.run(repo()).apply().await.unwrap();

    assert_eq!(platform.environment_names(&repo()), vec!["legacy"]);
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn out_of_range_wait_time_is_a_parse_error() {
    let platform = platform_with(
        "rules:\n  environments:\n    prod:\n      waitTime: 5000000000\n",
    );
    platform.add_environment(&repo(), summary("legacy", None));
    let engine = engine(&platform, vec![rule_with_known_prod()], false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.configured);
    assert!(!record.applied);
    let failure = record.parse_error.unwrap();
    assert!(
        failure.issues.iter().any(|issue| issue.path == "/rules/environments/prod/waitTime")
    );
    assert_eq!(platform.environment_names(&repo()), vec!["legacy"]);
}

#[tokio::test]
async fn validate_reports_missing_environments_and_wait_drift() {
    let platform = platform_with(
        "rules:\n  environments:\n    prod:\n      waitTime: 10\n    qa: {}\n",
    );
    platform.add_environment(&repo(), summary("prod", Some(5)));
    let engine = engine(&platform, vec![rule_with_known_prod()], false);

    let context = engine.run(repo()).validate().await.unwrap();

    assert!(!context.is_valid());
    let messages = context.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, MessageKind::Warning);
    assert_eq!(messages[0].reason, "environment prod waits 5 minutes, expected 10");
    assert_eq!(messages[1].kind, MessageKind::Error);
    assert_eq!(messages[1].reason, "environment qa is missing");
    assert_eq!(messages[1].trail[0].path, ".github/law.yml");
}

#[tokio::test]
async fn enroll_writes_declared_secrets_and_prunes_dropped_ones() {
    let platform = platform_with(
        "rules:\n  environments:\n    prod:\n      secrets: [NPM_TOKEN]\n",
    );
    let (secret, public) = keypair("prod-key");
    platform.add_environment(&repo(), summary("prod", None));
    platform.set_environment_key(&repo(), "prod", public);
    platform.seed_environment_secret(&repo(), "prod", "OLD_TOKEN");
    platform.seed_environment_secret(&repo(), "prod", "HAND_MADE");
    let engine = engine(&platform, vec![rule_with_known_prod()], false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.is_valid);
    assert!(record.enrolled);
    let stored = platform.environment_secret(&repo(), "prod", "NPM_TOKEN").unwrap();
    assert_eq!(stored.key_id, "prod-key");
    assert_eq!(open(&secret, &stored), "s3cr3t");
    assert!(platform.environment_secret(&repo(), "prod", "OLD_TOKEN").is_none());
    assert!(platform.environment_secret(&repo(), "prod", "HAND_MADE").is_some());
}

#[tokio::test]
async fn unroll_removes_managed_secrets_from_known_environments() {
    let platform = platform_with("rules: {}\n");
    platform.add_environment(&repo(), summary("prod", None));
    platform.add_environment(&repo(), summary("stage", None));
    platform.seed_environment_secret(&repo(), "prod", "NPM_TOKEN");
    platform.seed_environment_secret(&repo(), "prod", "HAND_MADE");
    platform.seed_environment_secret(&repo(), "stage", "NPM_TOKEN");
    let engine = engine(&platform, vec![rule_with_known_prod()], false);

    engine.run(repo()).unroll().await.unwrap();

    assert!(platform.environment_secret(&repo(), "prod", "NPM_TOKEN").is_none());
    assert!(platform.environment_secret(&repo(), "prod", "HAND_MADE").is_some());
    assert!(platform.environment_secret(&repo(), "stage", "NPM_TOKEN").is_some());
}
