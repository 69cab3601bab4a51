// crates/repo-law-core/tests/run_lifecycle.rs
// ============================================================================
// Module: Run Lifecycle Tests
// Description: Phase ordering, short-circuits, and compliance records.
// ============================================================================
//! ## Overview
//! Drives full runs against the in-memory platform with scripted rules.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;

use common::CallLog;
use common::LOCATION;
use common::engine;
use common::repo;
use common::scripted_rule;
use repo_law_core::AuditOutcome;
use repo_law_core::Finding;
use repo_law_core::InMemoryPlatform;
use repo_law_core::MessageKind;
use repo_law_core::Phase;
use repo_law_core::PlatformError;
use repo_law_core::RunError;

// SECTION: Test Fixtures

fn platform_with_document(document: &str) -> Arc<InMemoryPlatform> {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, document);
    platform
}

// SECTION: Short-Circuits

#[tokio::test]
async fn absent_document_leaves_every_flag_false() {
    let platform = Arc::new(InMemoryPlatform::new());
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], true);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(!record.configured);
    assert!(!record.applied);
    assert!(!record.is_valid);
    assert!(!record.enrolled);
    assert!(!record.unrolled);
    assert!(record.parse_error.is_none());
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn schema_violation_stops_before_apply() {
    let platform = platform_with_document("rules:\n  a: [1, 2]\n");
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.configured);
    assert!(record.parse_error.is_some());
    assert!(!record.applied);
    assert!(!record.enrolled && !record.unrolled);
    assert!(log.entries().is_empty());
    assert!(platform.calls().is_empty());
}

// SECTION: Ordering

#[tokio::test]
async fn apply_runs_for_every_rule_before_any_validate() {
    let platform = platform_with_document("rules:\n  second: {}\n");
    let log = CallLog::default();
    let rules = vec![
        scripted_rule("first", &log, vec![], None),
        scripted_rule("second", &log, vec![], None),
        scripted_rule("third", &log, vec![], None),
    ];
    let (engine, _audit) = engine(&platform, rules, false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.applied && record.is_valid && record.enrolled);
    assert_eq!(
        log.entries(),
        vec![
            "first.apply",
            "second.apply:configured",
            "third.apply",
            "first.validate",
            "second.validate:configured",
            "third.validate",
            "first.enroll",
            "second.enroll:configured",
            "third.enroll",
        ]
    );
}

#[tokio::test]
async fn enforce_runs_between_apply_and_validate_when_requested() {
    let platform = platform_with_document("rules: {}\n");
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], true);

    engine.run(repo()).full().await.unwrap();

    assert_eq!(log.entries(), vec!["a.apply", "a.enforce", "a.validate", "a.enroll"]);
}

#[tokio::test]
async fn enforce_is_skipped_by_default() {
    let platform = platform_with_document("{}\n");
    let log = CallLog::default();
    let (engine, audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    engine.run(repo()).full().await.unwrap();

    assert!(!log.entries().iter().any(|entry| entry.contains("enforce")));
    assert!(audit.run_events().iter().any(|event| {
        event.phase == Phase::Enforce && event.outcome == AuditOutcome::Skipped
    }));
}

// SECTION: Enroll Versus Unroll

#[tokio::test]
async fn warnings_do_not_block_enrollment() {
    let platform = platform_with_document("rules: {}\n");
    let log = CallLog::default();
    let rules = vec![scripted_rule("a", &log, vec![Finding::warning("minor")], None)];
    let (engine, _audit) = engine(&platform, rules, false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.is_valid);
    assert!(record.enrolled);
    assert!(!record.unrolled);
    assert_eq!(record.validations.len(), 1);
    assert_eq!(record.validations[0].kind, MessageKind::Warning);
}

#[tokio::test]
async fn an_error_finding_unrolls_instead_of_enrolling() {
    let platform = platform_with_document("rules: {}\n");
    let log = CallLog::default();
    let rules = vec![
        scripted_rule("clean", &log, vec![], None),
        scripted_rule("dirty", &log, vec![Finding::error("broken")], None),
    ];
    let (engine, audit) = engine(&platform, rules, false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.applied);
    assert!(!record.is_valid);
    assert!(record.unrolled);
    assert!(!record.enrolled);
    assert_eq!(record.validations[0].rule.as_str(), "dirty");
    assert!(log.entries().iter().all(|entry| !entry.contains("enroll")));
    assert!(log.entries().contains(&"clean.unroll".to_string()));
    let surfaced = audit.validation_events();
    assert_eq!(surfaced.len(), 1);
    assert_eq!(surfaced[0].rule, "dirty");
    assert_eq!(surfaced[0].reason, "broken");
}

#[tokio::test]
async fn repeated_runs_with_unchanged_state_agree_on_validity() {
    let platform = platform_with_document("rules: {}\n");
    let log = CallLog::default();
    let rules = vec![scripted_rule("a", &log, vec![Finding::error("still broken")], None)];
    let (engine, _audit) = engine(&platform, rules, false);

    let run = engine.run(repo());
    run.apply().await.unwrap();
    run.apply().await.unwrap();
    let first = run.validate().await.unwrap().is_valid();
    let second = engine.run(repo()).full().await.unwrap().is_valid;

    assert_eq!(first, second);
}

// SECTION: Failures

#[tokio::test]
async fn rule_failure_aborts_remaining_rules_and_run() {
    let platform = platform_with_document("rules: {}\n");
    let log = CallLog::default();
    let rules = vec![
        scripted_rule("a", &log, vec![], None),
        scripted_rule("b", &log, vec![], Some("apply")),
        scripted_rule("c", &log, vec![], None),
    ];
    let (engine, audit) = engine(&platform, rules, false);

    let err = engine.run(repo()).full().await.unwrap_err();

    let RunError::Rule {
        rule,
        phase,
        ..
    } = err
    else {
        panic!("expected rule failure");
    };
    assert_eq!(rule.as_str(), "b");
    assert_eq!(phase, Phase::Apply);
    assert_eq!(log.entries(), vec!["a.apply", "b.apply"]);
    assert!(audit.run_events().iter().any(|event| {
        event.outcome == AuditOutcome::Failed && event.rule.as_deref() == Some("b")
    }));
}

#[tokio::test]
async fn document_read_failure_is_a_run_error() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.fail(
        "read_file",
        PlatformError::Http {
            status: 403,
            message: "forbidden".to_string(),
        },
    );
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    let err = engine.run(repo()).full().await.unwrap_err();

    assert!(matches!(err, RunError::Read { .. }));
    assert!(err.to_string().contains(LOCATION));
}

// SECTION: Standalone Phases

#[tokio::test]
async fn standalone_phases_pass_no_fragment_without_a_document() {
    let platform = Arc::new(InMemoryPlatform::new());
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    let run = engine.run(repo());
    run.unroll().await.unwrap();
    run.enforce().await.unwrap();

    assert_eq!(log.entries(), vec!["a.unroll", "a.enforce"]);
    assert_eq!(platform.read_count(), 1);
}
