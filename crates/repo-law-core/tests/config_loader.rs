// crates/repo-law-core/tests/config_loader.rs
// ============================================================================
// Module: Configuration Loader Tests
// Description: Memoization, single-flight fetches, and parse outcomes.
// ============================================================================
//! ## Overview
//! Exercises the loader through runs so the repository file capability and
//! compiled composite schema are wired the same way as in production.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::CallLog;
use common::LOCATION;
use common::Scripted;
use common::engine;
use common::repo;
use common::scripted_rule;
use repo_law_core::ConfigResult;
use repo_law_core::InMemoryPlatform;
use repo_law_core::ParseStage;
use repo_law_core::PlatformError;
use repo_law_core::Rule;
use serde_json::json;

// SECTION: Test Fixtures

fn basic_rule(log: &CallLog) -> Rule {
    let script = Arc::new(Scripted {
        name: "basic".to_string(),
        log: log.clone(),
        findings: Vec::new(),
        fail_in: None,
    });
    Rule::new(
        "basic",
        json!({
            "type": "object",
            "properties": {
                "defaultBranch": { "type": "string" },
                "visibility": { "enum": ["public", "private"] },
            },
        }),
    )
    .with_apply(script)
}

// SECTION: Parse Outcomes

#[tokio::test]
async fn wrong_field_type_is_a_parse_error_and_nothing_applies() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, "rules:\n  basic:\n    defaultBranch: 42\n");
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![basic_rule(&log)], false);

    let record = engine.run(repo()).full().await.unwrap();

    assert!(record.configured);
    assert!(!record.applied);
    let failure = record.parse_error.unwrap();
    assert_eq!(failure.stage, ParseStage::Schema);
    assert_eq!(failure.issues[0].path, "/rules/basic/defaultBranch");
    assert!(log.entries().is_empty());
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn parsed_document_exposes_only_registered_rules() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(
        &repo(),
        LOCATION,
        "enroll: true\nowner: someone\nrules:\n  basic:\n    visibility: private\n  \
         unknown:\n    anything: 1\n",
    );
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![basic_rule(&log)], false);

    let run = engine.run(repo());
    let ConfigResult::Parsed(document) = run.config().await.unwrap() else {
        panic!("expected parsed document");
    };

    assert_eq!(document.enroll, Some(true));
    assert_eq!(document.rules.keys().collect::<Vec<_>>(), vec!["basic"]);
    assert_eq!(document.rule_config("basic"), Some(&json!({"visibility": "private"})));
}

#[tokio::test]
async fn invalid_yaml_is_a_syntax_parse_error() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, "rules: {basic: [\n");
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![basic_rule(&log)], false);

    let record = engine.run(repo()).full().await.unwrap();

    assert_eq!(record.parse_error.map(|failure| failure.stage), Some(ParseStage::Syntax));
}

// SECTION: Memoization

#[tokio::test]
async fn repeated_access_reads_the_document_once() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, "rules: {}\n");
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    let run = engine.run(repo());
    run.full().await.unwrap();
    run.config().await.unwrap();
    run.apply().await.unwrap();

    assert_eq!(platform.read_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_shares_one_fetch() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, "rules: {}\n");
    platform.set_read_delay(Duration::from_millis(50));
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    let run = Arc::new(engine.run(repo()));
    let mut handles = Vec::new();
    for _ in 0 .. 8 {
        let run = Arc::clone(&run);
        handles.push(tokio::spawn(async move { run.config().await.map(Clone::clone) }));
    }
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(result.document().is_some());
    }

    assert_eq!(platform.read_count(), 1);
}

#[tokio::test]
async fn read_failures_are_not_memoized() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.put_file(&repo(), LOCATION, "rules: {}\n");
    platform.fail(
        "read_file",
        PlatformError::Transport("connection reset".to_string()),
    );
    let log = CallLog::default();
    let (engine, _audit) = engine(&platform, vec![scripted_rule("a", &log, vec![], None)], false);

    let run = engine.run(repo());
    assert!(run.config().await.is_err());
    platform.heal("read_file");
    assert!(run.config().await.unwrap().is_configured());
    assert_eq!(platform.read_count(), 2);
}
