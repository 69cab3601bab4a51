// crates/repo-law-core/tests/fleet_and_emergency.rs
// ============================================================================
// Module: Fleet and Emergency Approval Tests
// Description: Sibling isolation across runs and approval gating.
// ============================================================================
//! ## Overview
//! Fleet execution keeps input order and isolates failures; emergency
//! approval never reaches the platform on a deny verdict.

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
use common::scripted_rule;
use repo_law_core::AllowAll;
use repo_law_core::AllowListed;
use repo_law_core::ApprovalRequest;
use repo_law_core::DenyAll;
use repo_law_core::EmergencyError;
use repo_law_core::InMemoryPlatform;
use repo_law_core::PlatformCall;
use repo_law_core::PlatformError;
use repo_law_core::RepoRef;
use repo_law_core::emergency_approve;
use repo_law_core::run_fleet;

// SECTION: Fleet

async fn fleet_report(concurrency: usize) -> repo_law_core::FleetReport {
    let platform = Arc::new(InMemoryPlatform::new());
    let good = RepoRef::new("org", "good");
    let bad = RepoRef::new("org", "bad");
    let bare = RepoRef::new("org", "bare");
    platform.put_file(&good, LOCATION, "rules: {}\n");
    platform.put_file(&bad, LOCATION, "rules:\n  a: {}\n");
    let log = CallLog::default();
    let (engine, _audit) =
        engine(&platform, vec![scripted_rule("a", &log, vec![], Some("apply"))], false);
    let runs = vec![engine.run(bare), engine.run(bad), engine.run(good)];
    run_fleet(runs, concurrency).await
}

#[tokio::test]
async fn sequential_fleet_isolates_failures() {
    let report = fleet_report(1).await;
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].repo, "bare");
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].repo, "bad");
    assert!(report.failures[0].error.contains("rule a failed during apply"));
    assert!(!report.is_complete());
    assert!(!report.started_at.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_fleet_keeps_input_order() {
    let report = fleet_report(4).await;
    let failed: Vec<&str> = report.failures.iter().map(|failure| failure.repo.as_str()).collect();
    assert_eq!(failed, vec!["bad", "good"]);
    assert_eq!(report.records[0].repo, "bare");
}

// SECTION: Emergency Approval

fn request() -> ApprovalRequest {
    ApprovalRequest {
        repo: RepoRef::new("org", "hotfix"),
        number: 7,
    }
}

#[tokio::test]
async fn allow_records_an_approval() {
    let platform = InMemoryPlatform::new();
    emergency_approve(&platform, &AllowAll, &request()).await.unwrap();
    assert_eq!(
        platform.calls(),
        vec![PlatformCall::ApprovePullRequest {
            repo: RepoRef::new("org", "hotfix"),
            number: 7,
        }]
    );
}

#[tokio::test]
async fn deny_aborts_with_reason_and_never_approves() {
    let platform = InMemoryPlatform::new();
    let validator = DenyAll {
        reason: Some("change freeze".to_string()),
    };
    let err = emergency_approve(&platform, &validator, &request()).await.unwrap_err();
    assert!(matches!(&err, EmergencyError::Denied { reason } if reason == "change freeze"));
    assert_eq!(err.to_string(), "could not approve, reason: change freeze");
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn allow_list_only_admits_matching_repositories() {
    let platform = InMemoryPlatform::new();
    let validator = AllowListed::new(&["org/hot*".to_string()]).unwrap();
    emergency_approve(&platform, &validator, &request()).await.unwrap();

    let outsider = ApprovalRequest {
        repo: RepoRef::new("other", "hotfix"),
        number: 1,
    };
    let err = emergency_approve(&platform, &validator, &outsider).await.unwrap_err();
    assert!(matches!(err, EmergencyError::Denied { .. }));
    assert_eq!(platform.calls().len(), 1);
}

#[tokio::test]
async fn platform_rejection_surfaces_as_error() {
    let platform = InMemoryPlatform::new();
    platform.fail("approve_pull_request", PlatformError::NotFound("pull 7".to_string()));
    let err = emergency_approve(&platform, &AllowAll, &request()).await.unwrap_err();
    assert!(matches!(err, EmergencyError::Platform(PlatformError::NotFound(_))));
}
