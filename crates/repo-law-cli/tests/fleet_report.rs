//! End-to-end report tests for repo-law-cli.
// crates/repo-law-cli/tests/fleet_report.rs
// =============================================================================
// Module: Fleet Report Tests
// Description: Config-assembled engine runs rendered as reports.
// Purpose: Ensure discovery, fleet execution, and rendering fit together.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use repo_law_cli::report::ReportFormat;
use repo_law_cli::report::render;
use repo_law_config::RepoLawConfig;
use repo_law_core::ComplianceStatus;
use repo_law_core::Engine;
use repo_law_core::FleetReport;
use repo_law_core::InMemoryPlatform;
use repo_law_core::MemoryAuditSink;
use repo_law_core::RepoRef;
use repo_law_core::Scanner;
use repo_law_core::run_fleet;

const CONFIG: &str = r#"
[[rules]]
type = "codeowner"

[[rules]]
type = "secrets"
managed = [{ name = "NPM_TOKEN", env = "REPO_LAW_FLEET_TEST_NPM_TOKEN" }]
"#;

const LOCATION: &str = ".github/law.yml";
const CODEOWNERS: &str = ".github/CODEOWNERS";

fn fleet_platform() -> Arc<InMemoryPlatform> {
    let platform = Arc::new(InMemoryPlatform::new());
    for name in ["api", "docs", "web", "legacy"] {
        platform.add_repository(RepoRef::new("org", name));
    }
    platform.add_repository(RepoRef::new("other", "api"));

    let api = RepoRef::new("org", "api");
    platform.put_file(&api, LOCATION, "rules:\n  codeowner: {}\n");
    platform.put_file(&api, CODEOWNERS, "* @org/platform\n");

    let web = RepoRef::new("org", "web");
    platform.put_file(&web, LOCATION, "rules:\n  codeowner: {}\n");

    let legacy = RepoRef::new("org", "legacy");
    platform.put_file(
        &legacy,
        LOCATION,
        "rules:\n  codeowner: {}\n  secrets:\n    include: [NPM_TOKEN]\n",
    );
    platform.put_file(&legacy, CODEOWNERS, "* @org/legacy\n");
    platform
}

async fn fleet_report() -> FleetReport {
    let config = RepoLawConfig::parse(CONFIG).unwrap();
    let engine = Engine::new(
        fleet_platform(),
        config.rule_set().unwrap(),
        Arc::new(MemoryAuditSink::new()),
        config.run_options(false),
    )
    .unwrap();
    let runs = Scanner::new(engine).run(&["org/*".to_string()]).await.unwrap();
    run_fleet(runs, 2).await
}

#[tokio::test]
async fn fleet_records_follow_listing_order() {
    let report = fleet_report().await;
    let summary: Vec<(&str, ComplianceStatus)> =
        report.records.iter().map(|record| (record.repo.as_str(), record.status())).collect();
    assert_eq!(
        summary,
        vec![
            ("api", ComplianceStatus::Pass),
            ("docs", ComplianceStatus::Warn),
            ("web", ComplianceStatus::Fail),
        ]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].repo, "legacy");
    assert!(!report.is_complete());
}

#[tokio::test]
async fn markdown_report_covers_every_repository() {
    let report = fleet_report().await;
    let output = render(&report, ReportFormat::Markdown).unwrap();
    assert!(output.contains("### org/api (Pass)"));
    assert!(output.contains("### org/docs (Warn)\n- Configured: No"));
    assert!(output.contains("- codeowner error: CODEOWNERS file is missing"));
    assert!(output.contains("## Failures\n\n- org/legacy: "));
    assert!(!output.contains("other/api"));
}
