// crates/repo-law-cli/src/report.rs
// ============================================================================
// Module: Report Rendering
// Description: Markdown and JSON renderings of a fleet report.
// Purpose: Turn compliance records into operator-facing output.
// Dependencies: repo-law-core, serde_json
// ============================================================================

//! ## Overview
//! The Markdown form has one section per repository with its Pass/Warn/Fail
//! state, the phase flags, and a collapsible details block holding the parse
//! error and validation messages. Aborted runs are listed after the records.
//! The JSON form is the serialized [`FleetReport`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use repo_law_core::ComplianceRecord;
use repo_law_core::FleetReport;
use repo_law_core::RunFailure;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Output format for fleet reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown summary.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

/// Renders a report in the requested format.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when a record cannot be serialized.
pub fn render(report: &FleetReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Markdown => render_markdown(report),
        ReportFormat::Json => {
            let mut output = serde_json::to_string_pretty(report)?;
            output.push('\n');
            Ok(output)
        }
    }
}

// ============================================================================
// SECTION: Markdown
// ============================================================================

/// Renders the Markdown report.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when a parse error cannot be serialized.
pub fn render_markdown(report: &FleetReport) -> Result<String, serde_json::Error> {
    let repos = report.records.iter().map(record_section).collect::<Result<Vec<_>, _>>()?;
    let mut output = format!(
        "\n# Report\n\n- Start: {}\n\n## Repos\n\n{}\n",
        report.started_at,
        repos.join("\n\n")
    );
    if !report.failures.is_empty() {
        output.push_str("\n## Failures\n\n");
        for failure in &report.failures {
            output.push_str(&failure_line(failure));
            output.push('\n');
        }
    }
    Ok(output)
}

/// Renders one repository section.
fn record_section(record: &ComplianceRecord) -> Result<String, serde_json::Error> {
    let mut lines = vec![
        format!("### {}/{} ({})", record.owner, record.repo, record.status().label()),
        format!("- Configured: {}", yes_no(record.configured)),
        format!("- Applied: {}", yes_no(record.applied)),
        format!("- Valid: {}", yes_no(record.is_valid)),
        format!("- Enrolled: {}", yes_no(record.enrolled)),
    ];

    let mut details = Vec::new();
    if let Some(parse_error) = &record.parse_error {
        details.push("- Parse Error:".to_string());
        details.push("```json".to_string());
        details.push(serde_json::to_string(parse_error)?);
        details.push("```".to_string());
    }
    if !record.validations.is_empty() {
        details.push("- Validations:".to_string());
        details.extend(record.validations.iter().map(|message| {
            format!("- {} {}: {}", message.rule, message.kind.as_str(), message.reason)
        }));
    }

    if !details.is_empty() {
        lines.push("<details>".to_string());
        lines.push("<summary>Details</summary>".to_string());
        lines.push(String::new());
        lines.extend(details);
        lines.push(String::new());
        lines.push("</details>".to_string());
    }
    Ok(lines.join("\n"))
}

/// Renders one aborted run.
fn failure_line(failure: &RunFailure) -> String {
    format!("- {}/{}: {}", failure.owner, failure.repo, failure.error)
}

/// Formats a flag.
const fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use repo_law_core::ComplianceRecord;
    use repo_law_core::FleetReport;
    use repo_law_core::MessageKind;
    use repo_law_core::ParseFailure;
    use repo_law_core::RepoRef;
    use repo_law_core::RuleName;
    use repo_law_core::RunFailure;
    use repo_law_core::ValidationMessage;

    use super::ReportFormat;
    use super::render;
    use super::render_markdown;

    fn report() -> FleetReport {
        FleetReport {
            started_at: "2026-10-18T09:30:00Z".to_string(),
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn passing(name: &str) -> ComplianceRecord {
        let mut record = ComplianceRecord::pending(&RepoRef::new("org", name));
        record.configured = true;
        record.applied = true;
        record.is_valid = true;
        record
    }

    #[test]
    fn passing_record_has_no_details() {
        let mut report = report();
        report.records.push(passing("api"));
        let output = render_markdown(&report).unwrap();
        assert!(output.starts_with("\n# Report\n\n- Start: 2026-10-18T09:30:00Z\n\n## Repos\n\n"));
        assert!(output.contains(
            "### org/api (Pass)\n- Configured: Yes\n- Applied: Yes\n- Valid: Yes\n- Enrolled: No"
        ));
        assert!(!output.contains("<details>"));
        assert!(!output.contains("## Failures"));
    }

    #[test]
    fn unconfigured_record_is_a_warning() {
        let mut report = report();
        report.records.push(ComplianceRecord::pending(&RepoRef::new("org", "docs")));
        let output = render_markdown(&report).unwrap();
        assert!(output.contains("### org/docs (Warn)\n- Configured: No"));
    }

    #[test]
    fn details_list_parse_error_and_validations() {
        let mut record = passing("web");
        record.is_valid = false;
        record.parse_error = Some(ParseFailure::syntax("bad indent"));
        record.validations.push(ValidationMessage {
            kind: MessageKind::Error,
            rule: RuleName::new("codeowner"),
            reason: "CODEOWNERS file is missing".to_string(),
            trail: Vec::new(),
        });
        let mut report = report();
        report.records.push(record);
        let output = render_markdown(&report).unwrap();
        assert!(output.contains("### org/web (Fail)"));
        assert!(output.contains("<details>\n<summary>Details</summary>\n\n- Parse Error:\n```json\n{"));
        assert!(output.contains("\"stage\":\"syntax\""));
        assert!(output.contains(
            "- Validations:\n- codeowner error: CODEOWNERS file is missing\n\n</details>"
        ));
    }

    #[test]
    fn records_are_separated_and_failures_listed() {
        let mut report = report();
        report.records.push(passing("a"));
        report.records.push(passing("b"));
        report.failures.push(RunFailure {
            owner: "org".to_string(),
            repo: "c".to_string(),
            error: "platform error: http 502".to_string(),
        });
        let output = render_markdown(&report).unwrap();
        assert!(output.contains("- Enrolled: No\n\n### org/b (Pass)"));
        assert!(output.ends_with("## Failures\n\n- org/c: platform error: http 502\n"));
    }

    #[test]
    fn json_format_serializes_report() {
        let mut report = report();
        report.records.push(passing("api"));
        let output = render(&report, ReportFormat::Json).unwrap();
        let parsed: FleetReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, report);
    }
}
