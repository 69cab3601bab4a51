// crates/repo-law-core/src/core/mod.rs
// ============================================================================
// Module: Repo Law Core Types
// Description: Canonical identifiers, diagnostics, documents, and records.
// Purpose: Provide stable, serializable types shared by runtime and reporting.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types are data-only: they carry no platform or filesystem side
//! effects and are the canonical source for report output shapes.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod document;
pub mod identifiers;
pub mod phase;
pub mod record;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::ConfigResult;
pub use document::ParseFailure;
pub use document::ParseIssue;
pub use document::ParseStage;
pub use document::PolicyDocument;
pub use identifiers::RepoRef;
pub use identifiers::RuleName;
pub use phase::Phase;
pub use record::ComplianceRecord;
pub use record::ComplianceStatus;
pub use record::FleetReport;
pub use record::RunFailure;
pub use validation::Finding;
pub use validation::MessageKind;
pub use validation::Position;
pub use validation::TrailEntry;
pub use validation::ValidationMessage;
