// crates/repo-law-cli/src/lib.rs
// ============================================================================
// Module: Repo Law CLI Library
// Description: Shared helpers for the Repo Law command-line interface.
// Purpose: Provide report rendering for the CLI binary and tests.
// Dependencies: repo-law-core, serde_json
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) owns argument parsing and command
//! dispatch; this library holds the report renderers so they can be tested
//! without spawning the binary.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Markdown and JSON fleet report rendering.
pub mod report;
