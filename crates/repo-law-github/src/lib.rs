// crates/repo-law-github/src/lib.rs
// ============================================================================
// Module: Repo Law GitHub Library
// Description: GitHub REST implementation of the platform interface.
// Purpose: Connect the policy engine to github.com or GitHub Enterprise.
// Dependencies: repo-law-core, reqwest
// ============================================================================

//! ## Overview
//! This crate provides [`GitHubClient`], an asynchronous implementation of
//! [`repo_law_core::Platform`] over the GitHub REST API.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::DEFAULT_API_URL;
pub use client::GitHubClient;
pub use client::GitHubClientConfig;
pub use client::next_page_from_link;
