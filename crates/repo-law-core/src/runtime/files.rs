// crates/repo-law-core/src/runtime/files.rs
// ============================================================================
// Module: Repository Files
// Description: Repository-scoped read-only file access.
// Purpose: Give rules a file reader bound to one repository and revision.
// Dependencies: crate::interfaces
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::RepoRef;
use crate::interfaces::Platform;
use crate::interfaces::PlatformError;

// ============================================================================
// SECTION: Repository Files
// ============================================================================

/// Read-only file handle scoped to one repository.
#[derive(Clone)]
pub struct RepoFiles {
    /// Platform client.
    platform: Arc<dyn Platform>,
    /// Target repository.
    repo: RepoRef,
    /// Revision to read from (default branch when absent).
    git_ref: Option<String>,
}

impl RepoFiles {
    /// Creates a handle for the given repository and optional revision.
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>, repo: RepoRef, git_ref: Option<String>) -> Self {
        Self {
            platform,
            repo,
            git_ref,
        }
    }

    /// Returns the repository this handle reads from.
    #[must_use]
    pub const fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Reads a file; `Ok(None)` means the path does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] for failures other than "not found".
    pub async fn read(&self, path: &str) -> Result<Option<String>, PlatformError> {
        self.platform.read_file(&self.repo, path, self.git_ref.as_deref()).await
    }
}
