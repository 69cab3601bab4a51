// crates/repo-law-core/src/runtime/scanner.rs
// ============================================================================
// Module: Repository Scanner
// Description: Resolves target repositories into runs.
// Purpose: Build one run per repository, lazily paging through the fleet.
// Dependencies: crate::runtime, globset
// ============================================================================

//! ## Overview
//! [`Scanner::single`] builds one run without touching the network.
//! [`Scanner::discover`] pages through every accessible repository one page
//! at a time and filters each page by `owner/name` glob patterns, so the
//! fleet is never held in memory before the first batch is yielded.
//!
//! Patterns are case-sensitive; `*` stays inside one path segment and `**`
//! crosses segments. Wildcards never match a leading `.` in a segment, so a
//! dot-prefixed repository such as `org/.github` is only selected by a
//! pattern that spells the dot itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use thiserror::Error;

use crate::core::RepoRef;
use crate::interfaces::PlatformError;
use crate::runtime::run::Engine;
use crate::runtime::run::Run;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Repository discovery failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// A name pattern is not a valid glob.
    #[error("invalid repository pattern {pattern}: {message}")]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Glob compilation error.
        message: String,
    },
    /// Listing repositories failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Compiled `owner/name` glob patterns.
#[derive(Debug, Clone)]
pub struct RepoPatterns {
    /// Every pattern, in declaration order.
    set: GlobSet,
    /// Per pattern: true when one of its segments starts with a literal `.`.
    explicit_dot: Vec<bool>,
}

impl RepoPatterns {
    /// Returns true when `full_name` matches any pattern.
    #[must_use]
    pub fn is_match(&self, full_name: &str) -> bool {
        if !has_hidden_segment(full_name) {
            return self.set.is_match(full_name);
        }
        self.set
            .matches(full_name)
            .into_iter()
            .any(|index| self.explicit_dot.get(index).copied().unwrap_or(false))
    }
}

/// Returns true when any `/`-separated segment starts with `.`.
fn has_hidden_segment(text: &str) -> bool {
    text.split('/').any(|segment| segment.starts_with('.'))
}

/// Compiles `owner/name` glob patterns. An empty list yields `None`.
///
/// # Errors
///
/// Returns [`ScanError::Pattern`] for the first invalid pattern.
pub fn compile_patterns(patterns: &[String]) -> Result<Option<RepoPatterns>, ScanError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    let mut explicit_dot = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern).literal_separator(true).build().map_err(|err| {
            ScanError::Pattern {
                pattern: pattern.clone(),
                message: err.to_string(),
            }
        })?;
        builder.add(glob);
        explicit_dot.push(has_hidden_segment(pattern));
    }
    let set = builder.build().map_err(|err| ScanError::Pattern {
        pattern: patterns.join(","),
        message: err.to_string(),
    })?;
    Ok(Some(RepoPatterns {
        set,
        explicit_dot,
    }))
}

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// Default number of repositories requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Builds runs that share one engine.
#[derive(Clone)]
pub struct Scanner {
    /// Shared engine.
    engine: Engine,
    /// Repositories requested per page.
    page_size: u32,
}

impl Scanner {
    /// Creates a scanner with the default page size.
    #[must_use]
    pub const fn new(engine: Engine) -> Self {
        Self {
            engine,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size (clamped to at least one).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the shared engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Builds a run for one repository without checking that it exists.
    #[must_use]
    pub fn single(&self, owner: &str, name: &str) -> Run {
        self.engine.run(RepoRef::new(owner, name))
    }

    /// Starts a paged discovery over every accessible repository.
    ///
    /// An empty pattern list keeps every repository.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pattern`] when a pattern is invalid.
    pub fn discover(&self, patterns: &[String]) -> Result<Discovery<'_>, ScanError> {
        Ok(Discovery {
            scanner: self,
            filter: compile_patterns(patterns)?,
            next_page: Some(1),
        })
    }

    /// Discovers every matching repository and builds their runs.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when a pattern is invalid or listing fails.
    pub async fn run(&self, patterns: &[String]) -> Result<Vec<Run>, ScanError> {
        let mut discovery = self.discover(patterns)?;
        let mut runs = Vec::new();
        while let Some(batch) = discovery.next_batch().await? {
            runs.extend(batch);
        }
        Ok(runs)
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Lazy, page-at-a-time repository discovery.
pub struct Discovery<'a> {
    /// Owning scanner.
    scanner: &'a Scanner,
    /// Compiled name filter.
    filter: Option<RepoPatterns>,
    /// Next page to fetch; `None` once exhausted.
    next_page: Option<u32>,
}

impl Discovery<'_> {
    /// Fetches the next page and returns runs for its matching repositories.
    ///
    /// Returns `Ok(None)` once every page has been consumed. A page may yield
    /// an empty batch when nothing on it matches.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Platform`] when listing fails.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Run>>, ScanError> {
        let Some(page) = self.next_page else {
            return Ok(None);
        };
        let listing =
            self.scanner.engine.platform().list_repositories(page, self.scanner.page_size).await?;
        self.next_page = listing.next_page;
        let runs = listing
            .repositories
            .into_iter()
            .filter(|repo| self.matches(repo))
            .map(|repo| self.scanner.engine.run(repo))
            .collect();
        Ok(Some(runs))
    }

    /// Applies the name filter.
    fn matches(&self, repo: &RepoRef) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.is_match(&repo.full_name()))
    }
}
