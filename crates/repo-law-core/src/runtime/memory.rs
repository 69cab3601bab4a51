// crates/repo-law-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Platform
// Description: Platform implementation backed by process memory.
// Purpose: Exercise runs and rules without a remote service.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! [`InMemoryPlatform`] keeps files, repositories, environments, secrets, and
//! keys in a mutex-protected state. Every mutating call is appended to a call
//! log so tests can assert ordering. Failures can be injected per operation.
//! It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::RepoRef;
use crate::interfaces::EnvironmentSettings;
use crate::interfaces::EnvironmentSummary;
use crate::interfaces::Platform;
use crate::interfaces::PlatformError;
use crate::interfaces::PublicKey;
use crate::interfaces::RepositoryPage;
use crate::interfaces::RepositorySettings;
use crate::interfaces::SealedSecret;

// ============================================================================
// SECTION: Call Log
// ============================================================================

/// Mutating platform call recorded by [`InMemoryPlatform`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    /// Repository settings patch.
    UpdateRepository {
        /// Target repository.
        repo: RepoRef,
        /// Patch sent.
        settings: RepositorySettings,
    },
    /// Environment create or update.
    UpsertEnvironment {
        /// Target repository.
        repo: RepoRef,
        /// Environment name.
        name: String,
        /// Settings sent.
        settings: EnvironmentSettings,
    },
    /// Environment deletion.
    DeleteEnvironment {
        /// Target repository.
        repo: RepoRef,
        /// Environment name.
        name: String,
    },
    /// Environment secret write.
    PutEnvironmentSecret {
        /// Target repository.
        repo: RepoRef,
        /// Environment name.
        environment: String,
        /// Secret name.
        name: String,
        /// Sealed value.
        secret: SealedSecret,
    },
    /// Environment secret deletion.
    DeleteEnvironmentSecret {
        /// Target repository.
        repo: RepoRef,
        /// Environment name.
        environment: String,
        /// Secret name.
        name: String,
    },
    /// Repository secret write.
    PutRepositorySecret {
        /// Target repository.
        repo: RepoRef,
        /// Secret name.
        name: String,
        /// Sealed value.
        secret: SealedSecret,
    },
    /// Repository secret deletion.
    DeleteRepositorySecret {
        /// Target repository.
        repo: RepoRef,
        /// Secret name.
        name: String,
    },
    /// Pull request approval.
    ApprovePullRequest {
        /// Target repository.
        repo: RepoRef,
        /// Pull request number.
        number: u64,
    },
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Mutable platform state.
#[derive(Default)]
struct MemoryState {
    /// File contents keyed by repository and path.
    files: BTreeMap<(RepoRef, String), String>,
    /// Accessible repositories in listing order.
    repositories: Vec<RepoRef>,
    /// Merged repository settings.
    settings: BTreeMap<RepoRef, RepositorySettings>,
    /// Environments per repository.
    environments: BTreeMap<RepoRef, BTreeMap<String, EnvironmentSummary>>,
    /// Environment secrets keyed by repository and environment.
    environment_secrets: BTreeMap<(RepoRef, String), BTreeMap<String, SealedSecret>>,
    /// Repository secrets.
    repository_secrets: BTreeMap<RepoRef, BTreeMap<String, SealedSecret>>,
    /// Repository secret keys.
    repository_keys: BTreeMap<RepoRef, PublicKey>,
    /// Environment secret keys.
    environment_keys: BTreeMap<(RepoRef, String), PublicKey>,
    /// Injected failures keyed by operation name.
    failures: BTreeMap<&'static str, PlatformError>,
    /// Mutating call log.
    calls: Vec<PlatformCall>,
    /// Number of `read_file` calls.
    reads: usize,
    /// Artificial latency applied to `read_file`.
    read_delay: Option<Duration>,
}

impl MemoryState {
    /// Returns the injected failure for an operation, if any.
    fn check(&self, operation: &'static str) -> Result<(), PlatformError> {
        self.failures.get(operation).map_or(Ok(()), |err| Err(err.clone()))
    }
}

// ============================================================================
// SECTION: In-Memory Platform
// ============================================================================

/// Platform backed by in-process state.
#[derive(Default)]
pub struct InMemoryPlatform {
    /// Shared state.
    state: Mutex<MemoryState>,
}

impl InMemoryPlatform {
    /// Creates an empty platform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, recovering from poisoning.
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a file.
    pub fn put_file(&self, repo: &RepoRef, path: &str, content: &str) {
        self.state().files.insert((repo.clone(), path.to_string()), content.to_string());
    }

    /// Adds a repository to the accessible listing.
    pub fn add_repository(&self, repo: RepoRef) {
        self.state().repositories.push(repo);
    }

    /// Sets the repository secret key.
    pub fn set_repository_key(&self, repo: &RepoRef, key: PublicKey) {
        self.state().repository_keys.insert(repo.clone(), key);
    }

    /// Creates an environment without recording a call.
    pub fn add_environment(&self, repo: &RepoRef, environment: EnvironmentSummary) {
        self.state()
            .environments
            .entry(repo.clone())
            .or_default()
            .insert(environment.name.clone(), environment);
    }

    /// Sets the secret key of an environment.
    pub fn set_environment_key(&self, repo: &RepoRef, environment: &str, key: PublicKey) {
        self.state().environment_keys.insert((repo.clone(), environment.to_string()), key);
    }

    /// Seeds a repository secret without recording a call.
    pub fn seed_repository_secret(&self, repo: &RepoRef, name: &str) {
        self.state()
            .repository_secrets
            .entry(repo.clone())
            .or_default()
            .insert(name.to_string(), placeholder_secret());
    }

    /// Seeds an environment secret without recording a call.
    pub fn seed_environment_secret(&self, repo: &RepoRef, environment: &str, name: &str) {
        self.state()
            .environment_secrets
            .entry((repo.clone(), environment.to_string()))
            .or_default()
            .insert(name.to_string(), placeholder_secret());
    }

    /// Makes every subsequent call of `operation` fail with `error`.
    pub fn fail(&self, operation: &'static str, error: PlatformError) {
        self.state().failures.insert(operation, error);
    }

    /// Removes an injected failure.
    pub fn heal(&self, operation: &'static str) {
        self.state().failures.remove(operation);
    }

    /// Delays every `read_file` call.
    pub fn set_read_delay(&self, delay: Duration) {
        self.state().read_delay = Some(delay);
    }

    /// Returns the mutating call log.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    /// Returns the number of `read_file` calls.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.state().reads
    }

    /// Returns merged repository settings.
    #[must_use]
    pub fn settings(&self, repo: &RepoRef) -> Option<RepositorySettings> {
        self.state().settings.get(repo).cloned()
    }

    /// Returns environment names of a repository.
    #[must_use]
    pub fn environment_names(&self, repo: &RepoRef) -> Vec<String> {
        self.state().environments.get(repo).map(|envs| envs.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns a stored repository secret.
    #[must_use]
    pub fn repository_secret(&self, repo: &RepoRef, name: &str) -> Option<SealedSecret> {
        self.state().repository_secrets.get(repo).and_then(|secrets| secrets.get(name)).cloned()
    }

    /// Returns a stored environment secret.
    #[must_use]
    pub fn environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
    ) -> Option<SealedSecret> {
        self.state()
            .environment_secrets
            .get(&(repo.clone(), environment.to_string()))
            .and_then(|secrets| secrets.get(name))
            .cloned()
    }
}

/// Stand-in value for seeded secrets.
fn placeholder_secret() -> SealedSecret {
    SealedSecret {
        key_id: "seed".to_string(),
        encrypted_value: String::new(),
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    async fn read_file(
        &self,
        repo: &RepoRef,
        path: &str,
        _git_ref: Option<&str>,
    ) -> Result<Option<String>, PlatformError> {
        let delay = {
            let mut state = self.state();
            state.reads += 1;
            state.read_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state();
        state.check("read_file")?;
        Ok(state.files.get(&(repo.clone(), path.to_string())).cloned())
    }

    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<RepositoryPage, PlatformError> {
        let state = self.state();
        state.check("list_repositories")?;
        let per_page = usize::try_from(per_page.max(1)).unwrap_or(usize::MAX);
        let index = usize::try_from(page.saturating_sub(1)).unwrap_or(usize::MAX);
        let start = index.saturating_mul(per_page);
        let end = start.saturating_add(per_page).min(state.repositories.len());
        let repositories =
            state.repositories.get(start .. end).map(<[RepoRef]>::to_vec).unwrap_or_default();
        let next_page = (end < state.repositories.len()).then(|| page.saturating_add(1));
        Ok(RepositoryPage {
            repositories,
            next_page,
        })
    }

    async fn update_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("update_repository")?;
        let merged = state.settings.entry(repo.clone()).or_default();
        for (key, value) in settings {
            merged.insert(key.clone(), value.clone());
        }
        state.calls.push(PlatformCall::UpdateRepository {
            repo: repo.clone(),
            settings: settings.clone(),
        });
        Ok(())
    }

    async fn list_environments(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<EnvironmentSummary>, PlatformError> {
        let state = self.state();
        state.check("list_environments")?;
        Ok(state.environments.get(repo).map(|envs| envs.values().cloned().collect()).unwrap_or_default())
    }

    async fn upsert_environment(
        &self,
        repo: &RepoRef,
        name: &str,
        settings: &EnvironmentSettings,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("upsert_environment")?;
        state.environments.entry(repo.clone()).or_default().insert(
            name.to_string(),
            EnvironmentSummary {
                name: name.to_string(),
                wait_timer: settings.wait_timer,
                can_admins_bypass: settings.can_admins_bypass,
            },
        );
        state.calls.push(PlatformCall::UpsertEnvironment {
            repo: repo.clone(),
            name: name.to_string(),
            settings: settings.clone(),
        });
        Ok(())
    }

    async fn delete_environment(&self, repo: &RepoRef, name: &str) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("delete_environment")?;
        if let Some(envs) = state.environments.get_mut(repo) {
            envs.remove(name);
        }
        state.environment_secrets.remove(&(repo.clone(), name.to_string()));
        state.calls.push(PlatformCall::DeleteEnvironment {
            repo: repo.clone(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn environment_public_key(
        &self,
        repo: &RepoRef,
        environment: &str,
    ) -> Result<Option<PublicKey>, PlatformError> {
        let state = self.state();
        state.check("environment_public_key")?;
        Ok(state.environment_keys.get(&(repo.clone(), environment.to_string())).cloned())
    }

    async fn list_environment_secrets(
        &self,
        repo: &RepoRef,
        environment: &str,
    ) -> Result<Vec<String>, PlatformError> {
        let state = self.state();
        state.check("list_environment_secrets")?;
        Ok(state
            .environment_secrets
            .get(&(repo.clone(), environment.to_string()))
            .map(|secrets| secrets.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("put_environment_secret")?;
        state
            .environment_secrets
            .entry((repo.clone(), environment.to_string()))
            .or_default()
            .insert(name.to_string(), secret.clone());
        state.calls.push(PlatformCall::PutEnvironmentSecret {
            repo: repo.clone(),
            environment: environment.to_string(),
            name: name.to_string(),
            secret: secret.clone(),
        });
        Ok(())
    }

    async fn delete_environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("delete_environment_secret")?;
        if let Some(secrets) =
            state.environment_secrets.get_mut(&(repo.clone(), environment.to_string()))
        {
            secrets.remove(name);
        }
        state.calls.push(PlatformCall::DeleteEnvironmentSecret {
            repo: repo.clone(),
            environment: environment.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn repository_public_key(&self, repo: &RepoRef) -> Result<PublicKey, PlatformError> {
        let state = self.state();
        state.check("repository_public_key")?;
        state
            .repository_keys
            .get(repo)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("public key for {repo}")))
    }

    async fn list_repository_secrets(&self, repo: &RepoRef) -> Result<Vec<String>, PlatformError> {
        let state = self.state();
        state.check("list_repository_secrets")?;
        Ok(state
            .repository_secrets
            .get(repo)
            .map(|secrets| secrets.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_repository_secret(
        &self,
        repo: &RepoRef,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("put_repository_secret")?;
        state
            .repository_secrets
            .entry(repo.clone())
            .or_default()
            .insert(name.to_string(), secret.clone());
        state.calls.push(PlatformCall::PutRepositorySecret {
            repo: repo.clone(),
            name: name.to_string(),
            secret: secret.clone(),
        });
        Ok(())
    }

    async fn delete_repository_secret(
        &self,
        repo: &RepoRef,
        name: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("delete_repository_secret")?;
        if let Some(secrets) = state.repository_secrets.get_mut(repo) {
            secrets.remove(name);
        }
        state.calls.push(PlatformCall::DeleteRepositorySecret {
            repo: repo.clone(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn approve_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.check("approve_pull_request")?;
        state.calls.push(PlatformCall::ApprovePullRequest {
            repo: repo.clone(),
            number,
        });
        Ok(())
    }
}
