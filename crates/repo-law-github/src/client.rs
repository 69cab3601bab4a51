// crates/repo-law-github/src/client.rs
// ============================================================================
// Module: GitHub REST Client
// Description: Asynchronous GitHub API client implementing the platform trait.
// Purpose: Reach repositories, environments, secrets, and reviews over HTTPS.
// Dependencies: repo-law-core, reqwest, base64, url
// ============================================================================

//! ## Overview
//! [`GitHubClient`] wraps one `reqwest` client configured with timeouts and
//! the API headers. Every call maps non-success statuses to
//! [`PlatformError::Http`]; lookups with an "absent" return map 404 to `None`.
//! Listings follow the `Link` header for the next page; secondary listings
//! (environments, secrets) are drained page by page before returning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use repo_law_core::EnvironmentSettings;
use repo_law_core::EnvironmentSummary;
use repo_law_core::Platform;
use repo_law_core::PlatformError;
use repo_law_core::PublicKey;
use repo_law_core::RepoRef;
use repo_law_core::RepositoryPage;
use repo_law_core::RepositorySettings;
use repo_law_core::SealedSecret;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::LINK;
use serde::de::DeserializeOwned;
use url::Url;

use crate::wire::ContentEntry;
use crate::wire::EnvironmentList;
use crate::wire::ErrorBody;
use crate::wire::RepositoryEntry;
use crate::wire::ReviewRequest;
use crate::wire::SecretList;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default public API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// API version pinned in every request.
const API_VERSION: &str = "2022-11-28";
/// Page size used for secondary listings (environments, secrets).
const LISTING_PAGE_SIZE: &str = "100";
/// Maximum error body characters kept in error messages.
const MAX_ERROR_MESSAGE_CHARS: usize = 512;

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubClientConfig {
    /// API base URL (GitHub Enterprise uses `https://host/api/v3`).
    pub api_url: String,
    /// Bearer token; anonymous requests when absent.
    pub token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(10),
            user_agent: concat!("repo-law/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// GitHub REST API client.
pub struct GitHubClient {
    /// Parsed API base URL.
    base_url: Url,
    /// HTTP client configured with timeouts and default headers.
    client: Client,
}

impl GitHubClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Transport`] when the URL, token, or HTTP
    /// client configuration is invalid.
    pub fn new(config: &GitHubClientConfig) -> Result<Self, PlatformError> {
        let base_url = Url::parse(config.api_url.trim_end_matches('/')).map_err(|err| {
            PlatformError::Transport(format!("invalid api url {}: {err}", config.api_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::Transport(format!(
                "invalid api url {}: not a base url",
                config.api_url
            )));
        }
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| PlatformError::Transport("invalid auth token".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|err| PlatformError::Transport(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
        })
    }

    /// Builds an endpoint URL from path segments (each segment is encoded).
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Returns the endpoint under `/repos/{owner}/{repo}`.
    fn repo_endpoint<'a>(&self, repo: &'a RepoRef, rest: &[&'a str]) -> Url {
        let head = ["repos", repo.owner.as_str(), repo.name.as_str()];
        self.endpoint(head.into_iter().chain(rest.iter().copied()))
    }

    /// Sends a request and returns the response when the status is 2xx.
    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let response =
            request.send().await.map_err(|err| PlatformError::Transport(err.to_string()))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    /// Sends a request; a 404 yields `Ok(None)`.
    async fn send_optional(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<Response>, PlatformError> {
        let response =
            request.send().await.map_err(|err| PlatformError::Transport(err.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            _ => Err(status_error(response).await),
        }
    }

    /// Fetches and decodes a JSON document.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, PlatformError> {
        let response = self.send(self.client.get(url)).await?;
        decode(response).await
    }

    /// Builds the request for one page of a secondary listing.
    fn listing_request(&self, base: &Url, page: u32) -> RequestBuilder {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("per_page", LISTING_PAGE_SIZE)
            .append_pair("page", &page.to_string());
        self.client.get(url)
    }

    /// Lists secret names from a listing endpoint across every page.
    async fn secret_names(&self, url: Url) -> Result<Vec<String>, PlatformError> {
        let mut names = Vec::new();
        let mut page = Some(1);
        while let Some(current) = page {
            let response = self.send(self.listing_request(&url, current)).await?;
            page = next_page(&response, current);
            let list: SecretList = decode(response).await?;
            names.extend(list.secrets.into_iter().map(|secret| secret.name));
        }
        Ok(names)
    }
}

// ============================================================================
// SECTION: Platform Implementation
// ============================================================================

#[async_trait]
impl Platform for GitHubClient {
    async fn read_file(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>, PlatformError> {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        let mut url = self.repo_endpoint(repo, &segments);
        if let Some(git_ref) = git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }
        let Some(response) = self.send_optional(self.client.get(url)).await? else {
            return Ok(None);
        };
        let body: serde_json::Value = decode(response).await?;
        // Directories come back as arrays.
        if body.is_array() {
            return Ok(None);
        }
        let entry: ContentEntry = serde_json::from_value(body)
            .map_err(|err| PlatformError::Decode(err.to_string()))?;
        if entry.kind != "file" {
            return Ok(None);
        }
        decode_content(&entry).map(Some)
    }

    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<RepositoryPage, PlatformError> {
        let mut url = self.endpoint(["user", "repos"]);
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        let response = self.send(self.client.get(url)).await?;
        let next_page = next_page(&response, page);
        let entries: Vec<RepositoryEntry> = decode(response).await?;
        Ok(RepositoryPage {
            repositories: entries
                .into_iter()
                .map(|entry| RepoRef::new(entry.owner.login, entry.name))
                .collect(),
            next_page,
        })
    }

    async fn update_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &[]);
        self.send(self.client.patch(url).json(settings)).await?;
        Ok(())
    }

    async fn list_environments(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<EnvironmentSummary>, PlatformError> {
        let url = self.repo_endpoint(repo, &["environments"]);
        let mut environments = Vec::new();
        let mut page = Some(1);
        while let Some(current) = page {
            let Some(response) = self.send_optional(self.listing_request(&url, current)).await?
            else {
                break;
            };
            page = next_page(&response, current);
            let list: EnvironmentList = decode(response).await?;
            environments.extend(list.environments.into_iter().map(|entry| EnvironmentSummary {
                wait_timer: entry
                    .protection_rules
                    .iter()
                    .find(|rule| rule.kind == "wait_timer")
                    .and_then(|rule| rule.wait_timer),
                can_admins_bypass: entry.can_admins_bypass,
                name: entry.name,
            }));
        }
        Ok(environments)
    }

    async fn upsert_environment(
        &self,
        repo: &RepoRef,
        name: &str,
        settings: &EnvironmentSettings,
    ) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &["environments", name]);
        self.send(self.client.put(url).json(settings)).await?;
        Ok(())
    }

    async fn delete_environment(&self, repo: &RepoRef, name: &str) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &["environments", name]);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn environment_public_key(
        &self,
        repo: &RepoRef,
        environment: &str,
    ) -> Result<Option<PublicKey>, PlatformError> {
        let url =
            self.repo_endpoint(repo, &["environments", environment, "secrets", "public-key"]);
        match self.send_optional(self.client.get(url)).await? {
            Some(response) => decode(response).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_environment_secrets(
        &self,
        repo: &RepoRef,
        environment: &str,
    ) -> Result<Vec<String>, PlatformError> {
        self.secret_names(self.repo_endpoint(repo, &["environments", environment, "secrets"]))
            .await
    }

    async fn put_environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &["environments", environment, "secrets", name]);
        self.send(self.client.put(url).json(secret)).await?;
        Ok(())
    }

    async fn delete_environment_secret(
        &self,
        repo: &RepoRef,
        environment: &str,
        name: &str,
    ) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &["environments", environment, "secrets", name]);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn repository_public_key(&self, repo: &RepoRef) -> Result<PublicKey, PlatformError> {
        self.get_json(self.repo_endpoint(repo, &["actions", "secrets", "public-key"])).await
    }

    async fn list_repository_secrets(&self, repo: &RepoRef) -> Result<Vec<String>, PlatformError> {
        self.secret_names(self.repo_endpoint(repo, &["actions", "secrets"])).await
    }

    async fn put_repository_secret(
        &self,
        repo: &RepoRef,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &["actions", "secrets", name]);
        self.send(self.client.put(url).json(secret)).await?;
        Ok(())
    }

    async fn delete_repository_secret(
        &self,
        repo: &RepoRef,
        name: &str,
    ) -> Result<(), PlatformError> {
        let url = self.repo_endpoint(repo, &["actions", "secrets", name]);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn approve_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<(), PlatformError> {
        let number = number.to_string();
        let url = self.repo_endpoint(repo, &["pulls", number.as_str(), "reviews"]);
        let body = ReviewRequest {
            event: "APPROVE",
        };
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a JSON response body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    let bytes = response.bytes().await.map_err(|err| PlatformError::Transport(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| PlatformError::Decode(err.to_string()))
}

/// Converts a non-success response into [`PlatformError::Http`].
async fn status_error(response: Response) -> PlatformError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map_or_else(|_| text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect(), |body| body.message);
    PlatformError::Http {
        status,
        message,
    }
}

/// Decodes the base64 payload of a file entry.
fn decode_content(entry: &ContentEntry) -> Result<String, PlatformError> {
    let content = entry.content.as_deref().unwrap_or_default();
    match entry.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = content.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
            let bytes =
                STANDARD.decode(compact).map_err(|err| PlatformError::Decode(err.to_string()))?;
            String::from_utf8(bytes)
                .map_err(|_| PlatformError::Decode("file content is not utf-8".to_string()))
        }
        Some(other) => Err(PlatformError::Decode(format!("unsupported content encoding {other}"))),
    }
}

/// Reads the next page from the `Link` header; only pages past `current` count.
fn next_page(response: &Response, current: u32) -> Option<u32> {
    response
        .headers()
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(next_page_from_link)
        .filter(|next| *next > current)
}

/// Extracts the `page` query parameter of the `rel="next"` link.
#[must_use]
pub fn next_page_from_link(header: &str) -> Option<u32> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim().strip_prefix('<')?.strip_suffix('>')?;
        let is_next = pieces.any(|param| param.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let url = Url::parse(target).ok()?;
        url.query_pairs().find(|(key, _)| key == "page").and_then(|(_, value)| value.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::next_page_from_link;

    #[test]
    fn next_page_is_read_from_link_header() {
        let header = "<https://api.github.com/user/repos?per_page=2&page=3>; rel=\"next\", \
                      <https://api.github.com/user/repos?per_page=2&page=9>; rel=\"last\"";
        assert_eq!(next_page_from_link(header), Some(3));
    }

    #[test]
    fn last_page_has_no_next_link() {
        let header = "<https://api.github.com/user/repos?page=1>; rel=\"prev\", \
                      <https://api.github.com/user/repos?page=1>; rel=\"first\"";
        assert_eq!(next_page_from_link(header), None);
    }
}
