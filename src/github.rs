use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::models::Repository;
use octocrab::{Octocrab, Page};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Credentials;

/// Snapshot of a remote repository as reported by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    /// Owner login
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Whether the platform flags the repository as a fork
    pub fork: bool,
    /// Creation timestamp, if the platform reported one
    pub created_at: Option<DateTime<Utc>>,
}

impl RepositoryRecord {
    /// Get display name (owner/name format)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Convert an octocrab Repository, using `account` when the owner is missing
    pub fn from_repository(repo: &Repository, account: &str) -> Self {
        let owner = repo
            .owner
            .as_ref()
            .map(|o| o.login.clone())
            .unwrap_or_else(|| account.to_string());

        Self {
            owner,
            name: repo.name.clone(),
            fork: repo.fork.unwrap_or(false),
            created_at: repo.created_at,
        }
    }
}

/// One page of listing results
#[derive(Debug, Clone, Default)]
pub struct RepositoryPage {
    pub items: Vec<RepositoryRecord>,
    /// Page to request next, or `None` once the platform reports no further pages
    pub next_page: Option<u32>,
}

/// Repository operations the purger needs from the hosting platform
///
/// `GitHubClient` is the production implementation. Tests substitute fakes
/// so listing and deletion can be exercised without network access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Fetch one page of repositories owned by `account`
    async fn list_repositories(
        &self,
        account: &str,
        page: u32,
        per_page: u8,
    ) -> Result<RepositoryPage>;

    /// Delete the repository `owner/name`
    async fn delete_repository(&self, owner: &str, name: &str) -> Result<()>;
}

#[derive(Serialize)]
struct ListReposParams {
    per_page: u8,
    page: u32,
}

/// GitHub client wrapper authenticated with a personal access token
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a client for api.github.com
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(credentials.token().to_string())
            .build()
            .context("Failed to create GitHub client")?;

        debug!("GitHub client ready for account {}", credentials.account());
        Ok(Self { client })
    }

    /// Create a client against a different API root (GitHub Enterprise, test servers)
    pub fn with_base_uri(credentials: &Credentials, base_uri: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(base_uri)
            .with_context(|| format!("Invalid GitHub API base URI: {}", base_uri))?
            .personal_token(credentials.token().to_string())
            .build()
            .context("Failed to create GitHub client")?;

        debug!("GitHub client ready for account {} at {}", credentials.account(), base_uri);
        Ok(Self { client })
    }
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn list_repositories(
        &self,
        account: &str,
        page: u32,
        per_page: u8,
    ) -> Result<RepositoryPage> {
        debug!("Fetching repositories page {} for: {}", page, account);

        let route = format!("/users/{}/repos", account);
        let params = ListReposParams { per_page, page };

        let result: Page<Repository> = self
            .client
            .get(route, Some(&params))
            .await
            .with_context(|| format!("Failed to fetch repositories page {}", page))?;

        let next_page = result
            .next
            .as_ref()
            .map(|uri| next_page_number(uri.query(), page));

        let items = result
            .items
            .iter()
            .map(|repo| RepositoryRecord::from_repository(repo, account))
            .collect();

        Ok(RepositoryPage { items, next_page })
    }

    async fn delete_repository(&self, owner: &str, name: &str) -> Result<()> {
        self.client
            .repos(owner, name)
            .delete()
            .await
            .with_context(|| format!("Failed to delete repository {}/{}", owner, name))
    }
}

/// Page number carried by a `rel="next"` link query, defaulting to the following page
fn next_page_number(query: Option<&str>, current: u32) -> u32 {
    let parsed = query.and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "page")
            .and_then(|(_, value)| value.parse::<u32>().ok())
    });

    match parsed {
        Some(page) if page > current => page,
        Some(page) => {
            warn!(
                "Next-page link points backwards (page {} after {}), advancing by one",
                page, current
            );
            current + 1
        }
        None => current + 1,
    }
}
