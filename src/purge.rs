//! Fork purge pipeline
//!
//! Lists every repository of an account page by page, keeps the forks whose
//! creation time is older than the age threshold, and deletes them one at a
//! time. The first failure ends the run; nothing is retried or rolled back.
//!
//! All network calls of a run share one deadline. When it elapses the call in
//! flight fails and the error keeps the category (listing or deletion) of
//! that call.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

use crate::error::PurgeError;
use crate::github::{RepositoryApi, RepositoryRecord};

/// Tunables for a purge run
#[derive(Debug, Clone)]
pub struct PurgeOptions {
    /// Forks older than this are deleted
    pub threshold: chrono::Duration,
    /// Repositories requested per listing page
    pub per_page: u8,
    /// Deadline for the whole run
    pub timeout: Duration,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        Self {
            threshold: chrono::Duration::days(60),
            per_page: 100,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Age predicate evaluated against a fixed reference time
#[derive(Debug, Clone, Copy)]
pub struct AgeFilter {
    threshold: chrono::Duration,
    reference_time: DateTime<Utc>,
}

impl AgeFilter {
    pub fn new(threshold: chrono::Duration, reference_time: DateTime<Utc>) -> Self {
        Self {
            threshold,
            reference_time,
        }
    }

    /// True iff the record is a fork created strictly more than `threshold` ago
    pub fn matches(&self, record: &RepositoryRecord) -> bool {
        if !record.fork {
            return false;
        }

        match record.created_at {
            Some(created_at) => self.reference_time - created_at > self.threshold,
            None => false,
        }
    }

    /// Wrap the record as a deletion candidate if it passes the filter
    pub fn select(&self, record: RepositoryRecord) -> Option<StaleFork> {
        self.matches(&record).then_some(StaleFork(record))
    }

    pub fn threshold(&self) -> chrono::Duration {
        self.threshold
    }
}

/// A repository that passed the age filter
///
/// Only `AgeFilter::select` creates these, so the deleter never sees a record
/// that failed the predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFork(RepositoryRecord);

impl StaleFork {
    pub fn record(&self) -> &RepositoryRecord {
        &self.0
    }

    pub fn full_name(&self) -> String {
        self.0.full_name()
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub deleted: usize,
    pub threshold_days: i64,
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deleted == 0 {
            write!(f, "no forked repos to delete")
        } else {
            write!(
                f,
                "deleted {} forked repos that are older than {}",
                self.deleted, self.threshold_days
            )
        }
    }
}

/// Lists, filters and deletes stale forks through a `RepositoryApi`
pub struct ForkPurger<A> {
    api: A,
    options: PurgeOptions,
}

impl<A: RepositoryApi> ForkPurger<A> {
    pub fn new(api: A, options: PurgeOptions) -> Self {
        Self { api, options }
    }

    /// Run the whole pipeline for `account` under the configured deadline
    pub async fn run(&self, account: &str) -> Result<RunResult, PurgeError> {
        let deadline = Instant::now() + self.options.timeout;
        let filter = AgeFilter::new(self.options.threshold, Utc::now());
        let threshold_days = filter.threshold().num_days();

        info!(
            "Looking for forks of {} older than {} days",
            account, threshold_days
        );

        let forks = self.find_stale_forks(account, &filter, deadline).await?;

        if forks.is_empty() {
            let result = RunResult {
                deleted: 0,
                threshold_days,
            };
            info!("{}", result);
            return Ok(result);
        }

        let deleted = self.delete_all(&forks, deadline).await?;
        let result = RunResult {
            deleted,
            threshold_days,
        };
        info!("{}", result);

        Ok(result)
    }

    /// Page through the account's repositories, keeping matches in listing order
    pub async fn find_stale_forks(
        &self,
        account: &str,
        filter: &AgeFilter,
        deadline: Instant,
    ) -> Result<Vec<StaleFork>, PurgeError> {
        let mut forks = Vec::new();
        let mut page = 1u32;
        let mut listed = 0usize;

        loop {
            let result = within_deadline(
                deadline,
                self.api
                    .list_repositories(account, page, self.options.per_page),
            )
            .await
            .map_err(|source| PurgeError::Listing {
                account: account.to_string(),
                page,
                source,
            })?;

            listed += result.items.len();
            for record in result.items {
                let name = record.full_name();
                match filter.select(record) {
                    Some(fork) => {
                        debug!("Stale fork: {}", name);
                        forks.push(fork);
                    }
                    None => debug!("Keeping repository: {}", name),
                }
            }

            match result.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        info!(
            "Found {} stale forks among {} repositories ({} pages)",
            forks.len(),
            listed,
            page
        );
        Ok(forks)
    }

    /// Delete forks in order, stopping at the first failure
    pub async fn delete_all(
        &self,
        forks: &[StaleFork],
        deadline: Instant,
    ) -> Result<usize, PurgeError> {
        for fork in forks {
            let record = fork.record();

            within_deadline(
                deadline,
                self.api.delete_repository(&record.owner, &record.name),
            )
            .await
            .map_err(|source| PurgeError::Deletion {
                repository: fork.full_name(),
                source,
            })?;

            info!("Deleted {}", fork.full_name());
        }

        Ok(forks.len())
    }
}

/// Await `call`, failing with a timeout error once `deadline` has passed
async fn within_deadline<T, F>(deadline: Instant, call: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("run deadline elapsed")),
    }
}
