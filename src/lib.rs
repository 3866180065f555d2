//! fork-purger - Scheduled cleanup of stale forked GitHub repositories
//!
//! Lists every repository owned by an account, keeps the forks created more
//! than a threshold ago (60 days by default), and deletes them one by one.
//! Meant to run from cron or a scheduled CI job.
//!
//! ## Modules
//!
//! - [`config`]: Settings file, environment credentials and duration parsing
//! - [`error`]: Error taxonomy for a run
//! - [`github`]: Repository API capability and its octocrab implementation
//! - [`purge`]: Age filter, lister, deleter and run controller

pub mod config;
pub mod error;
pub mod github;
pub mod purge;

pub use config::{Config, Credentials};
pub use error::PurgeError;
pub use github::{GitHubClient, RepositoryApi, RepositoryPage, RepositoryRecord};
pub use purge::{AgeFilter, ForkPurger, PurgeOptions, RunResult, StaleFork};
