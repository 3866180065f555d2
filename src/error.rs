//! Error taxonomy for a purge run.
//!
//! Configuration problems are detected before any network call. Listing and
//! deletion failures wrap the underlying API error (including an elapsed run
//! deadline) so the caller always knows which step of the run failed.

use thiserror::Error;

/// Errors that terminate a purge run.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// A required environment variable is not set.
    #[error("{name} environment variable not set")]
    MissingEnv { name: &'static str },

    /// A required environment variable is set but blank.
    #[error("{name} environment variable is empty")]
    EmptyEnv { name: &'static str },

    /// A settings-file value is outside its accepted range.
    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// A page request failed. No deletions are attempted after this.
    #[error("Failed to list repositories for {account} (page {page})")]
    Listing {
        account: String,
        page: u32,
        #[source]
        source: anyhow::Error,
    },

    /// A delete call failed. Repositories deleted earlier in the run stay deleted.
    #[error("Failed to delete repository {repository}")]
    Deletion {
        repository: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PurgeError {
    /// True for errors raised before any network call was made.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingEnv { .. } | Self::EmptyEnv { .. } | Self::InvalidSetting { .. }
        )
    }
}
