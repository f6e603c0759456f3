//! gh-report's per-run state.

use std::time::Duration;

use thiserror::Error;

use crate::{github::ClientError, scope::ScopeError};

/// The self-imposed delay between paged or per-account requests.
pub(crate) const RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);

/// Everything one report invocation needs. Nothing here outlives the run.
pub(crate) struct ReportState<C> {
    /// The GitHub API client.
    pub(crate) api: C,
    /// Whether the client talks to github.com (or GHE.com) rather than
    /// a GitHub Enterprise Server instance.
    pub(crate) standard_host: bool,
    /// How long to wait between pages and between accounts.
    pub(crate) delay: Duration,
}

impl<C> ReportState<C> {
    pub(crate) fn new(api: C, standard_host: bool) -> Self {
        Self {
            api,
            standard_host,
            delay: RATE_LIMIT_DELAY,
        }
    }

    #[cfg(test)]
    pub(crate) fn unthrottled(api: C) -> Self {
        Self {
            api,
            standard_host: true,
            delay: Duration::ZERO,
        }
    }
}

/// Errors that abort a report.
#[derive(Debug, Error)]
pub(crate) enum ReportError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("couldn't fetch report data from GitHub")]
    Client(#[from] ClientError),
    #[error("enterprise {0} not found, or not visible to this token")]
    UnknownEnterprise(String),
    #[error("account {0} not found, or not visible to this token")]
    UnknownAccount(String),
    #[error("couldn't serialize report")]
    Serialize(#[from] serde_json::Error),
}
