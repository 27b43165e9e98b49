//! Remote tutorial source: change detection and sparse fetch.
//!
//! Before building, tutpage asks the hosting API for the newest commit that
//! touched the tutorial path ([`commits`]). When a rebuild is due, the
//! tutorial subtree is materialized locally by an external process
//! ([`fetch`]), never by cloning the whole repository history.

pub mod commits;
pub mod fetch;

use std::time::Duration;

use reqwest::Client;
use tutpage_shared::{Result, TutpageError};

pub use commits::{GithubCommits, Revision, RevisionSource};
pub use fetch::{ContentFetcher, SparseFetcher, clear_target};

/// User-Agent string for API requests (GitHub rejects requests without one).
const USER_AGENT: &str = concat!("tutpage/", env!("CARGO_PKG_VERSION"));

/// Default timeout in seconds for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Build a reqwest client with appropriate settings.
fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| TutpageError::config(format!("failed to build HTTP client: {e}")))
}
