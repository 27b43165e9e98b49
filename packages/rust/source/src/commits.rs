//! "Latest change affecting a path" lookup against the GitHub commits API.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use tutpage_shared::{BuildConfig, Result, TutpageError};

/// The newest change recorded for the tracked path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Revision identifier (commit SHA).
    pub sha: String,
    /// First line of the commit message, if the API returned one.
    pub message: Option<String>,
    /// Commit timestamp as reported by the API.
    pub committed_at: Option<String>,
}

impl std::fmt::Display for Revision {
    /// `<short sha> <message> (<date>)`, omitting whatever the API left out.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short = self.sha.get(..7).unwrap_or(&self.sha);
        write!(f, "{short}")?;
        if let Some(message) = &self.message {
            write!(f, " {message}")?;
        }
        if let Some(date) = &self.committed_at {
            write!(f, " ({date})")?;
        }
        Ok(())
    }
}

/// Anything that can report the latest revision of the tracked content.
pub trait RevisionSource {
    /// Fetch the newest revision affecting the tracked path.
    ///
    /// Fails with `RemoteUnavailable` when the endpoint cannot be reached and
    /// with `NoHistoryFound` when there are no change records at all.
    fn latest_revision(&self) -> impl Future<Output = Result<Revision>> + Send;
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CommitRecord {
    sha: String,
    #[serde(default)]
    commit: Option<CommitDetail>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    #[serde(default)]
    date: Option<String>,
}

/// Queries `GET /repos/{owner}/{repo}/commits?path=..&page=1&per_page=1`.
#[derive(Debug, Clone)]
pub struct GithubCommits {
    client: Client,
    endpoint: Url,
    repo: String,
    path: String,
    token: Option<String>,
}

impl GithubCommits {
    /// Create a client for `repo` (`owner/name`) and the repository `path`.
    pub fn new(api_base: &str, repo: &str, path: &str, token: Option<String>) -> Result<Self> {
        let endpoint = commits_endpoint(api_base, repo, path)?;
        Ok(Self {
            client: crate::build_client()?,
            endpoint,
            repo: repo.to_string(),
            path: path.to_string(),
            token,
        })
    }

    /// Create a client for the tutorial tracked by `config`.
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Self::new(
            &config.api_base,
            &config.repo,
            &config.remote_content_path(),
            config.token.clone(),
        )
    }

    /// The fully-qualified request URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl RevisionSource for GithubCommits {
    #[instrument(skip_all, fields(repo = %self.repo, path = %self.path))]
    async fn latest_revision(&self) -> Result<Revision> {
        let url = self.endpoint.as_str();

        let mut request = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TutpageError::remote(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TutpageError::remote(url, format!("HTTP {status}")));
        }

        let records: Vec<CommitRecord> = response
            .json()
            .await
            .map_err(|e| TutpageError::remote(url, format!("invalid response body: {e}")))?;

        debug!(records = records.len(), "commit records received");

        let Some(record) = records.into_iter().next() else {
            return Err(TutpageError::NoHistoryFound {
                repo: self.repo.clone(),
                path: self.path.clone(),
            });
        };

        let (message, committed_at) = match record.commit {
            Some(detail) => (
                detail
                    .message
                    .and_then(|m| m.lines().next().map(str::to_string)),
                detail.committer.and_then(|c| c.date),
            ),
            None => (None, None),
        };

        let revision = Revision {
            sha: record.sha,
            message,
            committed_at,
        };

        info!(
            sha = %revision.sha,
            message = revision.message.as_deref().unwrap_or(""),
            committed_at = revision.committed_at.as_deref().unwrap_or(""),
            "latest remote revision"
        );

        Ok(revision)
    }
}

/// Build the commits endpoint URL for `repo` and `path`.
fn commits_endpoint(api_base: &str, repo: &str, path: &str) -> Result<Url> {
    let (owner, name) = repo
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| {
            TutpageError::config(format!("repository must be 'owner/name', got '{repo}'"))
        })?;

    let mut url = Url::parse(api_base)
        .map_err(|e| TutpageError::config(format!("invalid api_base '{api_base}': {e}")))?;

    url.path_segments_mut()
        .map_err(|()| TutpageError::config(format!("api_base '{api_base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(["repos", owner, name, "commits"]);

    url.query_pairs_mut()
        .append_pair("path", path)
        .append_pair("page", "1")
        .append_pair("per_page", "1");

    Ok(url)
}
