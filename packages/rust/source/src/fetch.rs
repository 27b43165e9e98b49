//! Sparse fetch of the tutorial subtree via an external process.
//!
//! Only the configured subpath of the remote repository ends up on disk.
//! The target directory is always emptied first so nothing from a previous
//! revision can leak into the next build.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use tutpage_shared::{BuildConfig, FetchStrategy, Result, TutpageError};

/// Materializes the remote content subtree in a local directory.
pub trait ContentFetcher {
    /// Replace the contents of `target` with exactly the remote subtree.
    ///
    /// Implementations must clear `target` (see [`clear_target`]) before
    /// writing anything, and fail with `FetchFailed` when the remote or the
    /// subpath is unavailable.
    fn fetch(&self, target: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// Remove any previous copy at `target` and leave an empty directory behind.
pub async fn clear_target(target: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(target).await {
        Ok(()) => debug!(path = %target.display(), "removed stale local copy"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(TutpageError::io(target, e)),
    }

    tokio::fs::create_dir_all(target)
        .await
        .map_err(|e| TutpageError::io(target, e))
}

// ---------------------------------------------------------------------------
// SparseFetcher
// ---------------------------------------------------------------------------

/// Fetches `repo/subpath@branch` with `git` or `degit`.
#[derive(Debug, Clone)]
pub struct SparseFetcher {
    strategy: FetchStrategy,
    program: String,
    repo: String,
    branch: String,
    subpath: String,
    web_base: String,
}

impl SparseFetcher {
    /// Create a fetcher for `repo` (`owner/name`), `branch` and repository `subpath`.
    pub fn new(
        strategy: FetchStrategy,
        repo: impl Into<String>,
        branch: impl Into<String>,
        subpath: impl Into<String>,
        web_base: impl Into<String>,
    ) -> Self {
        let program = match strategy {
            FetchStrategy::Git => "git",
            FetchStrategy::Degit => "degit",
        };
        Self {
            strategy,
            program: program.to_string(),
            repo: repo.into(),
            branch: branch.into(),
            subpath: subpath.into().trim_matches('/').to_string(),
            web_base: web_base.into(),
        }
    }

    /// Create the fetcher described by `config`.
    pub fn from_config(config: &BuildConfig) -> Self {
        let fetcher = Self::new(
            config.fetch_strategy,
            &config.repo,
            &config.branch,
            &config.fetch_path,
            &config.web_base,
        );
        match &config.fetch_program {
            Some(program) => fetcher.with_program(program),
            None => fetcher,
        }
    }

    /// Use a different executable (e.g. an absolute path to `git`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// `owner/name/subpath`, used in logs and errors.
    pub fn source_spec(&self) -> String {
        if self.subpath.is_empty() {
            self.repo.clone()
        } else {
            format!("{}/{}", self.repo, self.subpath)
        }
    }

    fn clone_url(&self) -> String {
        format!("{}/{}.git", self.web_base.trim_end_matches('/'), self.repo)
    }

    fn git_clone_args(&self, scratch: &Path) -> Vec<String> {
        let mut args = vec![
            "clone".to_string(),
            "--depth".into(),
            "1".into(),
            "--filter=blob:none".into(),
        ];
        if !self.subpath.is_empty() {
            args.push("--sparse".into());
        }
        args.extend([
            "--branch".into(),
            self.branch.clone(),
            self.clone_url(),
            scratch.to_string_lossy().into_owned(),
        ]);
        args
    }

    fn git_sparse_args(&self, scratch: &Path) -> Vec<String> {
        vec![
            "-C".into(),
            scratch.to_string_lossy().into_owned(),
            "sparse-checkout".into(),
            "set".into(),
            self.subpath.clone(),
        ]
    }

    fn degit_args(&self, target: &Path) -> Vec<String> {
        vec![
            format!("{}#{}", self.source_spec(), self.branch),
            target.to_string_lossy().into_owned(),
            "--force".into(),
        ]
    }

    /// Run the fetch program, mapping spawn failures and non-zero exits to `FetchFailed`.
    async fn run(&self, args: &[String]) -> Result<()> {
        debug!(program = %self.program, ?args, "running fetch command");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                TutpageError::fetch(
                    self.source_spec(),
                    format!("failed to spawn `{}`: {e}. Is it installed?", self.program),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.trim().lines().collect();
            let tail = lines[lines.len().saturating_sub(5)..].join(" | ");
            return Err(TutpageError::fetch(
                self.source_spec(),
                format!("`{}` exited with {}: {tail}", self.program, output.status),
            ));
        }

        Ok(())
    }

    async fn fetch_git(&self, target: &Path) -> Result<()> {
        let scratch = scratch_dir(target);

        let result = self.clone_and_prune(&scratch, target).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %scratch.display(), error = %e, "failed to remove scratch clone");
            }
        }

        result
    }

    async fn clone_and_prune(&self, scratch: &Path, target: &Path) -> Result<()> {
        self.run(&self.git_clone_args(scratch)).await?;

        let fetched = if self.subpath.is_empty() {
            let git_dir = scratch.join(".git");
            tokio::fs::remove_dir_all(&git_dir)
                .await
                .map_err(|e| TutpageError::io(&git_dir, e))?;
            scratch.to_path_buf()
        } else {
            self.run(&self.git_sparse_args(scratch)).await?;
            scratch.join(&self.subpath)
        };

        if !tokio::fs::metadata(&fetched)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(TutpageError::fetch(
                self.source_spec(),
                format!("subpath '{}' does not exist on {}", self.subpath, self.branch),
            ));
        }

        tokio::fs::remove_dir(target)
            .await
            .map_err(|e| TutpageError::io(target, e))?;
        tokio::fs::rename(&fetched, target)
            .await
            .map_err(|e| TutpageError::io(target, e))
    }

    async fn fetch_degit(&self, target: &Path) -> Result<()> {
        self.run(&self.degit_args(target)).await?;

        let mut entries = tokio::fs::read_dir(target)
            .await
            .map_err(|e| TutpageError::io(target, e))?;
        let populated = entries
            .next_entry()
            .await
            .map_err(|e| TutpageError::io(target, e))?
            .is_some();

        if !populated {
            return Err(TutpageError::fetch(
                self.source_spec(),
                "degit finished but the target directory is empty",
            ));
        }
        Ok(())
    }
}

impl ContentFetcher for SparseFetcher {
    #[instrument(skip_all, fields(source = %self.source_spec(), branch = %self.branch, dest = %target.display()))]
    async fn fetch(&self, target: &Path) -> Result<()> {
        clear_target(target).await?;

        info!(strategy = ?self.strategy, "fetching remote subtree");

        match self.strategy {
            FetchStrategy::Git => self.fetch_git(target).await?,
            FetchStrategy::Degit => self.fetch_degit(target).await?,
        }

        info!("remote subtree fetched");
        Ok(())
    }
}

/// Sibling scratch directory for a clone destined for `target`.
fn scratch_dir(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tutpage".into());
    target.with_file_name(format!(".{name}.clone-{}", uuid::Uuid::now_v7()))
}
