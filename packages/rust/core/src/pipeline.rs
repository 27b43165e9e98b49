//! End-to-end `build` pipeline: revision check → fetch → walk → assemble →
//! render → write page → copy assets → save build state.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument};

use tutpage_markdown::{link_headings, render_html};
use tutpage_shared::{BuildConfig, BuildInfo, Result, TutpageError};
use tutpage_source::{ContentFetcher, RevisionSource};

use crate::assembler::assemble;
use crate::detector::{RebuildDecision, needs_rebuild};
use crate::page::{TemplateVars, copy_assets, load_template, render_template, write_page};
use crate::state::BuildStateStore;
use crate::walker::{WalkOptions, walk};

/// Summary of a completed build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Revision the page was built from.
    pub sha: String,
    /// Why the build ran.
    pub decision: RebuildDecision,
    /// Number of sections rendered.
    pub sections: usize,
    /// Number of chapters rendered.
    pub chapters: usize,
    /// Number of example files collected across all chapters.
    pub example_files: usize,
    /// Number of asset files copied into the dist directory.
    pub assets_copied: usize,
    /// Path of the written page.
    pub output: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Result of [`run_build`].
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The remote revision matches the last build; nothing was touched.
    Skipped { sha: String },
    /// A new page was rendered and the build state updated.
    Built(BuildReport),
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the rebuild decision is known.
    fn decided(&self, sha: &str, decision: &RebuildDecision);
    /// Called when the pipeline completes (built or skipped).
    fn done(&self, outcome: &BuildOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn decided(&self, _sha: &str, _decision: &RebuildDecision) {}
    fn done(&self, _outcome: &BuildOutcome) {}
}

/// Run the full build.
///
/// 1. Load the last build record
/// 2. Ask the remote for its latest revision and decide
/// 3. Fetch the content subtree and walk it into sections
/// 4. Assemble, render, substitute into the template, add heading links
/// 5. Write the page and copy assets
/// 6. Save the new build record
///
/// Any error aborts before step 6, leaving the previous record in place.
#[instrument(skip_all, fields(repo = %config.repo, branch = %config.branch, force = force))]
pub async fn run_build(
    config: &BuildConfig,
    force: bool,
    revisions: &impl RevisionSource,
    fetcher: &impl ContentFetcher,
    progress: &dyn ProgressReporter,
) -> Result<BuildOutcome> {
    let start = Instant::now();
    let store = BuildStateStore::new(&config.build_info);

    // --- Phase 1: Change detection ---
    progress.phase("Checking remote revision");
    let previous = store.load().await;
    let revision = revisions.latest_revision().await?;
    let decision = needs_rebuild(previous.as_ref(), &revision.sha, force);
    progress.decided(&revision.sha, &decision);

    if !decision.should_build() {
        info!(sha = %revision.sha, "content unchanged, skipping build");
        let outcome = BuildOutcome::Skipped { sha: revision.sha };
        progress.done(&outcome);
        return Ok(outcome);
    }

    info!(sha = %revision.sha, %decision, revision = %revision, "building");

    // --- Phase 2: Fetch ---
    progress.phase("Fetching tutorial content");
    fetcher.fetch(&config.clone_dir).await?;

    let content_root = config.content_root();
    if !tokio::fs::metadata(&content_root)
        .await
        .is_ok_and(|m| m.is_dir())
    {
        return Err(TutpageError::fetch(
            format!("{}/{}", config.repo, config.fetch_path),
            format!("fetched tree has no '{}' directory", config.content_path),
        ));
    }

    // --- Phase 3: Walk ---
    progress.phase("Reading sections and chapters");
    let options = WalkOptions::from_config(config)?;
    let sections = walk(&content_root, &options).await?;

    let chapters = sections.iter().map(|s| s.chapters.len()).sum();
    let example_files = sections
        .iter()
        .flat_map(|s| &s.chapters)
        .map(|c| c.example_files.len())
        .sum();

    // --- Phase 4: Render ---
    progress.phase("Rendering page");
    let document = assemble(&sections);
    let info = BuildInfo {
        sha: revision.sha.clone(),
        build_at_ms: Utc::now().timestamp_millis(),
    };

    let template = load_template(&config.template).await?;
    let vars = TemplateVars::new(&info, render_html(&document))?;
    let html = link_headings(&render_template(&template, &vars)?);

    // --- Phase 5: Output ---
    progress.phase("Writing output");
    let output = config.output_page();
    write_page(&output, &html).await?;
    let assets_copied = copy_assets(&config.assets).await?;

    // --- Phase 6: Persist ---
    store.save(&info).await?;

    let report = BuildReport {
        sha: info.sha,
        decision,
        sections: sections.len(),
        chapters,
        example_files,
        assets_copied,
        output,
        elapsed: start.elapsed(),
    };

    info!(
        sha = %report.sha,
        sections = report.sections,
        chapters = report.chapters,
        elapsed_ms = report.elapsed.as_millis(),
        "build complete"
    );

    let outcome = BuildOutcome::Built(report);
    progress.done(&outcome);
    Ok(outcome)
}

/// The last successful build, if any. Reads local state only.
pub async fn build_status(config: &BuildConfig) -> Option<BuildInfo> {
    BuildStateStore::new(&config.build_info).load().await
}
