//! Concurrent walk of a fetched tutorial tree into [`Section`]s.
//!
//! Layout expected under the content root:
//!
//! ```text
//! <root>/
//! ├── 01-introduction/
//! │   ├── meta.json          {"title": "Introduction"}
//! │   ├── 01-basics/
//! │   │   ├── text.md
//! │   │   ├── app-a/...      starter
//! │   │   └── app-b/...      solution
//! │   └── 02-adding-data/
//! └── 02-reactivity/
//! ```
//!
//! Sections and their chapters are read on separate tasks. Each task builds
//! only its own value; results are joined and chapters sorted per section.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use tutpage_markdown::{ChapterContext, ChapterLinks, LinkBase, process_chapter};
use tutpage_shared::{BuildConfig, Chapter, ExampleFile, Result, Section, TutpageError};

/// What to look for inside section and chapter directories.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Section sidecar file name (`meta.json`).
    pub section_meta: String,
    /// Chapter markdown file name (`text.md`).
    pub chapter_file: String,
    /// Preferred example directory (`app-b`).
    pub solution_dir: String,
    /// Fallback example directory (`app-a`), used only when it is the sole subdirectory.
    pub starter_dir: String,
    /// Extensions (without dot) of example files to collect.
    pub example_extensions: Vec<String>,
    /// Bases for per-chapter links.
    pub links: LinkBase,
}

impl WalkOptions {
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Ok(Self {
            section_meta: config.section_meta.clone(),
            chapter_file: config.chapter_file.clone(),
            solution_dir: config.solution_dir.clone(),
            starter_dir: config.starter_dir.clone(),
            example_extensions: config.example_extensions.clone(),
            links: LinkBase::from_config(config)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SectionMeta {
    title: String,
}

/// Read every section under `content_root`.
///
/// Sections come back in completion order; ordering is the assembler's job.
/// The first failing task aborts the walk.
#[instrument(skip_all, fields(root = %content_root.display()))]
pub async fn walk(content_root: &Path, options: &WalkOptions) -> Result<Vec<Section>> {
    let options = Arc::new(options.clone());
    let section_dirs = list_subdirs(content_root).await?;

    let mut tasks = JoinSet::new();
    for (dir_name, path) in section_dirs {
        let options = Arc::clone(&options);
        tasks.spawn(walk_section(dir_name, path, options));
    }

    let sections = join_all(tasks).await?;

    info!(
        sections = sections.len(),
        chapters = sections.iter().map(|s| s.chapters.len()).sum::<usize>(),
        "tutorial tree walked"
    );

    Ok(sections)
}

/// Parse the ordinal prefix of a `NN-name` directory.
///
/// The text before the first `-` (or the whole name without one) must be
/// ASCII digits that fit in a `u32`.
pub fn parse_index(dir_name: &str) -> Result<u32> {
    let prefix = dir_name.split('-').next().unwrap_or_default();
    let malformed = || TutpageError::MalformedIndex {
        name: dir_name.to_string(),
    };

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    prefix.parse().map_err(|_| malformed())
}

// ---------------------------------------------------------------------------
// Sections & chapters
// ---------------------------------------------------------------------------

async fn walk_section(dir_name: String, path: PathBuf, options: Arc<WalkOptions>) -> Result<Section> {
    let index = parse_index(&dir_name)?;
    let title = read_section_title(&path.join(&options.section_meta)).await?;

    let mut tasks = JoinSet::new();
    for (chapter_dir, chapter_path) in list_subdirs(&path).await? {
        let section_dir = dir_name.clone();
        let options = Arc::clone(&options);
        tasks.spawn(walk_chapter(section_dir, chapter_dir, chapter_path, options));
    }

    let mut chapters = join_all(tasks).await?;
    chapters.sort_by(|a, b| (a.index, &a.dir_name).cmp(&(b.index, &b.dir_name)));

    debug!(section = %dir_name, %title, chapters = chapters.len(), "section read");

    Ok(Section {
        index,
        dir_name,
        title,
        chapters,
    })
}

async fn read_section_title(meta_path: &Path) -> Result<String> {
    let missing = |reason: String| TutpageError::MissingSectionMetadata {
        path: meta_path.to_path_buf(),
        reason,
    };

    let contents = tokio::fs::read_to_string(meta_path)
        .await
        .map_err(|e| missing(e.to_string()))?;
    let meta: SectionMeta =
        serde_json::from_str(&contents).map_err(|e| missing(format!("invalid JSON: {e}")))?;

    Ok(meta.title)
}

async fn walk_chapter(
    section_dir: String,
    dir_name: String,
    path: PathBuf,
    options: Arc<WalkOptions>,
) -> Result<Chapter> {
    let index = parse_index(&dir_name)?;

    let text_path = path.join(&options.chapter_file);
    let raw = tokio::fs::read_to_string(&text_path)
        .await
        .map_err(|source| TutpageError::MissingChapterContent {
            path: text_path.clone(),
            source,
        })?;

    let example_files = match select_example_dir(&path, &options).await? {
        Some(dir) => collect_example_files(&dir, &options.example_extensions).await?,
        None => Vec::new(),
    };

    let ctx = ChapterContext {
        index,
        default_title: format!("{section_dir} / {dir_name}"),
        links: ChapterLinks::new(&options.links, &section_dir, &dir_name),
    };
    let processed = process_chapter(&raw, &ctx);

    Ok(Chapter {
        index,
        dir_name,
        title: processed.title,
        processed_markdown: processed.markdown,
        example_files,
    })
}

// ---------------------------------------------------------------------------
// Example files
// ---------------------------------------------------------------------------

/// Pick the directory example files are read from.
///
/// The solution directory wins when present. The starter directory is used
/// only when it is the chapter's sole subdirectory.
async fn select_example_dir(chapter: &Path, options: &WalkOptions) -> Result<Option<PathBuf>> {
    let subdirs = list_subdirs(chapter).await?;

    if let Some((_, path)) = subdirs.iter().find(|(name, _)| *name == options.solution_dir) {
        return Ok(Some(path.clone()));
    }

    match subdirs.as_slice() {
        [(name, path)] if *name == options.starter_dir => Ok(Some(path.clone())),
        _ => Ok(None),
    }
}

async fn collect_example_files(dir: &Path, extensions: &[String]) -> Result<Vec<ExampleFile>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| TutpageError::io(dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| TutpageError::io(dir, e))? {
        let filepath = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| TutpageError::io(&filepath, e))?;
        if !file_type.is_file() {
            continue;
        }

        let wanted = filepath
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e == ext));
        if !wanted {
            continue;
        }

        let Ok(filename) = entry.file_name().into_string() else {
            warn!(path = %filepath.display(), "skipping example file with non-UTF-8 name");
            continue;
        };

        let raw_contents = tokio::fs::read_to_string(&filepath)
            .await
            .map_err(|e| TutpageError::io(&filepath, e))?;

        files.push(ExampleFile {
            filename,
            filepath,
            raw_contents,
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Immediate subdirectories of `dir` as `(name, path)`, in listing order.
async fn list_subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| TutpageError::io(dir, e))?;

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| TutpageError::io(dir, e))? {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| TutpageError::io(&path, e))?;
        if !file_type.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => dirs.push((name, path)),
            Err(_) => warn!(path = %path.display(), "skipping directory with non-UTF-8 name"),
        }
    }

    Ok(dirs)
}

/// Await every task, failing on the first error or panic.
///
/// Returning early drops the set, which aborts the tasks still running.
async fn join_all<T: 'static>(mut tasks: JoinSet<Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let value = joined.map_err(|e| TutpageError::Task(e.to_string()))??;
        out.push(value);
    }
    Ok(out)
}
