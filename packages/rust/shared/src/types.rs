//! Core domain types for an assembled tutorial.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Section / Chapter
// ---------------------------------------------------------------------------

/// Top-level grouping of chapters (e.g. `01-introduction`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Numeric prefix of the directory name (`03-props` is section 3).
    pub index: u32,
    /// Directory name the section was read from.
    pub dir_name: String,
    /// Title from the section's metadata sidecar.
    pub title: String,
    /// Chapters, sorted ascending by index.
    pub chapters: Vec<Chapter>,
}

/// A single content unit within a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Numeric prefix of the directory name.
    pub index: u32,
    /// Directory name the chapter was read from.
    pub dir_name: String,
    /// Front-matter title, or `"{section_dir} / {chapter_dir}"`.
    pub title: String,
    /// Chapter markdown with front matter stripped, headings downgraded,
    /// and links plus the chapter heading prepended.
    pub processed_markdown: String,
    /// Files from the chapter's solution directory.
    pub example_files: Vec<ExampleFile>,
}

/// A source file from a chapter's example application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleFile {
    pub filename: String,
    pub filepath: PathBuf,
    pub raw_contents: String,
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Record of the last successful build, persisted as `build-info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Revision identifier (commit SHA) the build was made from.
    pub sha: String,
    /// Build completion time in milliseconds since the Unix epoch.
    #[serde(rename = "buildAtMs")]
    pub build_at_ms: i64,
}
