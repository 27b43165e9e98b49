//! Final page output: template substitution, atomic page write, and static
//! asset copy.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use tutpage_shared::{BuildInfo, ResolvedAsset, Result, TutpageError};

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// The closed set of `{{name}}` placeholders a page template may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Sha,
    BuildAtReadable,
    TutContent,
    BuildAtMs,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [
        Placeholder::Sha,
        Placeholder::BuildAtReadable,
        Placeholder::TutContent,
        Placeholder::BuildAtMs,
    ];

    /// Name as written between the braces.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha => "sha",
            Self::BuildAtReadable => "buildAtReadable",
            Self::TutContent => "tutContent",
            Self::BuildAtMs => "buildAtMs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}}}}}", self.name())
    }
}

/// Values substituted into the page template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    pub sha: String,
    pub build_at_readable: String,
    pub tut_content: String,
    pub build_at_ms: i64,
}

impl TemplateVars {
    /// Variables for a page built from `info` with rendered `tut_content`.
    pub fn new(info: &BuildInfo, tut_content: String) -> Result<Self> {
        Ok(Self {
            sha: info.sha.clone(),
            build_at_readable: readable_timestamp(info.build_at_ms)?,
            tut_content,
            build_at_ms: info.build_at_ms,
        })
    }

    fn value(&self, placeholder: Placeholder) -> String {
        match placeholder {
            Placeholder::Sha => self.sha.clone(),
            Placeholder::BuildAtReadable => self.build_at_readable.clone(),
            Placeholder::TutContent => self.tut_content.clone(),
            Placeholder::BuildAtMs => self.build_at_ms.to_string(),
        }
    }
}

/// Epoch milliseconds as RFC 3339 UTC with millisecond precision
/// (`2020-01-01T00:00:00.000Z`).
pub fn readable_timestamp(ms: i64) -> Result<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| TutpageError::render(format!("build time {ms} ms is out of range")))
}

/// Replace every `{{name}}` in `template` in one left-to-right pass.
///
/// Substituted text is never rescanned, so content containing `{{sha}}`
/// stays literal. An unknown name is an error.
#[instrument(skip_all, fields(template_len = template.len()))]
pub fn render_template(template: &str, vars: &TemplateVars) -> Result<String> {
    static PLACEHOLDER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\{\{([A-Za-z][A-Za-z0-9_]*)\}\}").expect("valid regex"));

    let mut out = String::with_capacity(template.len() + vars.tut_content.len());
    let mut used = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let placeholder = Placeholder::from_name(name.as_str()).ok_or_else(|| {
            TutpageError::render(format!("unknown template placeholder '{}'", whole.as_str()))
        })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(&vars.value(placeholder));
        last = whole.end();
        used.push(placeholder);
    }
    out.push_str(&template[last..]);

    for unused in Placeholder::ALL.into_iter().filter(|p| !used.contains(p)) {
        debug!(placeholder = %unused, "template does not use placeholder");
    }

    Ok(out)
}

/// Read the page template.
pub async fn load_template(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TutpageError::io(path, e))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Write the rendered page, replacing any previous one atomically.
#[instrument(skip(html), fields(bytes = html.len()))]
pub async fn write_page(path: &Path, html: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| TutpageError::io(dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.html".into());
    let temp = dir.join(format!(".{file_name}.{}.tmp", uuid::Uuid::now_v7()));

    tokio::fs::write(&temp, html)
        .await
        .map_err(|e| TutpageError::io(&temp, e))?;

    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(TutpageError::io(path, e));
    }

    info!(path = %path.display(), "page written");
    Ok(())
}

/// Copy every configured asset (file or directory) into place.
///
/// Returns the number of files copied. A missing source is an error.
pub async fn copy_assets(assets: &[ResolvedAsset]) -> Result<usize> {
    let assets = assets.to_vec();
    tokio::task::spawn_blocking(move || {
        let mut copied = 0;
        for asset in &assets {
            copied += copy_asset(&asset.from, &asset.to)?;
        }
        info!(assets = assets.len(), files = copied, "assets copied");
        Ok(copied)
    })
    .await
    .map_err(|e| TutpageError::Task(e.to_string()))?
}

fn copy_asset(from: &Path, to: &Path) -> Result<usize> {
    let meta = std::fs::metadata(from).map_err(|e| TutpageError::io(from, e))?;

    if meta.is_dir() {
        return copy_tree(from, to);
    }

    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| TutpageError::io(parent, e))?;
    }
    std::fs::copy(from, to).map_err(|e| TutpageError::io(to, e))?;
    debug!(from = %from.display(), to = %to.display(), "asset copied");
    Ok(1)
}

/// Recursively copy the directory `from` to `to`, merging into existing
/// directories. Returns the number of files copied.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| from.to_path_buf(), Path::to_path_buf);
            TutpageError::io(path, e.into())
        })?;

        let Ok(rel) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest: PathBuf = to.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| TutpageError::io(&dest, e))?;
        } else {
            std::fs::copy(entry.path(), &dest).map_err(|e| TutpageError::io(&dest, e))?;
            copied += 1;
        }
    }

    debug!(from = %from.display(), to = %to.display(), files = copied, "directory copied");
    Ok(copied)
}
