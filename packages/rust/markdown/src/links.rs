//! Per-chapter links: "view source" on the hosting site and the canonical
//! tutorial page.

use url::Url;

use tutpage_shared::{BuildConfig, Result, TutpageError};

/// Visible label for the link to the chapter's source directory.
const SOURCE_LABEL: &str = "View source";

/// Visible label for the link to the canonical tutorial page.
const CANONICAL_LABEL: &str = "Official tutorial";

/// Validated base URLs shared by every chapter of a build.
#[derive(Debug, Clone)]
pub struct LinkBase {
    /// `{web_base}/{repo}/tree/{branch}/{content path}`
    source_root: Url,
    canonical_base: Url,
}

impl LinkBase {
    /// Build the link bases.
    ///
    /// `content_path` is the tutorial root relative to the repository root.
    /// Fails with a config error when either base is not an absolute
    /// hierarchical URL.
    pub fn new(
        web_base: &str,
        repo: &str,
        branch: &str,
        content_path: &str,
        canonical_base: &str,
    ) -> Result<Self> {
        let mut source_root = parse_base("web_base", web_base)?;
        source_root
            .path_segments_mut()
            .map_err(|()| cannot_be_base("web_base", web_base))?
            .pop_if_empty()
            .extend(split_path(repo))
            .push("tree")
            .push(branch)
            .extend(split_path(content_path));

        let canonical_base = parse_base("canonical_base", canonical_base)?;
        if canonical_base.cannot_be_a_base() {
            return Err(cannot_be_base("canonical_base", canonical_base.as_str()));
        }

        Ok(Self {
            source_root,
            canonical_base,
        })
    }

    /// Link bases for the tutorial described by `config`.
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Self::new(
            &config.web_base,
            &config.repo,
            &config.branch,
            &config.remote_content_path(),
            &config.canonical_base,
        )
    }
}

/// The two links rendered at the top of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLinks {
    pub source_url: String,
    pub canonical_url: String,
}

impl ChapterLinks {
    /// Links for the chapter directory `chapter_dir` inside `section_dir`.
    pub fn new(base: &LinkBase, section_dir: &str, chapter_dir: &str) -> Self {
        let mut source = base.source_root.clone();
        if let Ok(mut segments) = source.path_segments_mut() {
            segments.push(section_dir).push(chapter_dir);
        }

        let mut canonical = base.canonical_base.clone();
        if let Ok(mut segments) = canonical.path_segments_mut() {
            segments.pop_if_empty().push(chapter_slug(chapter_dir));
        }

        Self {
            source_url: source.into(),
            canonical_url: canonical.into(),
        }
    }

    /// Inline HTML anchor pointing at the chapter's source directory.
    pub fn source_anchor(&self) -> String {
        format!(
            r#"<a class="chapter-link chapter-link-source" href="{}">{SOURCE_LABEL}</a>"#,
            self.source_url
        )
    }

    /// Inline HTML anchor pointing at the canonical tutorial page.
    pub fn canonical_anchor(&self) -> String {
        format!(
            r#"<a class="chapter-link chapter-link-canonical" href="{}">{CANONICAL_LABEL}</a>"#,
            self.canonical_url
        )
    }
}

/// The chapter directory name with its `NN-` ordering prefix removed.
///
/// Names without a `-` are returned unchanged.
pub fn chapter_slug(dir_name: &str) -> &str {
    dir_name
        .split_once('-')
        .map_or(dir_name, |(_, rest)| rest)
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_base(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| TutpageError::config(format!("invalid {field} '{value}': {e}")))
}

fn cannot_be_base(field: &str, value: &str) -> TutpageError {
    TutpageError::config(format!("{field} '{value}' cannot be a base URL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svelte_base() -> LinkBase {
        LinkBase::new(
            "https://github.com",
            "sveltejs/svelte",
            "master",
            "site/content/tutorial",
            "https://svelte.dev/tutorial/",
        )
        .unwrap()
    }

    #[test]
    fn builds_source_and_canonical_urls() {
        let links = ChapterLinks::new(&svelte_base(), "01-introduction", "02-adding-data");
        assert_eq!(
            links.source_url,
            "https://github.com/sveltejs/svelte/tree/master/site/content/tutorial/01-introduction/02-adding-data"
        );
        assert_eq!(links.canonical_url, "https://svelte.dev/tutorial/adding-data");
    }

    #[test]
    fn canonical_base_without_trailing_slash() {
        let base = LinkBase::new(
            "https://github.com/",
            "sveltejs/svelte",
            "main",
            "/site/content/tutorial/",
            "https://svelte.dev/tutorial",
        )
        .unwrap();
        let links = ChapterLinks::new(&base, "02-reactivity", "01-reactive-assignments");
        assert_eq!(
            links.source_url,
            "https://github.com/sveltejs/svelte/tree/main/site/content/tutorial/02-reactivity/01-reactive-assignments"
        );
        assert_eq!(
            links.canonical_url,
            "https://svelte.dev/tutorial/reactive-assignments"
        );
    }

    #[test]
    fn rejects_relative_or_opaque_bases() {
        let err = LinkBase::new("github.com", "a/b", "main", "x", "https://svelte.dev/").unwrap_err();
        assert!(matches!(err, TutpageError::Config { .. }));

        let err =
            LinkBase::new("https://github.com", "a/b", "main", "x", "mailto:a@b.c").unwrap_err();
        assert!(matches!(err, TutpageError::Config { .. }));
    }

    #[test]
    fn slug_strips_only_first_prefix() {
        assert_eq!(chapter_slug("01-welcome"), "welcome");
        assert_eq!(chapter_slug("03-each-blocks"), "each-blocks");
        assert_eq!(chapter_slug("intro"), "intro");
    }

    #[test]
    fn anchors_embed_urls() {
        let links = ChapterLinks::new(&svelte_base(), "01-introduction", "01-basics");
        assert!(links.source_anchor().contains(&format!("href=\"{}\"", links.source_url)));
        assert!(links.canonical_anchor().ends_with(">Official tutorial</a>"));
    }
}
