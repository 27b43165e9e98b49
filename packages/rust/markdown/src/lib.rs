//! Chapter markdown transformation and HTML rendering.
//!
//! [`process_chapter`] turns a chapter's raw `text.md` into the markdown that
//! goes into the assembled page: front matter is stripped (its `title:` wins
//! over the directory-derived default), every heading is pushed down one
//! level, and the chapter is prefixed with its source link, canonical link
//! and a `## Chapter #N - Title` heading.
//!
//! [`render`] converts the assembled document to HTML and adds heading
//! self-links.

mod links;
pub mod render;
mod rewrite;

use tracing::debug;

pub use links::{ChapterLinks, LinkBase, chapter_slug};
pub use render::{link_headings, render_html, slugify};
pub use rewrite::{chapter_heading, downgrade_headings, front_matter_title, split_front_matter};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What the transformer needs to know about a chapter besides its text.
#[derive(Debug, Clone)]
pub struct ChapterContext {
    /// Ordinal parsed from the chapter directory name.
    pub index: u32,
    /// Title used when the front matter does not provide one.
    pub default_title: String,
    /// Source and canonical links for this chapter.
    pub links: ChapterLinks,
}

/// Result of transforming one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedChapter {
    /// Effective title: front matter `title:` if present, else the default.
    pub title: String,
    /// Markdown ready for assembly.
    pub markdown: String,
}

// ---------------------------------------------------------------------------
// Transformer
// ---------------------------------------------------------------------------

/// Transform a chapter's raw markdown.
///
/// Output layout:
///
/// ```text
/// <source link>
/// <canonical link>
///
/// ## Chapter #<index> - <title>
///
/// <body with front matter removed and headings downgraded>
/// ```
pub fn process_chapter(raw: &str, ctx: &ChapterContext) -> ProcessedChapter {
    let (front_matter, body) = split_front_matter(raw);

    let title = front_matter
        .and_then(front_matter_title)
        .unwrap_or_else(|| ctx.default_title.clone());

    let body = downgrade_headings(body);

    let markdown = format!(
        "{}\n{}\n\n{}\n\n{}",
        ctx.links.source_anchor(),
        ctx.links.canonical_anchor(),
        chapter_heading(ctx.index, &title),
        body
    );

    debug!(
        index = ctx.index,
        title = %title,
        had_front_matter = front_matter.is_some(),
        len = markdown.len(),
        "chapter processed"
    );

    ProcessedChapter { title, markdown }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn context(index: u32, chapter_dir: &str, default_title: &str) -> ChapterContext {
        let base = LinkBase::new(
            "https://github.com",
            "sveltejs/svelte",
            "master",
            "site/content/tutorial",
            "https://svelte.dev/tutorial/",
        )
        .unwrap();
        ChapterContext {
            index,
            default_title: default_title.to_string(),
            links: ChapterLinks::new(&base, "01-introduction", chapter_dir),
        }
    }

    #[test]
    fn front_matter_title_wins() {
        let raw = "---\ntitle: Adding data\n---\n\n# Intro\n\nLet's add data.\n";
        let out = process_chapter(raw, &context(2, "02-adding-data", "adding-data"));

        assert_eq!(out.title, "Adding data");
        assert!(out.markdown.contains("## Chapter #2 - Adding data\n\n## Intro\n\nLet's add data.\n"));
        assert!(!out.markdown.contains("title: Adding data"));
    }

    #[test]
    fn default_title_without_front_matter() {
        let out = process_chapter("Just text.\n", &context(1, "01-basics", "basics"));
        assert_eq!(out.title, "basics");
        assert!(out.markdown.ends_with("## Chapter #1 - basics\n\nJust text.\n"));
    }

    #[test]
    fn default_title_when_front_matter_lacks_title() {
        let raw = "---\nauthor: someone\n---\nBody\n";
        let out = process_chapter(raw, &context(4, "04-styling", "styling"));
        assert_eq!(out.title, "styling");
        assert!(!out.markdown.contains("author: someone"));
    }

    #[test]
    fn links_precede_heading_in_order() {
        let out = process_chapter("Body\n", &context(1, "01-basics", "basics"));
        let source = out.markdown.find("View source").unwrap();
        let canonical = out.markdown.find("Official tutorial").unwrap();
        let heading = out.markdown.find("## Chapter #1").unwrap();
        assert!(source < canonical && canonical < heading);
        assert!(out.markdown.starts_with("<a "));
    }

    #[test]
    fn empty_body_still_has_heading() {
        let out = process_chapter("---\ntitle: Empty\n---\n", &context(7, "07-empty", "empty"));
        assert!(out.markdown.ends_with("## Chapter #7 - Empty\n\n"));
    }

    #[test]
    fn rendered_chapter_has_links_and_heading() {
        let out = process_chapter(
            "---\ntitle: Welcome\n---\n\n# Hello\n",
            &context(1, "01-welcome", "welcome"),
        );
        let html = link_headings(&render_html(&out.markdown));
        let doc = Html::parse_fragment(&html);

        let canonical = Selector::parse("a.chapter-link-canonical").unwrap();
        let href = doc
            .select(&canonical)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap();
        assert_eq!(href, "https://svelte.dev/tutorial/welcome");

        let h2 = Selector::parse("a.heading-link > h2#chapter-1-welcome").unwrap();
        assert_eq!(doc.select(&h2).count(), 1);

        // The body's level-1 heading now sits at the chapter heading's level.
        let hello = Selector::parse("h2#hello").unwrap();
        assert_eq!(doc.select(&hello).count(), 1);
        assert_eq!(doc.select(&Selector::parse("h1").unwrap()).count(), 0);
    }
}
