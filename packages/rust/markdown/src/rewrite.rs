//! Line-level rewrite passes applied to a chapter's raw markdown.
//!
//! Each pass is a plain function over `&str`, applied once per chapter by
//! [`crate::process_chapter`].

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Pass 1: Front matter
// ---------------------------------------------------------------------------

/// Split a leading `---` delimited front-matter block off `md`.
///
/// Returns the block's inner text (if any) and the remaining body. Blank
/// lines before the opening delimiter and after the closing one are
/// consumed. Only the first block is considered.
pub fn split_front_matter(md: &str) -> (Option<&str>, &str) {
    static FRONT_MATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?ims)\A[\r\n]*---[ \t]*\r?\n(.*?)^---[ \t]*(?:\r?\n|\z)[\r\n]*")
            .expect("valid regex")
    });

    match FRONT_MATTER_RE.captures(md) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let inner = caps.get(1).map(|m| m.as_str());
            (inner, &md[whole.end..])
        }
        None => (None, md),
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Title
// ---------------------------------------------------------------------------

/// Extract the trimmed value of the first `title:` line in a front-matter block.
///
/// The key is matched case-insensitively. Blank values yield `None`.
pub fn front_matter_title(front_matter: &str) -> Option<String> {
    static TITLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?im)^title:([^\r\n]*)").expect("valid regex"));

    TITLE_RE
        .captures(front_matter)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Pass 3: Heading downgrade
// ---------------------------------------------------------------------------

/// Push every heading down one level (`#` becomes `##`).
///
/// On each line the first `#` gets one more `#` in front of it, whatever
/// precedes it on the line. This covers indented ATX headings, and also
/// touches a `#` in running text. Not idempotent: running it twice
/// downgrades twice.
pub fn downgrade_headings(md: &str) -> String {
    static HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^([^#\r\n]*)#").expect("valid regex"));

    HEADING_RE.replace_all(md, "${1}##").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Chapter heading
// ---------------------------------------------------------------------------

/// The synthesized level-2 heading for a chapter.
pub fn chapter_heading(index: u32, title: &str) -> String {
    format!("## Chapter #{index} - {title}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_leading_front_matter() {
        let md = "---\ntitle: Welcome\n---\n\nHello there.\n";
        let (front, body) = split_front_matter(md);
        assert_eq!(front, Some("title: Welcome\n"));
        assert_eq!(body, "Hello there.\n");
    }

    #[test]
    fn splits_crlf_front_matter() {
        let md = "---\r\ntitle: Welcome\r\n---\r\n\r\nBody\r\n";
        let (front, body) = split_front_matter(md);
        assert_eq!(front_matter_title(front.unwrap()).as_deref(), Some("Welcome"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn only_first_block_is_stripped() {
        let md = "---\ntitle: A\n---\nText\n---\nnot: front matter\n---\nMore\n";
        let (front, body) = split_front_matter(md);
        assert_eq!(front, Some("title: A\n"));
        assert_eq!(body, "Text\n---\nnot: front matter\n---\nMore\n");
    }

    #[test]
    fn horizontal_rules_mid_document_are_kept() {
        let md = "Intro\n\n---\n\nMiddle\n\n---\n\nEnd\n";
        let (front, body) = split_front_matter(md);
        assert!(front.is_none());
        assert_eq!(body, md);
    }

    #[test]
    fn unterminated_front_matter_is_left_alone() {
        let md = "---\ntitle: Dangling\n\nBody\n";
        let (front, body) = split_front_matter(md);
        assert!(front.is_none());
        assert_eq!(body, md);
    }

    #[test]
    fn front_matter_at_end_of_input() {
        let (front, body) = split_front_matter("---\ntitle: Only\n---");
        assert_eq!(front, Some("title: Only\n"));
        assert_eq!(body, "");
    }

    #[test]
    fn title_is_trimmed_and_case_insensitive() {
        assert_eq!(
            front_matter_title("Title:   Props  \nother: x\n").as_deref(),
            Some("Props")
        );
        assert_eq!(front_matter_title("name: x\n"), None);
        assert_eq!(front_matter_title("title:   \n"), None);
    }

    #[test]
    fn downgrade_adds_one_level() {
        let md = "# Top\ntext\n## Second\n###### Sixth\n";
        assert_eq!(
            downgrade_headings(md),
            "## Top\ntext\n### Second\n####### Sixth\n"
        );
    }

    #[test]
    fn downgrade_without_hashes_is_identity() {
        let md = "Plain text.\n\n- a list\n\n```js\nlet x = 1;\n```\n";
        assert_eq!(downgrade_headings(md), md);
    }

    #[test]
    fn downgrade_reaches_indented_headings() {
        assert_eq!(downgrade_headings("   # Indented h1\n"), "   ## Indented h1\n");
        assert_eq!(downgrade_headings("\t## Tabbed\n"), "\t### Tabbed\n");

        let html = crate::render_html(&downgrade_headings("  # Still top level\n"));
        assert!(!html.contains("<h1"), "{html}");
        assert!(html.contains("<h2"), "{html}");
    }

    #[test]
    fn downgrade_touches_first_hash_of_each_line_only() {
        assert_eq!(
            downgrade_headings("See issue #42 and #43.\nNo hash\n"),
            "See issue ##42 and #43.\nNo hash\n"
        );
        assert_eq!(downgrade_headings("# A\r\n## B\r\n"), "## A\r\n### B\r\n");
    }

    #[test]
    fn downgrade_applied_twice_downgrades_twice() {
        let once = downgrade_headings("# A\n");
        assert_eq!(downgrade_headings(&once), "### A\n");
    }

    #[test]
    fn chapter_heading_format() {
        assert_eq!(chapter_heading(3, "Props"), "## Chapter #3 - Props");
    }
}
