//! Markdown to HTML rendering and heading self-links.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use regex::{Captures, Regex};

/// Render markdown to an HTML fragment.
///
/// Tables, strikethrough, footnotes and task lists are enabled. Every
/// heading gets an `id` derived from its text; repeated ids in one document
/// are suffixed `-1`, `-2`, ...
pub fn render_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;

    let events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();
    let events = assign_heading_ids(events);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn assign_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < events.len() {
        if matches!(&events[i], Event::Start(Tag::Heading { id: None, .. })) {
            let mut text = String::new();
            let mut j = i + 1;
            while j < events.len() {
                match &events[j] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
                j += 1;
            }

            let id = unique_id(slugify(&text), &mut seen);
            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                *slot = Some(CowStr::from(id));
            }
            i = j;
        }
        i += 1;
    }

    events
}

fn unique_id(slug: String, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(slug.clone()).or_insert(0);
    let id = if *count == 0 {
        slug
    } else {
        format!("{slug}-{count}")
    };
    *count += 1;
    id
}

/// Heading text to an id: lowercase ASCII alphanumeric words joined by `-`.
///
/// Whitespace, `-` and `_` separate words; other characters are dropped.
pub fn slugify(text: &str) -> String {
    let slug = text
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "heading".to_string()
    } else {
        slug
    }
}

/// Wrap every `<hN id="...">` element in `<a class="heading-link" href="#id">`.
///
/// Headings without an `id` attribute are left unchanged.
pub fn link_headings(html: &str) -> String {
    static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<h([1-6])(\s[^>]*)?>.*?</h([1-6])>").expect("valid regex")
    });
    static ID_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"\bid="([^"]*)""#).expect("valid regex"));

    HEADING_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let id = caps
                .get(2)
                .and_then(|attrs| ID_RE.captures(attrs.as_str()))
                .map(|c| c[1].to_string());
            match id {
                Some(id) => format!(r##"<a class="heading-link" href="#{id}">{whole}</a>"##),
                None => whole.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn select_count(html: &str, selector: &str) -> usize {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(selector).unwrap();
        doc.select(&sel).count()
    }

    #[test]
    fn headings_get_slug_ids() {
        let html = render_html("## Chapter #1 - Welcome\n\nHello\n");
        assert!(html.contains(r#"<h2 id="chapter-1-welcome">"#), "{html}");
    }

    #[test]
    fn duplicate_headings_get_suffixes() {
        let html = render_html("## Setup\n\n## Setup\n\n### Setup\n");
        assert_eq!(select_count(&html, "#setup"), 1);
        assert_eq!(select_count(&html, "#setup-1"), 1);
        assert_eq!(select_count(&html, "#setup-2"), 1);
    }

    #[test]
    fn code_in_heading_contributes_to_id() {
        let html = render_html("## The `each` block\n");
        assert!(html.contains(r#"id="the-each-block""#), "{html}");
    }

    #[test]
    fn renders_tables_and_strikethrough() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n");
        assert_eq!(select_count(&html, "table td"), 2);
        assert_eq!(select_count(&html, "del"), 1);
    }

    #[test]
    fn inline_html_passes_through() {
        let html = render_html("<a class=\"chapter-link\" href=\"https://x.test/\">View source</a>\n");
        assert_eq!(select_count(&html, "a.chapter-link"), 1);
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Chapter #10 - Each blocks!"), "chapter-10-each-blocks");
        assert_eq!(slugify("  Trailing   "), "trailing");
        assert_eq!(slugify("???"), "heading");
        assert_eq!(
            slugify("Chapter #1 - 02-basics / 01-vars"),
            "chapter-1-02-basics-01-vars"
        );
        assert_eq!(slugify("Café_au lait"), "caf-au-lait");
    }

    #[test]
    fn link_headings_wraps_each_heading() {
        let html = render_html("# One\n\ntext\n\n## Two\n");
        let linked = link_headings(&html);

        let doc = Html::parse_fragment(&linked);
        let sel = Selector::parse("a.heading-link").unwrap();
        let hrefs: Vec<_> = doc
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs, ["#one", "#two"]);
        assert_eq!(select_count(&linked, "a.heading-link > h2#two"), 1);
    }

    #[test]
    fn link_headings_skips_headings_without_id() {
        let html = "<h1>Plain</h1><h2 class=\"x\">Also plain</h2>";
        assert_eq!(link_headings(html), html);
    }

    #[test]
    fn link_headings_without_headings_is_identity() {
        let html = "<p>Nothing to see</p>";
        assert_eq!(link_headings(html), html);
    }
}
