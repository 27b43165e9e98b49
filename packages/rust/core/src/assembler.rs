//! Assembles walked sections into one markdown document.
//!
//! Each section opens with a boundary marker the page stylesheet targets:
//!
//! ```text
//! <div class="section-title" id="section-Introduction">Introduction</div>
//!
//! <chapter 1 markdown>
//!
//! <chapter 2 markdown>
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, instrument};

use tutpage_shared::Section;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Concatenate sections, in ascending `(index, dir_name)` order, into a
/// single markdown document.
///
/// Input order does not matter. Chapters are emitted in the order they are
/// stored on each section.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn assemble(sections: &[Section]) -> String {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by(|a, b| (a.index, &a.dir_name).cmp(&(b.index, &b.dir_name)));

    let document = ordered
        .into_iter()
        .map(render_section)
        .collect::<Vec<_>>()
        .join("\n\n");

    debug!(len = document.len(), "document assembled");
    document
}

/// The `id` of a section's boundary marker.
pub fn section_anchor_id(title: &str) -> String {
    format!("section-{}", utf8_percent_encode(title, URI_COMPONENT))
}

fn render_section(section: &Section) -> String {
    let marker = format!(
        r#"<div class="section-title" id="{}">{}</div>"#,
        section_anchor_id(&section.title),
        escape_html(&section.title)
    );

    let chapters = section
        .chapters
        .iter()
        .map(|c| c.processed_markdown.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{marker}\n\n{chapters}")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutpage_shared::Chapter;

    fn chapter(index: u32, markdown: &str) -> Chapter {
        Chapter {
            index,
            dir_name: format!("{index:02}-c"),
            title: format!("c{index}"),
            processed_markdown: markdown.to_string(),
            example_files: vec![],
        }
    }

    fn section(index: u32, title: &str, chapters: Vec<Chapter>) -> Section {
        Section {
            index,
            dir_name: format!("{index:02}-{}", title.to_lowercase()),
            title: title.to_string(),
            chapters,
        }
    }

    #[test]
    fn marker_then_chapters() {
        let doc = assemble(&[section(
            1,
            "Intro",
            vec![chapter(1, "## One"), chapter(2, "## Two")],
        )]);
        assert_eq!(
            doc,
            "<div class=\"section-title\" id=\"section-Intro\">Intro</div>\n\n## One\n\n## Two"
        );
    }

    #[test]
    fn sections_are_ordered_by_index() {
        let a = section(1, "A", vec![chapter(1, "a")]);
        let b = section(2, "B", vec![chapter(1, "b")]);
        let c = section(10, "C", vec![chapter(1, "c")]);

        let forward = assemble(&[a.clone(), b.clone(), c.clone()]);
        let shuffled = assemble(&[c, a, b]);
        assert_eq!(forward, shuffled);

        let pos = |needle: &str| forward.find(needle).unwrap();
        assert!(pos("section-A") < pos("section-B"));
        assert!(pos("section-B") < pos("section-C"));
    }

    #[test]
    fn sections_are_separated_by_blank_line() {
        let doc = assemble(&[
            section(1, "A", vec![chapter(1, "a")]),
            section(2, "B", vec![chapter(1, "b")]),
        ]);
        assert!(doc.contains("a\n\n<div class=\"section-title\" id=\"section-B\">"));
    }

    #[test]
    fn anchor_id_matches_uri_component_encoding() {
        assert_eq!(section_anchor_id("Intro"), "section-Intro");
        assert_eq!(section_anchor_id("Props & events"), "section-Props%20%26%20events");
        assert_eq!(section_anchor_id("it's (fine)!"), "section-it's%20(fine)!");
        assert_eq!(section_anchor_id("Ünïcode"), "section-%C3%9Cn%C3%AFcode");
    }

    #[test]
    fn title_text_is_html_escaped() {
        let doc = assemble(&[section(1, "<Slots> & \"more\"", vec![])]);
        assert!(doc.contains(">&lt;Slots&gt; &amp; &quot;more&quot;</div>"));
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert_eq!(assemble(&[]), "");
    }
}
