//! Message Formatter
//!
//! Turns raw message text into display markup. The only markup that can come
//! out of here is what the formatter itself introduces: links for `http://`
//! and `https://` URLs, `<br>` for newlines, and `<ul>`/`<li>` for runs of
//! `- ` / `* ` bullet lines. Everything else is escaped, so the result is
//! safe to insert into a document.
//!
//! Formatting happens in two passes: the text is parsed into [`Block`]s of
//! [`Inline`] nodes, then the nodes are written out as HTML.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Markup that is safe to insert into a document as-is
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    /// Borrow the markup
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inline run of text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    /// Plain text (escaped on output)
    Text(String),
    /// A detected URL, shown as its own link text
    Link(String),
}

/// A line of inline nodes
pub type Line = Vec<Inline>;

/// A block-level unit of formatted text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// A regular line
    Line(Line),
    /// A run of consecutive bullet lines
    List(Vec<Line>),
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://\S+").unwrap_or_else(|err| panic!("valid url regex: {err}"))
    })
}

/// Format raw text into safe display markup
#[must_use]
pub fn format(text: &str) -> Markup {
    render(&parse(text))
}

/// Parse raw text into blocks
#[must_use]
pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut list: Option<Vec<Line>> = None;

    for raw_line in text.split('\n') {
        let raw_line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        match bullet_item(raw_line) {
            Some(item) => list.get_or_insert_with(Vec::new).push(parse_inline(item)),
            None => {
                if let Some(items) = list.take() {
                    blocks.push(Block::List(items));
                }
                blocks.push(Block::Line(parse_inline(raw_line)));
            }
        }
    }

    if let Some(items) = list.take() {
        blocks.push(Block::List(items));
    }

    blocks
}

/// Render parsed blocks as markup
#[must_use]
pub fn render(blocks: &[Block]) -> Markup {
    let mut out = String::new();
    let mut previous_was_line = false;

    for block in blocks {
        match block {
            Block::Line(line) => {
                if previous_was_line {
                    out.push_str("<br>");
                }
                write_line(&mut out, line);
                previous_was_line = true;
            }
            Block::List(items) => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    write_line(&mut out, item);
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
                previous_was_line = false;
            }
        }
    }

    Markup(out)
}

/// Escape text for use in element content and quoted attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The item text of a bullet line, if the line is one
fn bullet_item(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
}

fn parse_inline(line: &str) -> Line {
    let mut nodes = Vec::new();
    let mut last = 0;

    for found in url_regex().find_iter(line) {
        if found.start() > last {
            nodes.push(Inline::Text(line[last..found.start()].to_string()));
        }
        nodes.push(Inline::Link(found.as_str().to_string()));
        last = found.end();
    }

    if last < line.len() {
        nodes.push(Inline::Text(line[last..].to_string()));
    }

    nodes
}

fn write_line(out: &mut String, line: &[Inline]) {
    for node in line {
        match node {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Link(url) => {
                let url = escape_html(url);
                out.push_str(&format!(
                    r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_passes_through() {
        let text = "Hello there, how can I help you today?";
        assert_eq!(format(text).as_str(), text);
        assert_eq!(format(format(text).as_str()), format(text));
    }

    #[test]
    fn test_escapable_text_is_not_idempotent() {
        // Escaping is applied on every pass, so only text free of `&<>"'`
        // formats to itself.
        let once = format("Tom & Jerry");
        assert_eq!(once.as_str(), "Tom &amp; Jerry");
        assert_eq!(format(once.as_str()).as_str(), "Tom &amp;amp; Jerry");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(format("").as_str(), "");
    }

    #[test]
    fn test_url_becomes_link() {
        assert_eq!(
            format("see http://example.com now").as_str(),
            r#"see <a href="http://example.com" target="_blank" rel="noopener noreferrer">http://example.com</a> now"#
        );
    }

    #[test]
    fn test_url_at_end_of_line_and_https() {
        let markup = format("docs: https://example.com/a?b=1&c=2");
        assert_eq!(
            markup.as_str(),
            r#"docs: <a href="https://example.com/a?b=1&amp;c=2" target="_blank" rel="noopener noreferrer">https://example.com/a?b=1&amp;c=2</a>"#
        );
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(format("one\ntwo\n\nthree").as_str(), "one<br>two<br><br>three");
        assert_eq!(format("one\r\ntwo").as_str(), "one<br>two");
    }

    #[test]
    fn test_bullet_run_becomes_single_list() {
        assert_eq!(
            format("a\n- x\n- y\nb").as_str(),
            "a<ul><li>x</li><li>y</li></ul>b"
        );
    }

    #[test]
    fn test_mixed_markers_share_a_list() {
        assert_eq!(
            format("Options:\n- remote\n* hybrid\n  - part-time").as_str(),
            "Options:<ul><li>remote</li><li>hybrid</li><li>part-time</li></ul>"
        );
    }

    #[test]
    fn test_list_at_start_and_lone_item_are_closed() {
        assert_eq!(format("- only").as_str(), "<ul><li>only</li></ul>");
        assert_eq!(
            format("- x\nafter\n- y").as_str(),
            "<ul><li>x</li></ul>after<ul><li>y</li></ul>"
        );
    }

    #[test]
    fn test_marker_without_item_text_is_not_a_list() {
        assert_eq!(format("a\n-\nb").as_str(), "a<br>-<br>b");
        assert_eq!(format("-dash").as_str(), "-dash");
    }

    #[test]
    fn test_links_inside_list_items() {
        assert_eq!(
            format("Links:\n- https://a.example").as_str(),
            r#"Links:<ul><li><a href="https://a.example" target="_blank" rel="noopener noreferrer">https://a.example</a></li></ul>"#
        );
    }

    #[test]
    fn test_markup_in_input_is_escaped() {
        assert_eq!(
            format("<script>alert('x')</script>").as_str(),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_url_cannot_break_out_of_attribute() {
        let markup = format(r#"http://evil.example/"onmouseover="x"#);
        assert!(!markup.as_str().contains(r#""onmouseover"#));
        assert!(markup.as_str().contains("&quot;onmouseover=&quot;x"));
    }

    #[test]
    fn test_non_http_schemes_are_not_linked() {
        assert_eq!(format("javascript:alert(1)").as_str(), "javascript:alert(1)");
    }

    #[test]
    fn test_parse_structure() {
        let blocks = parse("hi\n* a");
        assert_eq!(
            blocks,
            vec![
                Block::Line(vec![Inline::Text("hi".to_string())]),
                Block::List(vec![vec![Inline::Text("a".to_string())]]),
            ]
        );
    }

    #[test]
    fn test_format_never_panics_on_odd_input() {
        for text in ["\n", "\r", "- ", "* \n* ", "http://", "https://\n- https://", "ünïcødé - ✓\n- ✓"] {
            let _ = format(text);
        }
    }
}
