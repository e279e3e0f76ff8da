//! Markdown rendering of documents for the static-site generator.

use crate::models::Document;

const DELIMITER: &str = "---";
const TAGS: &str = "[database, demo]";

/// Renders a document as a markdown file: a frontmatter block, a blank line
/// and the raw content.
///
/// Only `title`, `slug`, `sidebar_position` and `content` feed the output.
///
/// The blank line after the closing `---` is part of the format. A file that
/// starts its content right after the delimiter compares unequal, so the
/// first reconcile over a directory written that way rewrites every file.
pub fn render(doc: &Document) -> String {
    let mut out = String::with_capacity(doc.content.len() + 128);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&format!("title: {}\n", quote(&doc.title)));
    out.push_str(&format!("sidebar_position: {}\n", doc.sidebar_position));
    out.push_str(&format!("slug: {}\n", doc.slug));
    out.push_str(&format!("tags: {}\n", TAGS));
    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(&doc.content);
    out
}

/// YAML double-quoted scalar.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
