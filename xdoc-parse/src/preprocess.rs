//! Text substitutions applied while paragraphs are assembled.
//!
//! Line level: comment and end-tag lines are dropped, list markers and `#`
//! headings are rewritten into tag markup. Paragraph level: backtick code
//! spans, `**bold**` and `__italic__`.

use std::sync::LazyLock;

use regex::Regex;

use crate::html::{escape_html, is_inline};
use crate::tagspec::{quote_word, split_head, tag_name};

/// Class carried by the `div` a `-+` continuation line becomes.
pub const CONTINUATION_CLASS: &str = "item-continuation";

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.+?)__").unwrap());

/// How the first line of a paragraph was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Plain,
    /// `- text` or `-(label) text`.
    ListItem,
    /// `-+ text`: more content for the preceding list item.
    Continuation,
    /// `# text` … `###### text`.
    Heading,
}

/// Comment (`//`) and end-tag (`</…`) lines are dropped entirely.
pub fn is_discarded(text: &str) -> bool {
    text.starts_with("//") || text.starts_with("</")
}

/// Level of a `#` heading line: a run of 1–6 `#` followed by a space or
/// nothing.
pub fn heading_level(text: &str) -> Option<usize> {
    let run = text.chars().take_while(|&c| c == '#').count();
    if run == 0 || run > 6 {
        return None;
    }
    let after = &text[run..];
    (after.is_empty() || after.starts_with(' ')).then_some(run)
}

/// A line opening a structural element (a tag that is not inline).
pub fn is_block_start(text: &str) -> bool {
    tag_name(text).is_some_and(|name| !is_inline(name))
}

/// Lines that never continue the paragraph above them.
pub fn starts_paragraph(text: &str) -> bool {
    text.starts_with('-') || heading_level(text).is_some() || is_block_start(text)
}

/// Rewrite the first line of a paragraph.
pub fn rewrite_first_line(text: &str) -> (String, ParagraphKind) {
    if let Some(rest) = text.strip_prefix("-+") {
        return (
            format!("<div .{CONTINUATION_CLASS}>{}", rest.trim()),
            ParagraphKind::Continuation,
        );
    }

    if let Some(item) = labelled_item(text) {
        return (item, ParagraphKind::ListItem);
    }

    if text == "-" || text.starts_with("- ") {
        return (format!("<li>{}", text[1..].trim()), ParagraphKind::ListItem);
    }

    if let Some(level) = heading_level(text) {
        return (
            format!("<h{level}>{}", text[level..].trim()),
            ParagraphKind::Heading,
        );
    }

    (text.to_string(), ParagraphKind::Plain)
}

/// `-(my label) rest` → `<li =my_label><b>my label</b> rest`
fn labelled_item(text: &str) -> Option<String> {
    let after = text.strip_prefix("-(")?;
    let close = after.find(')')?;
    let label = after[..close].trim();
    if label.is_empty() {
        return None;
    }
    let rest = after[close + 1..].trim();
    let key = quote_word(&label.replace(' ', "_"));
    let item = format!("<li ={key}><b>{label}</b> {rest}");
    Some(item.trim_end().to_string())
}

/// Paragraph-level inline substitutions. The tag head, if any, is left
/// untouched so ids and attribute values keep their underscores.
pub fn inline(text: &str) -> String {
    let (head, tail) = if is_block_start(text) {
        split_head(text)
    } else {
        ("", text)
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(head);
    out.push_str(&code_spans(tail));
    out
}

fn code_spans(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('`') else {
            break;
        };
        out.push_str(&emphasis(&rest[..open]));
        out.push_str("<code>");
        out.push_str(&escape_html(&after[..close]));
        out.push_str("</code>");
        rest = &after[close + 1..];
    }
    out.push_str(&emphasis(rest));
    out
}

fn emphasis(text: &str) -> String {
    let bold = BOLD.replace_all(text, "<b>$1</b>");
    ITALIC.replace_all(&bold, "<i>$1</i>").into_owned()
}
