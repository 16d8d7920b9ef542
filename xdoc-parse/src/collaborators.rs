//! Hooks the renderer calls out to for code and diagram blocks.

use crate::html::escape_html;

/// Turns code into HTML for the inside of a `<pre><code>` element.
pub trait Highlighter {
    fn highlight(&self, lang: Option<&str>, code: &str) -> String;
}

/// Plain escaping, no colouring.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeHighlighter;

impl Highlighter for EscapeHighlighter {
    fn highlight(&self, _lang: Option<&str>, code: &str) -> String {
        escape_html(code)
    }
}

/// A rendered diagram image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramImage {
    /// URL or path the `<img>` points at.
    pub src: String,
    pub alt: String,
}

/// Produces an image for diagram source of a given kind (`dot`, `plantuml`,
/// ...). The error string ends up in a warning next to the raw source.
pub trait DiagramRenderer {
    fn render_diagram(&self, kind: &str, source: &str) -> Result<DiagramImage, String>;
}

/// Renders nothing, so every diagram is shown as its source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceDiagrams;

impl DiagramRenderer for SourceDiagrams {
    fn render_diagram(&self, kind: &str, _source: &str) -> Result<DiagramImage, String> {
        Err(format!("no renderer configured for '{kind}' diagrams"))
    }
}
