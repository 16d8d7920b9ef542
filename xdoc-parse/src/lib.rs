//! `xdoc-parse`: parser and HTML renderer for the xdoc format.
//!
//! xdoc is plain text whose block structure comes from indentation rather
//! than closing tags. A line opening with `<name ...>` starts an element;
//! everything indented deeper belongs to it.
//!
//! # Quick start
//!
//! ```
//! let parsed = xdoc_parse::parse("<section>Intro\n    Hello.\n", "intro.xdoc").unwrap();
//! let html = parsed.doc.to_html();
//! assert!(html.contains("<h2>1. Intro</h2>"));
//! ```

pub mod bibliography;
pub mod collaborators;
pub mod error;
pub mod html;
pub mod lines;
pub mod loader;
pub mod node;
pub mod page;
pub mod paragraph;
pub mod parse;
pub mod preprocess;
pub mod render_html;
pub mod tagspec;
pub mod types;
mod verbatim;

pub use bibliography::{Citation, CitationLookup, NoCitations, parse_bibliography, render_bibliography};
pub use collaborators::{DiagramImage, DiagramRenderer, EscapeHighlighter, Highlighter, SourceDiagrams};
pub use error::*;
pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use page::{PageConfig, to_html_page};
pub use parse::{MAX_DEPTH, Parsed, Parser, parse};
pub use render_html::{Collaborators, RenderOptions, Rendered, render_html};
pub use tagspec::{TagSpec, parse_tag};
pub use types::*;

impl Document {
    /// Render with the default collaborators and the document's own
    /// numbering setting.
    pub fn render(&self) -> Rendered {
        render_html(self, &Collaborators::default(), &RenderOptions::for_document(self))
    }

    /// HTML fragment, diagnostics discarded.
    pub fn to_html(&self) -> String {
        self.render().html
    }

    /// Complete HTML page with the default collaborators.
    pub fn to_html_page(&self, config: &PageConfig) -> String {
        to_html_page(self, &self.render(), &NoCitations, config)
    }
}
