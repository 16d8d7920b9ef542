//! One document from source file to rendered fragment.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use xdoc_parse::{
    Citation, Collaborators, Diagnostic, DiagramRenderer, Document, PageConfig, RenderOptions,
    Rendered, parse_bibliography, render_html, to_html_page,
};

use crate::config::XdocConfig;

pub struct Compiled {
    pub doc: Document,
    pub rendered: Rendered,
    pub bibliography: BTreeMap<String, Citation>,
    /// Parse diagnostics followed by render diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl Compiled {
    /// Standalone page, with the reference list for everything cited.
    pub fn page(&self, source_path: &str, title: Option<&str>) -> String {
        let config = PageConfig {
            source_path: source_path.to_string(),
            title: title.map(|t| t.to_string()),
            ..Default::default()
        };
        to_html_page(&self.doc, &self.rendered, &self.bibliography, &config)
    }
}

/// Parse and render `path`. A structural error comes back as the
/// `xdoc_parse::ParseError` itself so callers can downcast it.
pub fn compile(path: &Path, config: &XdocConfig, diagrams: &dyn DiagramRenderer) -> Result<Compiled> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    let parsed = xdoc_parse::parse(&content, &path.display().to_string())?;
    let doc = parsed.doc;

    let bibliography = load_bibliography(path, &doc, config)?;
    let options = RenderOptions {
        numbered_headings: doc
            .front_matter
            .as_ref()
            .and_then(|fm| fm.numbering)
            .or(config.numbering)
            .unwrap_or(true),
    };
    let collab = Collaborators {
        diagrams,
        citations: &bibliography,
        ..Collaborators::default()
    };
    let rendered = render_html(&doc, &collab, &options);

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(rendered.diagnostics.iter().cloned());

    Ok(Compiled {
        doc,
        rendered,
        bibliography,
        diagnostics,
    })
}

/// The bibliography named by front matter (relative to the document) or,
/// failing that, by the project config.
fn bibliography_path(path: &Path, doc: &Document, config: &XdocConfig) -> Option<PathBuf> {
    let from_front_matter = doc
        .front_matter
        .as_ref()
        .and_then(|fm| fm.bibliography.as_ref())
        .map(|bib| path.parent().unwrap_or(Path::new("")).join(bib));
    from_front_matter.or_else(|| config.bibliography_path())
}

fn load_bibliography(
    path: &Path,
    doc: &Document,
    config: &XdocConfig,
) -> Result<BTreeMap<String, Citation>> {
    let Some(bib_path) = bibliography_path(path, doc, config) else {
        return Ok(BTreeMap::new());
    };
    let raw = std::fs::read_to_string(&bib_path)
        .with_context(|| format!("Failed to read bibliography '{}'", bib_path.display()))?;
    let entries = parse_bibliography(&raw)
        .with_context(|| format!("Failed to parse bibliography '{}'", bib_path.display()))?;
    log::debug!("loaded {} citations from {}", entries.len(), bib_path.display());
    Ok(entries)
}
