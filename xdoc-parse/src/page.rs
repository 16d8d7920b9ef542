//! Standalone HTML page around a rendered fragment.

use crate::bibliography::{CitationLookup, render_bibliography};
use crate::html::escape_html;
use crate::render_html::Rendered;
use crate::types::Document;

/// Configuration for [`to_html_page`].
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Path of the `.xdoc` source, linked as the page's alternate form.
    pub source_path: String,
    /// Page title. Falls back to front matter `title`, then "xdoc".
    pub title: Option<String>,
    /// Optional meta description.
    pub description: Option<String>,
    /// Language code. Falls back to front matter `lang`, then "en".
    pub lang: Option<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            source_path: "source.xdoc".to_string(),
            title: None,
            description: None,
            lang: None,
        }
    }
}

/// Wrap `rendered` in a complete page. The reference list for everything
/// cited is appended after the body.
pub fn to_html_page(
    doc: &Document,
    rendered: &Rendered,
    citations: &dyn CitationLookup,
    config: &PageConfig,
) -> String {
    let front = doc.front_matter.as_ref();
    let title = config
        .title
        .clone()
        .or_else(|| front.and_then(|fm| fm.title.clone()))
        .unwrap_or_else(|| "xdoc".to_string());
    let lang = config
        .lang
        .clone()
        .or_else(|| front.and_then(|fm| fm.lang.clone()))
        .unwrap_or_else(|| "en".to_string());

    let mut meta_extra = String::new();
    if let Some(desc) = &config.description {
        meta_extra.push_str(&format!(
            "\n    <meta name=\"description\" content=\"{}\">",
            escape_html(desc)
        ));
    }
    if let Some(author) = front.and_then(|fm| fm.author.as_deref()) {
        meta_extra.push_str(&format!(
            "\n    <meta name=\"author\" content=\"{}\">",
            escape_html(author)
        ));
    }

    let mut byline = String::new();
    let author = front.and_then(|fm| fm.author.as_deref());
    let date = front.and_then(|fm| fm.date.as_deref());
    if author.is_some() || date.is_some() {
        let parts: Vec<String> = [author, date].into_iter().flatten().map(escape_html).collect();
        byline = format!("<p class=\"byline\">{}</p>\n", parts.join(" · "));
    }

    let bibliography = render_bibliography(&rendered.cited, citations);

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="xdoc">
    <link rel="alternate" type="text/x-xdoc" href="{source_path}">
    <title>{title}</title>{meta_extra}
    <style>{css}</style>
</head>
<body>
<article class="xdoc">
<h1 class="title">{title}</h1>
{byline}{body}{bibliography}</article>
</body>
</html>
"#,
        lang = escape_html(&lang),
        source_path = escape_html(&config.source_path),
        title = escape_html(&title),
        meta_extra = meta_extra,
        css = XDOC_CSS,
        byline = byline,
        body = rendered.html,
        bibliography = bibliography,
    )
}

/// Embedded stylesheet for standalone pages.
const XDOC_CSS: &str = r#"
:root {
    --text: #1f2328;
    --muted: #59636e;
    --rule: #d1d9e0;
    --code-bg: #f6f8fa;
    --note: #0969da;
    --warning: #9a6700;
}
body { color: var(--text); font-family: Georgia, "Times New Roman", serif; line-height: 1.55; margin: 0; }
.xdoc { max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }
.xdoc h1.title { font-size: 2rem; margin-bottom: 0.25rem; }
.xdoc .byline { color: var(--muted); margin-top: 0; }
.xdoc section > h2 { border-bottom: 1px solid var(--rule); padding-bottom: 0.2rem; }
.xdoc section section > h2 { border: none; font-size: 1.2rem; }
.xdoc pre { background: var(--code-bg); padding: 0.75rem 1rem; overflow-x: auto; border-radius: 4px; }
.xdoc code { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; font-size: 0.9em; }
.xdoc figure { margin: 1.5rem 0; }
.xdoc figcaption { color: var(--muted); font-size: 0.9rem; text-align: center; }
.xdoc figure img { max-width: 100%; display: block; margin: 0 auto; }
.xdoc .nested { margin-left: 1.5rem; }
.xdoc .note, .xdoc .warning { border-left: 4px solid var(--note); padding: 0.25rem 1rem; margin: 1rem 0; }
.xdoc .warning { border-color: var(--warning); }
.xdoc ol.explanations { font-size: 0.9rem; color: var(--muted); }
.xdoc nav.toc ul { list-style: none; padding-left: 1.2rem; }
.xdoc a.xref, .xdoc a.cite { text-decoration: none; }
.xdoc .diagram-source { border: 1px dashed var(--rule); }
.xdoc .bibliography dt { font-weight: bold; }
"#;
