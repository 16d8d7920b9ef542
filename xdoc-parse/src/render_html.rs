//! HTML fragment renderer.
//!
//! Depth-first walk over the document tree. Inline text is emitted as
//! written (it is already HTML), after `<x-ref "id">` cross-references and
//! `[[KEY]]` citations have been resolved. Attribute values and verbatim
//! content are escaped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::bibliography::{CitationLookup, NoCitations};
use crate::collaborators::{DiagramRenderer, EscapeHighlighter, Highlighter, SourceDiagrams};
use crate::error::{Diagnostic, W_CITE_MISSING, W_DIAGRAM_FAILED, W_XREF_MISSING};
use crate::html::{escape_html, is_void};
use crate::node::bucket_for;
use crate::preprocess::CONTINUATION_CLASS;
use crate::types::{Document, Node, NodeId, NodeType};

static XREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<x-ref\s+["']([^"']+)["']\s*/?>(?:\s*</x-ref>)?"#).unwrap()
});
static CITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\[\]\s]+)\]\]").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// External services used while rendering.
pub struct Collaborators<'a> {
    pub highlighter: &'a dyn Highlighter,
    pub diagrams: &'a dyn DiagramRenderer,
    pub citations: &'a dyn CitationLookup,
}

impl Default for Collaborators<'static> {
    fn default() -> Self {
        Self {
            highlighter: &EscapeHighlighter,
            diagrams: &SourceDiagrams,
            citations: &NoCitations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix section headings with their outline number.
    pub numbered_headings: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            numbered_headings: true,
        }
    }
}

impl RenderOptions {
    /// Options as requested by the document's front matter.
    pub fn for_document(doc: &Document) -> Self {
        Self {
            numbered_headings: doc
                .front_matter
                .as_ref()
                .and_then(|fm| fm.numbering)
                .unwrap_or(true),
        }
    }
}

/// Output of [`render_html`].
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    /// Bibliography keys cited and found, in first-citation order.
    pub cited: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render a document as an HTML fragment.
pub fn render_html(doc: &Document, collab: &Collaborators<'_>, options: &RenderOptions) -> Rendered {
    let mut renderer = Renderer {
        doc,
        collab,
        options,
        out: String::new(),
        cited: Vec::new(),
        diagnostics: Vec::new(),
    };
    renderer.children(doc.root);
    Rendered {
        html: renderer.out,
        cited: renderer.cited,
        diagnostics: renderer.diagnostics,
    }
}

struct Renderer<'a> {
    doc: &'a Document,
    collab: &'a Collaborators<'a>,
    options: &'a RenderOptions,
    out: String,
    cited: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Renderer<'a> {
    fn at(&self, id: NodeId) -> &'a Node {
        self.doc.node(id)
    }

    // ------------------------------------------------------------------
    // Tree walk
    // ------------------------------------------------------------------

    fn children(&mut self, parent: NodeId) {
        let kids: Vec<NodeId> = self
            .doc
            .children(parent)
            .filter(|&k| self.doc.node(k).node_type != NodeType::Explanation)
            .collect();
        let in_list = matches!(self.doc.node(parent).name.as_str(), "ul" | "ol");
        self.sequence(&kids, in_list);
    }

    /// Render siblings. Runs of list items outside a list get a `<ul>`;
    /// continuation blocks go inside the item before them.
    fn sequence(&mut self, kids: &[NodeId], in_list: bool) {
        let mut i = 0;
        while i < kids.len() {
            if !self.is_item(kids[i]) {
                self.node(kids[i]);
                i += 1;
                continue;
            }
            if !in_list {
                self.out.push_str("<ul>\n");
            }
            while i < kids.len() && self.is_item(kids[i]) {
                let item = kids[i];
                i += 1;
                let first = i;
                while i < kids.len() && self.doc.node(kids[i]).has_class(CONTINUATION_CLASS) {
                    i += 1;
                }
                self.element(item, &kids[first..i]);
            }
            if !in_list {
                self.out.push_str("</ul>\n");
            }
        }
    }

    fn is_item(&self, id: NodeId) -> bool {
        self.doc.node(id).name == "li"
    }

    fn node(&mut self, id: NodeId) {
        let node = self.at(id);
        match node.node_type {
            NodeType::Document => self.children(id),
            NodeType::Section => self.section(id),
            NodeType::Verbatim => self.verbatim(id),
            NodeType::Diagram => self.diagram(id),
            NodeType::Include => {}
            NodeType::Block | NodeType::Explanation => match node.name.as_str() {
                "p" => self.paragraph(id),
                "x-note" => self.admonition(id, "note", "Note:"),
                "x-warning" => self.admonition(id, "warning", "Warning:"),
                "x-dl" => self.wrapped(id, "dl"),
                "x-dt" | "dt" => self.definition(id),
                "x-img" => self.image(id),
                "x-toc" => self.toc(id),
                _ => self.element(id, &[]),
            },
        }
    }

    // ------------------------------------------------------------------
    // Per-tag idioms
    // ------------------------------------------------------------------

    fn section(&mut self, id: NodeId) {
        let node = self.at(id);
        self.out
            .push_str(&format!("<section{}>\n", self.attrs(node, None)));
        let heading = if node.is_abstract() {
            let title = self.inline(id, &node.rest);
            if title.is_empty() { "Abstract".to_string() } else { title }
        } else {
            let title = self.inline(id, &node.rest);
            self.numbered(node, &title)
        };
        if !heading.is_empty() {
            self.out.push_str(&format!("<h2>{heading}</h2>\n"));
        }
        self.children(id);
        self.out.push_str("</section>\n");
    }

    fn numbered(&self, section: &Node, title: &str) -> String {
        if !self.options.numbered_headings || section.outline.is_empty() {
            return title.to_string();
        }
        format!("{} {title}", section.outline).trim_end().to_string()
    }

    fn paragraph(&mut self, id: NodeId) {
        let node = self.at(id);
        let text = self.inline(id, &node.rest);
        self.out
            .push_str(&format!("<p{}>{text}</p>\n", self.attrs(node, None)));
        if node.first_child.is_some() {
            self.out.push_str("<div class=\"nested\">\n");
            self.children(id);
            self.out.push_str("</div>\n");
        }
    }

    fn admonition(&mut self, id: NodeId, class: &str, lead: &str) {
        let node = self.at(id);
        let text = self.inline(id, &node.rest);
        self.out.push_str(&format!(
            "<div{}>\n<p><b>{lead}</b> {text}</p>\n",
            self.attrs(node, Some(class))
        ));
        self.children(id);
        self.out.push_str("</div>\n");
    }

    /// `node` rendered as `tag` instead of its own name.
    fn wrapped(&mut self, id: NodeId, tag: &str) {
        let node = self.at(id);
        let text = self.inline(id, &node.rest);
        self.out
            .push_str(&format!("<{tag}{}>{text}\n", self.attrs(node, None)));
        self.children(id);
        self.out.push_str(&format!("</{tag}>\n"));
    }

    fn definition(&mut self, id: NodeId) {
        let node = self.at(id);
        let term = self.inline(id, &node.rest);
        self.out
            .push_str(&format!("<dt{}>{term}</dt>\n<dd>\n", self.attrs(node, None)));
        self.children(id);
        self.out.push_str("</dd>\n");
    }

    fn image(&mut self, id: NodeId) {
        let node = self.at(id);
        let caption = self.inline(id, &node.rest);
        let alt = node
            .attr("alt")
            .map(str::to_string)
            .unwrap_or_else(|| strip_tags(&caption));
        let mut img = format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(node.src.as_deref().unwrap_or_default()),
            escape_html(&alt)
        );
        if let Some(href) = &node.href {
            img = format!("<a href=\"{}\">{img}</a>", escape_html(href));
        }
        self.out.push_str(&format!(
            "<figure{}>\n{img}\n",
            self.figure_attrs(node, "figure")
        ));
        self.caption(node, &caption);
        self.children(id);
        self.out.push_str("</figure>\n");
    }

    fn verbatim(&mut self, id: NodeId) {
        let node = self.at(id);
        let lang = node.classes().next();
        let code = self.collab.highlighter.highlight(lang, &node.inner_text);
        let code_class = lang
            .map(|l| format!(" class=\"language-{}\"", escape_html(l)))
            .unwrap_or_default();
        let as_figure =
            !node.rest.is_empty() || node.ordinal.is_some() || node.name == "x-example";

        if as_figure {
            let kind = if node.name == "x-example" { "example" } else { "listing" };
            self.out
                .push_str(&format!("<figure{}>\n", self.figure_attrs(node, kind)));
            self.out
                .push_str(&format!("<pre><code{code_class}>{code}</code></pre>\n"));
        } else {
            self.out.push_str(&format!(
                "<pre{}><code{code_class}>{code}</code></pre>\n",
                self.attrs(node, None)
            ));
        }

        self.explanations(id);
        if as_figure {
            let caption = self.inline(id, &node.rest);
            self.caption(node, &caption);
        }
        self.children(id);
        if as_figure {
            self.out.push_str("</figure>\n");
        }
    }

    fn diagram(&mut self, id: NodeId) {
        let node = self.at(id);
        let kind = node.classes().next().unwrap_or("diagram");
        let caption = self.inline(id, &node.rest);
        self.out
            .push_str(&format!("<figure{}>\n", self.figure_attrs(node, "diagram")));

        match self.collab.diagrams.render_diagram(kind, &node.inner_text) {
            Ok(image) => {
                let alt = if image.alt.is_empty() {
                    strip_tags(&caption)
                } else {
                    image.alt
                };
                self.out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\">\n",
                    escape_html(&image.src),
                    escape_html(&alt)
                ));
            }
            Err(message) => {
                let location = self.doc.location(id);
                log::warn!("{location}: diagram not rendered: {message}");
                self.diagnostics.push(Diagnostic::warning(
                    W_DIAGRAM_FAILED,
                    format!("diagram not rendered: {message}"),
                    location,
                ));
                self.out.push_str(&format!(
                    "<pre class=\"diagram-source\"><code>{}</code></pre>\n",
                    escape_html(&node.inner_text)
                ));
            }
        }

        self.explanations(id);
        self.caption(node, &caption);
        self.children(id);
        self.out.push_str("</figure>\n");
    }

    fn explanations(&mut self, id: NodeId) {
        let items: Vec<NodeId> = self
            .doc
            .children(id)
            .filter(|&k| self.doc.node(k).node_type == NodeType::Explanation)
            .collect();
        if items.is_empty() {
            return;
        }
        self.out.push_str("<ol class=\"explanations\">\n");
        self.sequence(&items, true);
        self.out.push_str("</ol>\n");
    }

    fn caption(&mut self, node: &Node, text: &str) {
        let prefix = match (bucket_for(node), node.ordinal) {
            (Some(bucket), Some(n)) if text.is_empty() => format!("{} {n}", capitalize(bucket)),
            (Some(bucket), Some(n)) => format!("{} {n}: ", capitalize(bucket)),
            _ => String::new(),
        };
        if prefix.is_empty() && text.is_empty() {
            return;
        }
        self.out
            .push_str(&format!("<figcaption>{prefix}{text}</figcaption>\n"));
    }

    fn toc(&mut self, id: NodeId) {
        let node = self.at(id);
        let title = self.inline(id, &node.rest);
        self.out
            .push_str(&format!("<nav{}>\n", self.attrs(node, Some("toc"))));
        if !title.is_empty() {
            self.out.push_str(&format!("<h2>{title}</h2>\n"));
        }
        let list = self.toc_list(self.doc.root);
        self.out.push_str(&list);
        self.out.push_str("</nav>\n");
    }

    fn toc_list(&self, parent: NodeId) -> String {
        let sections: Vec<NodeId> = self
            .doc
            .children(parent)
            .filter(|&k| {
                let n = self.doc.node(k);
                n.is_section() && !n.is_abstract()
            })
            .collect();
        if sections.is_empty() {
            return String::new();
        }
        let mut html = String::from("<ul>\n");
        for id in sections {
            let section = self.at(id);
            let title = strip_xrefs(&section.rest);
            html.push_str(&format!(
                "<li><a href=\"#{}\">{}</a>",
                escape_html(section.id.as_deref().unwrap_or_default()),
                self.numbered(section, &title)
            ));
            let nested = self.toc_list(id);
            if !nested.is_empty() {
                html.push('\n');
                html.push_str(&nested);
            }
            html.push_str("</li>\n");
        }
        html.push_str("</ul>\n");
        html
    }

    /// Generic element: the node's own tag around its text and children.
    /// `tail` nodes are rendered inside, after the children.
    fn element(&mut self, id: NodeId, tail: &[NodeId]) {
        let node = self.at(id);
        let text = self.inline(id, &node.rest);
        let open = format!("<{}{}>", node.name, self.attrs(node, None));

        if is_void(&node.name) {
            self.out.push_str(&format!("{open}{text}\n"));
            self.children(id);
            return;
        }

        self.out.push_str(&open);
        self.out.push_str(&text);
        if node.first_child.is_some() || !tail.is_empty() {
            self.out.push('\n');
            self.children(id);
            for &extra in tail {
                self.node(extra);
            }
        }
        self.out.push_str(&format!("</{}>\n", node.name));
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// ` id=".." class=".." ...` for a node. `class` is put in front of the
    /// node's own classes.
    fn attrs(&self, node: &Node, class: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(id) = &node.id {
            out.push_str(&format!(" id=\"{}\"", escape_html(id)));
        }
        let classes: Vec<&str> = class.into_iter().chain(node.classes()).collect();
        if !classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
        }
        if let Some(src) = &node.src {
            out.push_str(&format!(" src=\"{}\"", escape_html(src)));
        }
        if let Some(href) = &node.href {
            out.push_str(&format!(" href=\"{}\"", escape_html(href)));
        }
        if node.name == "li" {
            if let Some(n) = node.number.as_deref().filter(|n| n.parse::<u32>().is_ok()) {
                out.push_str(&format!(" value=\"{n}\""));
            }
        }
        for (key, value) in &node.attrs {
            if value.is_empty() {
                out.push_str(&format!(" {key}"));
            } else {
                out.push_str(&format!(" {key}=\"{}\"", escape_html(value)));
            }
        }
        out
    }

    /// Attributes for a `<figure>` wrapper: id plus kind class, no src.
    fn figure_attrs(&self, node: &Node, kind: &str) -> String {
        let mut out = String::new();
        if let Some(id) = &node.id {
            out.push_str(&format!(" id=\"{}\"", escape_html(id)));
        }
        out.push_str(&format!(" class=\"{kind}\""));
        out
    }

    // ------------------------------------------------------------------
    // Inline substitutions
    // ------------------------------------------------------------------

    /// Resolve cross-references and citations in a node's inline text.
    fn inline(&mut self, owner: NodeId, text: &str) -> String {
        if !text.contains("x-ref") && !text.contains("[[") {
            return text.to_string();
        }
        let doc = self.doc;
        let location = doc.location(owner);

        let mut missing_refs = Vec::new();
        let linked = XREF.replace_all(text, |caps: &Captures<'_>| {
            let target = &caps[1];
            match doc.xref.get(target) {
                Some(&node) => format!(
                    "<a href=\"#{}\" class=\"xref\">{}</a>",
                    escape_html(target),
                    xref_label(doc.node(node), target)
                ),
                None => {
                    missing_refs.push(target.to_string());
                    format!("[{}]", escape_html(target))
                }
            }
        });

        let citations = self.collab.citations;
        let mut cited = Vec::new();
        let mut missing_keys = Vec::new();
        let resolved = CITE.replace_all(&linked, |caps: &Captures<'_>| {
            let key = &caps[1];
            if citations.citation(key).is_some() {
                cited.push(key.to_string());
                let key = escape_html(key);
                format!("<a href=\"#bib-{key}\" class=\"cite\">[{key}]</a>")
            } else {
                missing_keys.push(key.to_string());
                format!("[{}]", escape_html(key))
            }
        });
        let html = resolved.into_owned();

        for target in missing_refs {
            log::warn!("{location}: unresolved reference '{target}'");
            self.diagnostics.push(Diagnostic::warning(
                W_XREF_MISSING,
                format!("unresolved reference '{target}'"),
                location.clone(),
            ));
        }
        for key in missing_keys {
            log::warn!("{location}: unknown bibliography key '{key}'");
            self.diagnostics.push(Diagnostic::warning(
                W_CITE_MISSING,
                format!("unknown bibliography key '{key}'"),
                location.clone(),
            ));
        }
        for key in cited {
            if !self.cited.contains(&key) {
                self.cited.push(key);
            }
        }
        html
    }
}

/// Link text for a reference to `target`.
fn xref_label(target: &Node, id: &str) -> String {
    if target.name == "li" || target.node_type == NodeType::Explanation {
        return escape_html(id);
    }
    let text = strip_tags(&strip_xrefs(&target.rest));
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    match (bucket_for(target), target.ordinal) {
        (Some(bucket), Some(n)) => format!("{} {n}", capitalize(bucket)),
        _ => escape_html(id),
    }
}

/// Drop `<x-ref>` markers, keeping their target id as text.
fn strip_xrefs(text: &str) -> String {
    XREF.replace_all(text, "$1").into_owned()
}

fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::bibliography::Citation;
    use crate::collaborators::DiagramImage;
    use crate::parse::parse;
    use pretty_assertions::assert_eq;

    fn render(src: &str) -> Rendered {
        let doc = parse(src, "t.xdoc").unwrap().doc;
        render_html(&doc, &Collaborators::default(), &RenderOptions::for_document(&doc))
    }

    #[test]
    fn sections_get_numbered_headings() {
        let html = render(concat!(
            "<section #abstract>\n",
            "    Required abstract text.\n",
            "<section>Introduction\n",
            "    Some prose.\n",
            "    <section>Sub\n",
            "        Nested prose.\n",
        ))
        .html;
        assert!(html.contains("<section id=\"abstract\">\n<h2>Abstract</h2>"));
        assert!(html.contains("<h2>1. Introduction</h2>"));
        let heading = html.find("<h2>1.1. Sub</h2>").unwrap();
        let prose = html.find("Nested prose.").unwrap();
        assert!(heading < prose);
        assert!(!html.contains("1. Abstract"));
    }

    #[test]
    fn numbering_can_be_switched_off() {
        let html = render("---\nnumbering: false\n---\n<section>Intro\n").html;
        assert!(html.contains("<h2>Intro</h2>"));
    }

    #[test]
    fn xref_uses_target_text() {
        let rendered = render("<x-note #foo>Widget\n\nSee <x-ref \"foo\">.\n");
        assert!(rendered
            .html
            .contains("<p>See <a href=\"#foo\" class=\"xref\">Widget</a>.</p>"));
        assert!(rendered.diagnostics.is_empty());
    }

    #[test]
    fn unresolved_xref_is_a_placeholder() {
        let rendered = render("See <x-ref 'bar'></x-ref> now.\n");
        assert!(rendered.html.contains("<p>See [bar] now.</p>"));
        assert_eq!(rendered.diagnostics.len(), 1);
        assert_eq!(rendered.diagnostics[0].code.as_deref(), Some(W_XREF_MISSING));
        assert_eq!(rendered.diagnostics[0].location.as_ref().unwrap().line, 1);
    }

    #[test]
    fn xref_to_list_item_uses_id() {
        let html = render("-(Step one) mix\n\nDo <x-ref \"Step_one\"> first.\n").html;
        assert!(html.contains("<a href=\"#Step_one\" class=\"xref\">Step_one</a>"));
    }

    #[test]
    fn xref_to_uncaptioned_figure_uses_number() {
        let html = render("<x-img #arch @arch.png>\n\nAs <x-ref \"arch\"> shows.\n").html;
        assert!(html.contains("<a href=\"#arch\" class=\"xref\">Figure 1</a>"));
        assert!(html.contains("<figcaption>Figure 1</figcaption>"));
    }

    #[test]
    fn citations_link_and_are_recorded_once() {
        let mut bib = BTreeMap::new();
        bib.insert(
            "knuth84".to_string(),
            Citation {
                title: "Literate Programming".into(),
                ..Citation::default()
            },
        );
        let doc = parse("As [[knuth84]] and [[knuth84]] said, not [[nobody]].\n", "t.xdoc")
            .unwrap()
            .doc;
        let collab = Collaborators {
            citations: &bib,
            ..Collaborators::default()
        };
        let rendered = render_html(&doc, &collab, &RenderOptions::default());
        assert!(rendered
            .html
            .contains("<a href=\"#bib-knuth84\" class=\"cite\">[knuth84]</a>"));
        assert!(rendered.html.contains("not [nobody]."));
        assert_eq!(rendered.cited, vec!["knuth84"]);
        assert_eq!(rendered.diagnostics[0].code.as_deref(), Some(W_CITE_MISSING));
    }

    #[test]
    fn loose_items_are_wrapped_and_continuations_fold_in() {
        let html = render("- one\n-+ more of one\n- two\n").html;
        assert_eq!(
            html,
            concat!(
                "<ul>\n",
                "<li id=\"li-1\">one\n",
                "<div class=\"item-continuation\">more of one</div>\n",
                "</li>\n",
                "<li id=\"li-3\">two</li>\n",
                "</ul>\n",
            )
        );
    }

    #[test]
    fn explicit_lists_are_not_double_wrapped() {
        let html = render("<ol>\n    - a\n    <li =5>b\n").html;
        assert!(html.starts_with("<ol>\n<li id=\"li-2\">a</li>\n<li id=\"5\" value=\"5\">b</li>\n</ol>"));
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn paragraph_children_are_nested_after_it() {
        let html = render("Lead\n    indented aside\n").html;
        assert_eq!(
            html,
            "<p>Lead</p>\n<div class=\"nested\">\n<p>indented aside</p>\n</div>\n"
        );
    }

    #[test]
    fn notes_and_definitions() {
        let html = render("<x-note>Careful\n<x-dl>\n    <x-dt>Term\n        Meaning.\n").html;
        assert!(html.contains("<div class=\"note\">\n<p><b>Note:</b> Careful</p>\n</div>"));
        assert!(html.contains("<dl>\n<dt id=\"term\">Term</dt>\n<dd>\n<p>Meaning.</p>\n</dd>\n</dl>"));
    }

    #[test]
    fn code_blocks_with_explanations() {
        let html = render(concat!(
            "<x-example #ex .rust>Adding\n",
            "    let x = a < b;\n",
            "    # - compares\n",
        ))
        .html;
        assert!(html.starts_with("<figure id=\"ex\" class=\"example\">\n"));
        assert!(html.contains("<pre><code class=\"language-rust\">let x = a &lt; b;</code></pre>"));
        assert!(html.contains("<ol class=\"explanations\">\n<li id=\"li-3\">compares</li>\n</ol>"));
        assert!(html.contains("<figcaption>Example 1: Adding</figcaption>"));
    }

    #[test]
    fn plain_pre_keeps_its_id() {
        let html = render("<pre #raw>\n    x\n").html;
        assert_eq!(html, "<pre id=\"raw\"><code>x</code></pre>\n");
    }

    struct FixedDiagrams;

    impl DiagramRenderer for FixedDiagrams {
        fn render_diagram(&self, kind: &str, _source: &str) -> Result<DiagramImage, String> {
            Ok(DiagramImage {
                src: format!("diagrams/{kind}.svg"),
                alt: String::new(),
            })
        }
    }

    #[test]
    fn diagrams_use_the_renderer() {
        let doc = parse("<x-diagram #d .dot>Flow\n    a -> b\n", "t.xdoc").unwrap().doc;
        let collab = Collaborators {
            diagrams: &FixedDiagrams,
            ..Collaborators::default()
        };
        let html = render_html(&doc, &collab, &RenderOptions::default()).html;
        assert_eq!(
            html,
            concat!(
                "<figure id=\"d\" class=\"diagram\">\n",
                "<img src=\"diagrams/dot.svg\" alt=\"Flow\">\n",
                "<figcaption>Figure 1: Flow</figcaption>\n",
                "</figure>\n",
            )
        );
    }

    #[test]
    fn failed_diagram_falls_back_to_source() {
        let rendered = render("<x-diagram .dot>\n    a -> b\n");
        assert!(rendered
            .html
            .contains("<pre class=\"diagram-source\"><code>a -&gt; b</code></pre>"));
        assert_eq!(rendered.diagnostics[0].code.as_deref(), Some(W_DIAGRAM_FAILED));
    }

    #[test]
    fn toc_lists_numbered_sections() {
        let html = render(concat!(
            "<x-toc>Contents\n",
            "<section #abstract>\n",
            "<section>One\n",
            "    <section>Deeper\n",
            "<section>Two\n",
        ))
        .html;
        assert!(html.contains(concat!(
            "<nav class=\"toc\">\n<h2>Contents</h2>\n<ul>\n",
            "<li><a href=\"#one\">1. One</a>\n<ul>\n",
            "<li><a href=\"#deeper\">1.1. Deeper</a></li>\n</ul>\n</li>\n",
            "<li><a href=\"#two\">2. Two</a></li>\n</ul>\n</nav>\n",
        )));
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let html = render("<source @clip.webm type=\"video/webm\">\n").html;
        assert_eq!(html, "<source src=\"clip.webm\" type=\"video/webm\">\n");
    }
}
