use std::path::{Path, PathBuf};

use crate::error::{Diagnostic, Location, ParseError, W_EMPTY_INCLUDE, W_TAB_INDENT};
use crate::lines::LineReader;
use crate::loader::{self, FsLoader, SourceLoader};
use crate::node::{build_node, register};
use crate::paragraph::{Paragraph, ParagraphReader};
use crate::types::{Document, FrontMatter, Node, NodeId, NodeType};

/// Deepest block nesting accepted, counting include levels.
pub const MAX_DEPTH: usize = 64;

/// Result of a successful parse.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// The document tree, including its cross-reference table.
    pub doc: Document,
    /// Non-fatal diagnostics collected during parsing.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `source`, resolving includes through the file system.
///
/// `file` names the source in diagnostics and anchors relative include
/// paths.
pub fn parse(source: &str, file: &str) -> Result<Parsed, ParseError> {
    Parser::new(file).parse(source)
}

/// Parser configuration: file identity and include loader.
pub struct Parser<'l> {
    file: String,
    loader: &'l dyn SourceLoader,
}

impl Parser<'static> {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            loader: &FsLoader,
        }
    }
}

impl<'l> Parser<'l> {
    pub fn with_loader<'m>(self, loader: &'m dyn SourceLoader) -> Parser<'m> {
        Parser {
            file: self.file,
            loader,
        }
    }

    /// Parse one top-level document. Every call gets a fresh identifier
    /// table and fresh bucket counters.
    pub fn parse(&self, source: &str) -> Result<Parsed, ParseError> {
        let (front_matter, body, first_line) = split_front_matter(source, &self.file)?;

        let mut ctx = DocumentContext {
            doc: Document::new(self.file.clone()),
            diagnostics: Vec::new(),
            loader: self.loader,
            include_stack: vec![loader::normalize(Path::new(&self.file))],
        };
        ctx.doc.front_matter = front_matter;

        let root = ctx.doc.root;
        let mut blocks = BlockParser::new(LineReader::with_offset(body, first_line, 0), 0);
        blocks.parse_root(&mut ctx, root, 0, 0)?;
        blocks.flush_tab_warnings(&mut ctx);

        Ok(Parsed {
            doc: ctx.doc,
            diagnostics: ctx.diagnostics,
        })
    }
}

// ------------------------------------------------------------------
// Front matter
// ------------------------------------------------------------------

/// Split a leading `---` fenced YAML block off `source`.
///
/// Returns the decoded front matter, the remaining body, and the 1-based
/// line number the body starts on.
pub fn split_front_matter<'s>(
    source: &'s str,
    file: &str,
) -> Result<(Option<FrontMatter>, &'s str, usize), ParseError> {
    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((None, source, 1));
    };
    if first.trim() != "---" {
        return Ok((None, source, 1));
    }

    let mut pos = first.len();
    for (number, line) in (2..).zip(lines) {
        let start = pos;
        pos += line.len();
        if line.trim() == "---" {
            let front_matter = decode_front_matter(&source[first.len()..start], file)?;
            return Ok((Some(front_matter), &source[pos..], number + 1));
        }
    }

    Err(ParseError::FrontMatter {
        message: "opening '---' has no closing '---'".to_string(),
        location: Location::new(file, 1, 1),
    })
}

fn decode_front_matter(yaml: &str, file: &str) -> Result<FrontMatter, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|err| {
        // YAML starts on line 2 of the file.
        let (line, column) = err
            .location()
            .map_or((2, 1), |at| (at.line() + 1, at.column()));
        ParseError::FrontMatter {
            message: err.to_string(),
            location: Location::new(file, line, column),
        }
    })
}

// ------------------------------------------------------------------
// Block parser
// ------------------------------------------------------------------

/// State shared by every parser taking part in one top-level parse,
/// including the ones created for included files.
pub(crate) struct DocumentContext<'l> {
    pub doc: Document,
    pub diagnostics: Vec<Diagnostic>,
    pub loader: &'l dyn SourceLoader,
    /// Files currently being parsed, outermost first.
    pub include_stack: Vec<PathBuf>,
}

/// Recursive indentation-driven parser over one file's paragraphs.
pub(crate) struct BlockParser<'a> {
    pub paragraphs: ParagraphReader<'a>,
    /// Index of the file being read in `Document::files`.
    pub file: usize,
}

impl<'a> BlockParser<'a> {
    pub fn new(lines: LineReader<'a>, file: usize) -> Self {
        Self {
            paragraphs: ParagraphReader::new(lines),
            file,
        }
    }

    /// Parse a whole stream as children of `parent`. The first paragraph
    /// must sit at exactly `indentation`.
    pub fn parse_root(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        parent: NodeId,
        indentation: usize,
        depth: usize,
    ) -> Result<(), ParseError> {
        let Some(found) = self.paragraphs.peek_indentation() else {
            return Ok(());
        };
        if found != indentation {
            return Err(ParseError::RootIndentation {
                expected: indentation,
                found,
                location: self.peek_location(ctx),
            });
        }
        self.parse_run(ctx, parent, indentation, depth)
    }

    /// Parse the block nested under `parent`. Only called when the next
    /// paragraph is indented deeper than the run `parent` belongs to.
    pub fn parse_children(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        parent: NodeId,
        depth: usize,
    ) -> Result<(), ParseError> {
        let Some(indentation) = self.paragraphs.peek_indentation() else {
            return Ok(());
        };
        if depth + 1 > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                location: self.peek_location(ctx),
            });
        }
        self.parse_run(ctx, parent, indentation, depth + 1)
    }

    /// Sibling paragraphs at `indentation`, each followed by whatever is
    /// nested under it.
    fn parse_run(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        parent: NodeId,
        indentation: usize,
        depth: usize,
    ) -> Result<(), ParseError> {
        let mut last: Option<NodeId> = None;

        while let Some(para) = self.paragraphs.read_at(indentation) {
            if let Some(added) = self.add_paragraph(ctx, parent, para, depth)? {
                last = Some(added);
            }

            while let Some(next) = self.paragraphs.peek_indentation() {
                if next <= indentation {
                    break;
                }
                let Some(target) = last else {
                    return Err(ParseError::NothingToNest {
                        location: self.peek_location(ctx),
                    });
                };
                self.parse_children(ctx, target, depth)?;
            }
        }
        Ok(())
    }

    /// Build, place and register the node for one paragraph. Returns the
    /// node later paragraphs nest under, if any.
    fn add_paragraph(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        parent: NodeId,
        para: Paragraph,
        depth: usize,
    ) -> Result<Option<NodeId>, ParseError> {
        let node = build_node(&ctx.doc, self.file, &para)?;

        match node.node_type {
            NodeType::Include => return self.include(ctx, parent, &node, depth),
            NodeType::Section => {
                let owner = ctx.doc.node(parent);
                if !matches!(owner.node_type, NodeType::Document | NodeType::Section) {
                    return Err(ParseError::SectionPlacement {
                        parent: owner.name.clone(),
                        location: ctx.doc.location_at(self.file, para.line, para.indentation + 1),
                    });
                }
            }
            _ => {}
        }

        let node_type = node.node_type;
        let id = ctx.doc.append(parent, node);
        // Auto ids come first: an auto id of "abstract" leaves the section unnumbered.
        register(&mut ctx.doc, id)?;
        if node_type == NodeType::Section {
            number_section(&mut ctx.doc, parent, id);
        }

        if matches!(node_type, NodeType::Verbatim | NodeType::Diagram) {
            self.capture_verbatim(ctx, id, depth)?;
        }
        Ok(Some(id))
    }

    /// Parse an included file straight into `parent`, in place of the
    /// include directive.
    fn include(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        parent: NodeId,
        directive: &Node,
        depth: usize,
    ) -> Result<Option<NodeId>, ParseError> {
        let target = directive.src.as_deref().unwrap_or_default();
        let path = loader::resolve(&ctx.doc.files[self.file], target);
        let shown = path.display().to_string();
        let location = ctx
            .doc
            .location_at(self.file, directive.line, directive.indentation + 1);

        if ctx.include_stack.contains(&path) {
            return Err(ParseError::IncludeCycle {
                path: shown,
                location,
            });
        }
        if depth + 1 > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                location,
            });
        }

        let text = ctx.loader.load(&path).map_err(|err| ParseError::Include {
            path: shown.clone(),
            message: err.to_string(),
            location: location.clone(),
        })?;
        let (_, body, first_line) = split_front_matter(&text, &shown)?;

        log::debug!("{location}: including {shown}");
        let file = ctx.doc.add_file(shown.clone());
        let before = ctx.doc.node(parent).last_child;

        ctx.include_stack.push(path);
        let lines = LineReader::with_offset(body, first_line, directive.indentation);
        let mut sub = BlockParser::new(lines, file);
        sub.parse_root(ctx, parent, directive.indentation, depth + 1)?;
        sub.flush_tab_warnings(ctx);
        ctx.include_stack.pop();

        let after = ctx.doc.node(parent).last_child;
        if after == before {
            ctx.diagnostics.push(Diagnostic::warning(
                W_EMPTY_INCLUDE,
                format!("included file '{shown}' has no content"),
                location,
            ));
            return Ok(None);
        }
        Ok(after)
    }

    pub fn flush_tab_warnings(&mut self, ctx: &mut DocumentContext<'_>) {
        for (line, column) in self.paragraphs.take_tab_warnings() {
            ctx.diagnostics.push(Diagnostic::warning(
                W_TAB_INDENT,
                "tab in indentation; only spaces count toward nesting",
                ctx.doc.location_at(self.file, line, column),
            ));
        }
    }

    pub fn peek_location(&mut self, ctx: &DocumentContext<'_>) -> Location {
        let file = self.file;
        match self.paragraphs.peek() {
            Some(p) => ctx.doc.location_at(file, p.line, p.indentation + 1),
            None => ctx.doc.location_at(file, 0, 0),
        }
    }
}

/// Level and outline number for a freshly appended section.
fn number_section(doc: &mut Document, parent: NodeId, id: NodeId) {
    let (parent_level, parent_outline) = {
        let owner = doc.node(parent);
        (owner.level, owner.outline.clone())
    };

    let outline = if doc.node(id).is_abstract() {
        String::new()
    } else {
        let ordinal = doc
            .children(parent)
            .take_while(|&c| c != id)
            .filter(|&c| {
                let sibling = doc.node(c);
                sibling.is_section() && !sibling.is_abstract()
            })
            .count()
            + 1;
        format!("{parent_outline}{ordinal}.")
    };

    let section = doc.node_mut(id);
    section.level = parent_level + 1;
    section.outline = outline;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use pretty_assertions::assert_eq;

    fn doc(src: &str) -> Document {
        parse(src, "t.xdoc").unwrap().doc
    }

    fn names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .map(|c| doc.node(c).name.clone())
            .collect()
    }

    #[test]
    fn abstract_and_nested_sections() {
        let d = doc(concat!(
            "<section #abstract>\n",
            "    Required abstract text.\n",
            "<section>Introduction\n",
            "    Some prose.\n",
            "    <section>Sub\n",
            "        Nested prose.\n",
        ));
        let top: Vec<_> = d.children(d.root).collect();
        assert_eq!(top.len(), 2);

        let abs = d.node(top[0]);
        assert_eq!((abs.id.as_deref(), abs.outline.as_str()), (Some("abstract"), ""));

        let intro = d.node(top[1]);
        assert_eq!(intro.outline, "1.");
        assert_eq!(intro.rest, "Introduction");
        assert_eq!(intro.id.as_deref(), Some("introduction"));
        assert_eq!(names(&d, top[1]), vec!["p", "section"]);

        let sub_id = d.children(top[1]).nth(1).unwrap();
        let sub = d.node(sub_id);
        assert_eq!((sub.outline.as_str(), sub.level), ("1.1.", 2));
        let nested = d.children(sub_id).next().unwrap();
        assert_eq!(d.node(nested).rest, "Nested prose.");
    }

    #[test]
    fn sibling_sections_count_up() {
        let d = doc("<section>A\n<section>B\n<section #abstract>\n<section>C\n");
        let outlines: Vec<_> = d
            .children(d.root)
            .map(|c| d.node(c).outline.clone())
            .collect();
        assert_eq!(outlines, vec!["1.", "2.", "", "3."]);
    }

    #[test]
    fn open_tag_head_stops_at_line_end() {
        let d = doc("<div #a\nmore words\nwith a \" quote\n");
        let div = d.lookup("a").unwrap();
        assert_eq!(div.name, "div");
        assert!(div.attrs.is_empty(), "{:?}", div.attrs);
        assert_eq!(div.rest, "more words\nwith a \" quote");
    }

    #[test]
    fn heading_named_abstract_is_unnumbered() {
        let d = doc("<section>Abstract\n<section>Intro\n<section>Next\n");
        let sections: Vec<_> = d
            .children(d.root)
            .map(|c| {
                let s = d.node(c);
                (s.id.clone().unwrap_or_default(), s.outline.clone())
            })
            .collect();
        assert_eq!(
            sections,
            vec![
                ("abstract".to_string(), String::new()),
                ("intro".to_string(), "1.".to_string()),
                ("next".to_string(), "2.".to_string()),
            ]
        );
    }

    #[test]
    fn same_heading_twice_gets_distinct_ids() {
        let d = doc("<section>Notes\n<section>Notes\n");
        assert!(d.xref.contains_key("notes"));
        assert!(d.xref.contains_key("notes-2"));
    }

    #[test]
    fn lists_nest_under_their_item() {
        let d = doc("- one\n    detail\n- two\n");
        assert_eq!(names(&d, d.root), vec!["li", "li"]);
        let first = d.children(d.root).next().unwrap();
        assert_eq!(names(&d, first), vec!["p"]);
    }

    #[test]
    fn shallower_child_after_deeper_still_nests() {
        let d = doc("<div>\n        deep\n    shallower\nback\n");
        let div = d.children(d.root).next().unwrap();
        let kids: Vec<_> = d.children(div).map(|c| d.node(c).rest.clone()).collect();
        assert_eq!(kids, vec!["deep", "shallower"]);
        assert_eq!(names(&d, d.root), vec!["div", "p"]);
    }

    #[test]
    fn root_must_start_at_column_one() {
        let err = parse("  indented\n", "t.xdoc").unwrap_err();
        assert!(matches!(
            err,
            ParseError::RootIndentation {
                expected: 0,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn section_inside_block_is_fatal() {
        let err = parse("<x-note>\n    <section>Bad\n", "t.xdoc").unwrap_err();
        assert!(matches!(err, ParseError::SectionPlacement { ref parent, .. } if parent == "x-note"));
        assert_eq!(err.location().line, 2);
    }

    #[test]
    fn duplicate_explicit_id_is_fatal() {
        let err = parse("<x-note #a>\n<x-note #a>\n", "t.xdoc").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateId { .. }));
    }

    #[test]
    fn syntax_error_reports_column() {
        let err = parse("ok\n\n<section #a #b>\n", "t.xdoc").unwrap_err();
        assert_eq!(err.location(), &Location::new("t.xdoc", 3, 13));
    }

    #[test]
    fn depth_is_capped() {
        let src: String = (0..=MAX_DEPTH + 1)
            .map(|level| format!("{}<div>\n", "  ".repeat(level)))
            .collect();
        assert!(matches!(
            parse(&src, "t.xdoc"),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn front_matter_keeps_body_line_numbers() {
        let parsed = parse("---\ntitle: Doc\n---\n\n<x-note #n>\n", "t.xdoc").unwrap();
        let fm = parsed.doc.front_matter.as_ref().unwrap();
        assert_eq!(fm.title.as_deref(), Some("Doc"));
        assert_eq!(parsed.doc.lookup("n").unwrap().line, 5);
    }

    #[test]
    fn unclosed_front_matter_is_fatal() {
        assert!(matches!(
            parse("---\ntitle: x\n", "t.xdoc"),
            Err(ParseError::FrontMatter { .. })
        ));
    }

    #[test]
    fn includes_splice_into_parent() {
        let loader = MemoryLoader::new()
            .with_file("docs/part.xdoc", "---\ntitle: ignored\n---\n<section>Part\n    text\n")
            .with_file("docs/main.xdoc", "");
        let src = "<section>One\n    <x-include @part.xdoc>\n<section>Two\n";
        let parsed = Parser::new("docs/main.xdoc")
            .with_loader(&loader)
            .parse(src)
            .unwrap();
        let d = &parsed.doc;

        let one = d.children(d.root).next().unwrap();
        let part = d.children(one).next().unwrap();
        let part_node = d.node(part);
        assert_eq!((part_node.rest.as_str(), part_node.outline.as_str()), ("Part", "1.1."));
        assert_eq!(part_node.indentation, 4);
        assert_eq!(part_node.line, 4);
        assert_eq!(d.files[part_node.file], "docs/part.xdoc");
        assert_eq!(d.node(d.children(part).next().unwrap()).indentation, 8);
        assert!(d.front_matter.is_none());
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn include_cycle_is_fatal() {
        let loader = MemoryLoader::new()
            .with_file("a.xdoc", "<x-include @b.xdoc>\n")
            .with_file("b.xdoc", "<x-include @a.xdoc>\n");
        let err = Parser::new("a.xdoc")
            .with_loader(&loader)
            .parse("<x-include @b.xdoc>\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::IncludeCycle { ref path, .. } if path == "a.xdoc"));
        assert_eq!(err.location().file, "b.xdoc");
    }

    #[test]
    fn missing_include_is_fatal() {
        let loader = MemoryLoader::new();
        let err = Parser::new("a.xdoc")
            .with_loader(&loader)
            .parse("<x-include @gone.xdoc>\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Include { .. }));
    }

    #[test]
    fn empty_include_warns_and_nothing_nests_under_it() {
        let loader = MemoryLoader::new().with_file("empty.xdoc", "// nothing\n");
        let parser = Parser::new("a.xdoc").with_loader(&loader);

        let parsed = parser.parse("<x-include @empty.xdoc>\n").unwrap();
        assert_eq!(parsed.diagnostics[0].code.as_deref(), Some(W_EMPTY_INCLUDE));

        let err = parser
            .parse("<x-include @empty.xdoc>\n    orphan\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::NothingToNest { .. }));
    }

    #[test]
    fn tabs_are_reported_not_counted() {
        let parsed = parse("<div>\n  \tchild\n", "t.xdoc").unwrap();
        let div = parsed.doc.children(parsed.doc.root).next().unwrap();
        assert_eq!(parsed.doc.node(parsed.doc.children(div).next().unwrap()).indentation, 2);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].code.as_deref(), Some(W_TAB_INDENT));
        assert_eq!(parsed.diagnostics[0].location, Some(Location::new("t.xdoc", 2, 3)));
    }
}
