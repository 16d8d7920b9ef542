//! Raw content capture for code, `pre` and diagram blocks.
//!
//! Lines indented deeper than the block's tag are taken as they are, blank
//! lines included, then dedented by the smallest indentation among them.
//! Lines marked `# -`, `# -(label)` or `# -+` are explanations: they are
//! cut out of the content and parsed as list items attached to the block.

use crate::error::ParseError;
use crate::lines::{LineReader, SourceLine};
use crate::loader;
use crate::node::{build_node, register};
use crate::parse::{BlockParser, DocumentContext};
use crate::types::{NodeId, NodeType};

enum Captured<'a> {
    Blank,
    Content { indentation: usize, body: &'a str },
}

/// One explanation marker line plus its deeper continuation lines, with the
/// leading `#` removed.
struct ExplanationSource {
    text: String,
    first_line: usize,
    shift: usize,
}

/// `# -`, `# - text`, `# -(label) text`, `# -+ text`.
pub fn is_explanation_marker(text: &str) -> bool {
    match text.strip_prefix("# -") {
        Some(after) => after.is_empty() || after.starts_with([' ', '(', '+']),
        None => false,
    }
}

/// Spaces between the `#` and the text of an explanation line.
fn inner_indentation(text: &str) -> usize {
    let inner = &text[1..];
    inner.len() - inner.trim_start_matches(' ').len()
}

impl BlockParser<'_> {
    /// Fill the inner text of the verbatim or diagram node `id` and attach
    /// its explanations.
    pub(crate) fn capture_verbatim(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        id: NodeId,
        depth: usize,
    ) -> Result<(), ParseError> {
        if let Some(src) = ctx.doc.node(id).src.clone() {
            return self.load_verbatim(ctx, id, &src);
        }

        let base = ctx.doc.node(id).indentation;
        let mut captured = Vec::new();
        let mut explanations = Vec::new();
        let lines = self.paragraphs.lines_mut();

        while let Some(line) = lines.peek() {
            let line = match line {
                SourceLine::Blank { .. } => {
                    captured.push(Captured::Blank);
                    lines.advance();
                    continue;
                }
                SourceLine::Text(line) if line.indentation <= base => break,
                SourceLine::Text(line) => line,
            };
            lines.advance();

            if !is_explanation_marker(line.text) {
                captured.push(Captured::Content {
                    indentation: line.indentation,
                    body: line.body,
                });
                continue;
            }

            let marker_depth = inner_indentation(line.text);
            let mut text = line.text[1..].to_string();
            while let Some(SourceLine::Text(next)) = lines.peek() {
                let continues = next.indentation > base
                    && next.text.starts_with('#')
                    && !is_explanation_marker(next.text)
                    && (next.text == "#" || inner_indentation(next.text) > marker_depth);
                if !continues {
                    break;
                }
                text.push('\n');
                text.push_str(&next.text[1..]);
                lines.advance();
            }
            explanations.push(ExplanationSource {
                text,
                first_line: line.number,
                shift: line.indentation,
            });
        }

        ctx.doc.node_mut(id).inner_text = dedent(&captured);

        for source in &explanations {
            self.parse_explanation(ctx, id, source, depth)?;
        }
        Ok(())
    }

    fn load_verbatim(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        id: NodeId,
        src: &str,
    ) -> Result<(), ParseError> {
        let path = loader::resolve(&ctx.doc.files[self.file], src);
        let text = ctx.loader.load(&path).map_err(|err| ParseError::Include {
            path: path.display().to_string(),
            message: err.to_string(),
            location: ctx.doc.location(id),
        })?;
        log::debug!("{}: verbatim content from {}", ctx.doc.location(id), path.display());
        ctx.doc.node_mut(id).inner_text = text.trim_end().to_string();
        Ok(())
    }

    fn parse_explanation(
        &mut self,
        ctx: &mut DocumentContext<'_>,
        owner: NodeId,
        source: &ExplanationSource,
        depth: usize,
    ) -> Result<(), ParseError> {
        let lines = LineReader::with_offset(&source.text, source.first_line, source.shift);
        let mut sub = BlockParser::new(lines, self.file);

        let Some(para) = sub.paragraphs.read_from(0) else {
            return Ok(());
        };
        let mut node = build_node(&ctx.doc, self.file, &para)?;
        node.node_type = NodeType::Explanation;
        let item = ctx.doc.append(owner, node);
        register(&mut ctx.doc, item)?;

        while let Some(next) = sub.paragraphs.peek_indentation() {
            if next <= para.indentation {
                break;
            }
            sub.parse_children(ctx, item, depth + 1)?;
        }
        // Tabs inside explanations sit in verbatim text; no warning.
        sub.paragraphs.take_tab_warnings();
        Ok(())
    }
}

/// Join captured lines, dedented by their common indentation, without
/// trailing blank lines.
fn dedent(captured: &[Captured<'_>]) -> String {
    let min = captured
        .iter()
        .filter_map(|line| match line {
            Captured::Content { indentation, .. } => Some(*indentation),
            Captured::Blank => None,
        })
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = captured
        .iter()
        .map(|line| match line {
            Captured::Blank => String::new(),
            Captured::Content { indentation, body } => {
                format!("{}{body}", " ".repeat(indentation - min))
            }
        })
        .collect();
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
