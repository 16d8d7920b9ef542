//! Paragraph → node classification, identifier assignment and bucket
//! numbering.

use crate::error::ParseError;
use crate::html::is_inline;
use crate::paragraph::Paragraph;
use crate::tagspec::{parse_tag, tag_name};
use crate::types::{Document, Node, NodeId, NodeType};

/// Node type selected by a tag name.
pub fn node_type_for(name: &str) -> NodeType {
    match name {
        "section" => NodeType::Section,
        "x-diagram" => NodeType::Diagram,
        "x-code" | "x-example" | "pre" => NodeType::Verbatim,
        "x-include" => NodeType::Include,
        _ => NodeType::Block,
    }
}

/// Build an unattached node from a paragraph.
///
/// `file` is the index of the paragraph's file in `doc.files`; it is only
/// used to locate syntax errors.
pub fn build_node(doc: &Document, file: usize, para: &Paragraph) -> Result<Node, ParseError> {
    let text = para.text.as_str();
    let mut node = if !text.starts_with('<') || text.chars().count() < 3 {
        plain(text)
    } else {
        match tag_name(text) {
            Some(name) if is_inline(name) => plain(text),
            Some(_) => tagged(doc, file, para)?,
            None => {
                let next = text[1..].chars().next();
                if next.is_some_and(|c| c.is_whitespace() || c == '>') {
                    return Err(ParseError::Syntax {
                        message: "missing tag name".to_string(),
                        location: doc.location_at(file, para.line, para.indentation + 2),
                    });
                }
                // `<3`, `<!--`, `<=`: not a tag at all.
                plain(text)
            }
        }
    };
    node.indentation = para.indentation;
    node.line = para.line;
    node.file = file;
    Ok(node)
}

fn plain(text: &str) -> Node {
    let mut node = Node::new(NodeType::Block, "p");
    node.rest = text.to_string();
    node
}

fn tagged(doc: &Document, file: usize, para: &Paragraph) -> Result<Node, ParseError> {
    let spec = parse_tag(&para.text).map_err(|err| ParseError::Syntax {
        message: err.message,
        location: doc.location_at(file, para.line, para.indentation + err.offset + 1),
    })?;

    let node_type = node_type_for(&spec.name);
    if node_type == NodeType::Include && spec.src.is_none() {
        return Err(ParseError::Syntax {
            message: "<x-include> needs a source path (@path or src=)".to_string(),
            location: doc.location_at(file, para.line, para.indentation + 1),
        });
    }

    let class = spec.class();
    let mut node = Node::new(node_type, spec.name);
    node.id = spec.id.filter(|id| !id.is_empty());
    node.class = class;
    node.src = spec.src;
    node.href = spec.href;
    node.bucket = spec.bucket;
    node.number = spec.number;
    node.attrs = spec.attrs;
    node.rest = spec.rest;
    Ok(node)
}

/// Identifier slug of some inline text: markup stripped, lowercase,
/// everything that is not alphanumeric collapsed into single dashes.
pub fn slug(text: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    let mut dash = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_alphanumeric() => {
                if dash && !out.is_empty() {
                    out.push('-');
                }
                dash = false;
                out.extend(c.to_lowercase());
            }
            _ => dash = true,
        }
    }
    out
}

/// Base for an automatically generated identifier, for the tags that get
/// one.
fn auto_id_base(node: &Node) -> Option<String> {
    match node.name.as_str() {
        "section" | "dt" | "x-dt" => {
            let base = slug(&node.rest);
            Some(if base.is_empty() {
                format!("{}-{}", node.name, node.line)
            } else {
                base
            })
        }
        "li" => Some(
            node.number
                .clone()
                .unwrap_or_else(|| format!("li-{}", node.line)),
        ),
        _ => None,
    }
}

/// Numbering bucket a node draws its ordinal from, if it is numbered.
pub fn bucket_for(node: &Node) -> Option<&str> {
    node.id.as_ref()?;
    if let Some(bucket) = node.bucket.as_deref() {
        return Some(bucket);
    }
    match node.name.as_str() {
        "x-diagram" | "x-img" => Some("figure"),
        "x-example" => Some("example"),
        "table" => Some("table"),
        _ => None,
    }
}

/// Give an appended node its identifier and ordinal and enter it in the
/// cross-reference table.
///
/// Explicit identifiers must be unique. Generated ones are disambiguated
/// with the line number instead.
pub(crate) fn register(doc: &mut Document, id: NodeId) -> Result<(), ParseError> {
    let node = doc.node(id);
    let ident = match &node.id {
        Some(explicit) => {
            if let Some(&first) = doc.xref.get(explicit) {
                return Err(ParseError::DuplicateId {
                    id: explicit.clone(),
                    location: doc.location(id),
                    first: doc.location(first),
                });
            }
            explicit.clone()
        }
        None => match auto_id_base(node) {
            Some(base) => doc.unique_id(&base, node.line),
            None => return Ok(()),
        },
    };

    doc.xref.insert(ident.clone(), id);
    doc.node_mut(id).id = Some(ident);

    if let Some(bucket) = bucket_for(doc.node(id)).map(str::to_string) {
        let counter = doc.buckets.entry(bucket.clone()).or_insert(0);
        *counter += 1;
        let ordinal = *counter;
        log::debug!("{} numbered {bucket} {ordinal}", doc.location(id));
        doc.node_mut(id).ordinal = Some(ordinal);
    }
    Ok(())
}
