use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::Location;

/// Index of a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Node discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The virtual root. Never rendered as a tag.
    Document,
    Section,
    Block,
    Verbatim,
    Diagram,
    /// Only exists while being resolved; never stored in the tree.
    Include,
    /// List item pulled out of a verbatim or diagram block.
    Explanation,
}

/// One element of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_type: NodeType,
    pub indentation: usize,
    /// 1-based line the node starts on.
    pub line: usize,
    /// Index into [`Document::files`].
    pub file: usize,
    /// Tag name (`p` for plain paragraphs).
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Space-joined class list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Numbering bucket from the `:name` shorthand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Explicit bullet number or label from the `=word` shorthand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Ordinal drawn from the node's bucket counter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<usize>,
    /// Standard `key="value"` attributes in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, String)>,
    /// Inline text after the tag (the whole text for plain paragraphs).
    pub rest: String,
    /// Captured raw content of verbatim and diagram nodes.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub inner_text: String,
    /// Dotted section number, e.g. `2.3.`; empty when unnumbered.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub outline: String,
    /// Nesting depth among sections.
    pub level: usize,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl Node {
    pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            node_type,
            indentation: 0,
            line: 0,
            file: 0,
            name: name.into(),
            id: None,
            class: None,
            src: None,
            href: None,
            bucket: None,
            number: None,
            ordinal: None,
            attrs: Vec::new(),
            rest: String::new(),
            inner_text: String::new(),
            outline: String::new(),
            level: 0,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
        }
    }

    /// Individual class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class.as_deref().unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Value of a standard attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_section(&self) -> bool {
        self.node_type == NodeType::Section
    }

    /// Sections with the id `abstract` are front matter and carry no number.
    pub fn is_abstract(&self) -> bool {
        self.is_section() && self.id.as_deref() == Some("abstract")
    }
}

/// A parsed document: an arena of nodes rooted at a virtual Document node,
/// plus the cross-reference table shared by every file it includes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub root: NodeId,
    /// File identities; index 0 is the top-level file.
    pub files: Vec<String>,
    /// Identifier → owning node.
    pub xref: BTreeMap<String, NodeId>,
    /// Bucket name → last ordinal handed out.
    pub buckets: BTreeMap<String, usize>,
    pub front_matter: Option<FrontMatter>,
}

impl Document {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(NodeType::Document, "")],
            root: NodeId(0),
            files: vec![file.into()],
            xref: BTreeMap::new(),
            buckets: BTreeMap::new(),
            front_matter: None,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.next_sibling = None;
        self.nodes.push(node);

        match self.nodes[parent.0].last_child {
            Some(prev) => self.nodes[prev.0].next_sibling = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        self.nodes[parent.0].last_child = Some(id);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Parent, grandparent, … up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Every node under `id` in document order (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut kids: Vec<NodeId> = self.children(next).collect();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// All sections in document order.
    pub fn sections(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.node(id).is_section())
            .collect()
    }

    /// Resolve an identifier through the cross-reference table.
    pub fn lookup(&self, id: &str) -> Option<&Node> {
        self.xref.get(id).map(|&n| self.node(n))
    }

    pub fn location(&self, id: NodeId) -> Location {
        let node = self.node(id);
        self.location_at(node.file, node.line, node.indentation + 1)
    }

    pub fn location_at(&self, file: usize, line: usize, column: usize) -> Location {
        let name = self.files.get(file).cloned().unwrap_or_default();
        Location::new(name, line, column)
    }

    pub(crate) fn add_file(&mut self, name: impl Into<String>) -> usize {
        self.files.push(name.into());
        self.files.len() - 1
    }

    /// `base` if unused, otherwise `base-LINE`, then `base-LINE-2`, …
    pub(crate) fn unique_id(&self, base: &str, line: usize) -> String {
        if !self.xref.contains_key(base) {
            return base.to_string();
        }
        let with_line = format!("{base}-{line}");
        if !self.xref.contains_key(&with_line) {
            return with_line;
        }
        (2..)
            .map(|k| format!("{with_line}-{k}"))
            .find(|candidate| !self.xref.contains_key(candidate))
            .unwrap_or(with_line)
    }

    /// The tree as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// YAML front matter fields.
///
/// Known fields are typed; unknown fields are captured in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Prefix section headings with their outline number (default: on).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<bool>,

    /// Path of a YAML bibliography, relative to the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bibliography: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(name: &str) -> Node {
        Node::new(NodeType::Block, name)
    }

    #[test]
    fn append_links_siblings_in_order() {
        let mut doc = Document::new("t.xdoc");
        let root = doc.root;
        let a = doc.append(root, block("p"));
        let b = doc.append(root, block("ul"));
        let c = doc.append(b, block("li"));

        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(doc.children(b).collect::<Vec<_>>(), vec![c]);
        assert_eq!(doc.parent(c), Some(b));
        assert_eq!(doc.ancestors(c).collect::<Vec<_>>(), vec![b, root]);
        assert_eq!(doc.descendants(root), vec![a, b, c]);
    }

    #[test]
    fn unique_id_appends_line_then_counter() {
        let mut doc = Document::new("t.xdoc");
        let root = doc.root;
        let n = doc.append(root, block("p"));
        doc.xref.insert("intro".into(), n);
        assert_eq!(doc.unique_id("other", 3), "other");
        assert_eq!(doc.unique_id("intro", 7), "intro-7");
        doc.xref.insert("intro-7".into(), n);
        assert_eq!(doc.unique_id("intro", 7), "intro-7-2");
    }

    #[test]
    fn classes_split_on_whitespace() {
        let mut node = block("div");
        node.class = Some("note  wide".into());
        assert!(node.has_class("wide"));
        assert!(!node.has_class("no"));
        assert_eq!(node.classes().collect::<Vec<_>>(), vec!["note", "wide"]);
    }

    #[test]
    fn front_matter_keeps_unknown_keys() {
        let fm: FrontMatter =
            serde_yaml::from_str("title: Spec\nnumbering: false\nrevision: 3\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Spec"));
        assert_eq!(fm.numbering, Some(false));
        assert!(fm.extra.contains_key("revision"));
    }
}
