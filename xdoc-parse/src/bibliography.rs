//! Bibliography entries and the reference list rendered after a document.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use crate::html::escape_html;

/// One bibliography entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Citation {
    pub title: String,
    #[serde(alias = "author")]
    pub authors: Vec<String>,
    /// Kept as text so `2019`, `"2019"` and `n.d.` all load.
    #[serde(deserialize_with = "scalar_text")]
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub url: Option<String>,
}

fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Bibliography key → entry.
pub trait CitationLookup {
    fn citation(&self, key: &str) -> Option<&Citation>;
}

impl CitationLookup for BTreeMap<String, Citation> {
    fn citation(&self, key: &str) -> Option<&Citation> {
        self.get(key)
    }
}

impl CitationLookup for HashMap<String, Citation> {
    fn citation(&self, key: &str) -> Option<&Citation> {
        self.get(key)
    }
}

/// Empty bibliography.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCitations;

impl CitationLookup for NoCitations {
    fn citation(&self, _key: &str) -> Option<&Citation> {
        None
    }
}

/// Decode a YAML mapping of key → entry.
pub fn parse_bibliography(yaml: &str) -> Result<BTreeMap<String, Citation>, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(yaml)
}

/// The reference list for `cited` keys, in citation order. Keys the lookup
/// does not know are left out. Empty when nothing remains.
pub fn render_bibliography(cited: &[String], lookup: &dyn CitationLookup) -> String {
    let entries: Vec<(&String, &Citation)> = cited
        .iter()
        .filter_map(|key| lookup.citation(key).map(|c| (key, c)))
        .collect();
    if entries.is_empty() {
        return String::new();
    }

    let mut html = String::from(
        "<section id=\"bibliography\" class=\"bibliography\">\n<h2>References</h2>\n<dl>\n",
    );
    for (key, citation) in entries {
        let key = escape_html(key);
        html.push_str(&format!(
            "<dt id=\"bib-{key}\">[{key}]</dt>\n<dd>{}</dd>\n",
            describe(citation)
        ));
    }
    html.push_str("</dl>\n</section>\n");
    html
}

fn describe(citation: &Citation) -> String {
    let mut parts = Vec::new();
    if !citation.authors.is_empty() {
        parts.push(escape_html(&citation.authors.join(", ")));
    }
    if !citation.title.is_empty() {
        parts.push(format!("<i>{}</i>", escape_html(&citation.title)));
    }
    let imprint: Vec<&str> = [citation.publisher.as_deref(), citation.year.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !imprint.is_empty() {
        parts.push(escape_html(&imprint.join(", ")));
    }
    let mut text = parts.join(". ");
    if !text.is_empty() {
        text.push('.');
    }
    if let Some(url) = &citation.url {
        let url = escape_html(url);
        text.push_str(&format!(" <a href=\"{url}\">{url}</a>"));
    }
    text.trim_start().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const YAML: &str = r#"
knuth84:
  title: Literate Programming
  authors: [Donald Knuth]
  year: 1984
  publisher: The Computer Journal
rfc2119:
  title: Key words for use in RFCs
  author: [S. Bradner]
  year: "1997"
  url: https://www.rfc-editor.org/rfc/rfc2119
"#;

    #[test]
    fn loads_numeric_and_text_years() {
        let bib = parse_bibliography(YAML).unwrap();
        assert_eq!(bib["knuth84"].year.as_deref(), Some("1984"));
        assert_eq!(bib["rfc2119"].year.as_deref(), Some("1997"));
        assert_eq!(bib["rfc2119"].authors, vec!["S. Bradner"]);
        assert!(parse_bibliography("  \n").unwrap().is_empty());
    }

    #[test]
    fn lists_only_cited_known_entries_in_order() {
        let bib = parse_bibliography(YAML).unwrap();
        let cited = vec!["rfc2119".to_string(), "missing".to_string(), "knuth84".to_string()];
        let html = render_bibliography(&cited, &bib);
        let rfc = html.find("bib-rfc2119").unwrap();
        let knuth = html.find("bib-knuth84").unwrap();
        assert!(rfc < knuth);
        assert!(!html.contains("missing"));
        assert!(html.contains(
            "<dd>Donald Knuth. <i>Literate Programming</i>. The Computer Journal, 1984.</dd>"
        ));
    }

    #[test]
    fn nothing_cited_renders_nothing() {
        assert_eq!(render_bibliography(&[], &NoCitations), "");
        assert_eq!(render_bibliography(&["x".to_string()], &NoCitations), "");
    }
}
