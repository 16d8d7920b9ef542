//! WASM bindings for `xdoc-parse`.
//!
//! Exposes the xdoc parser to JavaScript via wasm-bindgen. There is no file
//! system in the browser, so `<x-include>` and `@src` verbatim blocks fail
//! with an include error.

use wasm_bindgen::prelude::*;
use xdoc_parse::{MemoryLoader, ParseError, Parsed, Parser};

const FILE: &str = "input.xdoc";

fn parse_input(input: &str) -> Result<Parsed, ParseError> {
    let loader = MemoryLoader::new();
    Parser::new(FILE).with_loader(&loader).parse(input)
}

fn error_json(err: &ParseError) -> serde_json::Value {
    serde_json::json!({
        "error": err.to_string(),
        "location": err.location(),
    })
}

/// Parse an xdoc string and return the document as a JSON AST.
///
/// Returns `{ doc, diagnostics }` on success and `{ error, location }` when
/// the document is structurally invalid.
#[wasm_bindgen]
pub fn parse(input: &str) -> String {
    match parse_input(input) {
        Ok(parsed) => serde_json::json!({
            "doc": parsed.doc,
            "diagnostics": parsed.diagnostics,
        }),
        Err(err) => error_json(&err),
    }
    .to_string()
}

/// Same as [`parse`], as a JavaScript object instead of a JSON string.
#[wasm_bindgen(js_name = parseValue)]
pub fn parse_value(input: &str) -> Result<JsValue, JsValue> {
    let parsed = parse_input(input).map_err(|err| JsValue::from_str(&err.to_string()))?;
    serde_wasm_bindgen::to_value(&parsed.doc).map_err(JsValue::from)
}

/// Parse an xdoc string and return an HTML fragment. A structural error is
/// rendered as a `<pre class="xdoc-error">` block.
#[wasm_bindgen]
pub fn render_html(input: &str) -> String {
    match parse_input(input) {
        Ok(parsed) => parsed.doc.to_html(),
        Err(err) => error_html(&err),
    }
}

/// Parse an xdoc string and return a complete styled HTML page.
#[wasm_bindgen]
pub fn render_html_page(input: &str, title: Option<String>) -> String {
    match parse_input(input) {
        Ok(parsed) => {
            let config = xdoc_parse::PageConfig {
                title,
                ..Default::default()
            };
            parsed.doc.to_html_page(&config)
        }
        Err(err) => error_html(&err),
    }
}

/// Parse and render an xdoc string and return every diagnostic as JSON.
///
/// A structural error is reported as a single `error` diagnostic.
#[wasm_bindgen]
pub fn check(input: &str) -> String {
    let all = match parse_input(input) {
        Ok(parsed) => {
            let mut all = parsed.diagnostics;
            all.extend(parsed.doc.render().diagnostics);
            all
        }
        Err(err) => vec![xdoc_parse::Diagnostic {
            severity: xdoc_parse::Severity::Error,
            message: err.to_string(),
            location: Some(err.location().clone()),
            code: None,
        }],
    };
    serde_json::to_string(&all).unwrap_or_else(|_| "[]".to_string())
}

fn error_html(err: &ParseError) -> String {
    format!(
        "<pre class=\"xdoc-error\">{}</pre>",
        xdoc_parse::html::escape_html(&err.to_string())
    )
}
