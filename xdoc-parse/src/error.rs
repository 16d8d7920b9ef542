use std::fmt;

use serde::{Deserialize, Serialize};

/// A position inside one of the files taking part in a parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File identity as given to the parser (or resolved for an include).
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Structural errors. Any of these aborts the parse of the whole top-level
/// document, including when raised from inside an included file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{location}: malformed tag: {message}")]
    Syntax { message: String, location: Location },

    #[error("{location}: duplicate identifier '{id}' (first defined at {first})")]
    DuplicateId {
        id: String,
        location: Location,
        first: Location,
    },

    #[error("{location}: <section> cannot be nested inside <{parent}>")]
    SectionPlacement { parent: String, location: Location },

    #[error("{location}: indented block has no preceding element to nest under")]
    NothingToNest { location: Location },

    #[error("{location}: document must start at indentation {expected}, found {found}")]
    RootIndentation {
        expected: usize,
        found: usize,
        location: Location,
    },

    #[error("{location}: blocks nested deeper than {limit} levels")]
    TooDeep { limit: usize, location: Location },

    #[error("{location}: invalid front matter: {message}")]
    FrontMatter { message: String, location: Location },

    #[error("{location}: cannot include '{path}': {message}")]
    Include {
        path: String,
        message: String,
        location: Location,
    },

    #[error("{location}: '{path}' includes itself")]
    IncludeCycle { path: String, location: Location },
}

impl ParseError {
    /// Where the error was detected.
    pub fn location(&self) -> &Location {
        match self {
            ParseError::Syntax { location, .. }
            | ParseError::DuplicateId { location, .. }
            | ParseError::SectionPlacement { location, .. }
            | ParseError::NothingToNest { location }
            | ParseError::RootIndentation { location, .. }
            | ParseError::TooDeep { location, .. }
            | ParseError::FrontMatter { location, .. }
            | ParseError::Include { location, .. }
            | ParseError::IncludeCycle { location, .. } => location,
        }
    }

    /// The error text without its location prefix.
    pub fn message(&self) -> String {
        let full = self.to_string();
        let prefix = format!("{}: ", self.location());
        match full.strip_prefix(&prefix) {
            Some(message) => message.to_string(),
            None => full,
        }
    }
}

/// A diagnostic message produced during parsing or rendering.
///
/// Diagnostics are non-fatal: work continues and the diagnostic is handed
/// back next to the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: Some(location),
            code: Some(code.to_string()),
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Tab character in leading whitespace.
pub const W_TAB_INDENT: &str = "W001";
/// An `x-include` produced no content.
pub const W_EMPTY_INCLUDE: &str = "W002";
/// `<x-ref>` target not found.
pub const W_XREF_MISSING: &str = "W010";
/// `[[KEY]]` not found in the bibliography.
pub const W_CITE_MISSING: &str = "W011";
/// Diagram renderer failed; source shown instead.
pub const W_DIAGRAM_FAILED: &str = "W020";
