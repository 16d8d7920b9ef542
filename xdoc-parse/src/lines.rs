//! Line tokenizer.
//!
//! Splits source text into indentation + content pairs. Lookahead is a
//! cursor (`peek` / `advance`), so there is never more than one line of
//! lookahead and nothing to push back.

/// A non-blank source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Count of leading space characters (plus any include shift).
    pub indentation: usize,
    /// 1-based line number.
    pub number: usize,
    /// Content with all surrounding whitespace removed.
    pub text: &'a str,
    /// Content after the leading spaces, trailing whitespace removed.
    /// Verbatim blocks rebuild their lines from this.
    pub body: &'a str,
    /// 1-based column of a tab found in the leading whitespace.
    pub tab_column: Option<usize>,
}

/// What the reader yields: blank lines are reported as absent content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLine<'a> {
    Blank { number: usize },
    Text(Line<'a>),
}

impl SourceLine<'_> {
    pub fn number(&self) -> usize {
        match self {
            SourceLine::Blank { number } => *number,
            SourceLine::Text(line) => line.number,
        }
    }
}

/// Cursor over the lines of one source text.
#[derive(Debug, Clone)]
pub struct LineReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    first_number: usize,
    shift: usize,
}

impl<'a> LineReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_offset(source, 1, 0)
    }

    /// `first_number` is the line number of the first line of `source`;
    /// `shift` is added to every line's indentation (used for includes).
    pub fn with_offset(source: &'a str, first_number: usize, shift: usize) -> Self {
        Self {
            lines: source.lines().collect(),
            pos: 0,
            first_number,
            shift,
        }
    }

    /// The next line, without consuming it.
    pub fn peek(&self) -> Option<SourceLine<'a>> {
        self.nth_ahead(0)
    }

    /// The line `n` positions past the cursor, without consuming anything.
    pub fn nth_ahead(&self, n: usize) -> Option<SourceLine<'a>> {
        let idx = self.pos + n;
        self.lines
            .get(idx)
            .map(|raw| classify(raw, self.first_number + idx, self.shift))
    }

    /// Consume the line under the cursor.
    pub fn advance(&mut self) {
        if self.pos < self.lines.len() {
            self.pos += 1;
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.lines.len()
    }
}

impl<'a> Iterator for LineReader<'a> {
    type Item = SourceLine<'a>;

    fn next(&mut self) -> Option<SourceLine<'a>> {
        let line = self.peek()?;
        self.advance();
        Some(line)
    }
}

/// Classify one raw line. Only space characters count toward indentation;
/// a tab ends the indentation run.
pub fn classify(raw: &str, number: usize, shift: usize) -> SourceLine<'_> {
    let raw = raw.trim_end();
    if raw.trim().is_empty() {
        return SourceLine::Blank { number };
    }
    let body = raw.trim_start_matches(' ');
    let spaces = raw.len() - body.len();
    let tab_column = body
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .find(|(_, c)| *c == '\t')
        .map(|(i, _)| spaces + body[..i].chars().count() + 1);

    SourceLine::Text(Line {
        indentation: spaces + shift,
        number,
        text: body.trim(),
        body,
        tab_column,
    })
}
