//! Paragraph assembly on top of [`LineReader`].

use crate::lines::{Line, LineReader, SourceLine};
use crate::preprocess::{self, ParagraphKind};

/// Contiguous lines at one indentation, already preprocessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub indentation: usize,
    /// Line number of the first line.
    pub line: usize,
    pub text: String,
    pub kind: ParagraphKind,
}

/// Groups lines into paragraphs, with one paragraph of lookahead.
#[derive(Debug)]
pub struct ParagraphReader<'a> {
    lines: LineReader<'a>,
    peeked: Option<Paragraph>,
    tabs: Vec<(usize, usize)>,
}

impl<'a> ParagraphReader<'a> {
    pub fn new(lines: LineReader<'a>) -> Self {
        Self {
            lines,
            peeked: None,
            tabs: Vec::new(),
        }
    }

    /// The next paragraph, without consuming it.
    pub fn peek(&mut self) -> Option<&Paragraph> {
        if self.peeked.is_none() {
            self.peeked = self.assemble();
        }
        self.peeked.as_ref()
    }

    pub fn peek_indentation(&mut self) -> Option<usize> {
        self.peek().map(|p| p.indentation)
    }

    /// Strict read: the next paragraph only if it sits at exactly
    /// `indentation`.
    pub fn read_at(&mut self, indentation: usize) -> Option<Paragraph> {
        match self.peek_indentation() {
            Some(found) if found == indentation => self.peeked.take(),
            _ => None,
        }
    }

    /// Lenient read: the next paragraph if it sits at `floor` or deeper.
    pub fn read_from(&mut self, floor: usize) -> Option<Paragraph> {
        match self.peek_indentation() {
            Some(found) if found >= floor => self.peeked.take(),
            _ => None,
        }
    }

    /// First content line ahead of the cursor, skipping blank and comment
    /// lines. Looks at raw lines, so it sees past nothing that is buffered.
    pub fn peek_first_line(&self) -> Option<Line<'a>> {
        (0..).map_while(|n| self.lines.nth_ahead(n)).find_map(|line| match line {
            SourceLine::Text(l) if !preprocess::is_discarded(l.text) => Some(l),
            _ => None,
        })
    }

    /// Raw line access for verbatim capture. Only valid between paragraphs.
    pub fn lines_mut(&mut self) -> &mut LineReader<'a> {
        debug_assert!(
            self.peeked.is_none(),
            "raw line access while a paragraph is buffered"
        );
        &mut self.lines
    }

    /// `(line, column)` of every tab seen in leading whitespace so far.
    pub fn take_tab_warnings(&mut self) -> Vec<(usize, usize)> {
        std::mem::take(&mut self.tabs)
    }

    fn note_tab(&mut self, line: &Line<'_>) {
        if let Some(column) = line.tab_column {
            self.tabs.push((line.number, column));
        }
    }

    fn assemble(&mut self) -> Option<Paragraph> {
        let first = self.peek_first_line()?;
        // Skip the blank and comment lines peek_first_line looked past.
        while self.lines.peek().map(|l| l.number()) != Some(first.number) {
            self.lines.advance();
        }
        self.lines.advance();
        self.note_tab(&first);

        let (mut text, kind) = preprocess::rewrite_first_line(first.text);

        if kind != ParagraphKind::Heading {
            while let Some(SourceLine::Text(line)) = self.lines.peek() {
                if line.indentation != first.indentation {
                    break;
                }
                if preprocess::is_discarded(line.text) {
                    self.lines.advance();
                    continue;
                }
                if preprocess::starts_paragraph(line.text) {
                    break;
                }
                self.note_tab(&line);
                text.push('\n');
                text.push_str(line.text);
                self.lines.advance();
            }
        }

        Some(Paragraph {
            indentation: first.indentation,
            line: first.number,
            text: preprocess::inline(&text),
            kind,
        })
    }
}
