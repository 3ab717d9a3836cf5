//! Source location tracking threaded through every AST and IR layer.
//!
//! Mirrors `parse::CodeRange`: a byte range plus the line/column pair
//! needed to render a diagnostic without re-lexing the source.

use std::fmt;

use ruff_text_size::{Ranged, TextRange, TextSize};

/// A 1-indexed line/column position within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, serde::Serialize, serde::Deserialize)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source span: a byte range plus its resolved start/end line/column.
///
/// Every untyped AST node, typed AST node, and `Diagnostic` carries one of
/// these. IR nodes do not: the IR is an optimization/execution target with
/// no source-level meaning of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: CodeLoc,
    pub end: CodeLoc,
    byte_range: (u32, u32),
}

impl Span {
    #[must_use]
    pub const fn new(start: CodeLoc, end: CodeLoc, byte_range: TextRangeParts) -> Self {
        Self {
            start,
            end,
            byte_range: (byte_range.0, byte_range.1),
        }
    }

    /// A placeholder span for synthetic nodes that code-gen introduces
    /// (e.g. default-value substitutions) and that never reach a diagnostic.
    #[must_use]
    pub const fn synthetic() -> Self {
        Self {
            start: CodeLoc { line: 0, column: 0 },
            end: CodeLoc { line: 0, column: 0 },
            byte_range: (0, 0),
        }
    }

    #[must_use]
    pub fn byte_range(&self) -> TextRange {
        TextRange::new(TextSize::from(self.byte_range.0), TextSize::from(self.byte_range.1))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A thin alias used only to keep `Span::new`'s call sites readable.
pub type TextRangeParts = (u32, u32);

/// Resolves byte offsets to 1-indexed line/column pairs for a single source file.
///
/// Built once per compilation from the raw source text; cheap to construct,
/// since the front end already pages through the text once while lexing.
pub struct LineIndex {
    /// Byte offset of the start of each line (line 0 at offset 0).
    line_starts: Vec<u32>,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                let next = offset as u32 + 1;
                line_starts.push(next);
            }
        }
        Self { line_starts }
    }

    #[must_use]
    pub fn loc(&self, offset: TextSize) -> CodeLoc {
        let offset: u32 = offset.into();
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        CodeLoc {
            line: line_idx as u32 + 1,
            column: offset - line_start + 1,
        }
    }

    #[must_use]
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.loc(range.start()), self.loc(range.end()), (range.start().into(), range.end().into()))
    }

    #[must_use]
    pub fn span_of(&self, node: &impl Ranged) -> Span {
        self.span(node.range())
    }

    /// Returns the full text of the line containing `loc`, for diagnostic rendering.
    #[must_use]
    pub fn line_text<'a>(&self, source: &'a str, loc: CodeLoc) -> &'a str {
        let idx = loc.line as usize - 1;
        let start = self.line_starts.get(idx).copied().unwrap_or(0) as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(source.len(), |&s| s as usize);
        source[start..end].trim_end_matches(['\n', '\r'])
    }
}
