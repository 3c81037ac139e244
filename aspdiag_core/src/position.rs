use std::fmt::{self, Display, Formatter};
use std::ops::Range;
use chumsky::span::Span as ChumskySpan;
use miette::SourceSpan;

/// A location in a source file, as reported by the lexer or evaluator.
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub filename: String,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(filename: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }

    /// Same file and same line, regardless of column.
    pub fn same_line(&self, other: &Position) -> bool {
        self.line == other.line && self.filename == other.filename
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Byte range into a single source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> usize {
        self.start
    }

    pub fn end(self) -> usize {
        self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

// for chumsky's usage
impl ChumskySpan for Span {
    type Context = ();
    type Offset = usize;

    fn new(_context: Self::Context, range: Range<Self::Offset>) -> Self {
        range.into()
    }

    fn context(&self) -> Self::Context {}

    fn start(&self) -> Self::Offset {
        self.start
    }

    fn end(&self) -> Self::Offset {
        self.end
    }
}

// for miette's usage
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        // SourceSpan in miette are made with "start" and "length"
        Self::new(span.start.into(), span.end.saturating_sub(span.start))
    }
}

/// Maps byte offsets of one file onto line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    filename: String,
    /// Byte offset at which each line starts. Always starts with 0.
    line_starts: Vec<usize>,
    source: String,
}

impl LineIndex {
    pub fn new(filename: impl Into<String>, source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            filename: filename.into(),
            line_starts,
            source: source.to_string(),
        }
    }

    /// Position of the byte at `offset`. Columns count characters, not bytes.
    /// Offsets past the end clamp to the end of the buffer.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - start);
        Position::new(self.filename.clone(), line + 1, column + 1)
    }

    pub fn span_start(&self, span: Span) -> Position {
        self.position(span.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("BUILD", "ab\ncd\n\nef");
        assert_eq!(index.position(0), Position::new("BUILD", 1, 1));
        assert_eq!(index.position(1), Position::new("BUILD", 1, 2));
        assert_eq!(index.position(3), Position::new("BUILD", 2, 1));
        assert_eq!(index.position(6), Position::new("BUILD", 3, 1));
        assert_eq!(index.position(8), Position::new("BUILD", 4, 2));
        // clamps
        assert_eq!(index.position(100), Position::new("BUILD", 4, 3));
    }

    #[test]
    fn test_columns_count_chars() {
        let index = LineIndex::new("BUILD", "é(x");
        // 'é' is two bytes wide
        assert_eq!(index.position(2), Position::new("BUILD", 1, 2));
    }

    #[test]
    fn test_position_display_and_same_line() {
        let a = Position::new("pkg/BUILD", 3, 7);
        let b = Position::new("pkg/BUILD", 3, 1);
        let c = Position::new("other/BUILD", 3, 7);
        assert_eq!(a.to_string(), "pkg/BUILD:3:7");
        assert!(a.same_line(&b));
        assert!(!a.same_line(&c));
    }

    #[test]
    fn test_span_into_source_span() {
        let source: SourceSpan = Span::from(4..12).into();
        assert_eq!(source.offset(), 4);
        assert_eq!(source.len(), 8);
        let joined = <Span as ChumskySpan>::new((), 10..12);
        assert_eq!((joined.start(), joined.end()), (10, 12));
    }
}
