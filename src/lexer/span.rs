use std::fmt;

/// A location in the source file: a line, a column (both 1-based), and a
/// length in bytes. Every token and every AST node carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub len: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, len: usize) -> Self {
        Self { line, col, len }
    }

    /// Span covering from the start of `self` to the end of `other`, used when
    /// building a composite node (e.g. a binary expression) out of two
    /// sub-spans that may not be adjacent.
    pub fn to(&self, other: Span) -> Span {
        Span {
            line: self.line,
            col: self.col,
            len: (other.col + other.len).saturating_sub(self.col).max(self.len),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
