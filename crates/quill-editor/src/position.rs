//! Cursor position type.
//!
//! All coordinates are **0-indexed** and columns are **raw byte offsets** into
//! a row, never render columns. The line may equal the buffer's row count:
//! that is the virtual empty row below the last line, where typing appends a
//! new row.
//!
//! The status bar converts to 1-indexed for display; that conversion never
//! belongs here.

use std::fmt;

/// A position in a buffer: (line, raw column).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// Line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}
