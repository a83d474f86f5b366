//! Locations of nodes and matches in candidate sources.
//!
//! Positions follow Tree-sitter: lines and columns start at zero and columns
//! count bytes, not characters.

use serde::{Deserialize, Serialize};

/// Zero-based line and byte column.
///
/// ```
/// use sift_core::LineCol;
///
/// let at = LineCol::new(10, 4);
/// assert_eq!((at.line(), at.column()), (10, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineCol {
    /// Line, counted from zero.
    pub line: u32,
    /// Byte offset from the start of the line.
    pub column: u32,
}

impl LineCol {
    /// Builds a position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Line, counted from zero.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Byte column, counted from zero.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// The half-open byte range `start_byte..end_byte` of a node or match,
/// together with the positions of both ends.
///
/// ```
/// use sift_core::{LineCol, Span};
///
/// let span = Span::new(10, 42, LineCol::new(2, 0), LineCol::new(4, 0));
/// assert_eq!(span.len(), 32);
/// assert!(!span.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First byte of the range.
    pub start_byte: u32,
    /// One past the last byte of the range.
    pub end_byte: u32,
    /// Position of `start_byte`.
    pub start: LineCol,
    /// Position of `end_byte`.
    pub end: LineCol,
}

impl Span {
    /// Builds a span from its byte bounds and their positions.
    #[must_use]
    pub const fn new(start_byte: u32, end_byte: u32, start: LineCol, end: LineCol) -> Self {
        Self {
            start_byte,
            end_byte,
            start,
            end,
        }
    }

    /// First byte of the range.
    #[must_use]
    pub const fn start_byte(&self) -> u32 {
        self.start_byte
    }

    /// One past the last byte of the range.
    #[must_use]
    pub const fn end_byte(&self) -> u32 {
        self.end_byte
    }

    /// Where the span begins.
    #[must_use]
    pub const fn start(&self) -> &LineCol {
        &self.start
    }

    /// Where the span ends.
    #[must_use]
    pub const fn end(&self) -> &LineCol {
        &self.end
    }

    /// Width in bytes.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end_byte.saturating_sub(self.start_byte)
    }

    /// Whether the span covers no bytes, as for a missing node.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
