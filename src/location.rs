//! Source location utilities.

use saphyr_parser::{Marker, Span as ParserSpan};

/// A byte span within the source YAML document.
///
/// Byte offsets are only known when parsing from string input; the parser
/// reports character indices otherwise. `(0, 0)` means unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub(crate) byte_offset: u32,
    pub(crate) byte_len: u32,
}

impl Span {
    /// Sentinel span meaning "unknown".
    pub const UNKNOWN: Self = Self {
        byte_offset: 0,
        byte_len: 0,
    };

    /// Returns the byte offset within the source YAML document.
    /// Returns `None` if byte info is unavailable.
    #[inline]
    pub fn byte_offset(&self) -> Option<usize> {
        if *self == Span::UNKNOWN {
            None
        } else {
            Some(self.byte_offset as usize)
        }
    }

    /// Returns the byte length within the source YAML document.
    #[inline]
    pub fn byte_len(&self) -> Option<usize> {
        if *self == Span::UNKNOWN {
            None
        } else {
            Some(self.byte_len as usize)
        }
    }
}

/// Row/column location within the source YAML document (1-indexed, character-based).
///
/// # Example
///
/// ```
/// let err = yaml_anchor_codec::parse("a: *missing\n").unwrap_err();
/// let loc = err.location().expect("alias position is known");
/// assert_eq!(loc.line(), 1);
/// assert_eq!(loc.column(), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-indexed row number in the input stream.
    pub(crate) line: u32,
    /// 1-indexed column number in the input stream.
    pub(crate) column: u32,
    pub(crate) span: Span,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    pub const UNKNOWN: Self = Self {
        line: 0,
        column: 0,
        span: Span::UNKNOWN,
    };

    /// 1-indexed line.
    #[inline]
    pub fn line(&self) -> u64 {
        self.line as u64
    }

    /// 1-indexed column, counted in characters.
    #[inline]
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    /// Byte span, when known.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Create a new location record.
    ///
    /// Arguments:
    /// - `line`: 1-indexed line.
    /// - `column`: 1-indexed column.
    pub(crate) const fn new(line: usize, column: usize) -> Self {
        // 4 Gb is larger than any YAML document we expect, and this is
        // error reporting only.
        Self {
            line: line as u32,
            column: column as u32,
            span: Span::UNKNOWN,
        }
    }

    pub(crate) const fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Location of a single parser marker (zero-length span).
pub(crate) fn location_from_marker(marker: &Marker) -> Location {
    let span = match marker.byte_offset() {
        Some(offset) if offset <= u32::MAX as usize => Span {
            byte_offset: offset as u32,
            byte_len: 0,
        },
        _ => Span::UNKNOWN,
    };
    Location::new(marker.line(), marker.col() + 1).with_span(span)
}

/// Convert a `saphyr_parser::Span` to a 1-indexed [`Location`].
///
/// Called by:
/// - The live events adapter for each raw parser event.
pub(crate) fn location_from_span(span: &ParserSpan) -> Location {
    let start = &span.start;
    let end = &span.end;

    let byte_info = match (start.byte_offset(), end.byte_offset()) {
        (Some(start_byte), Some(end_byte)) => {
            let len = end_byte.saturating_sub(start_byte);
            // Beyond 4 GiB the byte info is simply marked unavailable.
            if start_byte > (u32::MAX as usize) || len > (u32::MAX as usize) {
                Span::UNKNOWN
            } else {
                Span {
                    byte_offset: start_byte as u32,
                    byte_len: len as u32,
                }
            }
        }
        _ => Span::UNKNOWN,
    };

    Location::new(start.line(), start.col() + 1).with_span(byte_info)
}
