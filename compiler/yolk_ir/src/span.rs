//! Source positions.

use std::fmt;

/// Line/column position of a node in its source file.
///
/// Both coordinates are 1-based. `Span::DUMMY` (0:0) marks synthesized nodes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    /// Position used for nodes that have no source location.
    pub const DUMMY: Span = Span { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }

    /// Check if this span is the dummy span.
    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 14).to_string(), "3:14");
    }

    #[test]
    fn test_dummy_span() {
        assert!(Span::DUMMY.is_dummy());
        assert!(Span::default().is_dummy());
        assert!(!Span::new(1, 1).is_dummy());
    }
}
