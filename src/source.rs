use std::fmt;
use std::ops::Range;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)] // Default for convenience
pub struct Span {
    pub start: usize, // Byte offset
    pub end: usize,   // Byte offset (exclusive)
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    // Helper to merge two spans (e.g., an opening paren and its closer)
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Moves the span right by `offset` bytes, used when a slice of the
    /// input is tokenized on its own.
    pub fn shift(self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }

    pub fn to_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_shift() {
        let open = Span::new(3, 4);
        let close = Span::new(10, 11);
        assert_eq!(open.merge(close), Span::new(3, 11));
        assert_eq!(close.merge(open), Span::new(3, 11));
        assert_eq!(open.shift(5), Span::new(8, 9));
        assert_eq!(Span::new(2, 6).to_range(), 2..6);
    }
}
