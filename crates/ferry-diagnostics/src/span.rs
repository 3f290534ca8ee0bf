//! Source spans and resolved locations.

use serde::{Deserialize, Serialize};

/// Identifier of a source file registered in a [`crate::SourceCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// File id used by spans that do not point into any file.
    pub const DUMMY: FileId = FileId(u32::MAX);
}

/// Byte range inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub file_id: FileId,
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    pub const DUMMY: Span = Span {
        file_id: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    pub fn new(file_id: FileId, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end: end.max(start),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.file_id == FileId::DUMMY
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies completely inside this span.
    pub fn covers(&self, other: Span) -> bool {
        self.file_id == other.file_id && self.start <= other.start && other.end <= self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::DUMMY
    }
}

/// A span resolved to a path, line and column (both 1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A secondary location attached to a diagnostic.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new_clamps_end() {
        let span = Span::new(FileId(0), 10, 4);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 10);
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_covers() {
        let outer = Span::new(FileId(1), 0, 20);
        assert!(outer.covers(Span::new(FileId(1), 3, 9)));
        assert!(!outer.covers(Span::new(FileId(1), 15, 25)));
        assert!(!outer.covers(Span::new(FileId(2), 3, 9)));
    }

    #[test]
    fn test_location_display() {
        let loc = Location {
            file: "src/app.ts".to_string(),
            line: 3,
            column: 7,
        };
        assert_eq!(loc.to_string(), "src/app.ts:3:7");
    }
}
