//! Source texts kept around for rendering diagnostics.

use crate::span::{FileId, Location, Span};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Byte offsets at which each line of `source` starts.
pub fn line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0];
    starts.extend(
        source
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .map(|(i, _)| (i + 1) as u32),
    );
    starts
}

/// 1-based line and column of `offset` given a table from [`line_starts`].
pub fn line_column(starts: &[u32], offset: u32) -> (u32, u32) {
    let idx = match starts.binary_search(&offset) {
        Ok(idx) => idx,
        Err(idx) => idx.saturating_sub(1),
    };
    let line_start = starts.get(idx).copied().unwrap_or(0);
    ((idx + 1) as u32, offset.saturating_sub(line_start) + 1)
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub source: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(id: FileId, path: PathBuf, source: String) -> Self {
        let line_starts = line_starts(&source);
        Self {
            id,
            path,
            source,
            line_starts,
        }
    }

    pub fn line_column(&self, offset: u32) -> (u32, u32) {
        line_column(&self.line_starts, offset.min(self.source.len() as u32))
    }

    /// Text of a 1-based line without its line terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&e| e as usize)
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// All files of one run, addressable by [`FileId`].
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. Adding the same path twice returns the first id.
    pub fn add_file(&mut self, path: impl AsRef<Path>, source: String) -> FileId {
        let path = path.as_ref().to_path_buf();
        if let Some(&id) = self.by_path.get(&path) {
            return id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile::new(id, path.clone(), source));
        self.by_path.insert(path, id);
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn get_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.by_path.get(path.as_ref()).copied()
    }

    pub fn location(&self, span: Span) -> Option<Location> {
        if span.is_dummy() {
            return None;
        }
        let file = self.get_file(span.file_id)?;
        let (line, column) = file.line_column(span.start);
        Some(Location {
            file: file.path.to_string_lossy().into_owned(),
            line,
            column,
        })
    }

    pub fn source_text(&self, span: Span) -> Option<&str> {
        if span.is_dummy() {
            return None;
        }
        self.get_file(span.file_id)?
            .source
            .get(span.start as usize..span.end as usize)
    }

    /// The full line containing the start of `span`.
    pub fn line_text(&self, span: Span) -> Option<&str> {
        if span.is_dummy() {
            return None;
        }
        let file = self.get_file(span.file_id)?;
        let (line, _) = file.line_column(span.start);
        file.line_text(line)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_starts() {
        assert_eq!(line_starts("a\nbc\n\nd"), vec![0, 2, 5, 6]);
        assert_eq!(line_starts(""), vec![0]);
    }

    #[test]
    fn test_line_column() {
        let starts = line_starts("const a = 1;\nlet b;\n");
        assert_eq!(line_column(&starts, 0), (1, 1));
        assert_eq!(line_column(&starts, 6), (1, 7));
        assert_eq!(line_column(&starts, 13), (2, 1));
        assert_eq!(line_column(&starts, 17), (2, 5));
    }

    #[test]
    fn test_line_text_handles_crlf() {
        let mut cache = SourceCache::new();
        let id = cache.add_file("win.ts", "let a;\r\nlet b;\r\n".to_string());
        let file = cache.get_file(id).unwrap();
        assert_eq!(file.line_text(1), Some("let a;"));
        assert_eq!(file.line_text(2), Some("let b;"));
        assert_eq!(file.line_text(0), None);
    }

    #[test]
    fn test_add_file_is_idempotent_per_path() {
        let mut cache = SourceCache::new();
        let a = cache.add_file("a.ts", "1".to_string());
        let again = cache.add_file("a.ts", "2".to_string());
        let b = cache.add_file("b.ts", "3".to_string());
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.source_text(Span::new(b, 0, 1)), Some("3"));
    }

    #[test]
    fn test_location() {
        let mut cache = SourceCache::new();
        let id = cache.add_file("src/m.ts", "let x = 1;\nlet yy = 2;".to_string());
        let loc = cache.location(Span::new(id, 15, 17)).unwrap();
        assert_eq!((loc.line, loc.column), (2, 5));
        assert!(cache.location(Span::DUMMY).is_none());
    }
}
