//! Arena-backed syntax tree of one compilation unit.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. A child's
//! `parent` is a plain index, so the tree has no ownership cycles. Every node
//! with a span covers all of its children, which lets the transformer rebuild
//! any node's text as "gap, child, gap, child, ..., gap".

use crate::kind::{NodeData, NodeFlags, Role, SyntaxKind};
use ferry_diagnostics::{line_column, line_starts, FileId, Span};
use ferry_types::{NodeId, UnitId};
use std::path::{Path, PathBuf};

/// Half-open byte range into the unit's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: SyntaxKind,
    /// `None` for synthetic nodes that have no source text.
    pub span: Option<TextRange>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub role: Role,
    pub data: NodeData,
    pub flags: NodeFlags,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    unit: UnitId,
    file_id: FileId,
    path: PathBuf,
    source: String,
    line_starts: Vec<u32>,
    indent_unit: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    /// Create an empty tree whose root is a `Module` node spanning the whole source.
    pub fn new(unit: UnitId, file_id: FileId, path: impl Into<PathBuf>, source: String) -> Self {
        let line_starts = line_starts(&source);
        let indent_unit = detect_indent_unit(&source);
        let root_span = TextRange::new(0, source.len() as u32);
        let mut tree = Self {
            unit,
            file_id,
            path: path.into(),
            source,
            line_starts,
            indent_unit,
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.alloc(SyntaxKind::Module, Some(root_span));
        tree.nodes[0].role = Role::Root;
        tree
    }

    // Construction

    pub fn alloc(&mut self, kind: SyntaxKind, span: Option<TextRange>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            children: Vec::new(),
            role: Role::Item,
            data: NodeData::None,
            flags: NodeFlags::empty(),
        });
        id
    }

    pub fn set_data(&mut self, id: NodeId, data: NodeData) {
        self.nodes[id.index()].data = data;
    }

    pub fn add_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.nodes[id.index()].flags |= flags;
    }

    /// Append `child` to `parent`, widening the parent's span to cover it.
    pub fn attach(&mut self, parent: NodeId, child: NodeId, role: Role) {
        let child_span = {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.role = role;
            node.span
        };
        let node = &mut self.nodes[parent.index()];
        node.children.push(child);
        if let Some(child_span) = child_span {
            node.span = Some(match node.span {
                Some(span) => span.cover(child_span),
                None => child_span,
            });
        }
    }

    // Identity

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    // Node accessors

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Option<TextRange> {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn role(&self, id: NodeId) -> Role {
        self.node(id).role
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).flags
    }

    pub fn has_flag(&self, id: NodeId, flag: NodeFlags) -> bool {
        self.flags(id).contains(flag)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.data(id).name()
    }

    /// First child with the given role.
    pub fn child(&self, id: NodeId, role: Role) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.role(c) == role)
    }

    pub fn children_with(&self, id: NodeId, role: Role) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.role(c) == role)
    }

    /// Children that are not separators or decorators.
    pub fn significant_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(move |&c| {
            !matches!(self.kind(c), SyntaxKind::Separator | SyntaxKind::Decorator)
        })
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    fn sibling_index(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let idx = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, idx))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, idx) = self.sibling_index(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, idx) = self.sibling_index(id)?;
        idx.checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Siblings after `id`, in order.
    pub fn following_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let rest = match self.sibling_index(id) {
            Some((parent, idx)) => &self.children(parent)[idx + 1..],
            None => &[][..],
        };
        rest.iter().copied()
    }

    // Text

    /// Raw source text of a node, or `""` for synthetic nodes.
    pub fn text(&self, id: NodeId) -> &str {
        match self.span(id) {
            Some(span) => self.slice(span.start, span.end),
            None => "",
        }
    }

    pub fn slice(&self, start: u32, end: u32) -> &str {
        self.source
            .get(start as usize..end as usize)
            .unwrap_or_default()
    }

    /// Byte offset of the first non-trivia character at or after `offset`.
    pub fn skip_trivia(&self, offset: u32) -> u32 {
        skip_trivia(&self.source, offset as usize) as u32
    }

    /// First non-trivia character after the end of `id`.
    pub fn next_significant_char(&self, id: NodeId) -> Option<char> {
        let end = self.span(id)?.end;
        let at = self.skip_trivia(end);
        self.source[at as usize..].chars().next()
    }

    /// Diagnostics span of a node; dummy for synthetic nodes.
    pub fn diag_span(&self, id: NodeId) -> Span {
        match self.span(id) {
            Some(span) => Span::new(self.file_id, span.start, span.end),
            None => self
                .ancestors(id)
                .find_map(|a| self.span(a))
                .map(|span| Span::new(self.file_id, span.start, span.end))
                .unwrap_or(Span::DUMMY),
        }
    }

    /// 1-based line and column where a node starts. Synthetic nodes report
    /// the position of their nearest spanned ancestor.
    pub fn location(&self, id: NodeId) -> (u32, u32) {
        let offset = std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.span(n))
            .map(|span| span.start)
            .unwrap_or(0);
        line_column(&self.line_starts, offset)
    }

    /// Leading whitespace of the line on which `id` starts.
    pub fn line_indent(&self, id: NodeId) -> &str {
        let offset = self.span(id).map(|s| s.start).unwrap_or(0);
        let (line, _) = line_column(&self.line_starts, offset);
        let start = self.line_starts[(line - 1) as usize] as usize;
        let rest = &self.source[start..];
        let width = rest
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        &rest[..width]
    }

    /// One level of indentation as used by this file.
    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }
}

/// Skip whitespace and comments starting at `offset`.
pub fn skip_trivia(source: &str, mut offset: usize) -> usize {
    let bytes = source.as_bytes();
    while offset < bytes.len() {
        match bytes[offset] {
            b' ' | b'\t' | b'\n' | b'\r' => offset += 1,
            b'/' if bytes.get(offset + 1) == Some(&b'/') => {
                while offset < bytes.len() && bytes[offset] != b'\n' {
                    offset += 1;
                }
            }
            b'/' if bytes.get(offset + 1) == Some(&b'*') => {
                offset = match source[offset + 2..].find("*/") {
                    Some(end) => offset + 2 + end + 2,
                    None => bytes.len(),
                };
            }
            _ => break,
        }
    }
    offset
}

fn detect_indent_unit(source: &str) -> String {
    for line in source.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        let spaces = line.bytes().take_while(|b| *b == b' ').count();
        if spaces >= 2 {
            return " ".repeat(spaces.min(8));
        }
    }
    "    ".to_string()
}

pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(source: &str) -> SyntaxTree {
        SyntaxTree::new(UnitId(0), FileId(0), "t.ts", source.to_string())
    }

    #[test]
    fn test_attach_widens_parent_and_links_child() {
        let mut t = tree("a + b");
        let bin = t.alloc(SyntaxKind::Binary, Some(TextRange::new(2, 3)));
        let left = t.alloc(SyntaxKind::Ident, Some(TextRange::new(0, 1)));
        let right = t.alloc(SyntaxKind::Ident, Some(TextRange::new(4, 5)));
        t.attach(bin, left, Role::Left);
        t.attach(bin, right, Role::Right);
        t.attach(t.root(), bin, Role::Item);

        assert_eq!(t.span(bin), Some(TextRange::new(0, 5)));
        assert_eq!(t.parent(left), Some(bin));
        assert_eq!(t.child(bin, Role::Right), Some(right));
        assert_eq!(t.next_sibling(left), Some(right));
        assert_eq!(t.prev_sibling(right), Some(left));
        assert_eq!(t.text(bin), "a + b");
        assert_eq!(t.ancestors(left).collect::<Vec<_>>(), vec![bin, t.root()]);
    }

    #[test]
    fn test_synthetic_node_location_falls_back_to_parent() {
        let mut t = tree("\n  [a, , b]");
        let arr = t.alloc(SyntaxKind::ArrayPat, Some(TextRange::new(3, 11)));
        let hole = t.alloc(SyntaxKind::Hole, None);
        t.attach(arr, hole, Role::Element);
        assert_eq!(t.text(hole), "");
        assert_eq!(t.location(hole), (2, 3));
        assert_eq!(t.line_indent(arr), "  ");
    }

    #[test]
    fn test_skip_trivia() {
        let src = "a /* c */ // d\n , b";
        assert_eq!(skip_trivia(src, 1), 16);
        assert_eq!(&src[16..17], ",");
        assert_eq!(skip_trivia(src, 0), 0);
    }

    #[test]
    fn test_indent_unit_detection() {
        assert_eq!(detect_indent_unit("class A {\n  x = 1;\n}"), "  ");
        assert_eq!(detect_indent_unit("class A {\n\tx = 1;\n}"), "\t");
        assert_eq!(detect_indent_unit("let a = 1;"), "    ");
    }
}
