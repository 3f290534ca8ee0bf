//! Diagnostic records produced while transpiling.

use crate::span::{Label, Span};
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic codes, grouped by the letter prefix of their rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Parse errors (P)
    /// Syntax error reported by the TypeScript parser
    ParseError,

    // Unsupported constructs (U), always degraded to a comment
    /// Statement or expression with no Haxe counterpart
    UnsupportedSyntax,
    /// Type expression with no Haxe counterpart, emitted as `Dynamic`
    UnsupportedType,
    /// Namespace, side-effect or unresolvable import
    UnsupportedImport,
    /// `export *`, re-exports and default-exported expressions
    UnsupportedExport,
    /// Destructuring in a position that cannot be lowered
    UnsupportedPattern,
    /// Class or object member that cannot be expressed (computed keys, accessors in literals, ...)
    UnsupportedMember,
    /// Control flow Haxe cannot express (finally, labels, fallthrough, ...)
    UnsupportedControlFlow,

    // Compatibility (C)
    /// Union wider than the configured either arity limit
    WideUnion,

    // Resolution (R)
    /// Import specifier that does not resolve to a project unit
    UnresolvedImport,

    // Internal (I)
    /// A transform rule failed; emitted only in degrade mode
    InternalError,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 11] = [
        Self::ParseError,
        Self::UnsupportedSyntax,
        Self::UnsupportedType,
        Self::UnsupportedImport,
        Self::UnsupportedExport,
        Self::UnsupportedPattern,
        Self::UnsupportedMember,
        Self::UnsupportedControlFlow,
        Self::WideUnion,
        Self::UnresolvedImport,
        Self::InternalError,
    ];

    /// The rendered code, e.g. `U003`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "P001",
            Self::UnsupportedSyntax => "U001",
            Self::UnsupportedType => "U002",
            Self::UnsupportedImport => "U003",
            Self::UnsupportedExport => "U004",
            Self::UnsupportedPattern => "U005",
            Self::UnsupportedMember => "U006",
            Self::UnsupportedControlFlow => "U007",
            Self::WideUnion => "C001",
            Self::UnresolvedImport => "R001",
            Self::InternalError => "I001",
        }
    }

    pub fn parse(code: &str) -> Option<DiagnosticCode> {
        let code = code.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::ParseError | Self::InternalError => Severity::Error,
            Self::WideUnion => Severity::Note,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub labels: Vec<Label>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Error, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Warning, message)
    }

    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, Severity::Note, message)
    }

    /// Start a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(code, code.default_severity(), message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Fluent builder returned by the `Diagnostic` constructors.
pub struct DiagnosticBuilder {
    inner: Diagnostic,
}

impl DiagnosticBuilder {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            inner: Diagnostic {
                code,
                severity,
                message: message.into(),
                span: Span::DUMMY,
                labels: Vec::new(),
                help: None,
            },
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.inner.span = span;
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.inner.labels.push(Label::new(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.help = Some(help.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.inner
    }
}

/// Ordered collection of diagnostics for one unit or one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_warning()).count()
    }

    pub fn count_of(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Sort by file and offset so parallel runs report deterministically.
    pub fn sort(&mut self) {
        self.items
            .sort_by_key(|d| (d.span.file_id, d.span.start, d.code.as_str()));
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    #[test]
    fn test_code_strings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in DiagnosticCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate code {}", code);
        }
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(DiagnosticCode::parse("u003"), Some(DiagnosticCode::UnsupportedImport));
        assert_eq!(DiagnosticCode::parse(" C001 "), Some(DiagnosticCode::WideUnion));
        assert_eq!(DiagnosticCode::parse("X999"), None);
    }

    #[test]
    fn test_counts_and_sort() {
        let mut diags = Diagnostics::new();
        diags.push(
            Diagnostic::new(DiagnosticCode::UnsupportedType, "keyof")
                .with_span(Span::new(FileId(0), 40, 45))
                .build(),
        );
        diags.push(
            Diagnostic::new(DiagnosticCode::ParseError, "unexpected token")
                .with_span(Span::new(FileId(0), 2, 3))
                .build(),
        );
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());

        diags.sort();
        assert_eq!(diags.items[0].code, DiagnosticCode::ParseError);
        assert_eq!(diags.count_of(DiagnosticCode::UnsupportedType), 1);
    }
}
