//! TypeScript parser wrapper using SWC
//!
//! Parses one `.ts` file into an swc module, registers the file in the
//! diagnostics source cache and reports parse problems as diagnostics.

use anyhow::Result;
use ferry_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, FileId, SourceCache, Span};
use swc_common::{input::StringInput, sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, Parser, Syntax, TsSyntax};

// Re-export AST types for the lowering pass
pub use swc_ecma_ast;

// Re-export Spanned trait for getting spans from AST nodes
pub use swc_common::Spanned;

/// Result of parsing a TypeScript file.
#[derive(Debug)]
pub struct ParseResult {
    pub module: Module,
    pub file_id: FileId,
    /// swc byte position corresponding to offset 0 of the source text.
    pub base: u32,
    /// Recoverable parse errors, reported as warnings.
    pub diagnostics: Diagnostics,
}

impl ParseResult {
    /// Convert an swc span into a diagnostics span of this file.
    pub fn span(&self, span: swc_common::Span) -> Span {
        Span::new(
            self.file_id,
            span.lo.0.saturating_sub(self.base),
            span.hi.0.saturating_sub(self.base),
        )
    }
}

/// Parse TypeScript source and register it in `cache`.
///
/// A fatal syntax error is returned as `Err`. Use [`parse_typescript_reporting`]
/// to receive it as a diagnostic as well.
pub fn parse_typescript_with_cache(
    source: &str,
    filename: &str,
    cache: &mut SourceCache,
) -> Result<ParseResult> {
    let mut sink = Diagnostics::new();
    parse_typescript_reporting(source, filename, cache, &mut sink)
}

/// Like [`parse_typescript_with_cache`], pushing a fatal error into `sink` as a `P001` diagnostic.
pub fn parse_typescript_reporting(
    source: &str,
    filename: &str,
    cache: &mut SourceCache,
    sink: &mut Diagnostics,
) -> Result<ParseResult> {
    let file_id = cache.add_file(filename, source.to_string());

    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );
    let base = source_file.start_pos.0;

    let lexer = Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: false,
            decorators: true,
            dts: filename.ends_with(".d.ts"),
            no_early_errors: false,
            disallow_ambiguous_jsx_like: false,
        }),
        swc_ecma_ast::EsVersion::Es2022,
        StringInput::from(&*source_file),
        None,
    );

    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        let span = Span::new(
            file_id,
            e.span().lo.0.saturating_sub(base),
            e.span().hi.0.saturating_sub(base),
        );
        sink.push(
            Diagnostic::error(DiagnosticCode::ParseError, e.kind().msg().to_string())
                .with_span(span)
                .build(),
        );
        anyhow::anyhow!("{}: parse error: {}", filename, e.kind().msg())
    })?;

    let mut diagnostics = Diagnostics::new();
    for error in parser.take_errors() {
        let span = Span::new(
            file_id,
            error.span().lo.0.saturating_sub(base),
            error.span().hi.0.saturating_sub(base),
        );
        diagnostics.push(
            Diagnostic::warning(DiagnosticCode::ParseError, error.kind().msg().to_string())
                .with_span(span)
                .build(),
        );
    }

    Ok(ParseResult {
        module,
        file_id,
        base,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_module() {
        let mut cache = SourceCache::new();
        let result =
            parse_typescript_with_cache("const x: number = 1;\n", "a.ts", &mut cache).unwrap();
        assert_eq!(result.module.body.len(), 1);
        assert!(result.diagnostics.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_spans_are_rebased_to_zero() {
        let mut cache = SourceCache::new();
        let source = "let a = 1;\nlet bee = 2;";
        let result = parse_typescript_with_cache(source, "b.ts", &mut cache).unwrap();
        let second = result.module.body[1].span();
        let span = result.span(second);
        assert!(source[span.start as usize..span.end as usize].starts_with("let bee = 2"));
    }

    #[test]
    fn test_fatal_error_reported() {
        let mut cache = SourceCache::new();
        let mut sink = Diagnostics::new();
        let err = parse_typescript_reporting("function f( {", "bad.ts", &mut cache, &mut sink);
        assert!(err.is_err());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.items[0].code, DiagnosticCode::ParseError);
    }
}
