//! Renderers for diagnostics: colored terminal output, JSON lines, and plain text.

use crate::diagnostic::{Diagnostic, Diagnostics, Severity};
use crate::source_cache::SourceCache;
use std::io::Write;

pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()>;

    fn emit_all(&mut self, diagnostics: &Diagnostics, cache: &SourceCache) -> std::io::Result<()> {
        for diag in diagnostics {
            self.emit(diag, cache)?;
        }
        Ok(())
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()>;
}

/// Terminal output with an excerpt of the offending line.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colored: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, colored: bool) -> Self {
        Self { writer, colored }
    }

    fn paint(&self, code: &'static str) -> &'static str {
        if self.colored {
            code
        } else {
            ""
        }
    }

    fn severity_color(&self, severity: Severity) -> &'static str {
        self.paint(match severity {
            Severity::Error => "\x1b[31m",
            Severity::Warning => "\x1b[33m",
            Severity::Note => "\x1b[34m",
        })
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()> {
        let color = self.severity_color(diagnostic.severity);
        let reset = self.paint("\x1b[0m");
        let bold = self.paint("\x1b[1m");
        let cyan = self.paint("\x1b[36m");

        // warning[U001]: message
        writeln!(
            self.writer,
            "{}{}{}[{}]{}: {}",
            bold, color, diagnostic.severity, diagnostic.code, reset, diagnostic.message
        )?;

        if let Some(loc) = cache.location(diagnostic.span) {
            writeln!(self.writer, "  {}-->{} {}", cyan, reset, loc)?;

            if let Some(line_text) = cache.line_text(diagnostic.span) {
                let gutter = loc.line.to_string();
                let pad = " ".repeat(gutter.len());
                let start_col = loc.column.saturating_sub(1) as usize;
                let width = (diagnostic.span.len() as usize)
                    .min(line_text.len().saturating_sub(start_col))
                    .max(1);

                writeln!(self.writer, "{} {}|{}", pad, cyan, reset)?;
                writeln!(self.writer, "{}{} |{} {}", cyan, gutter, reset, line_text)?;
                writeln!(
                    self.writer,
                    "{} {}|{} {}{}{}{}",
                    pad,
                    cyan,
                    reset,
                    " ".repeat(start_col),
                    color,
                    "^".repeat(width),
                    reset
                )?;
            }
        }

        for label in &diagnostic.labels {
            if let Some(loc) = cache.location(label.span) {
                writeln!(self.writer, "  {}note{}: {} ({})", cyan, reset, label.message, loc)?;
            }
        }

        if let Some(ref help) = diagnostic.help {
            writeln!(self.writer, "  {}= help:{} {}", cyan, reset, help)?;
        }

        writeln!(self.writer)
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        let errors = diagnostics.error_count();
        let warnings = diagnostics.warning_count();
        if errors == 0 && warnings == 0 {
            return Ok(());
        }

        let color = if errors > 0 {
            self.severity_color(Severity::Error)
        } else {
            self.severity_color(Severity::Warning)
        };
        let reset = self.paint("\x1b[0m");

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} error{}", errors, if errors == 1 { "" } else { "s" }));
        }
        if warnings > 0 {
            parts.push(format!(
                "{} warning{}",
                warnings,
                if warnings == 1 { "" } else { "s" }
            ));
        }
        writeln!(self.writer, "{}{} emitted{}", color, parts.join(" and "), reset)
    }
}

/// One JSON object per line, for editors and CI.
pub struct JsonEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticEmitter for JsonEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()> {
        let json = serde_json::json!({
            "code": diagnostic.code.as_str(),
            "severity": diagnostic.severity.as_str(),
            "message": diagnostic.message,
            "location": cache.location(diagnostic.span),
            "span": if diagnostic.span.is_dummy() {
                serde_json::Value::Null
            } else {
                serde_json::json!({ "start": diagnostic.span.start, "end": diagnostic.span.end })
            },
            "help": diagnostic.help,
        });
        serde_json::to_writer(&mut self.writer, &json)?;
        writeln!(self.writer)
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        let summary = serde_json::json!({
            "type": "summary",
            "errors": diagnostics.error_count(),
            "warnings": diagnostics.warning_count(),
            "total": diagnostics.len(),
        });
        serde_json::to_writer(&mut self.writer, &summary)?;
        writeln!(self.writer)
    }
}

/// `file:line:col: severity: message [code]`, the format compilers and grep agree on.
pub struct SimpleEmitter<W: Write> {
    writer: W,
}

impl<W: Write> SimpleEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticEmitter for SimpleEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, cache: &SourceCache) -> std::io::Result<()> {
        match cache.location(diagnostic.span) {
            Some(loc) => writeln!(
                self.writer,
                "{}: {}: {} [{}]",
                loc, diagnostic.severity, diagnostic.message, diagnostic.code
            ),
            None => writeln!(
                self.writer,
                "{}: {} [{}]",
                diagnostic.severity, diagnostic.message, diagnostic.code
            ),
        }
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;
    use crate::span::Span;

    fn sample() -> (SourceCache, Diagnostics) {
        let mut cache = SourceCache::new();
        let id = cache.add_file("src/a.ts", "import * as fs from \"fs\";\n".to_string());
        let mut diags = Diagnostics::new();
        diags.push(
            Diagnostic::new(DiagnosticCode::UnsupportedImport, "namespace import")
                .with_span(Span::new(id, 7, 14))
                .with_help("import the names you use instead")
                .build(),
        );
        (cache, diags)
    }

    #[test]
    fn test_simple_emitter() {
        let (cache, diags) = sample();
        let mut out = Vec::new();
        let mut emitter = SimpleEmitter::new(&mut out);
        emitter.emit_all(&diags, &cache).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "src/a.ts:1:8: warning: namespace import [U003]\n");
    }

    #[test]
    fn test_terminal_emitter_underlines_span() {
        let (cache, diags) = sample();
        let mut out = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut out, false);
        emitter.emit_all(&diags, &cache).unwrap();
        emitter.emit_summary(&diags).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("warning[U003]: namespace import"));
        assert!(text.contains("--> src/a.ts:1:8"));
        assert!(text.contains("       ^^^^^^^"));
        assert!(text.contains("= help: import the names you use instead"));
        assert!(text.contains("1 warning emitted"));
    }

    #[test]
    fn test_json_emitter() {
        let (cache, diags) = sample();
        let mut out = Vec::new();
        let mut emitter = JsonEmitter::new(&mut out);
        emitter.emit_all(&diags, &cache).unwrap();
        let line = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["code"], "U003");
        assert_eq!(value["location"]["line"], 1);
        assert_eq!(value["location"]["column"], 8);
    }
}
