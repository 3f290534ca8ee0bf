//! Diagnostic infrastructure for ferry.
//!
//! Every construct the transpiler cannot express in Haxe is reported here with a
//! code, a source location and a short message. Diagnostics are collected per
//! compilation unit and rendered by one of the emitters.
//!
//! ```
//! use ferry_diagnostics::{Diagnostic, DiagnosticCode, SimpleEmitter, DiagnosticEmitter, SourceCache, Span};
//!
//! let mut cache = SourceCache::new();
//! let file = cache.add_file("a.ts", "label: for (;;) {}".to_string());
//! let diag = Diagnostic::new(DiagnosticCode::UnsupportedControlFlow, "labeled statement")
//!     .with_span(Span::new(file, 0, 5))
//!     .build();
//!
//! let mut out = Vec::new();
//! SimpleEmitter::new(&mut out).emit(&diag, &cache).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("a.ts:1:1: warning"));
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod source_cache;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Diagnostics, Severity};
pub use emitter::{DiagnosticEmitter, JsonEmitter, SimpleEmitter, TerminalEmitter};
pub use source_cache::{line_column, line_starts, SourceCache, SourceFile};
pub use span::{FileId, Label, Location, Span};
