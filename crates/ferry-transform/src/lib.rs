//! TypeScript to Haxe transformation for ferry
//!
//! The engine walks one unit's syntax tree and asks an ordered rule registry
//! for each node's Haxe text; nodes no rule claims are rebuilt from their
//! children so untouched code keeps its formatting. Supporting passes:
//! - Explicit boolean coercion of conditions and logical operands
//! - Either-type folding of unions and tuples
//! - Destructuring lowering into flat declarations
//! - Async return wrapping
//! - Per-unit renaming of synthesized bindings

pub mod batch;
pub mod context;
pub mod engine;
pub mod error;
pub mod header;
pub mod options;
pub mod rename;
pub mod rules;
pub mod state;

mod async_return;
mod coercion;
mod destructure;
mod either;

// Re-export the entry points
pub use batch::{transform, transform_program, transform_units, UnitOutput, UnitResult};
pub use context::RewriteContext;
pub use engine::{RewriteResult, Transformer};
pub use error::TransformError;
pub use header::{render_header, ModulePath};
pub use options::TransformOptions;
pub use rules::{disposition, Disposition, Registry};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::batch::{transform, UnitOutput};
    use crate::engine::RewriteResult;
    use crate::options::TransformOptions;
    use ferry_diagnostics::{Diagnostics, SourceCache};
    use ferry_syntax::Program;
    use ferry_types::UnitId;
    use std::path::Path;

    /// Parse, lower and bind `source` as `src/main.ts`.
    pub fn parse(source: &str) -> (Program, UnitId) {
        let mut program = Program::new();
        let mut cache = SourceCache::new();
        let mut sink = Diagnostics::new();
        let unit = program
            .add_source(Path::new("src/main.ts"), source, &mut cache, &mut sink)
            .expect("test source parses");
        (program, unit)
    }

    pub fn transpile_with(
        source: &str,
        configure: impl FnOnce(TransformOptions) -> TransformOptions,
    ) -> RewriteResult<UnitOutput> {
        let (program, unit) = parse(source);
        let tree = program.tree(unit).expect("unit was registered");
        let options = configure(TransformOptions::new("src", 4, 1));
        transform(tree, &program, &options)
    }

    /// The transformed body, without the header.
    pub fn transpile(source: &str) -> String {
        transpile_with(source, |o| o).expect("transform").body
    }
}
