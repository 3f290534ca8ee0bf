//! Units transformed in parallel on a bounded worker pool.

use crate::engine::{RewriteResult, Transformer};
use crate::error::TransformError;
use crate::header::{render_header, ModulePath};
use crate::options::TransformOptions;
use ferry_diagnostics::Diagnostics;
use ferry_syntax::{Program, SyntaxTree};
use ferry_types::{TypeOracle, UnitId};
use rayon::prelude::*;
use std::path::PathBuf;

/// Everything one unit's pass produced.
#[derive(Debug)]
pub struct UnitOutput {
    pub unit: UnitId,
    pub source_path: PathBuf,
    pub module: ModulePath,
    /// Package line and helper imports.
    pub header: String,
    pub body: String,
    pub diagnostics: Diagnostics,
}

impl UnitOutput {
    /// The complete `.hx` module text.
    pub fn text(&self) -> String {
        format!("{}{}", self.header, self.body)
    }
}

/// Outcome of one unit. A failed unit never affects the others.
pub type UnitResult = Result<UnitOutput, TransformError>;

/// Transform one unit and derive its header.
pub fn transform(
    tree: &SyntaxTree,
    oracle: &dyn TypeOracle,
    options: &TransformOptions,
) -> RewriteResult<UnitOutput> {
    let source_path = tree.path().to_path_buf();
    log::debug!("transforming {}", source_path.display());
    let (body, state) = Transformer::new(tree, oracle, options).run()?;
    let module = ModulePath::from_unit_path(&options.root_dir, &source_path);
    let header = render_header(&module, &state.helpers);
    log::debug!(
        "{}: {} diagnostic(s), {} helper(s)",
        source_path.display(),
        state.diagnostics.len(),
        state.helpers.len()
    );
    Ok(UnitOutput {
        unit: tree.unit(),
        source_path,
        module,
        header,
        body,
        diagnostics: state.diagnostics,
    })
}

/// Transform `trees` with at most `options.max_workers` units in flight.
/// Results come back in input order; `on_unit` runs as each unit finishes.
pub fn transform_units<F>(
    trees: &[&SyntaxTree],
    oracle: &dyn TypeOracle,
    options: &TransformOptions,
    on_unit: F,
) -> RewriteResult<Vec<UnitResult>>
where
    F: Fn(&UnitResult) + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_workers)
        .thread_name(|i| format!("ferry-worker-{i}"))
        .build()?;
    log::info!(
        "transforming {} unit(s) on {} worker(s)",
        trees.len(),
        pool.current_num_threads()
    );
    Ok(pool.install(|| {
        trees
            .par_iter()
            .map(|tree| {
                let result = transform(tree, oracle, options);
                if let Err(err) = &result {
                    log::warn!("{}: {err}", tree.path().display());
                }
                on_unit(&result);
                result
            })
            .collect()
    }))
}

/// Every unit registered with `program`.
pub fn transform_program<F>(
    program: &Program,
    options: &TransformOptions,
    on_unit: F,
) -> RewriteResult<Vec<UnitResult>>
where
    F: Fn(&UnitResult) + Sync,
{
    let trees: Vec<&SyntaxTree> = program
        .unit_ids()
        .filter_map(|unit| program.tree(unit))
        .collect();
    transform_units(&trees, program, options, on_unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_diagnostics::SourceCache;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn program(files: &[(&str, &str)]) -> Program {
        let mut program = Program::new();
        let mut cache = SourceCache::new();
        let mut sink = Diagnostics::new();
        for (path, source) in files {
            program
                .add_source(Path::new(path), source, &mut cache, &mut sink)
                .expect("parse");
        }
        program
    }

    #[test]
    fn test_results_keep_input_order() {
        let files: Vec<(String, String)> = (0..8)
            .map(|i| (format!("src/m{i}.ts"), format!("const v{i} = {i};\n")))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, s)| (p.as_str(), s.as_str())).collect();
        let program = program(&refs);
        let finished = AtomicUsize::new(0);
        let options = TransformOptions::new("src", 4, 3);
        let results = transform_program(&program, &options, |_| {
            finished.fetch_add(1, Ordering::SeqCst);
        })
        .expect("pool");
        assert_eq!(finished.load(Ordering::SeqCst), 8);
        for (i, result) in results.iter().enumerate() {
            let output = result.as_ref().expect("unit");
            assert_eq!(output.body, format!("final v{i} = {i};\n"));
            assert_eq!(output.module.module, format!("M{i}"));
        }
    }

    #[test]
    fn test_units_do_not_share_state() {
        let program = program(&[
            ("src/a.ts", "async function f() { return 1; }\n"),
            ("src/b/c.ts", "const x = 1;\n"),
        ]);
        let options = TransformOptions::new("src", 4, 2);
        let results = transform_program(&program, &options, |_| {}).expect("pool");
        let a = results[0].as_ref().expect("a");
        let c = results[1].as_ref().expect("c");
        assert_eq!(a.header, "import js.lib.Promise;\n\n");
        assert_eq!(c.header, "package b;\n\n");
        assert_eq!(c.text(), "package b;\n\nfinal x = 1;\n");
    }

    #[test]
    fn test_single_worker_matches_parallel_output() {
        let program = program(&[
            ("src/a.ts", "let s = \"\";\nif (s) {}\n"),
            ("src/b.ts", "const t: [number, string] = [1, \"a\"];\n"),
        ]);
        let bodies = |workers| -> Vec<String> {
            let options = TransformOptions::new("src", 4, workers);
            transform_program(&program, &options, |_| {})
                .expect("pool")
                .into_iter()
                .map(|r| r.expect("unit").text())
                .collect()
        };
        assert_eq!(bodies(1), bodies(4));
    }
}
