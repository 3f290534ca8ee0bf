use std::path::PathBuf;

/// Compiler options consumed by the engine.
///
/// The either arity limit and the worker ceiling have no built-in value here;
/// callers pass them explicitly (the CLI takes them from `ferry.toml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Directory module paths and packages are computed against.
    pub root_dir: PathBuf,
    /// Largest union that still folds into nested `EitherType`s.
    pub either_arity_limit: usize,
    /// Upper bound on units transformed at the same time.
    pub max_workers: usize,
    /// Turn internal rule failures into inline markers instead of failing the unit.
    pub degrade_on_error: bool,
}

impl TransformOptions {
    pub fn new(root_dir: impl Into<PathBuf>, either_arity_limit: usize, max_workers: usize) -> Self {
        Self {
            root_dir: root_dir.into(),
            either_arity_limit,
            max_workers,
            degrade_on_error: false,
        }
    }

    pub fn with_degrade_on_error(mut self, degrade: bool) -> Self {
        self.degrade_on_error = degrade;
        self
    }
}
