//! Errors that abort a unit's transformation.

use ferry_syntax::SyntaxKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// A rule met a shape it must never see. Carries enough location data to
    /// find the offending source line.
    #[error("{unit}:{line}:{column}: internal error in {kind:?}: {message}")]
    Invariant {
        unit: String,
        line: u32,
        column: u32,
        kind: SyntaxKind,
        message: String,
    },

    #[error("failed to start the worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl TransformError {
    pub fn is_invariant(&self) -> bool {
        matches!(self, TransformError::Invariant { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_display_has_location() {
        let err = TransformError::Invariant {
            unit: "src/a.ts".to_string(),
            line: 3,
            column: 7,
            kind: SyntaxKind::Return,
            message: "missing argument".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "src/a.ts:3:7: internal error in Return: missing argument"
        );
        assert!(err.is_invariant());
    }
}
