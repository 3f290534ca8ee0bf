//! Scoping flags threaded through the visitor.

/// Flags that describe the position being rewritten.
///
/// Passed by value and copied on descent: a rule that changes a flag hands the
/// changed copy to its children and never affects its siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteContext {
    /// Parameters and members here must carry a type; missing ones become `Dynamic`.
    pub enforce_type_annotation: bool,
    /// Parameter initialisers cannot be expressed here and are dropped.
    pub drop_initializer: bool,
    /// Directly inside the module, where variables become module-level fields.
    pub module_level: bool,
}

impl RewriteContext {
    /// Signature positions: function types and structure methods.
    pub fn signature(self) -> Self {
        Self {
            enforce_type_annotation: true,
            drop_initializer: true,
            ..self
        }
    }

    pub fn at_module_level(self) -> Self {
        Self {
            module_level: true,
            ..self
        }
    }

    /// Inside a body: nothing of the enclosing declaration position applies.
    pub fn nested(self) -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_on_descend() {
        let outer = RewriteContext::default().at_module_level();
        let signature = outer.signature();
        assert!(signature.enforce_type_annotation);
        assert!(signature.drop_initializer);
        assert!(signature.module_level);
        assert!(!outer.enforce_type_annotation);
        assert_eq!(signature.nested(), RewriteContext::default());
    }
}
