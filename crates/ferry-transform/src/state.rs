//! Mutable state of one unit's pass. Created per unit, owned by the
//! transformer and handed back when the pass completes.

use crate::rename::RenameTable;
use ferry_diagnostics::Diagnostics;
use ferry_types::NodeId;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Support types a unit needs imported in its header. Ordered by import path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Helper {
    Helpers,
    EitherType,
    Promise,
}

impl Helper {
    pub fn import_path(self) -> &'static str {
        match self {
            Helper::EitherType => "haxe.extern.EitherType",
            Helper::Promise => "js.lib.Promise",
            Helper::Helpers => "ferry.Helpers",
        }
    }
}

/// How a `return` inside an async function is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncReturn {
    /// Wrap the value in `Promise.resolve(..)`.
    Wrap,
    /// `return await call` where the call already yields a promise: return the call.
    Unwrap(NodeId),
}

#[derive(Debug, Default)]
pub struct UnitPassState {
    /// Nodes that emit nothing but a separating space.
    pub suppressed: HashSet<NodeId>,
    /// Nodes emitted without their leading line trivia.
    pub full_text_replace: HashSet<NodeId>,
    pub renames: RenameTable,
    pub helpers: BTreeSet<Helper>,
    /// Planned when an async function is entered, consumed by the return rule.
    pub async_returns: HashMap<NodeId, AsyncReturn>,
    /// Statements to insert at the top of a block, or of an expression-bodied
    /// arrow keyed by the arrow itself.
    pub prologues: HashMap<NodeId, Vec<String>>,
    /// Functions with an explicit `this` parameter, and its replacement name.
    pub receivers: HashMap<NodeId, String>,
    pub diagnostics: Diagnostics,
}

impl UnitPassState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_prologue(&mut self, target: NodeId, statements: impl IntoIterator<Item = String>) {
        self.prologues.entry(target).or_default().extend(statements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_sort_by_import_order() {
        let mut state = UnitPassState::new();
        state.helpers.insert(Helper::Helpers);
        state.helpers.insert(Helper::EitherType);
        state.helpers.insert(Helper::Helpers);
        let paths: Vec<_> = state.helpers.iter().map(|h| h.import_path()).collect();
        assert_eq!(paths, vec!["ferry.Helpers", "haxe.extern.EitherType"]);
    }

    #[test]
    fn test_prologues_accumulate() {
        let mut state = UnitPassState::new();
        state.add_prologue(NodeId(3), ["var a = p.a;".to_string()]);
        state.add_prologue(NodeId(3), ["var b = p.b;".to_string()]);
        assert_eq!(state.prologues[&NodeId(3)].len(), 2);
    }
}
