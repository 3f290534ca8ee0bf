//! Front end of ferry: the arena syntax tree, lowering from swc, binding and
//! the project-wide [`Program`] that answers type and symbol queries.

pub mod binder;
pub mod kind;
pub mod lower;
pub mod program;
pub mod tree;

pub use binder::{bind, BoundUnit, ImportTarget, ImportedName, Symbol};
pub use kind::{
    AssignOp, BinaryOp, KeywordType, MethodKind, NodeData, NodeFlags, Role, SyntaxKind,
    TypeOperatorKind, UnaryOp, UpdateOp, VarKind,
};
pub use lower::lower_module;
pub use program::{normalize, Program, GLOBALS};
pub use tree::{is_ident_char, skip_trivia, Node, SyntaxTree, TextRange};
