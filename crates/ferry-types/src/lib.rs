//! Shared vocabulary between the ferry front end and the transformer.
//!
//! The transformer never looks at swc types or at the binder directly. It asks
//! questions through [`TypeOracle`], using the ids defined here.

use bitflags::bitflags;
use std::fmt;
use std::path::Path;

/// Index of a node in a unit's syntax arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a compilation unit within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Pseudo unit that owns the standard library globals.
    pub const LIB: UnitId = UnitId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable identity of a binding. Two references to the same declaration
/// resolve to equal ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    pub unit: UnitId,
    pub index: u32,
}

impl SymbolId {
    pub fn new(unit: UnitId, index: u32) -> Self {
        Self { unit, index }
    }
}

bitflags! {
    /// Semantic facts about a resolved type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        const BOOLEAN = 1 << 0;
        const NUMBER = 1 << 1;
        const STRING = 1 << 2;
        const BOOLEAN_LITERAL = 1 << 3;
        const NUMBER_LITERAL = 1 << 4;
        const STRING_LITERAL = 1 << 5;
        const OBJECT = 1 << 6;
        const NULLABLE = 1 << 7;
        const UNION = 1 << 8;
        const FUNCTION = 1 << 9;
        const VOID = 1 << 10;
        const ANY = 1 << 11;

        const LITERAL = Self::BOOLEAN_LITERAL.bits() | Self::NUMBER_LITERAL.bits() | Self::STRING_LITERAL.bits();
        const BOOLEAN_LIKE = Self::BOOLEAN.bits() | Self::BOOLEAN_LITERAL.bits();
        const NUMBER_LIKE = Self::NUMBER.bits() | Self::NUMBER_LITERAL.bits();
        const STRING_LIKE = Self::STRING.bits() | Self::STRING_LITERAL.bits();
    }
}

/// Answer to a type query. Computed on demand and not cached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDescriptor {
    pub flags: TypeFlags,
    /// Name of a named type, e.g. `Promise` or a class name.
    pub name: Option<String>,
    /// Declaration of a named type when it is declared in the program.
    pub declaration: Option<SymbolId>,
    /// Members of a union, in source order, with `null`/`undefined` removed.
    pub members: Vec<TypeDescriptor>,
    /// First type argument of a generic reference, e.g. `T` of `Promise<T>`.
    pub argument: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: TypeFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>, declaration: Option<SymbolId>) -> Self {
        Self {
            flags: TypeFlags::OBJECT,
            name: Some(name.into()),
            declaration,
            ..Self::default()
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.flags.intersects(TypeFlags::BOOLEAN_LIKE) && !self.is_mixed()
    }

    pub fn is_number(&self) -> bool {
        self.flags.intersects(TypeFlags::NUMBER_LIKE)
            && !self.flags.contains(TypeFlags::NULLABLE)
            && !self.is_mixed()
    }

    pub fn is_string(&self) -> bool {
        self.flags.intersects(TypeFlags::STRING_LIKE)
            && !self.flags.contains(TypeFlags::NULLABLE)
            && !self.is_mixed()
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Union whose members fall into more than one primitive category.
    fn is_mixed(&self) -> bool {
        let categories = [
            TypeFlags::BOOLEAN_LIKE,
            TypeFlags::NUMBER_LIKE,
            TypeFlags::STRING_LIKE,
            TypeFlags::OBJECT | TypeFlags::FUNCTION | TypeFlags::ANY,
        ];
        categories
            .iter()
            .filter(|c| self.flags.intersects(**c))
            .count()
            > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Import,
    CatchBinding,
    TypeParameter,
    /// A standard library global such as `Math` or `undefined`.
    Global,
}

/// What the oracle knows about a symbol, detached from the binder's storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Node naming the binding in its unit. `None` for globals.
    pub declaration: Option<NodeId>,
    pub exported: bool,
}

/// Type and symbol queries answered by the front end.
///
/// Implementations must be safe to query from several worker threads at once;
/// the transformer only ever reads.
pub trait TypeOracle: Sync {
    fn resolve_type(&self, unit: UnitId, node: NodeId) -> TypeDescriptor;

    fn resolve_symbol(&self, unit: UnitId, node: NodeId) -> Option<SymbolId>;

    /// Follow import aliases to the declaring symbol. Non-aliases resolve to themselves.
    fn resolve_alias(&self, symbol: SymbolId) -> SymbolId;

    fn symbol_info(&self, symbol: SymbolId) -> Option<SymbolInfo>;

    fn is_from_standard_library(&self, symbol: SymbolId) -> bool {
        symbol.unit == UnitId::LIB
    }

    /// Path of a unit as it was registered with the program.
    fn unit_path(&self, unit: UnitId) -> Option<&Path>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_groups() {
        assert!(TypeFlags::LITERAL.contains(TypeFlags::NUMBER_LITERAL));
        assert!(TypeFlags::NUMBER_LIKE.contains(TypeFlags::NUMBER));
        assert!(!TypeFlags::NUMBER_LIKE.contains(TypeFlags::STRING));
    }

    #[test]
    fn test_category_predicates() {
        let number = TypeDescriptor::with_flags(TypeFlags::NUMBER);
        assert!(number.is_number());
        assert!(!number.is_string());

        let nullable = TypeDescriptor::with_flags(TypeFlags::NUMBER | TypeFlags::NULLABLE);
        assert!(!nullable.is_number());

        let literal = TypeDescriptor::with_flags(TypeFlags::STRING_LITERAL);
        assert!(literal.is_string());

        let mixed =
            TypeDescriptor::with_flags(TypeFlags::UNION | TypeFlags::STRING | TypeFlags::NUMBER);
        assert!(!mixed.is_string());
        assert!(!mixed.is_number());

        let promise = TypeDescriptor::named("Promise", None);
        assert!(promise.is_named("Promise"));
        assert!(!promise.is_boolean());
    }

    #[test]
    fn test_lib_unit_is_standard_library() {
        struct Nothing;
        impl TypeOracle for Nothing {
            fn resolve_type(&self, _: UnitId, _: NodeId) -> TypeDescriptor {
                TypeDescriptor::unknown()
            }
            fn resolve_symbol(&self, _: UnitId, _: NodeId) -> Option<SymbolId> {
                None
            }
            fn resolve_alias(&self, symbol: SymbolId) -> SymbolId {
                symbol
            }
            fn symbol_info(&self, _: SymbolId) -> Option<SymbolInfo> {
                None
            }
            fn unit_path(&self, _: UnitId) -> Option<&Path> {
                None
            }
        }
        let oracle = Nothing;
        assert!(oracle.is_from_standard_library(SymbolId::new(UnitId::LIB, 3)));
        assert!(!oracle.is_from_standard_library(SymbolId::new(UnitId(0), 3)));
    }
}
