//! The project-wide program: every bound unit plus the [`TypeOracle`] over them.
//!
//! A `Program` is built once, single-threaded, and is read-only afterwards, so
//! it can be shared by reference with the transformer's worker threads.

use crate::binder::{annotation, bind, BoundUnit, ImportedName, Symbol};
use crate::kind::{BinaryOp, KeywordType, NodeData, NodeFlags, Role, SyntaxKind, UnaryOp, VarKind};
use crate::lower::lower_module;
use crate::tree::SyntaxTree;
use anyhow::{bail, Result};
use ferry_diagnostics::{Diagnostics, SourceCache};
use ferry_types::{
    NodeId, SymbolId, SymbolInfo, SymbolKind, TypeDescriptor, TypeFlags, TypeOracle, UnitId,
};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Maximum number of alias or re-export hops followed.
const MAX_ALIAS_HOPS: usize = 8;

/// Recursion limit for type resolution (aliases, initialisers, members).
const MAX_TYPE_DEPTH: usize = 24;

/// ES globals that resolve to standard library pseudo-symbols.
pub const GLOBALS: &[&str] = &[
    "undefined",
    "NaN",
    "Infinity",
    "globalThis",
    "Math",
    "JSON",
    "console",
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Symbol",
    "BigInt",
    "Promise",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "Date",
    "RegExp",
    "Reflect",
    "Proxy",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "encodeURIComponent",
    "decodeURIComponent",
    "setTimeout",
    "clearTimeout",
    "setInterval",
    "clearInterval",
    "ReadonlyArray",
    "Record",
    "Partial",
    "Readonly",
    "Function",
];

#[derive(Debug, Default)]
pub struct Program {
    units: Vec<BoundUnit>,
    by_path: HashMap<PathBuf, UnitId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next added unit must carry.
    pub fn next_unit(&self) -> UnitId {
        UnitId(self.units.len() as u32)
    }

    /// Bind `tree` and add it to the program.
    pub fn add_tree(&mut self, tree: SyntaxTree) -> Result<UnitId> {
        let unit = self.next_unit();
        if tree.unit() != unit {
            bail!(
                "{}: lowered as unit {} but the program expects unit {}",
                tree.path().display(),
                tree.unit().0,
                unit.0
            );
        }
        let path = normalize(tree.path());
        if self.by_path.contains_key(&path) {
            bail!("{}: unit added twice", path.display());
        }
        self.by_path.insert(path, unit);
        self.units.push(bind(tree));
        Ok(unit)
    }

    /// Parse, lower and bind one source file.
    ///
    /// Parse problems are pushed into `sink`; a fatal parse error is also returned.
    pub fn add_source(
        &mut self,
        path: &Path,
        source: &str,
        cache: &mut SourceCache,
        sink: &mut Diagnostics,
    ) -> Result<UnitId> {
        let filename = path.to_string_lossy();
        let parsed = ferry_parser::parse_typescript_reporting(source, &filename, cache, sink)?;
        sink.extend(parsed.diagnostics.clone());
        let tree = lower_module(&parsed, source, path, self.next_unit())?;
        self.add_tree(tree)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, unit: UnitId) -> Option<&BoundUnit> {
        self.units.get(unit.index())
    }

    pub fn tree(&self, unit: UnitId) -> Option<&SyntaxTree> {
        self.unit(unit).map(|u| &u.tree)
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> {
        (0..self.units.len() as u32).map(UnitId)
    }

    pub fn unit_by_path(&self, path: &Path) -> Option<UnitId> {
        self.by_path.get(&normalize(path)).copied()
    }

    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.unit(id.unit)?.symbol(id.index)
    }

    /// Resolve a relative module specifier from `from`.
    pub fn resolve_specifier(&self, from: UnitId, specifier: &str) -> Option<UnitId> {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return None;
        }
        let dir = self.tree(from)?.path().parent().unwrap_or(Path::new(""));
        let base = normalize(&dir.join(specifier));
        let mut candidates = Vec::new();
        if base.extension().is_some_and(|e| e == "ts") {
            candidates.push(base.clone());
        }
        let mut with_ext = base.clone().into_os_string();
        with_ext.push(".ts");
        candidates.push(PathBuf::from(with_ext));
        candidates.push(base.join("index.ts"));
        candidates
            .iter()
            .find_map(|c| self.by_path.get(c).copied())
    }

    /// One alias hop: the symbol an import or re-export names, if it can be found.
    fn alias_target(&self, id: SymbolId) -> Option<SymbolId> {
        let symbol = self.symbol(id)?;
        let target = symbol.import.as_ref()?;
        let unit = self.resolve_specifier(id.unit, &target.source)?;
        let exporting = self.unit(unit)?;
        let index = match &target.imported {
            ImportedName::Named(name) => exporting.export(name)?,
            ImportedName::Default => exporting.export("default")?,
            ImportedName::Namespace => return None,
        };
        Some(SymbolId::new(unit, index))
    }

    /// Whether an import can be followed to its declaring unit.
    pub fn import_resolves(&self, symbol: SymbolId) -> bool {
        self.alias_target(symbol).is_some()
    }

    fn global(&self, name: &str) -> Option<SymbolId> {
        GLOBALS
            .iter()
            .position(|g| *g == name)
            .map(|i| SymbolId::new(UnitId::LIB, i as u32))
    }

    fn types(&self) -> TypeResolver<'_> {
        TypeResolver {
            program: self,
            depth: 0,
        }
    }
}

impl TypeOracle for Program {
    fn resolve_type(&self, unit: UnitId, node: NodeId) -> TypeDescriptor {
        self.types().node_type(unit, node)
    }

    fn resolve_symbol(&self, unit: UnitId, node: NodeId) -> Option<SymbolId> {
        let bound = self.unit(unit)?;
        if let Some(index) = bound.symbol_at(node) {
            return Some(SymbolId::new(unit, index));
        }
        let tree = &bound.tree;
        match tree.kind(node) {
            SyntaxKind::Ident | SyntaxKind::ShorthandProp | SyntaxKind::BindingIdent => {
                self.global(tree.name(node)?)
            }
            SyntaxKind::Member => self.resolve_symbol(unit, tree.child(node, Role::Property)?),
            SyntaxKind::PropIdent => {
                let parent = tree.parent(node)?;
                if tree.kind(parent) != SyntaxKind::Member || tree.role(node) != Role::Property {
                    return None;
                }
                let object = tree.child(parent, Role::Object)?;
                let name = tree.name(node)?;
                let ty = self.resolve_type(unit, object);
                self.types().member(&ty, name)
            }
            _ => None,
        }
    }

    fn resolve_alias(&self, symbol: SymbolId) -> SymbolId {
        let mut current = symbol;
        for _ in 0..MAX_ALIAS_HOPS {
            match self.alias_target(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    fn symbol_info(&self, symbol: SymbolId) -> Option<SymbolInfo> {
        if symbol.unit == UnitId::LIB {
            let name = GLOBALS.get(symbol.index as usize)?;
            return Some(SymbolInfo {
                id: symbol,
                name: name.to_string(),
                kind: SymbolKind::Global,
                declaration: None,
                exported: false,
            });
        }
        let s = self.symbol(symbol)?;
        Some(SymbolInfo {
            id: symbol,
            name: s.name.clone(),
            kind: s.kind,
            declaration: Some(s.declaration),
            exported: s.exported,
        })
    }

    fn unit_path(&self, unit: UnitId) -> Option<&Path> {
        self.tree(unit).map(|t| t.path())
    }
}

/// Lexically normalise a path: drop `.` and fold `..` where possible.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Computes types on demand. Nothing is cached; the depth counter bounds
/// recursion through aliases and initialisers.
struct TypeResolver<'p> {
    program: &'p Program,
    depth: usize,
}

impl<'p> TypeResolver<'p> {
    fn deeper(&self) -> Option<TypeResolver<'p>> {
        (self.depth < MAX_TYPE_DEPTH).then(|| TypeResolver {
            program: self.program,
            depth: self.depth + 1,
        })
    }

    fn node_type(&self, unit: UnitId, node: NodeId) -> TypeDescriptor {
        let Some(next) = self.deeper() else {
            return TypeDescriptor::unknown();
        };
        let Some(tree) = self.program.tree(unit) else {
            return TypeDescriptor::unknown();
        };
        let kind = tree.kind(node);
        if kind.is_type() {
            return next.annotation_type(unit, node);
        }
        match kind {
            SyntaxKind::Number => TypeDescriptor::with_flags(TypeFlags::NUMBER_LITERAL),
            SyntaxKind::String => TypeDescriptor::with_flags(TypeFlags::STRING_LITERAL),
            SyntaxKind::Bool => TypeDescriptor::with_flags(TypeFlags::BOOLEAN_LITERAL),
            SyntaxKind::Null => TypeDescriptor::with_flags(TypeFlags::NULLABLE),
            SyntaxKind::Template => {
                let interpolated = tree.children_with(node, Role::Expression).next().is_some();
                TypeDescriptor::with_flags(if interpolated {
                    TypeFlags::STRING
                } else {
                    TypeFlags::STRING_LITERAL
                })
            }
            SyntaxKind::Regex => TypeDescriptor::named("RegExp", None),
            SyntaxKind::ArrayLit => TypeDescriptor::named("Array", None),
            SyntaxKind::ObjectLit => TypeDescriptor::with_flags(TypeFlags::OBJECT),
            SyntaxKind::FnExpr | SyntaxKind::Arrow | SyntaxKind::ClassExpr => {
                TypeDescriptor::with_flags(TypeFlags::FUNCTION)
            }
            SyntaxKind::Ident | SyntaxKind::ShorthandProp | SyntaxKind::BindingIdent => {
                match self.program.resolve_symbol(unit, node) {
                    Some(symbol) => next.symbol_type(symbol),
                    None => TypeDescriptor::unknown(),
                }
            }
            SyntaxKind::This => match enclosing_class(tree, node) {
                Some(class) => match self.program.resolve_symbol(unit, class) {
                    Some(symbol) => next.symbol_type(symbol),
                    None => TypeDescriptor::with_flags(TypeFlags::OBJECT),
                },
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::Paren
            | SyntaxKind::Satisfies
            | SyntaxKind::ConstAssertion
            | SyntaxKind::Instantiation => match tree.child(node, Role::Expression) {
                Some(inner) => next.node_type(unit, inner),
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::NonNull => match tree.child(node, Role::Expression) {
                Some(inner) => {
                    let mut ty = next.node_type(unit, inner);
                    ty.flags.remove(TypeFlags::NULLABLE);
                    ty
                }
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::AsExpr | SyntaxKind::TypeAssertion => match tree.child(node, Role::TypeAnn)
            {
                Some(ty) => next.annotation_type(unit, ty),
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::Unary => match tree.data(node) {
                NodeData::Unary(UnaryOp::Not | UnaryOp::Delete) => {
                    TypeDescriptor::with_flags(TypeFlags::BOOLEAN)
                }
                NodeData::Unary(UnaryOp::TypeOf) => TypeDescriptor::with_flags(TypeFlags::STRING),
                NodeData::Unary(UnaryOp::Void) => TypeDescriptor::with_flags(TypeFlags::NULLABLE),
                _ => TypeDescriptor::with_flags(TypeFlags::NUMBER),
            },
            SyntaxKind::Update => TypeDescriptor::with_flags(TypeFlags::NUMBER),
            SyntaxKind::Binary => next.binary_type(unit, tree, node),
            SyntaxKind::Assign => match tree.child(node, Role::Right) {
                Some(right) => next.node_type(unit, right),
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::Cond => {
                let cons = tree.child(node, Role::Consequent).map(|c| next.node_type(unit, c));
                let alt = tree.child(node, Role::Alternate).map(|a| next.node_type(unit, a));
                match (cons, alt) {
                    (Some(a), Some(b)) => union_of(vec![a, b]),
                    _ => TypeDescriptor::unknown(),
                }
            }
            SyntaxKind::Await => match tree.child(node, Role::Operand) {
                Some(inner) => {
                    let ty = next.node_type(unit, inner);
                    if ty.is_named("Promise") {
                        ty.argument.map(|a| *a).unwrap_or_default()
                    } else {
                        ty
                    }
                }
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::Call => next.call_type(unit, tree, node),
            SyntaxKind::New => {
                let Some(callee) = tree.child(node, Role::Callee) else {
                    return TypeDescriptor::unknown();
                };
                match self.program.resolve_symbol(unit, callee) {
                    Some(symbol) => next.instance_type(symbol),
                    None => TypeDescriptor::with_flags(TypeFlags::OBJECT),
                }
            }
            SyntaxKind::Member => {
                let (Some(object), Some(prop)) =
                    (tree.child(node, Role::Object), tree.child(node, Role::Property))
                else {
                    return TypeDescriptor::unknown();
                };
                let Some(name) = tree.name(prop) else {
                    return TypeDescriptor::unknown();
                };
                let object_ty = next.node_type(unit, object);
                if name == "length"
                    && (object_ty.is_string() || object_ty.is_named("Array"))
                {
                    return TypeDescriptor::with_flags(TypeFlags::NUMBER);
                }
                match next.member(&object_ty, name) {
                    Some(member) => next.symbol_type(member),
                    None => TypeDescriptor::unknown(),
                }
            }
            SyntaxKind::OptChain => match tree.child(node, Role::Expression) {
                Some(inner) => {
                    let mut ty = next.node_type(unit, inner);
                    ty.flags.insert(TypeFlags::NULLABLE);
                    ty
                }
                None => TypeDescriptor::unknown(),
            },
            _ => TypeDescriptor::unknown(),
        }
    }

    fn binary_type(&self, unit: UnitId, tree: &SyntaxTree, node: NodeId) -> TypeDescriptor {
        let NodeData::Binary(op) = tree.data(node) else {
            return TypeDescriptor::unknown();
        };
        let left = tree.child(node, Role::Left).map(|l| self.node_type(unit, l));
        let right = tree.child(node, Role::Right).map(|r| self.node_type(unit, r));
        let (Some(left), Some(right)) = (left, right) else {
            return TypeDescriptor::unknown();
        };
        match op {
            op if op.is_comparison() => TypeDescriptor::with_flags(TypeFlags::BOOLEAN),
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                if left.is_boolean() && right.is_boolean() {
                    TypeDescriptor::with_flags(TypeFlags::BOOLEAN)
                } else {
                    union_of(vec![left, right])
                }
            }
            BinaryOp::NullishCoalescing => {
                let mut left = left;
                left.flags.remove(TypeFlags::NULLABLE);
                union_of(vec![left, right])
            }
            BinaryOp::Add => {
                if left.is_string() || right.is_string() {
                    TypeDescriptor::with_flags(TypeFlags::STRING)
                } else if left.is_number() && right.is_number() {
                    TypeDescriptor::with_flags(TypeFlags::NUMBER)
                } else {
                    TypeDescriptor::unknown()
                }
            }
            _ => TypeDescriptor::with_flags(TypeFlags::NUMBER),
        }
    }

    fn call_type(&self, unit: UnitId, tree: &SyntaxTree, node: NodeId) -> TypeDescriptor {
        let Some(callee) = tree.child(node, Role::Callee) else {
            return TypeDescriptor::unknown();
        };
        let Some(symbol) = self.program.resolve_symbol(unit, callee) else {
            // `Promise.resolve(..)` and friends on the library class.
            if tree.kind(callee) == SyntaxKind::Member {
                let object = tree.child(callee, Role::Object);
                let global = object.and_then(|o| self.program.resolve_symbol(unit, o));
                if let Some(global) = global.filter(|g| g.unit == UnitId::LIB) {
                    if GLOBALS.get(global.index as usize) == Some(&"Promise") {
                        return TypeDescriptor::named("Promise", None);
                    }
                }
            }
            return TypeDescriptor::unknown();
        };
        if symbol.unit == UnitId::LIB {
            return match GLOBALS.get(symbol.index as usize).copied() {
                Some("parseInt" | "parseFloat" | "Number") => {
                    TypeDescriptor::with_flags(TypeFlags::NUMBER)
                }
                Some("String") => TypeDescriptor::with_flags(TypeFlags::STRING),
                Some("Boolean" | "isNaN" | "isFinite") => {
                    TypeDescriptor::with_flags(TypeFlags::BOOLEAN)
                }
                _ => TypeDescriptor::unknown(),
            };
        }
        self.return_type(symbol)
    }

    /// Declared return type of a function-valued symbol; async functions
    /// without an annotation return `Promise`.
    fn return_type(&self, symbol: SymbolId) -> TypeDescriptor {
        let root = self.program.resolve_alias(symbol);
        let Some(s) = self.program.symbol(root) else {
            return TypeDescriptor::unknown();
        };
        if let Some(returns) = s.returns {
            return self.annotation_type(root.unit, returns);
        }
        if s.is_async {
            return TypeDescriptor::named("Promise", None);
        }
        // `const f = async (): Promise<T> => ..`
        let Some(tree) = self.program.tree(root.unit) else {
            return TypeDescriptor::unknown();
        };
        if let Some(init) = s.init.filter(|&i| tree.kind(i).is_function_like()) {
            if let Some(ret) = annotation(tree, init, Role::ReturnType) {
                return self.annotation_type(root.unit, ret);
            }
            if tree.has_flag(init, NodeFlags::ASYNC) {
                return TypeDescriptor::named("Promise", None);
            }
        }
        if let Some(ty) = s.type_node.filter(|&t| tree.kind(t) == SyntaxKind::FnType) {
            if let Some(ret) = annotation(tree, ty, Role::ReturnType) {
                return self.annotation_type(root.unit, ret);
            }
        }
        TypeDescriptor::unknown()
    }

    fn symbol_type(&self, symbol: SymbolId) -> TypeDescriptor {
        if symbol.unit == UnitId::LIB {
            return global_type(GLOBALS.get(symbol.index as usize).copied().unwrap_or(""));
        }
        let root = self.program.resolve_alias(symbol);
        let Some(s) = self.program.symbol(root) else {
            return TypeDescriptor::unknown();
        };
        let Some(tree) = self.program.tree(root.unit) else {
            return TypeDescriptor::unknown();
        };
        match s.kind {
            SymbolKind::Function => TypeDescriptor::with_flags(TypeFlags::FUNCTION),
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum => {
                TypeDescriptor::named(s.name.clone(), Some(root))
            }
            SymbolKind::TypeAlias => match s.type_node {
                Some(ty) => self.annotation_type(root.unit, ty),
                None => TypeDescriptor::unknown(),
            },
            SymbolKind::Import | SymbolKind::TypeParameter | SymbolKind::Global => {
                TypeDescriptor::unknown()
            }
            _ => {
                if let Some(ty) = s.type_node {
                    let mut desc = self.annotation_type(root.unit, ty);
                    if tree.has_flag(s.declaration, NodeFlags::OPTIONAL) {
                        desc.flags.insert(TypeFlags::NULLABLE);
                    }
                    return desc;
                }
                match s.init {
                    Some(init) => {
                        let ty = self.node_type(root.unit, init);
                        if is_const_binding(tree, s) {
                            ty
                        } else {
                            widen(ty)
                        }
                    }
                    None => TypeDescriptor::unknown(),
                }
            }
        }
    }

    /// Type of `new C()` for a class symbol.
    fn instance_type(&self, symbol: SymbolId) -> TypeDescriptor {
        if symbol.unit == UnitId::LIB {
            let name = GLOBALS.get(symbol.index as usize).copied().unwrap_or("Object");
            return TypeDescriptor::named(name, None);
        }
        let root = self.program.resolve_alias(symbol);
        match self.program.symbol(root) {
            Some(s) if s.kind == SymbolKind::Class => TypeDescriptor::named(s.name.clone(), Some(root)),
            _ => TypeDescriptor::with_flags(TypeFlags::OBJECT),
        }
    }

    /// Find a member on a named type, following `extends` chains.
    fn member(&self, ty: &TypeDescriptor, name: &str) -> Option<SymbolId> {
        let declaration = ty.declaration?;
        self.member_of(declaration, name, 0)
    }

    fn member_of(&self, owner: SymbolId, name: &str, hops: usize) -> Option<SymbolId> {
        if hops > MAX_ALIAS_HOPS {
            return None;
        }
        let s = self.program.symbol(owner)?;
        if let Some(index) = s.member(name) {
            return Some(SymbolId::new(owner.unit, index));
        }
        s.bases.iter().find_map(|&base| {
            let symbol = self.program.resolve_symbol(owner.unit, base)?;
            let root = self.program.resolve_alias(symbol);
            self.member_of(root, name, hops + 1)
        })
    }

    fn annotation_type(&self, unit: UnitId, ty: NodeId) -> TypeDescriptor {
        let Some(next) = self.deeper() else {
            return TypeDescriptor::unknown();
        };
        let Some(tree) = self.program.tree(unit) else {
            return TypeDescriptor::unknown();
        };
        match tree.kind(ty) {
            SyntaxKind::KeywordType => match tree.data(ty) {
                NodeData::Keyword(k) => keyword_type(*k),
                _ => TypeDescriptor::unknown(),
            },
            SyntaxKind::LiteralType => match tree.data(ty) {
                NodeData::Num(_) => TypeDescriptor::with_flags(TypeFlags::NUMBER_LITERAL),
                NodeData::Str(_) => TypeDescriptor::with_flags(TypeFlags::STRING_LITERAL),
                NodeData::Bool(_) => TypeDescriptor::with_flags(TypeFlags::BOOLEAN_LITERAL),
                _ => TypeDescriptor::unknown(),
            },
            SyntaxKind::TemplateLiteralType => TypeDescriptor::with_flags(TypeFlags::STRING),
            SyntaxKind::ArrayType | SyntaxKind::TupleType => TypeDescriptor::named("Array", None),
            SyntaxKind::FnType | SyntaxKind::ConstructorType => {
                TypeDescriptor::with_flags(TypeFlags::FUNCTION)
            }
            SyntaxKind::TypeLiteral | SyntaxKind::IntersectionType | SyntaxKind::MappedType => {
                TypeDescriptor::with_flags(TypeFlags::OBJECT)
            }
            SyntaxKind::ParenType | SyntaxKind::OptionalType => match tree.child(ty, Role::Element)
            {
                Some(inner) => next.annotation_type(unit, inner),
                None => TypeDescriptor::unknown(),
            },
            SyntaxKind::TypePredicate => TypeDescriptor::with_flags(TypeFlags::BOOLEAN),
            SyntaxKind::UnionType => {
                let members = tree
                    .children_with(ty, Role::Element)
                    .map(|m| next.annotation_type(unit, m))
                    .collect();
                union_of(members)
            }
            SyntaxKind::TypeRef => next.type_ref(unit, tree, ty),
            _ => TypeDescriptor::unknown(),
        }
    }

    fn type_ref(&self, unit: UnitId, tree: &SyntaxTree, ty: NodeId) -> TypeDescriptor {
        let Some(name_node) = tree.child(ty, Role::Name) else {
            return TypeDescriptor::unknown();
        };
        let first_arg = tree
            .child(ty, Role::TypeArgs)
            .and_then(|args| tree.children_with(args, Role::Element).next());
        if let Some(symbol) = self.program.resolve_symbol(unit, name_node) {
            if symbol.unit != UnitId::LIB {
                let root = self.program.resolve_alias(symbol);
                return match self.program.symbol(root).map(|s| s.kind) {
                    Some(SymbolKind::TypeParameter) | None => TypeDescriptor::unknown(),
                    Some(SymbolKind::Import) => {
                        let name = tree.name(name_node).unwrap_or_default();
                        TypeDescriptor::named(name, None)
                    }
                    _ => self.symbol_type(root),
                };
            }
        }
        let name = match tree.kind(name_node) {
            SyntaxKind::QualifiedName => tree.text(name_node),
            _ => tree.name(name_node).unwrap_or_default(),
        };
        match name {
            "String" => TypeDescriptor::with_flags(TypeFlags::STRING),
            "Number" => TypeDescriptor::with_flags(TypeFlags::NUMBER),
            "Boolean" => TypeDescriptor::with_flags(TypeFlags::BOOLEAN),
            "Function" => TypeDescriptor::with_flags(TypeFlags::FUNCTION),
            "ReadonlyArray" | "Array" => TypeDescriptor::named("Array", None),
            _ => {
                let mut desc = TypeDescriptor::named(name, None);
                if let Some(arg) = first_arg {
                    desc.argument = Some(Box::new(self.annotation_type(unit, arg)));
                }
                desc
            }
        }
    }
}

fn keyword_type(keyword: KeywordType) -> TypeDescriptor {
    let flags = match keyword {
        KeywordType::Number => TypeFlags::NUMBER,
        KeywordType::String => TypeFlags::STRING,
        KeywordType::Boolean => TypeFlags::BOOLEAN,
        KeywordType::Any | KeywordType::Unknown => TypeFlags::ANY,
        KeywordType::Void => TypeFlags::VOID,
        KeywordType::Null | KeywordType::Undefined => TypeFlags::NULLABLE,
        KeywordType::Object => TypeFlags::OBJECT,
        _ => TypeFlags::empty(),
    };
    TypeDescriptor::with_flags(flags)
}

fn global_type(name: &str) -> TypeDescriptor {
    match name {
        "undefined" => TypeDescriptor::with_flags(TypeFlags::NULLABLE),
        "NaN" | "Infinity" => TypeDescriptor::with_flags(TypeFlags::NUMBER),
        "parseInt" | "parseFloat" | "isNaN" | "isFinite" | "setTimeout" | "setInterval" => {
            TypeDescriptor::with_flags(TypeFlags::FUNCTION)
        }
        _ => TypeDescriptor::named(name, None),
    }
}

/// Literal types of a mutable binding widen to their category.
fn widen(mut ty: TypeDescriptor) -> TypeDescriptor {
    for (literal, base) in [
        (TypeFlags::BOOLEAN_LITERAL, TypeFlags::BOOLEAN),
        (TypeFlags::NUMBER_LITERAL, TypeFlags::NUMBER),
        (TypeFlags::STRING_LITERAL, TypeFlags::STRING),
    ] {
        if ty.flags.contains(literal) {
            ty.flags.remove(literal);
            ty.flags.insert(base);
        }
    }
    ty
}

fn is_const_binding(tree: &SyntaxTree, symbol: &Symbol) -> bool {
    if symbol.kind == SymbolKind::Constant {
        return true;
    }
    tree.ancestors(symbol.declaration)
        .find(|&a| tree.kind(a) == SyntaxKind::VarStmt)
        .is_some_and(|stmt| matches!(tree.data(stmt), NodeData::Var(VarKind::Const)))
}

/// Combine member types into one descriptor. `null`/`undefined` members only
/// contribute `NULLABLE`; a single remaining member is returned as itself.
fn union_of(types: Vec<TypeDescriptor>) -> TypeDescriptor {
    let mut nullable = false;
    let mut members: Vec<TypeDescriptor> = Vec::new();
    for ty in types {
        if ty.flags == TypeFlags::NULLABLE {
            nullable = true;
            continue;
        }
        if ty.flags.contains(TypeFlags::NULLABLE) {
            nullable = true;
        }
        let mut ty = ty;
        ty.flags.remove(TypeFlags::NULLABLE);
        if ty.flags.contains(TypeFlags::UNION) {
            members.extend(ty.members);
        } else if !members.contains(&ty) {
            members.push(ty);
        }
    }
    let mut result = match members.len() {
        0 => TypeDescriptor::unknown(),
        1 => members.remove(0),
        _ => {
            let flags = members
                .iter()
                .fold(TypeFlags::UNION, |acc, m| acc | m.flags);
            TypeDescriptor {
                flags,
                members,
                ..TypeDescriptor::default()
            }
        }
    };
    if nullable {
        result.flags.insert(TypeFlags::NULLABLE);
    }
    result
}

fn enclosing_class(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&a| matches!(tree.kind(a), SyntaxKind::ClassDecl | SyntaxKind::ClassExpr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(files: &[(&str, &str)]) -> Program {
        let mut program = Program::new();
        let mut cache = SourceCache::new();
        let mut sink = Diagnostics::new();
        for (path, source) in files {
            program
                .add_source(Path::new(path), source, &mut cache, &mut sink)
                .unwrap();
        }
        program
    }

    fn ident(program: &Program, unit: UnitId, name: &str) -> NodeId {
        let tree = program.tree(unit).unwrap();
        tree.ids()
            .filter(|&id| tree.kind(id) == SyntaxKind::Ident && tree.name(id) == Some(name))
            .last()
            .unwrap()
    }

    #[test]
    fn test_literal_and_annotation_types() {
        let p = program(&[(
            "src/a.ts",
            "const n = 0;\nlet s = 'x';\nlet o: string | null = null;\nlet b: boolean = true;\nn; s; o; b;",
        )]);
        let unit = UnitId(0);
        let n = p.resolve_type(unit, ident(&p, unit, "n"));
        assert_eq!(n.flags, TypeFlags::NUMBER_LITERAL);
        let s = p.resolve_type(unit, ident(&p, unit, "s"));
        assert_eq!(s.flags, TypeFlags::STRING);
        let o = p.resolve_type(unit, ident(&p, unit, "o"));
        assert!(o.flags.contains(TypeFlags::NULLABLE));
        assert!(!o.is_string());
        assert!(p.resolve_type(unit, ident(&p, unit, "b")).is_boolean());
    }

    #[test]
    fn test_async_function_returns_promise() {
        let p = program(&[(
            "a.ts",
            "async function f() { return 1; }\nfunction g(): Promise<number> { return f(); }\nconst x = f();\nconst y = g();\nx; y;",
        )]);
        let unit = UnitId(0);
        assert!(p.resolve_type(unit, ident(&p, unit, "x")).is_named("Promise"));
        let y = p.resolve_type(unit, ident(&p, unit, "y"));
        assert!(y.is_named("Promise"));
        assert!(y.argument.unwrap().is_number());
    }

    #[test]
    fn test_imports_resolve_across_units() {
        let p = program(&[
            ("src/lib/util.ts", "export function helper(): number { return 1; }"),
            ("src/lib/index.ts", "export { helper } from './util';"),
            ("src/main.ts", "import { helper } from './lib';\nhelper();"),
        ]);
        let main = p.unit_by_path(Path::new("src/main.ts")).unwrap();
        let reference = ident(&p, main, "helper");
        let symbol = p.resolve_symbol(main, reference).unwrap();
        let root = p.resolve_alias(symbol);
        assert_eq!(root.unit, UnitId(0));
        let info = p.symbol_info(root).unwrap();
        assert_eq!(info.name, "helper");
        assert_eq!(info.kind, SymbolKind::Function);
        assert_eq!(p.unit_path(root.unit), Some(Path::new("src/lib/util.ts")));
    }

    #[test]
    fn test_globals_are_standard_library() {
        let p = program(&[("a.ts", "console.log(undefined, NaN);")]);
        let unit = UnitId(0);
        let console = p.resolve_symbol(unit, ident(&p, unit, "console")).unwrap();
        assert!(p.is_from_standard_library(console));
        assert_eq!(p.symbol_info(console).unwrap().kind, SymbolKind::Global);
        let undef = p.resolve_type(unit, ident(&p, unit, "undefined"));
        assert_eq!(undef.flags, TypeFlags::NULLABLE);
    }

    #[test]
    fn test_member_types_follow_class_and_interface() {
        let p = program(&[(
            "a.ts",
            "interface Base { id: number }\ninterface Named extends Base { name: string }\nclass C { count = 0; label(): string { return ''; } }\nfunction f(n: Named, c: C) { n.id; n.name; c.count; c.label(); }",
        )]);
        let unit = UnitId(0);
        let tree = p.tree(unit).unwrap();
        let members: Vec<_> = tree
            .ids()
            .filter(|&id| tree.kind(id) == SyntaxKind::Member)
            .collect();
        assert!(p.resolve_type(unit, members[0]).is_number());
        assert!(p.resolve_type(unit, members[1]).is_string());
        assert!(p.resolve_type(unit, members[2]).is_number());
        let call = tree.parent(members[3]).unwrap();
        assert!(p.resolve_type(unit, call).is_string());
    }

    #[test]
    fn test_type_alias_union_members() {
        let p = program(&[(
            "a.ts",
            "type U = 'a' | 'b' | number | undefined;\nlet u: U;\nu;",
        )]);
        let unit = UnitId(0);
        let u = p.resolve_type(unit, ident(&p, unit, "u"));
        assert!(u.flags.contains(TypeFlags::UNION));
        assert!(u.flags.contains(TypeFlags::NULLABLE));
        // Identical literal descriptors collapse: string literal and number.
        assert_eq!(u.members.len(), 2);
    }

    #[test]
    fn test_unit_ids_must_match() {
        let mut p = Program::new();
        let tree = SyntaxTree::new(UnitId(3), ferry_diagnostics::FileId(0), "x.ts", String::new());
        assert!(p.add_tree(tree).is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("src/./a/../b.ts")), PathBuf::from("src/b.ts"));
    }
}
