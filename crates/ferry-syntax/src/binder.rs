//! Per-unit name binding.
//!
//! Binding runs in two passes per scope: declarations directly inside a scope
//! are hoisted first, then the scope is walked and identifier references are
//! resolved against the scope chain. Class, interface and enum members get
//! symbols of their own so member accesses can be resolved by the type oracle.

use crate::kind::{NodeData, NodeFlags, Role, SyntaxKind, VarKind};
use crate::tree::SyntaxTree;
use ferry_types::{NodeId, SymbolKind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

/// Where an import (or a re-export) points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub source: String,
    pub imported: ImportedName,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Node that names the binding.
    pub declaration: NodeId,
    /// Construct that introduces the binding (declarator, function, member...).
    pub owner: NodeId,
    pub type_node: Option<NodeId>,
    pub init: Option<NodeId>,
    /// Declared return type of functions and methods.
    pub returns: Option<NodeId>,
    pub is_async: bool,
    pub exported: bool,
    pub import: Option<ImportTarget>,
    /// Member name to symbol index, for classes, interfaces and enums.
    pub members: Vec<(String, u32)>,
    /// `extends` expressions of classes and interfaces.
    pub bases: Vec<NodeId>,
}

impl Symbol {
    fn new(name: String, kind: SymbolKind, declaration: NodeId, owner: NodeId) -> Self {
        Self {
            name,
            kind,
            declaration,
            owner,
            type_node: None,
            init: None,
            returns: None,
            is_async: false,
            exported: false,
            import: None,
            members: Vec::new(),
            bases: Vec::new(),
        }
    }

    pub fn member(&self, name: &str) -> Option<u32> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, index)| *index)
    }
}

/// A syntax tree together with its symbol table.
#[derive(Debug, Clone)]
pub struct BoundUnit {
    pub tree: SyntaxTree,
    pub symbols: Vec<Symbol>,
    /// Declarations and resolved references, by node.
    pub bindings: HashMap<NodeId, u32>,
    /// Exported name to symbol; the default export is stored as `"default"`.
    pub exports: HashMap<String, u32>,
}

impl BoundUnit {
    pub fn symbol(&self, index: u32) -> Option<&Symbol> {
        self.symbols.get(index as usize)
    }

    pub fn symbol_at(&self, node: NodeId) -> Option<u32> {
        self.bindings.get(&node).copied()
    }

    pub fn export(&self, name: &str) -> Option<u32> {
        self.exports.get(name).copied()
    }
}

/// Bind every name in `tree`.
pub fn bind(tree: SyntaxTree) -> BoundUnit {
    let mut binder = Binder {
        tree,
        symbols: Vec::new(),
        bindings: HashMap::new(),
        exports: HashMap::new(),
        scopes: Vec::new(),
    };
    let root = binder.tree.root();
    binder.visit(root);
    log::debug!(
        "bound {}: {} symbols, {} exports",
        binder.tree.path().display(),
        binder.symbols.len(),
        binder.exports.len()
    );
    BoundUnit {
        tree: binder.tree,
        symbols: binder.symbols,
        bindings: binder.bindings,
        exports: binder.exports,
    }
}

/// Name of a property key node, when it is statically known.
pub fn member_name(tree: &SyntaxTree, key: NodeId) -> Option<String> {
    match tree.data(key) {
        NodeData::Name(name) => Some(name.clone()),
        NodeData::Str(s) => Some(s.clone()),
        NodeData::Num(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Type node under a `TypeAnn` child with the given role.
pub fn annotation(tree: &SyntaxTree, id: NodeId, role: Role) -> Option<NodeId> {
    let ann = tree.child(id, role)?;
    tree.child(ann, Role::Element)
}

struct Binder {
    tree: SyntaxTree,
    symbols: Vec<Symbol>,
    bindings: HashMap<NodeId, u32>,
    exports: HashMap<String, u32>,
    scopes: Vec<HashMap<String, u32>>,
}

impl Binder {
    fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    fn declare(&mut self, symbol: Symbol) -> u32 {
        let index = self.symbols.len() as u32;
        self.bindings.insert(symbol.declaration, index);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol.name.clone(), index);
        }
        self.symbols.push(symbol);
        index
    }

    /// A symbol that lives in a member table, not in a scope.
    fn declare_member(&mut self, symbol: Symbol) -> u32 {
        let index = self.symbols.len() as u32;
        self.bindings.insert(symbol.declaration, index);
        self.bindings.insert(symbol.owner, index);
        self.symbols.push(symbol);
        index
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.children(id).to_vec()
    }

    fn visit_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.visit(child);
        }
    }

    fn visit(&mut self, id: NodeId) {
        let kind = self.tree.kind(id);
        match kind {
            SyntaxKind::Module | SyntaxKind::Block => {
                self.push();
                self.hoist(id);
                self.visit_children(id);
                self.pop();
            }
            SyntaxKind::ClassDecl | SyntaxKind::ClassExpr => self.visit_class(id),
            k if k.is_function_like() => self.visit_function(id),
            SyntaxKind::InterfaceDecl | SyntaxKind::TypeAliasDecl => {
                self.push();
                self.declare_type_params(id);
                self.visit_children(id);
                self.pop();
            }
            SyntaxKind::FnType | SyntaxKind::MethodSignature => {
                self.push();
                self.declare_type_params(id);
                self.declare_params(id);
                self.visit_children(id);
                self.pop();
            }
            SyntaxKind::Catch => {
                self.push();
                if let Some(param) = self.tree.child(id, Role::Param) {
                    self.declare_pattern(param, SymbolKind::CatchBinding, id, None);
                }
                self.visit_children(id);
                self.pop();
            }
            SyntaxKind::For | SyntaxKind::ForIn | SyntaxKind::ForOf | SyntaxKind::SwitchCase => {
                self.push();
                self.visit_children(id);
                self.pop();
            }
            SyntaxKind::VarStmt => {
                self.declare_var_stmt(id);
                self.visit_children(id);
            }
            SyntaxKind::Ident | SyntaxKind::ShorthandProp => self.resolve_reference(id),
            SyntaxKind::BindingIdent => {
                // Binding identifiers inside assignment patterns are references.
                if !self.bindings.contains_key(&id) {
                    self.resolve_reference(id);
                }
                self.visit_children(id);
            }
            SyntaxKind::Import => {}
            SyntaxKind::ExportNamed => self.bind_named_export(id),
            SyntaxKind::ExportDefaultExpr => {
                self.visit_children(id);
                let target = self
                    .tree
                    .child(id, Role::Expression)
                    .and_then(|e| self.bindings.get(&e).copied());
                if let Some(index) = target {
                    self.exports.insert("default".to_string(), index);
                }
            }
            _ => self.visit_children(id),
        }
    }

    fn resolve_reference(&mut self, id: NodeId) {
        if let Some(name) = self.tree.name(id) {
            if let Some(index) = self.lookup(name) {
                self.bindings.insert(id, index);
            }
        }
    }

    /// Declare the direct declarations of a module or block.
    fn hoist(&mut self, scope: NodeId) {
        for item in self.children(scope) {
            let (decl, exported) = match self.tree.kind(item) {
                SyntaxKind::ExportDecl | SyntaxKind::ExportDefaultDecl => {
                    match self.tree.child(item, Role::Declaration) {
                        Some(decl) => (decl, true),
                        None => continue,
                    }
                }
                _ => (item, false),
            };
            let declared = match self.tree.kind(decl) {
                SyntaxKind::FnDecl => self.declare_function(decl),
                SyntaxKind::ClassDecl => self.declare_class(decl),
                SyntaxKind::InterfaceDecl => self.declare_interface(decl),
                SyntaxKind::TypeAliasDecl => self.declare_named(decl, SymbolKind::TypeAlias),
                SyntaxKind::EnumDecl => self.declare_enum(decl),
                SyntaxKind::VarStmt => {
                    let names = self.declare_var_stmt(decl);
                    if exported {
                        for index in names {
                            self.export_symbol(index, None);
                        }
                    }
                    None
                }
                SyntaxKind::Import => {
                    self.declare_imports(decl);
                    None
                }
                _ => None,
            };
            if let (Some(index), true) = (declared, exported) {
                let default = self.tree.has_flag(decl, NodeFlags::DEFAULT_EXPORT);
                self.export_symbol(index, default.then_some("default"));
            }
        }
    }

    fn export_symbol(&mut self, index: u32, name: Option<&str>) {
        let symbol = &mut self.symbols[index as usize];
        symbol.exported = true;
        let name = name.map(str::to_string).unwrap_or_else(|| symbol.name.clone());
        self.exports.insert(name, index);
    }

    fn declare_named(&mut self, decl: NodeId, kind: SymbolKind) -> Option<u32> {
        let name_node = self.tree.child(decl, Role::Name)?;
        let name = self.tree.name(name_node)?.to_string();
        let mut symbol = Symbol::new(name, kind, name_node, decl);
        if kind == SymbolKind::TypeAlias {
            symbol.type_node = self.tree.child(decl, Role::Value);
        }
        let index = self.declare(symbol);
        self.bindings.insert(decl, index);
        Some(index)
    }

    fn declare_function(&mut self, decl: NodeId) -> Option<u32> {
        let name_node = self.tree.child(decl, Role::Name)?;
        let name = self.tree.name(name_node)?.to_string();
        let bodyless = self.tree.has_flag(decl, NodeFlags::BODYLESS);
        // Overload signatures share one symbol; the implementation owns it.
        let existing = self
            .scopes
            .last()
            .and_then(|s| s.get(&name).copied())
            .filter(|&i| self.symbols[i as usize].kind == SymbolKind::Function);
        let index = match existing {
            Some(index) => {
                self.bindings.insert(name_node, index);
                index
            }
            None => self.declare(Symbol::new(
                name,
                SymbolKind::Function,
                name_node,
                decl,
            )),
        };
        self.bindings.insert(decl, index);
        if !bodyless || existing.is_none() {
            let returns = annotation(&self.tree, decl, Role::ReturnType);
            let is_async = self.tree.has_flag(decl, NodeFlags::ASYNC);
            let symbol = &mut self.symbols[index as usize];
            symbol.owner = decl;
            symbol.returns = returns;
            symbol.is_async = is_async;
        }
        Some(index)
    }

    fn declare_class(&mut self, decl: NodeId) -> Option<u32> {
        let index = self.declare_named(decl, SymbolKind::Class)?;
        self.collect_class_members(decl, index);
        Some(index)
    }

    fn collect_class_members(&mut self, class: NodeId, index: u32) {
        let bases: Vec<NodeId> = self.tree.child(class, Role::SuperClass).into_iter().collect();
        self.symbols[index as usize].bases = bases;
        let Some(body) = self.tree.child(class, Role::Body) else {
            return;
        };
        let mut members = Vec::new();
        for member in self.children(body) {
            match self.tree.kind(member) {
                SyntaxKind::ClassProp | SyntaxKind::Method => {
                    if let Some(entry) = self.member_symbol(member) {
                        members.push(entry);
                    }
                }
                SyntaxKind::Constructor => {
                    for param in self.tree.children_with(member, Role::Param).collect::<Vec<_>>() {
                        if self.tree.kind(param) != SyntaxKind::ParamProp {
                            continue;
                        }
                        let Some(pat) = self.tree.child(param, Role::Name) else {
                            continue;
                        };
                        let ident = match self.tree.kind(pat) {
                            SyntaxKind::AssignPat => self.tree.child(pat, Role::Left),
                            _ => Some(pat),
                        };
                        let Some(ident) = ident else { continue };
                        let Some(name) = self.tree.name(ident).map(str::to_string) else {
                            continue;
                        };
                        let mut symbol =
                            Symbol::new(name.clone(), SymbolKind::Variable, param, param);
                        symbol.type_node = annotation(&self.tree, ident, Role::TypeAnn);
                        let member_index = self.declare_member(symbol);
                        members.push((name, member_index));
                    }
                }
                _ => {}
            }
        }
        self.symbols[index as usize].members = members;
    }

    /// Symbol for a property, method or signature member.
    fn member_symbol(&mut self, member: NodeId) -> Option<(String, u32)> {
        let key = self.tree.child(member, Role::Key)?;
        let name = member_name(&self.tree, key)?;
        let kind = self.tree.kind(member);
        let is_method = matches!(kind, SyntaxKind::Method | SyntaxKind::MethodSignature);
        let symbol_kind = if is_method {
            SymbolKind::Function
        } else if self.tree.has_flag(member, NodeFlags::READONLY) {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let mut symbol = Symbol::new(name.clone(), symbol_kind, key, member);
        if is_method {
            symbol.returns = annotation(&self.tree, member, Role::ReturnType);
            symbol.is_async = self.tree.has_flag(member, NodeFlags::ASYNC);
        } else {
            symbol.type_node = annotation(&self.tree, member, Role::TypeAnn);
            symbol.init = self.tree.child(member, Role::Init);
        }
        let index = self.declare_member(symbol);
        Some((name, index))
    }

    fn declare_interface(&mut self, decl: NodeId) -> Option<u32> {
        let name_node = self.tree.child(decl, Role::Name)?;
        let name = self.tree.name(name_node)?.to_string();
        // Declaration merging: a second interface with the same name extends the first.
        let existing = self
            .scopes
            .last()
            .and_then(|s| s.get(&name).copied())
            .filter(|&i| self.symbols[i as usize].kind == SymbolKind::Interface);
        let index = match existing {
            Some(index) => {
                self.bindings.insert(name_node, index);
                self.bindings.insert(decl, index);
                index
            }
            None => self.declare_named(decl, SymbolKind::Interface)?,
        };
        let bases: Vec<NodeId> = self
            .tree
            .children_with(decl, Role::Extends)
            .filter_map(|h| self.tree.child(h, Role::Expression))
            .collect();
        self.symbols[index as usize].bases.extend(bases);
        if let Some(body) = self.tree.child(decl, Role::Body) {
            for member in self.children(body) {
                if matches!(
                    self.tree.kind(member),
                    SyntaxKind::PropertySignature | SyntaxKind::MethodSignature
                ) {
                    if let Some(entry) = self.member_symbol(member) {
                        self.symbols[index as usize].members.push(entry);
                    }
                }
            }
        }
        Some(index)
    }

    fn declare_enum(&mut self, decl: NodeId) -> Option<u32> {
        let index = self.declare_named(decl, SymbolKind::Enum)?;
        let Some(body) = self.tree.child(decl, Role::Body) else {
            return Some(index);
        };
        let mut members = Vec::new();
        for member in self.tree.children_with(body, Role::Member).collect::<Vec<_>>() {
            let Some(key) = self.tree.child(member, Role::Key) else {
                continue;
            };
            let Some(name) = member_name(&self.tree, key) else {
                continue;
            };
            let mut symbol = Symbol::new(name.clone(), SymbolKind::Constant, key, member);
            symbol.init = self.tree.child(member, Role::Init);
            members.push((name, self.declare_member(symbol)));
        }
        self.symbols[index as usize].members = members;
        Some(index)
    }

    fn declare_imports(&mut self, import: NodeId) {
        let source = match self.tree.data(import) {
            NodeData::Source(source) => source.clone(),
            _ => return,
        };
        for spec in self.tree.children_with(import, Role::Specifier).collect::<Vec<_>>() {
            let NodeData::Specifier { local, remote } = self.tree.data(spec).clone() else {
                continue;
            };
            let imported = match self.tree.kind(spec) {
                SyntaxKind::ImportDefault => ImportedName::Default,
                SyntaxKind::ImportNamespace => ImportedName::Namespace,
                _ => ImportedName::Named(remote.unwrap_or_else(|| local.clone())),
            };
            let mut symbol = Symbol::new(local, SymbolKind::Import, spec, import);
            symbol.import = Some(ImportTarget {
                source: source.clone(),
                imported,
            });
            self.declare(symbol);
        }
    }

    /// Declare the names of a variable statement; returns the new symbols.
    /// Statements already declared by hoisting are skipped.
    fn declare_var_stmt(&mut self, stmt: NodeId) -> Vec<u32> {
        let kind = match self.tree.data(stmt) {
            NodeData::Var(VarKind::Const) => SymbolKind::Constant,
            _ => SymbolKind::Variable,
        };
        let mut declared = Vec::new();
        for decl in self.tree.children_with(stmt, Role::Declarator).collect::<Vec<_>>() {
            let Some(name) = self.tree.child(decl, Role::Name) else {
                continue;
            };
            let init = self.tree.child(decl, Role::Init);
            declared.extend(self.declare_pattern(name, kind, decl, init));
        }
        declared
    }

    /// Declare every binding identifier in a pattern.
    fn declare_pattern(
        &mut self,
        pat: NodeId,
        kind: SymbolKind,
        owner: NodeId,
        init: Option<NodeId>,
    ) -> Vec<u32> {
        let mut out = Vec::new();
        match self.tree.kind(pat) {
            SyntaxKind::BindingIdent => {
                if self.bindings.contains_key(&pat) {
                    return out;
                }
                let Some(name) = self.tree.name(pat).map(str::to_string) else {
                    return out;
                };
                let mut symbol = Symbol::new(name, kind, pat, owner);
                symbol.type_node = annotation(&self.tree, pat, Role::TypeAnn);
                symbol.init = init;
                out.push(self.declare(symbol));
            }
            SyntaxKind::Param | SyntaxKind::ParamProp => {
                if let Some(inner) = self.tree.child(pat, Role::Name) {
                    out.extend(self.declare_pattern(inner, kind, owner, init));
                }
            }
            SyntaxKind::AssignPat => {
                let default = self.tree.child(pat, Role::Default);
                if let Some(left) = self.tree.child(pat, Role::Left) {
                    out.extend(self.declare_pattern(left, kind, owner, default));
                }
            }
            SyntaxKind::PatShorthand => {
                let default = self.tree.child(pat, Role::Default);
                if let Some(name) = self.tree.child(pat, Role::Name) {
                    out.extend(self.declare_pattern(name, kind, owner, default));
                }
            }
            SyntaxKind::PatKeyValue => {
                if let Some(value) = self.tree.child(pat, Role::Value) {
                    out.extend(self.declare_pattern(value, kind, owner, None));
                }
            }
            SyntaxKind::RestPat => {
                if let Some(arg) = self.tree.child(pat, Role::Argument) {
                    out.extend(self.declare_pattern(arg, kind, owner, None));
                }
            }
            SyntaxKind::ObjectPat | SyntaxKind::ArrayPat => {
                for element in self.tree.children_with(pat, Role::Element).collect::<Vec<_>>() {
                    out.extend(self.declare_pattern(element, kind, owner, None));
                }
            }
            _ => {}
        }
        out
    }

    fn declare_type_params(&mut self, owner: NodeId) {
        let Some(params) = self.tree.child(owner, Role::TypeParams) else {
            return;
        };
        for param in self.tree.children_with(params, Role::Element).collect::<Vec<_>>() {
            if let Some(name) = self.tree.name(param).map(str::to_string) {
                self.declare(Symbol::new(name, SymbolKind::TypeParameter, param, param));
            }
        }
    }

    fn declare_params(&mut self, function: NodeId) {
        for param in self.tree.children_with(function, Role::Param).collect::<Vec<_>>() {
            self.declare_pattern(param, SymbolKind::Parameter, param, None);
        }
    }

    fn visit_function(&mut self, id: NodeId) {
        self.push();
        if self.tree.kind(id) == SyntaxKind::FnExpr {
            if let Some(name_node) = self.tree.child(id, Role::Name) {
                if let Some(name) = self.tree.name(name_node).map(str::to_string) {
                    let mut symbol = Symbol::new(name, SymbolKind::Function, name_node, id);
                    symbol.returns = annotation(&self.tree, id, Role::ReturnType);
                    symbol.is_async = self.tree.has_flag(id, NodeFlags::ASYNC);
                    self.declare(symbol);
                }
            }
        }
        self.declare_type_params(id);
        self.declare_params(id);
        self.visit_children(id);
        self.pop();
    }

    fn visit_class(&mut self, id: NodeId) {
        self.push();
        if self.tree.kind(id) == SyntaxKind::ClassExpr {
            if let Some(index) = self.declare_named(id, SymbolKind::Class) {
                self.collect_class_members(id, index);
            }
        }
        self.declare_type_params(id);
        self.visit_children(id);
        self.pop();
    }

    fn bind_named_export(&mut self, id: NodeId) {
        let source = match self.tree.data(id) {
            NodeData::Source(source) => Some(source.clone()),
            _ => None,
        };
        for spec in self.tree.children_with(id, Role::Specifier).collect::<Vec<_>>() {
            let NodeData::Specifier { local, remote } = self.tree.data(spec).clone() else {
                continue;
            };
            let exported = remote.clone().unwrap_or_else(|| local.clone());
            let index = match &source {
                // Re-exports become alias symbols that are not visible in scope.
                Some(source) => {
                    let mut symbol = Symbol::new(exported.clone(), SymbolKind::Import, spec, id);
                    symbol.import = Some(ImportTarget {
                        source: source.clone(),
                        imported: if local == "default" {
                            ImportedName::Default
                        } else {
                            ImportedName::Named(local)
                        },
                    });
                    self.declare_member(symbol)
                }
                None => match self.lookup(&local) {
                    Some(index) => {
                        self.bindings.insert(spec, index);
                        index
                    }
                    None => continue,
                },
            };
            self.symbols[index as usize].exported = true;
            self.exports.insert(exported, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_module;
    use ferry_diagnostics::SourceCache;
    use ferry_types::UnitId;
    use std::path::Path;

    fn bound(source: &str) -> BoundUnit {
        let mut cache = SourceCache::new();
        let parsed = ferry_parser::parse_typescript_with_cache(source, "t.ts", &mut cache).unwrap();
        bind(lower_module(&parsed, source, Path::new("t.ts"), UnitId(0)).unwrap())
    }

    fn idents<'a>(unit: &'a BoundUnit, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        unit.tree.ids().filter(move |&id| {
            unit.tree.kind(id) == SyntaxKind::Ident && unit.tree.name(id) == Some(name)
        })
    }

    #[test]
    fn test_references_resolve_to_declaration() {
        let unit = bound("let a = 1;\nfunction f() { return a + b; }\nconst b = a;");
        let refs: Vec<_> = idents(&unit, "a").collect();
        assert_eq!(refs.len(), 2);
        let first = unit.symbol_at(refs[0]).unwrap();
        assert_eq!(unit.symbol_at(refs[1]), Some(first));
        assert_eq!(unit.symbol(first).unwrap().kind, SymbolKind::Variable);
        // `b` is hoisted to the module scope before the function body is walked.
        let b = idents(&unit, "b").next().unwrap();
        assert_eq!(
            unit.symbol(unit.symbol_at(b).unwrap()).unwrap().kind,
            SymbolKind::Constant
        );
    }

    #[test]
    fn test_shadowing_in_block() {
        let unit = bound("let x = 1;\n{ let x = 2; x; }\nx;");
        let refs: Vec<_> = idents(&unit, "x").collect();
        assert_eq!(refs.len(), 2);
        assert_ne!(unit.symbol_at(refs[0]), unit.symbol_at(refs[1]));
    }

    #[test]
    fn test_parameters_and_destructured_bindings() {
        let unit = bound("function f({ a, b: [c] }, d = 3) { return a + c + d; }");
        for name in ["a", "c", "d"] {
            let r = idents(&unit, name).next().unwrap();
            let sym = unit.symbol(unit.symbol_at(r).unwrap()).unwrap();
            assert_eq!(sym.kind, SymbolKind::Parameter, "{name}");
        }
        let d = idents(&unit, "d").next().unwrap();
        let sym = unit.symbol(unit.symbol_at(d).unwrap()).unwrap();
        assert!(sym.init.is_some());
    }

    #[test]
    fn test_class_members_and_exports() {
        let unit = bound(
            "export class A { x: number = 1; constructor(private y: string) {} async m(): Promise<void> {} }\nexport default function g() {}",
        );
        let a = unit.export("A").unwrap();
        let class = unit.symbol(a).unwrap();
        assert_eq!(class.kind, SymbolKind::Class);
        let names: Vec<_> = class.members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "m"]);
        let m = unit.symbol(class.member("m").unwrap()).unwrap();
        assert!(m.is_async);
        assert!(unit.export("default").is_some());
    }

    #[test]
    fn test_imports_record_targets() {
        let unit = bound("import D, { a as b } from './m';\nexport { b as c } from './n';\nb;");
        let b = idents(&unit, "b").next().unwrap();
        let sym = unit.symbol(unit.symbol_at(b).unwrap()).unwrap();
        assert_eq!(
            sym.import,
            Some(ImportTarget {
                source: "./m".to_string(),
                imported: ImportedName::Named("a".to_string()),
            })
        );
        let c = unit.symbol(unit.export("c").unwrap()).unwrap();
        assert_eq!(c.import.as_ref().unwrap().source, "./n");
    }

    #[test]
    fn test_overloads_share_symbol() {
        let unit = bound("function f(a: string): string;\nfunction f(a: any): any { return a; }\nf('x');");
        let call = idents(&unit, "f").next().unwrap();
        let sym = unit.symbol(unit.symbol_at(call).unwrap()).unwrap();
        assert!(!unit.tree.has_flag(sym.owner, NodeFlags::BODYLESS));
    }
}
