//! Lowering from the swc AST into the arena [`SyntaxTree`].
//!
//! The lowering keeps every byte of the source reachable: children are attached
//! in source order, parents cover their children, and list separators become
//! `Separator` leaves. Constructs the transformer never looks inside become
//! `Opaque` leaves that carry their raw text.

use crate::kind::{
    AssignOp, BinaryOp, KeywordType, MethodKind, NodeData, NodeFlags, Role, SyntaxKind,
    TypeOperatorKind, UnaryOp, UpdateOp, VarKind,
};
use crate::tree::{skip_trivia, SyntaxTree, TextRange};
use anyhow::{bail, Result};
use ferry_parser::swc_ecma_ast as ast;
use ferry_parser::{ParseResult, Spanned};
use ferry_types::{NodeId, UnitId};
use std::path::Path;

const COMMA: &[u8] = b",";
const MEMBER_SEPARATORS: &[u8] = b",;";

/// Convert one parsed module into an arena tree owned by `unit`.
pub fn lower_module(
    parse: &ParseResult,
    source: &str,
    path: &Path,
    unit: UnitId,
) -> Result<SyntaxTree> {
    let tree = SyntaxTree::new(unit, parse.file_id, path, source.to_string());
    let mut ctx = LoweringContext::new(tree, parse.base);
    let root = ctx.tree.root();
    for item in &parse.module.body {
        let node = ctx.lower_module_item(item);
        ctx.tree.attach(root, node, Role::Item);
    }
    let tree = ctx.finish();
    validate(&tree)?;
    log::debug!("lowered {} into {} nodes", path.display(), tree.len());
    Ok(tree)
}

/// Children must be ordered and must not overlap, otherwise reassembly would
/// duplicate or reorder text.
fn validate(tree: &SyntaxTree) -> Result<()> {
    for id in tree.ids() {
        let mut cursor = match tree.span(id) {
            Some(span) => span.start,
            None => continue,
        };
        for &child in tree.children(id) {
            if let Some(span) = tree.span(child) {
                if span.start < cursor {
                    let (line, column) = tree.location(child);
                    bail!(
                        "{}:{}:{}: overlapping {:?} inside {:?}",
                        tree.path().display(),
                        line,
                        column,
                        tree.kind(child),
                        tree.kind(id)
                    );
                }
                cursor = span.end;
            }
        }
    }
    Ok(())
}

/// State of one lowering run.
pub struct LoweringContext {
    tree: SyntaxTree,
    /// swc position of byte 0 of the source.
    base: u32,
}

impl LoweringContext {
    pub fn new(tree: SyntaxTree, base: u32) -> Self {
        Self { tree, base }
    }

    pub fn finish(self) -> SyntaxTree {
        self.tree
    }

    fn range(&self, span: swc_common::Span) -> Option<TextRange> {
        if span.is_dummy() {
            return None;
        }
        let len = self.tree.source().len() as u32;
        let start = span.lo.0.saturating_sub(self.base).min(len);
        let end = span.hi.0.saturating_sub(self.base).min(len);
        Some(TextRange::new(start, end))
    }

    fn node(&mut self, kind: SyntaxKind, span: swc_common::Span) -> NodeId {
        let range = self.range(span);
        self.tree.alloc(kind, range)
    }

    fn named(&mut self, kind: SyntaxKind, span: swc_common::Span, name: &str) -> NodeId {
        let id = self.node(kind, span);
        self.tree.set_data(id, NodeData::Name(name.to_string()));
        id
    }

    fn opaque(&mut self, span: swc_common::Span) -> NodeId {
        self.node(SyntaxKind::Opaque, span)
    }

    fn add(&mut self, parent: NodeId, child: NodeId, role: Role) {
        self.tree.attach(parent, child, role);
    }

    /// Attach a list element and, when the next token before the end of the
    /// owner is one of `separators`, a `Separator` leaf for it.
    fn add_listed(&mut self, parent: NodeId, child: NodeId, role: Role, separators: &[u8]) {
        let limit = self.tree.span(parent).map(|s| s.end);
        self.tree.attach(parent, child, role);
        let (Some(span), Some(limit)) = (self.tree.span(child), limit) else {
            return;
        };
        let at = skip_trivia(self.tree.source(), span.end as usize);
        let found = self
            .tree
            .source()
            .as_bytes()
            .get(at)
            .is_some_and(|b| separators.contains(b));
        if found && (at as u32) < limit {
            let sep = self
                .tree
                .alloc(SyntaxKind::Separator, Some(TextRange::new(at as u32, at as u32 + 1)));
            self.tree.attach(parent, sep, Role::Separator);
        }
    }

    fn add_opt(&mut self, parent: NodeId, child: Option<NodeId>, role: Role) {
        if let Some(child) = child {
            self.add(parent, child, role);
        }
    }

    /// First `{` at or after `from`, used for bodies swc gives no span of their own.
    fn brace_from(&self, from: u32, end: u32) -> Option<TextRange> {
        let source = self.tree.source();
        let offset = source.get(from as usize..end as usize)?.find('{')? as u32;
        Some(TextRange::new(from + offset, end))
    }

    fn end_of_children(&self, id: NodeId, fallback: u32) -> u32 {
        self.tree
            .children(id)
            .iter()
            .filter_map(|&c| self.tree.span(c))
            .map(|s| s.end)
            .max()
            .unwrap_or(fallback)
    }

    // Module items

    fn lower_module_item(&mut self, item: &ast::ModuleItem) -> NodeId {
        match item {
            ast::ModuleItem::Stmt(stmt) => self.lower_stmt(stmt),
            ast::ModuleItem::ModuleDecl(decl) => self.lower_module_decl(decl),
        }
    }

    fn lower_module_decl(&mut self, decl: &ast::ModuleDecl) -> NodeId {
        match decl {
            ast::ModuleDecl::Import(import) => {
                let node = self.node(SyntaxKind::Import, import.span());
                self.tree
                    .set_data(node, NodeData::Source(str_value(&import.src)));
                if import.type_only {
                    self.tree.add_flags(node, NodeFlags::TYPE_ONLY);
                }
                for spec in &import.specifiers {
                    let child = self.lower_import_specifier(spec);
                    self.add_listed(node, child, Role::Specifier, COMMA);
                }
                node
            }
            ast::ModuleDecl::ExportDecl(export) => {
                let node = self.node(SyntaxKind::ExportDecl, export.span());
                let decl = self.lower_decl(&export.decl);
                self.tree.add_flags(decl, NodeFlags::EXPORTED);
                self.add(node, decl, Role::Declaration);
                node
            }
            ast::ModuleDecl::ExportDefaultDecl(export) => {
                let node = self.node(SyntaxKind::ExportDefaultDecl, export.span());
                let decl = match &export.decl {
                    ast::DefaultDecl::Class(class) => self.lower_class(
                        SyntaxKind::ClassDecl,
                        class.ident.as_ref(),
                        &class.class,
                    ),
                    ast::DefaultDecl::Fn(f) => {
                        self.lower_function(SyntaxKind::FnDecl, f.ident.as_ref(), &f.function)
                    }
                    ast::DefaultDecl::TsInterfaceDecl(i) => self.lower_interface(i),
                };
                self.tree
                    .add_flags(decl, NodeFlags::EXPORTED | NodeFlags::DEFAULT_EXPORT);
                self.add(node, decl, Role::Declaration);
                node
            }
            ast::ModuleDecl::ExportDefaultExpr(export) => {
                let node = self.node(SyntaxKind::ExportDefaultExpr, export.span());
                let expr = self.lower_expr(&export.expr);
                self.add(node, expr, Role::Expression);
                node
            }
            ast::ModuleDecl::ExportNamed(export) => {
                let node = self.node(SyntaxKind::ExportNamed, export.span());
                if let Some(src) = &export.src {
                    self.tree.set_data(node, NodeData::Source(str_value(src)));
                }
                if export.type_only {
                    self.tree.add_flags(node, NodeFlags::TYPE_ONLY);
                }
                for spec in &export.specifiers {
                    let child = match spec {
                        ast::ExportSpecifier::Named(named) => {
                            let child = self.node(SyntaxKind::ExportSpecifier, named.span());
                            let local = export_name(&named.orig);
                            let remote = named.exported.as_ref().map(export_name);
                            self.tree
                                .set_data(child, NodeData::Specifier { local, remote });
                            child
                        }
                        other => self.opaque(other.span()),
                    };
                    self.add_listed(node, child, Role::Specifier, COMMA);
                }
                node
            }
            ast::ModuleDecl::ExportAll(export) => {
                let node = self.node(SyntaxKind::ExportAll, export.span());
                self.tree
                    .set_data(node, NodeData::Source(str_value(&export.src)));
                node
            }
            ast::ModuleDecl::TsImportEquals(i) => self.node(SyntaxKind::ImportEquals, i.span()),
            ast::ModuleDecl::TsExportAssignment(e) => {
                self.node(SyntaxKind::ExportAssignment, e.span())
            }
            other => self.opaque(other.span()),
        }
    }

    fn lower_import_specifier(&mut self, spec: &ast::ImportSpecifier) -> NodeId {
        match spec {
            ast::ImportSpecifier::Named(named) => {
                let node = self.node(SyntaxKind::ImportNamed, named.span());
                let local = named.local.sym.to_string();
                let remote = named.imported.as_ref().map(export_name);
                self.tree.set_data(node, NodeData::Specifier { local, remote });
                if named.is_type_only {
                    self.tree.add_flags(node, NodeFlags::TYPE_ONLY);
                }
                node
            }
            ast::ImportSpecifier::Default(default) => {
                let node = self.node(SyntaxKind::ImportDefault, default.span());
                let local = default.local.sym.to_string();
                self.tree
                    .set_data(node, NodeData::Specifier { local, remote: None });
                node
            }
            ast::ImportSpecifier::Namespace(ns) => {
                let node = self.node(SyntaxKind::ImportNamespace, ns.span());
                let local = ns.local.sym.to_string();
                self.tree
                    .set_data(node, NodeData::Specifier { local, remote: None });
                node
            }
        }
    }

    // Statements

    fn lower_stmt(&mut self, stmt: &ast::Stmt) -> NodeId {
        match stmt {
            ast::Stmt::Block(block) => self.lower_block(block),
            ast::Stmt::Empty(e) => self.node(SyntaxKind::Empty, e.span()),
            ast::Stmt::Debugger(d) => self.node(SyntaxKind::Debugger, d.span()),
            ast::Stmt::With(w) => self.node(SyntaxKind::With, w.span()),
            ast::Stmt::Return(ret) => {
                let node = self.node(SyntaxKind::Return, ret.span());
                let arg = ret.arg.as_deref().map(|a| self.lower_expr(a));
                self.add_opt(node, arg, Role::Argument);
                node
            }
            ast::Stmt::Labeled(labeled) => {
                let node = self.node(SyntaxKind::Labeled, labeled.span());
                let label =
                    self.named(SyntaxKind::PropIdent, labeled.label.span(), &labeled.label.sym);
                self.add(node, label, Role::Label);
                let body = self.lower_stmt(&labeled.body);
                self.add(node, body, Role::Body);
                node
            }
            ast::Stmt::Break(b) => {
                let node = self.node(SyntaxKind::Break, b.span());
                let label = b
                    .label
                    .as_ref()
                    .map(|l| self.named(SyntaxKind::PropIdent, l.span(), &l.sym));
                self.add_opt(node, label, Role::Label);
                node
            }
            ast::Stmt::Continue(c) => {
                let node = self.node(SyntaxKind::Continue, c.span());
                let label = c
                    .label
                    .as_ref()
                    .map(|l| self.named(SyntaxKind::PropIdent, l.span(), &l.sym));
                self.add_opt(node, label, Role::Label);
                node
            }
            ast::Stmt::If(if_stmt) => {
                let node = self.node(SyntaxKind::If, if_stmt.span());
                let test = self.lower_expr(&if_stmt.test);
                self.add(node, test, Role::Test);
                let cons = self.lower_stmt(&if_stmt.cons);
                self.add(node, cons, Role::Consequent);
                let alt = if_stmt.alt.as_deref().map(|a| self.lower_stmt(a));
                self.add_opt(node, alt, Role::Alternate);
                node
            }
            ast::Stmt::Switch(switch) => {
                let node = self.node(SyntaxKind::Switch, switch.span());
                let disc = self.lower_expr(&switch.discriminant);
                self.add(node, disc, Role::Discriminant);
                for case in &switch.cases {
                    let case_node = self.node(SyntaxKind::SwitchCase, case.span());
                    let test = case.test.as_deref().map(|t| self.lower_expr(t));
                    self.add_opt(case_node, test, Role::Test);
                    for stmt in &case.cons {
                        let child = self.lower_stmt(stmt);
                        self.add(case_node, child, Role::Item);
                    }
                    self.add(node, case_node, Role::Case);
                }
                node
            }
            ast::Stmt::Throw(throw) => {
                let node = self.node(SyntaxKind::Throw, throw.span());
                let arg = self.lower_expr(&throw.arg);
                self.add(node, arg, Role::Argument);
                node
            }
            ast::Stmt::Try(try_stmt) => {
                let node = self.node(SyntaxKind::Try, try_stmt.span());
                let block = self.lower_block(&try_stmt.block);
                self.add(node, block, Role::Body);
                if let Some(handler) = &try_stmt.handler {
                    let catch = self.node(SyntaxKind::Catch, handler.span());
                    let param = handler.param.as_ref().map(|p| self.lower_pat(p));
                    self.add_opt(catch, param, Role::Param);
                    let body = self.lower_block(&handler.body);
                    self.add(catch, body, Role::Body);
                    self.add(node, catch, Role::Handler);
                }
                let finalizer = try_stmt.finalizer.as_ref().map(|f| self.lower_block(f));
                self.add_opt(node, finalizer, Role::Finalizer);
                node
            }
            ast::Stmt::While(w) => {
                let node = self.node(SyntaxKind::While, w.span());
                let test = self.lower_expr(&w.test);
                self.add(node, test, Role::Test);
                let body = self.lower_stmt(&w.body);
                self.add(node, body, Role::Body);
                node
            }
            ast::Stmt::DoWhile(d) => {
                let node = self.node(SyntaxKind::DoWhile, d.span());
                let body = self.lower_stmt(&d.body);
                self.add(node, body, Role::Body);
                let test = self.lower_expr(&d.test);
                self.add(node, test, Role::Test);
                node
            }
            ast::Stmt::For(f) => {
                let node = self.node(SyntaxKind::For, f.span());
                let init = f.init.as_ref().map(|init| match init {
                    ast::VarDeclOrExpr::VarDecl(v) => self.lower_var_decl(v),
                    ast::VarDeclOrExpr::Expr(e) => self.lower_expr(e),
                });
                self.add_opt(node, init, Role::Init);
                let test = f.test.as_deref().map(|t| self.lower_expr(t));
                self.add_opt(node, test, Role::Test);
                let update = f.update.as_deref().map(|u| self.lower_expr(u));
                self.add_opt(node, update, Role::Update);
                let body = self.lower_stmt(&f.body);
                self.add(node, body, Role::Body);
                node
            }
            ast::Stmt::ForIn(f) => {
                let node = self.node(SyntaxKind::ForIn, f.span());
                let left = self.lower_for_head(&f.left);
                self.add(node, left, Role::Left);
                let right = self.lower_expr(&f.right);
                self.add(node, right, Role::Right);
                let body = self.lower_stmt(&f.body);
                self.add(node, body, Role::Body);
                node
            }
            ast::Stmt::ForOf(f) => {
                let node = self.node(SyntaxKind::ForOf, f.span());
                if f.is_await {
                    self.tree.add_flags(node, NodeFlags::AWAIT);
                }
                let left = self.lower_for_head(&f.left);
                self.add(node, left, Role::Left);
                let right = self.lower_expr(&f.right);
                self.add(node, right, Role::Right);
                let body = self.lower_stmt(&f.body);
                self.add(node, body, Role::Body);
                node
            }
            ast::Stmt::Decl(decl) => self.lower_decl(decl),
            ast::Stmt::Expr(expr_stmt) => {
                let node = self.node(SyntaxKind::ExprStmt, expr_stmt.span());
                let expr = self.lower_expr(&expr_stmt.expr);
                self.add(node, expr, Role::Expression);
                node
            }
        }
    }

    fn lower_for_head(&mut self, head: &ast::ForHead) -> NodeId {
        match head {
            ast::ForHead::VarDecl(v) => self.lower_var_decl(v),
            ast::ForHead::Pat(p) => self.lower_pat(p),
            ast::ForHead::UsingDecl(u) => self.opaque(u.span()),
        }
    }

    fn lower_block(&mut self, block: &ast::BlockStmt) -> NodeId {
        let node = self.node(SyntaxKind::Block, block.span());
        for stmt in &block.stmts {
            let child = self.lower_stmt(stmt);
            self.add(node, child, Role::Item);
        }
        node
    }

    // Declarations

    fn lower_decl(&mut self, decl: &ast::Decl) -> NodeId {
        match decl {
            ast::Decl::Class(c) => {
                let node = self.lower_class(SyntaxKind::ClassDecl, Some(&c.ident), &c.class);
                if c.declare {
                    self.tree.add_flags(node, NodeFlags::DECLARE);
                }
                node
            }
            ast::Decl::Fn(f) => {
                let node = self.lower_function(SyntaxKind::FnDecl, Some(&f.ident), &f.function);
                if f.declare {
                    self.tree.add_flags(node, NodeFlags::DECLARE);
                }
                node
            }
            ast::Decl::Var(v) => self.lower_var_decl(v),
            ast::Decl::Using(u) => self.opaque(u.span()),
            ast::Decl::TsInterface(i) => self.lower_interface(i),
            ast::Decl::TsTypeAlias(alias) => {
                let node = self.node(SyntaxKind::TypeAliasDecl, alias.span());
                if alias.declare {
                    self.tree.add_flags(node, NodeFlags::DECLARE);
                }
                let name = self.named(SyntaxKind::BindingIdent, alias.id.span(), &alias.id.sym);
                self.add(node, name, Role::Name);
                let params = alias.type_params.as_deref().map(|p| self.lower_type_params(p));
                self.add_opt(node, params, Role::TypeParams);
                let ty = self.lower_type(&alias.type_ann);
                self.add(node, ty, Role::Value);
                node
            }
            ast::Decl::TsEnum(e) => self.lower_enum(e),
            ast::Decl::TsModule(m) => self.node(SyntaxKind::NamespaceDecl, m.span()),
        }
    }

    fn lower_var_decl(&mut self, var: &ast::VarDecl) -> NodeId {
        let node = self.node(SyntaxKind::VarStmt, var.span());
        let kind = match var.kind {
            ast::VarDeclKind::Var => VarKind::Var,
            ast::VarDeclKind::Let => VarKind::Let,
            ast::VarDeclKind::Const => VarKind::Const,
        };
        self.tree.set_data(node, NodeData::Var(kind));
        if var.declare {
            self.tree.add_flags(node, NodeFlags::DECLARE);
        }
        for decl in &var.decls {
            let d = self.node(SyntaxKind::Declarator, decl.span());
            if decl.definite {
                self.tree.add_flags(d, NodeFlags::DEFINITE);
            }
            let name = self.lower_pat(&decl.name);
            self.add(d, name, Role::Name);
            let init = decl.init.as_deref().map(|i| self.lower_expr(i));
            self.add_opt(d, init, Role::Init);
            self.add_listed(node, d, Role::Declarator, COMMA);
        }
        node
    }

    fn lower_function(
        &mut self,
        kind: SyntaxKind,
        ident: Option<&ast::Ident>,
        function: &ast::Function,
    ) -> NodeId {
        let node = self.node(kind, function.span());
        if let Some(ident) = ident {
            let name = self.named(SyntaxKind::BindingIdent, ident.span(), &ident.sym);
            self.add(node, name, Role::Name);
        }
        self.lower_function_parts(node, function);
        node
    }

    /// Type parameters, parameters, return type and body, in source order.
    fn lower_function_parts(&mut self, node: NodeId, function: &ast::Function) {
        if function.is_async {
            self.tree.add_flags(node, NodeFlags::ASYNC);
        }
        if function.is_generator {
            self.tree.add_flags(node, NodeFlags::GENERATOR);
        }
        let params = function.type_params.as_deref().map(|p| self.lower_type_params(p));
        self.add_opt(node, params, Role::TypeParams);
        for param in &function.params {
            let child = self.lower_param(param);
            self.add_listed(node, child, Role::Param, COMMA);
        }
        let ret = function.return_type.as_deref().map(|r| self.lower_type_ann(r));
        self.add_opt(node, ret, Role::ReturnType);
        match &function.body {
            Some(body) => {
                let body = self.lower_block(body);
                self.add(node, body, Role::Body);
            }
            None => self.tree.add_flags(node, NodeFlags::BODYLESS),
        }
    }

    fn lower_param(&mut self, param: &ast::Param) -> NodeId {
        let node = self.node(SyntaxKind::Param, param.span());
        self.lower_decorators(node, &param.decorators);
        let pat = self.lower_pat(&param.pat);
        self.add(node, pat, Role::Name);
        node
    }

    /// Wrap a bare pattern (arrow and setter parameters) in a `Param` node.
    fn wrap_param(&mut self, pat: &ast::Pat) -> NodeId {
        let node = self.node(SyntaxKind::Param, pat.span());
        let child = self.lower_pat(pat);
        self.add(node, child, Role::Name);
        node
    }

    fn lower_decorators(&mut self, node: NodeId, decorators: &[ast::Decorator]) {
        for decorator in decorators {
            let child = self.node(SyntaxKind::Decorator, decorator.span());
            self.add(node, child, Role::Decorator);
        }
    }

    fn lower_class(
        &mut self,
        kind: SyntaxKind,
        ident: Option<&ast::Ident>,
        class: &ast::Class,
    ) -> NodeId {
        let node = self.node(kind, class.span());
        let class_range = self.range(class.span());
        if class.is_abstract {
            self.tree.add_flags(node, NodeFlags::ABSTRACT);
        }
        self.lower_decorators(node, &class.decorators);
        if let Some(ident) = ident {
            let name = self.named(SyntaxKind::BindingIdent, ident.span(), &ident.sym);
            self.add(node, name, Role::Name);
        }
        let params = class.type_params.as_deref().map(|p| self.lower_type_params(p));
        self.add_opt(node, params, Role::TypeParams);
        if let Some(super_class) = &class.super_class {
            let child = self.lower_expr(super_class);
            self.add(node, child, Role::SuperClass);
        }
        let args = class.super_type_params.as_deref().map(|a| self.lower_type_args(a));
        self.add_opt(node, args, Role::TypeArgs);
        for heritage in &class.implements {
            let child = self.lower_heritage(heritage);
            self.add_listed(node, child, Role::Implements, COMMA);
        }

        let class_range = class_range.unwrap_or(TextRange::new(0, 0));
        let header_end = self.end_of_children(node, class_range.start);
        let body = self
            .tree
            .alloc(SyntaxKind::ClassBody, self.brace_from(header_end, class_range.end));
        for member in &class.body {
            let child = self.lower_class_member(member);
            self.add(body, child, Role::Member);
        }
        self.add(node, body, Role::Body);
        node
    }

    fn lower_heritage(&mut self, heritage: &ast::TsExprWithTypeArgs) -> NodeId {
        let node = self.node(SyntaxKind::Heritage, heritage.span());
        let expr = self.lower_expr(&heritage.expr);
        self.add(node, expr, Role::Expression);
        let args = heritage.type_args.as_deref().map(|a| self.lower_type_args(a));
        self.add_opt(node, args, Role::TypeArgs);
        node
    }

    fn lower_class_member(&mut self, member: &ast::ClassMember) -> NodeId {
        match member {
            ast::ClassMember::Constructor(ctor) => {
                let node = self.node(SyntaxKind::Constructor, ctor.span());
                self.tree.add_flags(node, accessibility(ctor.accessibility));
                let key = self.lower_prop_name(&ctor.key);
                self.add(node, key, Role::Key);
                for param in &ctor.params {
                    let child = match param {
                        ast::ParamOrTsParamProp::Param(p) => self.lower_param(p),
                        ast::ParamOrTsParamProp::TsParamProp(prop) => self.lower_param_prop(prop),
                    };
                    self.add_listed(node, child, Role::Param, COMMA);
                }
                match &ctor.body {
                    Some(body) => {
                        let body = self.lower_block(body);
                        self.add(node, body, Role::Body);
                    }
                    None => self.tree.add_flags(node, NodeFlags::BODYLESS),
                }
                node
            }
            ast::ClassMember::Method(method) => {
                let node = self.node(SyntaxKind::Method, method.span());
                self.tree
                    .set_data(node, NodeData::Method(method_kind(method.kind)));
                let mut flags = accessibility(method.accessibility);
                flags.set(NodeFlags::STATIC, method.is_static);
                flags.set(NodeFlags::ABSTRACT, method.is_abstract);
                flags.set(NodeFlags::OPTIONAL, method.is_optional);
                flags.set(NodeFlags::OVERRIDE, method.is_override);
                self.tree.add_flags(node, flags);
                self.lower_decorators(node, &method.function.decorators);
                let key = self.lower_prop_name(&method.key);
                self.add(node, key, Role::Key);
                self.lower_function_parts(node, &method.function);
                node
            }
            ast::ClassMember::PrivateMethod(method) => {
                let node = self.node(SyntaxKind::PrivateMethod, method.span());
                self.tree
                    .set_data(node, NodeData::Method(method_kind(method.kind)));
                if method.is_static {
                    self.tree.add_flags(node, NodeFlags::STATIC);
                }
                self.lower_decorators(node, &method.function.decorators);
                let key = self.named(
                    SyntaxKind::PrivateName,
                    method.key.span(),
                    &method.key.name,
                );
                self.add(node, key, Role::Key);
                self.lower_function_parts(node, &method.function);
                node
            }
            ast::ClassMember::ClassProp(prop) => {
                let node = self.node(SyntaxKind::ClassProp, prop.span());
                let mut flags = accessibility(prop.accessibility);
                flags.set(NodeFlags::STATIC, prop.is_static);
                flags.set(NodeFlags::READONLY, prop.readonly);
                flags.set(NodeFlags::OPTIONAL, prop.is_optional);
                flags.set(NodeFlags::ABSTRACT, prop.is_abstract);
                flags.set(NodeFlags::OVERRIDE, prop.is_override);
                flags.set(NodeFlags::DECLARE, prop.declare);
                flags.set(NodeFlags::DEFINITE, prop.definite);
                self.tree.add_flags(node, flags);
                self.lower_decorators(node, &prop.decorators);
                let key = self.lower_prop_name(&prop.key);
                self.add(node, key, Role::Key);
                let ty = prop.type_ann.as_deref().map(|t| self.lower_type_ann(t));
                self.add_opt(node, ty, Role::TypeAnn);
                let value = prop.value.as_deref().map(|v| self.lower_expr(v));
                self.add_opt(node, value, Role::Init);
                node
            }
            ast::ClassMember::PrivateProp(prop) => {
                self.named(SyntaxKind::PrivateProp, prop.span(), &prop.key.name)
            }
            ast::ClassMember::TsIndexSignature(sig) => {
                self.node(SyntaxKind::IndexSignature, sig.span())
            }
            ast::ClassMember::Empty(e) => self.node(SyntaxKind::Empty, e.span()),
            ast::ClassMember::StaticBlock(block) => {
                self.node(SyntaxKind::StaticBlock, block.span())
            }
            other => self.opaque(other.span()),
        }
    }

    fn lower_param_prop(&mut self, prop: &ast::TsParamProp) -> NodeId {
        let node = self.node(SyntaxKind::ParamProp, prop.span());
        let mut flags = accessibility(prop.accessibility);
        flags.set(NodeFlags::READONLY, prop.readonly);
        flags.set(NodeFlags::OVERRIDE, prop.is_override);
        self.tree.add_flags(node, flags);
        self.lower_decorators(node, &prop.decorators);
        let pat = match &prop.param {
            ast::TsParamPropParam::Ident(ident) => self.lower_binding_ident(ident),
            ast::TsParamPropParam::Assign(assign) => self.lower_assign_pat(assign),
        };
        self.add(node, pat, Role::Name);
        node
    }

    fn lower_interface(&mut self, decl: &ast::TsInterfaceDecl) -> NodeId {
        let node = self.node(SyntaxKind::InterfaceDecl, decl.span());
        if decl.declare {
            self.tree.add_flags(node, NodeFlags::DECLARE);
        }
        let name = self.named(SyntaxKind::BindingIdent, decl.id.span(), &decl.id.sym);
        self.add(node, name, Role::Name);
        let params = decl.type_params.as_deref().map(|p| self.lower_type_params(p));
        self.add_opt(node, params, Role::TypeParams);
        for heritage in &decl.extends {
            let child = self.lower_heritage(heritage);
            self.add_listed(node, child, Role::Extends, COMMA);
        }
        let body = self.node(SyntaxKind::InterfaceBody, decl.body.span());
        for element in &decl.body.body {
            let child = self.lower_type_element(element);
            self.add_listed(body, child, Role::Member, MEMBER_SEPARATORS);
        }
        self.add(node, body, Role::Body);
        node
    }

    fn lower_enum(&mut self, decl: &ast::TsEnumDecl) -> NodeId {
        let node = self.node(SyntaxKind::EnumDecl, decl.span());
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::CONST, decl.is_const);
        flags.set(NodeFlags::DECLARE, decl.declare);
        self.tree.add_flags(node, flags);
        let name = self.named(SyntaxKind::BindingIdent, decl.id.span(), &decl.id.sym);
        self.add(node, name, Role::Name);

        let enum_range = self.range(decl.span()).unwrap_or(TextRange::new(0, 0));
        let header_end = self.end_of_children(node, enum_range.start);
        let body = self
            .tree
            .alloc(SyntaxKind::EnumBody, self.brace_from(header_end, enum_range.end));
        for member in &decl.members {
            let m = self.node(SyntaxKind::EnumMember, member.span());
            let key = match &member.id {
                ast::TsEnumMemberId::Ident(ident) => {
                    self.named(SyntaxKind::PropIdent, ident.span(), &ident.sym)
                }
                ast::TsEnumMemberId::Str(s) => {
                    let key = self.node(SyntaxKind::String, s.span());
                    self.tree.set_data(key, NodeData::Str(str_value(s)));
                    key
                }
            };
            self.add(m, key, Role::Key);
            let init = member.init.as_deref().map(|i| self.lower_expr(i));
            self.add_opt(m, init, Role::Init);
            self.add_listed(body, m, Role::Member, COMMA);
        }
        self.add(node, body, Role::Body);
        node
    }

    // Patterns

    fn lower_pat(&mut self, pat: &ast::Pat) -> NodeId {
        match pat {
            ast::Pat::Ident(ident) => self.lower_binding_ident(ident),
            ast::Pat::Array(array) => self.lower_array_pat(array),
            ast::Pat::Rest(rest) => self.lower_rest_pat(rest),
            ast::Pat::Object(object) => self.lower_object_pat(object),
            ast::Pat::Assign(assign) => self.lower_assign_pat(assign),
            ast::Pat::Expr(expr) => self.lower_expr(expr),
            ast::Pat::Invalid(invalid) => self.opaque(invalid.span()),
        }
    }

    fn lower_binding_ident(&mut self, ident: &ast::BindingIdent) -> NodeId {
        let node = self.named(SyntaxKind::BindingIdent, ident.span(), &ident.id.sym);
        if ident.id.optional {
            self.tree.add_flags(node, NodeFlags::OPTIONAL);
        }
        let ty = ident.type_ann.as_deref().map(|t| self.lower_type_ann(t));
        self.add_opt(node, ty, Role::TypeAnn);
        node
    }

    fn lower_array_pat(&mut self, array: &ast::ArrayPat) -> NodeId {
        let node = self.node(SyntaxKind::ArrayPat, array.span());
        if array.optional {
            self.tree.add_flags(node, NodeFlags::OPTIONAL);
        }
        for element in &array.elems {
            let child = match element {
                Some(pat) => self.lower_pat(pat),
                None => self.tree.alloc(SyntaxKind::Hole, None),
            };
            self.add_listed(node, child, Role::Element, COMMA);
        }
        let ty = array.type_ann.as_deref().map(|t| self.lower_type_ann(t));
        self.add_opt(node, ty, Role::TypeAnn);
        node
    }

    fn lower_rest_pat(&mut self, rest: &ast::RestPat) -> NodeId {
        let node = self.node(SyntaxKind::RestPat, rest.span());
        let arg = self.lower_pat(&rest.arg);
        self.add(node, arg, Role::Argument);
        let ty = rest.type_ann.as_deref().map(|t| self.lower_type_ann(t));
        self.add_opt(node, ty, Role::TypeAnn);
        node
    }

    fn lower_object_pat(&mut self, object: &ast::ObjectPat) -> NodeId {
        let node = self.node(SyntaxKind::ObjectPat, object.span());
        if object.optional {
            self.tree.add_flags(node, NodeFlags::OPTIONAL);
        }
        for prop in &object.props {
            let child = match prop {
                ast::ObjectPatProp::KeyValue(kv) => {
                    let child = self.node(SyntaxKind::PatKeyValue, kv.span());
                    let key = self.lower_prop_name(&kv.key);
                    self.add(child, key, Role::Key);
                    let value = self.lower_pat(&kv.value);
                    self.add(child, value, Role::Value);
                    child
                }
                ast::ObjectPatProp::Assign(assign) => {
                    let child = self.node(SyntaxKind::PatShorthand, assign.span());
                    let key =
                        self.named(SyntaxKind::BindingIdent, assign.key.span(), &assign.key.sym);
                    self.add(child, key, Role::Name);
                    let value = assign.value.as_deref().map(|v| self.lower_expr(v));
                    self.add_opt(child, value, Role::Default);
                    child
                }
                ast::ObjectPatProp::Rest(rest) => self.lower_rest_pat(rest),
            };
            self.add_listed(node, child, Role::Element, COMMA);
        }
        let ty = object.type_ann.as_deref().map(|t| self.lower_type_ann(t));
        self.add_opt(node, ty, Role::TypeAnn);
        node
    }

    fn lower_assign_pat(&mut self, assign: &ast::AssignPat) -> NodeId {
        let node = self.node(SyntaxKind::AssignPat, assign.span());
        let left = self.lower_pat(&assign.left);
        self.add(node, left, Role::Left);
        let right = self.lower_expr(&assign.right);
        self.add(node, right, Role::Default);
        node
    }

    fn lower_prop_name(&mut self, key: &ast::PropName) -> NodeId {
        match key {
            ast::PropName::Ident(ident) => {
                self.named(SyntaxKind::PropIdent, ident.span(), &ident.sym)
            }
            ast::PropName::Str(s) => {
                let node = self.node(SyntaxKind::String, s.span());
                self.tree.set_data(node, NodeData::Str(str_value(s)));
                node
            }
            ast::PropName::Num(n) => {
                let node = self.node(SyntaxKind::Number, n.span());
                self.tree.set_data(node, NodeData::Num(n.value));
                node
            }
            ast::PropName::Computed(computed) => {
                let node = self.node(SyntaxKind::ComputedKey, computed.span());
                let expr = self.lower_expr(&computed.expr);
                self.add(node, expr, Role::Expression);
                node
            }
            ast::PropName::BigInt(b) => self.node(SyntaxKind::BigInt, b.span()),
        }
    }

    // Expressions

    fn lower_expr(&mut self, expr: &ast::Expr) -> NodeId {
        match expr {
            ast::Expr::This(t) => self.node(SyntaxKind::This, t.span()),
            ast::Expr::Ident(ident) => self.named(SyntaxKind::Ident, ident.span(), &ident.sym),
            ast::Expr::Lit(lit) => self.lower_lit(lit),
            ast::Expr::Array(array) => {
                let node = self.node(SyntaxKind::ArrayLit, array.span());
                for element in &array.elems {
                    let child = match element {
                        Some(e) => self.lower_expr_or_spread(e),
                        None => self.tree.alloc(SyntaxKind::Hole, None),
                    };
                    self.add_listed(node, child, Role::Element, COMMA);
                }
                node
            }
            ast::Expr::Object(object) => {
                let node = self.node(SyntaxKind::ObjectLit, object.span());
                for prop in &object.props {
                    let child = match prop {
                        ast::PropOrSpread::Spread(spread) => {
                            let child = self.node(SyntaxKind::Spread, spread.span());
                            let expr = self.lower_expr(&spread.expr);
                            self.add(child, expr, Role::Expression);
                            child
                        }
                        ast::PropOrSpread::Prop(prop) => self.lower_prop(prop),
                    };
                    self.add_listed(node, child, Role::Member, COMMA);
                }
                node
            }
            ast::Expr::Fn(f) => {
                self.lower_function(SyntaxKind::FnExpr, f.ident.as_ref(), &f.function)
            }
            ast::Expr::Arrow(arrow) => {
                let node = self.node(SyntaxKind::Arrow, arrow.span());
                let mut flags = NodeFlags::empty();
                flags.set(NodeFlags::ASYNC, arrow.is_async);
                flags.set(NodeFlags::GENERATOR, arrow.is_generator);
                self.tree.add_flags(node, flags);
                let params = arrow.type_params.as_deref().map(|p| self.lower_type_params(p));
                self.add_opt(node, params, Role::TypeParams);
                for param in &arrow.params {
                    let child = self.wrap_param(param);
                    self.add_listed(node, child, Role::Param, COMMA);
                }
                let ret = arrow.return_type.as_deref().map(|r| self.lower_type_ann(r));
                self.add_opt(node, ret, Role::ReturnType);
                let body = match &*arrow.body {
                    ast::BlockStmtOrExpr::BlockStmt(block) => self.lower_block(block),
                    ast::BlockStmtOrExpr::Expr(expr) => self.lower_expr(expr),
                };
                self.add(node, body, Role::Body);
                node
            }
            ast::Expr::Class(c) => self.lower_class(SyntaxKind::ClassExpr, c.ident.as_ref(), &c.class),
            ast::Expr::Unary(unary) => {
                let node = self.node(SyntaxKind::Unary, unary.span());
                self.tree
                    .set_data(node, NodeData::Unary(unary_op(unary.op)));
                let arg = self.lower_expr(&unary.arg);
                self.add(node, arg, Role::Operand);
                node
            }
            ast::Expr::Update(update) => {
                let node = self.node(SyntaxKind::Update, update.span());
                let op = match update.op {
                    ast::UpdateOp::PlusPlus => UpdateOp::Increment,
                    ast::UpdateOp::MinusMinus => UpdateOp::Decrement,
                };
                self.tree.set_data(
                    node,
                    NodeData::Update {
                        op,
                        prefix: update.prefix,
                    },
                );
                let arg = self.lower_expr(&update.arg);
                self.add(node, arg, Role::Operand);
                node
            }
            ast::Expr::Bin(bin) => {
                let node = self.node(SyntaxKind::Binary, bin.span());
                self.tree.set_data(node, NodeData::Binary(binary_op(bin.op)));
                let left = self.lower_expr(&bin.left);
                self.add(node, left, Role::Left);
                let right = self.lower_expr(&bin.right);
                self.add(node, right, Role::Right);
                node
            }
            ast::Expr::Assign(assign) => {
                let node = self.node(SyntaxKind::Assign, assign.span());
                self.tree
                    .set_data(node, NodeData::Assign(assign_op(assign.op)));
                let left = match &assign.left {
                    ast::AssignTarget::Simple(simple) => self.lower_simple_target(simple),
                    ast::AssignTarget::Pat(ast::AssignTargetPat::Array(a)) => {
                        self.lower_array_pat(a)
                    }
                    ast::AssignTarget::Pat(ast::AssignTargetPat::Object(o)) => {
                        self.lower_object_pat(o)
                    }
                    ast::AssignTarget::Pat(other) => self.opaque(other.span()),
                };
                self.add(node, left, Role::Left);
                let right = self.lower_expr(&assign.right);
                self.add(node, right, Role::Right);
                node
            }
            ast::Expr::Member(member) => self.lower_member(member),
            ast::Expr::SuperProp(sup) => {
                let node = self.node(SyntaxKind::SuperMember, sup.span());
                let obj = self.node(SyntaxKind::Super, sup.obj.span());
                self.add(node, obj, Role::Object);
                let prop = match &sup.prop {
                    ast::SuperProp::Ident(ident) => {
                        self.named(SyntaxKind::PropIdent, ident.span(), &ident.sym)
                    }
                    ast::SuperProp::Computed(computed) => {
                        self.tree.add_flags(node, NodeFlags::COMPUTED);
                        let key = self.node(SyntaxKind::ComputedKey, computed.span());
                        let expr = self.lower_expr(&computed.expr);
                        self.add(key, expr, Role::Expression);
                        key
                    }
                };
                self.add(node, prop, Role::Property);
                node
            }
            ast::Expr::Cond(cond) => {
                let node = self.node(SyntaxKind::Cond, cond.span());
                let test = self.lower_expr(&cond.test);
                self.add(node, test, Role::Test);
                let cons = self.lower_expr(&cond.cons);
                self.add(node, cons, Role::Consequent);
                let alt = self.lower_expr(&cond.alt);
                self.add(node, alt, Role::Alternate);
                node
            }
            ast::Expr::Call(call) => {
                let node = self.node(SyntaxKind::Call, call.span());
                let callee = match &call.callee {
                    ast::Callee::Expr(e) => self.lower_expr(e),
                    ast::Callee::Super(s) => self.node(SyntaxKind::Super, s.span()),
                    ast::Callee::Import(i) => self.opaque(i.span()),
                };
                self.add(node, callee, Role::Callee);
                let args = call.type_args.as_deref().map(|a| self.lower_type_args(a));
                self.add_opt(node, args, Role::TypeArgs);
                self.lower_args(node, &call.args);
                node
            }
            ast::Expr::New(new) => {
                let node = self.node(SyntaxKind::New, new.span());
                let callee = self.lower_expr(&new.callee);
                self.add(node, callee, Role::Callee);
                let args = new.type_args.as_deref().map(|a| self.lower_type_args(a));
                self.add_opt(node, args, Role::TypeArgs);
                if let Some(args) = &new.args {
                    self.lower_args(node, args);
                }
                node
            }
            ast::Expr::Seq(seq) => {
                let node = self.node(SyntaxKind::Seq, seq.span());
                for expr in &seq.exprs {
                    let child = self.lower_expr(expr);
                    self.add(node, child, Role::Element);
                }
                node
            }
            ast::Expr::Tpl(tpl) => self.lower_template(tpl),
            ast::Expr::TaggedTpl(tagged) => {
                let node = self.node(SyntaxKind::TaggedTemplate, tagged.span());
                let tag = self.lower_expr(&tagged.tag);
                self.add(node, tag, Role::Callee);
                let tpl = self.lower_template(&tagged.tpl);
                self.add(node, tpl, Role::Argument);
                node
            }
            ast::Expr::Yield(y) => {
                let node = self.node(SyntaxKind::Yield, y.span());
                if y.delegate {
                    self.tree.add_flags(node, NodeFlags::DELEGATE);
                }
                let arg = y.arg.as_deref().map(|a| self.lower_expr(a));
                self.add_opt(node, arg, Role::Operand);
                node
            }
            ast::Expr::MetaProp(m) => self.node(SyntaxKind::MetaProp, m.span()),
            ast::Expr::Await(a) => {
                let node = self.node(SyntaxKind::Await, a.span());
                let arg = self.lower_expr(&a.arg);
                self.add(node, arg, Role::Operand);
                node
            }
            ast::Expr::Paren(p) => {
                let node = self.node(SyntaxKind::Paren, p.span());
                let inner = self.lower_expr(&p.expr);
                self.add(node, inner, Role::Expression);
                node
            }
            ast::Expr::TsTypeAssertion(a) => {
                let node = self.node(SyntaxKind::TypeAssertion, a.span());
                let ty = self.lower_type(&a.type_ann);
                self.add(node, ty, Role::TypeAnn);
                let expr = self.lower_expr(&a.expr);
                self.add(node, expr, Role::Expression);
                node
            }
            ast::Expr::TsConstAssertion(a) => {
                let node = self.node(SyntaxKind::ConstAssertion, a.span());
                let expr = self.lower_expr(&a.expr);
                self.add(node, expr, Role::Expression);
                node
            }
            ast::Expr::TsNonNull(n) => {
                let node = self.node(SyntaxKind::NonNull, n.span());
                let expr = self.lower_expr(&n.expr);
                self.add(node, expr, Role::Expression);
                node
            }
            ast::Expr::TsAs(a) => {
                let node = self.node(SyntaxKind::AsExpr, a.span());
                let expr = self.lower_expr(&a.expr);
                self.add(node, expr, Role::Expression);
                let ty = self.lower_type(&a.type_ann);
                self.add(node, ty, Role::TypeAnn);
                node
            }
            ast::Expr::TsSatisfies(s) => {
                let node = self.node(SyntaxKind::Satisfies, s.span());
                let expr = self.lower_expr(&s.expr);
                self.add(node, expr, Role::Expression);
                let ty = self.lower_type(&s.type_ann);
                self.add(node, ty, Role::TypeAnn);
                node
            }
            ast::Expr::TsInstantiation(i) => {
                let node = self.node(SyntaxKind::Instantiation, i.span());
                let expr = self.lower_expr(&i.expr);
                self.add(node, expr, Role::Expression);
                let args = self.lower_type_args(&i.type_args);
                self.add(node, args, Role::TypeArgs);
                node
            }
            ast::Expr::PrivateName(p) => self.named(SyntaxKind::PrivateName, p.span(), &p.name),
            ast::Expr::OptChain(chain) => {
                let node = self.node(SyntaxKind::OptChain, chain.span());
                let base = match &*chain.base {
                    ast::OptChainBase::Member(member) => self.lower_member(member),
                    ast::OptChainBase::Call(call) => {
                        let call_node = self.node(SyntaxKind::Call, call.span());
                        let callee = self.lower_expr(&call.callee);
                        self.add(call_node, callee, Role::Callee);
                        let args = call.type_args.as_deref().map(|a| self.lower_type_args(a));
                        self.add_opt(call_node, args, Role::TypeArgs);
                        self.lower_args(call_node, &call.args);
                        call_node
                    }
                };
                self.add(node, base, Role::Expression);
                node
            }
            other => self.opaque(other.span()),
        }
    }

    fn lower_simple_target(&mut self, target: &ast::SimpleAssignTarget) -> NodeId {
        match target {
            ast::SimpleAssignTarget::Ident(ident) => {
                self.named(SyntaxKind::Ident, ident.span(), &ident.id.sym)
            }
            ast::SimpleAssignTarget::Member(member) => self.lower_member(member),
            ast::SimpleAssignTarget::Paren(p) => {
                let node = self.node(SyntaxKind::Paren, p.span());
                let inner = self.lower_expr(&p.expr);
                self.add(node, inner, Role::Expression);
                node
            }
            other => self.opaque(other.span()),
        }
    }

    fn lower_member(&mut self, member: &ast::MemberExpr) -> NodeId {
        let node = self.node(SyntaxKind::Member, member.span());
        let obj = self.lower_expr(&member.obj);
        self.add(node, obj, Role::Object);
        let prop = match &member.prop {
            ast::MemberProp::Ident(ident) => {
                self.named(SyntaxKind::PropIdent, ident.span(), &ident.sym)
            }
            ast::MemberProp::PrivateName(p) => {
                self.named(SyntaxKind::PrivateName, p.span(), &p.name)
            }
            ast::MemberProp::Computed(computed) => {
                self.tree.add_flags(node, NodeFlags::COMPUTED);
                let key = self.node(SyntaxKind::ComputedKey, computed.span());
                let expr = self.lower_expr(&computed.expr);
                self.add(key, expr, Role::Expression);
                key
            }
        };
        self.add(node, prop, Role::Property);
        node
    }

    fn lower_args(&mut self, node: NodeId, args: &[ast::ExprOrSpread]) {
        for arg in args {
            let child = self.lower_expr_or_spread(arg);
            self.add_listed(node, child, Role::Argument, COMMA);
        }
    }

    fn lower_expr_or_spread(&mut self, arg: &ast::ExprOrSpread) -> NodeId {
        match arg.spread {
            Some(dots) => {
                let span = dots.to(arg.expr.span());
                let node = self.node(SyntaxKind::Spread, span);
                let expr = self.lower_expr(&arg.expr);
                self.add(node, expr, Role::Expression);
                node
            }
            None => self.lower_expr(&arg.expr),
        }
    }

    fn lower_prop(&mut self, prop: &ast::Prop) -> NodeId {
        match prop {
            ast::Prop::Shorthand(ident) => {
                self.named(SyntaxKind::ShorthandProp, ident.span(), &ident.sym)
            }
            ast::Prop::KeyValue(kv) => {
                let node = self.node(SyntaxKind::KeyValueProp, kv.span());
                let key = self.lower_prop_name(&kv.key);
                self.add(node, key, Role::Key);
                let value = self.lower_expr(&kv.value);
                self.add(node, value, Role::Value);
                node
            }
            ast::Prop::Getter(getter) => {
                let node = self.node(SyntaxKind::GetterProp, getter.span());
                let key = self.lower_prop_name(&getter.key);
                self.add(node, key, Role::Key);
                let ty = getter.type_ann.as_deref().map(|t| self.lower_type_ann(t));
                self.add_opt(node, ty, Role::ReturnType);
                let body = getter.body.as_ref().map(|b| self.lower_block(b));
                self.add_opt(node, body, Role::Body);
                node
            }
            ast::Prop::Setter(setter) => {
                let node = self.node(SyntaxKind::SetterProp, setter.span());
                let key = self.lower_prop_name(&setter.key);
                self.add(node, key, Role::Key);
                let param = self.wrap_param(&setter.param);
                self.add(node, param, Role::Param);
                let body = setter.body.as_ref().map(|b| self.lower_block(b));
                self.add_opt(node, body, Role::Body);
                node
            }
            ast::Prop::Method(method) => {
                let node = self.node(SyntaxKind::MethodProp, method.span());
                let key = self.lower_prop_name(&method.key);
                self.add(node, key, Role::Key);
                self.lower_function_parts(node, &method.function);
                node
            }
            ast::Prop::Assign(assign) => self.opaque(assign.span()),
        }
    }

    fn lower_template(&mut self, tpl: &ast::Tpl) -> NodeId {
        let node = self.node(SyntaxKind::Template, tpl.span());
        for (i, quasi) in tpl.quasis.iter().enumerate() {
            let q = self.node(SyntaxKind::TemplateElement, quasi.span());
            self.tree
                .set_data(q, NodeData::Str(quasi.raw.to_string()));
            self.add(node, q, Role::Quasi);
            if let Some(expr) = tpl.exprs.get(i) {
                let child = self.lower_expr(expr);
                self.add(node, child, Role::Expression);
            }
        }
        node
    }

    fn lower_lit(&mut self, lit: &ast::Lit) -> NodeId {
        match lit {
            ast::Lit::Str(s) => {
                let node = self.node(SyntaxKind::String, s.span());
                self.tree.set_data(node, NodeData::Str(str_value(s)));
                node
            }
            ast::Lit::Bool(b) => {
                let node = self.node(SyntaxKind::Bool, b.span());
                self.tree.set_data(node, NodeData::Bool(b.value));
                node
            }
            ast::Lit::Null(n) => self.node(SyntaxKind::Null, n.span()),
            ast::Lit::Num(n) => {
                let node = self.node(SyntaxKind::Number, n.span());
                self.tree.set_data(node, NodeData::Num(n.value));
                node
            }
            ast::Lit::BigInt(b) => self.node(SyntaxKind::BigInt, b.span()),
            ast::Lit::Regex(re) => {
                let node = self.node(SyntaxKind::Regex, re.span());
                self.tree.set_data(
                    node,
                    NodeData::Regex {
                        pattern: re.exp.to_string(),
                        flags: re.flags.to_string(),
                    },
                );
                node
            }
            other => self.opaque(other.span()),
        }
    }

    // Types

    fn lower_type_ann(&mut self, ann: &ast::TsTypeAnn) -> NodeId {
        let node = self.node(SyntaxKind::TypeAnn, ann.span());
        let ty = self.lower_type(&ann.type_ann);
        self.add(node, ty, Role::Element);
        node
    }

    fn lower_type_params(&mut self, decl: &ast::TsTypeParamDecl) -> NodeId {
        let node = self.node(SyntaxKind::TypeParams, decl.span());
        for param in &decl.params {
            let p = self.named(SyntaxKind::TypeParam, param.span(), &param.name.sym);
            let constraint = param.constraint.as_deref().map(|c| self.lower_type(c));
            self.add_opt(p, constraint, Role::Constraint);
            let default = param.default.as_deref().map(|d| self.lower_type(d));
            self.add_opt(p, default, Role::Default);
            self.add_listed(node, p, Role::Element, COMMA);
        }
        node
    }

    fn lower_type_args(&mut self, args: &ast::TsTypeParamInstantiation) -> NodeId {
        let node = self.node(SyntaxKind::TypeArgs, args.span());
        for ty in &args.params {
            let child = self.lower_type(ty);
            self.add_listed(node, child, Role::Element, COMMA);
        }
        node
    }

    fn lower_entity_name(&mut self, name: &ast::TsEntityName) -> NodeId {
        match name {
            ast::TsEntityName::Ident(ident) => {
                self.named(SyntaxKind::Ident, ident.span(), &ident.sym)
            }
            ast::TsEntityName::TsQualifiedName(q) => {
                let node = self.node(SyntaxKind::QualifiedName, q.span());
                let left = self.lower_entity_name(&q.left);
                self.add(node, left, Role::Left);
                let right = self.named(SyntaxKind::PropIdent, q.right.span(), &q.right.sym);
                self.add(node, right, Role::Right);
                node
            }
        }
    }

    fn lower_type(&mut self, ty: &ast::TsType) -> NodeId {
        match ty {
            ast::TsType::TsKeywordType(k) => {
                let node = self.node(SyntaxKind::KeywordType, k.span());
                self.tree
                    .set_data(node, NodeData::Keyword(keyword_type(k.kind)));
                node
            }
            ast::TsType::TsThisType(t) => self.node(SyntaxKind::ThisType, t.span()),
            ast::TsType::TsFnOrConstructorType(ast::TsFnOrConstructorType::TsFnType(f)) => {
                let node = self.node(SyntaxKind::FnType, f.span());
                let params = f.type_params.as_deref().map(|p| self.lower_type_params(p));
                self.add_opt(node, params, Role::TypeParams);
                for param in &f.params {
                    let child = self.lower_fn_param(param);
                    self.add_listed(node, child, Role::Param, COMMA);
                }
                let ret = self.lower_type_ann(&f.type_ann);
                self.add(node, ret, Role::ReturnType);
                node
            }
            ast::TsType::TsFnOrConstructorType(c) => {
                self.node(SyntaxKind::ConstructorType, c.span())
            }
            ast::TsType::TsTypeRef(r) => {
                let node = self.node(SyntaxKind::TypeRef, r.span());
                let name = self.lower_entity_name(&r.type_name);
                self.add(node, name, Role::Name);
                let args = r.type_params.as_deref().map(|a| self.lower_type_args(a));
                self.add_opt(node, args, Role::TypeArgs);
                node
            }
            ast::TsType::TsTypeQuery(q) => self.node(SyntaxKind::TypeQuery, q.span()),
            ast::TsType::TsTypeLit(lit) => {
                let node = self.node(SyntaxKind::TypeLiteral, lit.span());
                for member in &lit.members {
                    let child = self.lower_type_element(member);
                    self.add_listed(node, child, Role::Member, MEMBER_SEPARATORS);
                }
                node
            }
            ast::TsType::TsArrayType(a) => {
                let node = self.node(SyntaxKind::ArrayType, a.span());
                let elem = self.lower_type(&a.elem_type);
                self.add(node, elem, Role::Element);
                node
            }
            ast::TsType::TsTupleType(t) => {
                let node = self.node(SyntaxKind::TupleType, t.span());
                for element in &t.elem_types {
                    let child = if element.label.is_some() {
                        let labeled = self.node(SyntaxKind::TupleElement, element.span());
                        let ty = self.lower_type(&element.ty);
                        self.add(labeled, ty, Role::Element);
                        labeled
                    } else {
                        self.lower_type(&element.ty)
                    };
                    self.add_listed(node, child, Role::Element, COMMA);
                }
                node
            }
            ast::TsType::TsOptionalType(o) => {
                let node = self.node(SyntaxKind::OptionalType, o.span());
                let inner = self.lower_type(&o.type_ann);
                self.add(node, inner, Role::Element);
                node
            }
            ast::TsType::TsRestType(r) => {
                let node = self.node(SyntaxKind::RestType, r.span());
                let inner = self.lower_type(&r.type_ann);
                self.add(node, inner, Role::Element);
                node
            }
            ast::TsType::TsUnionOrIntersectionType(u) => {
                let (kind, types) = match u {
                    ast::TsUnionOrIntersectionType::TsUnionType(u) => {
                        (SyntaxKind::UnionType, &u.types)
                    }
                    ast::TsUnionOrIntersectionType::TsIntersectionType(i) => {
                        (SyntaxKind::IntersectionType, &i.types)
                    }
                };
                let node = self.node(kind, u.span());
                for member in types {
                    let child = self.lower_type(member);
                    self.add(node, child, Role::Element);
                }
                node
            }
            ast::TsType::TsConditionalType(c) => self.node(SyntaxKind::ConditionalType, c.span()),
            ast::TsType::TsInferType(i) => self.node(SyntaxKind::InferType, i.span()),
            ast::TsType::TsParenthesizedType(p) => {
                let node = self.node(SyntaxKind::ParenType, p.span());
                let inner = self.lower_type(&p.type_ann);
                self.add(node, inner, Role::Element);
                node
            }
            ast::TsType::TsTypeOperator(o) => {
                let node = self.node(SyntaxKind::TypeOperator, o.span());
                let op = match o.op {
                    ast::TsTypeOperatorOp::KeyOf => TypeOperatorKind::KeyOf,
                    ast::TsTypeOperatorOp::Unique => TypeOperatorKind::Unique,
                    ast::TsTypeOperatorOp::ReadOnly => TypeOperatorKind::ReadOnly,
                };
                self.tree.set_data(node, NodeData::TypeOperator(op));
                let inner = self.lower_type(&o.type_ann);
                self.add(node, inner, Role::Element);
                node
            }
            ast::TsType::TsIndexedAccessType(i) => {
                self.node(SyntaxKind::IndexedAccessType, i.span())
            }
            ast::TsType::TsMappedType(m) => self.node(SyntaxKind::MappedType, m.span()),
            ast::TsType::TsLitType(l) => {
                let data = match &l.lit {
                    ast::TsLit::Number(n) => NodeData::Num(n.value),
                    ast::TsLit::Str(s) => NodeData::Str(str_value(s)),
                    ast::TsLit::Bool(b) => NodeData::Bool(b.value),
                    ast::TsLit::Tpl(_) => {
                        return self.node(SyntaxKind::TemplateLiteralType, l.span())
                    }
                    ast::TsLit::BigInt(_) => NodeData::None,
                };
                let node = self.node(SyntaxKind::LiteralType, l.span());
                self.tree.set_data(node, data);
                node
            }
            ast::TsType::TsTypePredicate(p) => self.node(SyntaxKind::TypePredicate, p.span()),
            ast::TsType::TsImportType(i) => self.node(SyntaxKind::ImportType, i.span()),
        }
    }

    fn lower_fn_param(&mut self, param: &ast::TsFnParam) -> NodeId {
        let node = self.node(SyntaxKind::Param, param.span());
        let pat = match param {
            ast::TsFnParam::Ident(ident) => self.lower_binding_ident(ident),
            ast::TsFnParam::Array(array) => self.lower_array_pat(array),
            ast::TsFnParam::Rest(rest) => self.lower_rest_pat(rest),
            ast::TsFnParam::Object(object) => self.lower_object_pat(object),
        };
        self.add(node, pat, Role::Name);
        node
    }

    fn lower_signature_key(&mut self, key: &ast::Expr, computed: bool) -> NodeId {
        match key {
            ast::Expr::Ident(ident) if !computed => {
                self.named(SyntaxKind::PropIdent, ident.span(), &ident.sym)
            }
            ast::Expr::Lit(ast::Lit::Str(s)) if !computed => {
                let node = self.node(SyntaxKind::String, s.span());
                self.tree.set_data(node, NodeData::Str(str_value(s)));
                node
            }
            other => {
                let node = self.node(SyntaxKind::ComputedKey, other.span());
                let expr = self.lower_expr(other);
                self.add(node, expr, Role::Expression);
                node
            }
        }
    }

    fn lower_type_element(&mut self, element: &ast::TsTypeElement) -> NodeId {
        match element {
            ast::TsTypeElement::TsPropertySignature(prop) => {
                let node = self.node(SyntaxKind::PropertySignature, prop.span());
                let mut flags = NodeFlags::empty();
                flags.set(NodeFlags::READONLY, prop.readonly);
                flags.set(NodeFlags::OPTIONAL, prop.optional);
                flags.set(NodeFlags::COMPUTED, prop.computed);
                self.tree.add_flags(node, flags);
                let key = self.lower_signature_key(&prop.key, prop.computed);
                self.add(node, key, Role::Key);
                let ty = prop.type_ann.as_deref().map(|t| self.lower_type_ann(t));
                self.add_opt(node, ty, Role::TypeAnn);
                node
            }
            ast::TsTypeElement::TsMethodSignature(method) => {
                let node = self.node(SyntaxKind::MethodSignature, method.span());
                let mut flags = NodeFlags::empty();
                flags.set(NodeFlags::OPTIONAL, method.optional);
                flags.set(NodeFlags::COMPUTED, method.computed);
                self.tree.add_flags(node, flags);
                let key = self.lower_signature_key(&method.key, method.computed);
                self.add(node, key, Role::Key);
                let params = method.type_params.as_deref().map(|p| self.lower_type_params(p));
                self.add_opt(node, params, Role::TypeParams);
                for param in &method.params {
                    let child = self.lower_fn_param(param);
                    self.add_listed(node, child, Role::Param, COMMA);
                }
                let ret = method.type_ann.as_deref().map(|t| self.lower_type_ann(t));
                self.add_opt(node, ret, Role::ReturnType);
                node
            }
            ast::TsTypeElement::TsIndexSignature(s) => {
                self.node(SyntaxKind::IndexSignature, s.span())
            }
            ast::TsTypeElement::TsCallSignatureDecl(s) => {
                self.node(SyntaxKind::CallSignature, s.span())
            }
            ast::TsTypeElement::TsConstructSignatureDecl(s) => {
                self.node(SyntaxKind::ConstructSignature, s.span())
            }
            ast::TsTypeElement::TsGetterSignature(s) => {
                self.node(SyntaxKind::GetterSignature, s.span())
            }
            ast::TsTypeElement::TsSetterSignature(s) => {
                self.node(SyntaxKind::SetterSignature, s.span())
            }
        }
    }
}

fn str_value(s: &ast::Str) -> String {
    s.value.as_str().unwrap_or("").to_string()
}

fn export_name(name: &ast::ModuleExportName) -> String {
    match name {
        ast::ModuleExportName::Ident(id) => id.sym.to_string(),
        ast::ModuleExportName::Str(s) => str_value(s),
    }
}

fn accessibility(access: Option<ast::Accessibility>) -> NodeFlags {
    match access {
        Some(ast::Accessibility::Private) => NodeFlags::PRIVATE,
        Some(ast::Accessibility::Protected) => NodeFlags::PROTECTED,
        Some(ast::Accessibility::Public) => NodeFlags::PUBLIC,
        None => NodeFlags::empty(),
    }
}

fn method_kind(kind: ast::MethodKind) -> MethodKind {
    match kind {
        ast::MethodKind::Method => MethodKind::Method,
        ast::MethodKind::Getter => MethodKind::Getter,
        ast::MethodKind::Setter => MethodKind::Setter,
    }
}

fn unary_op(op: ast::UnaryOp) -> UnaryOp {
    match op {
        ast::UnaryOp::Minus => UnaryOp::Minus,
        ast::UnaryOp::Plus => UnaryOp::Plus,
        ast::UnaryOp::Bang => UnaryOp::Not,
        ast::UnaryOp::Tilde => UnaryOp::BitNot,
        ast::UnaryOp::TypeOf => UnaryOp::TypeOf,
        ast::UnaryOp::Void => UnaryOp::Void,
        ast::UnaryOp::Delete => UnaryOp::Delete,
    }
}

fn binary_op(op: ast::BinaryOp) -> BinaryOp {
    match op {
        ast::BinaryOp::EqEq => BinaryOp::EqEq,
        ast::BinaryOp::NotEq => BinaryOp::NotEq,
        ast::BinaryOp::EqEqEq => BinaryOp::EqEqEq,
        ast::BinaryOp::NotEqEq => BinaryOp::NotEqEq,
        ast::BinaryOp::Lt => BinaryOp::Lt,
        ast::BinaryOp::LtEq => BinaryOp::LtEq,
        ast::BinaryOp::Gt => BinaryOp::Gt,
        ast::BinaryOp::GtEq => BinaryOp::GtEq,
        ast::BinaryOp::LShift => BinaryOp::LShift,
        ast::BinaryOp::RShift => BinaryOp::RShift,
        ast::BinaryOp::ZeroFillRShift => BinaryOp::ZeroFillRShift,
        ast::BinaryOp::Add => BinaryOp::Add,
        ast::BinaryOp::Sub => BinaryOp::Sub,
        ast::BinaryOp::Mul => BinaryOp::Mul,
        ast::BinaryOp::Div => BinaryOp::Div,
        ast::BinaryOp::Mod => BinaryOp::Mod,
        ast::BinaryOp::BitOr => BinaryOp::BitOr,
        ast::BinaryOp::BitXor => BinaryOp::BitXor,
        ast::BinaryOp::BitAnd => BinaryOp::BitAnd,
        ast::BinaryOp::LogicalOr => BinaryOp::LogicalOr,
        ast::BinaryOp::LogicalAnd => BinaryOp::LogicalAnd,
        ast::BinaryOp::In => BinaryOp::In,
        ast::BinaryOp::InstanceOf => BinaryOp::InstanceOf,
        ast::BinaryOp::Exp => BinaryOp::Exp,
        ast::BinaryOp::NullishCoalescing => BinaryOp::NullishCoalescing,
    }
}

fn assign_op(op: ast::AssignOp) -> AssignOp {
    match op {
        ast::AssignOp::Assign => AssignOp::Assign,
        ast::AssignOp::AddAssign => AssignOp::Add,
        ast::AssignOp::SubAssign => AssignOp::Sub,
        ast::AssignOp::MulAssign => AssignOp::Mul,
        ast::AssignOp::DivAssign => AssignOp::Div,
        ast::AssignOp::ModAssign => AssignOp::Mod,
        ast::AssignOp::LShiftAssign => AssignOp::LShift,
        ast::AssignOp::RShiftAssign => AssignOp::RShift,
        ast::AssignOp::ZeroFillRShiftAssign => AssignOp::ZeroFillRShift,
        ast::AssignOp::BitOrAssign => AssignOp::BitOr,
        ast::AssignOp::BitXorAssign => AssignOp::BitXor,
        ast::AssignOp::BitAndAssign => AssignOp::BitAnd,
        ast::AssignOp::ExpAssign => AssignOp::Exp,
        ast::AssignOp::AndAssign => AssignOp::And,
        ast::AssignOp::OrAssign => AssignOp::Or,
        ast::AssignOp::NullishAssign => AssignOp::Nullish,
    }
}

fn keyword_type(kind: ast::TsKeywordTypeKind) -> KeywordType {
    use ast::TsKeywordTypeKind::*;
    match kind {
        TsAnyKeyword => KeywordType::Any,
        TsUnknownKeyword => KeywordType::Unknown,
        TsNumberKeyword => KeywordType::Number,
        TsObjectKeyword => KeywordType::Object,
        TsBooleanKeyword => KeywordType::Boolean,
        TsBigIntKeyword => KeywordType::BigInt,
        TsStringKeyword => KeywordType::String,
        TsSymbolKeyword => KeywordType::Symbol,
        TsVoidKeyword => KeywordType::Void,
        TsUndefinedKeyword => KeywordType::Undefined,
        TsNullKeyword => KeywordType::Null,
        TsNeverKeyword => KeywordType::Never,
        TsIntrinsicKeyword => KeywordType::Intrinsic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_diagnostics::SourceCache;

    fn lower(source: &str) -> SyntaxTree {
        let mut cache = SourceCache::new();
        let parsed = ferry_parser::parse_typescript_with_cache(source, "t.ts", &mut cache).unwrap();
        lower_module(&parsed, source, Path::new("t.ts"), UnitId(0)).unwrap()
    }

    fn find(tree: &SyntaxTree, kind: SyntaxKind) -> NodeId {
        tree.ids().find(|&id| tree.kind(id) == kind).unwrap()
    }

    /// Rebuild text from gaps and leaves only.
    fn rebuild(tree: &SyntaxTree, id: NodeId) -> String {
        let Some(span) = tree.span(id) else {
            return String::new();
        };
        let mut out = String::new();
        let mut cursor = span.start;
        let mut any = false;
        for &child in tree.children(id) {
            if let Some(cs) = tree.span(child) {
                out.push_str(tree.slice(cursor, cs.start));
                out.push_str(&rebuild(tree, child));
                cursor = cs.end;
                any = true;
            }
        }
        if !any {
            return tree.text(id).to_string();
        }
        out.push_str(tree.slice(cursor, span.end));
        out
    }

    #[test]
    fn test_structure_reproduces_source() {
        let source = "// header\nimport { a, b as c } from './m';\n\nexport class K<T> extends B implements I {\n  private x: number = 1; // trailing\n  constructor(public y: string) { super(); }\n  async m(p = 2, ...rest: T[]): Promise<void> { return; }\n}\nconst { q, r: [s, , t] } = obj;\nlet u = `a${b}c` + f(1, ...g);\n";
        let tree = lower(source);
        assert_eq!(rebuild(&tree, tree.root()), source);
    }

    #[test]
    fn test_separators_attached_to_lists() {
        let tree = lower("f(a, b, c);");
        let call = find(&tree, SyntaxKind::Call);
        let seps = tree
            .children(call)
            .iter()
            .filter(|&&c| tree.kind(c) == SyntaxKind::Separator)
            .count();
        assert_eq!(seps, 2);
    }

    #[test]
    fn test_trailing_comma_becomes_separator() {
        let tree = lower("let x = [1, 2,];");
        let array = find(&tree, SyntaxKind::ArrayLit);
        let kinds: Vec<_> = tree.children(array).iter().map(|&c| tree.kind(c)).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Number,
                SyntaxKind::Separator,
                SyntaxKind::Number,
                SyntaxKind::Separator
            ]
        );
    }

    #[test]
    fn test_holes_are_synthetic() {
        let tree = lower("const [a, , b] = xs;");
        let pat = find(&tree, SyntaxKind::ArrayPat);
        let hole = tree
            .children(pat)
            .iter()
            .copied()
            .find(|&c| tree.kind(c) == SyntaxKind::Hole)
            .unwrap();
        assert!(tree.span(hole).is_none());
        assert_eq!(tree.parent(hole), Some(pat));
    }

    #[test]
    fn test_function_parts_and_flags() {
        let tree = lower("async function f<T>(a: T, b?: number): Promise<T> { return a; }");
        let f = find(&tree, SyntaxKind::FnDecl);
        assert!(tree.has_flag(f, NodeFlags::ASYNC));
        assert_eq!(tree.name(tree.child(f, Role::Name).unwrap()), Some("f"));
        assert!(tree.child(f, Role::TypeParams).is_some());
        assert_eq!(tree.children_with(f, Role::Param).count(), 2);
        assert!(tree.child(f, Role::ReturnType).is_some());
        let b = tree
            .ids()
            .find(|&id| tree.kind(id) == SyntaxKind::BindingIdent && tree.name(id) == Some("b"))
            .unwrap();
        assert!(tree.has_flag(b, NodeFlags::OPTIONAL));
    }

    #[test]
    fn test_class_body_starts_at_brace() {
        let tree = lower("class A extends B { x = 1; }");
        let body = find(&tree, SyntaxKind::ClassBody);
        assert!(tree.text(body).starts_with('{'));
        assert!(tree.text(body).ends_with('}'));
    }

    #[test]
    fn test_import_specifiers() {
        let tree = lower("import D, { a as b } from \"./m\";");
        let import = find(&tree, SyntaxKind::Import);
        assert_eq!(tree.data(import), &NodeData::Source("./m".to_string()));
        let named = find(&tree, SyntaxKind::ImportNamed);
        assert_eq!(
            tree.data(named),
            &NodeData::Specifier {
                local: "b".to_string(),
                remote: Some("a".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_type_constructs_are_leaves() {
        let tree = lower("type T = A extends B ? C : D;");
        let cond = find(&tree, SyntaxKind::ConditionalType);
        assert!(tree.children(cond).is_empty());
        assert_eq!(tree.text(cond), "A extends B ? C : D");
    }
}
