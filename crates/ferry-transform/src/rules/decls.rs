//! Module and block level declarations.

use super::functions::function_text;
use super::types::structure;
use super::{always, binding_name, decorators, member_name, Rewrite, Rule};
use crate::context::RewriteContext;
use crate::destructure;
use crate::engine::{RewriteResult, Transformer};
use crate::rules::annotation_type;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{NodeData, NodeFlags, Role, SyntaxKind as K, SyntaxTree, VarKind};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new(
        "ambient-declaration",
        &[
            K::VarStmt,
            K::FnDecl,
            K::ClassDecl,
            K::InterfaceDecl,
            K::TypeAliasDecl,
            K::EnumDecl,
        ],
        is_ambient_node,
        remove_declaration,
    ),
    Rule::new("variable-statement", &[K::VarStmt], always, variable_statement),
    Rule::new(
        "generator-function-declaration",
        &[K::FnDecl],
        is_generator,
        generator_declaration,
    ),
    Rule::new("function-declaration", &[K::FnDecl], always, function_declaration),
    Rule::new("class-declaration", &[K::ClassDecl], always, class_declaration),
    Rule::new("interface-declaration", &[K::InterfaceDecl], always, interface_declaration),
    Rule::new("type-alias", &[K::TypeAliasDecl], always, type_alias),
    Rule::new("enum-declaration", &[K::EnumDecl], always, enum_declaration),
    Rule::new("namespace", &[K::NamespaceDecl], always, namespace),
];

/// `declare`d statements and bodiless function overloads emit nothing.
pub(crate) fn is_ambient(tree: &SyntaxTree, decl: NodeId) -> bool {
    tree.has_flag(decl, NodeFlags::DECLARE)
        || (tree.kind(decl) == K::FnDecl && tree.has_flag(decl, NodeFlags::BODYLESS))
}

fn is_ambient_node(t: &Transformer<'_>, node: NodeId) -> bool {
    is_ambient(t.tree(), node)
}

fn remove_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(t.remove(node))
}

fn variable_statement(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let keyword = match tree.data(node) {
        NodeData::Var(VarKind::Const) => "final",
        _ => "var",
    };
    let mut statements = Vec::new();
    for declarator in tree.children_with(node, Role::Declarator) {
        let pattern = t.required(declarator, Role::Name)?;
        let init = tree.child(declarator, Role::Init);
        match (tree.kind(pattern), init) {
            (K::BindingIdent, _) => {
                statements.push(variable(t, pattern, init, keyword, ctx)?);
            }
            (_, Some(init)) => {
                statements.extend(destructure::declaration(
                    t,
                    pattern,
                    init,
                    keyword,
                    ctx.nested(),
                )?);
            }
            (_, None) => statements.push(t.unsupported(
                declarator,
                DiagnosticCode::UnsupportedPattern,
                "binding pattern without an initializer",
            )),
        }
    }
    // Loop heads supply their own punctuation.
    let end = match tree.role(node) {
        Role::Init | Role::Left => "",
        _ => t.statement_end(node),
    };
    let separator = format!(";\n{}", t.indent(node));
    Ok(Rewrite::Replace(format!("{}{end}", statements.join(&separator))))
}

fn variable(
    t: &mut Transformer<'_>,
    binding: NodeId,
    init: Option<NodeId>,
    keyword: &str,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let name = binding_name(t, binding)?;
    let ty = match annotation_type(t, binding, Role::TypeAnn, ctx.nested())? {
        Some(ty) => format!(":{ty}"),
        // Module-level fields need a type when nothing can be inferred.
        None if ctx.module_level && init.is_none() => ":Dynamic".to_string(),
        None => String::new(),
    };
    let init = match init {
        Some(init) => format!(" = {}", t.visit(init, ctx.nested())?),
        None => String::new(),
    };
    Ok(format!("{keyword} {name}{ty}{init}"))
}

fn is_generator(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().has_flag(node, NodeFlags::GENERATOR)
}

fn generator_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "generator function",
    )))
}

fn function_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let name = binding_name(t, t.required(node, Role::Name)?)?;
    function_text(t, node, Some(name), ctx).map(Rewrite::Replace)
}

/// `class C<T> extends B<U> {..}`; `implements` clauses have no counterpart
/// because interfaces become structures.
fn class_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let decorators = decorators(t, node)?;
    let name = binding_name(t, t.required(node, Role::Name)?)?;
    let type_params = t.visit_child(node, Role::TypeParams, ctx.nested())?;
    let extends = match tree.child(node, Role::SuperClass) {
        Some(base) => format!(
            " extends {}{}",
            t.visit(base, ctx.nested())?,
            t.visit_child(node, Role::TypeArgs, ctx.nested())?
        ),
        None => String::new(),
    };
    let body = t.visit_child(node, Role::Body, ctx.nested())?;
    let modifier = if tree.has_flag(node, NodeFlags::ABSTRACT) {
        "abstract "
    } else {
        ""
    };
    Ok(Rewrite::Replace(format!(
        "{decorators}{modifier}class {name}{type_params}{extends} {body}"
    )))
}

/// `typedef I<T> = A & B & { .. };`
fn interface_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let name = binding_name(t, t.required(node, Role::Name)?)?;
    let type_params = t.visit_child(node, Role::TypeParams, ctx)?;
    let mut parts = Vec::new();
    for heritage in tree.children_with(node, Role::Extends) {
        let base = t.required(heritage, Role::Expression)?;
        let base = t.visit(base, ctx)?;
        let args = t.visit_child(heritage, Role::TypeArgs, ctx)?;
        parts.push(format!("{base}{args}"));
    }
    let body = t.required(node, Role::Body)?;
    parts.push(structure(t, body, ctx)?);
    Ok(Rewrite::Replace(format!(
        "typedef {name}{type_params} = {};",
        parts.join(" & ")
    )))
}

fn type_alias(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let ctx = ctx.nested();
    let name = binding_name(t, t.required(node, Role::Name)?)?;
    let type_params = t.visit_child(node, Role::TypeParams, ctx)?;
    let value = t.visit(t.required(node, Role::Value)?, ctx)?;
    Ok(Rewrite::Replace(format!(
        "typedef {name}{type_params} = {value}{}",
        t.statement_end(node)
    )))
}

/// `enum abstract E(Int) { var A = 0; .. }`, continuing numeric values the
/// way the source enum auto-increments them.
fn enum_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let name = binding_name(t, t.required(node, Role::Name)?)?;
    let body = t.required(node, Role::Body)?;

    let members: Vec<NodeId> = tree.children_with(body, Role::Member).collect();
    let underlying = if members.iter().any(|&m| {
        tree.child(m, Role::Init)
            .is_some_and(|init| tree.kind(init) == K::String)
    }) {
        "String"
    } else {
        "Int"
    };

    let mut overrides = Vec::with_capacity(members.len());
    let mut next: Option<f64> = Some(0.0);
    for member in members {
        let key = t.required(member, Role::Key)?;
        let Some(key_name) = member_name(tree, key) else {
            let text = t.unsupported(member, DiagnosticCode::UnsupportedMember, "enum member name");
            overrides.push((member, text));
            continue;
        };
        let value = match tree.child(member, Role::Init) {
            Some(init) => {
                next = match tree.data(init) {
                    NodeData::Num(value) => Some(value + 1.0),
                    _ => None,
                };
                t.visit(init, ctx)?
            }
            None => match next {
                Some(value) => {
                    next = Some(value + 1.0);
                    format_number(value)
                }
                None => {
                    let text = t.unsupported(
                        member,
                        DiagnosticCode::UnsupportedMember,
                        "enum member following a computed value",
                    );
                    overrides.push((member, text));
                    continue;
                }
            },
        };
        overrides.push((member, format!("var {key_name} = {value};")));
    }
    for separator in tree.children_with(body, Role::Separator) {
        t.suppress(separator);
    }
    let body = t.reassemble_with(body, ctx, &overrides)?;
    Ok(Rewrite::Replace(format!(
        "enum abstract {name}({underlying}) {body}"
    )))
}

pub(super) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn namespace(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "namespace",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{transpile, transpile_with};

    #[test]
    fn test_variable_keywords() {
        assert_eq!(
            transpile("let a = 1, b: string = \"x\";\nconst c = true;\nvar d;\n"),
            "var a = 1;\nvar b:String = \"x\";\nfinal c = true;\nvar d:Dynamic;\n"
        );
    }

    #[test]
    fn test_local_variable_without_type_stays_untyped() {
        assert_eq!(
            transpile("function f() {\n  let x;\n}\n"),
            "function f() {\n  var x;\n}\n"
        );
    }

    #[test]
    fn test_ambient_and_overloads_are_removed() {
        let source = "declare const VERSION: string;\nfunction f(a: string): void;\n\
                      function f(a: any) {}\nlet x = 1;\n";
        assert_eq!(transpile(source), "function f(a:Dynamic) {}\nvar x = 1;\n");
    }

    #[test]
    fn test_class_heading() {
        let out = transpile(
            "abstract class Box<T> extends Base<T> implements Sized {}\n",
        );
        assert_eq!(out, "abstract class Box<T> extends Base<T> {}\n");
    }

    #[test]
    fn test_interface_becomes_structure() {
        let out = transpile(
            "interface Named extends Base {\n  name: string;\n  nick?: string;\n  readonly id: number;\n  greet(to: string): void;\n}\n",
        );
        assert_eq!(
            out,
            "typedef Named = Base & {\n  var name:String;\n  @:optional var nick:String;\n  \
             final id:Float;\n  function greet(to:String):Void;\n};\n"
        );
    }

    #[test]
    fn test_type_alias() {
        assert_eq!(
            transpile("type Id = string;\ntype Pair<T> = [T, T];\n"),
            "typedef Id = String;\ntypedef Pair<T> = Array<T>;\n"
        );
    }

    #[test]
    fn test_enum_values_continue_after_explicit_ones() {
        let out = transpile("enum Color {\n  Red,\n  Green = 5,\n  Blue\n}\n");
        assert_eq!(
            out,
            "enum abstract Color(Int) {\n  var Red = 0;\n  var Green = 5;\n  var Blue = 6;\n}\n"
        );
    }

    #[test]
    fn test_string_enum() {
        let out = transpile("enum Mode { On = \"on\", Off = \"off\" }\n");
        assert_eq!(
            out,
            "enum abstract Mode(String) { var On = \"on\"; var Off = \"off\"; }\n"
        );
    }

    #[test]
    fn test_namespace_is_commented_out() {
        let output = transpile_with("namespace N { export const a = 1; }\n", |o| o).expect("transform");
        assert_eq!(output.body, "/* namespace N { export const a = 1; } */\n");
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedSyntax), 1);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
    }
}
