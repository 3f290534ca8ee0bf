//! Functions, parameters and blocks.

use super::{always, binding_name, decorators, Rewrite, Rule};
use crate::async_return;
use crate::context::RewriteContext;
use crate::destructure;
use crate::engine::{RewriteResult, Transformer};
use crate::rename::BindingKey;
use crate::rules::annotation_type;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{NodeData, NodeFlags, Role, SyntaxKind as K, SyntaxTree, UnaryOp};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new("receiver-parameter", &[K::Param], is_receiver, receiver_parameter),
    Rule::new("parameter", &[K::Param], always, parameter),
    Rule::new("parameter-property", &[K::ParamProp], always, parameter_property),
    Rule::new("generator-function", &[K::FnExpr], is_generator, generator_function),
    Rule::new("function-expression", &[K::FnExpr], always, function_expression),
    Rule::new("arrow-function", &[K::Arrow], always, arrow_function),
    Rule::new("block", &[K::Block], always, block),
];

/// Rendered pieces of a function head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Signature {
    pub type_params: String,
    pub params: String,
    pub ret: Option<String>,
}

impl Signature {
    /// `<T>(a:A):R`
    pub fn render(&self) -> String {
        let ret = self.ret.as_ref().map(|r| format!(":{r}")).unwrap_or_default();
        format!("{}({}){ret}", self.type_params, self.params)
    }
}

pub(crate) fn function_params(
    t: &mut Transformer<'_>,
    func: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    t.visit_all(func, Role::Param, ctx, ", ")
}

/// Parameters are rendered before the body so their prologues are queued in time.
pub(crate) fn signature(
    t: &mut Transformer<'_>,
    func: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Signature> {
    let type_params = t.visit_child(func, Role::TypeParams, ctx)?;
    let params = function_params(t, func, ctx)?;
    let ret = annotation_type(t, func, Role::ReturnType, ctx)?;
    Ok(Signature {
        type_params,
        params,
        ret,
    })
}

/// `function name<T>(params):R body`, or a `;`-terminated head without a body.
pub(crate) fn function_text(
    t: &mut Transformer<'_>,
    func: NodeId,
    name: Option<&str>,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    async_return::plan(t, func);
    let head = signature(t, func, ctx.nested())?.render();
    let body = t.visit_child(func, Role::Body, ctx.nested())?;
    let keyword = match name {
        Some(name) => format!("function {name}"),
        None => "function".to_string(),
    };
    Ok(if body.is_empty() {
        format!("{keyword}{head};")
    } else {
        format!("{keyword}{head} {body}")
    })
}

/// Defaults Haxe accepts at the call boundary: constants and plain identifiers.
pub(crate) fn is_primitive_default(tree: &SyntaxTree, expr: NodeId) -> bool {
    match tree.kind(expr) {
        K::Number | K::String | K::Bool | K::Null | K::Ident => true,
        K::Template => tree.child(expr, Role::Expression).is_none(),
        K::Unary => {
            matches!(
                tree.data(expr),
                NodeData::Unary(UnaryOp::Minus | UnaryOp::Plus)
            ) && tree
                .child(expr, Role::Operand)
                .is_some_and(|operand| tree.kind(operand) == K::Number)
        }
        _ => false,
    }
}

fn is_receiver(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Name)
        .is_some_and(|name| tree.kind(name) == K::BindingIdent && tree.name(name) == Some("this"))
}

/// An explicit `this` parameter names the receiver; `this` in the body follows it.
fn receiver_parameter(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let func = tree
        .parent(node)
        .ok_or_else(|| t.invariant(node, "parameter outside a function"))?;
    let binding = t.required(node, Role::Name)?;
    let name = t.rename("self", BindingKey::Node(func));
    t.state.receivers.insert(func, name.clone());
    let ty = annotation_type(t, binding, Role::TypeAnn, ctx)?.unwrap_or_else(|| "Dynamic".into());
    Ok(Rewrite::Replace(format!("{name}:{ty}")))
}

fn parameter(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let decorators = decorators(t, node)?;
    let pattern = t.required(node, Role::Name)?;
    let text = parameter_binding(t, node, pattern, ctx)?;
    Ok(Rewrite::Replace(format!("{decorators}{text}")))
}

fn parameter_binding(
    t: &mut Transformer<'_>,
    param: NodeId,
    pattern: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    match tree.kind(pattern) {
        K::BindingIdent => simple_parameter(t, pattern, None, ctx),
        K::AssignPat => {
            let left = t.required(pattern, Role::Left)?;
            let default = t.required(pattern, Role::Default)?;
            if tree.kind(left) == K::BindingIdent && is_primitive_default(tree, default) {
                simple_parameter(t, left, Some(default), ctx)
            } else {
                destructure::parameter(t, param, pattern, ctx)
            }
        }
        K::RestPat => rest_parameter(t, pattern, ctx),
        _ => destructure::parameter(t, param, pattern, ctx),
    }
}

/// `?name:T`, `name:T = default` or `name:T`.
pub(crate) fn simple_parameter(
    t: &mut Transformer<'_>,
    ident: NodeId,
    default: Option<NodeId>,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let name = binding_name(t, ident)?;
    let ty = annotation_type(t, ident, Role::TypeAnn, ctx)?
        .or_else(|| ctx.enforce_type_annotation.then(|| "Dynamic".to_string()))
        .map(|ty| format!(":{ty}"))
        .unwrap_or_default();
    Ok(match default {
        Some(default) if !ctx.drop_initializer => {
            format!("{name}{ty} = {}", t.visit(default, ctx.nested())?)
        }
        Some(_) => format!("?{name}{ty}"),
        None if tree.has_flag(ident, NodeFlags::OPTIONAL) => format!("?{name}{ty}"),
        None => format!("{name}{ty}"),
    })
}

/// `...name:T` where the declared type is `T[]` or `Array<T>`.
fn rest_parameter(
    t: &mut Transformer<'_>,
    rest: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let argument = t.required(rest, Role::Argument)?;
    if tree.kind(argument) != K::BindingIdent {
        return Ok(t.unsupported(
            rest,
            DiagnosticCode::UnsupportedPattern,
            "rest parameter pattern",
        ));
    }
    let name = binding_name(t, argument)?;
    let element = match tree.child(rest, Role::TypeAnn) {
        Some(annotation) => rest_element_type(t, annotation, ctx)?,
        None => None,
    };
    Ok(format!(
        "...{name}:{}",
        element.unwrap_or_else(|| "Dynamic".to_string())
    ))
}

fn rest_element_type(
    t: &mut Transformer<'_>,
    annotation: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Option<String>> {
    let tree = t.tree();
    let ty = t.required(annotation, Role::Element)?;
    let element = match tree.kind(ty) {
        K::ArrayType => tree.child(ty, Role::Element),
        K::TypeRef => tree
            .child(ty, Role::TypeArgs)
            .and_then(|args| tree.children_with(args, Role::Element).next()),
        _ => None,
    };
    element.map(|element| t.visit(element, ctx)).transpose()
}

/// The parameter half of a parameter property; the field and its assignment
/// come from the class body and constructor rules.
fn parameter_property(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let decorators = decorators(t, node)?;
    let pattern = t.required(node, Role::Name)?;
    let text = match tree.kind(pattern) {
        K::AssignPat => {
            let left = t.required(pattern, Role::Left)?;
            let default = t.required(pattern, Role::Default)?;
            if is_primitive_default(tree, default) {
                simple_parameter(t, left, Some(default), ctx)?
            } else {
                // The default moves into the constructor's assignment.
                simple_parameter(t, left, Some(default), ctx.signature())?
            }
        }
        _ => simple_parameter(t, pattern, None, ctx)?,
    };
    Ok(Rewrite::Replace(format!("{decorators}{text}")))
}

fn is_generator(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().has_flag(node, NodeFlags::GENERATOR)
}

fn generator_function(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "generator function",
    )))
}

/// Haxe function expressions are anonymous; a name is dropped.
fn function_expression(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    function_text(t, node, None, ctx).map(Rewrite::Replace)
}

fn arrow_function(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let inner = RewriteContext::default();
    async_return::plan(t, node);
    let params = function_params(t, node, inner)?;
    let ret = annotation_type(t, node, Role::ReturnType, inner)?
        .map(|r| format!(":{r}"))
        .unwrap_or_default();
    let body = t.required(node, Role::Body)?;
    if tree.kind(body) == K::Block {
        let body = t.visit(body, inner)?;
        return Ok(Rewrite::Replace(format!("function({params}){ret} {body}")));
    }

    let expr = if tree.has_flag(node, NodeFlags::ASYNC) {
        async_return::wrap_expression(t, body, inner)?
    } else {
        t.visit(body, inner)?
    };
    let prologue = t.state.prologues.remove(&node).unwrap_or_default();
    let has_default = tree.children_with(node, Role::Param).any(|param| {
        tree.child(param, Role::Name)
            .is_some_and(|name| tree.kind(name) == K::AssignPat)
    });
    let text = if !prologue.is_empty() {
        format!(
            "function({params}){ret} {{ {} return {expr}; }}",
            prologue.join(" ")
        )
    } else if !ret.is_empty() || has_default {
        format!("function({params}){ret} return {expr}")
    } else {
        format!("({params}) -> {expr}")
    };
    Ok(Rewrite::Replace(text))
}

/// Blocks splice queued prologue statements in front of their first
/// statement, or after a leading `super(..)` call.
fn block(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let prologue = t.state.prologues.remove(&node).unwrap_or_default();
    if prologue.is_empty() {
        return t.reassemble(node, ctx).map(Rewrite::Replace);
    }
    let Some(first) = tree.child(node, Role::Item) else {
        return Ok(Rewrite::Replace(if tree.text(node).contains('\n') {
            let inner = t.inner_indent(node);
            format!(
                "{{\n{inner}{}\n{}}}",
                prologue.join(&format!("\n{inner}")),
                t.indent(node)
            )
        } else {
            format!("{{ {} }}", prologue.join(" "))
        }));
    };
    let start = tree.span(node).map_or(0, |s| s.start);
    let first_start = tree.span(first).map_or(start, |s| s.start);
    let separator = if tree.slice(start, first_start).contains('\n') {
        format!("\n{}", t.indent(first))
    } else {
        " ".to_string()
    };
    let lines = prologue.join(&separator);
    let first_text = t.visit(first, ctx)?;
    let text = if is_super_call(tree, first) {
        format!("{first_text}{separator}{lines}")
    } else {
        format!("{lines}{separator}{first_text}")
    };
    t.reassemble_with(node, ctx, &[(first, text)])
        .map(Rewrite::Replace)
}

fn is_super_call(tree: &SyntaxTree, statement: NodeId) -> bool {
    tree.kind(statement) == K::ExprStmt
        && tree
            .child(statement, Role::Expression)
            .filter(|&call| tree.kind(call) == K::Call)
            .and_then(|call| tree.child(call, Role::Callee))
            .is_some_and(|callee| tree.kind(callee) == K::Super)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parse, transpile, transpile_with};

    #[test]
    fn test_parameter_forms() {
        let out = transpile("function f(a: number, b?: string, c = 1, ...rest: number[]): void {}\n");
        assert_eq!(out, "function f(a:Float, ?b:String, c = 1, ...rest:Float):Void {}\n");
    }

    #[test]
    fn test_rest_parameter_with_generic_array() {
        let out = transpile("function f(...xs: Array<string>) {}\n");
        assert_eq!(out, "function f(...xs:String) {}\n");
    }

    #[test]
    fn test_arrow_forms() {
        let out = transpile(
            "const a = (x: number) => x * 2;\nconst b = (x: number): number => x * 2;\n\
             const c = (x) => { return x; };\nconst d = (x = 1) => x;\n",
        );
        assert_eq!(
            out,
            "final a = (x:Float) -> x * 2;\nfinal b = function(x:Float):Float return x * 2;\n\
             final c = function(x) { return x; };\nfinal d = function(x = 1) return x;\n"
        );
    }

    #[test]
    fn test_receiver_parameter_replaces_this() {
        let out = transpile("function f(this: Foo, a: number) {\n  return this.x + a;\n}\n");
        assert_eq!(out, "function f(self:Foo, a:Float) {\n  return self.x + a;\n}\n");
    }

    #[test]
    fn test_generator_expression_is_unsupported() {
        let output =
            transpile_with("const g = function* () { yield 1; };\n", |o| o).expect("transform");
        assert_eq!(output.body, "final g = /* function* () { yield 1; } */;\n");
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedSyntax), 1);
    }

    #[test]
    fn test_prologue_goes_into_an_empty_block() {
        assert_eq!(
            transpile("function f({ a }: A) {}\n"),
            "function f(param:A) { var a = param.a; }\n"
        );
    }

    #[test]
    fn test_primitive_defaults() {
        let (program, unit) = parse("f(1, -2, `x`, a, g(), [], `${a}`);\n");
        let tree = program.tree(unit).expect("tree");
        let call = tree.ids().find(|&id| tree.kind(id) == K::Call).expect("call");
        let exempt: Vec<bool> = tree
            .children_with(call, Role::Argument)
            .map(|arg| is_primitive_default(tree, arg))
            .collect();
        assert_eq!(exempt, vec![true, true, true, true, false, false, false]);
    }

    #[test]
    fn test_signature_render() {
        let signature = Signature {
            type_params: "<T>".into(),
            params: "a:T".into(),
            ret: Some("Void".into()),
        };
        assert_eq!(signature.render(), "<T>(a:T):Void");
    }
}
