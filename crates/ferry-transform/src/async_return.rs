//! Returns of async functions become eagerly resolved promises.
//!
//! The plan is made when the function is entered: every `return` of the
//! function's own body is classified up front and the return rule consumes the
//! entry when it reaches the statement. Nested functions and classes are not
//! entered; they plan their own returns.

use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use crate::rules::descendants;
use crate::state::{AsyncReturn, Helper};
use ferry_syntax::{NodeFlags, Role, SyntaxKind as K};
use ferry_types::NodeId;

/// Classify the returns of `func` if it is async.
pub(crate) fn plan(t: &mut Transformer<'_>, func: NodeId) {
    let tree = t.tree();
    if !tree.has_flag(func, NodeFlags::ASYNC) {
        return;
    }
    let Some(body) = tree.child(func, Role::Body).filter(|&b| tree.kind(b) == K::Block) else {
        return;
    };
    let opaque = |kind: K| kind.is_function_like() || matches!(kind, K::ClassDecl | K::ClassExpr);
    let returns: Vec<NodeId> = descendants(tree, body, |kind| !opaque(kind))
        .into_iter()
        .filter(|&node| tree.kind(node) == K::Return)
        .collect();
    log::trace!("async {func}: {} return(s)", returns.len());
    for ret in returns {
        let plan = match tree.child(ret, Role::Argument) {
            Some(value) => classify(t, value),
            None => Some(AsyncReturn::Wrap),
        };
        if let Some(plan) = plan {
            t.state.async_returns.insert(ret, plan);
        }
    }
}

/// How a returned value is rewritten; `None` when it already is a promise.
pub(crate) fn classify(t: &Transformer<'_>, value: NodeId) -> Option<AsyncReturn> {
    let tree = t.tree();
    if tree.kind(value) == K::Await {
        if let Some(operand) = tree.child(value, Role::Operand) {
            if tree.kind(operand) == K::Call && t.type_of(operand).is_named("Promise") {
                return Some(AsyncReturn::Unwrap(operand));
            }
        }
    }
    if is_promise_factory(t, value) || t.type_of(value).is_named("Promise") {
        return None;
    }
    Some(AsyncReturn::Wrap)
}

/// Body of an expression-bodied async arrow, rewritten like a return value.
pub(crate) fn wrap_expression(
    t: &mut Transformer<'_>,
    expr: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    match classify(t, expr) {
        Some(AsyncReturn::Wrap) => {
            let text = t.visit(expr, ctx)?;
            Ok(wrap_value(t, &text))
        }
        Some(AsyncReturn::Unwrap(call)) => t.visit(call, ctx),
        None => t.visit(expr, ctx),
    }
}

pub(crate) fn wrap_value(t: &mut Transformer<'_>, text: &str) -> String {
    t.use_helper(Helper::Promise);
    format!("Promise.resolve({text})")
}

/// `Promise.resolve(..)` or `Promise.reject(..)` on the library class.
fn is_promise_factory(t: &Transformer<'_>, value: NodeId) -> bool {
    let tree = t.tree();
    if tree.kind(value) != K::Call {
        return false;
    }
    tree.child(value, Role::Callee)
        .and_then(|callee| t.library_member(callee))
        .is_some_and(|(global, member)| {
            global == "Promise" && matches!(member, "resolve" | "reject")
        })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{transpile, transpile_with};

    #[test]
    fn test_plain_values_are_wrapped_and_promises_kept() {
        let source = "async function g(x: boolean) {\n  if (x) return 1;\n  return f();\n}\n\
                      function f(): Promise<number> {\n  return Promise.resolve(2);\n}\n";
        let output = transpile_with(source, |o| o).expect("transform");
        assert_eq!(
            output.body,
            "function g(x:Bool) {\n  if (x) return Promise.resolve(1);\n  return f();\n}\n\
             function f():Promise<Float> {\n  return Promise.resolve(2);\n}\n"
        );
        assert!(output.header.contains("import js.lib.Promise;"));
    }

    #[test]
    fn test_awaited_promise_call_is_unwrapped() {
        let source = "function f(): Promise<number> {\n  return Promise.resolve(2);\n}\n\
                      async function g() {\n  return await f();\n}\n";
        let out = transpile(source);
        assert!(out.ends_with("function g() {\n  return f();\n}\n"), "{out}");
    }

    #[test]
    fn test_bare_return_resolves_nothing() {
        let out = transpile("async function g() {\n  return;\n}\n");
        assert_eq!(out, "function g() {\n  return Promise.resolve();\n}\n");
    }

    #[test]
    fn test_nested_functions_are_not_rewritten() {
        let source = "async function g() {\n  const k = function () { return 3; };\n  return 4;\n}\n";
        let out = transpile(source);
        assert_eq!(
            out,
            "function g() {\n  final k = function() { return 3; };\n  return Promise.resolve(4);\n}\n"
        );
    }

    #[test]
    fn test_expression_bodied_arrow() {
        let out = transpile("const g = async (n: number) => n + 1;\n");
        assert_eq!(out, "final g = (n:Float) -> Promise.resolve(n + 1);\n");
    }
}
