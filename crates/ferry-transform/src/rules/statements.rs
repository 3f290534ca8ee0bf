//! Control flow statements.

use super::{always, append_to_block, binding_name, descendants, Rewrite, Rule};
use crate::async_return::wrap_value;
use crate::coercion::coerce;
use crate::context::RewriteContext;
use crate::destructure;
use crate::engine::{RewriteResult, Transformer};
use crate::rename::BindingKey;
use crate::state::AsyncReturn;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{
    AssignOp, BinaryOp, NodeData, NodeFlags, Role, SyntaxKind as K, SyntaxTree, UpdateOp,
    VarKind,
};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new("if-condition", &[K::If], always, condition),
    Rule::new("loop-condition", &[K::While, K::DoWhile], always, condition),
    Rule::new("counting-for", &[K::For], is_counting_loop, counting_for),
    Rule::new("for-with-continue", &[K::For], continues, for_with_continue),
    Rule::new("for-loop", &[K::For], always, for_loop),
    Rule::new("for-await", &[K::ForOf], is_await, for_await),
    Rule::new("for-of", &[K::ForOf], always, for_of),
    Rule::new("for-in", &[K::ForIn], always, for_in),
    Rule::new("switch", &[K::Switch], always, switch),
    Rule::new("try-finally", &[K::Try], has_finalizer, try_finally),
    Rule::new("catch-clause", &[K::Catch], always, catch_clause),
    Rule::new("async-return", &[K::Return], has_async_plan, async_return),
    Rule::new("labeled-statement", &[K::Labeled], always, labeled_statement),
    Rule::new("labeled-jump", &[K::Break, K::Continue], has_label, labeled_jump),
    Rule::new("debugger-statement", &[K::Debugger], always, debugger_statement),
    Rule::new("with-statement", &[K::With], always, with_statement),
];

fn condition(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let test = t.required(node, Role::Test)?;
    let text = coerce(t, test, ctx.nested(), false)?;
    Ok(Rewrite::ReplaceChild(test, text))
}

/// `for (let i = a; i < b; i++)` whose body leaves `i` alone.
struct CountingLoop<'a> {
    index: &'a str,
    start: NodeId,
    end: NodeId,
    inclusive: bool,
}

fn counting_loop(tree: &SyntaxTree, node: NodeId) -> Option<CountingLoop<'_>> {
    let init = tree.child(node, Role::Init)?;
    if tree.kind(init) != K::VarStmt {
        return None;
    }
    let mut declarators = tree.children_with(init, Role::Declarator);
    let declarator = declarators.next()?;
    if declarators.next().is_some() {
        return None;
    }
    let binding = tree.child(declarator, Role::Name)?;
    if tree.kind(binding) != K::BindingIdent {
        return None;
    }
    let index = tree.name(binding)?;
    let start = tree.child(declarator, Role::Init)?;

    let test = tree.child(node, Role::Test)?;
    let inclusive = match tree.data(test) {
        NodeData::Binary(BinaryOp::Lt) => false,
        NodeData::Binary(BinaryOp::LtEq) => true,
        _ => return None,
    };
    let names_index = |id: Option<NodeId>| {
        id.is_some_and(|id| tree.kind(id) == K::Ident && tree.name(id) == Some(index))
    };
    if !names_index(tree.child(test, Role::Left)) {
        return None;
    }
    let end = tree.child(test, Role::Right)?;

    let update = tree.child(node, Role::Update)?;
    let steps_by_one = match tree.data(update) {
        NodeData::Update {
            op: UpdateOp::Increment,
            ..
        } => names_index(tree.child(update, Role::Operand)),
        NodeData::Assign(AssignOp::Add) => {
            names_index(tree.child(update, Role::Left))
                && tree
                    .child(update, Role::Right)
                    .is_some_and(|r| matches!(tree.data(r), NodeData::Num(v) if *v == 1.0))
        }
        _ => false,
    };
    if !steps_by_one {
        return None;
    }

    // The range bound is evaluated once, the test on every iteration.
    let body = tree.child(node, Role::Body)?;
    let written: Vec<&str> = descendants(tree, body, |_| true)
        .into_iter()
        .filter_map(|id| match tree.kind(id) {
            K::Assign => tree.child(id, Role::Left),
            K::Update => tree.child(id, Role::Operand),
            _ => None,
        })
        .filter(|&target| tree.kind(target) == K::Ident)
        .filter_map(|target| tree.name(target))
        .collect();
    let fixed_end = match tree.kind(end) {
        K::Number => true,
        K::Ident => tree.name(end).is_some_and(|name| !written.contains(&name)),
        _ => false,
    };
    (fixed_end && !written.contains(&index)).then_some(CountingLoop {
        index,
        start,
        end,
        inclusive,
    })
}

fn is_counting_loop(t: &Transformer<'_>, node: NodeId) -> bool {
    counting_loop(t.tree(), node).is_some()
}

/// `for (i in a...b)`.
fn counting_for(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let ctx = ctx.nested();
    let Some(lp) = counting_loop(t.tree(), node) else {
        return Err(t.invariant(node, "not a counting loop"));
    };
    let start = t.visit(lp.start, ctx)?;
    let end = t.visit(lp.end, ctx)?;
    let end = if lp.inclusive { format!("{end} + 1") } else { end };
    let body = t.visit(t.required(node, Role::Body)?, ctx)?;
    Ok(Rewrite::Replace(format!(
        "for ({} in {start}...{end}) {body}",
        lp.index
    )))
}

/// `continue` statements that belong to `node` itself.
fn continues(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    let Some(body) = tree.child(node, Role::Body) else {
        return false;
    };
    let enter = |kind: K| !kind.is_loop() && !kind.is_function_like();
    tree.kind(body) == K::Continue
        || descendants(tree, body, enter)
            .into_iter()
            .any(|id| tree.kind(id) == K::Continue)
}

fn for_with_continue(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedControlFlow,
        "`continue` in a for loop that must become a while loop",
    )))
}

/// `{ init; while (test) { body update; } }`
fn for_loop(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let init = match tree.child(node, Role::Init) {
        Some(init) => format!("{}; ", t.visit(init, ctx)?),
        None => String::new(),
    };
    let test = match tree.child(node, Role::Test) {
        Some(test) => coerce(t, test, ctx, false)?,
        None => "true".to_string(),
    };
    let update = tree
        .child(node, Role::Update)
        .map(|update| t.visit(update, ctx))
        .transpose()?;
    let body = t.required(node, Role::Body)?;
    let mut body_text = t.visit(body, ctx)?;
    if let Some(update) = update {
        let statement = format!("{update};");
        body_text = if tree.kind(body) == K::Block {
            append_to_block(&body_text, &statement, tree.indent_unit())
        } else {
            format!("{{ {body_text} {statement} }}")
        };
    }
    let text = format!("while ({test}) {body_text}");
    Ok(Rewrite::Replace(if init.is_empty() {
        text
    } else {
        format!("{{ {init}{text} }}")
    }))
}

fn is_await(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().has_flag(node, NodeFlags::AWAIT)
}

fn for_await(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedControlFlow,
        "`for await` loop",
    )))
}

/// The loop variable of a `for..of`/`for..in` head. A pattern is replaced by a
/// synthesized element name whose bindings open the body.
fn loop_binding(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<(String, Vec<String>)> {
    let tree = t.tree();
    let left = t.required(node, Role::Left)?;
    let (pattern, keyword) = if tree.kind(left) == K::VarStmt {
        let declarator = t.required(left, Role::Declarator)?;
        let keyword = match tree.data(left) {
            NodeData::Var(VarKind::Const) => "final",
            _ => "var",
        };
        (t.required(declarator, Role::Name)?, keyword)
    } else {
        (left, "var")
    };
    if matches!(tree.kind(pattern), K::BindingIdent | K::Ident) {
        return Ok((binding_name(t, pattern)?.to_string(), Vec::new()));
    }
    let element = t.rename("element", BindingKey::Node(node));
    let statements = destructure::flatten(t, pattern, &element, ctx)?
        .iter()
        .map(|binding| format!("{};", binding.declare(keyword)))
        .collect();
    Ok((element, statements))
}

fn loop_body(
    t: &mut Transformer<'_>,
    node: NodeId,
    prologue: Vec<String>,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let body = t.required(node, Role::Body)?;
    if prologue.is_empty() {
        return t.visit(body, ctx);
    }
    if tree.kind(body) == K::Block {
        t.state.add_prologue(body, prologue);
        return t.visit(body, ctx);
    }
    let text = t.visit(body, ctx)?;
    Ok(format!("{{ {} {text} }}", prologue.join(" ")))
}

fn for_of(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let ctx = ctx.nested();
    let (name, prologue) = loop_binding(t, node, ctx)?;
    let iterable = t.visit(t.required(node, Role::Right)?, ctx)?;
    let body = loop_body(t, node, prologue, ctx)?;
    Ok(Rewrite::Replace(format!("for ({name} in {iterable}) {body}")))
}

fn for_in(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let ctx = ctx.nested();
    let (name, prologue) = loop_binding(t, node, ctx)?;
    let object = t.visit(t.required(node, Role::Right)?, ctx)?;
    let body = loop_body(t, node, prologue, ctx)?;
    Ok(Rewrite::Replace(format!(
        "for ({name} in Reflect.fields({object})) {body}"
    )))
}

fn ends_abruptly(tree: &SyntaxTree, statement: NodeId) -> bool {
    match tree.kind(statement) {
        K::Break | K::Continue | K::Return | K::Throw => true,
        K::Block => tree
            .children_with(statement, Role::Item)
            .last()
            .is_some_and(|last| ends_abruptly(tree, last)),
        _ => false,
    }
}

fn is_plain_break(tree: &SyntaxTree, statement: NodeId) -> bool {
    tree.kind(statement) == K::Break && tree.child(statement, Role::Label).is_none()
}

/// A `break` of this switch anywhere but as a case's last statement.
fn has_inner_break(tree: &SyntaxTree, items: &[NodeId]) -> bool {
    let enter = |kind: K| !kind.is_loop() && !kind.is_function_like() && kind != K::Switch;
    let checked = match items.split_last() {
        Some((&last, rest)) if is_plain_break(tree, last) => rest,
        _ => items,
    };
    checked.iter().any(|&item| {
        is_plain_break(tree, item)
            || (enter(tree.kind(item))
                && descendants(tree, item, enter)
                    .into_iter()
                    .any(|id| is_plain_break(tree, id)))
    })
}

/// Haxe cases never fall through: empty cases join the next one as
/// `case a, b:` and trailing `break`s are dropped.
fn switch(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let cases: Vec<NodeId> = tree.children_with(node, Role::Case).collect();
    for (index, &case) in cases.iter().enumerate() {
        let items: Vec<NodeId> = tree.children_with(case, Role::Item).collect();
        let Some(&last) = items.last() else {
            continue;
        };
        if index + 1 < cases.len() && !ends_abruptly(tree, last) {
            return Ok(Rewrite::Replace(t.degrade(
                node,
                DiagnosticCode::UnsupportedControlFlow,
                "fallthrough between switch cases",
            )));
        }
        if has_inner_break(tree, &items) {
            return Ok(Rewrite::Replace(t.degrade(
                node,
                DiagnosticCode::UnsupportedControlFlow,
                "`break` before the end of a switch case",
            )));
        }
    }

    let discriminant = t.visit(t.required(node, Role::Discriminant)?, ctx)?;
    let mut out = format!("switch ({discriminant}) {{");
    let mut labels: Vec<String> = Vec::new();
    let mut is_default = false;
    for (index, &case) in cases.iter().enumerate() {
        match tree.child(case, Role::Test) {
            Some(test) => labels.push(t.visit(test, ctx)?),
            None => is_default = true,
        }
        let mut items: Vec<NodeId> = tree.children_with(case, Role::Item).collect();
        if items.is_empty() && index + 1 < cases.len() {
            continue;
        }
        if items.last().is_some_and(|&last| is_plain_break(tree, last)) {
            items.pop();
        }
        let label = if is_default {
            "default:".to_string()
        } else {
            format!("case {}:", labels.join(", "))
        };
        out.push_str(&format!("\n{}{label}", t.indent(case)));
        let (case_line, _) = tree.location(case);
        for item in items {
            let text = t.visit(item, ctx)?;
            if tree.location(item).0 == case_line {
                out.push_str(&format!(" {text}"));
            } else {
                out.push_str(&format!("\n{}{text}", t.indent(item)));
            }
        }
        labels.clear();
        is_default = false;
    }
    out.push_str(&format!("\n{}}}", t.indent(node)));
    Ok(Rewrite::Replace(out))
}

fn has_finalizer(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().child(node, Role::Finalizer).is_some()
}

fn try_finally(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedControlFlow,
        "`finally` block",
    )))
}

/// `catch (e:Dynamic)`; a missing or destructured binding gets a synthesized name.
fn catch_clause(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let body = t.required(node, Role::Body)?;
    let name = match tree.child(node, Role::Param) {
        Some(binding) if tree.kind(binding) == K::BindingIdent => {
            binding_name(t, binding)?.to_string()
        }
        Some(pattern) => {
            let name = t.rename("error", BindingKey::Node(node));
            let statements: Vec<String> = destructure::flatten(t, pattern, &name, ctx)?
                .iter()
                .map(|binding| format!("{};", binding.declare("var")))
                .collect();
            t.state.add_prologue(body, statements);
            name
        }
        None => t.rename("error", BindingKey::Node(node)),
    };
    let body = t.visit(body, ctx)?;
    Ok(Rewrite::Replace(format!("catch ({name}:Dynamic) {body}")))
}

fn has_async_plan(t: &Transformer<'_>, node: NodeId) -> bool {
    t.state.async_returns.contains_key(&node)
}

fn async_return(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let plan = t.state.async_returns.remove(&node);
    match (plan, tree.child(node, Role::Argument)) {
        (Some(AsyncReturn::Wrap), Some(value)) => {
            let text = t.visit(value, ctx)?;
            Ok(Rewrite::ReplaceChild(value, wrap_value(t, &text)))
        }
        (Some(AsyncReturn::Wrap), None) => {
            let value = wrap_value(t, "");
            Ok(Rewrite::Replace(format!(
                "return {value}{}",
                t.statement_end(node)
            )))
        }
        (Some(AsyncReturn::Unwrap(call)), Some(value)) => {
            let text = t.visit(call, ctx)?;
            Ok(Rewrite::ReplaceChild(value, text))
        }
        _ => Err(t.invariant(node, "async return plan does not fit the statement")),
    }
}

fn labeled_statement(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedControlFlow,
        "labeled statement",
    )))
}

fn has_label(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().child(node, Role::Label).is_some()
}

fn labeled_jump(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedControlFlow,
        "jump to a label",
    )))
}

fn debugger_statement(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "`debugger` statement",
    )))
}

fn with_statement(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "`with` statement",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{transpile, transpile_with};

    #[test]
    fn test_counting_loop_becomes_range() {
        let out = transpile("for (let i = 0; i < n; i++) {\n  go(i);\n}\nfor (let j = 1; j <= 3; j += 1) go(j);\n");
        assert_eq!(
            out,
            "for (i in 0...n) {\n  go(i);\n}\nfor (j in 1...3 + 1) go(j);\n"
        );
    }

    #[test]
    fn test_general_for_becomes_while() {
        let out = transpile("for (let i = 0; i < n; i += 2) {\n  go(i);\n}\n");
        assert_eq!(
            out,
            "{ var i = 0; while (i < n) {\n  go(i);\n  i += 2;\n} }\n"
        );
    }

    #[test]
    fn test_loop_writing_its_index_is_not_a_range() {
        let out = transpile("for (let i = 0; i < n; i++) {\n  i++;\n}\n");
        assert_eq!(out, "{ var i = 0; while (i < n) {\n  i++;\n  i++;\n} }\n");
    }

    #[test]
    fn test_loop_with_a_changing_bound_is_not_a_range() {
        let out = transpile("for (let i = 0; i < n; i++) {\n  n--;\n}\n");
        assert_eq!(out, "{ var i = 0; while (i < n) {\n  n--;\n  i++;\n} }\n");
        let out = transpile("for (let i = 0; i < xs.length; i++) {\n  xs.push(i);\n}\n");
        assert!(out.starts_with("{ var i = 0; while (i < xs.length) {"), "{out}");
        assert!(!out.contains("..."), "{out}");
    }

    #[test]
    fn test_continue_in_lowered_for_is_unsupported() {
        let output = transpile_with("for (;;) { if (a) continue; }\n", |o| o).expect("transform");
        assert_eq!(output.body, "/* for (;;) { if (a) continue; } */\n");
        assert_eq!(
            output.diagnostics.count_of(DiagnosticCode::UnsupportedControlFlow),
            1
        );
    }

    #[test]
    fn test_for_of_and_for_in() {
        let out = transpile(
            "for (const x of xs) {\n  go(x);\n}\nfor (const k in o) {\n  go(k);\n}\n",
        );
        assert_eq!(
            out,
            "for (x in xs) {\n  go(x);\n}\nfor (k in Reflect.fields(o)) {\n  go(k);\n}\n"
        );
    }

    #[test]
    fn test_destructured_loop_variable_gets_an_element_name() {
        let out = transpile("for (const [k, v] of pairs) {\n  go(k, v);\n}\n");
        assert_eq!(
            out,
            "for (element in pairs) {\n  final k = element[0];\n  final v = element[1];\n  go(k, v);\n}\n"
        );
    }

    #[test]
    fn test_switch_groups_cases_and_drops_breaks() {
        let source = "switch (x) {\n  case 1:\n  case 2:\n    go();\n    break;\n  default:\n    stop();\n}\n";
        assert_eq!(
            transpile(source),
            "switch (x) {\n  case 1, 2:\n    go();\n  default:\n    stop();\n}\n"
        );
    }

    #[test]
    fn test_switch_fallthrough_is_unsupported() {
        let output = transpile_with(
            "switch (x) {\n  case 1:\n    go();\n  case 2:\n    stop();\n}\n",
            |o| o,
        )
        .expect("transform");
        assert_eq!(
            output.diagnostics.count_of(DiagnosticCode::UnsupportedControlFlow),
            1
        );
        assert!(output.body.starts_with("/* switch (x)"));
    }

    #[test]
    fn test_catch_binding() {
        let out = transpile("try {\n  go();\n} catch (e) {\n  log(e);\n}\ntry { go(); } catch { }\n");
        assert_eq!(
            out,
            "try {\n  go();\n} catch (e:Dynamic) {\n  log(e);\n}\ntry { go(); } catch (error:Dynamic) { }\n"
        );
    }

    #[test]
    fn test_finally_is_unsupported() {
        let output = transpile_with("try { a(); } finally { b(); }\n", |o| o).expect("transform");
        assert_eq!(output.body, "/* try { a(); } finally { b(); } */\n");
    }
}
