//! Explicit truthiness for conditions and logical operands.

use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use ferry_syntax::{BinaryOp, NodeData, Role, SyntaxKind as K, UnaryOp};
use ferry_types::{NodeId, TypeFlags};

/// Rewrite `node` so it yields a `Bool`.
///
/// `nested` is set for operands of `&&`, `||` and `!`, where a synthesized
/// comparison needs parentheses to keep its precedence.
pub(crate) fn coerce(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
    nested: bool,
) -> RewriteResult<String> {
    if let Some(constant) = constant_truthiness(t, node) {
        return Ok(constant.to_string());
    }
    let tree = t.tree();
    match (tree.kind(node), tree.data(node)) {
        (K::Bool, _) => return t.visit(node, ctx),
        (K::Paren, _) => {
            let inner = t.required(node, Role::Expression)?;
            let text = coerce(t, inner, ctx, false)?;
            return Ok(format!("({text})"));
        }
        (K::Binary, NodeData::Binary(op)) if op.is_logical() => {
            return coerce_operands(t, node, ctx);
        }
        (K::Unary, NodeData::Unary(UnaryOp::Not)) => return coerce_operands(t, node, ctx),
        _ => {}
    }

    let text = t.visit(node, ctx)?;
    let ty = t.type_of(node);
    let nullable = ty.flags.contains(TypeFlags::NULLABLE);
    if ty.is_boolean() && !nullable {
        return Ok(text);
    }
    let text = if binds_looser_than_comparison(t, node) {
        format!("({text})")
    } else {
        text
    };
    let comparison = if ty.is_boolean() {
        format!("{text} == true")
    } else if ty.is_number() {
        format!("{text} != 0")
    } else if ty.is_string() {
        format!("{text} != \"\"")
    } else {
        format!("{text} != null")
    };
    Ok(if nested {
        format!("({comparison})")
    } else {
        comparison
    })
}

/// Appending `!= x` to these would capture only their last operand.
fn binds_looser_than_comparison(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    match (tree.kind(node), tree.data(node)) {
        (K::Assign | K::Cond, _) => true,
        (K::Binary, NodeData::Binary(op)) => {
            op.is_comparison() || op.is_logical() || *op == BinaryOp::NullishCoalescing
        }
        _ => false,
    }
}

/// Rebuild a logical operator with every operand coerced.
pub(crate) fn coerce_operands(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let roles: &[Role] = match tree.kind(node) {
        K::Unary => &[Role::Operand],
        _ => &[Role::Left, Role::Right],
    };
    let mut overrides = Vec::with_capacity(roles.len());
    for &role in roles {
        let operand = t.required(node, role)?;
        overrides.push((operand, coerce(t, operand, ctx, true)?));
    }
    t.reassemble_with(node, ctx, &overrides)
}

/// Literals, fresh objects and the library sentinels have a fixed truthiness.
fn constant_truthiness(t: &Transformer<'_>, node: NodeId) -> Option<bool> {
    let tree = t.tree();
    match (tree.kind(node), tree.data(node)) {
        (K::Null, _) => Some(false),
        (K::Number, NodeData::Num(value)) => Some(*value != 0.0 && !value.is_nan()),
        (K::String, NodeData::Str(value)) => Some(!value.is_empty()),
        (K::Template, _) if tree.child(node, Role::Expression).is_none() => Some(
            tree.children_with(node, Role::Quasi)
                .any(|q| !matches!(tree.data(q), NodeData::Str(raw) if raw.is_empty())),
        ),
        (K::ArrayLit | K::ObjectLit | K::FnExpr | K::Arrow | K::ClassExpr | K::Regex, _) => {
            Some(true)
        }
        (K::Ident, _) => match t.library_name(node).as_deref() {
            Some("undefined" | "NaN") => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::transpile;

    fn condition(setup: &str, test: &str) -> String {
        let out = transpile(&format!("{setup}if ({test}) {{}}\n"));
        let line = out.lines().last().unwrap_or_default().to_string();
        line.strip_prefix("if (")
            .and_then(|rest| rest.strip_suffix(") {}"))
            .unwrap_or(&line)
            .to_string()
    }

    #[test]
    fn test_literals_have_fixed_truthiness() {
        assert_eq!(condition("", "\"\""), "false");
        assert_eq!(condition("", "\"a\""), "true");
        assert_eq!(condition("", "0"), "false");
        assert_eq!(condition("", "1"), "true");
        assert_eq!(condition("", "null"), "false");
        assert_eq!(condition("", "undefined"), "false");
        assert_eq!(condition("", "NaN"), "false");
        assert_eq!(condition("", "[]"), "true");
        assert_eq!(condition("", "{}"), "true");
        assert_eq!(condition("", "``"), "false");
        assert_eq!(condition("", "true"), "true");
    }

    #[test]
    fn test_variables_compare_by_type() {
        assert_eq!(condition("let n = 1;\n", "n"), "n != 0");
        assert_eq!(condition("let s = \"a\";\n", "s"), "s != \"\"");
        assert_eq!(condition("let o: Date | null = null;\n", "o"), "o != null");
        assert_eq!(condition("let b = false;\n", "b"), "b");
    }

    #[test]
    fn test_redundant_parentheses_are_kept_around_the_same_result() {
        assert_eq!(condition("let n = 1;\n", "(n)"), "(n != 0)");
        assert_eq!(condition("", "(0)"), "(false)");
    }

    #[test]
    fn test_logical_operands_are_coerced_and_parenthesized() {
        assert_eq!(
            condition("let n = 1;\nlet s = \"\";\n", "n && !s"),
            "(n != 0) && !(s != \"\")"
        );
        assert_eq!(
            condition("let b = true;\nlet n = 1;\n", "b || n > 2"),
            "b || n > 2"
        );
    }

    #[test]
    fn test_nullable_boolean_compares_to_true() {
        assert_eq!(condition("let b: boolean | undefined;\n", "b"), "b == true");
        assert_eq!(
            condition("let b: boolean | undefined;\nlet n = 1;\n", "b && n"),
            "(b == true) && (n != 0)"
        );
    }

    #[test]
    fn test_low_precedence_operands_are_wrapped_before_comparing() {
        assert_eq!(
            condition("let a: number | undefined;\nlet b = 1;\n", "a ?? b"),
            "(a ?? b) != 0"
        );
        assert_eq!(condition("let x = 1;\nlet y = 2;\n", "x = y"), "(x = y) != 0");
        assert_eq!(
            condition("let x = 1;\nlet y = 2;\n", "x ? y : x"),
            "(x != 0 ? y : x) != 0"
        );
        assert_eq!(
            condition("let n = 1;\n", "(n + 1)"),
            "(n + 1 != 0)"
        );
    }

    #[test]
    fn test_parenthesized_assignment_in_loop_condition() {
        let out = transpile(
            "function next(): Date | null { return null; }\nlet m: Date | null = null;\nwhile ((m = next())) {}\n",
        );
        assert!(out.ends_with("while (((m = next()) != null)) {}\n"), "{out}");
    }

    #[test]
    fn test_conditional_expression_test() {
        let out = transpile("let n = 1;\nconst x = n ? 1 : 2;\n");
        assert_eq!(out, "var n = 1;\nfinal x = n != 0 ? 1 : 2;\n");
    }

    #[test]
    fn test_loop_conditions() {
        let out = transpile("let n = 3;\nwhile (n) { n--; }\ndo { n++; } while (n);\n");
        assert_eq!(
            out,
            "var n = 3;\nwhile (n != 0) { n--; }\ndo { n++; } while (n != 0);\n"
        );
    }
}
