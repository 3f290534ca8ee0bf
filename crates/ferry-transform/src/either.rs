//! Folding of unions and tuples into nested two-arm `EitherType`s.
//!
//! Members are rendered first and deduplicated by their Haxe text, so literal
//! members of one category (`1 | 2 | 3`) collapse before the arity check.

use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use crate::state::Helper;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{KeywordType, NodeData, Role, SyntaxKind, SyntaxTree};
use ferry_types::NodeId;

const DYNAMIC: &str = "Dynamic";

/// `A | B | null` as `Null<EitherType<A, B>>`.
pub(crate) fn fold_union(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let (members, nullable) = member_texts(t, node, ctx)?;
    let folded = fold(t, node, members);
    Ok(if nullable && !folded.starts_with(DYNAMIC) {
        format!("Null<{folded}>")
    } else {
        folded
    })
}

/// `[A, B]` as `Array<EitherType<A, B>>`.
pub(crate) fn fold_tuple(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let (members, _) = member_texts(t, node, ctx)?;
    Ok(format!("Array<{}>", fold(t, node, members)))
}

/// Right-nested wrapper over at least two members.
pub(crate) fn nest(members: &[String]) -> String {
    match members {
        [] => DYNAMIC.to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("EitherType<{first}, {}>", nest(rest)),
    }
}

fn member_texts(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<(Vec<String>, bool)> {
    let tree = t.tree();
    let mut nullable = false;
    let mut members: Vec<String> = Vec::new();
    for member in tree.children_with(node, Role::Element) {
        if is_absent_type(tree, member) {
            nullable = true;
            continue;
        }
        let text = t.visit(member, ctx)?;
        if !members.contains(&text) {
            members.push(text);
        }
    }
    Ok((members, nullable))
}

fn is_absent_type(tree: &SyntaxTree, ty: NodeId) -> bool {
    tree.kind(ty) == SyntaxKind::KeywordType
        && matches!(
            tree.data(ty),
            NodeData::Keyword(KeywordType::Null | KeywordType::Undefined)
        )
}

fn fold(t: &mut Transformer<'_>, node: NodeId, members: Vec<String>) -> String {
    let limit = t.options().either_arity_limit;
    match members.len() {
        0 => DYNAMIC.to_string(),
        1 => members.into_iter().next().unwrap_or_default(),
        n if n > limit => {
            t.report(
                node,
                DiagnosticCode::WideUnion,
                format!("{n} distinct member types exceed the either arity limit of {limit}"),
            );
            DYNAMIC.to_string()
        }
        _ => {
            t.use_helper(Helper::EitherType);
            nest(&members)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TransformOptions;
    use crate::test_support::{transpile, transpile_with};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nest_is_right_associative() {
        assert_eq!(nest(&names(&["A", "B"])), "EitherType<A, B>");
        assert_eq!(
            nest(&names(&["A", "B", "C"])),
            "EitherType<A, EitherType<B, C>>"
        );
        assert_eq!(nest(&names(&["A"])), "A");
    }

    #[test]
    fn test_union_at_the_limit_folds() {
        let output = transpile_with("let v: string | number | boolean;\n", |o| TransformOptions {
            either_arity_limit: 3,
            ..o
        })
        .expect("transform");
        assert_eq!(
            output.body,
            "var v:EitherType<String, EitherType<Float, Bool>>;\n"
        );
        assert!(output.header.contains("import haxe.extern.EitherType;"));
    }

    #[test]
    fn test_union_over_the_limit_degrades() {
        let output = transpile_with("let v: string | number | boolean;\n", |o| TransformOptions {
            either_arity_limit: 2,
            ..o
        })
        .expect("transform");
        assert_eq!(output.body, "var v:Dynamic;\n");
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::WideUnion), 1);
        assert!(!output.header.contains("EitherType"));
    }

    #[test]
    fn test_literal_members_dedup_before_the_limit() {
        let output = transpile_with("let v: 1 | 2 | 3 | \"a\";\n", |o| TransformOptions {
            either_arity_limit: 2,
            ..o
        })
        .expect("transform");
        assert_eq!(output.body, "var v:EitherType<Float, String>;\n");
    }

    #[test]
    fn test_single_member_after_dedup_has_no_wrapper() {
        assert_eq!(transpile("let v: 1 | 2 | 3;\n"), "var v:Float;\n");
    }

    #[test]
    fn test_null_members_make_the_result_nullable() {
        assert_eq!(
            transpile("let v: string | undefined | number;\n"),
            "var v:Null<EitherType<String, Float>>;\n"
        );
    }

    #[test]
    fn test_tuple_wraps_in_array() {
        assert_eq!(
            transpile("let p: [string, number];\nlet q: [];\n"),
            "var p:Array<EitherType<String, Float>>;\nvar q:Array<Dynamic>;\n"
        );
    }
}
