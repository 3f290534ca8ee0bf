//! Literal spellings and object literal members.

use super::decls::format_number;
use super::functions::function_text;
use super::{always, Rewrite, Rule};
use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{NodeData, Role, SyntaxKind as K};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new("single-quoted-string", &[K::String], is_single_quoted, single_quoted_string),
    Rule::new("numeric-literal", &[K::Number], needs_respelling, numeric_literal),
    Rule::new("regex-literal", &[K::Regex], always, regex_literal),
    Rule::new("template-literal", &[K::Template], always, template_literal),
    Rule::new("shorthand-property", &[K::ShorthandProp], always, shorthand_property),
    Rule::new("method-property", &[K::MethodProp], always, method_property),
    Rule::new("accessor-property", &[K::GetterProp, K::SetterProp], always, accessor_property),
    Rule::new("computed-property-key", &[K::KeyValueProp], has_non_field_key, computed_key),
    Rule::new("array-hole", &[K::ArrayLit], has_hole, array_hole),
];

fn is_single_quoted(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().text(node).starts_with('\'')
}

/// Single quotes interpolate in Haxe.
fn single_quoted_string(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let NodeData::Str(value) = t.tree().data(node) else {
        return Err(t.invariant(node, "string literal without a value"));
    };
    Ok(Rewrite::Replace(double_quoted(value)))
}

pub(crate) fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:04X}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn needs_respelling(t: &Transformer<'_>, node: NodeId) -> bool {
    let text = t.tree().text(node);
    text.contains('_') || has_radix_prefix(text)
}

fn has_radix_prefix(text: &str) -> bool {
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    matches!(lower.as_deref(), Some("0b" | "0o"))
}

/// Separators and binary/octal prefixes have no Haxe spelling.
fn numeric_literal(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let text = tree.text(node);
    if has_radix_prefix(text) {
        let NodeData::Num(value) = tree.data(node) else {
            return Err(t.invariant(node, "number literal without a value"));
        };
        return Ok(Rewrite::Replace(format_number(*value)));
    }
    Ok(Rewrite::Replace(text.replace('_', "")))
}

const REGEX_FLAGS: &str = "gimsu";

fn regex_literal(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let NodeData::Regex { pattern, flags } = t.tree().data(node) else {
        return Err(t.invariant(node, "regex literal without a pattern"));
    };
    if let Some(flag) = flags.chars().find(|f| !REGEX_FLAGS.contains(*f)) {
        return Ok(Rewrite::Replace(t.degrade(
            node,
            DiagnosticCode::UnsupportedSyntax,
            &format!("regular expression flag `{flag}`"),
        )));
    }
    Ok(Rewrite::Replace(format!("~/{pattern}/{flags}")))
}

/// Raw template text as the body of a Haxe single-quoted string.
fn template_chunk(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('`') => {
                    out.push('`');
                    chars.next();
                }
                Some('$') => {
                    out.push_str("$$");
                    chars.next();
                }
                Some(&next) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                None => out.push('\\'),
            },
            '$' => out.push_str("$$"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out
}

/// `` `a ${b}` `` becomes `'a ${b}'`.
fn template_literal(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let mut out = String::from("'");
    for &child in tree.children(node) {
        match (tree.kind(child), tree.data(child)) {
            (K::TemplateElement, NodeData::Str(raw)) => out.push_str(&template_chunk(raw)),
            (K::TemplateElement, _) => {}
            _ => {
                let expr = t.visit(child, ctx)?;
                out.push_str("${");
                out.push_str(&expr);
                out.push('}');
            }
        }
    }
    out.push('\'');
    Ok(Rewrite::Replace(out))
}

fn shorthand_property(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let name = super::binding_name(t, node)?;
    Ok(Rewrite::Replace(format!("{name}: {name}")))
}

fn method_property(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let key = t.required(node, Role::Key)?;
    let tree = t.tree();
    if matches!(tree.kind(key), K::ComputedKey | K::Number | K::BigInt) {
        return Ok(Rewrite::Replace(t.unsupported(
            node,
            DiagnosticCode::UnsupportedMember,
            "method with a computed key",
        )));
    }
    let key = t.visit(key, ctx.nested())?;
    let function = function_text(t, node, None, ctx)?;
    Ok(Rewrite::Replace(format!("{key}: {function}")))
}

fn accessor_property(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedMember,
        "accessor in an object literal",
    )))
}

fn has_non_field_key(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Key)
        .is_some_and(|key| matches!(tree.kind(key), K::ComputedKey | K::Number | K::BigInt))
}

fn computed_key(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedMember,
        "computed or numeric property key",
    )))
}

fn has_hole(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.children_with(node, Role::Element)
        .any(|element| tree.kind(element) == K::Hole)
}

fn array_hole(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "array literal with holes",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{transpile, transpile_with};

    #[test]
    fn test_string_quotes() {
        let out = transpile("const a = 'it\\'s \"$x\"';\nconst b = \"kept\";\n");
        assert_eq!(out, "final a = \"it's \\\"$x\\\"\";\nfinal b = \"kept\";\n");
    }

    #[test]
    fn test_double_quoted_escapes() {
        assert_eq!(double_quoted("a\nb\\c"), "\"a\\nb\\\\c\"");
        assert_eq!(double_quoted("\u{1}"), "\"\\u{0001}\"");
    }

    #[test]
    fn test_numbers() {
        let out = transpile("const a = 1_000_000;\nconst b = 0b101;\nconst c = 0o17;\nconst d = 0xff;\n");
        assert_eq!(
            out,
            "final a = 1000000;\nfinal b = 5;\nfinal c = 15;\nfinal d = 0xff;\n"
        );
    }

    #[test]
    fn test_template_literal() {
        let out = transpile("const n = 1;\nconst s = `it's ${n + 1} $ \\`x\\``;\n");
        assert_eq!(out, "final n = 1;\nfinal s = 'it\\'s ${n + 1} $$ `x`';\n");
    }

    #[test]
    fn test_template_chunk() {
        assert_eq!(template_chunk("a\\${b}"), "a$${b}");
        assert_eq!(template_chunk("line\\n"), "line\\n");
    }

    #[test]
    fn test_regex() {
        let out = transpile("const r = /a+b/gi;\n");
        assert_eq!(out, "final r = ~/a+b/gi;\n");
        let output = transpile_with("const r = /a/y;\n", |o| o).expect("transform");
        assert_eq!(output.body, "final r = /* /a/y */;\n");
    }

    #[test]
    fn test_object_literal_members() {
        let out = transpile("const a = 1;\nconst o = { a, b: 2, f(x: number) { return x; } };\n");
        assert_eq!(
            out,
            "final a = 1;\nfinal o = { a: a, b: 2, f: function(x:Float) { return x; } };\n"
        );
    }

    #[test]
    fn test_unsupported_object_members() {
        let output = transpile_with(
            "const k = \"x\";\nconst o = { [k]: 1, get v() { return 1; }, w: 2 };\n",
            |o| o,
        )
        .expect("transform");
        assert_eq!(
            output.body,
            "final k = \"x\";\nfinal o = { /* [k]: 1 */ /* get v() { return 1; } */ w: 2 };\n"
        );
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedMember), 2);
    }

    #[test]
    fn test_array_holes() {
        let output = transpile_with("const xs = [1, , 2];\n", |o| o).expect("transform");
        assert_eq!(output.body, "final xs = /* [1, , 2] */;\n");
    }
}
