//! Lowering of binding patterns into flat declarations.
//!
//! A pattern is replaced by one source expression (the initializer, or a
//! synthesized placeholder) and each leaf binding becomes its own declaration
//! reading from it through a chain of field and index accesses.

use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use crate::rename::BindingKey;
use crate::rules::{annotation_type, binding_name, is_identifier};
use crate::state::Helper;
use ferry_syntax::{NodeData, NodeFlags, Role, SyntaxKind as K};
use ferry_types::NodeId;

/// One leaf of a pattern: `name` is bound to `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    pub name: String,
    pub value: String,
}

impl Binding {
    pub fn declare(&self, keyword: &str) -> String {
        format!("{keyword} {} = {}", self.name, self.value)
    }
}

/// Leaf bindings of `pattern` read from `source`, in source order.
pub(crate) fn flatten(
    t: &mut Transformer<'_>,
    pattern: NodeId,
    source: &str,
    ctx: RewriteContext,
) -> RewriteResult<Vec<Binding>> {
    let mut out = Vec::new();
    collect(t, pattern, source.to_string(), ctx, &mut out)?;
    Ok(out)
}

fn collect(
    t: &mut Transformer<'_>,
    pattern: NodeId,
    source: String,
    ctx: RewriteContext,
    out: &mut Vec<Binding>,
) -> RewriteResult<()> {
    let tree = t.tree();
    match tree.kind(pattern) {
        K::BindingIdent | K::Ident => out.push(Binding {
            name: binding_name(t, pattern)?.to_string(),
            value: source,
        }),
        K::AssignPat => {
            let left = t.required(pattern, Role::Left)?;
            let default = t.required(pattern, Role::Default)?;
            let fallback = t.visit(default, ctx)?;
            if tree.kind(left) == K::BindingIdent {
                out.push(Binding {
                    name: binding_name(t, left)?.to_string(),
                    value: format!("{source} ?? {fallback}"),
                });
            } else {
                collect(t, left, format!("({source} ?? {fallback})"), ctx, out)?;
            }
        }
        K::ObjectPat => {
            let mut consumed: Vec<String> = Vec::new();
            for element in tree.children_with(pattern, Role::Element) {
                match tree.kind(element) {
                    K::PatShorthand => {
                        let name_node = t.required(element, Role::Name)?;
                        let name = binding_name(t, name_node)?;
                        consumed.push(name.to_string());
                        let access = format!("{source}.{name}");
                        let value = match tree.child(element, Role::Default) {
                            Some(default) => format!("{access} ?? {}", t.visit(default, ctx)?),
                            None => access,
                        };
                        out.push(Binding {
                            name: name.to_string(),
                            value,
                        });
                    }
                    K::PatKeyValue => {
                        let key = t.required(element, Role::Key)?;
                        let value = t.required(element, Role::Value)?;
                        match tree.data(key) {
                            NodeData::Name(name) | NodeData::Str(name) => {
                                consumed.push(name.clone())
                            }
                            _ => {}
                        }
                        let access = key_access(t, key, &source, ctx)?;
                        collect(t, value, access, ctx, out)?;
                    }
                    K::RestPat => {
                        let rest = t.required(element, Role::Argument)?;
                        t.use_helper(Helper::Helpers);
                        let keys: Vec<String> =
                            consumed.iter().map(|k| format!("\"{k}\"")).collect();
                        let value = format!("Helpers.omit({source}, [{}])", keys.join(", "));
                        collect(t, rest, value, ctx, out)?;
                    }
                    _ => return Err(t.invariant(element, "unexpected object pattern element")),
                }
            }
        }
        K::ArrayPat => {
            for (index, element) in tree.children_with(pattern, Role::Element).enumerate() {
                match tree.kind(element) {
                    K::Hole => {}
                    K::RestPat => {
                        let rest = t.required(element, Role::Argument)?;
                        collect(t, rest, format!("{source}.slice({index})"), ctx, out)?;
                    }
                    _ => collect(t, element, format!("{source}[{index}]"), ctx, out)?,
                }
            }
        }
        _ => return Err(t.invariant(pattern, "unexpected binding pattern")),
    }
    Ok(())
}

/// `source.key` where the key is a Haxe identifier, a reflective or index access otherwise.
fn key_access(
    t: &mut Transformer<'_>,
    key: NodeId,
    source: &str,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    Ok(match (tree.kind(key), tree.data(key)) {
        (K::PropIdent, NodeData::Name(name)) => format!("{source}.{name}"),
        (K::String, NodeData::Str(name)) if is_identifier(name) => format!("{source}.{name}"),
        (K::String, _) => format!("Reflect.field({source}, {})", t.visit(key, ctx)?),
        (K::Number, _) => format!("{source}[{}]", t.visit(key, ctx)?),
        (K::ComputedKey, _) => {
            let expr = t.required(key, Role::Expression)?;
            format!("Reflect.field({source}, {})", t.visit(expr, ctx)?)
        }
        _ => return Err(t.invariant(key, "unexpected pattern key")),
    })
}

/// Statements for `keyword pattern = init`, without terminators.
///
/// Identifiers and `this` are read directly; anything else is evaluated once
/// into a synthesized local first.
pub(crate) fn declaration(
    t: &mut Transformer<'_>,
    pattern: NodeId,
    init: NodeId,
    keyword: &str,
    ctx: RewriteContext,
) -> RewriteResult<Vec<String>> {
    let tree = t.tree();
    let init_text = t.visit(init, ctx)?;
    let mut statements = Vec::new();
    let source = if matches!(tree.kind(init), K::Ident | K::This) {
        init_text
    } else {
        let name = t.rename("destructured", BindingKey::Node(pattern));
        statements.push(format!("{keyword} {name} = {init_text}"));
        name
    };
    for binding in flatten(t, pattern, &source, ctx)? {
        statements.push(binding.declare(keyword));
    }
    Ok(statements)
}

/// Replace a pattern parameter by a placeholder and queue its bindings as
/// the prologue of the function body. Returns the parameter text.
pub(crate) fn parameter(
    t: &mut Transformer<'_>,
    param: NodeId,
    pattern: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let placeholder = t.rename("param", BindingKey::Node(param));
    let (target, has_default) = match tree.kind(pattern) {
        K::AssignPat => (t.required(pattern, Role::Left)?, true),
        _ => (pattern, false),
    };
    let ty = annotation_type(t, target, Role::TypeAnn, ctx)?.unwrap_or_else(|| "Dynamic".into());
    let optional = has_default || tree.has_flag(target, NodeFlags::OPTIONAL);
    let text = format!("{}{placeholder}:{ty}", if optional { "?" } else { "" });

    let Some(func) = tree.parent(param) else {
        return Ok(text);
    };
    let body = tree.child(func, Role::Body);
    if ctx.drop_initializer || body.is_none() {
        return Ok(text);
    }
    let statements: Vec<String> = flatten(t, pattern, &placeholder, RewriteContext::default())?
        .iter()
        .map(|binding| format!("{};", binding.declare("var")))
        .collect();
    // Expression-bodied arrows keep their prologue on the arrow itself.
    let target = match body {
        Some(block) if tree.kind(block) == K::Block => block,
        _ => func,
    };
    t.state.add_prologue(target, statements);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use crate::test_support::transpile;

    #[test]
    fn test_nested_defaults_chain_nullish_fallbacks() {
        let out = transpile("function f(s: any) {\n  const { a, b: { c = 1 } = {} } = s;\n}\n");
        assert_eq!(
            out,
            "function f(s:Dynamic) {\n  final a = s.a;\n  final c = (s.b ?? {}).c ?? 1;\n}\n"
        );
    }

    #[test]
    fn test_array_pattern_evaluates_initializer_once() {
        let out = transpile("function f() {\n  let [x, , ...rest] = g();\n}\n");
        assert_eq!(
            out,
            "function f() {\n  var destructured = g();\n  var x = destructured[0];\n  \
             var rest = destructured.slice(2);\n}\n"
        );
    }

    #[test]
    fn test_object_rest_omits_consumed_keys() {
        let out = transpile(
            "function f({ a, \"b\": bee, ...others }: Opts, n = 1) {\n  go(a);\n}\n",
        );
        assert_eq!(
            out,
            "function f(param:Opts, n = 1) {\n  var a = param.a;\n  var bee = param.b;\n  \
             var others = Helpers.omit(param, [\"a\", \"b\"]);\n  go(a);\n}\n"
        );
    }

    #[test]
    fn test_non_literal_default_is_lowered() {
        let out = transpile("function f(a: number, b = make()) {\n  use(b);\n}\n");
        assert_eq!(
            out,
            "function f(a:Float, ?param:Dynamic) {\n  var b = param ?? make();\n  use(b);\n}\n"
        );
    }

    #[test]
    fn test_placeholders_do_not_collide() {
        let out = transpile("function f({ a }: A, [b]: B) {\n  go(a, b);\n}\n");
        assert_eq!(
            out,
            "function f(param:A, param1:B) {\n  var a = param.a;\n  var b = param1[0];\n  go(a, b);\n}\n"
        );
    }

    #[test]
    fn test_expression_arrow_gets_a_block() {
        let out = transpile("const f = ({ a }: P) => a;\n");
        assert_eq!(out, "final f = function(param:P) { var a = param.a; return a; };\n");
    }
}
