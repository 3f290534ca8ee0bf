//! Operators, calls and the library globals that have Haxe spellings.

use super::{always, Rewrite, Rule};
use crate::coercion::{coerce, coerce_operands};
use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{AssignOp, BinaryOp, NodeData, Role, SyntaxKind as K, UnaryOp};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new("typeof-comparison", &[K::Binary], is_typeof_comparison, typeof_comparison),
    Rule::new("strict-equality", &[K::Binary], is_strict_equality, strict_equality),
    Rule::new("logical-operator", &[K::Binary], is_logical, logical_operator),
    Rule::new("exponent", &[K::Binary], is_exponent, exponent),
    Rule::new("in-operator", &[K::Binary], is_in, in_operator),
    Rule::new("instanceof", &[K::Binary], is_instanceof, instanceof),
    Rule::new("logical-not", &[K::Unary], is_not, logical_operator),
    Rule::new("delete-operator", &[K::Unary], is_delete, delete_operator),
    Rule::new("void-operator", &[K::Unary], is_void, void_operator),
    Rule::new("typeof-operator", &[K::Unary], is_typeof, typeof_operator),
    Rule::new("unary-plus", &[K::Unary], is_unary_plus, unary_plus),
    Rule::new("library-identifier", &[K::Ident], is_library_constant, library_identifier),
    Rule::new("receiver-this", &[K::This], has_receiver, receiver_this),
    Rule::new("dynamic-import", &[K::Call], is_dynamic_import, dynamic_import),
    Rule::new("library-call", &[K::Call], is_library_call, library_call),
    Rule::new("new-error", &[K::New], is_new_error, new_error),
    Rule::new("type-cast", &[K::AsExpr, K::TypeAssertion], always, type_cast),
    Rule::new(
        "transparent-wrapper",
        &[K::NonNull, K::ConstAssertion, K::Satisfies, K::Instantiation],
        always,
        transparent_wrapper,
    ),
    Rule::new("await", &[K::Await], always, await_expression),
    Rule::new("conditional-test", &[K::Cond], always, conditional_test),
    Rule::new("private-member-access", &[K::Member], is_private_access, private_member),
    Rule::new("optional-call", &[K::OptChain], is_optional_call, optional_call),
    Rule::new("spread-element", &[K::Spread], is_literal_spread, spread_element),
    Rule::new(
        "destructuring-assignment",
        &[K::Assign],
        assigns_pattern,
        destructuring_assignment,
    ),
    Rule::new("exponent-assignment", &[K::Assign], is_exponent_assign, exponent_assignment),
    Rule::new("logical-assignment", &[K::Assign], is_logical_assign, logical_assignment),
    Rule::new(
        "unsupported-expression",
        &[
            K::ClassExpr,
            K::Seq,
            K::Yield,
            K::MetaProp,
            K::PrivateName,
            K::TaggedTemplate,
            K::BigInt,
            K::Opaque,
        ],
        always,
        unsupported_expression,
    ),
];

fn binary_op(t: &Transformer<'_>, node: NodeId) -> Option<BinaryOp> {
    match t.tree().data(node) {
        NodeData::Binary(op) => Some(*op),
        _ => None,
    }
}

fn unary_op(t: &Transformer<'_>, node: NodeId) -> Option<UnaryOp> {
    match t.tree().data(node) {
        NodeData::Unary(op) => Some(*op),
        _ => None,
    }
}

fn assign_op(t: &Transformer<'_>, node: NodeId) -> Option<AssignOp> {
    match t.tree().data(node) {
        NodeData::Assign(op) => Some(*op),
        _ => None,
    }
}

/// Left and right operand text, for rules that rebuild the operator.
fn operands(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<(String, String)> {
    let left = t.visit(t.required(node, Role::Left)?, ctx)?;
    let right = t.visit(t.required(node, Role::Right)?, ctx)?;
    Ok((left, right))
}

/// `typeof x == "tag"`: the operand, the tag and whether the test is negated.
fn typeof_test(t: &Transformer<'_>, node: NodeId) -> Option<(NodeId, String, bool)> {
    let tree = t.tree();
    let negated = match binary_op(t, node)? {
        BinaryOp::EqEq | BinaryOp::EqEqEq => false,
        BinaryOp::NotEq | BinaryOp::NotEqEq => true,
        _ => return None,
    };
    let left = tree.child(node, Role::Left)?;
    let right = tree.child(node, Role::Right)?;
    let (typeof_node, tag) = if unary_op(t, left) == Some(UnaryOp::TypeOf) {
        (left, right)
    } else if unary_op(t, right) == Some(UnaryOp::TypeOf) {
        (right, left)
    } else {
        return None;
    };
    let NodeData::Str(tag) = tree.data(tag) else {
        return None;
    };
    Some((tree.child(typeof_node, Role::Operand)?, tag.clone(), negated))
}

fn is_typeof_comparison(t: &Transformer<'_>, node: NodeId) -> bool {
    typeof_test(t, node).is_some()
}

fn typeof_comparison(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let Some((operand, tag, negated)) = typeof_test(t, node) else {
        return Err(t.invariant(node, "not a typeof comparison"));
    };
    let value = t.visit(operand, ctx.nested())?;
    let test = match tag.as_str() {
        "undefined" => {
            let op = if negated { "!=" } else { "==" };
            return Ok(Rewrite::Replace(format!("{value} {op} null")));
        }
        "string" => format!("Std.isOfType({value}, String)"),
        "number" => format!("Std.isOfType({value}, Float)"),
        "boolean" => format!("Std.isOfType({value}, Bool)"),
        "function" => format!("Reflect.isFunction({value})"),
        "object" => format!("Reflect.isObject({value})"),
        other => {
            return Ok(Rewrite::Replace(t.degrade(
                node,
                DiagnosticCode::UnsupportedSyntax,
                &format!("`typeof` test for \"{other}\""),
            )))
        }
    };
    Ok(Rewrite::Replace(if negated {
        format!("!{test}")
    } else {
        test
    }))
}

fn is_strict_equality(t: &Transformer<'_>, node: NodeId) -> bool {
    matches!(
        binary_op(t, node),
        Some(BinaryOp::EqEqEq | BinaryOp::NotEqEq)
    )
}

/// Haxe `==` already compares without conversion.
fn strict_equality(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let left = t.required(node, Role::Left)?;
    let right = t.required(node, Role::Right)?;
    let (Some(left_span), Some(right_span)) = (tree.span(left), tree.span(right)) else {
        return Err(t.invariant(node, "synthetic operand in an equality"));
    };
    let gap = tree
        .slice(left_span.end, right_span.start)
        .replacen("===", "==", 1)
        .replacen("!==", "!=", 1);
    let (left, right) = operands(t, node, ctx)?;
    Ok(Rewrite::Replace(format!("{left}{gap}{right}")))
}

fn is_logical(t: &Transformer<'_>, node: NodeId) -> bool {
    binary_op(t, node).is_some_and(BinaryOp::is_logical)
}

fn is_not(t: &Transformer<'_>, node: NodeId) -> bool {
    unary_op(t, node) == Some(UnaryOp::Not)
}

/// `&&`, `||` and `!` only take `Bool` operands.
fn logical_operator(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    coerce_operands(t, node, ctx.nested()).map(Rewrite::Replace)
}

fn is_exponent(t: &Transformer<'_>, node: NodeId) -> bool {
    binary_op(t, node) == Some(BinaryOp::Exp)
}

fn exponent(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let (base, power) = operands(t, node, ctx.nested())?;
    Ok(Rewrite::Replace(format!("Math.pow({base}, {power})")))
}

fn is_in(t: &Transformer<'_>, node: NodeId) -> bool {
    binary_op(t, node) == Some(BinaryOp::In)
}

fn in_operator(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let (key, object) = operands(t, node, ctx.nested())?;
    Ok(Rewrite::Replace(format!("Reflect.hasField({object}, {key})")))
}

fn is_instanceof(t: &Transformer<'_>, node: NodeId) -> bool {
    binary_op(t, node) == Some(BinaryOp::InstanceOf)
}

fn instanceof(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let (value, class) = operands(t, node, ctx.nested())?;
    Ok(Rewrite::Replace(format!("Std.isOfType({value}, {class})")))
}

fn is_delete(t: &Transformer<'_>, node: NodeId) -> bool {
    unary_op(t, node) == Some(UnaryOp::Delete)
}

fn delete_operator(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let target = t.required(node, Role::Operand)?;
    if tree.kind(target) != K::Member {
        return Ok(Rewrite::Replace(t.degrade(
            node,
            DiagnosticCode::UnsupportedSyntax,
            "`delete` of a non-member",
        )));
    }
    let object = t.visit(t.required(target, Role::Object)?, ctx)?;
    let property = t.required(target, Role::Property)?;
    let field = match (tree.kind(property), tree.name(property)) {
        (K::PropIdent, Some(name)) => format!("\"{name}\""),
        (K::ComputedKey, _) => t.visit(t.required(property, Role::Expression)?, ctx)?,
        _ => {
            return Ok(Rewrite::Replace(t.degrade(
                node,
                DiagnosticCode::UnsupportedSyntax,
                "`delete` of a private field",
            )))
        }
    };
    Ok(Rewrite::Replace(format!("Reflect.deleteField({object}, {field})")))
}

fn is_void(t: &Transformer<'_>, node: NodeId) -> bool {
    unary_op(t, node) == Some(UnaryOp::Void)
}

/// `void 0` is `null`; other operands still run for their effects.
fn void_operator(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let operand = t.required(node, Role::Operand)?;
    if matches!(
        t.tree().kind(operand),
        K::Number | K::String | K::Bool | K::Null
    ) {
        return Ok(Rewrite::Replace("null".to_string()));
    }
    let text = t.visit(operand, ctx.nested())?;
    Ok(Rewrite::Replace(format!("{{ {text}; null; }}")))
}

fn is_typeof(t: &Transformer<'_>, node: NodeId) -> bool {
    unary_op(t, node) == Some(UnaryOp::TypeOf)
}

fn typeof_operator(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "`typeof` outside a comparison with a string",
    )))
}

fn is_unary_plus(t: &Transformer<'_>, node: NodeId) -> bool {
    unary_op(t, node) == Some(UnaryOp::Plus)
}

fn unary_plus(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let operand = t.required(node, Role::Operand)?;
    let ty = t.type_of(operand);
    let text = t.visit(operand, ctx.nested())?;
    Ok(Rewrite::Replace(if ty.is_number() {
        text
    } else if ty.is_string() {
        format!("Std.parseFloat({text})")
    } else {
        format!("Std.parseFloat(Std.string({text}))")
    }))
}

fn library_constant(t: &Transformer<'_>, node: NodeId) -> Option<&'static str> {
    match t.library_name(node)?.as_str() {
        "undefined" => Some("null"),
        "NaN" => Some("Math.NaN"),
        "Infinity" => Some("Math.POSITIVE_INFINITY"),
        _ => None,
    }
}

fn is_library_constant(t: &Transformer<'_>, node: NodeId) -> bool {
    library_constant(t, node).is_some()
}

fn library_identifier(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let text = library_constant(t, node).ok_or_else(|| t.invariant(node, "not a library constant"))?;
    Ok(Rewrite::Replace(text.to_string()))
}

/// The function `this` belongs to: arrows see through to their enclosing one.
fn receiver_name(t: &Transformer<'_>, node: NodeId) -> Option<String> {
    let tree = t.tree();
    let func = tree
        .ancestors(node)
        .find(|&a| tree.kind(a).is_function_like() && tree.kind(a) != K::Arrow)?;
    t.state.receivers.get(&func).cloned()
}

fn has_receiver(t: &Transformer<'_>, node: NodeId) -> bool {
    receiver_name(t, node).is_some()
}

fn receiver_this(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let name = receiver_name(t, node).ok_or_else(|| t.invariant(node, "no receiver"))?;
    Ok(Rewrite::Replace(name))
}

fn is_dynamic_import(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Callee)
        .is_some_and(|callee| tree.kind(callee) == K::Opaque)
}

fn dynamic_import(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedImport,
        "dynamic `import()`",
    )))
}

/// Haxe spelling of a library function call, by global and member.
fn library_function(t: &Transformer<'_>, callee: NodeId) -> Option<&'static str> {
    if let Some((global, member)) = t.library_member(callee) {
        return match (global.as_str(), member) {
            ("console", "log" | "info" | "warn" | "error" | "debug") => Some("trace"),
            ("Array", "isArray") => Some("Std.isOfType"),
            ("JSON", "parse") => Some("haxe.Json.parse"),
            ("JSON", "stringify") => Some("haxe.Json.stringify"),
            ("Object", "keys") => Some("Reflect.fields"),
            ("Number", "isNaN") => Some("Math.isNaN"),
            ("Number", "isFinite") => Some("Math.isFinite"),
            _ => None,
        };
    }
    match t.library_name(callee)?.as_str() {
        "parseInt" => Some("Std.parseInt"),
        "parseFloat" => Some("Std.parseFloat"),
        "String" => Some("Std.string"),
        "isNaN" => Some("Math.isNaN"),
        "isFinite" => Some("Math.isFinite"),
        _ => None,
    }
}

fn is_library_call(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree()
        .child(node, Role::Callee)
        .and_then(|callee| library_function(t, callee))
        .is_some()
}

fn library_call(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let callee = t.required(node, Role::Callee)?;
    let target = library_function(t, callee).ok_or_else(|| t.invariant(node, "not a library call"))?;
    let args: Vec<NodeId> = tree.children_with(node, Role::Argument).collect();
    if target == "Std.parseInt" && args.len() > 1 {
        let decimal = matches!(tree.data(args[1]), NodeData::Num(radix) if *radix == 10.0);
        if !decimal {
            return Ok(Rewrite::Replace(t.degrade(
                node,
                DiagnosticCode::UnsupportedSyntax,
                "`parseInt` with a radix other than 10",
            )));
        }
        let value = t.visit(args[0], ctx)?;
        return Ok(Rewrite::Replace(format!("Std.parseInt({value})")));
    }
    let mut text = t.visit_all(node, Role::Argument, ctx, ", ")?;
    if target == "Std.isOfType" {
        text.push_str(", Array");
    }
    Ok(Rewrite::Replace(format!("{target}({text})")))
}

fn is_new_error(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree()
        .child(node, Role::Callee)
        .and_then(|callee| t.library_name(callee))
        .is_some_and(|name| {
            matches!(
                name.as_str(),
                "Error" | "TypeError" | "RangeError" | "SyntaxError"
            )
        })
}

fn new_error(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let args = t.visit_all(node, Role::Argument, ctx.nested(), ", ")?;
    Ok(Rewrite::Replace(format!("new haxe.Exception({args})")))
}

/// `(cast e : T)` checks nothing at runtime, like the assertion it replaces.
fn type_cast(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let ctx = ctx.nested();
    let value = t.visit(t.required(node, Role::Expression)?, ctx)?;
    let ty = t.visit(t.required(node, Role::TypeAnn)?, ctx)?;
    Ok(Rewrite::Replace(format!("(cast {value} : {ty})")))
}

fn transparent_wrapper(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let inner = t.required(node, Role::Expression)?;
    t.visit(inner, ctx.nested()).map(Rewrite::Replace)
}

fn await_expression(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let operand = t.visit(t.required(node, Role::Operand)?, ctx.nested())?;
    Ok(Rewrite::Replace(format!("@:await {operand}")))
}

fn conditional_test(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let test = t.required(node, Role::Test)?;
    let text = coerce(t, test, ctx.nested(), false)?;
    Ok(Rewrite::ReplaceChild(test, text))
}

fn is_private_access(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Property)
        .is_some_and(|property| tree.kind(property) == K::PrivateName)
}

fn private_member(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedMember,
        "access to a `#private` field",
    )))
}

fn is_optional_call(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Expression)
        .is_some_and(|base| tree.kind(base) == K::Call)
}

fn optional_call(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "optional call",
    )))
}

fn is_literal_spread(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.parent(node)
        .is_some_and(|parent| matches!(tree.kind(parent), K::ArrayLit | K::ObjectLit))
}

fn spread_element(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "spread in a literal",
    )))
}

fn assigns_pattern(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Left)
        .is_some_and(|left| matches!(tree.kind(left), K::ObjectPat | K::ArrayPat))
}

fn destructuring_assignment(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedPattern,
        "destructuring assignment",
    )))
}

fn is_exponent_assign(t: &Transformer<'_>, node: NodeId) -> bool {
    assign_op(t, node) == Some(AssignOp::Exp)
}

fn exponent_assignment(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let (target, power) = operands(t, node, ctx.nested())?;
    Ok(Rewrite::Replace(format!(
        "{target} = Math.pow({target}, {power})"
    )))
}

fn is_logical_assign(t: &Transformer<'_>, node: NodeId) -> bool {
    matches!(assign_op(t, node), Some(AssignOp::And | AssignOp::Or))
}

fn logical_assignment(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "logical assignment",
    )))
}

/// Class members get a member code, type positions keep a type.
fn unsupported_expression(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let parent = tree.parent(node).map(|p| tree.kind(p));
    let text = match parent {
        Some(K::ClassBody | K::ObjectLit | K::TypeLiteral | K::InterfaceBody) => {
            t.unsupported(node, DiagnosticCode::UnsupportedMember, "member")
        }
        Some(kind) if kind.is_type() || kind == K::TypeAnn => t.unsupported_type(node),
        _ => {
            let what = match tree.kind(node) {
                K::ClassExpr => "class expression",
                K::Seq => "comma operator",
                K::Yield => "`yield`",
                K::MetaProp => "`new.target`/`import.meta`",
                K::TaggedTemplate => "tagged template",
                K::BigInt => "bigint literal",
                K::PrivateName => "`#private` name",
                _ => "expression",
            };
            t.unsupported(node, DiagnosticCode::UnsupportedSyntax, what)
        }
    };
    Ok(Rewrite::Replace(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{transpile, transpile_with};

    #[test]
    fn test_typeof_comparisons() {
        let out = transpile(
            "declare let x: any;\nif (typeof x === \"string\") {}\nif (typeof x !== \"number\") {}\nif (\"undefined\" == typeof x) {}\nif (typeof x === \"function\") {}\n",
        );
        assert_eq!(
            out,
            "if (Std.isOfType(x, String)) {}\nif (!Std.isOfType(x, Float)) {}\nif (x == null) {}\nif (Reflect.isFunction(x)) {}\n"
        );
    }

    #[test]
    fn test_operators() {
        let out = transpile(
            "declare let a: any;\nconst p = a ** 2;\nconst h = \"k\" in a;\nconst d = a instanceof Date;\na **= 3;\ndelete a.k;\n",
        );
        assert_eq!(
            out,
            "final p = Math.pow(a, 2);\nfinal h = Reflect.hasField(a, \"k\");\nfinal d = Std.isOfType(a, Date);\na = Math.pow(a, 3);\nReflect.deleteField(a, \"k\");\n"
        );
    }

    #[test]
    fn test_logical_operands_in_values() {
        let out = transpile("let n = 1;\nconst b = !n;\n");
        assert_eq!(out, "var n = 1;\nfinal b = !(n != 0);\n");
    }

    #[test]
    fn test_library_globals() {
        let out = transpile(
            "console.log(\"a\", 1);\nconst n = parseInt(\"4\", 10);\nconst s = String(n);\nconst u = undefined;\nconst z = NaN;\nconst j = JSON.stringify({});\nconst k = Object.keys({});\nconst a = Array.isArray(k);\n",
        );
        assert_eq!(
            out,
            "trace(\"a\", 1);\nfinal n = Std.parseInt(\"4\");\nfinal s = Std.string(n);\nfinal u = null;\nfinal z = Math.NaN;\nfinal j = haxe.Json.stringify({});\nfinal k = Reflect.fields({});\nfinal a = Std.isOfType(k, Array);\n"
        );
    }

    #[test]
    fn test_shadowed_globals_are_left_alone() {
        let out = transpile("function f(console: any) {\n  console.log(1);\n}\n");
        assert_eq!(out, "function f(console:Dynamic) {\n  console.log(1);\n}\n");
    }

    #[test]
    fn test_parse_int_with_radix_is_unsupported() {
        let output = transpile_with("const n = parseInt(\"ff\", 16);\n", |o| o).expect("transform");
        assert_eq!(output.body, "final n = /* parseInt(\"ff\", 16) */;\n");
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedSyntax), 1);
    }

    #[test]
    fn test_errors_and_casts() {
        let out = transpile("declare let v: any;\nthrow new Error(\"bad\");\nconst n = v as number;\nconst m = v!;\nconst c = [1] as const;\n");
        assert_eq!(
            out,
            "throw new haxe.Exception(\"bad\");\nfinal n = (cast v : Float);\nfinal m = v;\nfinal c = [1];\n"
        );
    }

    #[test]
    fn test_unary_plus_by_operand_type() {
        let out = transpile("let n = 1;\nlet s = \"2\";\nconst a = +n;\nconst b = +s;\n");
        assert_eq!(
            out,
            "var n = 1;\nvar s = \"2\";\nfinal a = n;\nfinal b = Std.parseFloat(s);\n"
        );
    }

    #[test]
    fn test_void_operator() {
        let out = transpile("declare function f(): number;\nconst a = void 0;\nconst b = void f();\n");
        assert_eq!(out, "final a = null;\nfinal b = { f(); null; };\n");
    }

    #[test]
    fn test_unsupported_expressions_are_commented() {
        let output = transpile_with(
            "declare let o: any;\nconst a = (1, 2);\nconst b = o?.f();\n[x, y] = o;\n",
            |o| o,
        )
        .expect("transform");
        assert_eq!(
            output.body,
            "final a = (/* 1, 2 */);\nfinal b = /* o?.f() */;\n/* [x, y] = o */;\n"
        );
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedSyntax), 2);
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedPattern), 1);
    }
}
