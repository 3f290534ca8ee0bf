//! Type annotations and type expressions.

use super::functions::function_params;
use super::{always, binding_name, member_name, Rewrite, Rule};
use crate::context::RewriteContext;
use crate::either;
use crate::engine::{RewriteResult, Transformer};
use crate::state::Helper;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{KeywordType, NodeData, NodeFlags, Role, SyntaxKind as K, TypeOperatorKind};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new("type-annotation", &[K::TypeAnn], always, type_annotation),
    Rule::new("binding-identifier", &[K::BindingIdent], always, binding_identifier),
    Rule::new("keyword-type", &[K::KeywordType], always, keyword_type),
    Rule::new(
        "library-type-reference",
        &[K::TypeRef],
        names_library_type,
        library_type_reference,
    ),
    Rule::new("type-reference", &[K::TypeRef], always, type_reference),
    Rule::new("call-type-arguments", &[K::TypeArgs], under_call, drop_node),
    Rule::new("type-arguments", &[K::TypeArgs], always, type_arguments),
    Rule::new("type-parameters", &[K::TypeParams], always, type_parameters),
    Rule::new("type-parameter", &[K::TypeParam], always, type_parameter),
    Rule::new("array-type", &[K::ArrayType], always, array_type),
    Rule::new("tuple-type", &[K::TupleType], always, tuple_type),
    Rule::new(
        "tuple-element",
        &[K::TupleElement, K::OptionalType, K::RestType],
        always,
        inner_type,
    ),
    Rule::new("union-type", &[K::UnionType], always, union_type),
    Rule::new("intersection-type", &[K::IntersectionType], always, intersection_type),
    Rule::new("generic-function-type", &[K::FnType], has_type_params, unsupported_type),
    Rule::new("function-type", &[K::FnType], always, function_type),
    Rule::new("type-literal", &[K::TypeLiteral], always, type_literal),
    Rule::new(
        "computed-signature",
        &[K::PropertySignature, K::MethodSignature],
        has_unnamed_key,
        computed_signature,
    ),
    Rule::new("property-signature", &[K::PropertySignature], always, property_signature),
    Rule::new("method-signature", &[K::MethodSignature], always, method_signature),
    Rule::new(
        "unsupported-signature",
        &[
            K::CallSignature,
            K::ConstructSignature,
            K::GetterSignature,
            K::SetterSignature,
            K::IndexSignature,
        ],
        always,
        unsupported_signature,
    ),
    Rule::new("literal-type", &[K::LiteralType], always, literal_type),
    Rule::new("paren-type", &[K::ParenType], always, paren_type),
    Rule::new("type-operator", &[K::TypeOperator], always, type_operator),
    Rule::new("type-predicate", &[K::TypePredicate], always, type_predicate),
    Rule::new(
        "unsupported-type",
        &[
            K::ConstructorType,
            K::TypeQuery,
            K::ConditionalType,
            K::MappedType,
            K::IndexedAccessType,
            K::InferType,
            K::ThisType,
            K::ImportType,
            K::TemplateLiteralType,
        ],
        always,
        unsupported_type,
    ),
    Rule::new("decorator", &[K::Decorator], always, decorator),
];

/// Text of the type annotated under `owner`'s `role`, without the colon.
pub(crate) fn annotation_type(
    t: &mut Transformer<'_>,
    owner: NodeId,
    role: Role,
    ctx: RewriteContext,
) -> RewriteResult<Option<String>> {
    match t.tree().child(owner, role) {
        Some(annotation) => type_text(t, annotation, ctx).map(Some),
        None => Ok(None),
    }
}

/// Haxe spelling of a type node. Annotations are unwrapped to their type.
pub(crate) fn type_text(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    if t.tree().kind(node) == K::TypeAnn {
        let ty = t.required(node, Role::Element)?;
        return t.visit(ty, ctx);
    }
    t.visit(node, ctx)
}

/// Members of an interface body or type literal, as an anonymous structure.
pub(crate) fn structure(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    for separator in tree.children_with(node, Role::Separator) {
        t.suppress(separator);
    }
    t.reassemble(node, ctx)
}

fn type_annotation(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(format!(":{}", type_text(t, node, ctx)?)))
}

fn binding_identifier(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let name = binding_name(t, node)?;
    Ok(Rewrite::Replace(
        match annotation_type(t, node, Role::TypeAnn, ctx)? {
            Some(ty) => format!("{name}:{ty}"),
            None => name.to_string(),
        },
    ))
}

fn keyword_type(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let NodeData::Keyword(keyword) = t.tree().data(node) else {
        return Err(t.invariant(node, "keyword type without a keyword"));
    };
    let text = match keyword {
        KeywordType::Number => "Float",
        KeywordType::String => "String",
        KeywordType::Boolean => "Bool",
        KeywordType::Void | KeywordType::Undefined => "Void",
        KeywordType::Any
        | KeywordType::Unknown
        | KeywordType::Object
        | KeywordType::Never
        | KeywordType::Null => "Dynamic",
        KeywordType::BigInt | KeywordType::Symbol | KeywordType::Intrinsic => {
            return Ok(Rewrite::Replace(t.unsupported_type(node)));
        }
    };
    Ok(Rewrite::Replace(text.to_string()))
}

fn names_library_type(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree()
        .child(node, Role::Name)
        .and_then(|name| t.library_name(name))
        .is_some()
}

fn type_argument_texts(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Vec<String>> {
    let tree = t.tree();
    let Some(args) = tree.child(node, Role::TypeArgs) else {
        return Ok(Vec::new());
    };
    tree.children_with(args, Role::Element)
        .map(|arg| t.visit(arg, ctx))
        .collect()
}

fn library_type_reference(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let name = t.required(node, Role::Name)?;
    let Some(global) = t.library_name(name) else {
        return Err(t.invariant(node, "not a library type"));
    };
    let args = type_argument_texts(t, node, ctx)?;
    let first = args.first().map_or("Dynamic", String::as_str);
    let text = match global.as_str() {
        "Array" | "ReadonlyArray" => format!("Array<{first}>"),
        "Readonly" => first.to_string(),
        "Record" => format!(
            "haxe.DynamicAccess<{}>",
            args.get(1).map_or("Dynamic", String::as_str)
        ),
        "Map" if args.len() == 2 => format!("Map<{}, {}>", args[0], args[1]),
        "Promise" => {
            let text = format!("Promise<{first}>");
            t.use_helper(Helper::Promise);
            text
        }
        "Error" | "TypeError" | "RangeError" | "SyntaxError" => "haxe.Exception".to_string(),
        "RegExp" => "EReg".to_string(),
        "Function" => "haxe.Constraints.Function".to_string(),
        "Date" | "String" => global.clone(),
        "Number" => "Float".to_string(),
        "Boolean" => "Bool".to_string(),
        "Object" => "Dynamic".to_string(),
        _ => return Ok(Rewrite::Replace(t.unsupported_type(node))),
    };
    Ok(Rewrite::Replace(text))
}

fn type_reference(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let name = t.required(node, Role::Name)?;
    let mut text = tree.text(name).to_string();
    text.push_str(&t.visit_child(node, Role::TypeArgs, ctx)?);
    Ok(Rewrite::Replace(text))
}

fn under_call(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.parent(node)
        .is_some_and(|parent| tree.kind(parent) == K::Call)
}

/// Haxe infers call type arguments; there is no syntax to pass them.
fn drop_node(_: &mut Transformer<'_>, _: NodeId, _: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(String::new()))
}

fn type_arguments(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let args = t.visit_all(node, Role::Element, ctx, ", ")?;
    Ok(Rewrite::Replace(format!("<{args}>")))
}

fn type_parameters(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let params = t.visit_all(node, Role::Element, ctx, ", ")?;
    Ok(Rewrite::Replace(format!("<{params}>")))
}

/// `T:Constraint`. Defaults have no Haxe spelling and are dropped.
fn type_parameter(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let name = binding_name(t, node)?;
    Ok(Rewrite::Replace(
        match annotation_type(t, node, Role::Constraint, ctx)? {
            Some(constraint) => format!("{name}:{constraint}"),
            None => name.to_string(),
        },
    ))
}

fn array_type(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let element = t.required(node, Role::Element)?;
    Ok(Rewrite::Replace(format!("Array<{}>", t.visit(element, ctx)?)))
}

fn tuple_type(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    either::fold_tuple(t, node, ctx).map(Rewrite::Replace)
}

/// Labels, `?` and `...` inside tuples carry no type information of their own.
fn inner_type(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let inner = t.required(node, Role::Element)?;
    t.visit(inner, ctx).map(Rewrite::Replace)
}

fn union_type(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    either::fold_union(t, node, ctx).map(Rewrite::Replace)
}

fn intersection_type(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    t.visit_all(node, Role::Element, ctx, " & ")
        .map(Rewrite::Replace)
}

fn has_type_params(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().child(node, Role::TypeParams).is_some()
}

fn function_type(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let params = function_params(t, node, ctx.signature())?;
    let ret = annotation_type(t, node, Role::ReturnType, ctx)?.unwrap_or_else(|| "Void".into());
    Ok(Rewrite::Replace(format!("({params}) -> {ret}")))
}

fn type_literal(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    structure(t, node, ctx).map(Rewrite::Replace)
}

fn has_unnamed_key(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Key)
        .is_some_and(|key| member_name(tree, key).is_none())
}

fn computed_signature(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedMember,
        "non-identifier member key",
    )))
}

fn signature_name<'a>(t: &Transformer<'a>, node: NodeId) -> RewriteResult<&'a str> {
    let tree = t.tree();
    let key = t.required(node, Role::Key)?;
    member_name(tree, key).ok_or_else(|| t.invariant(node, "member key is not an identifier"))
}

fn property_signature(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let name = signature_name(t, node)?;
    let ty = annotation_type(t, node, Role::TypeAnn, ctx)?.unwrap_or_else(|| "Dynamic".into());
    let optional = if tree.has_flag(node, NodeFlags::OPTIONAL) {
        "@:optional "
    } else {
        ""
    };
    let keyword = if tree.has_flag(node, NodeFlags::READONLY) {
        "final"
    } else {
        "var"
    };
    Ok(Rewrite::Replace(format!("{optional}{keyword} {name}:{ty};")))
}

fn method_signature(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let name = signature_name(t, node)?;
    let type_params = t.visit_child(node, Role::TypeParams, ctx)?;
    let params = function_params(t, node, ctx.signature())?;
    let ret = annotation_type(t, node, Role::ReturnType, ctx)?.unwrap_or_else(|| "Dynamic".into());
    let optional = if tree.has_flag(node, NodeFlags::OPTIONAL) {
        "@:optional "
    } else {
        ""
    };
    Ok(Rewrite::Replace(format!(
        "{optional}function {name}{type_params}({params}):{ret};"
    )))
}

fn unsupported_signature(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let what = match t.tree().kind(node) {
        K::CallSignature => "call signature",
        K::ConstructSignature => "construct signature",
        K::IndexSignature => "index signature",
        _ => "accessor signature",
    };
    Ok(Rewrite::Replace(t.unsupported(
        node,
        DiagnosticCode::UnsupportedMember,
        what,
    )))
}

/// Literal types widen to their primitive.
fn literal_type(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let text = match t.tree().data(node) {
        NodeData::Num(_) => "Float",
        NodeData::Str(_) => "String",
        NodeData::Bool(_) => "Bool",
        _ => return Ok(Rewrite::Replace(t.unsupported_type(node))),
    };
    Ok(Rewrite::Replace(text.to_string()))
}

fn paren_type(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let inner = t.required(node, Role::Element)?;
    let text = t.visit(inner, ctx)?;
    Ok(Rewrite::Replace(if t.tree().kind(inner) == K::FnType {
        format!("({text})")
    } else {
        text
    }))
}

fn type_operator(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    match t.tree().data(node) {
        NodeData::TypeOperator(TypeOperatorKind::ReadOnly) => {
            let inner = t.required(node, Role::Element)?;
            t.visit(inner, ctx).map(Rewrite::Replace)
        }
        _ => Ok(Rewrite::Replace(t.unsupported_type(node))),
    }
}

/// `x is T` narrows a boolean result; `asserts x` returns nothing.
fn type_predicate(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let text = if t.tree().text(node).starts_with("asserts") {
        "Void"
    } else {
        "Bool"
    };
    Ok(Rewrite::Replace(text.to_string()))
}

fn unsupported_type(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.unsupported_type(node)))
}

fn decorator(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "decorator",
    )))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{transpile, transpile_with};
    use ferry_diagnostics::DiagnosticCode;

    #[test]
    fn test_primitive_annotations() {
        let out = transpile("let a: number = 1;\nlet b: string;\nlet c: boolean | null;\n");
        assert_eq!(out, "var a:Float = 1;\nvar b:String;\nvar c:Null<Bool>;\n");
    }

    #[test]
    fn test_library_references() {
        let out = transpile("let xs: Array<string>;\nlet m: Record<string, number>;\n");
        assert_eq!(
            out,
            "var xs:Array<String>;\nvar m:haxe.DynamicAccess<Float>;\n"
        );
    }

    #[test]
    fn test_function_type_and_array_shorthand() {
        let out = transpile("let f: (a: number, b?: string) => void;\nlet ys: number[];\n");
        assert_eq!(
            out,
            "var f:(a:Float, ?b:String) -> Void;\nvar ys:Array<Float>;\n"
        );
    }

    #[test]
    fn test_type_literal_becomes_structure() {
        let out = transpile("type P = { x: number; readonly y?: string };\n");
        assert_eq!(
            out,
            "typedef P = { var x:Float; @:optional final y:String; };\n"
        );
    }

    #[test]
    fn test_unsupported_type_keeps_a_type() {
        let output = transpile_with("let k: keyof T;\n", |o| o).expect("transform");
        assert_eq!(output.body, "var k:Dynamic /* keyof T */;\n");
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedType), 1);
    }

    #[test]
    fn test_call_type_arguments_are_dropped() {
        assert_eq!(transpile("f<number>(1);\n"), "f(1);\n");
    }
}
