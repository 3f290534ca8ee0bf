//! Class bodies and their members.

use super::functions::{function_text, is_primitive_default};
use super::{always, append_to_block, binding_name, decorators, member_name, Rewrite, Rule};
use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use crate::rules::annotation_type;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{MethodKind, NodeData, NodeFlags, Role, SyntaxKind as K, SyntaxTree};
use ferry_types::NodeId;

pub(super) const RULES: &[Rule] = &[
    Rule::new("class-body", &[K::ClassBody], always, class_body),
    Rule::new("overload-signature", &[K::Method, K::Constructor], is_overload, drop_member),
    Rule::new("constructor", &[K::Constructor], always, constructor),
    Rule::new(
        "computed-member",
        &[K::Method, K::ClassProp],
        has_unnamed_key,
        computed_member,
    ),
    Rule::new("generator-method", &[K::Method], is_generator, generator_method),
    Rule::new("accessor", &[K::Method], is_accessor, accessor),
    Rule::new("method", &[K::Method], always, method),
    Rule::new("ambient-property", &[K::ClassProp], is_declared, drop_member),
    Rule::new("class-property", &[K::ClassProp], always, class_property),
    Rule::new(
        "private-name-member",
        &[K::PrivateProp, K::PrivateMethod],
        always,
        private_name_member,
    ),
    Rule::new("static-block", &[K::StaticBlock], always, static_block),
];

/// Haxe members default to private, so everything TypeScript leaves public is spelled out.
fn access(tree: &SyntaxTree, member: NodeId) -> &'static str {
    if tree.has_flag(member, NodeFlags::PRIVATE) || tree.has_flag(member, NodeFlags::PROTECTED) {
        "private "
    } else {
        "public "
    }
}

fn modifiers(tree: &SyntaxTree, member: NodeId) -> String {
    let mut out = access(tree, member).to_string();
    if tree.has_flag(member, NodeFlags::STATIC) {
        out.push_str("static ");
    }
    if tree.has_flag(member, NodeFlags::OVERRIDE) {
        out.push_str("override ");
    }
    out
}

fn constructor_of(tree: &SyntaxTree, body: NodeId) -> Option<NodeId> {
    tree.children_with(body, Role::Member).find(|&member| {
        tree.kind(member) == K::Constructor && !tree.has_flag(member, NodeFlags::BODYLESS)
    })
}

/// Parameter properties become fields declared ahead of the first member.
fn class_body(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let properties: Vec<NodeId> = constructor_of(tree, node)
        .map(|ctor| {
            tree.children_with(ctor, Role::Param)
                .filter(|&param| tree.kind(param) == K::ParamProp)
                .collect()
        })
        .unwrap_or_default();
    if properties.is_empty() {
        return t.reassemble(node, ctx).map(Rewrite::Replace);
    }
    let mut fields = Vec::with_capacity(properties.len());
    for property in properties {
        fields.push(property_field(t, property, ctx)?);
    }
    let Some(first) = tree.child(node, Role::Member) else {
        return Ok(Rewrite::Replace(format!("{{ {} }}", fields.join(" "))));
    };
    let start = tree.span(node).map_or(0, |s| s.start);
    let first_start = tree.span(first).map_or(start, |s| s.start);
    let separator = if tree.slice(start, first_start).contains('\n') {
        format!("\n{}", t.indent(first))
    } else {
        " ".to_string()
    };
    let first_text = t.visit(first, ctx)?;
    let text = format!("{}{separator}{first_text}", fields.join(&separator));
    t.reassemble_with(node, ctx, &[(first, text)])
        .map(Rewrite::Replace)
}

fn property_binding(t: &Transformer<'_>, property: NodeId) -> RewriteResult<(NodeId, Option<NodeId>)> {
    let tree = t.tree();
    let pattern = t.required(property, Role::Name)?;
    Ok(match tree.kind(pattern) {
        K::AssignPat => (
            t.required(pattern, Role::Left)?,
            Some(t.required(pattern, Role::Default)?),
        ),
        _ => (pattern, None),
    })
}

fn property_field(
    t: &mut Transformer<'_>,
    property: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let (binding, default) = property_binding(t, property)?;
    let name = binding_name(t, binding)?;
    let ty = match annotation_type(t, binding, Role::TypeAnn, ctx)? {
        Some(ty) => ty,
        None => default.map_or("Dynamic", |d| inferred_type(t, d)).to_string(),
    };
    let keyword = if tree.has_flag(property, NodeFlags::READONLY) {
        "final"
    } else {
        "var"
    };
    Ok(format!("{}{keyword} {name}:{ty};", access(tree, property)))
}

/// Field type for an untyped member, from its initializer.
fn inferred_type(t: &Transformer<'_>, expr: NodeId) -> &'static str {
    let ty = t.type_of(expr);
    if ty.is_number() {
        "Float"
    } else if ty.is_string() {
        "String"
    } else if ty.is_boolean() {
        "Bool"
    } else {
        "Dynamic"
    }
}

fn is_overload(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.has_flag(node, NodeFlags::BODYLESS) && !tree.has_flag(node, NodeFlags::ABSTRACT)
}

fn drop_member(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(t.remove(node))
}

/// `public function new(..)`, assigning parameter properties after any leading `super(..)`.
fn constructor(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let body = t.required(node, Role::Body)?;
    let mut assignments = Vec::new();
    for property in tree.children_with(node, Role::Param) {
        if tree.kind(property) != K::ParamProp {
            continue;
        }
        let (binding, default) = property_binding(t, property)?;
        let name = binding_name(t, binding)?;
        let value = match default {
            Some(default) if !is_primitive_default(tree, default) => {
                format!("{name} ?? {}", t.visit(default, ctx.nested())?)
            }
            _ => name.to_string(),
        };
        assignments.push(format!("this.{name} = {value};"));
    }
    t.state.add_prologue(body, assignments);
    let text = function_text(t, node, Some("new"), ctx)?;
    Ok(Rewrite::Replace(format!("{}{text}", access(tree, node))))
}

fn has_unnamed_key(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Key)
        .is_some_and(|key| member_name(tree, key).is_none())
}

fn computed_member(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedMember,
        "computed member name",
    )))
}

fn is_generator(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().has_flag(node, NodeFlags::GENERATOR)
}

fn generator_method(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedSyntax,
        "generator method",
    )))
}

fn method_kind(tree: &SyntaxTree, node: NodeId) -> MethodKind {
    match tree.data(node) {
        NodeData::Method(kind) => *kind,
        _ => MethodKind::Method,
    }
}

fn is_accessor(t: &Transformer<'_>, node: NodeId) -> bool {
    method_kind(t.tree(), node) != MethodKind::Method
}

fn member_key<'a>(t: &Transformer<'a>, node: NodeId) -> RewriteResult<&'a str> {
    let tree = t.tree();
    let key = t.required(node, Role::Key)?;
    member_name(tree, key).ok_or_else(|| t.invariant(key, "member without a static name"))
}

/// The other half of a getter/setter pair, if the class declares one.
fn counterpart(t: &Transformer<'_>, node: NodeId, name: &str) -> Option<NodeId> {
    let tree = t.tree();
    let kind = method_kind(tree, node);
    let body = tree.parent(node)?;
    let is_static = tree.has_flag(node, NodeFlags::STATIC);
    tree.children_with(body, Role::Member).find(|&other| {
        other != node
            && tree.kind(other) == K::Method
            && !matches!(method_kind(tree, other), MethodKind::Method)
            && method_kind(tree, other) != kind
            && tree.has_flag(other, NodeFlags::STATIC) == is_static
            && tree
                .child(other, Role::Key)
                .and_then(|key| member_name(tree, key))
                == Some(name)
    })
}

/// `var x(get, set):T;` declared by whichever accessor comes first, followed
/// by `get_x`/`set_x` functions. Setters return the assigned value.
fn accessor(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let name = member_key(t, node)?;
    let kind = method_kind(tree, node);
    let other = counterpart(t, node, name);
    let (getter, setter) = match kind {
        MethodKind::Getter => (Some(node), other),
        _ => (other, Some(node)),
    };
    let modifiers = modifiers(tree, node);
    let decorators = decorators(t, node)?;

    let mut text = String::new();
    let declares_property = other.map_or(true, |other| {
        tree.span(node).map(|s| s.start) < tree.span(other).map(|s| s.start)
    });
    if declares_property {
        let ty = match getter {
            Some(getter) => annotation_type(t, getter, Role::ReturnType, ctx.nested())?,
            None => None,
        };
        let ty = match (ty, setter) {
            (Some(ty), _) => ty,
            (None, Some(setter)) => setter_value_type(t, setter, ctx)?,
            (None, None) => "Dynamic".to_string(),
        };
        let read = if getter.is_some() { "get" } else { "null" };
        let write = if setter.is_some() { "set" } else { "never" };
        text.push_str(&format!(
            "{decorators}{modifiers}var {name}({read}, {write}):{ty};\n{}",
            t.indent(node)
        ));
    }

    let function = match kind {
        MethodKind::Getter => function_text(t, node, Some(&format!("get_{name}")), ctx)?,
        _ => {
            let param = t
                .tree()
                .child(node, Role::Param)
                .and_then(|p| tree.child(p, Role::Name))
                .ok_or_else(|| t.invariant(node, "setter without a parameter"))?;
            let value = binding_name(t, param)?;
            let ty = setter_value_type(t, node, ctx)?;
            let params = t.visit_all(node, Role::Param, ctx.nested(), ", ")?;
            let body = t.visit(t.required(node, Role::Body)?, ctx.nested())?;
            let body = append_to_block(&body, &format!("return {value};"), tree.indent_unit());
            format!("function set_{name}({params}):{ty} {body}")
        }
    };
    text.push_str(&format!("{modifiers}{function}"));
    Ok(Rewrite::Replace(text))
}

fn setter_value_type(
    t: &mut Transformer<'_>,
    setter: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<String> {
    let tree = t.tree();
    let binding = tree
        .child(setter, Role::Param)
        .and_then(|p| tree.child(p, Role::Name));
    Ok(match binding {
        Some(binding) => annotation_type(t, binding, Role::TypeAnn, ctx.nested())?
            .unwrap_or_else(|| "Dynamic".to_string()),
        None => "Dynamic".to_string(),
    })
}

fn method(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let decorators = decorators(t, node)?;
    let name = member_key(t, node)?;
    let mut modifiers = modifiers(tree, node);
    if tree.has_flag(node, NodeFlags::ABSTRACT) {
        modifiers.push_str("abstract ");
    }
    let text = function_text(t, node, Some(name), ctx)?;
    Ok(Rewrite::Replace(format!("{decorators}{modifiers}{text}")))
}

fn is_declared(t: &Transformer<'_>, node: NodeId) -> bool {
    t.tree().has_flag(node, NodeFlags::DECLARE)
}

/// `public static final x:T = v;`. Optional fields become nullable.
fn class_property(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let ctx = ctx.nested();
    let decorators = decorators(t, node)?;
    let name = member_key(t, node)?;
    let init = tree.child(node, Role::Init);
    let ty = match annotation_type(t, node, Role::TypeAnn, ctx)? {
        Some(ty) if tree.has_flag(node, NodeFlags::OPTIONAL) && !ty.starts_with("Null<") => {
            Some(format!("Null<{ty}>"))
        }
        Some(ty) => Some(ty),
        None if init.is_none() => Some("Dynamic".to_string()),
        None => None,
    };
    let ty = ty.map(|ty| format!(":{ty}")).unwrap_or_default();
    let init = match init {
        Some(init) => format!(" = {}", t.visit(init, ctx)?),
        None => String::new(),
    };
    let keyword = if tree.has_flag(node, NodeFlags::READONLY) {
        "final"
    } else {
        "var"
    };
    Ok(Rewrite::Replace(format!(
        "{decorators}{}{keyword} {name}{ty}{init}{}",
        modifiers(tree, node),
        t.statement_end(node)
    )))
}

fn private_name_member(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedMember,
        "private name",
    )))
}

fn static_block(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedMember,
        "static initialization block",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{transpile, transpile_with};

    const POINT: &str = "class Point extends Base {
  static origin: Point;
  readonly x: number = 0;
  private cache?: string;
  constructor(public y: number, private z = 2) {
    super();
  }
  get len(): number {
    return this.y;
  }
  set len(v: number) {
    this.y = v;
  }
  move(dx: number): void {
    this.y += dx;
  }
}
";

    #[test]
    fn test_class_members() {
        assert_eq!(
            transpile(POINT),
            "class Point extends Base {
  public var y:Float;
  private var z:Float;
  public static var origin:Point;
  public final x:Float = 0;
  private var cache:Null<String>;
  public function new(y:Float, z = 2) {
    super();
    this.y = y;
    this.z = z;
  }
  public var len(get, set):Float;
  public function get_len():Float {
    return this.y;
  }
  public function set_len(v:Float):Float {
    this.y = v;
    return v;
  }
  public function move(dx:Float):Void {
    this.y += dx;
  }
}
"
        );
    }

    #[test]
    fn test_getter_only_property() {
        let out = transpile("class A {\n  get n(): number {\n    return 1;\n  }\n}\n");
        assert_eq!(
            out,
            "class A {\n  public var n(get, never):Float;\n  public function get_n():Float {\n    return 1;\n  }\n}\n"
        );
    }

    #[test]
    fn test_overloads_and_abstract_members() {
        let out = transpile(
            "abstract class A {\n  abstract area(): number;\n  f(a: string): void;\n  f(a: any) {}\n}\n",
        );
        assert_eq!(
            out,
            "abstract class A {\n  public abstract function area():Float;\n  public function f(a:Dynamic) {}\n}\n"
        );
    }

    #[test]
    fn test_non_primitive_property_default_moves_into_the_body() {
        let out = transpile("class A {\n  constructor(private xs: number[] = []) {}\n}\n");
        assert_eq!(
            out,
            "class A {\n  private var xs:Array<Float>;\n  public function new(?xs:Array<Float>) { this.xs = xs ?? []; }\n}\n"
        );
    }

    #[test]
    fn test_unsupported_members() {
        let output = transpile_with(
            "class A {\n  #secret = 1;\n  [key]() {}\n  static { init(); }\n}\n",
            |o| o,
        )
        .expect("transform");
        assert_eq!(
            output.body,
            "class A {\n  /* #secret = 1; */\n  /* [key]() {} */\n  /* static { init(); } */\n}\n"
        );
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedMember), 3);
    }
}
