//! The ordered rule registry.
//!
//! Rules are tried in the order they are declared here and the first rule
//! whose guard accepts a node wins; later rules never see that node. More
//! specific rules for a kind are therefore listed before general ones.

mod decls;
mod expressions;
mod functions;
mod literals;
mod members;
mod module;
mod statements;
mod types;

use crate::context::RewriteContext;
use crate::engine::{RewriteResult, Transformer};
use ferry_syntax::{NodeData, Role, SyntaxKind, SyntaxTree};
use ferry_types::NodeId;
use std::collections::HashMap;
use std::sync::OnceLock;

pub(crate) use functions::{function_params, is_primitive_default};
pub(crate) use types::{annotation_type, type_text};

/// What a matched rule produced for its node.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Replacement for the node's whole text.
    Replace(String),
    /// Replacement for one direct child; the rest of the node is rebuilt structurally.
    ReplaceChild(NodeId, String),
}

pub type Guard = fn(&Transformer<'_>, NodeId) -> bool;
pub type Apply = fn(&mut Transformer<'_>, NodeId, RewriteContext) -> RewriteResult<Rewrite>;

pub struct Rule {
    pub name: &'static str,
    pub kinds: &'static [SyntaxKind],
    /// Structural check beyond the kind. Must not have side effects.
    pub guard: Guard,
    pub apply: Apply,
}

impl Rule {
    pub const fn new(
        name: &'static str,
        kinds: &'static [SyntaxKind],
        guard: Guard,
        apply: Apply,
    ) -> Self {
        Self {
            name,
            kinds,
            guard,
            apply,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("kinds", &self.kinds)
            .finish()
    }
}

/// Guard for rules that take every node of their kinds.
pub(crate) fn always(_: &Transformer<'_>, _: NodeId) -> bool {
    true
}

/// Name of a binding identifier, which every rule that asks for one needs.
pub(crate) fn binding_name<'a>(t: &Transformer<'a>, node: NodeId) -> RewriteResult<&'a str> {
    t.tree()
        .name(node)
        .ok_or_else(|| t.invariant(node, "expected a named node"))
}

/// A member key usable as a Haxe field name: identifiers and identifier-like strings.
pub(crate) fn member_name(tree: &SyntaxTree, key: NodeId) -> Option<&str> {
    match (tree.kind(key), tree.data(key)) {
        (SyntaxKind::PropIdent, NodeData::Name(name)) => Some(name),
        (SyntaxKind::String, NodeData::Str(value)) if is_identifier(value) => Some(value),
        _ => None,
    }
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Decorators of `node`, each commented out, with a trailing space when present.
pub(crate) fn decorators(t: &mut Transformer<'_>, node: NodeId) -> RewriteResult<String> {
    let text = t.visit_all(node, Role::Decorator, RewriteContext::default(), " ")?;
    Ok(if text.is_empty() { text } else { format!("{text} ") })
}

/// Every node below `node`, skipping whatever `enter` refuses to descend into.
pub(crate) fn descendants(
    tree: &SyntaxTree,
    node: NodeId,
    enter: impl Fn(SyntaxKind) -> bool,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(node).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        out.push(id);
        if enter(tree.kind(id)) {
            stack.extend(tree.children(id).iter().rev().copied());
        }
    }
    out
}

/// Add `statement` as the last line of a rendered block.
pub(crate) fn append_to_block(block: &str, statement: &str, unit: &str) -> String {
    let Some(close) = block.rfind('}') else {
        return format!("{block} {statement}");
    };
    let (before, after) = block.split_at(close);
    match before.rfind('\n').map(|i| i + 1) {
        Some(start) if before[start..].trim().is_empty() => {
            let indent = &before[start..];
            format!(
                "{}\n{indent}{unit}{statement}\n{indent}{after}",
                before[..start].trim_end()
            )
        }
        _ => format!("{} {statement} {after}", before.trim_end()),
    }
}

/// Rules indexed by kind, keeping declaration order within each kind.
#[derive(Debug)]
pub struct Registry {
    rules: Vec<&'static Rule>,
    by_kind: HashMap<SyntaxKind, Vec<usize>>,
}

impl Registry {
    pub fn new(rules: Vec<&'static Rule>) -> Self {
        let mut by_kind: HashMap<SyntaxKind, Vec<usize>> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            for kind in rule.kinds {
                by_kind.entry(*kind).or_default().push(index);
            }
        }
        Self { rules, by_kind }
    }

    /// The registry every transformer uses.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let groups: [&'static [Rule]; 8] = [
                module::RULES,
                decls::RULES,
                members::RULES,
                statements::RULES,
                functions::RULES,
                expressions::RULES,
                literals::RULES,
                types::RULES,
            ];
            Registry::new(groups.into_iter().flat_map(|g| g.iter()).collect())
        })
    }

    /// First rule, in declaration order, whose guard accepts `node`.
    pub fn first_match(&self, t: &Transformer<'_>, node: NodeId) -> Option<&'static Rule> {
        let kind = t.tree().kind(node);
        self.by_kind
            .get(&kind)?
            .iter()
            .map(|&index| self.rules[index])
            .find(|rule| (rule.guard)(t, node))
    }

    pub fn rules_for(&self, kind: SyntaxKind) -> impl Iterator<Item = &'static Rule> + '_ {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|&index| self.rules[index])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// How the engine treats a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// At least one rule rewrites it.
    Rewritten,
    /// Passes through the structural fallback.
    Structural,
    /// Always degraded to a comment (or `Dynamic` in type positions).
    Unsupported,
}

/// Exhaustive over [`SyntaxKind`]: adding a kind fails to compile until it is
/// classified here.
pub fn disposition(kind: SyntaxKind) -> Disposition {
    use Disposition::*;
    use SyntaxKind as K;
    match kind {
        K::Module | K::Block | K::VarStmt | K::FnDecl | K::ClassDecl | K::InterfaceDecl => {
            Rewritten
        }
        K::TypeAliasDecl | K::EnumDecl | K::If | K::While | K::DoWhile | K::For | K::ForIn => {
            Rewritten
        }
        K::ForOf | K::Return | K::Break | K::Continue | K::Try | K::Catch | K::Switch => Rewritten,
        K::Import | K::ExportDecl | K::ExportDefaultDecl | K::ExportNamed => Rewritten,
        K::ClassBody | K::ClassProp | K::Constructor | K::Method | K::Param | K::ParamProp => {
            Rewritten
        }
        K::BindingIdent | K::Ident | K::This | K::String | K::Number | K::Regex | K::Template => {
            Rewritten
        }
        K::ArrayLit | K::ShorthandProp | K::MethodProp | K::KeyValueProp | K::Spread => Rewritten,
        K::FnExpr | K::Arrow | K::Unary | K::Binary | K::Assign | K::OptChain | K::Call => {
            Rewritten
        }
        K::Member | K::New | K::Cond | K::Await | K::AsExpr | K::ConstAssertion => Rewritten,
        K::NonNull => Rewritten,
        K::TypeAssertion | K::Satisfies | K::Instantiation | K::TypeAnn | K::KeywordType => {
            Rewritten
        }
        K::TypeRef | K::TypeArgs | K::TypeParams | K::TypeParam | K::ArrayType | K::TupleType => {
            Rewritten
        }
        K::TupleElement | K::UnionType | K::IntersectionType | K::FnType | K::TypeLiteral => {
            Rewritten
        }
        K::PropertySignature | K::MethodSignature | K::LiteralType | K::TypeOperator => Rewritten,
        K::ParenType | K::OptionalType | K::RestType | K::TypePredicate => Rewritten,

        K::Empty | K::ExprStmt | K::Declarator | K::Throw | K::SwitchCase => Structural,
        K::InterfaceBody | K::EnumBody | K::EnumMember | K::Heritage => Structural,
        K::ImportNamed | K::ImportDefault | K::ImportNamespace | K::ExportSpecifier => Structural,
        K::ObjectPat | K::PatKeyValue | K::PatShorthand | K::RestPat | K::ArrayPat => Structural,
        K::AssignPat | K::Hole | K::Super | K::Null | K::Bool | K::TemplateElement => Structural,
        K::ObjectLit | K::Update | K::SuperMember | K::Paren | K::PropIdent => Structural,
        K::ComputedKey | K::QualifiedName | K::Separator => Structural,

        K::NamespaceDecl | K::Labeled | K::Debugger | K::With => Unsupported,
        K::ExportDefaultExpr | K::ExportAll | K::ImportEquals | K::ExportAssignment => Unsupported,
        K::PrivateProp | K::PrivateMethod | K::StaticBlock | K::IndexSignature => Unsupported,
        K::Decorator | K::BigInt | K::TaggedTemplate | K::GetterProp | K::SetterProp => {
            Unsupported
        }
        K::ClassExpr | K::Seq | K::Yield | K::MetaProp | K::PrivateName => Unsupported,
        K::ConstructorType | K::CallSignature | K::ConstructSignature => Unsupported,
        K::GetterSignature | K::SetterSignature | K::TypeQuery | K::ConditionalType => Unsupported,
        K::MappedType | K::IndexedAccessType | K::InferType | K::ThisType => Unsupported,
        K::ImportType | K::TemplateLiteralType | K::Opaque => Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_consistent_disposition() {
        let registry = Registry::global();
        for &kind in SyntaxKind::ALL {
            let rules = registry.rules_for(kind).count();
            match disposition(kind) {
                Disposition::Rewritten | Disposition::Unsupported => {
                    assert!(rules > 0, "{kind:?} has no rule");
                }
                Disposition::Structural => {
                    assert_eq!(rules, 0, "{kind:?} is structural but has rules");
                }
            }
        }
    }

    #[test]
    fn test_rule_names_are_unique() {
        let registry = Registry::global();
        let mut names: Vec<&str> = registry.rules.iter().map(|r| r.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_append_to_block() {
        assert_eq!(
            append_to_block("{\n    a();\n  }", "b();", "  "),
            "{\n    a();\n    b();\n  }"
        );
        assert_eq!(append_to_block("{ a(); }", "b();", "  "), "{ a(); b(); }");
        assert_eq!(append_to_block("{}", "b();", "  "), "{ b(); }");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("data-id"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_declaration_order_is_kept_per_kind() {
        let names: Vec<&str> = Registry::global()
            .rules_for(SyntaxKind::Binary)
            .map(|r| r.name)
            .collect();
        let typeof_at = names.iter().position(|n| *n == "typeof-comparison");
        let equality_at = names.iter().position(|n| *n == "strict-equality");
        assert!(typeof_at.expect("typeof rule") < equality_at.expect("equality rule"));
    }
}
