//! The rule-driven visitor.
//!
//! `visit` asks the registry for the first rule whose guard accepts a node and
//! lets it produce the node's text. Nodes no rule claims are rebuilt from their
//! children plus the source text between them, so whatever the rules leave
//! alone (comments, whitespace, punctuation) comes out byte for byte.

use crate::context::RewriteContext;
use crate::error::TransformError;
use crate::options::TransformOptions;
use crate::rename::BindingKey;
use crate::rules::{Registry, Rewrite, Rule};
use crate::state::{Helper, UnitPassState};
use ferry_diagnostics::{Diagnostic, DiagnosticCode};
use ferry_syntax::{is_ident_char, NodeFlags, Role, SyntaxKind, SyntaxTree};
use ferry_types::{NodeId, SymbolId, TypeDescriptor, TypeOracle};

pub type RewriteResult<T> = Result<T, TransformError>;

/// Transforms one unit. Owns the unit's pass state for the duration of the pass.
pub struct Transformer<'a> {
    tree: &'a SyntaxTree,
    oracle: &'a dyn TypeOracle,
    options: &'a TransformOptions,
    registry: &'static Registry,
    pub(crate) state: UnitPassState,
}

impl<'a> Transformer<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        oracle: &'a dyn TypeOracle,
        options: &'a TransformOptions,
    ) -> Self {
        let mut state = UnitPassState::new();
        for id in tree.ids() {
            if matches!(tree.kind(id), SyntaxKind::BindingIdent | SyntaxKind::Ident) {
                if let Some(name) = tree.name(id) {
                    state.renames.reserve(name);
                }
            }
        }
        Self {
            tree,
            oracle,
            options,
            registry: Registry::global(),
            state,
        }
    }

    /// Transform the whole unit, returning its text and the final pass state.
    pub fn run(mut self) -> RewriteResult<(String, UnitPassState)> {
        let root = self.tree.root();
        let text = self.visit(root, RewriteContext::default())?;
        Ok((text, self.state))
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn oracle(&self) -> &'a dyn TypeOracle {
        self.oracle
    }

    pub fn options(&self) -> &'a TransformOptions {
        self.options
    }

    pub fn visit(&mut self, node: NodeId, ctx: RewriteContext) -> RewriteResult<String> {
        if self.state.suppressed.contains(&node) {
            return Ok(self.placeholder(node).to_string());
        }
        let Some(rule) = self.registry.first_match(self, node) else {
            return self.reassemble(node, ctx);
        };
        log::trace!("{} matched {:?} {}", rule.name, self.tree.kind(node), node);
        match (rule.apply)(self, node, ctx) {
            Ok(Rewrite::Replace(text)) => Ok(text),
            Ok(Rewrite::ReplaceChild(child, text)) => {
                self.reassemble_with(node, ctx, &[(child, text)])
            }
            Err(err) => self.recover(node, rule, err),
        }
    }

    /// Visit the first child with `role`, or produce nothing.
    pub fn visit_child(
        &mut self,
        node: NodeId,
        role: Role,
        ctx: RewriteContext,
    ) -> RewriteResult<String> {
        match self.tree.child(node, role) {
            Some(child) => self.visit(child, ctx),
            None => Ok(String::new()),
        }
    }

    /// Visit every child with `role` and join the non-empty results.
    pub fn visit_all(
        &mut self,
        node: NodeId,
        role: Role,
        ctx: RewriteContext,
        separator: &str,
    ) -> RewriteResult<String> {
        let tree = self.tree;
        let mut parts = Vec::new();
        for child in tree.children_with(node, role) {
            let text = self.visit(child, ctx)?;
            if !text.is_empty() {
                parts.push(text);
            }
        }
        Ok(parts.join(separator))
    }

    /// The structural fallback: children in order, source gaps between them.
    pub fn reassemble(&mut self, node: NodeId, ctx: RewriteContext) -> RewriteResult<String> {
        self.reassemble_with(node, ctx, &[])
    }

    /// Structural rebuild with some direct children replaced by given text.
    pub fn reassemble_with(
        &mut self,
        node: NodeId,
        ctx: RewriteContext,
        overrides: &[(NodeId, String)],
    ) -> RewriteResult<String> {
        let tree = self.tree;
        let Some(span) = tree.span(node) else {
            return Ok(String::new());
        };
        let mut out = String::new();
        let mut cursor = span.start;
        let mut rebuilt = false;
        let mut leading_removed = false;
        for &child in tree.children(node) {
            let Some(child_span) = tree.span(child) else {
                continue;
            };
            rebuilt = true;
            let text = match overrides.iter().find(|(id, _)| *id == child) {
                Some((_, text)) => text.clone(),
                None => self.visit(child, ctx)?,
            };
            let mut gap = tree.slice(cursor, child_span.start);
            // Nothing precedes a removed first line, so its own line break goes.
            if leading_removed {
                gap = gap.strip_prefix("\r\n").or_else(|| gap.strip_prefix('\n')).unwrap_or(gap);
            }
            let removed = self.state.full_text_replace.contains(&child) && text.is_empty();
            if self.state.full_text_replace.contains(&child) {
                out.push_str(line_gap(gap, text.is_empty()));
            } else {
                out.push_str(gap);
            }
            leading_removed = removed && out.is_empty();
            out.push_str(&text);
            cursor = child_span.end;
        }
        if !rebuilt {
            return Ok(tree.text(node).to_string());
        }
        out.push_str(tree.slice(cursor, span.end));
        Ok(out)
    }

    /// Keeps tokens apart when a suppressed node sat between two identifier characters.
    fn placeholder(&self, node: NodeId) -> &'static str {
        let Some(span) = self.tree.span(node) else {
            return "";
        };
        let source = self.tree.source();
        let before = self.tree.slice(0, span.start).chars().next_back();
        let after = source
            .get(span.end as usize..)
            .and_then(|rest| rest.chars().next());
        match (before, after) {
            (Some(b), Some(a)) if is_ident_char(b) && is_ident_char(a) => " ",
            _ => "",
        }
    }

    fn recover(&mut self, node: NodeId, rule: &Rule, err: TransformError) -> RewriteResult<String> {
        if !(self.options.degrade_on_error && err.is_invariant()) {
            return Err(err);
        }
        log::warn!("rule `{}` failed, keeping the original text: {err}", rule.name);
        let diagnostic = Diagnostic::new(
            DiagnosticCode::InternalError,
            format!("rule `{}` failed: {err}", rule.name),
        )
        .with_span(self.tree.diag_span(node))
        .build();
        self.state.diagnostics.push(diagnostic);
        Ok(format!(
            "/* ferry: {} failed */ {}",
            rule.name,
            self.tree.text(node)
        ))
    }

    // Registrations

    /// Emit nothing for `node` when it is reached.
    pub fn suppress(&mut self, node: NodeId) {
        self.state.suppressed.insert(node);
    }

    /// Drop `node` together with the line it sat on.
    pub fn remove(&mut self, node: NodeId) -> Rewrite {
        self.state.full_text_replace.insert(node);
        Rewrite::Replace(String::new())
    }

    pub fn use_helper(&mut self, helper: Helper) {
        self.state.helpers.insert(helper);
    }

    pub fn rename(&mut self, base: &str, key: BindingKey) -> String {
        self.state.renames.request(base, key)
    }

    // Diagnostics and degradation

    pub fn report(&mut self, node: NodeId, code: DiagnosticCode, message: impl Into<String>) {
        let message = message.into();
        let (line, column) = self.tree.location(node);
        log::debug!(
            "{}:{line}:{column}: {code}: {message}",
            self.tree.path().display()
        );
        let diagnostic = Diagnostic::new(code, message)
            .with_span(self.tree.diag_span(node))
            .build();
        self.state.diagnostics.push(diagnostic);
    }

    /// Comment `node` out and report it.
    pub fn degrade(&mut self, node: NodeId, code: DiagnosticCode, what: &str) -> String {
        self.report(node, code, format!("{what} is not supported"));
        comment_out(self.tree.text(node))
    }

    /// Like [`degrade`](Self::degrade), and when `node` is a list element
    /// followed by another element, also swallow the separator after it.
    pub fn unsupported(&mut self, node: NodeId, code: DiagnosticCode, what: &str) -> String {
        let text = self.degrade(node, code, what);
        self.swallow_separator(node);
        text
    }

    /// Type positions keep a type: `Dynamic` followed by the commented original.
    pub fn unsupported_type(&mut self, node: NodeId) -> String {
        let text = self.tree.text(node);
        self.report(
            node,
            DiagnosticCode::UnsupportedType,
            format!("type `{}` has no Haxe counterpart", first_line(text)),
        );
        format!("Dynamic {}", comment_out(text))
    }

    fn swallow_separator(&mut self, node: NodeId) {
        let tree = self.tree;
        let mut following = tree.following_siblings(node);
        if let Some(next) = following.next() {
            if tree.kind(next) == SyntaxKind::Separator
                && following.any(|s| tree.kind(s) != SyntaxKind::Separator)
            {
                self.suppress(next);
            }
        }
    }

    pub fn invariant(&self, node: NodeId, message: impl Into<String>) -> TransformError {
        let (line, column) = self.tree.location(node);
        TransformError::Invariant {
            unit: self.tree.path().display().to_string(),
            line,
            column,
            kind: self.tree.kind(node),
            message: message.into(),
        }
    }

    /// The child with `role`, which the rule cannot do without.
    pub fn required(&self, node: NodeId, role: Role) -> RewriteResult<NodeId> {
        self.tree
            .child(node, role)
            .ok_or_else(|| self.invariant(node, format!("missing {role:?} child")))
    }

    // Queries

    pub fn type_of(&self, node: NodeId) -> TypeDescriptor {
        self.oracle.resolve_type(self.tree.unit(), node)
    }

    pub fn symbol_of(&self, node: NodeId) -> Option<SymbolId> {
        self.oracle.resolve_symbol(self.tree.unit(), node)
    }

    /// Global name an identifier refers to, when it is a standard library global.
    pub fn library_name(&self, node: NodeId) -> Option<String> {
        if self.tree.kind(node) != SyntaxKind::Ident {
            return None;
        }
        let symbol = self.symbol_of(node)?;
        if !self.oracle.is_from_standard_library(symbol) {
            return None;
        }
        self.oracle.symbol_info(symbol).map(|info| info.name)
    }

    /// `Global.member` for a non-computed member access on a library global.
    pub fn library_member(&self, node: NodeId) -> Option<(String, &'a str)> {
        let tree = self.tree;
        if tree.kind(node) != SyntaxKind::Member || tree.has_flag(node, NodeFlags::COMPUTED) {
            return None;
        }
        let global = self.library_name(tree.child(node, Role::Object)?)?;
        let property = tree.name(tree.child(node, Role::Property)?)?;
        Some((global, property))
    }

    /// `;` unless the node's own text already ended in one that stays in the source.
    pub fn statement_end(&self, node: NodeId) -> &'static str {
        if self.tree.text(node).ends_with(';') {
            ";"
        } else if self.tree.next_significant_char(node) == Some(';') {
            ""
        } else {
            ";"
        }
    }

    /// Indentation of the line `node` starts on.
    pub fn indent(&self, node: NodeId) -> &'a str {
        self.tree.line_indent(node)
    }

    /// One level deeper than `node`'s line.
    pub fn inner_indent(&self, node: NodeId) -> String {
        format!("{}{}", self.tree.line_indent(node), self.tree.indent_unit())
    }
}

/// Leading trivia of a full-text-replace node: indentation is never kept, and
/// the line break goes too when the node produced nothing.
fn line_gap(gap: &str, removed: bool) -> &str {
    let trimmed = gap.trim_end_matches([' ', '\t']);
    if !removed {
        return trimmed;
    }
    let without_newline = trimmed.strip_suffix('\n').unwrap_or(trimmed);
    without_newline.strip_suffix('\r').unwrap_or(without_newline)
}

pub(crate) fn comment_out(text: &str) -> String {
    format!("/* {} */", text.replace("*/", "*\\/"))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parse, transpile, transpile_with};
    use ferry_diagnostics::DiagnosticCode;

    #[test]
    fn test_untouched_code_is_byte_identical() {
        let source = "// leading comment\nfoo(a, /* inline */ b);\n\n  bar [ 1 ]  ;\n";
        assert_eq!(transpile(source), source);
    }

    #[test]
    fn test_structural_rebuild_keeps_trivia_around_rewrites() {
        let out = transpile("if (a === b) { /* keep */ go(); }\n");
        assert_eq!(out, "if (a == b) { /* keep */ go(); }\n");
    }

    #[test]
    fn test_unsupported_element_swallows_one_separator() {
        let out = transpile("const xs = [1, ...rest, 2];\n");
        assert_eq!(out, "final xs = [1, /* ...rest */ 2];\n");
    }

    #[test]
    fn test_last_element_keeps_preceding_separator() {
        let out = transpile("const xs = [1, ...rest];\n");
        assert_eq!(out, "final xs = [1, /* ...rest */];\n");
    }

    #[test]
    fn test_trailing_separator_is_not_swallowed_for_last_element() {
        let out = transpile("const xs = [1, ...rest,];\n");
        assert_eq!(out, "final xs = [1, /* ...rest */,];\n");
    }

    #[test]
    fn test_unsupported_reports_location() {
        let output = transpile_with("let a = 1;\nlabel: for (;;) {}\n", |o| o);
        let diagnostics = output.expect("transform").diagnostics;
        assert_eq!(diagnostics.count_of(DiagnosticCode::UnsupportedControlFlow), 1);
        let diagnostic = diagnostics.iter().next().expect("one diagnostic");
        assert_eq!(diagnostic.span.start, 11);
    }

    #[test]
    fn test_comment_out_escapes_terminator() {
        assert_eq!(comment_out("a */ b"), "/* a *\\/ b */");
    }

    #[test]
    fn test_line_gap() {
        assert_eq!(line_gap("\n    ", true), "");
        assert_eq!(line_gap("a;\r\n  ", true), "a;");
        assert_eq!(line_gap("\n    ", false), "\n");
        assert_eq!(line_gap(" ", true), "");
    }

    fn failing_call(
        t: &mut Transformer<'_>,
        node: NodeId,
        _: RewriteContext,
    ) -> RewriteResult<Rewrite> {
        Err(t.invariant(node, "boom"))
    }

    static FAILING_CALL: Rule =
        Rule::new("failing-call", &[SyntaxKind::Call], |_, _| true, failing_call);

    fn run_failing(degrade: bool) -> RewriteResult<(String, UnitPassState)> {
        let (program, unit) = parse("let a = 1;\nfoo(a);\n");
        let tree = program.tree(unit).expect("tree");
        let options = TransformOptions::new("src", 4, 1).with_degrade_on_error(degrade);
        let mut transformer = Transformer::new(tree, &program, &options);
        transformer.registry = Box::leak(Box::new(Registry::new(vec![&FAILING_CALL])));
        transformer.run()
    }

    #[test]
    fn test_rule_failure_fails_the_unit_by_default() {
        match run_failing(false) {
            Err(TransformError::Invariant { line, kind, message, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(kind, SyntaxKind::Call);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_degrade_marks_failed_node_and_reports() {
        let (text, state) = run_failing(true).expect("degraded transform succeeds");
        assert_eq!(text, "let a = 1;\n/* ferry: failing-call failed */ foo(a);\n");
        assert_eq!(state.diagnostics.count_of(DiagnosticCode::InternalError), 1);
        assert_eq!(state.diagnostics.len(), 1);
    }

    #[test]
    fn test_invariant_carries_location() {
        let (program, unit) = parse("function f() {\n  return;\n}\n");
        let tree = program.tree(unit).expect("tree");
        let options = TransformOptions::new("src", 4, 1);
        let transformer = Transformer::new(tree, &program, &options);
        let ret = tree
            .ids()
            .find(|&id| tree.kind(id) == SyntaxKind::Return)
            .expect("return");
        match transformer.invariant(ret, "boom") {
            TransformError::Invariant { line, column, kind, .. } => {
                assert_eq!((line, column), (2, 3));
                assert_eq!(kind, SyntaxKind::Return);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
