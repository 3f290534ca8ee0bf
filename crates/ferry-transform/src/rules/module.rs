//! The module root, imports and exports.

use super::decls::is_ambient;
use super::{always, Rewrite, Rule};
use crate::context::RewriteContext;
use crate::engine::{comment_out, RewriteResult, Transformer};
use crate::header::ModulePath;
use ferry_diagnostics::DiagnosticCode;
use ferry_syntax::{NodeData, Role, SyntaxKind as K};
use ferry_types::{NodeId, SymbolKind};

pub(super) const RULES: &[Rule] = &[
    Rule::new("module", &[K::Module], always, module),
    Rule::new("unsupported-import", &[K::Import], is_unsupported_import, unsupported_import),
    Rule::new("import", &[K::Import], always, import),
    Rule::new("import-equals", &[K::ImportEquals], always, import_equals),
    Rule::new("export-declaration", &[K::ExportDecl], always, export_declaration),
    Rule::new(
        "export-anonymous-default",
        &[K::ExportDefaultDecl],
        is_anonymous_default,
        unsupported_export,
    ),
    Rule::new("export-default-declaration", &[K::ExportDefaultDecl], always, export_declaration),
    Rule::new("re-export", &[K::ExportNamed], has_source, unsupported_export),
    Rule::new("export-list", &[K::ExportNamed], always, export_list),
    Rule::new(
        "unsupported-export",
        &[K::ExportAll, K::ExportDefaultExpr, K::ExportAssignment],
        always,
        unsupported_export,
    ),
];

fn module(t: &mut Transformer<'_>, node: NodeId, ctx: RewriteContext) -> RewriteResult<Rewrite> {
    log::debug!("{}: {} top-level item(s)", t.tree().path().display(), t.tree().children(node).len());
    t.reassemble(node, ctx.at_module_level()).map(Rewrite::Replace)
}

/// Side-effect and namespace imports have no Haxe form.
fn is_unsupported_import(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    let mut specifiers = tree.children_with(node, Role::Specifier).peekable();
    specifiers.peek().is_none() || specifiers.any(|s| tree.kind(s) == K::ImportNamespace)
}

fn unsupported_import(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let what = if t.tree().child(node, Role::Specifier).is_some() {
        "namespace import"
    } else {
        "side-effect import"
    };
    Ok(Rewrite::Replace(t.degrade(node, DiagnosticCode::UnsupportedImport, what)))
}

/// What one import specifier becomes.
enum ImportTarget {
    /// `import pkg.Module.Name [as Local];`
    Module(String),
    /// Bound by the standard library; nothing to import.
    Library,
    Unresolved,
}

fn import_target(t: &Transformer<'_>, spec: NodeId) -> ImportTarget {
    let tree = t.tree();
    let oracle = t.oracle();
    let NodeData::Specifier { local, .. } = tree.data(spec) else {
        return ImportTarget::Unresolved;
    };
    let Some(symbol) = t.symbol_of(spec) else {
        return ImportTarget::Unresolved;
    };
    let root = oracle.resolve_alias(symbol);
    if oracle.is_from_standard_library(root) {
        return ImportTarget::Library;
    }
    let Some(info) = oracle.symbol_info(root) else {
        return ImportTarget::Unresolved;
    };
    if info.kind == SymbolKind::Import {
        return ImportTarget::Unresolved;
    }
    let Some(path) = oracle.unit_path(root.unit) else {
        return ImportTarget::Unresolved;
    };
    let module = ModulePath::from_unit_path(&t.options().root_dir, path);
    let qualified = if info.name == module.module {
        module.qualified()
    } else {
        format!("{}.{}", module.qualified(), info.name)
    };
    ImportTarget::Module(if *local == info.name {
        format!("import {qualified};")
    } else {
        format!("import {qualified} as {local};")
    })
}

/// One Haxe import per specifier, computed from the declaring unit of the
/// alias-resolved symbol.
fn import(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    let tree = t.tree();
    let source = match tree.data(node) {
        NodeData::Source(source) => source.as_str(),
        _ => "",
    };
    let mut lines = Vec::new();
    for spec in tree.children_with(node, Role::Specifier) {
        match import_target(t, spec) {
            ImportTarget::Module(line) => lines.push(line),
            ImportTarget::Library => {}
            ImportTarget::Unresolved => {
                let text = tree.text(spec);
                t.report(
                    spec,
                    DiagnosticCode::UnresolvedImport,
                    format!("`{text}` from \"{source}\" does not resolve to a project file"),
                );
                lines.push(comment_out(&format!("import {text} from \"{source}\"")));
            }
        }
    }
    if lines.is_empty() {
        return Ok(t.remove(node));
    }
    let separator = format!("\n{}", t.indent(node));
    Ok(Rewrite::Replace(lines.join(&separator)))
}

fn import_equals(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(Rewrite::Replace(t.degrade(
        node,
        DiagnosticCode::UnsupportedImport,
        "`import x = require(..)`",
    )))
}

/// The declaration without its `export`; ambient ones go with it.
fn export_declaration(
    t: &mut Transformer<'_>,
    node: NodeId,
    ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let decl = t.required(node, Role::Declaration)?;
    if is_ambient(t.tree(), decl) {
        return Ok(t.remove(node));
    }
    t.visit(decl, ctx).map(Rewrite::Replace)
}

fn is_anonymous_default(t: &Transformer<'_>, node: NodeId) -> bool {
    let tree = t.tree();
    tree.child(node, Role::Declaration)
        .is_some_and(|decl| tree.child(decl, Role::Name).is_none())
}

fn has_source(t: &Transformer<'_>, node: NodeId) -> bool {
    matches!(t.tree().data(node), NodeData::Source(_))
}

fn unsupported_export(
    t: &mut Transformer<'_>,
    node: NodeId,
    _ctx: RewriteContext,
) -> RewriteResult<Rewrite> {
    let what = match t.tree().kind(node) {
        K::ExportAll => "`export *`",
        K::ExportNamed => "re-export",
        K::ExportAssignment => "`export =`",
        K::ExportDefaultDecl => "anonymous default export",
        _ => "default export of an expression",
    };
    Ok(Rewrite::Replace(t.degrade(node, DiagnosticCode::UnsupportedExport, what)))
}

/// Haxe module fields are public already.
fn export_list(t: &mut Transformer<'_>, node: NodeId, _ctx: RewriteContext) -> RewriteResult<Rewrite> {
    Ok(t.remove(node))
}

#[cfg(test)]
mod tests {
    use crate::options::TransformOptions;
    use crate::test_support::transpile_with;
    use crate::{transform, UnitOutput};
    use ferry_diagnostics::{DiagnosticCode, Diagnostics, SourceCache};
    use ferry_syntax::Program;
    use std::path::Path;

    /// Transform `main` with the other files registered alongside it.
    fn transpile_project(files: &[(&str, &str)], main: &str) -> UnitOutput {
        let mut program = Program::new();
        let mut cache = SourceCache::new();
        let mut sink = Diagnostics::new();
        let mut main_unit = None;
        for (path, source) in files {
            let unit = program
                .add_source(Path::new(path), source, &mut cache, &mut sink)
                .expect("parse");
            if *path == main {
                main_unit = Some(unit);
            }
        }
        let unit = main_unit.expect("main unit registered");
        let tree = program.tree(unit).expect("tree");
        let options = TransformOptions::new("src", 4, 1);
        transform(tree, &program, &options).expect("transform")
    }

    #[test]
    fn test_imports_follow_aliases_to_the_declaring_unit() {
        let output = transpile_project(
            &[
                ("src/util/strings.ts", "export function pad(s: string) { return s; }\n"),
                ("src/util/index.ts", "export { pad } from \"./strings\";\n"),
                ("src/model/user-record.ts", "export class UserRecord {}\nexport interface Id { id: string; }\n"),
                (
                    "src/main.ts",
                    "import { pad as p } from \"./util\";\nimport { UserRecord, type Id } from \"./model/user-record\";\np(\"a\");\n",
                ),
            ],
            "src/main.ts",
        );
        assert_eq!(
            output.body,
            "import util.Strings.pad as p;\nimport model.UserRecord;\nimport model.UserRecord.Id;\np(\"a\");\n"
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_import_is_reported() {
        let output = transpile_with("import { h } from \"preact\";\nh();\n", |o| o).expect("transform");
        assert_eq!(output.body, "/* import h from \"preact\" */\nh();\n");
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnresolvedImport), 1);
    }

    #[test]
    fn test_unsupported_imports_and_exports() {
        let output = transpile_with(
            "import * as fs from \"fs\";\nimport \"./polyfill\";\nexport * from \"./a\";\nexport default 42;\n",
            |o| o,
        )
        .expect("transform");
        assert_eq!(
            output.body,
            "/* import * as fs from \"fs\"; */\n/* import \"./polyfill\"; */\n/* export * from \"./a\"; */\n/* export default 42; */\n"
        );
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedImport), 2);
        assert_eq!(output.diagnostics.count_of(DiagnosticCode::UnsupportedExport), 2);
    }

    #[test]
    fn test_exports_are_stripped() {
        let output = transpile_with(
            "export const a = 1;\nexport declare const b: number;\nexport function f(): void {}\nexport { a as c };\nexport default class K {}\n",
            |o| o,
        )
        .expect("transform");
        assert_eq!(output.body, "final a = 1;\nfunction f():Void {}\nclass K {}\n");
    }
}
