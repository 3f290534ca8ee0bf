//! Package and import lines of an emitted module.

use crate::state::Helper;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Where a unit lives in the Haxe module tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath {
    pub package: Vec<String>,
    pub module: String,
}

impl ModulePath {
    /// Derive the package from the directories between `root` and the unit and
    /// the module name from its file stem. Paths outside `root` are taken as they are.
    pub fn from_unit_path(root: &Path, path: &Path) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let mut package = Vec::new();
        if let Some(dir) = relative.parent() {
            for component in dir.components() {
                if let Component::Normal(segment) = component {
                    package.push(package_segment(&segment.to_string_lossy()));
                }
            }
        }
        let file = relative
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file
            .strip_suffix(".d.ts")
            .or_else(|| file.strip_suffix(".ts"))
            .unwrap_or(&file);
        Self {
            package,
            module: module_name(stem),
        }
    }

    /// `pkg.sub.Module`
    pub fn qualified(&self) -> String {
        let mut parts = self.package.clone();
        parts.push(self.module.clone());
        parts.join(".")
    }

    /// Units directly under the root live in the default package and get no line.
    pub fn package_decl(&self) -> Option<String> {
        (!self.package.is_empty()).then(|| format!("package {};", self.package.join(".")))
    }

    pub fn output_path(&self, out_dir: &Path) -> PathBuf {
        let mut path = out_dir.to_path_buf();
        for segment in &self.package {
            path.push(segment);
        }
        path.push(format!("{}.hx", self.module));
        path
    }
}

/// Lower-case identifier: anything else becomes `_`.
fn package_segment(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// PascalCase of the words in a file stem.
fn module_name(stem: &str) -> String {
    let mut out = String::new();
    for word in stem.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() {
        return "Main".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'M');
    }
    out
}

/// Package line, then the helper imports the pass used, each group followed by a blank line.
pub fn render_header(module: &ModulePath, helpers: &BTreeSet<Helper>) -> String {
    let mut out = String::new();
    if let Some(decl) = module.package_decl() {
        out.push_str(&decl);
        out.push_str("\n\n");
    }
    let mut imports: Vec<&str> = helpers.iter().map(|h| h.import_path()).collect();
    imports.sort_unstable();
    imports.dedup();
    if !imports.is_empty() {
        for import in imports {
            out.push_str(&format!("import {import};\n"));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_from_directories() {
        let path = ModulePath::from_unit_path(Path::new("src"), Path::new("src/Net/http-client/fetch_utils.ts"));
        assert_eq!(path.package, vec!["net", "http_client"]);
        assert_eq!(path.module, "FetchUtils");
        assert_eq!(path.qualified(), "net.http_client.FetchUtils");
        assert_eq!(path.package_decl().as_deref(), Some("package net.http_client;"));
    }

    #[test]
    fn test_root_units_have_an_empty_package() {
        let path = ModulePath::from_unit_path(Path::new("src"), Path::new("src/main.ts"));
        assert!(path.package.is_empty());
        assert_eq!(path.package_decl(), None);
        assert_eq!(path.qualified(), "Main");
        assert_eq!(path.output_path(Path::new("out")), PathBuf::from("out/Main.hx"));
    }

    #[test]
    fn test_awkward_names() {
        assert_eq!(module_name("2d-vector"), "M2dVector");
        assert_eq!(module_name("index"), "Index");
        assert_eq!(package_segment("3rd"), "_3rd");
        let path = ModulePath::from_unit_path(Path::new("src"), Path::new("src/a/types.d.ts"));
        assert_eq!(path.qualified(), "a.Types");
    }

    #[test]
    fn test_header_lists_used_helpers_sorted() {
        let module = ModulePath::from_unit_path(Path::new("src"), Path::new("src/app/main.ts"));
        let helpers: BTreeSet<Helper> = [Helper::Promise, Helper::Helpers, Helper::EitherType]
            .into_iter()
            .collect();
        assert_eq!(
            render_header(&module, &helpers),
            "package app;\n\nimport ferry.Helpers;\nimport haxe.extern.EitherType;\nimport js.lib.Promise;\n\n"
        );
        assert_eq!(render_header(&module, &BTreeSet::new()), "package app;\n\n");
    }

    #[test]
    fn test_root_header_has_no_package_line() {
        let module = ModulePath::from_unit_path(Path::new("src"), Path::new("src/main.ts"));
        let helpers: BTreeSet<Helper> = [Helper::Promise].into_iter().collect();
        assert_eq!(render_header(&module, &helpers), "import js.lib.Promise;\n\n");
        assert_eq!(render_header(&module, &BTreeSet::new()), "");
    }
}
