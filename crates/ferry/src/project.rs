//! Source discovery and program construction shared by `transpile` and `check`.

use anyhow::Result;
use ferry_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceCache};
use ferry_syntax::Program;
use ferry_transform::TransformError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ts") && !path.to_string_lossy().ends_with(".d.ts")
}

/// Every `.ts` file under `path`, skipping `node_modules` and declaration
/// files, in a stable order.
pub fn collect_ts_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if !is_source_file(path) {
            anyhow::bail!("{} is not a TypeScript source file", path.display());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && is_source_file(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// The directory an input names: itself, or the parent of a single file.
pub fn input_dir(input: &Path) -> PathBuf {
    let dir = if input.is_file() {
        input.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        input.to_path_buf()
    };
    dir.canonicalize().unwrap_or(dir)
}

/// Everything the front end produced for a set of files.
pub struct LoadedProject {
    pub program: Program,
    pub cache: SourceCache,
    /// Parse problems across all files.
    pub diagnostics: Diagnostics,
    /// Files that could not be read or did not parse.
    pub skipped: usize,
}

/// Parse, lower and bind `files` into one program.
pub fn load(files: &[PathBuf]) -> LoadedProject {
    let mut program = Program::new();
    let mut cache = SourceCache::new();
    let mut diagnostics = Diagnostics::new();
    let mut visited = HashSet::new();
    let mut skipped = 0;

    for file in files {
        let canonical = file.canonicalize().unwrap_or_else(|_| file.clone());
        if !visited.insert(canonical.clone()) {
            continue;
        }
        let source = match fs::read_to_string(&canonical) {
            Ok(source) => source,
            Err(err) => {
                log::warn!("could not read {}: {err}", canonical.display());
                skipped += 1;
                continue;
            }
        };
        if let Err(err) = program.add_source(&canonical, &source, &mut cache, &mut diagnostics) {
            log::debug!("{}: {err:#}", canonical.display());
            skipped += 1;
        }
    }
    log::info!("loaded {} unit(s), {} skipped", program.len(), skipped);

    LoadedProject {
        program,
        cache,
        diagnostics,
        skipped,
    }
}

/// A unit that failed outright, as a diagnostic for the report.
pub fn failure_diagnostic(path: &Path, err: &TransformError) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::InternalError, format!("{}: {err}", path.display()))
        .with_help("rerun with --degrade to keep going past rule failures")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_skips_declarations_and_node_modules() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/lib")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("src/main.ts"), "").unwrap();
        fs::write(root.join("src/lib/util.ts"), "").unwrap();
        fs::write(root.join("src/lib/types.d.ts"), "").unwrap();
        fs::write(root.join("src/readme.md"), "").unwrap();
        fs::write(root.join("node_modules/dep/index.ts"), "").unwrap();

        let files = collect_ts_files(root).unwrap();
        assert_eq!(files, vec![root.join("src/lib/util.ts"), root.join("src/main.ts")]);
    }

    #[test]
    fn test_single_file_input() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "").unwrap();
        assert_eq!(collect_ts_files(&file).unwrap(), vec![file.clone()]);
        assert_eq!(input_dir(&file), dir.path().canonicalize().unwrap());
        let other = dir.path().join("a.js");
        fs::write(&other, "").unwrap();
        assert!(collect_ts_files(&other).is_err());
    }

    #[test]
    fn test_load_counts_unparseable_files() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.ts");
        let bad = dir.path().join("bad.ts");
        fs::write(&good, "const a = 1;\n").unwrap();
        fs::write(&bad, "const = ;\n").unwrap();
        let project = load(&[good.clone(), bad, good]);
        assert_eq!(project.program.len(), 1);
        assert_eq!(project.skipped, 1);
        assert!(project.diagnostics.has_errors());
    }
}
