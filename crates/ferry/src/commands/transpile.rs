//! Transpile command - writes one `.hx` module per TypeScript unit

use anyhow::{anyhow, Context, Result};
use clap::Args;
use ferry_transform::UnitOutput;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

use super::{emit_diagnostics, run_pipeline, PipelineArgs, Ui};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct TranspileArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output directory for generated modules
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print generated modules instead of writing them
    #[arg(long, conflicts_with = "diff")]
    pub stdout: bool,

    /// Show a unified diff against the modules already on disk
    #[arg(long)]
    pub diff: bool,
}

/// Where one unit's output went.
#[derive(Debug, PartialEq, Eq)]
enum Written {
    Created,
    Updated,
    Unchanged,
}

fn write_module(path: &Path, text: &str) -> Result<Written> {
    let previous = fs::read_to_string(path).ok();
    if previous.as_deref() == Some(text) {
        return Ok(Written::Unchanged);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(if previous.is_some() {
        Written::Updated
    } else {
        Written::Created
    })
}

/// Unified diff from the module on disk (empty when missing) to `text`.
fn module_diff(path: &Path, text: &str) -> Option<String> {
    let previous = fs::read_to_string(path).unwrap_or_default();
    if previous == text {
        return None;
    }
    let name = path.display().to_string();
    Some(
        TextDiff::from_lines(previous.as_str(), text)
            .unified_diff()
            .context_radius(3)
            .header(&name, &name)
            .to_string(),
    )
}

fn print_module(output: &UnitOutput) {
    println!("// {}", output.source_path.display());
    print!("{}", output.text());
}

pub fn run(args: TranspileArgs, ui: Ui) -> Result<()> {
    let run = run_pipeline(&args.pipeline, args.output.clone(), ui)?;
    let out_dir = &run.settings.out_dir;

    let mut written = 0;
    let mut unchanged = 0;
    let mut changed = 0;
    for output in run.results.iter().filter_map(|r| r.as_ref().ok()) {
        let dest = output.module.output_path(out_dir);
        if args.stdout {
            print_module(output);
        } else if args.diff {
            if let Some(diff) = module_diff(&dest, &output.text()) {
                print!("{diff}");
                changed += 1;
            }
        } else {
            match write_module(&dest, &output.text())? {
                Written::Unchanged => unchanged += 1,
                Written::Created | Written::Updated => {
                    log::debug!("wrote {}", dest.display());
                    written += 1;
                }
            }
        }
    }

    emit_diagnostics(&run.diagnostics, &run.project.cache, ui)?;

    let failed = run.failed_units() + run.project.skipped;
    let errors = run.diagnostics.error_count();
    let warnings = run.diagnostics.warning_count();
    match ui.format {
        OutputFormat::Text if !ui.quiet && !args.stdout => {
            let verb = if args.diff { "differ" } else { "written" };
            let count = if args.diff { changed } else { written };
            let line = format!(
                "{count} module(s) {verb}, {unchanged} unchanged, {failed} failed, {warnings} warning(s)"
            );
            if failed > 0 && ui.use_color {
                println!("{}", console::style(line).red().bold());
            } else if ui.use_color {
                println!("{}", console::style(line).green());
            } else {
                println!("{line}");
            }
            if !args.diff && written > 0 {
                println!("Output: {}", out_dir.display());
            }
        }
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "type": "summary",
                "success": failed == 0,
                "units": run.results.len(),
                "written": written,
                "unchanged": unchanged,
                "differ": changed,
                "failed": failed,
                "errors": errors,
                "warnings": warnings,
                "out_dir": out_dir.to_string_lossy(),
            });
            println!("{}", serde_json::to_string(&summary)?);
        }
        OutputFormat::Text => {}
    }

    if failed > 0 {
        Err(anyhow!("{failed} unit(s) could not be transpiled"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet_ui() -> Ui {
        Ui {
            format: OutputFormat::Text,
            use_color: false,
            quiet: true,
        }
    }

    fn args(input: &Path, output: &Path) -> TranspileArgs {
        TranspileArgs {
            pipeline: PipelineArgs {
                input: input.to_path_buf(),
                config: None,
                root_dir: None,
                either_arity_limit: None,
                jobs: Some(2),
                degrade: false,
            },
            output: Some(output.to_path_buf()),
            stdout: false,
            diff: false,
        }
    }

    #[test]
    fn test_writes_modules_under_their_packages() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        fs::create_dir_all(src.join("net")).unwrap();
        fs::write(src.join("net/http-client.ts"), "export const port = 80;\n").unwrap();
        fs::write(
            src.join("main.ts"),
            "import { port } from \"./net/http-client\";\nasync function get() { return port; }\n",
        )
        .unwrap();

        run(args(&src, &out), quiet_ui()).unwrap();

        let client = fs::read_to_string(out.join("net/HttpClient.hx")).unwrap();
        assert_eq!(client, "package net;\n\nfinal port = 80;\n");
        let main = fs::read_to_string(out.join("Main.hx")).unwrap();
        assert!(main.starts_with("import js.lib.Promise;\n\nimport net.HttpClient.port;\n"));
        assert!(main.contains("Promise.resolve(port)"));
    }

    #[test]
    fn test_parse_failure_fails_the_run_but_writes_the_rest() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        fs::write(dir.path().join("good.ts"), "let a = 1;\n").unwrap();
        fs::write(dir.path().join("bad.ts"), "let = ;\n").unwrap();

        assert!(run(args(dir.path(), &out), quiet_ui()).is_err());
        assert!(out.join("Good.hx").is_file());
        assert!(!out.join("Bad.hx").exists());
    }

    #[test]
    fn test_write_module_reports_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkg/A.hx");
        assert_eq!(write_module(&path, "a\n").unwrap(), Written::Created);
        assert_eq!(write_module(&path, "a\n").unwrap(), Written::Unchanged);
        assert_eq!(write_module(&path, "b\n").unwrap(), Written::Updated);
    }

    #[test]
    fn test_diff_against_existing_module() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.hx");
        fs::write(&path, "package;\n\nvar a = 1;\n").unwrap();
        assert_eq!(module_diff(&path, "package;\n\nvar a = 1;\n"), None);
        let diff = module_diff(&path, "package;\n\nvar a = 2;\n").unwrap();
        assert!(diff.contains("-var a = 1;"));
        assert!(diff.contains("+var a = 2;"));
    }
}
