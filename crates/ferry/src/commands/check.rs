//! Check command - runs the whole pipeline and reports, without writing

use anyhow::{anyhow, Result};
use clap::Args;
use ferry_diagnostics::{DiagnosticCode, Diagnostics};

use super::{emit_diagnostics, run_pipeline, PipelineArgs, Ui};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Codes that occurred, most frequent first.
fn code_counts(diagnostics: &Diagnostics) -> Vec<(DiagnosticCode, usize)> {
    let mut counts: Vec<_> = DiagnosticCode::ALL
        .into_iter()
        .map(|code| (code, diagnostics.count_of(code)))
        .filter(|(_, n)| *n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn run(args: CheckArgs, ui: Ui) -> Result<()> {
    let run = run_pipeline(&args.pipeline, None, ui)?;
    let diagnostics = &run.diagnostics;
    emit_diagnostics(diagnostics, &run.project.cache, ui)?;

    let units = run.results.len();
    let failed = run.failed_units() + run.project.skipped;
    let errors = diagnostics.error_count();
    let warnings = diagnostics.warning_count();
    let blocked = errors > 0 || failed > 0 || (args.strict && warnings > 0);

    match ui.format {
        OutputFormat::Text if !ui.quiet => {
            println!();
            for (code, n) in code_counts(diagnostics) {
                println!("  {code}  x{n}");
            }
            let style = |text: String, ok: bool| {
                if !ui.use_color {
                    text
                } else if ok {
                    console::style(text).green().bold().to_string()
                } else {
                    console::style(text).red().bold().to_string()
                }
            };
            if errors > 0 || failed > 0 {
                println!(
                    "{}: {} error(s), {} warning(s)",
                    style("Check failed".into(), false),
                    errors,
                    warnings
                );
            } else if warnings > 0 && args.strict {
                println!(
                    "{}: {} warning(s) (strict mode)",
                    style("Check failed".into(), false),
                    warnings
                );
            } else if warnings > 0 {
                println!("Check passed: {} warning(s) in {} unit(s)", warnings, units);
            } else {
                println!(
                    "{} - {} unit(s) checked",
                    style("All units transpile cleanly".into(), true),
                    units
                );
            }
        }
        OutputFormat::Json => {
            let codes: serde_json::Map<_, _> = code_counts(diagnostics)
                .into_iter()
                .map(|(code, n)| (code.to_string(), serde_json::json!(n)))
                .collect();
            let summary = serde_json::json!({
                "type": "summary",
                "success": !blocked,
                "units_checked": units,
                "failed": failed,
                "errors": errors,
                "warnings": warnings,
                "codes": codes,
            });
            println!("{}", serde_json::to_string(&summary)?);
        }
        OutputFormat::Text => {}
    }

    if blocked {
        Err(anyhow!("Check failed"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn check(input: &Path, strict: bool) -> Result<()> {
        let args = CheckArgs {
            pipeline: PipelineArgs {
                input: input.to_path_buf(),
                config: None,
                root_dir: None,
                either_arity_limit: None,
                jobs: Some(1),
                degrade: false,
            },
            strict,
        };
        let ui = Ui {
            format: OutputFormat::Text,
            use_color: false,
            quiet: true,
        };
        run(args, ui)
    }

    #[test]
    fn test_clean_project_passes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "const a: number = 1;\n").unwrap();
        check(dir.path(), true).unwrap();
    }

    #[test]
    fn test_warnings_fail_only_in_strict_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "debugger;\n").unwrap();
        check(dir.path(), false).unwrap();
        assert!(check(dir.path(), true).is_err());
    }

    #[test]
    fn test_nothing_is_written() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "let a = 1;\n").unwrap();
        check(dir.path(), false).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_code_counts_sorted_by_frequency() {
        let mut diagnostics = Diagnostics::new();
        for code in [
            DiagnosticCode::UnsupportedType,
            DiagnosticCode::UnsupportedSyntax,
            DiagnosticCode::UnsupportedType,
        ] {
            diagnostics.push(ferry_diagnostics::Diagnostic::warning(code, "x").build());
        }
        assert_eq!(
            code_counts(&diagnostics),
            vec![(DiagnosticCode::UnsupportedType, 2), (DiagnosticCode::UnsupportedSyntax, 1)]
        );
    }
}
