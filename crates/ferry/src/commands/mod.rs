//! CLI command implementations

pub mod check;
pub mod explain;
pub mod init;
pub mod transpile;

use anyhow::Result;
use clap::Args;
use ferry_diagnostics::{DiagnosticEmitter, Diagnostics, JsonEmitter, SourceCache, TerminalEmitter};
use ferry_transform::{transform_program, UnitResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::{FerryConfig, Overrides, Settings};
use crate::project::{self, LoadedProject};
use crate::OutputFormat;

/// How results are presented.
#[derive(Debug, Clone, Copy)]
pub struct Ui {
    pub format: OutputFormat,
    pub use_color: bool,
    pub quiet: bool,
}

impl Ui {
    /// Human-readable progress and summaries are wanted.
    pub fn chatty(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }
}

/// Inputs shared by every command that runs the transform.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Input TypeScript file or directory
    #[arg(default_value = ".")]
    pub input: PathBuf,

    /// Configuration file (default: nearest ferry.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory packages are computed against
    #[arg(long)]
    pub root_dir: Option<PathBuf>,

    /// Widest union folded into nested EitherType
    #[arg(long, value_name = "N")]
    pub either_arity_limit: Option<usize>,

    /// Units transformed at the same time
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Keep going past internal rule failures, marking them inline
    #[arg(long)]
    pub degrade: bool,
}

/// One finished run of the front end and the transform.
pub struct Run {
    pub settings: Settings,
    pub project: LoadedProject,
    pub results: Vec<UnitResult>,
    /// Parse, transform and failure diagnostics together.
    pub diagnostics: Diagnostics,
}

impl Run {
    pub fn failed_units(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

fn progress_bar(len: usize, ui: Ui) -> Result<ProgressBar> {
    if !ui.chatty() || !atty::is(atty::Stream::Stderr) {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?,
    );
    Ok(bar)
}

/// Discover, load and transform everything `args` names.
pub fn run_pipeline(args: &PipelineArgs, out_dir: Option<PathBuf>, ui: Ui) -> Result<Run> {
    let input_dir = project::input_dir(&args.input);
    let config = FerryConfig::locate(args.config.as_deref(), &input_dir)?;
    let overrides = Overrides {
        root_dir: args.root_dir.clone(),
        out_dir,
        either_arity_limit: args.either_arity_limit,
        max_workers: args.jobs,
        degrade_on_error: args.degrade,
    };
    let settings = config.resolve(&input_dir, &overrides)?;
    log::debug!("{:?}", settings.options);

    let files = project::collect_ts_files(&args.input)?;
    if ui.chatty() {
        println!("Reading {} file(s)...", files.len());
    }
    let loaded = project::load(&files);

    let bar = progress_bar(loaded.program.len(), ui)?;
    let results = transform_program(&loaded.program, &settings.options, |result| {
        if let Ok(output) = result {
            bar.set_message(output.module.qualified());
        }
        bar.inc(1);
    })?;
    bar.finish_and_clear();

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(loaded.diagnostics.iter().cloned());
    for (unit, result) in loaded.program.unit_ids().zip(&results) {
        match result {
            Ok(output) => diagnostics.extend(output.diagnostics.iter().cloned()),
            Err(err) => {
                let path = loaded
                    .program
                    .tree(unit)
                    .map(|tree| tree.path().to_path_buf())
                    .unwrap_or_default();
                diagnostics.push(project::failure_diagnostic(&path, err));
            }
        }
    }
    diagnostics.sort();

    Ok(Run {
        settings,
        project: loaded,
        results,
        diagnostics,
    })
}

/// Render diagnostics: a terminal report on stderr, or JSON lines on stdout.
pub fn emit_diagnostics(diagnostics: &Diagnostics, cache: &SourceCache, ui: Ui) -> Result<()> {
    let mut shown = Diagnostics::new();
    shown.extend(diagnostics.iter().filter(|d| !ui.quiet || d.is_error()).cloned());
    match ui.format {
        OutputFormat::Text => {
            let stderr = std::io::stderr();
            let mut emitter = TerminalEmitter::new(stderr.lock(), ui.use_color);
            emitter.emit_all(&shown, cache)?;
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(std::io::stdout().lock());
            emitter.emit_all(&shown, cache)?;
        }
    }
    Ok(())
}
