//! Ferry - TypeScript to Haxe transpiler
//!
//! CLI driver: discovers sources, builds the program, runs the transform on a
//! worker pool and writes or reports the result.

mod commands;
mod config;
mod project;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// TypeScript to Haxe transpiler
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about = "Transpile TypeScript modules to Haxe")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transpile TypeScript file(s) to Haxe modules
    Transpile(commands::transpile::TranspileArgs),

    /// Report what would not transpile cleanly, without writing anything
    Check(commands::check::CheckArgs),

    /// Write a default ferry.toml
    Init(commands::init::InitArgs),

    /// Explain a diagnostic code
    Explain(commands::explain::ExplainArgs),
}

/// Log level implied by the verbosity flags. `RUST_LOG` still wins.
fn default_log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(cli.verbose, cli.quiet)),
    )
    .init();

    // Determine if colors should be used
    let use_color = !cli.no_color && !cli.quiet && atty::is(atty::Stream::Stdout);
    let ui = commands::Ui {
        format: cli.format,
        use_color,
        quiet: cli.quiet,
    };

    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Transpile(args) => commands::transpile::run(args, ui),
        Commands::Check(args) => commands::check::run(args, ui),
        Commands::Init(args) => commands::init::run(args, ui),
        Commands::Explain(args) => commands::explain::run(args, ui),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_follows_verbosity() {
        assert_eq!(default_log_filter(0, false), "warn");
        assert_eq!(default_log_filter(2, false), "debug");
        assert_eq!(default_log_filter(7, false), "trace");
        assert_eq!(default_log_filter(3, true), "error");
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ferry", "check", "src", "--format", "json", "-vv", "--strict"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Check(ref args)) if args.strict));
    }

    #[test]
    fn test_cli_is_well_formed() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }
}
