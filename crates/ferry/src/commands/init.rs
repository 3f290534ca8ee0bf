//! Init command - writes a default ferry.toml

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::Ui;
use crate::config::{CONFIG_FILE, DEFAULT_EITHER_ARITY_LIMIT};
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Directory holding the TypeScript sources
    #[arg(long, default_value = "src")]
    pub root_dir: String,

    /// Directory generated Haxe modules go to
    #[arg(long, default_value = "haxe")]
    pub out_dir: String,

    /// Replace an existing ferry.toml
    #[arg(long)]
    pub force: bool,
}

fn default_config(root_dir: &str, out_dir: &str) -> String {
    format!(
        r#"# ferry configuration

[project]
root_dir = "{root_dir}"
out_dir = "{out_dir}"

[transform]
# Unions wider than this become Dynamic.
either_arity_limit = {DEFAULT_EITHER_ARITY_LIMIT}
# Defaults to the number of available cores.
# max_workers = 8
degrade_on_error = false
"#
    )
}

pub fn run(args: InitArgs, ui: Ui) -> Result<()> {
    fs::create_dir_all(&args.path).with_context(|| format!("creating {}", args.path.display()))?;
    let project_path = args.path.canonicalize().unwrap_or(args.path.clone());
    let config_path = project_path.join(CONFIG_FILE);

    let created = if config_path.exists() && !args.force {
        false
    } else {
        fs::write(&config_path, default_config(&args.root_dir, &args.out_dir))
            .with_context(|| format!("writing {}", config_path.display()))?;
        true
    };

    match ui.format {
        OutputFormat::Text if !ui.quiet => {
            if created {
                println!("  Created {}", config_path.display());
                println!("\nNext: ferry transpile {}", project_path.join(&args.root_dir).display());
            } else {
                println!("  Skipped {CONFIG_FILE} (already exists, use --force to replace)");
            }
        }
        OutputFormat::Json => {
            let result = serde_json::json!({
                "success": true,
                "created": created,
                "path": config_path.to_string_lossy(),
            });
            println!("{}", serde_json::to_string(&result)?);
        }
        OutputFormat::Text => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FerryConfig;
    use tempfile::TempDir;

    fn init(path: PathBuf, force: bool) -> Result<()> {
        let args = InitArgs {
            path,
            root_dir: "lib".into(),
            out_dir: "gen".into(),
            force,
        };
        let ui = Ui {
            format: OutputFormat::Text,
            use_color: false,
            quiet: true,
        };
        run(args, ui)
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = TempDir::new().unwrap();
        init(dir.path().to_path_buf(), false).unwrap();
        let config = FerryConfig::load_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.project.root_dir, Some(PathBuf::from("lib")));
        assert_eq!(config.project.out_dir, Some(PathBuf::from("gen")));
        assert_eq!(config.transform.either_arity_limit, Some(DEFAULT_EITHER_ARITY_LIMIT));
        assert_eq!(config.transform.max_workers, None);
    }

    #[test]
    fn test_existing_config_is_kept_unless_forced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[project]\n").unwrap();
        init(dir.path().to_path_buf(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[project]\n");
        init(dir.path().to_path_buf(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("root_dir = \"lib\""));
    }
}
