//! `ferry.toml` loading and resolution into transform options.
//!
//! ```toml
//! [project]
//! root_dir = "src"
//! out_dir = "haxe"
//!
//! [transform]
//! either_arity_limit = 4
//! max_workers = 8
//! degrade_on_error = false
//! ```
//!
//! Relative paths are taken from the directory holding the file. Command-line
//! flags override whatever the file says.

use anyhow::{bail, Context, Result};
use ferry_transform::TransformOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "ferry.toml";

/// Unions wider than this degrade to `Dynamic` unless configured otherwise.
pub const DEFAULT_EITHER_ARITY_LIMIT: usize = 4;

const DEFAULT_OUT_DIR: &str = "haxe";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory packages are computed against.
    pub root_dir: Option<PathBuf>,
    /// Where `.hx` modules are written.
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    pub either_arity_limit: Option<usize>,
    pub max_workers: Option<usize>,
    pub degrade_on_error: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FerryConfig {
    pub project: ProjectConfig,
    pub transform: TransformConfig,
    /// Directory of the file this was read from.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub either_arity_limit: Option<usize>,
    pub max_workers: Option<usize>,
    pub degrade_on_error: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: TransformOptions,
    pub out_dir: PathBuf,
}

impl FerryConfig {
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        log::debug!("loaded {}", path.display());
        Ok(config)
    }

    /// The nearest `ferry.toml` at or above `start`, or the built-in defaults.
    pub fn discover(start: &Path) -> Result<Self> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load_file(&candidate);
            }
        }
        log::debug!("no {CONFIG_FILE} above {}, using defaults", start.display());
        Ok(Self::default())
    }

    /// An explicit `--config` path, or discovery from `start`.
    pub fn locate(explicit: Option<&Path>, start: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => Self::discover(start),
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Merge the file with `overrides`; `input_dir` is the root when neither names one.
    pub fn resolve(&self, input_dir: &Path, overrides: &Overrides) -> Result<Settings> {
        let root_dir = match (&overrides.root_dir, &self.project.root_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => self.relative(dir),
            (None, None) => input_dir.to_path_buf(),
        };
        let root_dir = root_dir.canonicalize().unwrap_or(root_dir);
        let out_dir = match (&overrides.out_dir, &self.project.out_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => self.relative(dir),
            (None, None) => self.relative(Path::new(DEFAULT_OUT_DIR)),
        };

        let either_arity_limit = overrides
            .either_arity_limit
            .or(self.transform.either_arity_limit)
            .unwrap_or(DEFAULT_EITHER_ARITY_LIMIT);
        if either_arity_limit < 2 {
            bail!("either_arity_limit must be at least 2, got {either_arity_limit}");
        }
        let max_workers = overrides
            .max_workers
            .or(self.transform.max_workers)
            .unwrap_or_else(available_workers);
        if max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        let degrade = overrides.degrade_on_error || self.transform.degrade_on_error.unwrap_or(false);

        Ok(Settings {
            options: TransformOptions::new(root_dir, either_arity_limit, max_workers)
                .with_degrade_on_error(degrade),
            out_dir,
        })
    }
}

fn available_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_a_file() {
        let dir = TempDir::new().unwrap();
        let config = FerryConfig::discover(dir.path()).unwrap();
        let settings = config.resolve(dir.path(), &Overrides::default()).unwrap();
        assert_eq!(settings.options.either_arity_limit, DEFAULT_EITHER_ARITY_LIMIT);
        assert!(settings.options.max_workers >= 1);
        assert!(!settings.options.degrade_on_error);
        assert_eq!(settings.options.root_dir, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_file_values_are_relative_to_the_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src/app")).unwrap();
        write_config(
            dir.path(),
            "[project]\nroot_dir = \"src\"\nout_dir = \"gen\"\n\n[transform]\neither_arity_limit = 3\nmax_workers = 2\ndegrade_on_error = true\n",
        );
        let config = FerryConfig::discover(&dir.path().join("src/app")).unwrap();
        let settings = config.resolve(Path::new("."), &Overrides::default()).unwrap();
        assert_eq!(settings.options.root_dir, dir.path().join("src").canonicalize().unwrap());
        assert_eq!(settings.out_dir, dir.path().join("gen"));
        assert_eq!(settings.options.either_arity_limit, 3);
        assert_eq!(settings.options.max_workers, 2);
        assert!(settings.options.degrade_on_error);
    }

    #[test]
    fn test_flags_override_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[transform]\neither_arity_limit = 3\nmax_workers = 2\n");
        let config = FerryConfig::locate(Some(&path), Path::new("/nonexistent")).unwrap();
        let overrides = Overrides {
            either_arity_limit: Some(6),
            max_workers: Some(1),
            out_dir: Some(PathBuf::from("/tmp/out")),
            ..Overrides::default()
        };
        let settings = config.resolve(dir.path(), &overrides).unwrap();
        assert_eq!(settings.options.either_arity_limit, 6);
        assert_eq!(settings.options.max_workers, 1);
        assert_eq!(settings.out_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let config = FerryConfig::default();
        let narrow = Overrides {
            either_arity_limit: Some(1),
            ..Overrides::default()
        };
        assert!(config.resolve(dir.path(), &narrow).is_err());
        let idle = Overrides {
            max_workers: Some(0),
            ..Overrides::default()
        };
        assert!(config.resolve(dir.path(), &idle).is_err());
    }

    #[test]
    fn test_unknown_keys_fail_to_load() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[transform]\narity = 3\n");
        let err = FerryConfig::load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
