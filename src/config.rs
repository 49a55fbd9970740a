//! Resolved locations of the project and its plan directory.
//!
//! Both are supplied on the command line or through the environment:
//! - `DEVPLAN_PROJECT_ROOT` - project root (default: current directory)
//! - `DEVPLAN_PLAN_DIR` - plan directory, relative to the root unless absolute
//!   (default: `.cursor/devplan`)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Default plan directory, relative to the project root.
pub const DEFAULT_PLAN_DIR: &str = ".cursor/devplan";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub project_root: PathBuf,
    pub plan_dir: PathBuf,
}

impl Config {
    /// Plan directory at its default location under `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let plan_dir = project_root.join(DEFAULT_PLAN_DIR);
        Self {
            project_root,
            plan_dir,
        }
    }

    /// Build a config from optional overrides, falling back to the current
    /// directory and the default plan location.
    pub fn resolve(project_root: Option<PathBuf>, plan_dir: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let project_root = absolutize(&cwd, project_root.unwrap_or_else(|| cwd.clone()));
        let plan_dir = absolutize(
            &project_root,
            plan_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_DIR)),
        );
        Ok(Self {
            project_root,
            plan_dir,
        })
    }
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    let path = if path.is_absolute() {
        path
    } else {
        base.join(path)
    };
    std::fs::canonicalize(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_plan_dir_lands_under_project_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = Config::resolve(Some(temp.path().to_path_buf()), Some("plans".into()))
            .expect("resolve");

        assert!(config.plan_dir.starts_with(&config.project_root));
        assert!(config.plan_dir.ends_with("plans"));
    }

    #[test]
    fn absolute_plan_dir_is_kept() {
        let root = tempfile::tempdir().expect("tempdir");
        let elsewhere = tempfile::tempdir().expect("tempdir");
        let config = Config::resolve(
            Some(root.path().to_path_buf()),
            Some(elsewhere.path().to_path_buf()),
        )
        .expect("resolve");

        assert_eq!(
            config.plan_dir,
            std::fs::canonicalize(elsewhere.path()).expect("canonicalize")
        );
    }

    #[test]
    fn default_plan_dir_is_under_cursor() {
        let config = Config::new("/work/project");
        assert_eq!(config.plan_dir, PathBuf::from("/work/project/.cursor/devplan"));
    }
}
