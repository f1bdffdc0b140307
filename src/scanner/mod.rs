//! Scan engine.
//!
//! A scan runs in three stages:
//!
//! 1. [`walker`] turns each target path into [`ScanTask`]s, one per located
//!    lockfile.
//! 2. [`pool`] parses every task on a fixed set of blocking workers.
//! 3. [`aggregate`] folds the per-lockfile findings into one [`ScanResult`]
//!    per project directory.
//!
//! Errors in any stage are collected into [`ScanErrors`] and never stop the
//! other targets, subtrees, or lockfiles from being scanned.
//!
//! # Example
//!
//! ```no_run
//! use fremen::{execute_scan, ScanConfig, VulnerabilityDatabase};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut db = VulnerabilityDatabase::new();
//!     db.load(None)?;
//!
//!     let config = ScanConfig::new(vec![".".to_string()]).recursive(true);
//!     let outcome = execute_scan(&config, Arc::new(db)).await;
//!
//!     for result in &outcome.results {
//!         println!("{}: {} infected", result.project, result.infected_count());
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod pool;
pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;

use crate::database::VulnerabilityDatabase;
use crate::error::ScanErrors;
use crate::model::ScanResult;

/// Target used when no path is given.
pub const DEFAULT_TARGET: &str = ".";

/// Options for one scan. Not modified once the scan starts.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Files or directories to scan, in order.
    pub target_paths: Vec<String>,
    /// Database override; `None` means `database.txt` next to the executable.
    pub database_path: Option<PathBuf>,
    /// Descend below each target directory.
    pub recursive: bool,
    /// Descend into `.git` directories.
    pub include_git: bool,
    /// Descend into `node_modules` directories.
    pub include_node_modules: bool,
    /// Paths whose full path matches are skipped, along with their subtree.
    pub exclude: Option<Regex>,
}

impl ScanConfig {
    pub fn new(target_paths: Vec<String>) -> Self {
        Self {
            target_paths,
            ..Self::default()
        }
    }

    pub fn database_path(mut self, path: Option<PathBuf>) -> Self {
        self.database_path = path;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn include_git(mut self, include: bool) -> Self {
        self.include_git = include;
        self
    }

    pub fn include_node_modules(mut self, include: bool) -> Self {
        self.include_node_modules = include;
        self
    }

    pub fn exclude(mut self, pattern: Option<Regex>) -> Self {
        self.exclude = pattern;
        self
    }

    /// Target paths, falling back to the current directory.
    pub fn targets(&self) -> Vec<&str> {
        if self.target_paths.is_empty() {
            vec![DEFAULT_TARGET]
        } else {
            self.target_paths.iter().map(String::as_str).collect()
        }
    }
}

/// One lockfile to parse: its directory and base file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTask {
    pub dir: PathBuf,
    pub lockfile: String,
}

impl ScanTask {
    pub fn new(dir: impl Into<PathBuf>, lockfile: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            lockfile: lockfile.into(),
        }
    }

    /// Full path of the lockfile.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.lockfile)
    }
}

/// Everything one scan produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// One entry per project directory, in walk order.
    pub results: Vec<ScanResult>,
    /// Non-fatal errors; results are still valid when this is non-empty.
    pub errors: ScanErrors,
}

/// Scans every target path of `config` against `db`.
///
/// Always returns whatever results could be produced. Target, traversal and
/// parse failures end up in [`ScanOutcome::errors`].
pub async fn execute_scan(config: &ScanConfig, db: Arc<VulnerabilityDatabase>) -> ScanOutcome {
    let mut errors = ScanErrors::new();
    let mut tasks = Vec::new();

    for target in config.targets() {
        let (found, target_errors) = walker::collect_tasks(config, target);
        tracing::debug!(target, lockfiles = found.len(), "collected scan tasks");
        tasks.extend(found);
        errors.extend(target_errors);
    }

    if tasks.is_empty() {
        tracing::info!("no lockfiles found");
        return ScanOutcome {
            results: Vec::new(),
            errors,
        };
    }

    let (findings, pool_errors) = pool::execute(tasks, db).await;
    errors.extend(pool_errors);

    let results = aggregate::aggregate(findings);
    tracing::info!(
        projects = results.len(),
        infected = results.iter().filter(|r| r.is_infected()).count(),
        errors = errors.len(),
        "scan finished"
    );

    ScanOutcome { results, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_targets_default_to_current_dir() {
        let config = ScanConfig::new(Vec::new());
        assert_eq!(config.targets(), vec!["."]);

        let config = ScanConfig::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.targets(), vec!["a", "b"]);
    }

    #[test]
    fn test_builder_sets_flags() {
        let config = ScanConfig::new(vec![])
            .recursive(true)
            .include_git(true)
            .include_node_modules(false)
            .exclude(Some(Regex::new("vendor").unwrap()))
            .database_path(Some(PathBuf::from("db.txt")));

        assert!(config.recursive);
        assert!(config.include_git);
        assert!(!config.include_node_modules);
        assert_eq!(config.exclude.unwrap().as_str(), "vendor");
        assert_eq!(config.database_path, Some(PathBuf::from("db.txt")));
    }

    #[test]
    fn test_task_path() {
        let task = ScanTask::new("/work/app", "yarn.lock");
        assert_eq!(task.path(), PathBuf::from("/work/app/yarn.lock"));
    }

    #[tokio::test]
    async fn test_execute_scan_without_lockfiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();

        let config = ScanConfig::new(vec![dir.path().to_string_lossy().into_owned()]);
        let outcome = execute_scan(&config, Arc::new(VulnerabilityDatabase::new())).await;

        assert!(outcome.results.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_execute_scan_finds_npm_infection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package-lock.json"),
            r#"{"dependencies": {"test-package": {"version": "1.0.0"}}}"#,
        )
        .unwrap();
        let db: VulnerabilityDatabase = "test-package:1.0.0".parse().unwrap();

        let config = ScanConfig::new(vec![dir.path().to_string_lossy().into_owned()]);
        let outcome = execute_scan(&config, Arc::new(db)).await;

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].infected_count(), 1);
        assert_eq!(outcome.results[0].lockfiles, vec!["package-lock.json"]);
    }
}
