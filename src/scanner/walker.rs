//! Lockfile discovery.
//!
//! Each target path is resolved to an absolute path. A lockfile target yields
//! one task; any other file yields nothing. A directory target is walked depth
//! first, in file-name order, with these rules applied to every entry:
//!
//! 1. A path matching the exclusion pattern is skipped, with its subtree.
//! 2. Without `recursive`, no directory below the target is entered.
//! 3. `.git` and `node_modules` (any case) are skipped unless included.
//! 4. Every recognized lockfile name becomes a task for its directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::{ScanConfig, ScanTask};
use crate::error::ScanError;
use crate::model::LockfileKind;

const GIT_DIR: &str = ".git";
const NODE_MODULES_DIR: &str = "node_modules";

/// Collects the scan tasks for a single target path.
///
/// Errors are returned next to the tasks found so far; an unreadable
/// subdirectory does not stop its siblings from being walked.
pub fn collect_tasks(config: &ScanConfig, target: &str) -> (Vec<ScanTask>, Vec<ScanError>) {
    let root = match std::path::absolute(target) {
        Ok(path) => clean_path(&path),
        Err(source) => {
            return (
                Vec::new(),
                vec![ScanError::Target {
                    path: PathBuf::from(target),
                    source,
                }],
            );
        }
    };

    let metadata = match fs::metadata(&root) {
        Ok(metadata) => metadata,
        Err(source) => {
            tracing::warn!(path = %root.display(), error = %source, "cannot stat target");
            return (Vec::new(), vec![ScanError::Target { path: root, source }]);
        }
    };

    if !metadata.is_dir() {
        return (lockfile_task(&root).into_iter().collect(), Vec::new());
    }

    walk_dir(config, &root)
}

/// Folds `.` and `..` components without touching the filesystem.
///
/// `..` above the root stays at the root. Symlinks are not resolved.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(cleaned.components().next_back(), Some(Component::Normal(_))) {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push(Component::ParentDir);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

fn walk_dir(config: &ScanConfig, root: &Path) -> (Vec<ScanTask>, Vec<ScanError>) {
    let mut tasks = Vec::new();
    let mut errors = Vec::new();

    let entries = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| should_visit(config, entry));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "cannot read directory entry");
                errors.push(ScanError::Walk {
                    root: root.to_path_buf(),
                    source: err,
                });
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        if let Some(task) = lockfile_task(entry.path()) {
            tasks.push(task);
        }
    }

    (tasks, errors)
}

/// Decides whether an entry is yielded and, for directories, descended into.
fn should_visit(config: &ScanConfig, entry: &DirEntry) -> bool {
    if let Some(pattern) = &config.exclude {
        if pattern.is_match(&entry.path().to_string_lossy()) {
            tracing::debug!(path = %entry.path().display(), "excluded by pattern");
            return false;
        }
    }

    if !entry.file_type().is_dir() {
        return true;
    }

    if entry.depth() > 0 && !config.recursive {
        return false;
    }

    !is_skipped_dir(config, &entry.file_name().to_string_lossy())
}

/// `.git` and `node_modules` are skipped unless the matching flag is set.
fn is_skipped_dir(config: &ScanConfig, name: &str) -> bool {
    (!config.include_node_modules && name.eq_ignore_ascii_case(NODE_MODULES_DIR))
        || (!config.include_git && name.eq_ignore_ascii_case(GIT_DIR))
}

fn lockfile_task(path: &Path) -> Option<ScanTask> {
    let kind = LockfileKind::from_path(path)?;
    let dir = path.parent()?;
    Some(ScanTask::new(dir, kind.file_name()))
}
