//! Vulnerability database.
//!
//! The database is a plain text file with one `name:version` entry per line.
//! Blank lines and lines starting with `#` are ignored, as are lines that do
//! not split into a non-empty name and version.
//!
//! ```text
//! # compromised releases
//! test-package:1.0.0
//! @scope/pkg:2.3.4
//! ```
//!
//! When no path is given the database is looked up as `database.txt` next to
//! the running executable.
//!
//! # Example
//!
//! ```
//! use fremen::VulnerabilityDatabase;
//!
//! let db: VulnerabilityDatabase = "test-package:1.0.0\n".parse().unwrap();
//! assert!(db.is_infected("test-package", "1.0.0"));
//! assert!(!db.is_infected("Test-Package", "1.0.0"));
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::DatabaseError;

/// File name used when no database path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "database.txt";

/// Exact-match lookup of infected `(name, version)` pairs.
///
/// Immutable once loaded; share it between workers behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct VulnerabilityDatabase {
    entries: HashMap<String, HashSet<String>>,
    loaded_path: Option<PathBuf>,
    entry_count: usize,
}

impl VulnerabilityDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `database.txt` in the directory of the running executable.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DATABASE_FILE)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }

    /// Loads the database from `path`, or from [`default_path`](Self::default_path).
    ///
    /// Loading the path that is already loaded is a no-op. Returns the number
    /// of distinct entries.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::NotFound`] if the file does not exist,
    /// [`DatabaseError::Read`] for any other read failure.
    pub fn load(&mut self, path: Option<&Path>) -> Result<usize, DatabaseError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };

        if self.loaded_path.as_deref() == Some(path.as_path()) {
            tracing::debug!(path = %path.display(), "database already loaded");
            return Ok(self.entry_count);
        }

        let content = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DatabaseError::NotFound { path: path.clone() }
            } else {
                DatabaseError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let (entries, entry_count) = parse_entries(&content);
        self.entries = entries;
        self.entry_count = entry_count;

        tracing::debug!(path = %path.display(), entries = entry_count, "loaded vulnerability database");
        self.loaded_path = Some(path);

        Ok(self.entry_count)
    }

    /// Returns true if this exact `(name, version)` pair is in the database.
    ///
    /// Matching is case-sensitive. An empty name or version never matches.
    pub fn is_infected(&self, name: &str, version: &str) -> bool {
        if name.is_empty() || version.is_empty() {
            return false;
        }

        self.entries
            .get(name)
            .is_some_and(|versions| versions.contains(version))
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded_path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

impl FromStr for VulnerabilityDatabase {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entries, entry_count) = parse_entries(s);
        Ok(Self {
            entries,
            loaded_path: None,
            entry_count,
        })
    }
}

fn parse_entries(content: &str) -> (HashMap<String, HashSet<String>>, usize) {
    let mut entries: HashMap<String, HashSet<String>> = HashMap::new();
    let mut count = 0;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, version)) = parse_entry(line) else {
            continue;
        };

        if entries
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string())
        {
            count += 1;
        }
    }

    (entries, count)
}

/// Splits `name:version` on the first colon.
fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let (name, version) = line.split_once(':')?;
    let name = name.trim();
    let version = version.trim();

    if name.is_empty() || version.is_empty() {
        return None;
    }

    Some((name, version))
}
