//! Error types.
//!
//! Failures fall into two groups:
//!
//! - [`DatabaseError`] is fatal. Without a database nothing can be scanned.
//! - [`ScanError`] covers everything else (unreadable targets, unreadable
//!   subdirectories, lockfiles that fail to parse). These are collected into a
//!   [`ScanErrors`] value that is returned next to the partial results.

use std::io;
use std::path::PathBuf;

/// Failure to load the vulnerability database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error(
        "database not found at {path:?}; please provide a valid path using --database or ensure database.txt exists"
    )]
    NotFound { path: PathBuf },

    #[error("failed to read database {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to parse a single lockfile.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The parser panicked on this lockfile.
    #[error("parser panicked: {0}")]
    Panic(String),
}

/// A non-fatal error recorded during a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A target path could not be resolved or stat'd.
    #[error("stat {path:?}: {source}")]
    Target {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path below a target could not be read during traversal.
    #[error("walk {root:?}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A lockfile was located but could not be parsed.
    #[error("parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A worker stopped before reporting its task.
    #[error("scan worker failed: {0}")]
    Worker(String),
}

impl ScanError {
    /// Returns true if the error stems from a path that does not exist.
    pub fn is_not_found(&self) -> bool {
        let kind = match self {
            ScanError::Target { source, .. } => Some(source.kind()),
            ScanError::Walk { source, .. } => source.io_error().map(|e| e.kind()),
            ScanError::Parse {
                source: ParseError::Io(e),
                ..
            } => Some(e.kind()),
            _ => None,
        };
        kind == Some(io::ErrorKind::NotFound)
    }
}

/// Every non-fatal error of one scan, in the order they were recorded.
#[derive(Debug, Default)]
pub struct ScanErrors(Vec<ScanError>);

impl ScanErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ScanError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScanError> {
        self.0.iter()
    }

    /// Returns true if any recorded error is about a missing path.
    pub fn any_not_found(&self) -> bool {
        self.0.iter().any(ScanError::is_not_found)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ScanErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Extend<ScanError> for ScanErrors {
    fn extend<T: IntoIterator<Item = ScanError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl From<Vec<ScanError>> for ScanErrors {
    fn from(errors: Vec<ScanError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ScanErrors {
    type Item = ScanError;
    type IntoIter = std::vec::IntoIter<ScanError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScanErrors {
    type Item = &'a ScanError;
    type IntoIter = std::slice::Iter<'a, ScanError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for ScanErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ScanErrors {}
