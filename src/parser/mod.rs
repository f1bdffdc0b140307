//! Lockfile parsers.
//!
//! This module provides the [`LockfileParser`] trait and one implementation
//! per supported ecosystem. A parser reads a single lockfile, extracts flat
//! `(name, version)` candidates, and keeps the ones the
//! [`VulnerabilityDatabase`] flags as infected.
//!
//! # Available Parsers
//!
//! | Parser | Lockfile | Strategy |
//! |--------|----------|----------|
//! | [`NpmParser`] | `package-lock.json` | JSON, `dependencies` and `packages` sections |
//! | [`YarnParser`] | `yarn.lock` | header + `version` block matching |
//! | [`PnpmParser`] | `pnpm-lock.yaml` | line-oriented package keys |
//!
//! # Example
//!
//! ```no_run
//! use fremen::parser::get_parser;
//! use fremen::{LockfileKind, VulnerabilityDatabase};
//! use std::path::Path;
//!
//! let db: VulnerabilityDatabase = "test-package:1.0.0".parse().unwrap();
//! let parser = get_parser(LockfileKind::Npm);
//!
//! let infected = parser.parse(Path::new("package-lock.json"), &db)?;
//! for pkg in infected {
//!     println!("{}", pkg);
//! }
//! # Ok::<(), fremen::error::ParseError>(())
//! ```

mod npm;
mod pnpm;
mod yarn;

pub use npm::NpmParser;
pub use pnpm::PnpmParser;
pub use yarn::YarnParser;

use std::fs;
use std::path::Path;

use crate::database::VulnerabilityDatabase;
use crate::error::ParseError;
use crate::model::{InfectedPackage, LockfileKind};

/// Trait for extracting infected packages from one lockfile format.
///
/// Parsers only read the database, so a single database can be shared by
/// every worker of a scan.
pub trait LockfileParser: Send + Sync {
    /// Returns the human-readable name of this parser.
    fn name(&self) -> &'static str;

    /// Returns the lockfile format this parser handles.
    fn kind(&self) -> LockfileKind;

    /// Checks already-loaded lockfile contents against the database.
    ///
    /// The same package may be reported more than once; callers deduplicate.
    fn parse_str(
        &self,
        content: &str,
        db: &VulnerabilityDatabase,
    ) -> Result<Vec<InfectedPackage>, ParseError>;

    /// Reads the lockfile at `path` and checks it against the database.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so a stray byte only
    /// affects the line it sits on. Parsers with a strict syntax override this.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or, for formats with a
    /// strict syntax, cannot be parsed.
    fn parse(
        &self,
        path: &Path,
        db: &VulnerabilityDatabase,
    ) -> Result<Vec<InfectedPackage>, ParseError> {
        let bytes = fs::read(path)?;
        self.parse_str(&String::from_utf8_lossy(&bytes), db)
    }
}

/// Returns a list of all available parsers.
///
/// # Example
///
/// ```
/// use fremen::parser::all_parsers;
///
/// assert_eq!(all_parsers().len(), 3);
/// ```
pub fn all_parsers() -> Vec<Box<dyn LockfileParser>> {
    vec![
        Box::new(NpmParser),
        Box::new(YarnParser),
        Box::new(PnpmParser),
    ]
}

/// Returns the parser for a specific lockfile format.
///
/// # Example
///
/// ```
/// use fremen::{LockfileKind, parser::get_parser};
///
/// let parser = get_parser(LockfileKind::Yarn);
/// assert_eq!(parser.name(), "Yarn classic");
/// ```
pub fn get_parser(kind: LockfileKind) -> Box<dyn LockfileParser> {
    match kind {
        LockfileKind::Npm => Box::new(NpmParser),
        LockfileKind::Yarn => Box::new(YarnParser),
        LockfileKind::Pnpm => Box::new(PnpmParser),
    }
}

/// Returns the parser registered for a lockfile base name, if any.
pub fn parser_for_file_name(file_name: &str) -> Option<Box<dyn LockfileParser>> {
    LockfileKind::from_file_name(file_name).map(get_parser)
}

/// Database check shared by all parsers.
fn check(db: &VulnerabilityDatabase, name: &str, version: &str) -> Option<InfectedPackage> {
    if db.is_infected(name, version) {
        Some(InfectedPackage::new(name, version))
    } else {
        None
    }
}
