use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lockfile formats fremen knows how to read.
///
/// The file name is the only discriminator; contents are never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockfileKind {
    Npm,
    Yarn,
    Pnpm,
}

impl LockfileKind {
    pub const ALL: [LockfileKind; 3] = [LockfileKind::Npm, LockfileKind::Yarn, LockfileKind::Pnpm];

    pub fn file_name(&self) -> &'static str {
        match self {
            LockfileKind::Npm => "package-lock.json",
            LockfileKind::Yarn => "yarn.lock",
            LockfileKind::Pnpm => "pnpm-lock.yaml",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LockfileKind::Npm => "npm",
            LockfileKind::Yarn => "Yarn",
            LockfileKind::Pnpm => "pnpm",
        }
    }

    /// Looks up the kind for an exact (case-sensitive) base file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_name() == name)
    }

    /// Looks up the kind from the base name of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
    }
}

impl std::fmt::Display for LockfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// A package version found in a lockfile that matches the vulnerability database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfectedPackage {
    pub name: String,
    pub version: String,
}

impl InfectedPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for InfectedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
