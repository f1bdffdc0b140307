use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::InfectedPackage;

/// Scan findings for a single project directory.
///
/// A result exists for every directory in which at least one lockfile was
/// located, even when that lockfile could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Absolute path of the project directory.
    pub project: String,
    /// Lockfile names found in the directory, first-seen order, no repeats.
    pub lockfiles: Vec<String>,
    /// Infected packages, deduplicated by `(name, version)`.
    pub infected_packages: Vec<InfectedPackage>,
}

impl ScanResult {
    pub fn new(
        project: impl Into<String>,
        lockfiles: Vec<String>,
        infected_packages: Vec<InfectedPackage>,
    ) -> Self {
        Self {
            project: project.into(),
            lockfiles,
            infected_packages,
        }
    }

    pub fn infected_count(&self) -> usize {
        self.infected_packages.len()
    }

    pub fn is_infected(&self) -> bool {
        !self.infected_packages.is_empty()
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScanResult", 4)?;
        state.serialize_field("project", &self.project)?;
        state.serialize_field("lockfiles", &self.lockfiles)?;
        state.serialize_field("infected_count", &self.infected_count())?;
        state.serialize_field("infected_packages", &self.infected_packages)?;
        state.end()
    }
}
